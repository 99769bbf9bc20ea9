//! Per-user session and daily quota tracking
//!
//! Each user gets a lazily-created `SessionLimits` record, initialized at the
//! free tier on first sight. Counters reset when the 24-hour window elapses.
//! A limit of -1 means unlimited; since limit checks only apply when the
//! limit is positive, the enterprise tier bypasses both checks without any
//! special casing.
//!
//! State is process-local and not persisted.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::EngineError;

/// Counter reset window
const RESET_WINDOW_HOURS: i64 = 24;

/// A user's quota class, controlling daily and per-session request ceilings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
    Enterprise,
}

impl Tier {
    /// (daily, session) request ceilings; -1 means unlimited.
    fn limits(&self) -> (i64, i64) {
        match self {
            Tier::Free => (20, 10),
            Tier::Pro => (200, 50),
            Tier::Enterprise => (-1, -1),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Enterprise => "enterprise",
        };
        f.write_str(name)
    }
}

/// Per-user usage counters and active limits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLimits {
    pub user_id: String,
    pub request_count: u32,
    pub token_usage: u64,
    pub last_reset: DateTime<Utc>,
    pub daily_limit: i64,
    pub session_limit: i64,
    pub tier: Tier,
}

impl SessionLimits {
    fn fresh(user_id: &str, tier: Tier, now: DateTime<Utc>) -> Self {
        let (daily_limit, session_limit) = tier.limits();
        Self {
            user_id: user_id.to_string(),
            request_count: 0,
            token_usage: 0,
            last_reset: now,
            daily_limit,
            session_limit,
            tier,
        }
    }

    /// When the current counting window ends.
    pub fn resets_at(&self) -> DateTime<Utc> {
        self.last_reset + Duration::hours(RESET_WINDOW_HOURS)
    }
}

/// Tracks and resets per-user request/token usage against tier-based limits.
pub struct QuotaEnforcer {
    sessions: Mutex<HashMap<String, SessionLimits>>,
}

impl QuotaEnforcer {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Admit or reject a request for `user_id`, counting it when admitted.
    ///
    /// First sight of a user creates a free-tier record with the request
    /// already counted. An elapsed 24-hour window resets counters before the
    /// limit checks run.
    pub fn check(&self, user_id: &str) -> Result<(), EngineError> {
        self.check_at(user_id, Utc::now())
    }

    /// Time-parameterized variant of [`check`](Self::check), used in tests.
    pub fn check_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<(), EngineError> {
        let mut sessions = self.sessions.lock().expect("quota lock poisoned");

        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| SessionLimits::fresh(user_id, Tier::Free, now));

        if now - session.last_reset > Duration::hours(RESET_WINDOW_HOURS) {
            log::debug!("Quota window elapsed for user '{}', resetting", user_id);
            session.request_count = 0;
            session.token_usage = 0;
            session.last_reset = now;
        }

        let count = i64::from(session.request_count);
        if (session.daily_limit > 0 && count >= session.daily_limit)
            || (session.session_limit > 0 && count >= session.session_limit)
        {
            return Err(EngineError::QuotaExceeded {
                user_id: user_id.to_string(),
                tier: session.tier,
                request_count: session.request_count,
                resets_at: session.resets_at(),
            });
        }

        session.request_count += 1;
        Ok(())
    }

    /// Add generated-token usage to a user's counters.
    pub fn record_usage(&self, user_id: &str, tokens: u64) {
        let mut sessions = self.sessions.lock().expect("quota lock poisoned");
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| SessionLimits::fresh(user_id, Tier::Free, Utc::now()));
        session.token_usage += tokens;
    }

    /// Move a user to a new tier, replacing limits but keeping counters.
    pub fn set_tier(&self, user_id: &str, tier: Tier) {
        let mut sessions = self.sessions.lock().expect("quota lock poisoned");
        let session = sessions
            .entry(user_id.to_string())
            .or_insert_with(|| SessionLimits::fresh(user_id, tier, Utc::now()));
        let (daily_limit, session_limit) = tier.limits();
        session.tier = tier;
        session.daily_limit = daily_limit;
        session.session_limit = session_limit;
    }

    /// Snapshot of a user's current counters and limits.
    pub fn session_stats(&self, user_id: &str) -> Option<SessionLimits> {
        let sessions = self.sessions.lock().expect("quota lock poisoned");
        sessions.get(user_id).cloned()
    }
}

impl Default for QuotaEnforcer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "quota_tests.rs"]
mod quota_tests;
