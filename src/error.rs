use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::quota::Tier;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "Quota exceeded for user '{user_id}' ({tier} tier): {request_count} requests used. Limit resets at {resets_at}."
    )]
    QuotaExceeded {
        user_id: String,
        tier: Tier,
        request_count: u32,
        resets_at: DateTime<Utc>,
    },
}
