// Configuration module for promptdeck
// Handles loading and parsing configuration from ~/.config/promptdeck/config.toml

mod types;

pub use types::{Config, EngineSettings, GeminiConfig, OpenAiConfig, ProvidersConfig};

use std::fs;
use std::path::{Path, PathBuf};

/// Result of loading configuration
pub struct ConfigResult {
    pub config: Config,
    pub warning: Option<String>,
}

/// Loads configuration from ~/.config/promptdeck/config.toml
/// Returns default configuration if the file doesn't exist or on parse errors
pub fn load_config() -> ConfigResult {
    load_config_from(&get_config_path())
}

/// Loads configuration from an explicit path (used in tests)
pub fn load_config_from(config_path: &Path) -> ConfigResult {
    log::debug!("Loading config from {:?}", config_path);

    // If file doesn't exist, return defaults silently
    if !config_path.exists() {
        log::debug!("Config file does not exist, using defaults");
        return ConfigResult {
            config: Config::default(),
            warning: None,
        };
    }

    let contents = match fs::read_to_string(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            log::error!("Failed to read config file {:?}: {}", config_path, e);
            return ConfigResult {
                config: Config::default(),
                warning: Some(format!("Failed to read config: {}", e)),
            };
        }
    };

    match toml::from_str::<Config>(&contents) {
        Ok(config) => ConfigResult {
            config,
            warning: None,
        },
        Err(e) => {
            log::error!("Failed to parse config file {:?}: {}", config_path, e);
            ConfigResult {
                config: Config::default(),
                warning: Some(format!("Invalid config: {}", e)),
            }
        }
    }
}

/// Returns the path to the configuration file
///
/// Always uses ~/.config/promptdeck/config.toml on all platforms for consistency.
fn get_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("promptdeck")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missing_file_yields_defaults_silently() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config_from(&dir.path().join("absent.toml"));
        assert!(result.warning.is_none());
        assert_eq!(result.config.engine.batch_spacing_ms, 500);
        assert!(result.config.providers.gemini.api_key.is_none());
    }

    #[test]
    fn test_invalid_toml_yields_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "providers = \"not a table\"").unwrap();

        let result = load_config_from(&path);
        assert!(result.warning.is_some());
        assert_eq!(result.config.providers.gemini.model, "gemini-1.5-flash");
    }

    #[test]
    fn test_full_config_parses() {
        let toml_content = r#"
[providers.gemini]
api_key = "g-key"
model = "gemini-2.0-flash"

[providers.openai]
api_key = "o-key"

[engine]
batch_spacing_ms = 250
"#;
        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.providers.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(config.providers.gemini.model, "gemini-2.0-flash");
        // Omitted model falls back to the default
        assert_eq!(config.providers.openai.model, "gpt-4o-mini");
        assert_eq!(config.engine.batch_spacing_ms, 250);
    }

    #[test]
    fn test_empty_config_is_all_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.providers.gemini.api_key.is_none());
        assert!(config.providers.openai.api_key.is_none());
        assert_eq!(config.engine.batch_spacing_ms, 500);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // Any valid provider/engine values survive a parse round-trip
        #[test]
        fn prop_valid_config_parsing(
            api_key in "[a-zA-Z0-9-]{8,40}",
            spacing in 0u64..10_000u64,
        ) {
            let toml_content = format!(r#"
[providers.gemini]
api_key = "{api_key}"

[engine]
batch_spacing_ms = {spacing}
"#);
            let config: Config = toml::from_str(&toml_content).unwrap();
            prop_assert_eq!(config.providers.gemini.api_key.as_deref(), Some(api_key.as_str()));
            prop_assert_eq!(config.engine.batch_spacing_ms, spacing);
        }
    }
}
