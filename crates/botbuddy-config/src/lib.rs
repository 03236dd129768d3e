//! BotBuddy configuration system.
//!
//! TOML-based configuration with serde defaults for every section, so a
//! partial (or missing) `config.toml` works out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use botbuddy_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("model: {}", config.gemini.model);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{
    BotBuddyConfig, ChatEntry, GeminiSection, LogLevel, LoggingConfig, SessionSection,
};

use std::path::Path;

use botbuddy_common::ConfigError;

/// Load config from `path` if given, otherwise from the platform default path.
///
/// The default path is created with a commented template when absent. An
/// explicit path must exist. A file that fails validation yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<BotBuddyConfig, ConfigError> {
    match path {
        Some(path) => toml_loader::load_from_path(path),
        None => toml_loader::load_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_with_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("botbuddy.toml");
        std::fs::write(&path, "[logging]\nlevel = \"DEBUG\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn load_config_with_invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("botbuddy.toml");
        std::fs::write(&path, "[gemini]\nmodel = \"\"\ntemperature = 9.0\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config, BotBuddyConfig::default());
    }

    #[test]
    fn load_config_with_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(load_config(Some(&path)).is_err());
    }
}
