//! Full configuration validation.
//!
//! Collects every problem before failing so a single run reports them all.

use std::collections::HashSet;

use crate::schema::BotBuddyConfig;
use botbuddy_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &BotBuddyConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    // Gemini constraints
    if config.gemini.model.trim().is_empty() {
        errors.push("gemini.model must not be empty".to_string());
    }
    validate_range(&mut errors, "gemini.max_tokens", config.gemini.max_tokens, 1, 8192);
    validate_range_f64(&mut errors, "gemini.temperature", config.gemini.temperature, 0.0, 2.0);

    // Session constraints
    if config.session.request_timeout_secs > 600 {
        errors.push(format!(
            "session.request_timeout_secs = {} is out of range [0, 600]",
            config.session.request_timeout_secs
        ));
    }

    // Chat roster
    if config.chats.is_empty() {
        errors.push("chats must list at least one chat".to_string());
    }
    let mut seen = HashSet::new();
    for chat in &config.chats {
        if !seen.insert(chat.id) {
            errors.push(format!("chats: duplicate id {}", chat.id));
        }
        if chat.title.trim().is_empty() {
            errors.push(format!("chats: chat {} has an empty title", chat.id));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u32, min: u32, max: u32) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

fn validate_range_f64(errors: &mut Vec<String>, name: &str, value: f64, min: f64, max: f64) {
    if !(min..=max).contains(&value) {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    #[test]
    fn default_config_validates() {
        let config = BotBuddyConfig::default();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn catches_empty_model() {
        let mut config = BotBuddyConfig::default();
        config.gemini.model = "  ".into();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("gemini.model"));
    }

    #[test]
    fn catches_max_tokens_zero() {
        let mut config = BotBuddyConfig::default();
        config.gemini.max_tokens = 0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("gemini.max_tokens"));
    }

    #[test]
    fn catches_temperature_out_of_range() {
        let mut config = BotBuddyConfig::default();
        config.gemini.temperature = 3.5;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("gemini.temperature"));
    }

    #[test]
    fn catches_nan_temperature() {
        let mut config = BotBuddyConfig::default();
        config.gemini.temperature = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn catches_timeout_too_large() {
        let mut config = BotBuddyConfig::default();
        config.session.request_timeout_secs = 3600;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("session.request_timeout_secs"));
    }

    #[test]
    fn zero_timeout_is_allowed() {
        let mut config = BotBuddyConfig::default();
        config.session.request_timeout_secs = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn catches_empty_roster() {
        let mut config = BotBuddyConfig::default();
        config.chats.clear();
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("at least one chat"));
    }

    #[test]
    fn catches_duplicate_chat_ids() {
        let mut config = BotBuddyConfig::default();
        let first = config.chats[0].clone();
        config.chats.push(first);
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("duplicate id 1"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = BotBuddyConfig::default();
        config.gemini.max_tokens = 0;
        config.gemini.temperature = -1.0;
        let err = validate(&config).unwrap_err().to_string();
        assert!(err.contains("gemini.max_tokens"));
        assert!(err.contains("gemini.temperature"));
    }
}
