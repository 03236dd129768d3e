//! Configuration schema.
//!
//! Every section is `#[serde(default)]`, so a partial `config.toml` only
//! overrides the fields it names.

use botbuddy_common::ChatId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Gemini
// =============================================================================

/// Settings for the hosted Gemini model.
///
/// The API key is never stored here; it comes from `GEMINI_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeminiSection {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub system_prompt: Option<String>,
}

impl Default for GeminiSection {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            system_prompt: None,
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Per-chat session behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionSection {
    /// Upper bound for one remote reply, in seconds. `0` waits forever.
    pub request_timeout_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
        }
    }
}

// =============================================================================
// Chats
// =============================================================================

/// One entry in the chat roster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: ChatId,
    pub title: String,
    pub date: NaiveDate,
}

impl ChatEntry {
    pub fn new(id: u32, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: ChatId(id),
            title: title.into(),
            date,
        }
    }
}

/// The sample chats shown when the config does not list any.
pub fn default_chats() -> Vec<ChatEntry> {
    let date = NaiveDate::from_ymd_opt(2024, 10, 25).unwrap_or_default();
    vec![
        ChatEntry::new(1, "How to learn React?", date),
        ChatEntry::new(2, "Explain machine learning", date),
        ChatEntry::new(3, "JavaScript best practices", date),
    ]
}

// =============================================================================
// Logging
// =============================================================================

/// Log level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// The `tracing` filter directive for this level.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

// =============================================================================
// Root
// =============================================================================

/// Root configuration for BotBuddy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotBuddyConfig {
    pub gemini: GeminiSection,
    pub session: SessionSection,
    pub logging: LoggingConfig,
    pub chats: Vec<ChatEntry>,
}

impl Default for BotBuddyConfig {
    fn default() -> Self {
        Self {
            gemini: GeminiSection::default(),
            session: SessionSection::default(),
            logging: LoggingConfig::default(),
            chats: default_chats(),
        }
    }
}
