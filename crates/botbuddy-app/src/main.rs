mod app_state;
mod cli;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use botbuddy_ai::{GeminiClient, GeminiConfig};
use botbuddy_common::ChatId;
use botbuddy_config::BotBuddyConfig;
use tokio::io::BufReader;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

use app_state::{ChatRoster, Repl};

const CRATE_TARGETS: [&str; 4] = ["botbuddy", "botbuddy_app", "botbuddy_ai", "botbuddy_config"];

fn filter_for(level: &str) -> EnvFilter {
    let directives = CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(format!("warn,{directives}"))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Use `--model` when it names something; a blank value keeps the configured model.
fn apply_model_override(config: &mut BotBuddyConfig, model: Option<&str>) {
    match model.map(str::trim) {
        Some("") => tracing::warn!("Ignoring empty --model; using {}", config.gemini.model),
        Some(model) => config.gemini.model = model.to_string(),
        None => {}
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: failed to read .env: {e}");
        }
    }

    let args = cli::parse();

    // Logging goes to stderr so it never interleaves with the transcript.
    let from_env = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let initial = match (&args.log_level, from_env) {
        (Some(level), _) => filter_for(level),
        (None, true) => EnvFilter::from_default_env(),
        (None, false) => filter_for("info"),
    };
    let (filter, filter_handle) = reload::Layer::new(initial);
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Bot Buddy v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let mut config = botbuddy_config::load_config(args.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        BotBuddyConfig::default()
    });

    if args.log_level.is_none() && !from_env {
        let level = config.logging.level.as_directive();
        if let Err(e) = filter_handle.reload(filter_for(level)) {
            tracing::warn!("Failed to apply configured log level: {e}");
        }
    }

    apply_model_override(&mut config, args.model.as_deref());
    tracing::info!("Config loaded (model: {})", config.gemini.model);

    let gemini = GeminiConfig::from_env().unwrap_or_else(|e| {
        tracing::error!("{e}; chats will fail to initialize");
        GeminiConfig::new("")
    });
    let gemini = gemini
        .with_model(config.gemini.model.clone())
        .with_max_tokens(config.gemini.max_tokens)
        .with_temperature(config.gemini.temperature)
        .with_system_prompt(config.gemini.system_prompt.clone());

    let client = match GeminiClient::new(gemini) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("Failed to build Gemini client: {e}");
            return ExitCode::FAILURE;
        }
    };

    let timeout = Some(config.session.request_timeout_secs)
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let start = args
        .chat
        .map(ChatId)
        .filter(|id| config.chats.iter().any(|c| c.id == *id))
        .or_else(|| config.chats.first().map(|c| c.id))
        .unwrap_or(ChatId(1));
    if let Some(requested) = args.chat.filter(|id| ChatId(*id) != start) {
        tracing::warn!("No chat with id {requested}; opening chat {start}");
    }

    let roster = ChatRoster::new(config.chats, Arc::new(client), timeout);
    let mut repl = Repl::new(roster, std::io::stdout());
    let input = BufReader::new(tokio::io::stdin());

    match repl.run(input, start).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Terminal loop failed: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_covers_every_crate() {
        let rendered = filter_for("debug").to_string();
        for target in CRATE_TARGETS {
            assert!(rendered.contains(&format!("{target}=debug")), "{rendered}");
        }
    }

    #[test]
    fn model_override_is_trimmed() {
        let mut config = BotBuddyConfig::default();
        apply_model_override(&mut config, Some("  gemini-1.5-pro \n"));
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
    }

    #[test]
    fn blank_model_override_keeps_configured_model() {
        let mut config = BotBuddyConfig::default();
        let configured = config.gemini.model.clone();
        apply_model_override(&mut config, Some("   "));
        assert_eq!(config.gemini.model, configured);
        apply_model_override(&mut config, None);
        assert_eq!(config.gemini.model, configured);
    }

    #[test]
    fn bad_level_falls_back_to_warn() {
        let rendered = filter_for("verbose").to_string();
        assert!(!rendered.contains("botbuddy"), "{rendered}");
    }
}
