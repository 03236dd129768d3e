use std::path::PathBuf;

use clap::Parser;

/// Bot Buddy: chat with a hosted Gemini model from the terminal.
#[derive(Parser, Debug)]
#[command(name = "botbuddy", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Chat to open at start-up (defaults to the first chat).
    #[arg(short = 'c', long)]
    pub chat: Option<u32>,

    /// Model override (e.g. gemini-1.5-pro).
    #[arg(short = 'm', long)]
    pub model: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
