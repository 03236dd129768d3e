//! Parsing of REPL input lines.

use botbuddy_common::ChatId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text to send to the active chat.
    Say(String),
    Chats,
    Open(ChatId),
    Retry,
    Clear,
    Status,
    Help,
    Quit,
    /// A `/` command that could not be understood.
    Invalid(String),
}

pub const HELP: &str = "\
/chats        list chats
/open <id>    switch to a chat
/retry        reconnect the current chat
/clear        clear the current conversation
/status       show connection, pending flag, last error and token usage
/help         show this help
/quit         exit
Anything else is sent as a message.";

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Say(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();

    match (name, arg) {
        ("chats", None) => Command::Chats,
        ("open", Some(id)) => match id.parse() {
            Ok(id) => Command::Open(id),
            Err(_) => Command::Invalid(format!("not a chat id: {id}")),
        },
        ("open", None) => Command::Invalid("usage: /open <id>".into()),
        ("retry", None) => Command::Retry,
        ("clear", None) => Command::Clear,
        ("status", None) => Command::Status,
        ("help", None) => Command::Help,
        ("quit" | "exit", None) => Command::Quit,
        _ => Command::Invalid(format!("unknown command: /{rest}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_said_verbatim() {
        assert_eq!(parse_command("  hello there "), Command::Say("  hello there ".into()));
        assert_eq!(parse_command(""), Command::Say(String::new()));
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(parse_command("/chats"), Command::Chats);
        assert_eq!(parse_command(" /retry "), Command::Retry);
        assert_eq!(parse_command("/clear"), Command::Clear);
        assert_eq!(parse_command("/status"), Command::Status);
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/exit"), Command::Quit);
    }

    #[test]
    fn parses_open_with_id() {
        assert_eq!(parse_command("/open 2"), Command::Open(ChatId(2)));
        assert!(matches!(parse_command("/open two"), Command::Invalid(_)));
        assert!(matches!(parse_command("/open"), Command::Invalid(_)));
    }

    #[test]
    fn unknown_or_extra_args_are_invalid() {
        assert!(matches!(parse_command("/dark"), Command::Invalid(m) if m.contains("/dark")));
        assert!(matches!(parse_command("/chats now"), Command::Invalid(_)));
    }
}
