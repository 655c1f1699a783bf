//! Parsing of chat input lines

use std::path::PathBuf;

use ragchat_core::AnswerMode;

/// One line typed at the chat prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Ingest(PathBuf),
    SetMode(AnswerMode),
    SetMemory(bool),
    History,
    Clear,
    ResetIndex,
    Status,
    Help,
    Exit,
    Empty,
    Invalid(String),
}

impl ChatCommand {
    pub fn parse(input: &str) -> ChatCommand {
        let input = input.trim();
        if input.is_empty() {
            return ChatCommand::Empty;
        }

        match input.to_lowercase().as_str() {
            "exit" | "quit" | "/exit" | "/quit" => return ChatCommand::Exit,
            "help" | "/help" | "?" => return ChatCommand::Help,
            _ => {}
        }

        let Some(rest) = input.strip_prefix('/') else {
            return ChatCommand::Ask(input.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_lowercase().as_str() {
            "ingest" | "load" => {
                let path = unquote(arg);
                if path.is_empty() {
                    ChatCommand::Invalid("usage: /ingest <file.pdf|file.txt>".to_string())
                } else {
                    ChatCommand::Ingest(PathBuf::from(path))
                }
            }
            "mode" => match AnswerMode::from_str(arg) {
                Some(mode) => ChatCommand::SetMode(mode),
                None => ChatCommand::Invalid("usage: /mode context|plain".to_string()),
            },
            "memory" => match arg.to_lowercase().as_str() {
                "on" | "true" | "yes" => ChatCommand::SetMemory(true),
                "off" | "false" | "no" => ChatCommand::SetMemory(false),
                _ => ChatCommand::Invalid("usage: /memory on|off".to_string()),
            },
            "history" => ChatCommand::History,
            "clear" => ChatCommand::Clear,
            "reset" => ChatCommand::ResetIndex,
            "status" => ChatCommand::Status,
            other => ChatCommand::Invalid(format!("unknown command '/{}', type 'help'", other)),
        }
    }
}

/// Strip one pair of matching quotes, as left by terminal drag and drop.
fn unquote(arg: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = arg.strip_prefix(quote).and_then(|a| a.strip_suffix(quote)) {
            return inner;
        }
    }
    arg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questions_pass_through() {
        assert_eq!(
            ChatCommand::parse("  What is the capital of France? "),
            ChatCommand::Ask("What is the capital of France?".to_string())
        );
        assert_eq!(ChatCommand::parse("   "), ChatCommand::Empty);
    }

    #[test]
    fn test_exit_and_help() {
        assert_eq!(ChatCommand::parse("QUIT"), ChatCommand::Exit);
        assert_eq!(ChatCommand::parse("/exit"), ChatCommand::Exit);
        assert_eq!(ChatCommand::parse("help"), ChatCommand::Help);
    }

    #[test]
    fn test_ingest_paths() {
        assert_eq!(
            ChatCommand::parse("/ingest '/tmp/my report.pdf'"),
            ChatCommand::Ingest(PathBuf::from("/tmp/my report.pdf"))
        );
        assert_eq!(
            ChatCommand::parse("/ingest notes.txt"),
            ChatCommand::Ingest(PathBuf::from("notes.txt"))
        );
        assert!(matches!(ChatCommand::parse("/ingest"), ChatCommand::Invalid(_)));
    }

    #[test]
    fn test_mode_and_memory() {
        assert_eq!(
            ChatCommand::parse("/mode plain"),
            ChatCommand::SetMode(AnswerMode::WithoutContext)
        );
        assert_eq!(
            ChatCommand::parse("/mode context"),
            ChatCommand::SetMode(AnswerMode::WithContext)
        );
        assert_eq!(ChatCommand::parse("/memory ON"), ChatCommand::SetMemory(true));
        assert!(matches!(ChatCommand::parse("/memory maybe"), ChatCommand::Invalid(_)));
    }

    #[test]
    fn test_session_commands() {
        assert_eq!(ChatCommand::parse("/history"), ChatCommand::History);
        assert_eq!(ChatCommand::parse("/clear"), ChatCommand::Clear);
        assert_eq!(ChatCommand::parse("/reset"), ChatCommand::ResetIndex);
        assert_eq!(ChatCommand::parse("/STATUS"), ChatCommand::Status);
    }

    #[test]
    fn test_unknown_command() {
        match ChatCommand::parse("/frobnicate now") {
            ChatCommand::Invalid(message) => assert!(message.contains("/frobnicate")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
