use std::str::FromStr;

use super::nom_parser::ParsedMessage;
use super::types::Message;
use crate::error::{MessageParseError, ProtocolError};

impl Message {
    /// Parse one line into a message, reporting the bare parse error.
    pub fn parse_line(line: &str) -> Result<Self, MessageParseError> {
        let parsed = ParsedMessage::parse(line)?;
        Ok(Message {
            prefix: parsed.prefix.map(str::to_owned),
            command: parsed.command.to_owned(),
            args: parsed.params.iter().map(|p| (*p).to_owned()).collect(),
        })
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Message, Self::Err> {
        Message::parse_line(s).map_err(|cause| ProtocolError::InvalidMessage {
            string: s.to_owned(),
            cause,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_numeric() {
        let msg: Message = ":irc.example.net 001 me :Welcome\r\n".parse().unwrap();
        assert_eq!(msg.prefix.as_deref(), Some("irc.example.net"));
        assert_eq!(msg.command, "001");
        assert_eq!(msg.args, vec!["me", "Welcome"]);
    }

    #[test]
    fn test_from_str_error_keeps_input() {
        let err = "   ".parse::<Message>().unwrap_err();
        match err {
            ProtocolError::InvalidMessage { string, cause } => {
                assert_eq!(string, "   ");
                assert_eq!(cause, MessageParseError::EmptyMessage);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
