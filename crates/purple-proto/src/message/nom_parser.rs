//! Nom-based IRC line parser.
//!
//! Produces a borrowed view of the line; [`super::Message`] owns the result.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::{char, space0},
    combinator::opt,
    error::ErrorKind,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::MessageParseError;

/// Skip IRCv3 message tags; the client never requests tag capabilities but
/// a server may still send them.
fn parse_tags(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), take_until(" "))(input)
}

/// Parse message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command token (1*letter or 3digit).
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (rest, cmd) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    // The command must end the line or be followed by a space.
    let terminated = rest.is_empty() || rest.starts_with(' ');

    if (is_all_letters || is_three_digits) && terminated {
        Ok((rest, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::AlphaNumeric,
        )))
    }
}

/// Parse parameters after the command.
///
/// Consecutive spaces between middle parameters collapse. A parameter
/// starting with `:` is the trailing parameter and runs to the end of the
/// line. Once 14 middle parameters are read, the remainder of the line is
/// the fifteenth.
fn parse_params(input: &str) -> SmallVec<[&str; 15]> {
    let mut params: SmallVec<[&str; 15]> = SmallVec::new();
    let mut rest = input;

    while rest.starts_with(' ') {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing);
            break;
        }

        if params.len() == 14 {
            params.push(rest);
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        params.push(&rest[..end]);
        rest = &rest[end..];
    }

    params
}

fn parse_message(input: &str) -> IResult<&str, ParsedMessage<'_>> {
    let (input, _tags) = opt(parse_tags)(input)?;
    let (input, _) = space0(input)?;

    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;

    let (rest, command) = parse_command(input)?;
    let params = parse_params(rest);

    Ok(("", ParsedMessage { prefix, command, params }))
}

/// A parsed IRC line borrowing from its input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedMessage<'a> {
    /// Raw prefix (without the leading `:`), if present.
    pub prefix: Option<&'a str>,
    /// The command token as sent.
    pub command: &'a str,
    /// Parameters, the trailing one included.
    pub params: SmallVec<[&'a str; 15]>,
}

impl<'a> ParsedMessage<'a> {
    /// Parse one IRC line.
    ///
    /// Leading NUL bytes are skipped and trailing CR/LF are stripped before
    /// the grammar is applied.
    pub fn parse(input: &'a str) -> Result<Self, MessageParseError> {
        let line = clean_line(input);
        if line.trim_matches(' ').is_empty() {
            return Err(MessageParseError::EmptyMessage);
        }
        if line.starts_with(": ") || line == ":" {
            return Err(MessageParseError::EmptyPrefix);
        }

        match parse_message(line) {
            Ok((_, msg)) => Ok(msg),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                Err(MessageParseError::InvalidCommand {
                    position: line.len() - e.input.len(),
                })
            }
            Err(nom::Err::Incomplete(_)) => Err(MessageParseError::InvalidCommand {
                position: line.len(),
            }),
        }
    }
}

/// Strip leading NULs and any trailing CR/LF.
pub(crate) fn clean_line(input: &str) -> &str {
    input
        .trim_start_matches('\0')
        .trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let msg = ParsedMessage::parse("PING").unwrap();
        assert_eq!(msg.command, "PING");
        assert!(msg.prefix.is_none());
        assert!(msg.params.is_empty());
    }

    #[test]
    fn test_parse_with_prefix() {
        let msg = ParsedMessage::parse(":nick!user@host PRIVMSG #channel :Hello").unwrap();
        assert_eq!(msg.prefix, Some("nick!user@host"));
        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params.as_slice(), &["#channel", "Hello"]);
    }

    #[test]
    fn test_parse_skips_tags() {
        let msg = ParsedMessage::parse("@time=2023-01-01T00:00:00Z :nick PRIVMSG #ch :Hi").unwrap();
        assert_eq!(msg.prefix, Some("nick"));
        assert_eq!(msg.params.as_slice(), &["#ch", "Hi"]);
    }

    #[test]
    fn test_parse_strips_crlf_and_nuls() {
        let msg = ParsedMessage::parse("\0\0PING :server\r\n").unwrap();
        assert_eq!(msg.command, "PING");
        assert_eq!(msg.params.as_slice(), &["server"]);
    }

    #[test]
    fn test_parse_collapses_spaces() {
        let msg = ParsedMessage::parse(":srv 353  me =  #chan :@a +b c").unwrap();
        assert_eq!(msg.command, "353");
        assert_eq!(msg.params.as_slice(), &["me", "=", "#chan", "@a +b c"]);
    }

    #[test]
    fn test_parse_empty_trailing() {
        let msg = ParsedMessage::parse("TOPIC #chan :").unwrap();
        assert_eq!(msg.params.as_slice(), &["#chan", ""]);
    }

    #[test]
    fn test_parse_fifteenth_param_absorbs_rest() {
        let msg = ParsedMessage::parse("CMD 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16").unwrap();
        assert_eq!(msg.params.len(), 15);
        assert_eq!(msg.params[14], "15 16");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ParsedMessage::parse(""), Err(MessageParseError::EmptyMessage));
        assert_eq!(ParsedMessage::parse("\r\n"), Err(MessageParseError::EmptyMessage));
        assert_eq!(ParsedMessage::parse(":"), Err(MessageParseError::EmptyPrefix));
        assert!(matches!(
            ParsedMessage::parse(":prefix.only"),
            Err(MessageParseError::InvalidCommand { .. })
        ));
        assert!(matches!(
            ParsedMessage::parse("12 foo"),
            Err(MessageParseError::InvalidCommand { position: 0 })
        ));
        assert!(matches!(
            ParsedMessage::parse("PRIV-MSG x"),
            Err(MessageParseError::InvalidCommand { .. })
        ));
    }
}
