//! Outbound line formatting and mIRC formatting-code handling.
//!
//! [`LineBuilder`] is the only way the IRC plugin produces outbound lines.
//! Each argument is typed so callers state what a slot holds; all kinds
//! are scrubbed of CR and LF so one call always yields exactly one line.

use std::borrow::Cow;

/// One argument slot of an outbound line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arg<'a> {
    /// Passed through as-is (after CR/LF removal).
    Verbatim(&'a str),
    /// A nickname.
    Nick(&'a str),
    /// A channel name.
    Channel(&'a str),
    /// Free text; always emitted with a leading `:`.
    Trailing(&'a str),
}

impl<'a> Arg<'a> {
    fn text(&self) -> &'a str {
        match *self {
            Arg::Verbatim(s) | Arg::Nick(s) | Arg::Channel(s) | Arg::Trailing(s) => s,
        }
    }
}

/// Builder for one outbound IRC line.
///
/// ```
/// use purple_proto::format::{Arg, LineBuilder};
///
/// let line = LineBuilder::new("USER")
///     .arg(Arg::Verbatim("ident"))
///     .arg(Arg::Verbatim("*"))
///     .arg(Arg::Verbatim("irc.example.net"))
///     .arg(Arg::Trailing("Real Name"))
///     .build();
/// assert_eq!(line, "USER ident * irc.example.net :Real Name\r\n");
///
/// // A final argument with a space is promoted to a trailing argument.
/// let line = LineBuilder::new("AWAY").verbatim("gone fishing").build();
/// assert_eq!(line, "AWAY :gone fishing\r\n");
/// ```
#[derive(Clone, Debug)]
pub struct LineBuilder<'a> {
    command: &'a str,
    args: Vec<Arg<'a>>,
}

impl<'a> LineBuilder<'a> {
    /// Start a line for `command`.
    pub fn new(command: &'a str) -> Self {
        Self {
            command,
            args: Vec::new(),
        }
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: Arg<'a>) -> Self {
        self.args.push(arg);
        self
    }

    /// Append a verbatim argument.
    #[must_use]
    pub fn verbatim(self, s: &'a str) -> Self {
        self.arg(Arg::Verbatim(s))
    }

    /// Append a nickname argument.
    #[must_use]
    pub fn nick(self, s: &'a str) -> Self {
        self.arg(Arg::Nick(s))
    }

    /// Append a channel argument.
    #[must_use]
    pub fn channel(self, s: &'a str) -> Self {
        self.arg(Arg::Channel(s))
    }

    /// Append a trailing argument.
    #[must_use]
    pub fn trailing(self, s: &'a str) -> Self {
        self.arg(Arg::Trailing(s))
    }

    /// Append an argument only when `value` is `Some`.
    #[must_use]
    pub fn opt(self, value: Option<Arg<'a>>) -> Self {
        match value {
            Some(arg) => self.arg(arg),
            None => self,
        }
    }

    /// Render the line, CRLF included.
    pub fn build(&self) -> String {
        let mut line = String::with_capacity(64);
        line.push_str(&strip_newlines(self.command));

        let last = self.args.len().saturating_sub(1);
        for (i, arg) in self.args.iter().enumerate() {
            let text = strip_newlines(arg.text());
            line.push(' ');
            let colon = matches!(arg, Arg::Trailing(_)) || (i == last && needs_colon(&text));
            if colon {
                line.push(':');
            }
            line.push_str(&text);
        }

        line.push_str("\r\n");
        line
    }
}

/// True when a final argument must be sent with a leading `:`.
pub fn needs_colon(arg: &str) -> bool {
    arg.is_empty() || arg.contains(' ') || arg.starts_with(':')
}

/// Remove CR and LF characters.
pub fn strip_newlines(s: &str) -> Cow<'_, str> {
    if s.contains(['\r', '\n']) {
        Cow::Owned(s.chars().filter(|c| *c != '\r' && *c != '\n').collect())
    } else {
        Cow::Borrowed(s)
    }
}

/// Returns true if the character is an IRC formatting code.
#[inline]
pub fn is_irc_format_code(ch: char) -> bool {
    matches!(
        ch,
        '\x02' | '\x03' | '\x04' | '\x0F' | '\x11' | '\x16' | '\x1D' | '\x1E' | '\x1F'
    )
}

/// Strip mIRC formatting codes (bold, colour, reset, reverse, italic,
/// underline and friends) from `s`.
///
/// A colour code swallows up to two foreground digits and, after a comma,
/// up to two background digits.
///
/// ```
/// use purple_proto::format::strip_mirc;
///
/// assert_eq!(strip_mirc("\x02bold\x02 \x0304,12red\x0f"), "bold red");
/// assert_eq!(strip_mirc("plain"), "plain");
/// ```
pub fn strip_mirc(s: &str) -> Cow<'_, str> {
    if !s.contains(is_irc_format_code) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x03' {
            skip_digits(&mut chars);
            let mut lookahead = chars.clone();
            if lookahead.next() == Some(',')
                && lookahead.peek().is_some_and(|d| d.is_ascii_digit())
            {
                chars.next();
                skip_digits(&mut chars);
            }
        } else if !is_irc_format_code(c) {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

fn skip_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    for _ in 0..2 {
        match chars.peek() {
            Some(d) if d.is_ascii_digit() => {
                chars.next();
            }
            _ => break,
        }
    }
}
