//! Command keys used by the dispatch table.

use std::fmt;

/// Tagged key for a command: a three-digit numeric reply or a verb.
///
/// Verbs are stored uppercase so lookups are case-insensitive.
///
/// ```
/// use purple_proto::CommandKey;
///
/// assert_eq!(CommandKey::classify("433"), CommandKey::Numeric(433));
/// assert_eq!(CommandKey::classify("privmsg"), CommandKey::Verb("PRIVMSG".into()));
/// assert_eq!(CommandKey::classify("4333"), CommandKey::Verb("4333".into()));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKey {
    /// A three-digit numeric reply.
    Numeric(u16),
    /// A named command, uppercase.
    Verb(String),
}

impl CommandKey {
    /// Classify a raw command token.
    pub fn classify(token: &str) -> Self {
        if token.len() == 3 && token.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = token.parse() {
                return CommandKey::Numeric(n);
            }
        }
        CommandKey::Verb(token.to_ascii_uppercase())
    }

    /// Shorthand for a verb key.
    pub fn verb(name: &str) -> Self {
        CommandKey::Verb(name.to_ascii_uppercase())
    }

    /// Returns the numeric value if this is a numeric reply.
    pub fn numeric(&self) -> Option<u16> {
        match self {
            CommandKey::Numeric(n) => Some(*n),
            CommandKey::Verb(_) => None,
        }
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKey::Numeric(n) => write!(f, "{:03}", n),
            CommandKey::Verb(v) => f.write_str(v),
        }
    }
}

impl From<u16> for CommandKey {
    fn from(n: u16) -> Self {
        CommandKey::Numeric(n)
    }
}

impl From<&str> for CommandKey {
    fn from(token: &str) -> Self {
        CommandKey::classify(token)
    }
}
