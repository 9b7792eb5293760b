use smallvec::SmallVec;

use crate::command::CommandKey;
use crate::prefix::mask_nick;

/// Handler-facing argument list, padded to a declared arity.
pub type Args<'a> = SmallVec<[&'a str; 15]>;

/// An owned IRC message.
///
/// ```
/// use purple_proto::Message;
///
/// let msg: Message = ":srv 433 * desirednick :Nickname is already in use".parse().unwrap();
/// assert_eq!(msg.command, "433");
/// assert_eq!(msg.padded(2).as_slice(), &["*", "desirednick"][..]);
/// ```
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Message {
    /// Message source. `None` means the line came from the server itself.
    pub prefix: Option<String>,
    /// The command token, numerics kept as their three digits.
    pub command: String,
    /// Ordered arguments, the trailing one included.
    pub args: Vec<String>,
}

impl Message {
    /// Build a message with no prefix.
    pub fn new<C, I, A>(command: C, args: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            prefix: None,
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Attach a prefix.
    #[must_use]
    pub fn with_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Dispatch key for this message's command.
    pub fn key(&self) -> CommandKey {
        CommandKey::classify(&self.command)
    }

    /// Nickname portion of the prefix.
    pub fn source_nick(&self) -> Option<&str> {
        self.prefix.as_deref().map(mask_nick)
    }

    /// Argument `index`, or the empty string when absent.
    pub fn arg(&self, index: usize) -> &str {
        self.args.get(index).map(String::as_str).unwrap_or("")
    }

    /// Arguments padded with empty strings to at least `arity` entries.
    ///
    /// Extra arguments beyond `arity` are kept.
    pub fn padded(&self, arity: usize) -> Args<'_> {
        let mut args: Args<'_> = self.args.iter().map(String::as_str).collect();
        while args.len() < arity {
            args.push("");
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_fills_missing() {
        let msg = Message::new("KICK", ["#chan"]);
        assert_eq!(msg.padded(3).as_slice(), &["#chan", "", ""]);
    }

    #[test]
    fn test_padded_keeps_extra() {
        let msg = Message::new("PRIVMSG", ["a", "b", "c"]);
        assert_eq!(msg.padded(1).len(), 3);
    }

    #[test]
    fn test_source_nick() {
        let msg = Message::new("JOIN", ["#c"]).with_prefix("alice!a@host");
        assert_eq!(msg.source_nick(), Some("alice"));
        assert_eq!(Message::new("PING", ["x"]).source_nick(), None);
    }

    #[test]
    fn test_arg_out_of_range() {
        let msg = Message::new("PING", Vec::<String>::new());
        assert_eq!(msg.arg(0), "");
    }
}
