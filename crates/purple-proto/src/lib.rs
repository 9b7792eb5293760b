//! # purple-proto
//!
//! IRC wire layer for the purple IRC protocol plugin: line parsing and
//! formatting, command keys, prefix helpers, RFC 1459 casemapping, a tokio
//! line codec with charset handling, and the SASL mechanism context.
//!
//! ## Parsing
//!
//! ```rust
//! use purple_proto::{CommandKey, Message};
//!
//! let msg: Message = ":nick!user@host PRIVMSG #chan :hello there".parse().unwrap();
//! assert_eq!(msg.source_nick(), Some("nick"));
//! assert_eq!(msg.key(), CommandKey::Verb("PRIVMSG".into()));
//! assert_eq!(msg.args, vec!["#chan", "hello there"]);
//! ```
//!
//! ## Formatting
//!
//! ```rust
//! use purple_proto::format::LineBuilder;
//!
//! let line = LineBuilder::new("PRIVMSG").channel("#chan").trailing("hi").build();
//! assert_eq!(line, "PRIVMSG #chan :hi\r\n");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod format;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod prefix;
pub mod sasl;
pub mod util;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::command::CommandKey;
pub use self::ctcp::{Ctcp, CtcpKind};
pub use self::error::{MessageParseError, ProtocolError, SaslError};
pub use self::format::{Arg, LineBuilder};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
pub use self::message::{Args, Message};
pub use self::prefix::{mask_nick, mask_userhost};
pub use self::sasl::{Mechanism, SaslContext};

/// Default plaintext IRC port.
pub const DEFAULT_PORT: u16 = 6667;

/// Default TLS IRC port.
pub const DEFAULT_SSL_PORT: u16 = 6697;

/// Longest message body the IRC plugin will place in a single PRIVMSG.
pub const MAX_MESSAGE_SIZE: usize = 417;
