//! Error types for the IRC wire layer.
//!
//! This module defines error types for line framing, message parsing
//! and SASL mechanism failures.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Top-level protocol errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Line exceeded the maximum allowed length.
    #[error("message too long: {actual} bytes (limit: {limit})")]
    MessageTooLong {
        /// Actual line length.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },

    /// The configured character encoding is not known.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Failed to parse an IRC message.
    #[error("invalid message: {string}")]
    InvalidMessage {
        /// The invalid message string.
        string: String,
        /// The underlying parse error.
        #[source]
        cause: MessageParseError,
    },
}

/// Errors encountered when parsing IRC messages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageParseError {
    /// Message was empty (or contained only NUL bytes and line endings).
    #[error("empty message")]
    EmptyMessage,

    /// Command token was missing or malformed.
    #[error("invalid command at position {position}")]
    InvalidCommand {
        /// Byte offset into the line where the command was expected.
        position: usize,
    },

    /// A prefix marker was present with no prefix text.
    #[error("empty prefix")]
    EmptyPrefix,
}

/// Errors raised by SASL mechanisms and the SASL context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SaslError {
    /// The mechanism cannot be used with the current credentials or transport.
    #[error("{0}")]
    NotPossible(&'static str),

    /// `step` was called before a mechanism was selected.
    #[error("current mechanism is NULL")]
    NoMechanism,

    /// The server challenge was not valid base64.
    #[error("invalid base64 challenge: {0}")]
    InvalidChallenge(String),

    /// The mechanism was stepped after it already completed.
    #[error("mechanism {0} has already completed")]
    AlreadyComplete(&'static str),
}
