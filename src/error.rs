//! Error handling for the IRC protocol plugin.
//!
//! Connection-fatal conditions are [`ConnectionError`]s. Each one maps to a
//! [`ConnectionErrorKind`] the surrounding application uses to decide how to
//! present it (retry, prompt for settings, ask for a new password).

use thiserror::Error;

// ============================================================================
// Connection Errors
// ============================================================================

/// Reason class of a connection error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionErrorKind {
    NetworkError,
    InvalidSettings,
    AuthenticationImpossible,
    AuthenticationFailed,
    EncryptionError,
    OtherError,
}

/// A condition that ends the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("{0}")]
    Network(String),

    #[error("{0}")]
    InvalidSettings(String),

    #[error("{0}")]
    AuthenticationImpossible(String),

    #[error("{0}")]
    AuthenticationFailed(String),

    #[error("{0}")]
    Encryption(String),

    #[error("{0}")]
    Other(String),
}

impl ConnectionError {
    pub fn kind(&self) -> ConnectionErrorKind {
        match self {
            Self::Network(_) => ConnectionErrorKind::NetworkError,
            Self::InvalidSettings(_) => ConnectionErrorKind::InvalidSettings,
            Self::AuthenticationImpossible(_) => ConnectionErrorKind::AuthenticationImpossible,
            Self::AuthenticationFailed(_) => ConnectionErrorKind::AuthenticationFailed,
            Self::Encryption(_) => ConnectionErrorKind::EncryptionError,
            Self::Other(_) => ConnectionErrorKind::OtherError,
        }
    }

    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "network_error",
            Self::InvalidSettings(_) => "invalid_settings",
            Self::AuthenticationImpossible(_) => "authentication_impossible",
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::Encryption(_) => "encryption_error",
            Self::Other(_) => "other_error",
        }
    }

    /// The server hung up on us.
    pub fn server_closed() -> Self {
        Self::Network("Server closed the connection".to_string())
    }

    /// Reading from the socket failed.
    pub fn lost(err: impl std::fmt::Display) -> Self {
        Self::Network(format!("Lost connection with server: {err}"))
    }

    /// Writing to the socket failed.
    pub fn write_failed(err: impl std::fmt::Display) -> Self {
        Self::Network(format!("Error writing to server: {err}"))
    }

    /// The transport could not be established.
    pub fn unable_to_connect(err: impl std::fmt::Display) -> Self {
        Self::Network(format!("Unable to connect: {err}"))
    }
}

impl From<std::io::Error> for ConnectionError {
    fn from(err: std::io::Error) -> Self {
        Self::lost(err)
    }
}

impl From<purple_proto::ProtocolError> for ConnectionError {
    fn from(err: purple_proto::ProtocolError) -> Self {
        match err {
            purple_proto::ProtocolError::Io(io) => Self::lost(io),
            purple_proto::ProtocolError::UnknownEncoding(label) => {
                Self::InvalidSettings(format!("Unknown encoding: {label}"))
            }
            other => Self::Other(other.to_string()),
        }
    }
}

/// Result type for message handlers.
///
/// An `Err` is connection-fatal: the session records it, reports it and the
/// driver tears the connection down after flushing pending lines.
pub type HandlerResult = Result<(), ConnectionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ConnectionError::InvalidSettings("x".into()).kind(),
            ConnectionErrorKind::InvalidSettings
        );
        assert_eq!(
            ConnectionError::Encryption("x".into()).kind(),
            ConnectionErrorKind::EncryptionError
        );
        assert_eq!(ConnectionError::server_closed().kind(), ConnectionErrorKind::NetworkError);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(ConnectionError::Network("x".into()).error_code(), "network_error");
        assert_eq!(
            ConnectionError::AuthenticationImpossible("x".into()).error_code(),
            "authentication_impossible"
        );
        assert_eq!(ConnectionError::Other("x".into()).error_code(), "other_error");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ConnectionError::server_closed().to_string(),
            "Server closed the connection"
        );
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(
            ConnectionError::from(io).to_string(),
            "Lost connection with server: reset"
        );
        assert_eq!(
            ConnectionError::unable_to_connect("refused").to_string(),
            "Unable to connect: refused"
        );
    }
}
