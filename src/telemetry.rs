//! Tracing setup and the spans shared by the connection task and dispatch.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(true)
        .init();
}

/// Standardized span constructors.
pub mod spans {
    use std::fmt::Display;

    use tracing::{Span, debug_span, info_span};

    /// Span for one account's connection task.
    pub fn connection(server: &str, nick: &str) -> Span {
        info_span!("connection", server = %server, nick = %nick)
    }

    /// Span for one dispatched command.
    pub fn command(command: &dyn Display, source: Option<&str>) -> Span {
        match source {
            Some(source) => debug_span!("irc.command", command = %command, source_nick = %source),
            None => debug_span!("irc.command", command = %command),
        }
    }
}
