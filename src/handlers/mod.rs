//! Inbound IRC message handlers.
//!
//! Handlers are plain functions over `(&mut Session, &Message, &[&str])`
//! registered in [`Registry`]. They mutate the session and queue outbound
//! lines and events on it; they never touch the socket.

pub mod core;

mod buddy;
mod channel;
mod list;
mod messaging;
mod misc;
mod registration;
mod sasl;
mod whois;

pub use self::core::{Handler, HandlerEntry, Registry};

use purple_proto::Message;

/// Nick of the message source, empty for server-less lines.
pub(crate) fn source_nick(msg: &Message) -> &str {
    msg.source_nick().unwrap_or("")
}
