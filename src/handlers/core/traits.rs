//! Handler trait.

use purple_proto::Message;

use crate::error::HandlerResult;
use crate::session::Session;

/// Handles one inbound command.
///
/// `args` holds the message arguments padded with empty strings up to the
/// arity the handler was registered with, so positional access never goes
/// out of bounds. An `Err` is fatal for the connection.
pub trait Handler: Send + Sync {
    fn handle(&self, session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut Session, &Message, &[&str]) -> HandlerResult + Send + Sync,
{
    fn handle(&self, session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
        self(session, msg, args)
    }
}
