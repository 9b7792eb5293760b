//! PRIVMSG, NOTICE and WALLOPS, including CTCP.

use std::borrow::Cow;

use purple_proto::casemap::irc_eq;
use purple_proto::format::{LineBuilder, strip_mirc};
use purple_proto::{Ctcp, CtcpKind, Message};
use tracing::{debug, info};

use super::source_nick;
use crate::error::HandlerResult;
use crate::events::{Event, NotifyLevel};
use crate::session::{Session, monotonic_micros};

/// Answer to CTCP VERSION.
pub const CLIENT_VERSION: &str = concat!("purple-irc ", env!("CARGO_PKG_VERSION"));

pub(crate) fn privmsg(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    incoming(session, msg, args, false);
    Ok(())
}

pub(crate) fn notice(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    incoming(session, msg, args, true);
    Ok(())
}

fn incoming(session: &mut Session, msg: &Message, args: &[&str], notice: bool) {
    let from = source_nick(msg);
    let to = args[0];

    let Some(body) = ctcp(session, from, to, args[1], notice) else {
        return;
    };
    let body = strip_mirc(&body);
    let text = if notice {
        format!("(notice) {body}")
    } else {
        body.into_owned()
    };

    if irc_eq(to, session.display_nick()) {
        session.conversations.open_im(from);
        session.emit(Event::ImReceived {
            from: from.to_string(),
            text,
            auto_reply: false,
        });
        return;
    }

    let channel = session.skip_mode(to);
    match session.conversations.chat(channel).map(|c| c.name.clone()) {
        Some(name) => session.emit(Event::ChatMessage {
            channel: name,
            from: from.to_string(),
            text,
        }),
        None => debug!(
            command = if notice { "NOTICE" } else { "PRIVMSG" },
            target = %to,
            "message for a conversation that does not exist"
        ),
    }
}

/// Unwrap CTCP. Returns the text to display, or `None` when the message
/// was consumed here.
fn ctcp<'a>(
    session: &mut Session,
    from: &str,
    to: &str,
    body: &'a str,
    notice: bool,
) -> Option<Cow<'a, str>> {
    let Some(ctcp) = Ctcp::parse(body) else {
        return Some(Cow::Borrowed(body));
    };

    match ctcp.kind {
        CtcpKind::Action => Some(Cow::Owned(format!("/me {}", ctcp.params.unwrap_or("")))),
        CtcpKind::Version if !notice => {
            let reply = Ctcp::version_reply(CLIENT_VERSION).to_string();
            session.send_builder(LineBuilder::new("NOTICE").nick(from).trailing(&reply));
            None
        }
        CtcpKind::Ping if notice => {
            let elapsed = ctcp
                .params
                .and_then(|p| p.trim().parse::<i64>().ok())
                .and_then(|sent| monotonic_micros().checked_sub(sent));
            let text = match elapsed {
                Some(micros) => {
                    let lag = micros as f64 / 1_000_000.0;
                    format!("Reply time from {from}: {lag:.3} seconds")
                }
                None => format!("Invalid PING reply from {from}"),
            };
            session.notify(NotifyLevel::Info, Some("PONG"), "CTCP PING reply", text);
            None
        }
        CtcpKind::Ping => {
            // Echo the request back verbatim.
            session.send_builder(LineBuilder::new("NOTICE").nick(from).trailing(body));
            None
        }
        kind => {
            info!(ctcp = %kind, to = %to, from = %from, "ignoring CTCP");
            None
        }
    }
}

pub(crate) fn wallops(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    let primary = format!("Wallops from {}", source_nick(msg));
    session.notify(NotifyLevel::Info, None, primary, args[0]);
    Ok(())
}
