use purple_proto::Message;
use tracing::{debug, info};

use crate::error::HandlerResult;
use crate::events::NotifyLevel;
use crate::session::Session;

/// 391
pub(crate) fn time(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.notify(
        NotifyLevel::Info,
        Some("Time Response"),
        "The IRC server's local time is:",
        args[2],
    );
    Ok(())
}

/// 401 / 406: no such nick or channel. Also ends a pending WHOIS for it.
pub(crate) fn no_such_nick(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    let target = args[1];

    if let Some(chat) = session.conversations.chat(target).map(|c| c.name.clone()) {
        session.system_message(&chat, "no such channel");
    } else if let Some(im) = session.conversations.display_name(target).map(str::to_string) {
        session.system_message(&im, "User is not logged in");
    } else {
        session.notify(NotifyLevel::Error, None, "No such nick or channel", target);
    }

    if session.whois.is_for(target) {
        session.whois.nick = None;
    }
    Ok(())
}

/// 421
pub(crate) fn unknown_command(
    session: &mut Session,
    _msg: &Message,
    args: &[&str],
) -> HandlerResult {
    session.notify(
        NotifyLevel::Error,
        Some("Unknown message"),
        format!("Unknown message '{}'", args[1]),
        "The IRC server received a message it did not understand.",
    );
    Ok(())
}

/// 501
pub(crate) fn bad_mode(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.notify(NotifyLevel::Error, None, "Bad mode", args[1]);
    Ok(())
}

/// Fallback for anything without a handler.
///
/// A numeric aimed at an open conversation (`<prefix> <NNN> <me> <target>
/// <rest>`) is shown there as `NNN: rest`. Everything else is only logged.
pub(crate) fn unrecognized(session: &mut Session, raw: &str) {
    let mut tokens = raw.splitn(5, ' ');
    let (_prefix, numeric, _me, target, rest) = (
        tokens.next(),
        tokens.next(),
        tokens.next(),
        tokens.next(),
        tokens.next(),
    );

    let directed = match (numeric, target, rest) {
        (Some(numeric), Some(target), Some(rest))
            if numeric.len() == 3 && numeric.bytes().all(|b| b.is_ascii_digit()) =>
        {
            session
                .conversations
                .display_name(target)
                .map(|name| (numeric, name.to_string(), rest))
        }
        _ => None,
    };

    match directed {
        Some((numeric, name, rest)) => {
            let rest = rest.strip_prefix(':').unwrap_or(rest);
            debug!(numeric = %numeric, target = %name, "unhandled numeric for conversation");
            session.system_message(&name, format!("{numeric}: {rest}"));
        }
        None => info!(line = %raw, "Unrecognized message"),
    }
}
