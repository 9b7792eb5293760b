//! Connection registration and keepalive: ISUPPORT, LUSERS, MOTD, nick
//! collisions, PING/PONG and ERROR.

use purple_proto::format::LineBuilder;
use purple_proto::Message;
use tracing::{debug, error, info, warn};

use crate::error::{ConnectionError, HandlerResult};
use crate::events::NotifyLevel;
use crate::session::nick::{MAX_DIGIT_FALLBACKS, fallback_nick, random_nick};
use crate::session::{Session, monotonic_micros};

/// 005: pick up the mode prefixes from `PREFIX=(ov)@+`.
pub(crate) fn features(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    for token in args.iter().skip(1).flat_map(|arg| arg.split(' ')) {
        if let Some(prefix) = token.strip_prefix("PREFIX=") {
            if let Some((_, chars)) = prefix.split_once(')') {
                debug!(mode_chars = %chars, "server mode prefixes");
                session.mode_chars = chars.to_string();
            }
        }
    }
    Ok(())
}

/// 251 completes registration on servers that skip the MOTD.
pub(crate) fn luser(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    if msg.command == "251" {
        session.connected(args[0]);
    }
    Ok(())
}

pub(crate) fn motd(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    match msg.command.as_str() {
        "375" => session.motd = Some(String::new()),
        "372" => match session.motd.as_mut() {
            Some(motd) => {
                motd.push_str(msg.arg(1));
                motd.push('\n');
            }
            None => error!("IRC server sent MOTD without STARTMOTD"),
        },
        "376" => session.connected(args[0]),
        "422" => {
            session.motd = None;
            session.connected(args[0]);
        }
        _ => {}
    }
    Ok(())
}

/// 432: the nick was refused. Fatal while registering.
pub(crate) fn bad_nick(session: &mut Session, _msg: &Message, _args: &[&str]) -> HandlerResult {
    if session.is_connected() {
        session.notify(
            NotifyLevel::Error,
            Some("Invalid nickname"),
            "Invalid nickname",
            "Your selected nickname was rejected by the server.  It probably contains invalid characters.",
        );
        return Ok(());
    }
    Err(ConnectionError::InvalidSettings(
        "Your selected account name was rejected by the server.  It probably contains invalid characters."
            .into(),
    ))
}

/// 433: nick in use.
///
/// While registering, a fallback nick is derived and sent. After
/// registration the change is refused and the user is told.
pub(crate) fn nick_used(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    let rejected = args[1];

    if session.is_connected() {
        let requested = session.reqnick.take().unwrap_or_else(|| rejected.to_string());
        session.notify(
            NotifyLevel::Error,
            Some("Nickname in use"),
            "Nickname in use",
            format!("The nickname \"{requested}\" is already being used."),
        );
        return Ok(());
    }

    let reqnick = session.reqnick.clone().unwrap_or_default();
    let candidate = if session.fallbacks >= MAX_DIGIT_FALLBACKS {
        random_nick(session.account.nick.as_str())
    } else {
        fallback_nick(rejected, &reqnick, session.nickused)
    };
    session.fallbacks += 1;
    info!(rejected = %rejected, trying = %candidate, "nick in use");

    session.send_builder(LineBuilder::new("NICK").nick(&candidate));
    session.set_display_nick(&candidate);
    session.reqnick = Some(candidate);
    session.nickused = true;
    Ok(())
}

pub(crate) fn unavailable(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.notify(
        NotifyLevel::Error,
        None,
        "Nick or channel is temporarily unavailable.",
        args[1],
    );
    Ok(())
}

pub(crate) fn nick_change_refused(
    session: &mut Session,
    _msg: &Message,
    args: &[&str],
) -> HandlerResult {
    session.notify(
        NotifyLevel::Error,
        Some("Cannot change nick"),
        "Could not change nick",
        args[2],
    );
    Ok(())
}

pub(crate) fn ping(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.send_builder(LineBuilder::new("PONG").trailing(args[0]));
    Ok(())
}

/// PONG for a PING we sent with a conversation target: `<target> <stamp>`.
/// Keepalive replies carry no target and are dropped.
pub(crate) fn pong(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    let Some((target, stamp)) = args[1].split_once(' ') else {
        return Ok(());
    };

    let elapsed = stamp
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|sent| monotonic_micros().checked_sub(sent));
    let text = match elapsed {
        Some(micros) => {
            let lag = micros as f64 / 1_000_000.0;
            format!("PING reply -- Lag: {lag:.6} seconds")
        }
        None => "Error: invalid PONG from server".to_string(),
    };

    if session.conversations.is_known(target) {
        session.system_message(target, text);
    } else {
        session.notify(NotifyLevel::Info, Some("PONG"), text, "");
    }
    Ok(())
}

pub(crate) fn error(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    if session.quitting {
        debug!(error = %args[0], "server error after QUIT");
        return Ok(());
    }
    warn!(error = %args[0], "server sent ERROR");
    let text = if args[0].is_empty() {
        "Unknown error"
    } else {
        args[0]
    };
    Err(ConnectionError::Network(text.to_string()))
}
