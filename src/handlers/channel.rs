//! Channel membership, topics, modes and channel-related error numerics.

use chrono::{DateTime, Utc};
use purple_proto::casemap::irc_eq;
use purple_proto::format::{LineBuilder, strip_mirc};
use purple_proto::prefix::{is_channel, mask_userhost};
use purple_proto::Message;
use tracing::{debug, error, info};

use super::source_nick;
use crate::error::HandlerResult;
use crate::events::{ChatUserFlags, Event, NotifyLevel};
use crate::session::Session;
use crate::session::whois::seconds_to_string;

/// Canonical name of a joined channel.
fn joined(session: &Session, channel: &str) -> Option<String> {
    session.conversations.chat(channel).map(|c| c.name.clone())
}

fn is_self(session: &Session, nick: &str) -> bool {
    irc_eq(nick, session.display_nick())
}

pub(crate) fn join(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    let nick = source_nick(msg);
    let channel = args[0];

    if is_self(session, nick) {
        let id = session.conversations.join(channel);
        if let Some(chat) = session.conversations.chat_mut(channel) {
            chat.names_seen = false;
        }
        info!(channel = %channel, "joined");
        session.emit(Event::ChatJoined {
            id,
            channel: channel.to_string(),
        });
        // Real names and hosts of everyone already there.
        session.send_builder(LineBuilder::new("WHO").channel(channel));
        return Ok(());
    }

    let userhost = msg.prefix.as_deref().map(mask_userhost).unwrap_or("");
    let Some(chat) = session.conversations.chat_mut(channel) else {
        error!(channel = %channel, "JOIN for a channel we are not in");
        return Ok(());
    };
    chat.add_user(nick, ChatUserFlags::NONE, Some(userhost));
    let name = chat.name.clone();
    session.emit(Event::ChatUserJoined {
        channel: name,
        nick: nick.to_string(),
        userhost: userhost.to_string(),
    });

    if let Some((name, status)) = session.buddies.set_pending(nick, true) {
        session.emit(Event::BuddyStatus { name, status });
    }
    Ok(())
}

pub(crate) fn part(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    // Some networks send the channel as a trailing argument.
    let channel = args[0].strip_prefix(':').unwrap_or(args[0]);
    let Some(name) = joined(session, channel) else {
        debug!(channel = %channel, "PART for a channel we are not in");
        return Ok(());
    };

    let nick = source_nick(msg);
    let reason = msg.args.get(1).map(String::as_str);

    if is_self(session, nick) {
        let text = match reason.filter(|r| !r.is_empty()) {
            Some(reason) => format!("You have parted the channel: {reason}"),
            None => "You have parted the channel".to_string(),
        };
        session.system_message(&name, text);
        session.conversations.leave(&name);
        session.emit(Event::ChatLeft { channel: name });
        return Ok(());
    }

    if let Some(chat) = session.conversations.chat_mut(&name) {
        chat.remove_user(nick);
    }
    session.emit(Event::ChatUserLeft {
        channel: name,
        nick: nick.to_string(),
        reason: reason.map(|r| strip_mirc(r).into_owned()),
    });
    Ok(())
}

pub(crate) fn kick(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    let Some(name) = joined(session, args[0]) else {
        error!(channel = %args[0], "KICK for a channel we are not in");
        return Ok(());
    };
    let by = source_nick(msg);

    if is_self(session, args[1]) {
        session.system_message(&name, format!("You have been kicked by {by}: ({})", args[2]));
        session.conversations.leave(&name);
        session.emit(Event::ChatLeft { channel: name });
        return Ok(());
    }

    let removed = session
        .conversations
        .chat_mut(&name)
        .and_then(|chat| chat.remove_user(args[1]));
    if let Some(user) = removed {
        session.emit(Event::ChatUserLeft {
            channel: name,
            nick: user.nick,
            reason: Some(format!("Kicked by {by} ({})", args[2])),
        });
    }
    Ok(())
}

/// MODE on a channel: report it and track op/halfop/voice/founder.
/// User modes are ignored.
pub(crate) fn mode(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    if !is_channel(args[0]) {
        return Ok(());
    }
    let Some(name) = joined(session, args[0]) else {
        error!(channel = %args[0], "MODE for a channel we are not in");
        return Ok(());
    };

    let targets = args[2..].join(" ");
    let by = source_nick(msg);
    session.system_message(&name, format!("mode ({} {targets}) by {by}", args[1]));

    if args.len() < 3 {
        return Ok(());
    }

    let founder_known = session.mode_chars.contains('~');
    let mut changes = Vec::new();
    if let Some(chat) = session.conversations.chat_mut(&name) {
        let mut add = false;
        let mut tokens = targets.split(' ');
        for mode in args[1].chars() {
            if mode == '+' || mode == '-' {
                add = mode == '+';
                continue;
            }
            // Every mode letter takes one parameter.
            let Some(target) = tokens.next().filter(|t| !t.is_empty()) else {
                break;
            };
            let flag = match mode {
                'o' => ChatUserFlags::OP,
                'h' => ChatUserFlags::HALFOP,
                'v' => ChatUserFlags::VOICE,
                'q' if founder_known => ChatUserFlags::FOUNDER,
                _ => continue,
            };
            let Some(user) = chat.user_mut(target) else {
                continue;
            };
            if add {
                user.flags.insert(flag);
            } else {
                user.flags.remove(flag);
            }
            changes.push((user.nick.clone(), user.flags));
        }
    }

    for (nick, flags) in changes {
        session.emit(Event::ChatUserFlags {
            channel: name.clone(),
            nick,
            flags,
        });
    }
    Ok(())
}

/// NICK: someone, maybe us, changed nick.
pub(crate) fn nick(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    let old = source_nick(msg).to_string();
    let new = args[0];
    session.nickused = false;

    if is_self(session, &old) {
        session.set_display_nick(new);
    }

    let mut renamed = Vec::new();
    for chat in session.conversations.chats_mut() {
        if chat.rename_user(&old, new) {
            renamed.push(chat.name.clone());
        }
    }
    renamed.sort();
    for channel in renamed {
        session.emit(Event::ChatUserRenamed {
            channel,
            old: old.clone(),
            new: new.to_string(),
        });
    }

    if session.conversations.rename_im(&old, new) {
        session.emit(Event::ImRenamed {
            old,
            new: new.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn quit(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    let nick = source_nick(msg);
    let reason = format!("quit: {}", strip_mirc(args[0]));

    let mut left = Vec::new();
    for chat in session.conversations.chats_mut() {
        if chat.remove_user(nick).is_some() {
            left.push(chat.name.clone());
        }
    }
    left.sort();
    for channel in left {
        session.emit(Event::ChatUserLeft {
            channel,
            nick: nick.to_string(),
            reason: Some(reason.clone()),
        });
    }

    if let Some((name, status)) = session.buddies.set_pending(nick, false) {
        session.emit(Event::BuddyStatus { name, status });
    }
    Ok(())
}

/// TOPIC, 331 and 332.
pub(crate) fn topic(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    let interactive = msg.command.eq_ignore_ascii_case("TOPIC");
    let (channel, raw) = if interactive {
        (args[0], args[1])
    } else {
        (args[1], args[2])
    };
    let topic = strip_mirc(raw).into_owned();

    let Some(chat) = session.conversations.chat_mut(channel) else {
        error!(channel = %channel, "topic for a channel we are not in");
        return Ok(());
    };
    let name = chat.name.clone();

    if interactive {
        if chat.topic.as_deref() == Some(topic.as_str()) {
            return Ok(());
        }
        chat.topic = Some(topic.clone());
        let by = source_nick(msg).to_string();
        let text = if topic.is_empty() {
            format!("{by} has cleared the topic.")
        } else {
            format!("{by} has changed the topic to: {topic}")
        };
        session.emit(Event::ChatTopic {
            channel: name.clone(),
            who: Some(by),
            topic,
        });
        session.system_message(&name, text);
    } else {
        chat.topic = Some(topic.clone());
        let text = format!("The topic for {name} is: {topic}");
        session.emit(Event::ChatTopic {
            channel: name.clone(),
            who: None,
            topic,
        });
        session.system_message(&name, text);
    }
    Ok(())
}

/// 333: who set the topic and when.
pub(crate) fn topic_info(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    let Some(name) = joined(session, args[1]) else {
        error!(channel = %args[1], "topic info for a channel we are not in");
        return Ok(());
    };

    let set_at = args[3]
        .parse::<i64>()
        .ok()
        .filter(|t| *t != 0)
        .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0));
    let Some(set_at) = set_at else {
        error!(timestamp = %args[3], "nonsensical topic timestamp");
        return Ok(());
    };

    session.system_message(
        &name,
        format!(
            "Topic for {name} set by {} at {} on {}",
            args[2],
            set_at.format("%H:%M:%S"),
            set_at.format("%Y-%m-%d"),
        ),
    );
    Ok(())
}

/// 353 accumulates, 366 applies.
///
/// The first NAMES after joining populates the member list; later ones
/// (from an explicit /names) are printed.
pub(crate) fn names(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    if msg.command == "353" {
        let names = session.names.get_or_insert_with(String::new);
        if !names.is_empty() && !names.ends_with(' ') {
            names.push(' ');
        }
        names.push_str(args[3]);
        return Ok(());
    }

    let collected = session.names.take();
    let Some(chat) = session.conversations.chat(args[1]) else {
        error!(channel = %args[1], "NAMES list for a channel we are not in");
        return Ok(());
    };
    let name = chat.name.clone();

    if chat.names_seen {
        let text = format!("Users on {}: {}", args[1], collected.unwrap_or_default());
        session.system_message(&name, text);
        return Ok(());
    }
    let Some(collected) = collected else {
        return Ok(());
    };

    let users: Vec<(String, ChatUserFlags)> = collected
        .split(' ')
        .filter(|entry| !entry.is_empty())
        .map(|entry| parse_names_entry(entry, &session.mode_chars))
        .collect();

    if let Some(chat) = session.conversations.chat_mut(&name) {
        for (nick, flags) in &users {
            chat.add_user(nick, *flags, None);
        }
        chat.names_seen = true;
    }
    if !users.is_empty() {
        session.emit(Event::ChatUsersAdded {
            channel: name,
            users,
        });
    }
    Ok(())
}

/// Split one NAMES entry into nick and flags. Only the first prefix
/// character counts.
fn parse_names_entry(entry: &str, mode_chars: &str) -> (String, ChatUserFlags) {
    let mut chars = entry.chars();
    let (flags, nick) = match chars.next() {
        Some('@') => (ChatUserFlags::OP, chars.as_str()),
        Some('%') => (ChatUserFlags::HALFOP, chars.as_str()),
        Some('+') => (ChatUserFlags::VOICE, chars.as_str()),
        Some('~') if mode_chars.contains('~') => (ChatUserFlags::FOUNDER, chars.as_str()),
        Some(c) if mode_chars.contains(c) => (ChatUserFlags::NONE, chars.as_str()),
        _ => (ChatUserFlags::NONE, entry),
    };
    (nick.to_string(), flags)
}

/// 352: WHO reply, fills in userhost, real name and away state.
pub(crate) fn who(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    let Some(chat) = session.conversations.chat_mut(args[1]) else {
        error!(channel = %args[1], "WHO reply for a channel we are not in");
        return Ok(());
    };
    let channel = chat.name.clone();
    let Some(user) = chat.user_mut(args[5]) else {
        error!(channel = %channel, nick = %args[5], "WHO reply for someone not in the channel");
        return Ok(());
    };

    user.userhost = Some(format!("{}@{}", args[2], args[3]));
    // Trailing argument is "<hopcount> <real name>".
    let realname = args[7].split_once(' ').map(|(_, real)| real).unwrap_or("");
    user.realname = Some(realname.to_string());

    let before = user.flags;
    match args[6].chars().next() {
        Some('G') => user.flags.insert(ChatUserFlags::AWAY),
        Some('H') => user.flags.remove(ChatUserFlags::AWAY),
        _ => {}
    }
    if user.flags != before {
        let (nick, flags) = (user.nick.clone(), user.flags);
        session.emit(Event::ChatUserFlags {
            channel,
            nick,
            flags,
        });
    }
    Ok(())
}

/// 324
pub(crate) fn chan_mode(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    let Some(name) = joined(session, args[1]) else {
        return Ok(());
    };
    let params = args[3..].join(" ");
    session.system_message(&name, format!("mode for {}: {} {params}", args[1], args[2]));
    Ok(())
}

/// 367 / 368: ban list entries.
pub(crate) fn ban(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    let chat = joined(session, args[1]);

    if msg.command == "368" {
        if let Some(name) = chat {
            session.system_message(&name, "End of ban list");
        }
        return Ok(());
    }

    let (by, when) = (msg.arg(3), msg.arg(4));
    let ago = when
        .parse::<i64>()
        .ok()
        .and_then(|set| Utc::now().timestamp().checked_sub(set))
        .map(|secs| secs.max(0).unsigned_abs());
    let text = match ago {
        Some(ago) if !by.is_empty() => {
            format!("Ban on {} by {by}, set {} ago", args[2], seconds_to_string(ago))
        }
        _ if !by.is_empty() => format!("Ban on {} by {by}", args[2]),
        _ => format!("Ban on {}", args[2]),
    };

    match chat {
        Some(name) => session.system_message(&name, text),
        None => info!("{text}"),
    }
    Ok(())
}

/// 478
pub(crate) fn ban_list_full(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    if let Some(name) = joined(session, args[1]) {
        session.system_message(&name, format!("Cannot ban {}: banlist is full", args[2]));
    }
    Ok(())
}

/// 403
pub(crate) fn no_channel(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.notify(NotifyLevel::Error, None, "No such channel", args[1]);
    Ok(())
}

/// 404 / 506
pub(crate) fn cannot_send(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    match joined(session, args[1]) {
        Some(name) => session.system_message(&name, args[2]),
        None => session.notify(NotifyLevel::Error, None, "Could not send", args[2]),
    }
    Ok(())
}

/// 442
pub(crate) fn not_in_channel(
    session: &mut Session,
    _msg: &Message,
    args: &[&str],
) -> HandlerResult {
    debug!(channel = %args[1], "server says we are not in this channel");
    if let Some(name) = joined(session, args[1]) {
        session.system_message(&name, args[2]);
    }
    Ok(())
}

/// 482
pub(crate) fn not_op(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    if let Some(name) = joined(session, args[1]) {
        session.system_message(&name, args[2]);
    }
    Ok(())
}

pub(crate) fn invite(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    session.emit(Event::ChatInvite {
        channel: args[1].to_string(),
        from: source_nick(msg).to_string(),
    });
    Ok(())
}

/// 471
pub(crate) fn channel_full(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.notify(
        NotifyLevel::Error,
        Some("Channel full"),
        "Channel full",
        format!("Cannot join {}: the channel is full.", args[1]),
    );
    Ok(())
}

/// 473
pub(crate) fn invite_only(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.notify(
        NotifyLevel::Error,
        Some("Invitation only"),
        "Invitation only",
        format!("Joining {} requires an invitation.", args[1]),
    );
    Ok(())
}

/// 474
pub(crate) fn banned(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.notify(
        NotifyLevel::Error,
        Some("Banned"),
        "Banned",
        format!("You are banned from {}.", args[1]),
    );
    Ok(())
}

/// 475
pub(crate) fn bad_key(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.notify(
        NotifyLevel::Error,
        Some("Bad key"),
        "Bad key",
        format!("Cannot join {}: bad channel key.", args[1]),
    );
    Ok(())
}

/// 477 / 515. Some networks send this for channels we already joined;
/// those are ignored.
pub(crate) fn registration_required(
    session: &mut Session,
    _msg: &Message,
    args: &[&str],
) -> HandlerResult {
    if joined(session, args[1]).is_some() {
        return Ok(());
    }
    session.notify(
        NotifyLevel::Error,
        Some("Cannot join channel"),
        format!("Cannot join {}: Registration is required.", args[1]),
        args[2],
    );
    Ok(())
}
