use purple_proto::Message;
use tracing::{debug, warn};

use crate::error::HandlerResult;
use crate::events::Event;
use crate::session::Session;

/// 301: away reply, either part of a pending WHOIS or an auto-response to
/// an IM we sent.
pub(crate) fn away(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    if session.whois.is_for(args[1]) {
        return whois(session, msg, args);
    }
    session.emit(Event::ImReceived {
        from: args[1].to_string(),
        text: args[2].to_string(),
        auto_reply: true,
    });
    Ok(())
}

pub(crate) fn whois(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    if !expected(session, msg, args[1]) {
        return Ok(());
    }

    let info = &mut session.whois;
    match msg.command.as_str() {
        "301" => info.away = Some(args[2].to_string()),
        "311" => {
            info.ident = Some(args[2].to_string());
            info.host = Some(args[3].to_string());
            info.real = Some(args[5].to_string());
        }
        "312" => {
            info.server = Some(args[2].to_string());
            info.serverinfo = Some(args[3].to_string());
        }
        "313" => info.ircop = true,
        "317" => {
            info.idle = args[2].parse().unwrap_or(0);
            info.signon = args[3].parse().unwrap_or(0);
        }
        "319" => info.channels.get_or_insert_with(String::new).push_str(args[2]),
        "320" => info.identified = true,
        "330" => {
            debug!(nick = %args[1], login = %args[2], text = %args[3], "330");
            if args[3] == "is logged in as" {
                info.login = Some(args[2].to_string());
            }
        }
        _ => {}
    }
    Ok(())
}

/// 318 / 369: report what was collected and reset.
pub(crate) fn end_of_whois(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    if !expected(session, msg, args[1]) {
        return Ok(());
    }

    let info = std::mem::take(&mut session.whois);
    let fields = info.fields(args[1]);
    let nick = info.nick.unwrap_or_else(|| args[1].to_string());
    session.emit(Event::UserInfo { nick, fields });
    Ok(())
}

fn expected(session: &Session, msg: &Message, nick: &str) -> bool {
    match session.whois.nick.as_deref() {
        None => {
            warn!(numeric = %msg.command, nick = %nick, "unexpected WHOIS reply");
            false
        }
        Some(pending) if !session.whois.is_for(nick) => {
            warn!(numeric = %msg.command, nick = %nick, pending = %pending, "WHOIS reply for another nick");
            false
        }
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AccountConfig;
    use crate::events::Event;
    use crate::session::Session;

    fn connected() -> Session {
        let mut s = Session::login(&AccountConfig::new("me@srv")).unwrap();
        s.start(false);
        s.handle_line(":srv 251 me :users");
        s.drain_outbound();
        s.drain_events();
        s
    }

    #[test]
    fn collects_until_end() {
        let mut s = connected();
        s.get_info("Bob");
        s.handle_line(":srv 311 me bob ~b host.example * :Bob Builder");
        s.handle_line(":srv 319 me bob :@#rust ");
        s.handle_line(":srv 319 me bob :#purple");
        s.handle_line(":srv 312 me bob irc.example.net :Example server");
        s.handle_line(":srv 301 me bob :gone");
        s.handle_line(":srv 330 me bob bobby :is logged in as");
        s.handle_line(":srv 313 me bob :is an IRC operator");
        assert!(s.drain_events().is_empty());

        s.handle_line(":srv 318 me bob :End of /WHOIS list.");
        let events = s.drain_events();
        let [Event::UserInfo { nick, fields }] = events.as_slice() else {
            panic!("unexpected events: {events:?}");
        };
        assert_eq!(nick, "Bob");
        let get = |label: &str| {
            fields
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("Nick"), Some("bob (ircop)"));
        assert_eq!(get("Away"), Some("gone"));
        assert_eq!(get("Real name"), Some("Bob Builder"));
        assert_eq!(get("Login name"), Some("bobby"));
        assert_eq!(get("Ident name"), Some("~b"));
        assert_eq!(get("Host name"), Some("host.example"));
        assert_eq!(get("Server"), Some("irc.example.net (Example server)"));
        assert_eq!(get("Currently on"), Some("@#rust #purple"));
        assert!(s.whois().nick.is_none());
    }

    #[test]
    fn replies_for_other_nicks_ignored() {
        let mut s = connected();
        s.get_info("bob");
        s.handle_line(":srv 311 me alice ~a host * :Alice");
        s.handle_line(":srv 318 me alice :End of /WHOIS list.");
        assert!(s.drain_events().is_empty());
        assert!(s.whois().real.is_none());
    }

    #[test]
    fn away_outside_whois_is_auto_reply() {
        let mut s = connected();
        s.handle_line(":srv 301 me bob :out to lunch");
        assert_eq!(
            s.drain_events(),
            vec![Event::ImReceived {
                from: "bob".into(),
                text: "out to lunch".into(),
                auto_reply: true,
            }]
        );
    }
}
