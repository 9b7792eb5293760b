use purple_proto::Message;
use purple_proto::format::strip_mirc;

use crate::error::HandlerResult;
use crate::events::Event;
use crate::session::Session;

/// 321 / 322 / 323: channel list, only while a list was requested.
pub(crate) fn list(session: &mut Session, msg: &Message, args: &[&str]) -> HandlerResult {
    if !session.roomlist {
        return Ok(());
    }

    match msg.command.as_str() {
        "321" => session.emit(Event::RoomListStarted),
        "322" => {
            let users = leading_number(args[2]);
            session.emit(Event::Room {
                name: args[1].to_string(),
                users,
                topic: strip_mirc(args[3]).into_owned(),
            });
        }
        "323" => {
            session.roomlist = false;
            session.emit(Event::RoomListFinished);
        }
        _ => {}
    }
    Ok(())
}

/// Leading decimal digits of `s`, 0 when there are none.
fn leading_number(s: &str) -> u32 {
    let digits = s.trim_start();
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountConfig;

    #[test]
    fn list_only_when_requested() {
        let mut s = Session::login(&AccountConfig::new("me@srv")).unwrap();
        s.handle_line(":srv 322 me #rust 12 :topic");
        assert!(s.drain_events().is_empty());

        s.roomlist_get();
        assert_eq!(s.drain_outbound(), vec!["LIST\r\n"]);
        s.handle_line(":srv 321 me Channel :Users  Name");
        s.handle_line(":srv 322 me #rust 12 :\x02Rust\x02 talk");
        s.handle_line(":srv 323 me :End of /LIST");
        s.handle_line(":srv 322 me #late 1 :ignored");
        assert_eq!(
            s.drain_events(),
            vec![
                Event::RoomListStarted,
                Event::Room {
                    name: "#rust".into(),
                    users: 12,
                    topic: "Rust talk".into(),
                },
                Event::RoomListFinished,
            ]
        );
    }

    #[test]
    fn user_counts() {
        assert_eq!(leading_number("42"), 42);
        assert_eq!(leading_number("7x"), 7);
        assert_eq!(leading_number(""), 0);
    }
}
