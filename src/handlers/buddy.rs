use purple_proto::Message;

use crate::error::HandlerResult;
use crate::events::Event;
use crate::session::Session;

/// 303: ISON reply. Marks the listed buddies online, sends the next batch
/// and reports status changes once the poll is complete.
pub(crate) fn ison(session: &mut Session, _msg: &Message, args: &[&str]) -> HandlerResult {
    session.buddies.mark_online(args[1]);

    if session.buddies.is_outstanding() {
        session.send_ison_batch();
    }

    if !session.buddies.is_outstanding() {
        for (name, status) in session.buddies.take_changes() {
            session.emit(Event::BuddyStatus { name, status });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::AccountConfig;
    use crate::events::{BuddyStatus, Event};
    use crate::session::Session;

    fn with_buddies(buddies: &[&str]) -> Session {
        let mut config = AccountConfig::new("me@srv");
        config.buddies = buddies.iter().map(|b| b.to_string()).collect();
        let mut s = Session::login(&config).unwrap();
        s.start(false);
        s.drain_outbound();
        s
    }

    #[test]
    fn poll_reports_changes() {
        let mut s = with_buddies(&["alice", "bob"]);
        s.handle_line(":srv 251 me :users");
        assert_eq!(s.drain_outbound(), vec!["ISON alice bob\r\n"]);
        s.drain_events();

        s.handle_line(":srv 303 me :alice");
        assert_eq!(
            s.drain_events(),
            vec![Event::BuddyStatus {
                name: "alice".into(),
                status: BuddyStatus::Available,
            }]
        );

        // Next poll: alice left, bob arrived.
        s.tick();
        assert_eq!(s.drain_outbound(), vec!["ISON alice bob\r\n"]);
        s.handle_line(":srv 303 me :bob");
        assert_eq!(
            s.drain_events(),
            vec![
                Event::BuddyStatus {
                    name: "alice".into(),
                    status: BuddyStatus::Offline,
                },
                Event::BuddyStatus {
                    name: "bob".into(),
                    status: BuddyStatus::Available,
                },
            ]
        );
    }

    #[test]
    fn outstanding_poll_is_not_restarted() {
        let mut s = with_buddies(&["alice"]);
        s.handle_line(":srv 251 me :users");
        s.drain_outbound();
        s.tick();
        assert!(s.drain_outbound().is_empty());
    }

    #[test]
    fn batches_follow_replies() {
        let names: Vec<String> = (0..100).map(|i| format!("buddy{i:04}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut s = with_buddies(&refs);
        s.handle_line(":srv 251 me :users");

        let mut batches = 0;
        loop {
            let lines = s.drain_outbound();
            if lines.is_empty() {
                break;
            }
            for line in &lines {
                assert!(line.len() - "ISON \r\n".len() <= 450, "{line}");
            }
            batches += lines.len();
            s.handle_line(":srv 303 me :");
        }
        assert!(batches >= 3);
        assert!(!s.buddies().is_outstanding());
    }
}
