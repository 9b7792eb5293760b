//! Command handler registry and dispatch.
//!
//! Every command the plugin understands is registered once with the
//! number of arguments its handler reads. Dispatch pads the message to that
//! arity and runs the handler inside an `irc.command` span; anything not in
//! the table goes to [`misc::unrecognized`].

use std::collections::HashMap;

use purple_proto::{CommandKey, Message};

use super::traits::Handler;
use crate::error::HandlerResult;
use crate::handlers::{buddy, channel, list, messaging, misc, registration, sasl, whois};
use crate::session::Session;
use crate::telemetry::spans;

/// A registered handler and the arity its arguments are padded to.
pub struct HandlerEntry {
    pub arity: usize,
    handler: Box<dyn Handler>,
}

/// Registry of inbound command handlers.
pub struct Registry {
    handlers: HashMap<CommandKey, HandlerEntry>,
}

impl Registry {
    /// Create a registry with every handler registered.
    pub fn new() -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };

        // Registration
        registry.numeric(5, 2, registration::features);
        registry.numeric(251, 1, registration::luser);
        registry.numeric(255, 1, registration::luser);
        registry.numeric(372, 1, registration::motd);
        registry.numeric(375, 1, registration::motd);
        registry.numeric(376, 1, registration::motd);
        registry.numeric(422, 1, registration::motd);
        registry.numeric(432, 2, registration::bad_nick);
        registry.numeric(433, 2, registration::nick_used);
        registry.numeric(437, 2, registration::unavailable);
        registry.numeric(438, 3, registration::nick_change_refused);
        registry.verb("PING", 1, registration::ping);
        registry.verb("PONG", 2, registration::pong);
        registry.verb("ERROR", 1, registration::error);

        // SASL
        registry.verb("CAP", 3, sasl::cap);
        registry.verb("AUTHENTICATE", 1, sasl::authenticate);
        registry.numeric(903, 1, sasl::success);
        for numeric in 904..=908 {
            registry.numeric(numeric, 1, sasl::failed);
        }

        // WHOIS
        registry.numeric(301, 3, whois::away);
        registry.numeric(311, 6, whois::whois);
        registry.numeric(312, 4, whois::whois);
        registry.numeric(313, 2, whois::whois);
        registry.numeric(317, 3, whois::whois);
        registry.numeric(319, 3, whois::whois);
        registry.numeric(320, 2, whois::whois);
        registry.numeric(330, 4, whois::whois);
        registry.numeric(318, 2, whois::end_of_whois);
        registry.numeric(369, 2, whois::end_of_whois);

        // Channel list
        registry.numeric(321, 1, list::list);
        registry.numeric(322, 4, list::list);
        registry.numeric(323, 1, list::list);

        // Channels
        registry.numeric(324, 3, channel::chan_mode);
        registry.numeric(331, 3, channel::topic);
        registry.numeric(332, 3, channel::topic);
        registry.numeric(333, 4, channel::topic_info);
        registry.numeric(352, 8, channel::who);
        registry.numeric(353, 4, channel::names);
        registry.numeric(366, 2, channel::names);
        registry.numeric(367, 3, channel::ban);
        registry.numeric(368, 2, channel::ban);
        registry.numeric(403, 2, channel::no_channel);
        registry.numeric(404, 3, channel::cannot_send);
        registry.numeric(506, 3, channel::cannot_send);
        registry.numeric(442, 3, channel::not_in_channel);
        registry.numeric(471, 2, channel::channel_full);
        registry.numeric(473, 2, channel::invite_only);
        registry.numeric(474, 2, channel::banned);
        registry.numeric(475, 2, channel::bad_key);
        registry.numeric(477, 3, channel::registration_required);
        registry.numeric(515, 3, channel::registration_required);
        registry.numeric(478, 3, channel::ban_list_full);
        registry.numeric(482, 3, channel::not_op);
        registry.verb("INVITE", 2, channel::invite);
        registry.verb("JOIN", 1, channel::join);
        registry.verb("KICK", 3, channel::kick);
        registry.verb("MODE", 2, channel::mode);
        registry.verb("NICK", 1, channel::nick);
        registry.verb("PART", 1, channel::part);
        registry.verb("QUIT", 1, channel::quit);
        registry.verb("TOPIC", 2, channel::topic);

        // Messages
        registry.verb("PRIVMSG", 2, messaging::privmsg);
        registry.verb("NOTICE", 2, messaging::notice);
        registry.verb("WALLOPS", 1, messaging::wallops);

        // Buddies
        registry.numeric(303, 2, buddy::ison);

        // Misc
        registry.numeric(391, 3, misc::time);
        registry.numeric(401, 2, misc::no_such_nick);
        registry.numeric(406, 2, misc::no_such_nick);
        registry.numeric(421, 2, misc::unknown_command);
        registry.numeric(501, 2, misc::bad_mode);

        registry
    }

    /// Register `handler` for `key`, replacing any earlier entry.
    pub fn add<H>(&mut self, key: CommandKey, arity: usize, handler: H)
    where
        H: Handler + 'static,
    {
        self.handlers.insert(
            key,
            HandlerEntry {
                arity,
                handler: Box::new(handler),
            },
        );
    }

    pub fn numeric<H>(&mut self, code: u16, arity: usize, handler: H)
    where
        H: Handler + 'static,
    {
        self.add(CommandKey::Numeric(code), arity, handler);
    }

    pub fn verb<H>(&mut self, name: &str, arity: usize, handler: H)
    where
        H: Handler + 'static,
    {
        self.add(CommandKey::verb(name), arity, handler);
    }

    pub fn get(&self, key: &CommandKey) -> Option<&HandlerEntry> {
        self.handlers.get(key)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Dispatch a parsed message. `raw` is the line it was parsed from and
    /// only used by the fallback for unknown commands.
    pub fn dispatch(&self, session: &mut Session, msg: &Message, raw: &str) -> HandlerResult {
        let key = msg.key();

        let Some(entry) = self.handlers.get(&key) else {
            misc::unrecognized(session, raw);
            return Ok(());
        };

        let args = msg.padded(entry.arity);
        let irc_span = spans::command(&key, msg.source_nick());
        let _enter = irc_span.enter();

        entry.handler.handle(session, msg, &args)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::AccountConfig;

    fn session() -> Session {
        Session::login(&AccountConfig::new("me@irc.example.net")).unwrap()
    }

    #[test]
    fn keys_are_classified() {
        let registry = Registry::new();
        assert!(registry.get(&CommandKey::Numeric(5)).is_some());
        assert!(registry.get(&CommandKey::verb("privmsg")).is_some());
        assert_eq!(registry.get(&CommandKey::Numeric(311)).map(|e| e.arity), Some(6));
        assert!(registry.get(&CommandKey::Numeric(999)).is_none());
    }

    #[test]
    fn args_padded_to_arity() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();
        let counter = Arc::clone(&seen);
        registry.verb("KICK", 3, move |_: &mut Session, _: &Message, args: &[&str]| {
            assert_eq!(args, ["#chan", "", ""]);
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut s = session();
        let msg = Message::parse_line(":op!o@h KICK #chan").unwrap();
        registry.dispatch(&mut s, &msg, ":op!o@h KICK #chan").unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn verbs_match_case_insensitively() {
        let seen = Arc::new(AtomicUsize::new(0));
        let mut registry = Registry::new();
        let counter = Arc::clone(&seen);
        registry.verb("WALLOPS", 1, move |_: &mut Session, _: &Message, _: &[&str]| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut s = session();
        let msg = Message::parse_line(":srv wallops :hi").unwrap();
        registry.dispatch(&mut s, &msg, ":srv wallops :hi").unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
