//! Operations the application invokes on a session.

use purple_proto::casemap;
use purple_proto::format::LineBuilder;
use purple_proto::prefix::is_channel;
use purple_proto::util::split_message;
use purple_proto::{Ctcp, MAX_MESSAGE_SIZE};
use tracing::debug;

use super::{DEFAULT_QUIT, Session, monotonic_micros};
use crate::buddies::Added;
use crate::config::StatusKind;
use crate::events::{BuddyStatus, Event};

/// Room left for the prefix the server adds when relaying a message.
const RELAY_OVERHEAD: usize = 64;

/// Status the application can set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Available,
    Away(Option<String>),
}

impl Session {
    /// RFC 1459 lowercase form of a nick or channel.
    pub fn normalize(name: &str) -> String {
        casemap::normalize(name)
    }

    /// Largest message body accepted by [`Session::send_im`].
    pub fn max_message_size(&self) -> usize {
        MAX_MESSAGE_SIZE
    }

    /// `nick` without leading mode prefix characters.
    pub(crate) fn skip_mode<'a>(&self, nick: &'a str) -> &'a str {
        nick.trim_start_matches(|c| self.mode_chars.contains(c))
    }

    /// Send `text` as PRIVMSG, split on newlines and at the relay limit.
    pub fn send_im(&mut self, to: &str, text: &str) {
        let to = self.skip_mode(to).to_string();
        self.conversations.open_im(&to);
        self.send_split("PRIVMSG", &to, text);
    }

    pub fn send_notice(&mut self, to: &str, text: &str) {
        self.send_split("NOTICE", to, text);
    }

    fn send_split(&mut self, command: &str, target: &str, text: &str) {
        let max = MAX_MESSAGE_SIZE.saturating_sub(target.len() + RELAY_OVERHEAD);
        let lines: Vec<String> = split_message(text, max)
            .map(|chunk| {
                LineBuilder::new(command)
                    .verbatim(target)
                    .trailing(chunk)
                    .build()
            })
            .collect();
        for line in lines {
            self.send(line);
        }
    }

    pub fn chat_join(&mut self, channel: &str, key: Option<&str>) {
        let line = LineBuilder::new("JOIN")
            .channel(channel)
            .opt(key.map(purple_proto::Arg::Verbatim))
            .build();
        self.send(line);
    }

    /// PART a channel and close its conversation.
    pub fn chat_leave(&mut self, channel: &str, message: Option<&str>) {
        let line = LineBuilder::new("PART")
            .channel(channel)
            .opt(message.map(purple_proto::Arg::Trailing))
            .build();
        self.send(line);
        if let Some(chat) = self.conversations.leave(channel) {
            self.emit(Event::ChatLeft { channel: chat.name });
        }
    }

    /// Send to a joined channel and echo it locally. Returns false if the
    /// channel is not joined.
    pub fn chat_send(&mut self, channel: &str, text: &str) -> bool {
        let Some(name) = self.conversations.chat(channel).map(|c| c.name.clone()) else {
            debug!(channel = %channel, "chat send on a channel we are not in");
            return false;
        };
        self.send_split("PRIVMSG", &name, text);
        let from = self.display_nick().to_string();
        self.emit(Event::ChatMessage {
            channel: name,
            from,
            text: text.to_string(),
        });
        true
    }

    pub fn chat_invite(&mut self, channel: &str, nick: &str) {
        let line = LineBuilder::new("INVITE").nick(nick).channel(channel).build();
        self.send(line);
    }

    pub fn set_topic(&mut self, channel: &str, topic: &str) {
        let line = LineBuilder::new("TOPIC").channel(channel).trailing(topic).build();
        self.send(line);
    }

    /// Request the server's channel list.
    pub fn roomlist_get(&mut self) {
        self.roomlist = true;
        self.send(LineBuilder::new("LIST").build());
    }

    /// Ignore the rest of a LIST reply.
    pub fn roomlist_cancel(&mut self) {
        self.roomlist = false;
    }

    /// WHOIS `nick`; replies are collected until the end-of-WHOIS numeric.
    pub fn get_info(&mut self, nick: &str) {
        self.send(LineBuilder::new("WHOIS").nick(nick).build());
        self.whois.begin(nick);
    }

    pub fn set_status(&mut self, status: Status) {
        match status {
            Status::Available => {
                self.account.status = StatusKind::Available;
                self.set_away(None);
            }
            Status::Away(message) => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| "Away".to_string());
                self.account.status = StatusKind::Away;
                self.account.away_message = message.clone();
                self.set_away(Some(&message));
            }
        }
    }

    pub(crate) fn set_away(&mut self, message: Option<&str>) {
        let line = match message {
            Some(message) => {
                let message = message.replace('\n', " ");
                LineBuilder::new("AWAY").trailing(&message).build()
            }
            None => LineBuilder::new("AWAY").build(),
        };
        self.send(line);
    }

    /// Start tracking a buddy.
    ///
    /// A buddy already tracked gets its current status reported again.
    /// Once the poll timer runs, the new buddy is checked right away.
    pub fn add_buddy(&mut self, name: &str) {
        if let Added::Existing(status) = self.buddies.add(name) {
            self.emit(Event::BuddyStatus {
                name: name.to_string(),
                status,
            });
        }
        if self.timer_armed() {
            self.ison_one(name);
        }
    }

    pub fn remove_buddy(&mut self, name: &str) {
        self.buddies.remove(name);
    }

    fn ison_one(&mut self, name: &str) {
        if self.buddies.is_outstanding() || self.buddies.queued() > 0 {
            self.buddies.enqueue(name);
            return;
        }
        self.buddies.reset_pending(name);
        self.send(LineBuilder::new("ISON").nick(name).build());
    }

    pub fn change_nick(&mut self, nick: &str) {
        self.send(LineBuilder::new("NICK").trailing(nick).build());
        self.reqnick = Some(nick.to_string());
        self.nickused = false;
    }

    /// Send a line exactly as given.
    pub fn send_raw(&mut self, line: &str) {
        self.send(line.to_string());
    }

    /// PING the server. With a conversation name the reply's lag is
    /// written into that conversation.
    pub fn ping(&mut self, conversation: Option<&str>) {
        let stamp = monotonic_micros().to_string();
        let line = match conversation {
            Some(target) => {
                let payload = format!("{target} {stamp}");
                LineBuilder::new("PING").trailing(&payload).build()
            }
            None => LineBuilder::new("PING").verbatim(&stamp).build(),
        };
        self.send(line);
    }

    /// CTCP PING a nick. Channels are not pinged.
    pub fn ctcp_ping(&mut self, nick: &str) {
        if is_channel(nick) {
            return;
        }
        let stamp = monotonic_micros().to_string();
        let ctcp = Ctcp::ping(&stamp).to_string();
        self.send(LineBuilder::new("PRIVMSG").nick(nick).trailing(&ctcp).build());
    }

    /// `/me`: CTCP ACTION to a channel or nick.
    pub fn action(&mut self, target: &str, text: &str) {
        let ctcp = Ctcp::action(text).to_string();
        self.send(LineBuilder::new("PRIVMSG").verbatim(target).trailing(&ctcp).build());

        if let Some(name) = self.conversations.chat(target).map(|c| c.name.clone()) {
            let from = self.display_nick().to_string();
            self.emit(Event::ChatMessage {
                channel: name,
                from,
                text: format!("/me {text}"),
            });
        }
    }

    /// QUIT once; later calls do nothing.
    pub fn quit(&mut self, message: Option<&str>) {
        if self.quitting {
            return;
        }
        let line = LineBuilder::new("QUIT")
            .trailing(message.unwrap_or(DEFAULT_QUIT))
            .build();
        self.send(line);
        self.quitting = true;
    }

    /// Report a buddy's status as currently known.
    pub fn buddy_status(&self, name: &str) -> Option<BuddyStatus> {
        self.buddies.get(name).map(|b| {
            if b.online {
                BuddyStatus::Available
            } else {
                BuddyStatus::Offline
            }
        })
    }
}
