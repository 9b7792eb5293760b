//! Events reported to the application.
//!
//! The session never talks to a UI directly. Everything the surrounding
//! application needs to show (conversation text, buddy presence, errors)
//! is queued as an [`Event`] and handed over by the driver.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::error::ConnectionError;
use crate::session::ConnectionState;

/// Presence of a polled buddy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuddyStatus {
    Available,
    Offline,
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Info,
    Error,
}

/// Flags of a user in a chat.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ChatUserFlags(u8);

impl ChatUserFlags {
    pub const NONE: Self = Self(0x00);
    pub const VOICE: Self = Self(0x01);
    pub const HALFOP: Self = Self(0x02);
    pub const OP: Self = Self(0x04);
    pub const FOUNDER: Self = Self(0x08);
    pub const AWAY: Self = Self(0x20);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ChatUserFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChatUserFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for ChatUserFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(ChatUserFlags, &str); 5] = [
            (ChatUserFlags::VOICE, "VOICE"),
            (ChatUserFlags::HALFOP, "HALFOP"),
            (ChatUserFlags::OP, "OP"),
            (ChatUserFlags::FOUNDER, "FOUNDER"),
            (ChatUserFlags::AWAY, "AWAY"),
        ];
        let set: Vec<&str> = NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            f.write_str("NONE")
        } else {
            f.write_str(&set.join(" | "))
        }
    }
}

/// Something the application should know about.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StateChanged(ConnectionState),
    /// The connection failed and is being torn down.
    ConnectionError(ConnectionError),
    /// Our nick as the server knows it.
    DisplayName(String),
    BuddyStatus {
        name: String,
        status: BuddyStatus,
    },
    ImReceived {
        from: String,
        text: String,
        /// Away message sent in reply to something we said.
        auto_reply: bool,
    },
    /// An IM conversation partner changed nick.
    ImRenamed {
        old: String,
        new: String,
    },
    ChatJoined {
        id: u32,
        channel: String,
    },
    ChatLeft {
        channel: String,
    },
    ChatMessage {
        channel: String,
        from: String,
        text: String,
    },
    /// Initial member list from NAMES.
    ChatUsersAdded {
        channel: String,
        users: Vec<(String, ChatUserFlags)>,
    },
    ChatUserJoined {
        channel: String,
        nick: String,
        userhost: String,
    },
    ChatUserLeft {
        channel: String,
        nick: String,
        reason: Option<String>,
    },
    ChatUserRenamed {
        channel: String,
        old: String,
        new: String,
    },
    ChatUserFlags {
        channel: String,
        nick: String,
        flags: ChatUserFlags,
    },
    ChatTopic {
        channel: String,
        who: Option<String>,
        topic: String,
    },
    ChatInvite {
        channel: String,
        from: String,
    },
    RoomListStarted,
    Room {
        name: String,
        users: u32,
        topic: String,
    },
    RoomListFinished,
    /// Informational line written into a conversation.
    SystemMessage {
        target: String,
        text: String,
    },
    Notify {
        level: NotifyLevel,
        title: Option<String>,
        primary: String,
        secondary: String,
    },
    /// Collected WHOIS reply.
    UserInfo {
        nick: String,
        fields: Vec<(String, String)>,
    },
}
