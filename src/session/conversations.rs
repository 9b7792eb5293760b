//! Open conversations: joined channels and IM partners.

use std::collections::HashMap;

use purple_proto::casemap::normalize;

use crate::events::ChatUserFlags;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub nick: String,
    pub flags: ChatUserFlags,
    pub userhost: Option<String>,
    pub realname: Option<String>,
}

/// A joined channel.
#[derive(Debug, Clone)]
pub struct Chat {
    pub id: u32,
    pub name: String,
    pub topic: Option<String>,
    /// The first end-of-NAMES populated the member list; later ones are
    /// printed instead.
    pub(crate) names_seen: bool,
    users: HashMap<String, ChatUser>,
}

impl Chat {
    fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            topic: None,
            names_seen: false,
            users: HashMap::new(),
        }
    }

    pub fn user(&self, nick: &str) -> Option<&ChatUser> {
        self.users.get(&normalize(nick))
    }

    pub fn user_mut(&mut self, nick: &str) -> Option<&mut ChatUser> {
        self.users.get_mut(&normalize(nick))
    }

    pub fn has_user(&self, nick: &str) -> bool {
        self.users.contains_key(&normalize(nick))
    }

    pub fn add_user(&mut self, nick: &str, flags: ChatUserFlags, userhost: Option<&str>) {
        self.users.insert(
            normalize(nick),
            ChatUser {
                nick: nick.to_string(),
                flags,
                userhost: userhost.filter(|u| !u.is_empty()).map(str::to_string),
                realname: None,
            },
        );
    }

    pub fn remove_user(&mut self, nick: &str) -> Option<ChatUser> {
        self.users.remove(&normalize(nick))
    }

    /// Rename a member. Returns false if `old` is not in the channel.
    pub fn rename_user(&mut self, old: &str, new: &str) -> bool {
        match self.users.remove(&normalize(old)) {
            Some(mut user) => {
                user.nick = new.to_string();
                self.users.insert(normalize(new), user);
                true
            }
            None => false,
        }
    }

    /// Members sorted by nick.
    pub fn users(&self) -> Vec<&ChatUser> {
        let mut users: Vec<&ChatUser> = self.users.values().collect();
        users.sort_by(|a, b| a.nick.cmp(&b.nick));
        users
    }
}

/// Conversation lookup, keyed by normalized name.
#[derive(Debug, Default)]
pub struct Conversations {
    chats: HashMap<String, Chat>,
    ims: HashMap<String, String>,
    next_id: u32,
}

impl Conversations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a chat for `name`, reusing an existing one. Returns its id.
    pub fn join(&mut self, name: &str) -> u32 {
        let key = normalize(name);
        if let Some(chat) = self.chats.get(&key) {
            return chat.id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.chats.insert(key, Chat::new(id, name));
        id
    }

    pub fn leave(&mut self, name: &str) -> Option<Chat> {
        self.chats.remove(&normalize(name))
    }

    pub fn chat(&self, name: &str) -> Option<&Chat> {
        self.chats.get(&normalize(name))
    }

    pub fn chat_mut(&mut self, name: &str) -> Option<&mut Chat> {
        self.chats.get_mut(&normalize(name))
    }

    pub fn chats(&self) -> impl Iterator<Item = &Chat> {
        self.chats.values()
    }

    pub fn chats_mut(&mut self) -> impl Iterator<Item = &mut Chat> {
        self.chats.values_mut()
    }

    /// Names of joined channels, sorted.
    pub fn chat_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.chats.values().map(|c| c.name.clone()).collect();
        names.sort();
        names
    }

    pub fn open_im(&mut self, nick: &str) {
        self.ims
            .entry(normalize(nick))
            .or_insert_with(|| nick.to_string());
    }

    pub fn close_im(&mut self, nick: &str) -> bool {
        self.ims.remove(&normalize(nick)).is_some()
    }

    pub fn has_im(&self, nick: &str) -> bool {
        self.ims.contains_key(&normalize(nick))
    }

    pub fn rename_im(&mut self, old: &str, new: &str) -> bool {
        match self.ims.remove(&normalize(old)) {
            Some(_) => {
                self.ims.insert(normalize(new), new.to_string());
                true
            }
            None => false,
        }
    }

    /// Whether `name` is a joined channel or an open IM.
    pub fn is_known(&self, name: &str) -> bool {
        let key = normalize(name);
        self.chats.contains_key(&key) || self.ims.contains_key(&key)
    }

    /// Display name of a joined channel or open IM.
    pub fn display_name(&self, name: &str) -> Option<&str> {
        let key = normalize(name);
        self.chats
            .get(&key)
            .map(|c| c.name.as_str())
            .or_else(|| self.ims.get(&key).map(String::as_str))
    }

    pub fn clear(&mut self) {
        self.chats.clear();
        self.ims.clear();
    }
}
