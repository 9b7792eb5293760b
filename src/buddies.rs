//! Buddy presence polling with ISON.
//!
//! Every tracked nick is queued on each poll and sent in ISON batches. A
//! batch's name list stays within [`ISON_BUDGET`] bytes counting one
//! separator per name. Only one batch is in flight at a time; the 303 reply
//! marks names online and releases the next batch. Once the queue drains
//! the table reports who changed state since the previous poll.

use std::collections::{HashMap, VecDeque};

use purple_proto::casemap::normalize;
use tracing::warn;

use crate::events::BuddyStatus;

/// Byte budget of one ISON name list.
pub const ISON_BUDGET: usize = 450;

#[derive(Debug, Clone)]
pub struct Buddy {
    pub name: String,
    pub online: bool,
    /// Seen in an ISON reply during the current poll.
    pub new_online: bool,
    refs: u32,
}

/// Whether [`BuddyTable::add`] created an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    New,
    /// Already tracked; carries the last known status.
    Existing(BuddyStatus),
}

/// Refcounted buddies plus the ISON queue.
#[derive(Debug, Default)]
pub struct BuddyTable {
    buddies: HashMap<String, Buddy>,
    queue: VecDeque<String>,
    outstanding: bool,
}

impl BuddyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buddies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buddies.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Buddy> {
        self.buddies.get(&normalize(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.buddies.contains_key(&normalize(name))
    }

    /// Whether a batch has been sent and not answered yet.
    pub fn is_outstanding(&self) -> bool {
        self.outstanding
    }

    /// Names waiting for a batch.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Track `name`, or take another reference on it.
    pub fn add(&mut self, name: &str) -> Added {
        match self.buddies.get_mut(&normalize(name)) {
            Some(buddy) => {
                buddy.refs += 1;
                Added::Existing(status_of(buddy.online))
            }
            None => {
                self.buddies.insert(
                    normalize(name),
                    Buddy {
                        name: name.to_string(),
                        online: false,
                        new_online: false,
                        refs: 1,
                    },
                );
                Added::New
            }
        }
    }

    /// Drop one reference. Returns whether the buddy is gone.
    pub fn remove(&mut self, name: &str) -> bool {
        let key = normalize(name);
        let Some(buddy) = self.buddies.get_mut(&key) else {
            return false;
        };
        buddy.refs = buddy.refs.saturating_sub(1);
        if buddy.refs == 0 {
            self.buddies.remove(&key);
            self.queue.retain(|queued| *queued != key);
            return true;
        }
        false
    }

    /// Queue every buddy for the next poll.
    pub fn queue_all(&mut self) {
        let mut keys: Vec<&String> = self.buddies.keys().collect();
        keys.sort();
        self.queue.extend(keys.into_iter().cloned());
    }

    /// Queue one buddy behind an outstanding poll.
    pub fn enqueue(&mut self, name: &str) {
        self.queue.push_back(normalize(name));
    }

    /// Take the next batch of names, space separated.
    ///
    /// Names are taken while the list plus one separator per name fits
    /// the budget. Sets the outstanding flag iff a batch was produced.
    pub fn next_batch(&mut self) -> Option<String> {
        let mut batch = String::new();
        let mut len = 0usize;

        while let Some(key) = self.queue.front() {
            let Some(buddy) = self.buddies.get_mut(key) else {
                self.queue.pop_front();
                continue;
            };

            let name_len = buddy.name.len();
            if len + name_len + 1 > ISON_BUDGET {
                if len == 0 {
                    warn!(nick = %buddy.name, "nick too long for ISON, skipping");
                    self.queue.pop_front();
                    continue;
                }
                break;
            }

            if !batch.is_empty() {
                batch.push(' ');
            }
            batch.push_str(&buddy.name);
            len += name_len + 1;
            buddy.new_online = false;
            self.queue.pop_front();
        }

        self.outstanding = !batch.is_empty();
        (!batch.is_empty()).then_some(batch)
    }

    /// Clear `new_online` ahead of a single-name ISON.
    pub fn reset_pending(&mut self, name: &str) {
        if let Some(buddy) = self.buddies.get_mut(&normalize(name)) {
            buddy.new_online = false;
        }
    }

    /// Record the names listed in an ISON reply.
    pub fn mark_online(&mut self, reply: &str) {
        for nick in reply.split(' ').filter(|n| !n.is_empty()) {
            if let Some(buddy) = self.buddies.get_mut(&normalize(nick)) {
                buddy.new_online = true;
            }
        }
    }

    /// Set the pending state of one buddy and return its status change.
    pub fn set_pending(&mut self, name: &str, online: bool) -> Option<(String, BuddyStatus)> {
        let buddy = self.buddies.get_mut(&normalize(name))?;
        buddy.new_online = online;
        apply(buddy)
    }

    /// Apply pending state to every buddy and return the changes.
    pub fn take_changes(&mut self) -> Vec<(String, BuddyStatus)> {
        let mut changes: Vec<(String, BuddyStatus)> =
            self.buddies.values_mut().filter_map(apply).collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        changes
    }

    pub fn clear(&mut self) {
        self.buddies.clear();
        self.queue.clear();
        self.outstanding = false;
    }
}

fn status_of(online: bool) -> BuddyStatus {
    if online {
        BuddyStatus::Available
    } else {
        BuddyStatus::Offline
    }
}

fn apply(buddy: &mut Buddy) -> Option<(String, BuddyStatus)> {
    if buddy.online == buddy.new_online {
        return None;
    }
    buddy.online = buddy.new_online;
    Some((buddy.name.clone(), status_of(buddy.online)))
}
