//! Player message inbox.
//!
//! Messages are immutable once created apart from their read status. The
//! queue is keyed by a monotonically increasing id so iteration order is the
//! order of arrival.

use crate::coords::{Coords, Duration, Time};
use crate::map::Map;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type MessageId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MessageStatus {
    #[default]
    New,
    Read,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Machine-readable origin, e.g. `"under_attack"` or `"site_occupied"`.
    pub sender: String,
    pub title: String,
    pub body: String,
    pub position: Coords,
    pub sent: Time,
    /// `None` means the message never expires.
    pub duration: Option<Duration>,
    pub status: MessageStatus,
}

impl Message {
    pub fn new(
        sender: impl Into<String>,
        sent: Time,
        duration: Option<Duration>,
        title: impl Into<String>,
        body: impl Into<String>,
        position: Coords,
    ) -> Self {
        Self {
            sender: sender.into(),
            title: title.into(),
            body: body.into(),
            position,
            sent,
            duration,
            status: MessageStatus::New,
        }
    }
}

/// Sound effect played when a message from `sender` arrives.
pub fn message_sound(sender: &str) -> &'static str {
    match sender {
        "site_occupied" => "site_occupied",
        "under_attack" => "under_attack",
        _ => "message",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageQueue {
    next_id: MessageId,
    messages: BTreeMap<MessageId, Message>,
}

impl MessageQueue {
    pub fn add(&mut self, message: Message) -> MessageId {
        self.next_id += 1;
        self.messages.insert(self.next_id, message);
        self.next_id
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(&id)
    }

    pub fn remove(&mut self, id: MessageId) -> Option<Message> {
        self.messages.remove(&id)
    }

    pub fn set_status(&mut self, id: MessageId, status: MessageStatus) -> bool {
        match self.messages.get_mut(&id) {
            Some(message) => {
                message.status = status;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MessageId, &Message)> {
        self.messages.iter().map(|(&id, m)| (id, m))
    }

    pub fn count_with_status(&self, status: MessageStatus) -> usize {
        self.messages.values().filter(|m| m.status == status).count()
    }

    /// Whether a message from the same sender was sent less than `timeout`
    /// ago within `radius` of `candidate`.
    pub fn has_similar(
        &self,
        map: &Map,
        candidate: &Message,
        now: Time,
        timeout: Duration,
        radius: u32,
    ) -> bool {
        self.messages.values().any(|existing| {
            existing.sender == candidate.sender
                && now < existing.sent.saturating_add(timeout)
                && map.calc_distance(existing.position, candidate.position) <= radius
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn attack_at(x: i32, y: i32, sent: Time) -> Message {
        Message::new(
            "under_attack",
            sent,
            None,
            "Under attack",
            "",
            Coords::new(x, y),
        )
    }

    #[test]
    fn test_ids_increase() {
        let mut queue = MessageQueue::default();
        let a = queue.add(attack_at(1, 1, 0));
        let b = queue.add(attack_at(1, 1, 0));
        assert!(b > a);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.remove(a).map(|m| m.sent), Some(0));
        assert!(queue.get(a).is_none());
    }

    #[test]
    fn test_similar_requires_all_bounds() {
        let map = Map::new(20, 20).unwrap();
        let mut queue = MessageQueue::default();
        queue.add(attack_at(5, 5, 1000));

        // Same sender, close, recent.
        assert!(queue.has_similar(&map, &attack_at(6, 5, 0), 1500, 1000, 2));
        // Too old.
        assert!(!queue.has_similar(&map, &attack_at(6, 5, 0), 2000, 1000, 2));
        // Too far.
        assert!(!queue.has_similar(&map, &attack_at(12, 5, 0), 1500, 1000, 2));
        // Other sender.
        let mut other = attack_at(5, 5, 0);
        other.sender = "site_occupied".into();
        assert!(!queue.has_similar(&map, &other, 1500, 1000, 2));
    }

    #[test]
    fn test_status() {
        let mut queue = MessageQueue::default();
        let id = queue.add(attack_at(0, 0, 0));
        assert_eq!(queue.count_with_status(MessageStatus::New), 1);
        assert!(queue.set_status(id, MessageStatus::Read));
        assert_eq!(queue.get(id).map(|m| m.status), Some(MessageStatus::Read));
        assert!(!queue.set_status(id + 1, MessageStatus::Read));
    }

    #[test]
    fn test_message_sound() {
        assert_eq!(message_sound("under_attack"), "under_attack");
        assert_eq!(message_sound("site_occupied"), "site_occupied");
        assert_eq!(message_sound("geologist"), "message");
    }

    proptest! {
        #[test]
        fn prop_similar_only_within_timeout(
            sent in 0u32..10_000,
            elapsed in 0u32..10_000,
            timeout in 1u32..5_000,
        ) {
            let map = Map::new(20, 20).unwrap();
            let mut queue = MessageQueue::default();
            queue.add(attack_at(5, 5, sent));
            let now = sent + elapsed;
            let similar = queue.has_similar(&map, &attack_at(5, 5, now), now, timeout, 0);
            prop_assert_eq!(similar, elapsed < timeout);
        }
    }
}
