//! Scheduled follow-up commands.
//!
//! Long-running effects never block: they enqueue a command for a future
//! game time. Entries run in `(due time, insertion order)` so every replica
//! processes them identically.

use crate::coords::{PlayerNumber, Serial, Time};
use crate::messages::MessageId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheduled {
    /// Advance a construction site by one step.
    ConstructionStep { building: Serial },
    /// A production site finishes a work cycle.
    ProductionCycle { building: Serial },
    /// An attacking soldier reaches its target.
    AttackArrival { soldier: Serial },
    /// Remove a message whose duration ran out.
    MessageExpiry {
        player: PlayerNumber,
        message: MessageId,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandQueue {
    entries: BTreeMap<Time, VecDeque<Scheduled>>,
}

impl CommandQueue {
    pub fn schedule(&mut self, due: Time, command: Scheduled) {
        self.entries.entry(due).or_default().push_back(command);
    }

    /// Take the earliest command due at or before `now`.
    pub fn pop_due(&mut self, now: Time) -> Option<(Time, Scheduled)> {
        let mut bucket = self.entries.first_entry()?;
        let due = *bucket.key();
        if due > now {
            return None;
        }
        let command = bucket.get_mut().pop_front();
        if bucket.get().is_empty() {
            bucket.remove();
        }
        command.map(|c| (due, c))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Time, &Scheduled)> {
        self.entries
            .iter()
            .flat_map(|(&due, bucket)| bucket.iter().map(move |c| (due, c)))
    }
}
