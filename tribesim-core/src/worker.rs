//! Workers and soldiers.

use crate::coords::{PlayerNumber, Serial};
use crate::immovable::TrainingAttribute;
use crate::tribe::WorkerIndex;
use serde::{Deserialize, Serialize};

/// Training levels of a soldier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoldierLevels {
    pub health: u8,
    pub attack: u8,
    pub defense: u8,
    pub evade: u8,
}

impl SoldierLevels {
    pub fn total(&self) -> u32 {
        self.health as u32 + self.attack as u32 + self.defense as u32 + self.evade as u32
    }

    pub fn get(&self, attr: TrainingAttribute) -> u8 {
        match attr {
            TrainingAttribute::Health => self.health,
            TrainingAttribute::Attack => self.attack,
            TrainingAttribute::Defense => self.defense,
            TrainingAttribute::Evade => self.evade,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkerState {
    /// Employed at its location.
    Working,
    /// Kept in stock at a warehouse.
    Stored,
    /// Out to attack `target`, will return to `origin` if it survives.
    Attacking {
        target: Serial,
        origin: Serial,
        retreat: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Worker {
    pub owner: PlayerNumber,
    pub descr: WorkerIndex,
    /// Set for soldiers only.
    pub soldier: Option<SoldierLevels>,
    /// Building the worker belongs to. `None` while out attacking.
    pub location: Option<Serial>,
    pub state: WorkerState,
}

impl Worker {
    pub fn new(owner: PlayerNumber, descr: WorkerIndex, location: Option<Serial>) -> Self {
        Self {
            owner,
            descr,
            soldier: None,
            location,
            state: WorkerState::Working,
        }
    }

    pub fn new_soldier(
        owner: PlayerNumber,
        descr: WorkerIndex,
        levels: SoldierLevels,
        location: Option<Serial>,
    ) -> Self {
        Self {
            soldier: Some(levels),
            ..Self::new(owner, descr, location)
        }
    }

    pub fn is_soldier(&self) -> bool {
        self.soldier.is_some()
    }

    /// Fighting strength used to resolve duels.
    pub fn strength(&self) -> u32 {
        self.soldier.map_or(0, |levels| levels.total() + 1)
    }
}
