//! Immovables (flags, roads, buildings) and the object arena.
//!
//! Every object is addressed by a stable [`Serial`]. Nothing holds a borrowed
//! reference to another object: code that destroys things must re-check
//! [`Objects::exists`] before touching an id it read earlier, because
//! destruction cascades (a building takes its flag's wares with it, a split
//! road disappears) may already have removed it.

use crate::caps::BuildSize;
use crate::coords::{Coords, Direction, PlayerNumber, Serial};
use crate::path::Path;
use crate::tribe::{BuildingIndex, WareIndex, WorkerIndex};
use crate::worker::Worker;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of wares waiting on a flag.
pub const FLAG_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImmovableKind {
    Flag,
    Road,
    Building,
}

/// A job a worker should come and do at a flag (e.g. a geologist expedition).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlagJob {
    pub worker: WorkerIndex,
    pub program: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flag {
    pub owner: PlayerNumber,
    pub position: Coords,
    /// Attached roads, indexed by `Direction::index() - 1`.
    pub roads: [Option<Serial>; 6],
    pub building: Option<Serial>,
    pub wares: Vec<WareIndex>,
    pub jobs: Vec<FlagJob>,
}

impl Flag {
    pub fn new(owner: PlayerNumber, position: Coords) -> Self {
        Self {
            owner,
            position,
            roads: [None; 6],
            building: None,
            wares: Vec::new(),
            jobs: Vec::new(),
        }
    }

    pub fn road(&self, dir: Direction) -> Option<Serial> {
        self.roads[dir.index() as usize - 1]
    }

    pub fn set_road(&mut self, dir: Direction, road: Option<Serial>) {
        self.roads[dir.index() as usize - 1] = road;
    }

    pub fn attached_roads(&self) -> impl Iterator<Item = Serial> + '_ {
        self.roads.iter().flatten().copied()
    }

    pub fn has_capacity(&self) -> bool {
        self.wares.len() < FLAG_CAPACITY
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Road {
    pub owner: PlayerNumber,
    pub path: Path,
    pub start: Serial,
    pub end: Serial,
    pub busy: bool,
}

impl Road {
    /// The flag at the other end, seen from `flag`.
    pub fn other_flag(&self, flag: Serial) -> Serial {
        if flag == self.start {
            self.end
        } else {
            self.start
        }
    }
}

/// Stock preferences of a warehouse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum StockPolicy {
    #[default]
    Normal,
    Prefer,
    DontStock,
    Remove,
}

/// What a stock policy applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StockItem {
    Ware(WareIndex),
    Worker(WorkerIndex),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TrainingAttribute {
    Health,
    Attack,
    Defense,
    Evade,
}

impl TrainingAttribute {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Health),
            1 => Some(Self::Attack),
            2 => Some(Self::Defense),
            3 => Some(Self::Evade),
            _ => None,
        }
    }
}

/// Lifecycle of a building.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingState {
    ConstructionSite {
        /// Percent, 0..=100.
        progress: u8,
        /// Set when this site enhances an existing building.
        previous: Option<BuildingIndex>,
    },
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    pub owner: PlayerNumber,
    /// Primary node. Big buildings also cover its tr, tl and l neighbours.
    pub position: Coords,
    /// Index of the owner's tribe in the world's tribe list.
    pub tribe: usize,
    pub descr: BuildingIndex,
    pub size: BuildSize,
    pub flag: Serial,
    pub state: BuildingState,
    pub workers: Vec<Serial>,
    /// Soldiers currently inside (not out attacking).
    pub soldiers: Vec<Serial>,
    pub soldier_capacity: u32,
    pub stopped: bool,
    pub training_priorities: BTreeMap<TrainingAttribute, i32>,
    pub ware_policies: BTreeMap<WareIndex, StockPolicy>,
    pub worker_policies: BTreeMap<WorkerIndex, StockPolicy>,
}

impl Building {
    pub fn is_construction_site(&self) -> bool {
        matches!(self.state, BuildingState::ConstructionSite { .. })
    }

    pub fn progress(&self) -> Option<u8> {
        match self.state {
            BuildingState::ConstructionSite { progress, .. } => Some(progress),
            BuildingState::Finished => None,
        }
    }

    pub fn stock_policy(&self, item: StockItem) -> StockPolicy {
        let policy = match item {
            StockItem::Ware(ware) => self.ware_policies.get(&ware),
            StockItem::Worker(worker) => self.worker_policies.get(&worker),
        };
        policy.copied().unwrap_or_default()
    }

    pub fn set_stock_policy(&mut self, item: StockItem, policy: StockPolicy) {
        match item {
            StockItem::Ware(ware) => self.ware_policies.insert(ware, policy),
            StockItem::Worker(worker) => self.worker_policies.insert(worker, policy),
        };
    }

    pub fn training_priority(&self, attr: TrainingAttribute) -> i32 {
        self.training_priorities.get(&attr).copied().unwrap_or(0)
    }
}

/// Tagged immovable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Immovable {
    Flag(Flag),
    Road(Road),
    Building(Building),
}

impl Immovable {
    pub fn kind(&self) -> ImmovableKind {
        match self {
            Immovable::Flag(_) => ImmovableKind::Flag,
            Immovable::Road(_) => ImmovableKind::Road,
            Immovable::Building(_) => ImmovableKind::Building,
        }
    }

    pub fn owner(&self) -> PlayerNumber {
        match self {
            Immovable::Flag(f) => f.owner,
            Immovable::Road(r) => r.owner,
            Immovable::Building(b) => b.owner,
        }
    }

    pub fn position(&self) -> Coords {
        match self {
            Immovable::Flag(f) => f.position,
            Immovable::Road(r) => r.path.start(),
            Immovable::Building(b) => b.position,
        }
    }

    /// Size class as seen by the field caps.
    pub fn size(&self) -> BuildSize {
        match self {
            Immovable::Flag(_) => BuildSize::Small,
            Immovable::Road(_) => BuildSize::None,
            Immovable::Building(b) => b.size,
        }
    }
}

/// Arena of every object in the world, keyed by serial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Objects {
    next_serial: Serial,
    immovables: BTreeMap<Serial, Immovable>,
    workers: BTreeMap<Serial, Worker>,
}

impl Objects {
    fn allocate(&mut self) -> Serial {
        self.next_serial += 1;
        self.next_serial
    }

    pub fn insert_immovable(&mut self, immovable: Immovable) -> Serial {
        let serial = self.allocate();
        self.immovables.insert(serial, immovable);
        serial
    }

    pub fn insert_worker(&mut self, worker: Worker) -> Serial {
        let serial = self.allocate();
        self.workers.insert(serial, worker);
        serial
    }

    /// Liveness probe for any object id.
    pub fn exists(&self, serial: Serial) -> bool {
        self.immovables.contains_key(&serial) || self.workers.contains_key(&serial)
    }

    pub fn immovable(&self, serial: Serial) -> Option<&Immovable> {
        self.immovables.get(&serial)
    }

    pub fn remove_immovable(&mut self, serial: Serial) -> Option<Immovable> {
        self.immovables.remove(&serial)
    }

    pub fn immovables(&self) -> impl Iterator<Item = (Serial, &Immovable)> {
        self.immovables.iter().map(|(&s, i)| (s, i))
    }

    pub fn flag(&self, serial: Serial) -> Option<&Flag> {
        match self.immovables.get(&serial) {
            Some(Immovable::Flag(f)) => Some(f),
            _ => None,
        }
    }

    pub fn flag_mut(&mut self, serial: Serial) -> Option<&mut Flag> {
        match self.immovables.get_mut(&serial) {
            Some(Immovable::Flag(f)) => Some(f),
            _ => None,
        }
    }

    pub fn road(&self, serial: Serial) -> Option<&Road> {
        match self.immovables.get(&serial) {
            Some(Immovable::Road(r)) => Some(r),
            _ => None,
        }
    }

    pub fn building(&self, serial: Serial) -> Option<&Building> {
        match self.immovables.get(&serial) {
            Some(Immovable::Building(b)) => Some(b),
            _ => None,
        }
    }

    pub fn building_mut(&mut self, serial: Serial) -> Option<&mut Building> {
        match self.immovables.get_mut(&serial) {
            Some(Immovable::Building(b)) => Some(b),
            _ => None,
        }
    }

    pub fn worker(&self, serial: Serial) -> Option<&Worker> {
        self.workers.get(&serial)
    }

    pub fn worker_mut(&mut self, serial: Serial) -> Option<&mut Worker> {
        self.workers.get_mut(&serial)
    }

    pub fn remove_worker(&mut self, serial: Serial) -> Option<Worker> {
        self.workers.remove(&serial)
    }

    pub fn workers(&self) -> impl Iterator<Item = (Serial, &Worker)> {
        self.workers.iter().map(|(&s, w)| (s, w))
    }

    /// Any road connecting the two flags, in either direction.
    pub fn road_between(&self, a: Serial, b: Serial) -> Option<Serial> {
        let flag = self.flag(a)?;
        flag.attached_roads()
            .find(|&r| self.road(r).is_some_and(|road| road.other_flag(a) == b))
    }

    /// A flag is a dead end when no building sits on it and its roads lead
    /// to at most one other flag.
    pub fn is_dead_end(&self, flag: Serial) -> bool {
        let Some(f) = self.flag(flag) else {
            return false;
        };
        if f.building.is_some() {
            return false;
        }
        let mut first_other = None;
        for road in f.attached_roads() {
            let Some(road) = self.road(road) else {
                continue;
            };
            let other = road.other_flag(flag);
            match first_other {
                None => first_other = Some(other),
                Some(seen) if seen != other => return false,
                Some(_) => {}
            }
        }
        true
    }
}
