//! Tribe descriptions: the static data every player's objects are built from.
//!
//! These are immutable after loading and shared by all players of the tribe.
//! Name lookups go through [`FxHashMap`] indices that are rebuilt whenever a
//! description is constructed or deserialized.

use crate::caps::BuildSize;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub type WareIndex = u16;
pub type WorkerIndex = u16;
pub type BuildingIndex = u16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WareDescr {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDescr {
    pub name: String,
    /// Whether warehouses may create this worker on demand.
    #[serde(default)]
    pub buildable: bool,
    #[serde(default)]
    pub is_soldier: bool,
}

/// What a building does once finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BuildingKind {
    Production,
    Military {
        /// Soldiers that always stay home when attacking from here.
        min_soldiers: u32,
        max_soldiers: u32,
        /// Radius of land claimed when the site is finished.
        conquers: u32,
    },
    Warehouse,
    TrainingSite {
        max_soldiers: u32,
    },
}

/// Static building definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingDescr {
    pub name: String,
    pub size: BuildSize,
    #[serde(default)]
    pub is_mine: bool,
    /// Whether players may place it themselves (as opposed to enhancement only).
    #[serde(default = "default_true")]
    pub buildable: bool,
    /// Whether the owner may bulldoze it.
    #[serde(default = "default_true")]
    pub destructible: bool,
    /// Building types this one can be enhanced to.
    #[serde(default)]
    pub enhancements: Vec<BuildingIndex>,
    #[serde(default = "default_vision")]
    pub vision_range: u32,
    #[serde(default)]
    pub animations: Vec<String>,
    /// Wares produced once per production cycle.
    #[serde(default)]
    pub outputs: Vec<String>,
    pub kind: BuildingKind,
}

fn default_true() -> bool {
    true
}

fn default_vision() -> u32 {
    4
}

impl BuildingDescr {
    pub fn is_military(&self) -> bool {
        matches!(self.kind, BuildingKind::Military { .. })
    }

    pub fn conquers(&self) -> u32 {
        match self.kind {
            BuildingKind::Military { conquers, .. } => conquers,
            _ => 0,
        }
    }

    pub fn max_soldiers(&self) -> u32 {
        match self.kind {
            BuildingKind::Military { max_soldiers, .. }
            | BuildingKind::TrainingSite { max_soldiers } => max_soldiers,
            _ => 0,
        }
    }

    pub fn min_soldiers(&self) -> u32 {
        match self.kind {
            BuildingKind::Military { min_soldiers, .. } => min_soldiers,
            _ => 0,
        }
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.iter().any(|a| a == name)
    }
}

/// Retreat limits of a tribe, in percent of soldier health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilitaryData {
    pub min_retreat: u8,
    pub max_retreat: u8,
}

impl Default for MilitaryData {
    fn default() -> Self {
        Self {
            min_retreat: 10,
            max_retreat: 80,
        }
    }
}

/// A start condition a player can pick (headquarters, village, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Initialization {
    pub name: String,
    pub script: String,
}

/// Plain tribe data as it is stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TribeData {
    pub name: String,
    #[serde(default)]
    pub wares: Vec<WareDescr>,
    #[serde(default)]
    pub workers: Vec<WorkerDescr>,
    #[serde(default)]
    pub buildings: Vec<BuildingDescr>,
    #[serde(default)]
    pub military: MilitaryData,
    #[serde(default)]
    pub initializations: Vec<Initialization>,
}

/// A tribe description with name indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TribeData", into = "TribeData")]
pub struct TribeDescr {
    data: TribeData,
    ware_names: FxHashMap<String, WareIndex>,
    worker_names: FxHashMap<String, WorkerIndex>,
    building_names: FxHashMap<String, BuildingIndex>,
}

impl From<TribeData> for TribeDescr {
    fn from(data: TribeData) -> Self {
        fn index<T>(items: &[T], name: impl Fn(&T) -> &str) -> FxHashMap<String, u16> {
            items
                .iter()
                .enumerate()
                .map(|(i, item)| (name(item).to_string(), i as u16))
                .collect()
        }
        Self {
            ware_names: index(&data.wares, |w| &w.name),
            worker_names: index(&data.workers, |w| &w.name),
            building_names: index(&data.buildings, |b| &b.name),
            data,
        }
    }
}

impl From<TribeDescr> for TribeData {
    fn from(descr: TribeDescr) -> Self {
        descr.data
    }
}

impl TribeDescr {
    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn nr_wares(&self) -> usize {
        self.data.wares.len()
    }

    pub fn nr_workers(&self) -> usize {
        self.data.workers.len()
    }

    pub fn nr_buildings(&self) -> usize {
        self.data.buildings.len()
    }

    pub fn ware(&self, index: WareIndex) -> Option<&WareDescr> {
        self.data.wares.get(index as usize)
    }

    pub fn worker(&self, index: WorkerIndex) -> Option<&WorkerDescr> {
        self.data.workers.get(index as usize)
    }

    pub fn building(&self, index: BuildingIndex) -> Option<&BuildingDescr> {
        self.data.buildings.get(index as usize)
    }

    pub fn ware_index(&self, name: &str) -> Option<WareIndex> {
        self.ware_names.get(name).copied()
    }

    pub fn worker_index(&self, name: &str) -> Option<WorkerIndex> {
        self.worker_names.get(name).copied()
    }

    pub fn building_index(&self, name: &str) -> Option<BuildingIndex> {
        self.building_names.get(name).copied()
    }

    pub fn military(&self) -> MilitaryData {
        self.data.military
    }

    pub fn initialization(&self, index: u8) -> Option<&Initialization> {
        self.data.initializations.get(index as usize)
    }
}
