use crate::coords::{Coords, PlayerNumber, Serial};
use crate::immovable::{StockItem, StockPolicy, TrainingAttribute};
use crate::messages::{MessageId, MessageStatus};
use crate::path::Path;
use crate::tribe::BuildingIndex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInputs {
    pub player: PlayerNumber,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Command {
    // Construction
    BuildFlag {
        at: Coords,
    },
    BuildRoad {
        path: Path,
    },
    BuildBuilding {
        at: Coords,
        building: BuildingIndex,
        construction_site: bool,
    },
    Bulldoze {
        target: Serial,
        recurse: bool,
    },
    EnhanceBuilding {
        building: Serial,
        to: BuildingIndex,
    },
    StartStopBuilding {
        building: Serial,
    },
    FlagAction {
        flag: Serial,
    },

    // Military
    ChangeTrainingPriority {
        site: Serial,
        attribute: TrainingAttribute,
        delta: i32,
    },
    DropSoldier {
        building: Serial,
        soldier: Serial,
    },
    SetSoldierCapacity {
        building: Serial,
        capacity: u32,
    },
    SetRetreatPercentage {
        percentage: u8,
    },
    AttackFlag {
        flag: Serial,
        count: u32,
        retreat: u8,
    },

    // Economy
    ChangeStockPolicy {
        warehouse: Serial,
        item: StockItem,
        policy: StockPolicy,
    },

    // Inbox
    SetMessageStatus {
        message: MessageId,
        status: MessageStatus,
    },

    // Meta
    Quit,
}
