//! Fixtures for compact scenarios in tests.

use crate::caps::BuildSize;
use crate::coords::{Coords, PlayerNumber, TeamNumber};
use crate::map::Map;
use crate::state::WorldState;
use crate::systems::territory;
use crate::tribe::{
    BuildingDescr, BuildingKind, Initialization, MilitaryData, TribeData, TribeDescr, WareDescr,
    WorkerDescr,
};

fn building(name: &str, size: BuildSize, kind: BuildingKind) -> BuildingDescr {
    BuildingDescr {
        name: name.to_string(),
        size,
        is_mine: false,
        buildable: true,
        destructible: true,
        enhancements: Vec::new(),
        vision_range: 4,
        animations: vec!["idle".to_string()],
        outputs: Vec::new(),
        kind,
    }
}

fn military(min_soldiers: u32, max_soldiers: u32, conquers: u32) -> BuildingKind {
    BuildingKind::Military {
        min_soldiers,
        max_soldiers,
        conquers,
    }
}

/// A small tribe covering every building kind.
///
/// Building indices: 0 headquarters, 1 lumberjacks_hut, 2 sawmill,
/// 3 sentry, 4 barrier, 5 tower, 6 fortress, 7 granitemine,
/// 8 trainingcamp, 9 warehouse.
pub fn test_tribe() -> TribeDescr {
    let wares = ["log", "planks", "granite", "ax"]
        .into_iter()
        .map(|name| WareDescr {
            name: name.to_string(),
        })
        .collect();

    let workers = vec![
        WorkerDescr {
            name: "carrier".to_string(),
            buildable: true,
            is_soldier: false,
        },
        WorkerDescr {
            name: "builder".to_string(),
            buildable: true,
            is_soldier: false,
        },
        WorkerDescr {
            name: "geologist".to_string(),
            buildable: true,
            is_soldier: false,
        },
        WorkerDescr {
            name: "lumberjack".to_string(),
            buildable: true,
            is_soldier: false,
        },
        WorkerDescr {
            name: "soldier".to_string(),
            buildable: true,
            is_soldier: true,
        },
    ];

    let mut headquarters = building("headquarters", BuildSize::Big, BuildingKind::Warehouse);
    headquarters.buildable = false;
    headquarters.destructible = false;
    headquarters.vision_range = 9;

    let mut lumberjack = building("lumberjacks_hut", BuildSize::Small, BuildingKind::Production);
    lumberjack.outputs = vec!["log".to_string()];
    lumberjack.animations.push("unoccupied".to_string());

    let mut sawmill = building("sawmill", BuildSize::Medium, BuildingKind::Production);
    sawmill.outputs = vec!["planks".to_string()];

    let mut sentry = building("sentry", BuildSize::Small, military(1, 2, 6));
    sentry.enhancements = vec![4];
    sentry.vision_range = 8;

    let mut barrier = building("barrier", BuildSize::Medium, military(2, 8, 8));
    barrier.buildable = false;

    let tower = building("tower", BuildSize::Medium, military(3, 4, 9));
    let fortress = building("fortress", BuildSize::Big, military(3, 8, 11));

    let mut mine = building("granitemine", BuildSize::Small, BuildingKind::Production);
    mine.is_mine = true;
    mine.outputs = vec!["granite".to_string()];

    let trainingcamp = building(
        "trainingcamp",
        BuildSize::Big,
        BuildingKind::TrainingSite { max_soldiers: 12 },
    );
    let warehouse = building("warehouse", BuildSize::Medium, BuildingKind::Warehouse);

    TribeDescr::from(TribeData {
        name: "barbarians".to_string(),
        wares,
        workers,
        buildings: vec![
            headquarters,
            lumberjack,
            sawmill,
            sentry,
            barrier,
            tower,
            fortress,
            mine,
            trainingcamp,
            warehouse,
        ],
        military: MilitaryData {
            min_retreat: 20,
            max_retreat: 70,
        },
        initializations: vec![
            Initialization {
                name: "headquarters".to_string(),
                script: "tribes/barbarians/scripting/headquarters.lua".to_string(),
            },
            Initialization {
                name: "village".to_string(),
                script: "tribes/barbarians/scripting/village.lua".to_string(),
            },
        ],
    })
}

/// Builder for small test worlds using [`test_tribe`].
pub struct WorldStateBuilder {
    width: i32,
    height: i32,
    players: Vec<(PlayerNumber, TeamNumber)>,
    territories: Vec<(PlayerNumber, Coords, u32)>,
    starting_positions: Vec<(PlayerNumber, Coords)>,
}

impl WorldStateBuilder {
    pub fn new() -> Self {
        Self {
            width: 16,
            height: 16,
            players: Vec::new(),
            territories: Vec::new(),
            starting_positions: Vec::new(),
        }
    }

    pub fn map_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_player(mut self, number: PlayerNumber, team: TeamNumber) -> Self {
        self.players.push((number, team));
        self
    }

    /// Give `player` every field within `radius` of `center`.
    pub fn with_territory(mut self, player: PlayerNumber, center: Coords, radius: u32) -> Self {
        self.territories.push((player, center, radius));
        self
    }

    pub fn with_starting_pos(mut self, player: PlayerNumber, c: Coords) -> Self {
        self.starting_positions.push((player, c));
        self
    }

    pub fn build(self) -> WorldState {
        let map = Map::new(self.width, self.height).expect("test map dimensions");
        let mut state = WorldState::new(map, vec![test_tribe()]);
        for &(number, team) in &self.players {
            state.add_player(number, format!("Player {}", number), 0);
            state.players.set_team_number(number, team);
        }
        for &(player, c) in &self.starting_positions {
            state.map.set_starting_pos(player, Some(c));
        }
        for &(player, center, radius) in &self.territories {
            territory::conquer_area_no_building(&mut state, player, center, radius);
        }
        state
    }
}

impl Default for WorldStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let state = WorldStateBuilder::default()
            .map_size(10, 10)
            .with_player(1, 0)
            .with_player(2, 1)
            .with_territory(1, Coords::new(5, 5), 2)
            .with_starting_pos(2, Coords::new(1, 1))
            .build();

        assert_eq!(state.map.width(), 10);
        assert_eq!(state.players.numbers(), vec![1, 2]);
        assert_eq!(state.players.get(2).unwrap().team_number(), 1);
        assert_eq!(state.map.field(Coords::new(5, 5)).owned_by, 1);
        assert_eq!(state.map.starting_pos(2), Some(Coords::new(1, 1)));
    }

    #[test]
    fn test_tribe_indices_match_docs() {
        let tribe = test_tribe();
        for (index, name) in [
            (0, "headquarters"),
            (3, "sentry"),
            (4, "barrier"),
            (6, "fortress"),
            (9, "warehouse"),
        ] {
            assert_eq!(tribe.building_index(name), Some(index));
        }
    }
}
