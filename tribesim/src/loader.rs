use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tribesim_core::coords::TeamNumber;
use tribesim_core::player::SharedStart;
use tribesim_core::systems::{initialization, military, placement, territory};
use tribesim_core::worker::SoldierLevels;
use tribesim_core::{
    Command, Coords, Map, PlayerInputs, PlayerNumber, SimConfig, TribeData, TribeDescr,
    WorldState,
};

/// A complete scenario: map, tribes, players, prebuilt infrastructure and a
/// timeline of player commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub map: MapSetup,
    pub tribes: Vec<TribeData>,
    pub players: Vec<PlayerSetup>,
    #[serde(default)]
    pub territory: Vec<TerritorySetup>,
    #[serde(default)]
    pub flags: Vec<FlagSetup>,
    #[serde(default)]
    pub roads: Vec<RoadSetup>,
    #[serde(default)]
    pub buildings: Vec<BuildingSetup>,
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSetup {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSetup {
    pub number: PlayerNumber,
    #[serde(default)]
    pub name: Option<String>,
    /// Tribe name, looked up in [`Scenario::tribes`].
    pub tribe: String,
    #[serde(default)]
    pub team: TeamNumber,
    #[serde(default)]
    pub start: Option<Coords>,
    #[serde(default)]
    pub initialization: u8,
    #[serde(default)]
    pub shared_starts: Vec<SharedStart>,
    #[serde(default)]
    pub allow_retreat_change: bool,
    #[serde(default)]
    pub retreat: Option<u8>,
    #[serde(default)]
    pub see_all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerritorySetup {
    pub player: PlayerNumber,
    pub center: Coords,
    pub radius: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagSetup {
    pub player: PlayerNumber,
    pub at: Coords,
}

/// A road either along explicit nodes or planned between two flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSetup {
    pub player: PlayerNumber,
    #[serde(default)]
    pub nodes: Vec<Coords>,
    #[serde(default)]
    pub from: Option<Coords>,
    #[serde(default)]
    pub to: Option<Coords>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSetup {
    pub player: PlayerNumber,
    pub at: Coords,
    pub building: String,
    #[serde(default)]
    pub construction_site: bool,
    #[serde(default)]
    pub soldiers: Vec<SoldierLevels>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub tick: u32,
    pub player: PlayerNumber,
    pub command: Command,
}

impl Scenario {
    /// Commands due at `tick`, grouped per player in file order.
    pub fn inputs_for_tick(&self, tick: u32) -> Vec<PlayerInputs> {
        let mut grouped: BTreeMap<PlayerNumber, Vec<Command>> = BTreeMap::new();
        for entry in self.timeline.iter().filter(|e| e.tick == tick) {
            grouped
                .entry(entry.player)
                .or_default()
                .push(entry.command.clone());
        }
        grouped
            .into_iter()
            .map(|(player, commands)| PlayerInputs { player, commands })
            .collect()
    }

    /// Last tick with a scheduled command, if any.
    pub fn last_tick(&self) -> Option<u32> {
        self.timeline.iter().map(|e| e.tick).max()
    }
}

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse scenario {}", path.display()))
}

pub fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse config {}", path.display()))
}

/// Build the initial world of a scenario.
pub fn build_world(scenario: &Scenario, config: &SimConfig) -> Result<WorldState> {
    let map = Map::new(scenario.map.width, scenario.map.height)?;
    let tribes: Vec<TribeDescr> = scenario.tribes.iter().cloned().map(Into::into).collect();
    log::info!(
        "Map {}x{}, {} tribe(s)",
        map.width(),
        map.height(),
        tribes.len()
    );
    let mut state = WorldState::new(map, tribes);

    for setup in &scenario.players {
        let Some(tribe_index) = state.tribes.iter().position(|t| t.name() == setup.tribe) else {
            bail!(
                "Player {} uses unknown tribe '{}'",
                setup.number,
                setup.tribe
            );
        };
        let name = setup
            .name
            .clone()
            .unwrap_or_else(|| format!("Player {}", setup.number));
        state.add_player(setup.number, name, tribe_index);
        state.players.set_team_number(setup.number, setup.team);
        let military = state.tribes[tribe_index].military();
        if let Some(p) = state.players.get_mut(setup.number) {
            p.initialization_index = setup.initialization;
            p.shared_starts = setup.shared_starts.clone();
            p.allow_retreat_change = setup.allow_retreat_change;
            p.see_all = setup.see_all;
            if let Some(retreat) = setup.retreat {
                p.set_retreat_percentage(retreat, military);
            }
        }
        state.map.set_starting_pos(setup.number, setup.start);
    }

    for t in &scenario.territory {
        territory::conquer_area_no_building(&mut state, t.player, t.center, t.radius);
    }
    for f in &scenario.flags {
        placement::force_flag(&mut state, f.player, f.at);
    }
    for r in &scenario.roads {
        let path = match (r.from, r.to) {
            (Some(from), Some(to)) => placement::plan_road(&state, r.player, from, to)?,
            _ => tribesim_core::path::Path::through(&state.map, &r.nodes)
                .with_context(|| format!("Road nodes {:?} are not adjacent", r.nodes))?,
        };
        placement::force_road(&mut state, r.player, &path)?;
    }
    for b in &scenario.buildings {
        let index = state
            .tribe_of(b.player)
            .and_then(|t| t.building_index(&b.building))
            .with_context(|| format!("Player {} has no building '{}'", b.player, b.building))?;
        let serial = placement::force_building(
            &mut state,
            b.player,
            b.at,
            index,
            b.construction_site,
            config,
        )?;
        let stationed = military::station_soldiers(&mut state, serial, &b.soldiers);
        log::debug!(
            "Placed {} #{} at {} with {} soldier(s)",
            b.building,
            serial,
            b.at,
            stationed.len()
        );
    }

    for setup in scenario.players.iter().filter(|p| p.start.is_some()) {
        initialization::create_default_infrastructure(&mut state, setup.number)?;
    }

    Ok(state)
}
