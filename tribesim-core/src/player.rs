//! Players and the player table.
//!
//! A [`Player`] exclusively owns its vision map, statistics and inbox. The
//! only cross-player write is team vision: [`Players::see_node`] and
//! [`Players::unsee_node`] fan a change out to every team-mate exactly one
//! level deep.

use crate::coords::{MapIndex, PlayerNumber, TeamNumber, Time, MAX_PLAYERS};
use crate::map::Map;
use crate::messages::MessageQueue;
use crate::statistics::{BuildingCensus, WareStatistics};
use crate::tribe::{BuildingIndex, MilitaryData, TribeDescr, WorkerIndex};
use crate::vision::{Visibility, VisionMap, WorldView};
use serde::{Deserialize, Serialize};

/// Retreat percentage before the tribe limits are applied.
pub const DEFAULT_RETREAT_PERCENTAGE: u8 = 50;

/// Another player's start position whose initialization this player runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedStart {
    pub position_of: PlayerNumber,
    pub initialization_index: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub number: PlayerNumber,
    pub name: String,
    /// Index into the world's tribe list.
    pub tribe: usize,
    team: TeamNumber,
    team_players: Vec<PlayerNumber>,
    team_uptodate: bool,
    /// Observer mode: every node counts as seen.
    pub see_all: bool,
    pub initialization_index: u8,
    pub shared_starts: Vec<SharedStart>,
    pub vision: VisionMap,
    allowed_worker_types: Vec<bool>,
    allowed_building_types: Vec<bool>,
    retreat_percentage: u8,
    pub allow_retreat_change: bool,
    pub ware_stats: WareStatistics,
    pub census: BuildingCensus,
    pub messages: MessageQueue,
    pub casualties: u32,
    pub kills: u32,
    pub msites_lost: u32,
    pub msites_defeated: u32,
    pub civil_blds_lost: u32,
    pub civil_blds_defeated: u32,
}

impl Player {
    pub fn new(
        number: PlayerNumber,
        name: impl Into<String>,
        tribe_index: usize,
        tribe: &TribeDescr,
        map: &Map,
    ) -> Self {
        Self {
            number,
            name: name.into(),
            tribe: tribe_index,
            team: 0,
            team_players: Vec::new(),
            team_uptodate: false,
            see_all: false,
            initialization_index: 0,
            shared_starts: Vec::new(),
            vision: VisionMap::new(map),
            allowed_worker_types: vec![false; tribe.nr_workers()],
            allowed_building_types: vec![true; tribe.nr_buildings()],
            retreat_percentage: DEFAULT_RETREAT_PERCENTAGE,
            allow_retreat_change: false,
            ware_stats: WareStatistics::new(tribe.nr_wares()),
            census: BuildingCensus::default(),
            messages: MessageQueue::default(),
            casualties: 0,
            kills: 0,
            msites_lost: 0,
            msites_defeated: 0,
            civil_blds_lost: 0,
            civil_blds_defeated: 0,
        }
    }

    pub fn team_number(&self) -> TeamNumber {
        self.team
    }

    pub fn retreat_percentage(&self) -> u8 {
        self.retreat_percentage
    }

    /// Store a retreat percentage, clamped into the tribe's limits.
    pub fn set_retreat_percentage(&mut self, percentage: u8, limits: MilitaryData) {
        self.retreat_percentage = clamp_retreat(percentage, limits);
    }

    pub fn allow_worker_type(&mut self, worker: WorkerIndex, allow: bool) -> bool {
        match self.allowed_worker_types.get_mut(worker as usize) {
            Some(slot) => {
                *slot = allow;
                true
            }
            None => false,
        }
    }

    pub fn is_worker_type_allowed(&self, worker: WorkerIndex) -> bool {
        self.allowed_worker_types
            .get(worker as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn allow_building_type(&mut self, building: BuildingIndex, allow: bool) -> bool {
        match self.allowed_building_types.get_mut(building as usize) {
            Some(slot) => {
                *slot = allow;
                true
            }
            None => false,
        }
    }

    pub fn is_building_type_allowed(&self, building: BuildingIndex) -> bool {
        self.allowed_building_types
            .get(building as usize)
            .copied()
            .unwrap_or(false)
    }

    pub fn visibility(&self, index: MapIndex) -> Visibility {
        if self.see_all {
            return Visibility::Seen;
        }
        self.vision.visibility(index)
    }
}

/// Clamp a retreat percentage into `[min_retreat, max_retreat]`.
pub fn clamp_retreat(percentage: u8, limits: MilitaryData) -> u8 {
    if percentage < limits.min_retreat {
        limits.min_retreat
    } else if percentage > limits.max_retreat {
        limits.max_retreat
    } else {
        percentage
    }
}

/// All player slots of a game, indexed by player number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Players {
    slots: Vec<Option<Player>>,
}

impl Default for Players {
    fn default() -> Self {
        Self {
            slots: vec![None; MAX_PLAYERS as usize],
        }
    }
}

impl Players {
    fn slot(number: PlayerNumber) -> Option<usize> {
        (1..=MAX_PLAYERS)
            .contains(&number)
            .then(|| number as usize - 1)
    }

    pub fn get(&self, number: PlayerNumber) -> Option<&Player> {
        self.slots.get(Self::slot(number)?)?.as_ref()
    }

    pub fn get_mut(&mut self, number: PlayerNumber) -> Option<&mut Player> {
        self.slots.get_mut(Self::slot(number)?)?.as_mut()
    }

    /// Install a player in its slot, replacing any previous one.
    pub fn insert(&mut self, player: Player) {
        if let Some(slot) = Self::slot(player.number) {
            self.slots[slot] = Some(player);
            self.invalidate_teams();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().flatten()
    }

    pub fn numbers(&self) -> Vec<PlayerNumber> {
        self.iter().map(|p| p.number).collect()
    }

    pub fn set_team_number(&mut self, number: PlayerNumber, team: TeamNumber) {
        if let Some(player) = self.get_mut(number) {
            player.team = team;
            self.invalidate_teams();
        }
    }

    fn invalidate_teams(&mut self) {
        for player in self.slots.iter_mut().flatten() {
            player.team_uptodate = false;
        }
    }

    /// Team-mates of `number`, rebuilding the cached list when stale.
    pub fn team_players(&mut self, number: PlayerNumber) -> Vec<PlayerNumber> {
        let Some(player) = self.get(number) else {
            return Vec::new();
        };
        if player.team_uptodate {
            return player.team_players.clone();
        }
        let team = player.team;
        let mates: Vec<PlayerNumber> = if team == 0 {
            Vec::new()
        } else {
            self.iter()
                .filter(|other| other.number != number && other.team == team)
                .map(|other| other.number)
                .collect()
        };
        if let Some(player) = self.get_mut(number) {
            player.team_players = mates.clone();
            player.team_uptodate = true;
        }
        mates
    }

    /// Two players are hostile unless they are the same player or share a
    /// non-zero team.
    pub fn is_hostile(&self, a: PlayerNumber, b: PlayerNumber) -> bool {
        let team_of = |n| self.get(n).map_or(0, |p| p.team);
        let team_a = team_of(a);
        a != b && (team_a == 0 || team_a != team_of(b))
    }

    /// Add one observer for `player` (and, unless `forward`, for its team).
    pub fn see_node(
        &mut self,
        view: WorldView<'_>,
        player: PlayerNumber,
        index: MapIndex,
        forward: bool,
    ) {
        let mut targets = vec![player];
        if !forward {
            targets.extend(self.team_players(player));
        }
        for target in targets {
            if let Some(p) = self.get_mut(target) {
                p.vision.see(view, index);
            }
        }
    }

    /// Remove one observer for `player` (and, unless `forward`, for its team).
    pub fn unsee_node(&mut self, player: PlayerNumber, index: MapIndex, now: Time, forward: bool) {
        let Some(p) = self.get(player) else {
            return;
        };
        if !p.vision.is_seen(index) {
            log::error!(
                "Player {}: decreasing vision for node {} that is not seen. Report bug!",
                player,
                index
            );
            return;
        }
        let mut targets = vec![player];
        if !forward {
            targets.extend(self.team_players(player));
        }
        for target in targets {
            if let Some(p) = self.get_mut(target) {
                if !p.vision.unsee(index, now) {
                    log::error!(
                        "Player {}: decreasing vision for node {} that is not seen. Report bug!",
                        target,
                        index
                    );
                }
            }
        }
    }
}
