use crate::caps::NodeCaps;
use crate::coords::{Coords, PlayerNumber, Time};
use crate::immovable::Objects;
use crate::map::Map;
use crate::messages::MessageId;
use crate::player::{Player, Players};
use crate::queue::CommandQueue;
use crate::systems::territory;
use crate::tribe::{BuildingDescr, BuildingIndex, TribeDescr};
use crate::vision::{Visibility, WorldView};
use serde::{Deserialize, Serialize};

/// Fire-and-forget notification for the presentation layer.
///
/// The core never waits on these; a collaborator drains
/// [`WorldState::notifications`] after each step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Notification {
    PlayMessageSound {
        player: PlayerNumber,
        fx: String,
    },
    PopupMessage {
        player: PlayerNumber,
        message: MessageId,
    },
    /// Start an initialization script for `player`, optionally at a shared-in
    /// start position.
    RunScript {
        player: PlayerNumber,
        script: String,
        position: Option<Coords>,
    },
}

/// Complete simulation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldState {
    /// Game time in milliseconds.
    pub gametime: Time,
    pub tick: u32,
    pub map: Map,
    pub tribes: Vec<TribeDescr>,
    pub players: Players,
    pub objects: Objects,
    pub queue: CommandQueue,
    pub notifications: Vec<Notification>,
    pub quit_requested: bool,
}

impl WorldState {
    pub fn new(map: Map, tribes: Vec<TribeDescr>) -> Self {
        Self {
            gametime: 0,
            tick: 0,
            map,
            tribes,
            players: Players::default(),
            objects: Objects::default(),
            queue: CommandQueue::default(),
            notifications: Vec::new(),
            quit_requested: false,
        }
    }

    /// Add a player using the tribe at `tribe_index`. Returns `false` if the
    /// tribe does not exist.
    pub fn add_player(
        &mut self,
        number: PlayerNumber,
        name: impl Into<String>,
        tribe_index: usize,
    ) -> bool {
        let Some(tribe) = self.tribes.get(tribe_index) else {
            return false;
        };
        let player = Player::new(number, name, tribe_index, tribe, &self.map);
        self.players.insert(player);
        true
    }

    pub fn view(&self) -> WorldView<'_> {
        WorldView {
            map: &self.map,
            objects: &self.objects,
            tribes: &self.tribes,
        }
    }

    pub fn tribe_of(&self, player: PlayerNumber) -> Option<&TribeDescr> {
        let player = self.players.get(player)?;
        self.tribes.get(player.tribe)
    }

    pub fn building_descr(
        &self,
        player: PlayerNumber,
        building: BuildingIndex,
    ) -> Option<&BuildingDescr> {
        self.tribe_of(player)?.building(building)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn buildcaps(&self, c: Coords, player: PlayerNumber) -> NodeCaps {
        territory::get_buildcaps(&self.map, player, c)
    }

    pub fn is_hostile(&self, a: PlayerNumber, b: PlayerNumber) -> bool {
        self.players.is_hostile(a, b)
    }

    pub fn visibility(&self, player: PlayerNumber, c: Coords) -> Visibility {
        match self.players.get(player) {
            Some(p) => p.visibility(self.map.index(c)),
            None => Visibility::Unseen,
        }
    }

    // ========================================================================
    // Vision
    // ========================================================================

    /// Add one observer for every node within `radius` of `center`.
    pub fn see_area(&mut self, player: PlayerNumber, center: Coords, radius: u32) {
        let view = WorldView {
            map: &self.map,
            objects: &self.objects,
            tribes: &self.tribes,
        };
        for c in self.map.region(center, radius) {
            self.players
                .see_node(view, player, self.map.index(c), false);
        }
    }

    pub fn unsee_area(&mut self, player: PlayerNumber, center: Coords, radius: u32) {
        for c in self.map.region(center, radius) {
            let index = self.map.index(c);
            self.players
                .unsee_node(player, index, self.gametime, false);
        }
    }

    /// Compute a deterministic checksum of the world state.
    ///
    /// Every container hashed here iterates in id order, so identical
    /// states produce identical checksums on every replica.
    pub fn checksum(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        self.gametime.hash(&mut hasher);
        self.tick.hash(&mut hasher);
        self.map.hash(&mut hasher);
        self.players.hash(&mut hasher);
        self.objects.hash(&mut hasher);
        self.queue.hash(&mut hasher);
        hasher.finish()
    }
}
