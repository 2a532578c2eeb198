//! Territory and build rights.

use crate::caps::{BuildSize, NodeCaps};
use crate::coords::{Coords, PlayerNumber, Serial};
use crate::map::Map;
use crate::state::WorldState;
use crate::systems::placement;
use std::collections::BTreeSet;
use tracing::instrument;

/// Node caps of `c` filtered by `player`'s territory.
///
/// Nothing is allowed outside the player's interior. A building needs its
/// flag site (bottom-right neighbour) to be interior as well; a big
/// building additionally needs its top-right, top-left and left neighbours,
/// otherwise only small buildings remain possible.
pub fn get_buildcaps(map: &Map, player: PlayerNumber, c: Coords) -> NodeCaps {
    let field = map.field(c);
    if !field.is_interior(player) {
        return NodeCaps::NONE;
    }
    let mut caps = field.caps;
    if caps.can_build() {
        if !map.field(map.br_n(c)).is_interior(player) {
            return caps.without_building();
        }
        if caps.size() == BuildSize::Big {
            let swells_over_border = [map.tr_n(c), map.tl_n(c), map.l_n(c)]
                .iter()
                .any(|&n| !map.field(n).is_interior(player));
            if swells_over_border {
                caps = caps.with_size(BuildSize::Small);
            }
        }
    }
    caps
}

/// Claim every field within `radius` of `center` for `player`, whoever owns
/// it now, and clear other players' immovables from the claimed land.
#[instrument(skip(state))]
pub fn conquer_area_no_building(
    state: &mut WorldState,
    player: PlayerNumber,
    center: Coords,
    radius: u32,
) {
    claim(state, player, center, radius, true);
}

/// Claim the unowned fields within `radius` of `center` for `player`.
#[instrument(skip(state))]
pub fn conquer_area(state: &mut WorldState, player: PlayerNumber, center: Coords, radius: u32) {
    claim(state, player, center, radius, false);
}

fn claim(
    state: &mut WorldState,
    player: PlayerNumber,
    center: Coords,
    radius: u32,
    take_foreign: bool,
) {
    let mut claimed = Vec::new();
    for c in state.map.region(center, radius) {
        let owner = state.map.field(c).owned_by;
        if owner == player || (owner != 0 && !take_foreign) {
            continue;
        }
        state.map.set_owner(c, player);
        claimed.push(c);
    }
    if claimed.is_empty() {
        return;
    }
    state.map.recalc_borders_around(center, radius + 1);
    log::debug!(
        "Player {} claimed {} fields around {}",
        player,
        claimed.len(),
        center
    );
    cleanup_foreign_immovables(state, player, &claimed);
}

/// Remove immovables of other players that now stand on `player`'s land.
fn cleanup_foreign_immovables(state: &mut WorldState, player: PlayerNumber, fields: &[Coords]) {
    let foreign: BTreeSet<Serial> = fields
        .iter()
        .filter_map(|&c| state.map.field(c).immovable)
        .map(|imm| imm.serial)
        .filter(|&serial| {
            state
                .objects
                .immovable(serial)
                .is_some_and(|imm| imm.owner() != player)
        })
        .collect();

    for serial in foreign {
        // Removing a flag takes its roads and building with it.
        if !state.objects.exists(serial) {
            continue;
        }
        if let Some(loser) = civil_building_owner(state, serial) {
            if let Some(p) = state.players.get_mut(loser) {
                p.civil_blds_lost += 1;
            }
            if let Some(p) = state.players.get_mut(player) {
                p.civil_blds_defeated += 1;
            }
        }
        log::debug!("Removing foreign immovable {} from conquered land", serial);
        placement::remove_immovable(state, serial);
    }
}

/// Owner of `serial` if it is a non-military building.
fn civil_building_owner(state: &WorldState, serial: Serial) -> Option<PlayerNumber> {
    let building = state.objects.building(serial)?;
    let descr = state
        .tribes
        .get(building.tribe)?
        .building(building.descr)?;
    (!descr.is_military()).then_some(building.owner)
}
