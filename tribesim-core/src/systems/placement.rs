//! Creating and removing flags, roads and buildings.
//!
//! The `build_*` operations are player intents: they check build rights and
//! either succeed completely or leave the world untouched. The `force_*`
//! variants are for scripted setup and clear whatever is in the way.
//!
//! All field bookkeeping (immovable references, road bits, node caps,
//! census, vision) happens in the create/destroy hooks at the bottom of
//! this module, so every path through the engine keeps it consistent.

use crate::caps::{BuildSize, NodeCaps};
use crate::config::SimConfig;
use crate::coords::{Coords, Direction, PlayerNumber, Serial};
use crate::immovable::{Building, BuildingState, Flag, Immovable, ImmovableKind, Road};
use crate::map::{FieldImmovable, Map, ROAD_BUSY, ROAD_NONE, ROAD_NORMAL};
use crate::path::Path;
use crate::queue::Scheduled;
use crate::state::WorldState;
use crate::step::ActionError;
use crate::systems::{buildings, construction, territory};
use crate::tribe::BuildingIndex;
use game_pathfinding::{AStar, Graph};
use std::collections::BTreeSet;

/// Vision radius of a construction site.
pub const CONSTRUCTION_SITE_VISION: u32 = 2;

// ============================================================================
// Player intents
// ============================================================================

/// Build a flag if the player has flag rights at `c`. A flag placed on a
/// road splits it.
pub fn build_flag(
    state: &mut WorldState,
    player: PlayerNumber,
    c: Coords,
) -> Result<Serial, ActionError> {
    require_player(state, player)?;
    let c = state.map.normalize(c);
    if !territory::get_buildcaps(&state.map, player, c).contains(NodeCaps::FLAG) {
        return Err(ActionError::NoFlagRights { at: c, player });
    }
    Ok(create_flag(state, player, c))
}

/// Build a road between two existing flags of the player.
///
/// Every intermediate node must be free and walkable in the player's
/// territory. Nothing is changed unless the whole path is valid.
pub fn build_road(
    state: &mut WorldState,
    player: PlayerNumber,
    path: &Path,
) -> Result<Serial, ActionError> {
    require_player(state, player)?;
    let map = &state.map;
    let start = own_flag_at(state, player, path.start())
        .ok_or(ActionError::MissingStartFlag(path.start()))?;
    let end =
        own_flag_at(state, player, path.end()).ok_or(ActionError::MissingEndFlag(path.end()))?;
    if path.nsteps() < 2 || start == end {
        return Err(ActionError::BadPath);
    }

    let nodes = path.nodes(map);
    let unique: BTreeSet<usize> = nodes.iter().map(|&c| map.index(c)).collect();
    if unique.len() != nodes.len() {
        return Err(ActionError::BadPath);
    }
    for &c in inner_nodes(&nodes) {
        if let Some(imm) = map.field(c).immovable {
            if imm.size >= BuildSize::Small || imm.kind == ImmovableKind::Road {
                log::debug!(
                    "{}: building road, immovable in the way, type={:?}",
                    player,
                    imm.kind
                );
                return Err(ActionError::RoadBlocked(c));
            }
        }
        if !territory::get_buildcaps(map, player, c).can_walk() {
            return Err(ActionError::Unwalkable(c));
        }
    }
    Ok(create_road(state, player, start, end, path.clone(), false))
}

/// Place a building or construction site of type `building` at `c`.
pub fn build(
    state: &mut WorldState,
    player: PlayerNumber,
    c: Coords,
    building: BuildingIndex,
    construction_site: bool,
    config: &SimConfig,
) -> Result<Serial, ActionError> {
    let owner = state
        .players
        .get(player)
        .ok_or(ActionError::NoSuchPlayer(player))?;
    let descr = state
        .building_descr(player, building)
        .ok_or(ActionError::UnknownBuildingType(building))?;
    if !descr.buildable {
        return Err(ActionError::NotBuildable(building));
    }
    if !owner.is_building_type_allowed(building) {
        return Err(ActionError::BuildingNotAllowed(building));
    }

    let c = state.map.normalize(c);
    let caps = territory::get_buildcaps(&state.map, player, c);
    let fits = if descr.is_mine {
        caps.contains(NodeCaps::MINE)
    } else {
        caps.size() >= descr.size
    };
    if !fits {
        return Err(ActionError::InsufficientCaps(c));
    }
    create_building(state, player, c, building, construction_site, None, config)
}

/// Replace a building by a construction site for one of its enhancements.
///
/// The old workers are put back into stock.
pub fn enhance_building(
    state: &mut WorldState,
    player: PlayerNumber,
    building: Serial,
    to: BuildingIndex,
    config: &SimConfig,
) -> Result<Serial, ActionError> {
    let old = owned_building(state, player, building)?;
    let from = old.descr;
    let position = old.position;
    let descr = state
        .building_descr(player, from)
        .ok_or(ActionError::UnknownBuildingType(from))?;
    if !descr.enhancements.contains(&to) {
        return Err(ActionError::NotAnEnhancement { from, to });
    }
    if state.building_descr(player, to).is_none() {
        return Err(ActionError::UnknownBuildingType(to));
    }

    destroy_building(state, building);
    let site = create_building(state, player, position, to, true, Some(from), config)?;
    log::info!(
        "Player {} enhances building {} at {} into {}",
        player,
        from,
        position,
        to
    );
    Ok(site)
}

/// Plan a road path for `player` between two nodes.
pub fn plan_road(
    state: &WorldState,
    player: PlayerNumber,
    from: Coords,
    to: Coords,
) -> Result<Path, ActionError> {
    let map = &state.map;
    let from = map.normalize(from);
    let to = map.normalize(to);
    let graph = RoadGraph { map, player, goal: to };
    let no_path = ActionError::NoPath { from, to };
    let (nodes, _) = AStar::find_path(&graph, from, to, &()).ok_or(no_path.clone())?;
    Path::through(map, &nodes).ok_or(no_path)
}

/// Fields a new road may cross: free, walkable, in the player's interior.
struct RoadGraph<'a> {
    map: &'a Map,
    player: PlayerNumber,
    goal: Coords,
}

impl Graph<Coords, ()> for RoadGraph<'_> {
    fn neighbors(&self, node: Coords, _context: &()) -> Vec<Coords> {
        self.map
            .neighbours(node)
            .into_iter()
            .filter(|&n| {
                n == self.goal
                    || (self.map.field(n).immovable.is_none()
                        && territory::get_buildcaps(self.map, self.player, n).can_walk())
            })
            .collect()
    }

    fn cost(&self, _from: Coords, _to: Coords, _context: &()) -> u32 {
        1
    }

    fn heuristic(&self, from: Coords, target: Coords, _context: &()) -> u32 {
        self.map.calc_distance(from, target)
    }
}

// ============================================================================
// Scripted placement
// ============================================================================

/// Place a flag at `c` no matter what: clears blockers and nearby flags and
/// claims the surrounding land.
pub fn force_flag(state: &mut WorldState, player: PlayerNumber, c: Coords) -> Serial {
    let c = state.map.normalize(c);
    log::info!("Forcing flag at {}", c);
    if let Some(imm) = state.map.field(c).immovable {
        match imm.kind {
            ImmovableKind::Flag => {
                if state.objects.flag(imm.serial).map(|f| f.owner) == Some(player) {
                    return imm.serial;
                }
            }
            // A road is OK; the new flag splits it.
            ImmovableKind::Road => {}
            ImmovableKind::Building => remove_immovable(state, imm.serial),
        }
    }
    for n in state.map.region(c, 1) {
        if let Some(imm) = state.map.field(n).immovable {
            if imm.kind == ImmovableKind::Flag {
                remove_immovable(state, imm.serial);
            }
        }
    }
    territory::conquer_area_no_building(state, player, c, 1);
    create_flag(state, player, c)
}

/// Build a road along `path`, creating its end flags, claiming the land
/// along it and clearing anything in the way.
pub fn force_road(
    state: &mut WorldState,
    player: PlayerNumber,
    path: &Path,
) -> Result<Serial, ActionError> {
    if path.nsteps() < 2 {
        return Err(ActionError::BadPath);
    }
    let start = force_flag(state, player, path.start());
    let end = force_flag(state, player, path.end());
    let nodes = path.nodes(&state.map);
    for &c in inner_nodes(&nodes) {
        log::debug!("Clearing for road at {}", c);
        territory::conquer_area_no_building(state, player, c, 1);
        if let Some(imm) = state.map.field(c).immovable {
            if imm.serial != start && imm.serial != end {
                remove_immovable(state, imm.serial);
            }
        }
    }
    if !state.objects.exists(start) || !state.objects.exists(end) {
        return Err(ActionError::BadPath);
    }
    Ok(create_road(state, player, start, end, path.clone(), false))
}

/// Place a building (or construction site) without checking build rights.
pub fn force_building(
    state: &mut WorldState,
    player: PlayerNumber,
    c: Coords,
    building: BuildingIndex,
    construction_site: bool,
    config: &SimConfig,
) -> Result<Serial, ActionError> {
    require_player(state, player)?;
    let size = state
        .building_descr(player, building)
        .ok_or(ActionError::UnknownBuildingType(building))?
        .size;
    let c = state.map.normalize(c);
    let flag_site = state.map.br_n(c);
    force_flag(state, player, flag_site);
    if let Some(imm) = state.map.field(c).immovable {
        remove_immovable(state, imm.serial);
    }
    for fc in footprint(&state.map, c, size) {
        territory::conquer_area_no_building(state, player, fc, 1);
        if let Some(imm) = state.map.field(fc).immovable {
            remove_immovable(state, imm.serial);
        }
    }
    create_building(state, player, c, building, construction_site, None, config)
}

// ============================================================================
// Create / destroy hooks
// ============================================================================

/// Nodes occupied by a building of `size` whose primary node is `c`.
pub fn footprint(map: &Map, c: Coords, size: BuildSize) -> Vec<Coords> {
    let c = map.normalize(c);
    if size == BuildSize::Big {
        vec![c, map.tr_n(c), map.tl_n(c), map.l_n(c)]
    } else {
        vec![c]
    }
}

pub(crate) fn create_flag(state: &mut WorldState, owner: PlayerNumber, c: Coords) -> Serial {
    let c = state.map.normalize(c);
    let split = match state.map.field(c).immovable {
        Some(imm) if imm.kind == ImmovableKind::Road => Some(imm.serial),
        _ => None,
    };
    let serial = state
        .objects
        .insert_immovable(Immovable::Flag(Flag::new(owner, c)));
    state.map.set_immovable(
        c,
        Some(FieldImmovable {
            serial,
            kind: ImmovableKind::Flag,
            size: BuildSize::Small,
        }),
    );
    if let Some(road) = split {
        split_road(state, road, serial);
    }
    state.map.recalc_caps_around(c, 2);
    log::debug!("Player {} created flag {} at {}", owner, serial, c);
    serial
}

/// Replace `road` by two roads meeting at `flag`, which stands on it.
fn split_road(state: &mut WorldState, road: Serial, flag: Serial) {
    let Some(position) = state.objects.flag(flag).map(|f| f.position) else {
        return;
    };
    let Some(Immovable::Road(old)) = state.objects.remove_immovable(road) else {
        log::error!("Splitting road {} that does not exist. Report bug!", road);
        return;
    };
    let nodes = old.path.nodes(&state.map);
    let at = nodes
        .iter()
        .position(|&n| n == position)
        .filter(|&i| i > 0 && i + 1 < nodes.len());
    let Some(at) = at else {
        log::error!(
            "Flag {} at {} is not inside road {}. Report bug!",
            flag,
            position,
            road
        );
        return;
    };
    let (head, tail) = old.path.split_at(&state.map, at);
    create_road(state, old.owner, old.start, flag, head, old.busy);
    create_road(state, old.owner, flag, old.end, tail, old.busy);
}

pub(crate) fn create_road(
    state: &mut WorldState,
    owner: PlayerNumber,
    start: Serial,
    end: Serial,
    path: Path,
    busy: bool,
) -> Serial {
    let steps = path.steps().to_vec();
    let nodes = path.nodes(&state.map);
    let serial = state.objects.insert_immovable(Immovable::Road(Road {
        owner,
        path,
        start,
        end,
        busy,
    }));

    let value = if busy { ROAD_BUSY } else { ROAD_NORMAL };
    for (&c, &dir) in nodes.iter().zip(&steps) {
        state.map.set_road(c, dir, value);
    }
    for &c in inner_nodes(&nodes) {
        state.map.set_immovable(
            c,
            Some(FieldImmovable {
                serial,
                kind: ImmovableKind::Road,
                size: BuildSize::None,
            }),
        );
    }
    if let (Some(&first), Some(&last)) = (steps.first(), steps.last()) {
        if let Some(flag) = state.objects.flag_mut(start) {
            flag.set_road(first, Some(serial));
        }
        if let Some(flag) = state.objects.flag_mut(end) {
            flag.set_road(last.opposite(), Some(serial));
        }
    }
    for &c in &nodes {
        state.map.recalc_caps_around(c, 1);
    }
    serial
}

/// Create a building; its base flag is created as well when missing.
pub(crate) fn create_building(
    state: &mut WorldState,
    owner: PlayerNumber,
    c: Coords,
    descr_index: BuildingIndex,
    construction_site: bool,
    previous: Option<BuildingIndex>,
    config: &SimConfig,
) -> Result<Serial, ActionError> {
    let tribe = state
        .players
        .get(owner)
        .ok_or(ActionError::NoSuchPlayer(owner))?
        .tribe;
    let descr = state
        .building_descr(owner, descr_index)
        .ok_or(ActionError::UnknownBuildingType(descr_index))?;
    let size = descr.size;
    let capacity = descr.max_soldiers();
    let vision = if construction_site {
        CONSTRUCTION_SITE_VISION
    } else {
        descr.vision_range
    };

    let c = state.map.normalize(c);
    let flag_site = state.map.br_n(c);
    let flag = match state.map.field(flag_site).immovable {
        Some(imm) if imm.kind == ImmovableKind::Flag => imm.serial,
        _ => create_flag(state, owner, flag_site),
    };

    let building_state = if construction_site {
        BuildingState::ConstructionSite {
            progress: 0,
            previous,
        }
    } else {
        BuildingState::Finished
    };
    let serial = state
        .objects
        .insert_immovable(Immovable::Building(Building {
            owner,
            position: c,
            tribe,
            descr: descr_index,
            size,
            flag,
            state: building_state,
            workers: Vec::new(),
            soldiers: Vec::new(),
            soldier_capacity: capacity,
            stopped: false,
            training_priorities: Default::default(),
            ware_policies: Default::default(),
            worker_policies: Default::default(),
        }));
    for fc in footprint(&state.map, c, size) {
        state.map.set_immovable(
            fc,
            Some(FieldImmovable {
                serial,
                kind: ImmovableKind::Building,
                size,
            }),
        );
    }
    if let Some(f) = state.objects.flag_mut(flag) {
        f.building = Some(serial);
    }
    state.map.recalc_caps_around(c, 3);

    if let Some(player) = state.players.get_mut(owner) {
        player.census.add(descr_index, c, construction_site);
    }
    state.see_area(owner, c, vision);
    log::debug!(
        "Player {} created building {} (type {}) at {}",
        owner,
        serial,
        descr_index,
        c
    );

    if construction_site {
        state.queue.schedule(
            state.gametime + config.construction_step_ms,
            Scheduled::ConstructionStep { building: serial },
        );
    } else {
        construction::on_finished(state, serial, config);
    }
    Ok(serial)
}

/// Remove a building. Its flag stays; workers inside go back into stock.
pub(crate) fn destroy_building(state: &mut WorldState, serial: Serial) -> Option<Building> {
    let radius = match building_vision(state, serial) {
        Some(radius) => radius,
        None if state.objects.building(serial).is_some() => {
            log::error!("Building {} has no description. Report bug!", serial);
            0
        }
        None => return None,
    };
    let Some(Immovable::Building(building)) = state.objects.remove_immovable(serial) else {
        return None;
    };
    for fc in footprint(&state.map, building.position, building.size) {
        if state.map.field(fc).immovable.map(|imm| imm.serial) == Some(serial) {
            state.map.set_immovable(fc, None);
        }
    }
    if let Some(flag) = state.objects.flag_mut(building.flag) {
        if flag.building == Some(serial) {
            flag.building = None;
        }
    }
    if let Some(player) = state.players.get_mut(building.owner) {
        if let Err(e) = player.census.remove(building.descr, building.position) {
            log::error!("Player {}: {} Report bug!", building.owner, e);
        }
    }
    state.unsee_area(building.owner, building.position, radius);

    for &worker in building.workers.iter().chain(&building.soldiers) {
        buildings::release_worker(state, worker, building.position);
    }
    state.map.recalc_caps_around(building.position, 3);
    log::debug!("Destroyed building {} at {}", serial, building.position);
    Some(building)
}

pub(crate) fn destroy_road(state: &mut WorldState, serial: Serial) {
    let Some(Immovable::Road(road)) = state.objects.remove_immovable(serial) else {
        return;
    };
    let steps = road.path.steps();
    let nodes = road.path.nodes(&state.map);
    for (&c, &dir) in nodes.iter().zip(steps) {
        state.map.set_road(c, dir, ROAD_NONE);
    }
    for &c in inner_nodes(&nodes) {
        if state.map.field(c).immovable.map(|imm| imm.serial) == Some(serial) {
            state.map.set_immovable(c, None);
        }
    }
    if let (Some(&first), Some(&last)) = (steps.first(), steps.last()) {
        detach_road(state, road.start, first, serial);
        detach_road(state, road.end, last.opposite(), serial);
    }
    for &c in &nodes {
        state.map.recalc_caps_around(c, 1);
    }
}

fn detach_road(state: &mut WorldState, flag: Serial, dir: Direction, road: Serial) {
    if let Some(flag) = state.objects.flag_mut(flag) {
        if flag.road(dir) == Some(road) {
            flag.set_road(dir, None);
        }
    }
}

/// Remove a flag together with its building and every attached road.
pub(crate) fn destroy_flag(state: &mut WorldState, serial: Serial) {
    let Some(flag) = state.objects.flag(serial).cloned() else {
        return;
    };
    if let Some(building) = flag.building {
        destroy_building(state, building);
    }
    for road in flag.attached_roads() {
        destroy_road(state, road);
    }
    state.objects.remove_immovable(serial);
    if state.map.field(flag.position).immovable.map(|imm| imm.serial) == Some(serial) {
        state.map.set_immovable(flag.position, None);
    }
    state.map.recalc_caps_around(flag.position, 2);
    log::debug!("Destroyed flag {} at {}", serial, flag.position);
}

/// Remove any immovable, dispatching on its kind.
pub fn remove_immovable(state: &mut WorldState, serial: Serial) {
    match state.objects.immovable(serial).map(Immovable::kind) {
        Some(ImmovableKind::Flag) => destroy_flag(state, serial),
        Some(ImmovableKind::Road) => destroy_road(state, serial),
        Some(ImmovableKind::Building) => {
            destroy_building(state, serial);
        }
        None => {}
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn require_player(state: &WorldState, player: PlayerNumber) -> Result<(), ActionError> {
    state
        .players
        .get(player)
        .map(drop)
        .ok_or(ActionError::NoSuchPlayer(player))
}

fn own_flag_at(state: &WorldState, player: PlayerNumber, c: Coords) -> Option<Serial> {
    let imm = state.map.field(c).immovable?;
    state
        .objects
        .flag(imm.serial)
        .filter(|f| f.owner == player)
        .map(|_| imm.serial)
}

/// The building `serial`, if it exists and belongs to `player`.
pub(crate) fn owned_building(
    state: &WorldState,
    player: PlayerNumber,
    serial: Serial,
) -> Result<&Building, ActionError> {
    let building = match state.objects.immovable(serial) {
        Some(Immovable::Building(b)) => b,
        Some(_) => return Err(ActionError::NotABuilding(serial)),
        None => return Err(ActionError::NoSuchObject(serial)),
    };
    if building.owner != player {
        return Err(ActionError::NotOwner { serial, player });
    }
    Ok(building)
}

/// Radius a building currently sees.
pub(crate) fn building_vision(state: &WorldState, serial: Serial) -> Option<u32> {
    let building = state.objects.building(serial)?;
    if building.is_construction_site() {
        return Some(CONSTRUCTION_SITE_VISION);
    }
    let descr = state
        .tribes
        .get(building.tribe)
        .and_then(|t| t.building(building.descr))?;
    Some(descr.vision_range)
}

fn inner_nodes(nodes: &[Coords]) -> &[Coords] {
    match nodes.len() {
        0..=2 => &[],
        n => &nodes[1..n - 1],
    }
}
