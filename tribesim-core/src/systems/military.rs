//! Soldiers: garrisons, training priorities and attacks.
//!
//! An attack is dispatched at once but resolved later: each attacker walks
//! to the target and a scheduled arrival command fights one duel per
//! arrival. Soldiers out attacking are not part of any garrison.

use crate::config::SimConfig;
use crate::coords::{Coords, Duration, PlayerNumber, Serial};
use crate::immovable::{Immovable, TrainingAttribute};
use crate::map::Map;
use crate::messages::Message;
use crate::player::clamp_retreat;
use crate::queue::Scheduled;
use crate::state::WorldState;
use crate::step::ActionError;
use crate::systems::{buildings, messaging, placement};
use crate::tribe::{BuildingKind, WorkerIndex};
use crate::worker::{SoldierLevels, Worker, WorkerState};
use game_pathfinding::{Flood, Graph};
use std::collections::BTreeSet;
use tracing::instrument;

/// Minimum time between two "under attack" messages for nearby sites.
pub const UNDER_ATTACK_TIMEOUT: Duration = 60 * 1000;
/// Sites within this distance share one "under attack" message.
pub const UNDER_ATTACK_RADIUS: u32 = 5;

/// Fields a soldier can walk on, ignoring ownership.
struct WalkGraph<'a> {
    map: &'a Map,
}

impl Graph<Coords, ()> for WalkGraph<'_> {
    fn neighbors(&self, node: Coords, _context: &()) -> Vec<Coords> {
        self.map
            .neighbours(node)
            .into_iter()
            .filter(|&n| self.map.field(n).caps.can_walk())
            .collect()
    }

    fn cost(&self, _from: Coords, _to: Coords, _context: &()) -> u32 {
        1
    }

    fn heuristic(&self, from: Coords, target: Coords, _context: &()) -> u32 {
        self.map.calc_distance(from, target)
    }
}

/// Index of the tribe's soldier worker type.
fn soldier_index(state: &WorldState, player: PlayerNumber) -> Option<WorkerIndex> {
    let tribe = state.tribe_of(player)?;
    (0..tribe.nr_workers() as WorkerIndex)
        .find(|&i| tribe.worker(i).is_some_and(|w| w.is_soldier))
}

/// Kind of a finished building owned by `player`.
fn finished_kind(
    state: &WorldState,
    player: PlayerNumber,
    building: Serial,
) -> Result<&BuildingKind, ActionError> {
    let b = placement::owned_building(state, player, building)?;
    if b.is_construction_site() {
        return Err(ActionError::WrongBuildingKind(building));
    }
    state
        .tribes
        .get(b.tribe)
        .and_then(|t| t.building(b.descr))
        .map(|d| &d.kind)
        .ok_or(ActionError::UnknownBuildingType(b.descr))
}

fn min_garrison(state: &WorldState, building: Serial) -> Option<u32> {
    let b = state.objects.building(building)?;
    if b.is_construction_site() {
        return None;
    }
    let descr = state.tribes.get(b.tribe)?.building(b.descr)?;
    descr.is_military().then(|| descr.min_soldiers())
}

/// Soldiers `player` could send against `flag`.
///
/// Own finished military sites reachable on foot within `radius` are
/// visited in search discovery order; each contributes whatever it has
/// beyond its minimum garrison until `wanted` is met.
#[instrument(skip(state))]
pub fn find_attack_soldiers(
    state: &WorldState,
    player: PlayerNumber,
    flag: Serial,
    wanted: u32,
    radius: u32,
) -> Vec<Serial> {
    let mut soldiers = Vec::new();
    let Some(start) = state.objects.flag(flag).map(|f| f.position) else {
        return soldiers;
    };
    let graph = WalkGraph { map: &state.map };
    let mut wanted = wanted as usize;
    let mut visited = BTreeSet::new();

    for c in Flood::reachable_within(&graph, start, radius, &()) {
        if wanted == 0 {
            break;
        }
        let Some(imm) = state.map.field(c).immovable else {
            continue;
        };
        if !visited.insert(imm.serial) {
            continue;
        }
        let Some(site) = state.objects.building(imm.serial) else {
            continue;
        };
        if site.owner != player {
            continue;
        }
        let Some(staying) = min_garrison(state, imm.serial) else {
            continue;
        };
        let present = site.soldiers.len();
        let spare = present.saturating_sub(staying as usize);
        let taken = wanted.min(spare);
        soldiers.extend_from_slice(&site.soldiers[..taken]);
        wanted -= taken;
    }
    soldiers
}

/// Launch an attack on the building at an enemy flag. Returns the number
/// of soldiers sent.
#[instrument(skip(state, config))]
pub fn enemy_flag_action(
    state: &mut WorldState,
    player: PlayerNumber,
    flag: Serial,
    count: u32,
    retreat: u8,
    config: &SimConfig,
) -> Result<usize, ActionError> {
    if count == 0 {
        return Err(ActionError::NoSoldiersRequested);
    }
    let attacker_tribe = state
        .tribe_of(player)
        .ok_or(ActionError::NoSuchPlayer(player))?;
    let limits = attacker_tribe.military();
    let target_flag = match state.objects.immovable(flag) {
        Some(Immovable::Flag(f)) => f,
        Some(_) => return Err(ActionError::NotAFlag(flag)),
        None => return Err(ActionError::NoSuchObject(flag)),
    };
    let defender = target_flag.owner;
    if !state.is_hostile(player, defender) {
        return Err(ActionError::NotHostile {
            attacker: player,
            defender,
        });
    }
    let target = target_flag
        .building
        .filter(|&b| min_garrison(state, b).is_some())
        .ok_or(ActionError::NotAttackable(flag))?;
    let target_pos = state
        .objects
        .building(target)
        .map(|b| b.position)
        .ok_or(ActionError::NotAttackable(flag))?;

    let retreat = clamp_retreat(retreat, limits);
    let attackers =
        find_attack_soldiers(state, player, flag, count, config.attack_search_radius);
    for &soldier in &attackers {
        let Some(origin) = state.objects.worker(soldier).and_then(|w| w.location) else {
            continue;
        };
        let Some(site) = state.objects.building_mut(origin) else {
            continue;
        };
        site.soldiers.retain(|&s| s != soldier);
        let origin_pos = site.position;
        if let Some(worker) = state.objects.worker_mut(soldier) {
            worker.location = None;
            worker.state = WorkerState::Attacking {
                target,
                origin,
                retreat,
            };
        }
        let steps = state.map.calc_distance(origin_pos, target_pos).max(1);
        state.queue.schedule(
            state.gametime + steps * config.attack_step_ms,
            Scheduled::AttackArrival { soldier },
        );
    }
    log::info!(
        "Player {} attacks building {} of player {} with {} of {} soldiers",
        player,
        target,
        defender,
        attackers.len(),
        count
    );
    Ok(attackers.len())
}

/// An attacker reached its target: fight one defender.
#[instrument(skip(state, config))]
pub fn resolve_attack_arrival(state: &mut WorldState, soldier: Serial, config: &SimConfig) {
    let Some(attacker) = state.objects.worker(soldier) else {
        return;
    };
    let WorkerState::Attacking { target, origin, .. } = attacker.state else {
        return;
    };
    let attacker_owner = attacker.owner;
    let attacker_strength = attacker.strength();

    let Some(site) = state.objects.building(target) else {
        let near = state
            .objects
            .building(origin)
            .map(|b| b.position)
            .or_else(|| state.map.starting_pos(attacker_owner))
            .unwrap_or_default();
        return_home(state, soldier, origin, near);
        return;
    };
    let defender_owner = site.owner;
    let site_pos = site.position;
    if !state.is_hostile(attacker_owner, defender_owner) {
        return_home(state, soldier, origin, site_pos);
        return;
    }

    let message = Message::new(
        "under_attack",
        state.gametime,
        None,
        "You are under attack",
        "One of your military buildings is under attack!",
        site_pos,
    );
    messaging::add_message_with_timeout(
        state,
        defender_owner,
        message,
        UNDER_ATTACK_TIMEOUT,
        UNDER_ATTACK_RADIUS,
        config,
    );

    let defender = state
        .objects
        .building(target)
        .and_then(|b| b.soldiers.first().copied());
    if let Some(defender) = defender {
        let defender_strength = state.objects.worker(defender).map_or(0, Worker::strength);
        if attacker_strength <= defender_strength {
            log::debug!("Soldier {} lost against {}", soldier, defender);
            state.objects.remove_worker(soldier);
            count_duel(state, defender_owner, attacker_owner);
            return;
        }
        log::debug!("Soldier {} defeated {}", soldier, defender);
        if let Some(b) = state.objects.building_mut(target) {
            b.soldiers.retain(|&s| s != defender);
        }
        state.objects.remove_worker(defender);
        count_duel(state, attacker_owner, defender_owner);
    }

    let defenders_left = state
        .objects
        .building(target)
        .is_some_and(|b| !b.soldiers.is_empty());
    if defenders_left {
        state.queue.schedule(
            state.gametime + config.attack_step_ms,
            Scheduled::AttackArrival { soldier },
        );
        return;
    }

    log::info!(
        "Player {} defeated military site {} of player {} at {}",
        attacker_owner,
        target,
        defender_owner,
        site_pos
    );
    placement::destroy_building(state, target);
    if let Some(p) = state.players.get_mut(attacker_owner) {
        p.msites_defeated += 1;
    }
    if let Some(p) = state.players.get_mut(defender_owner) {
        p.msites_lost += 1;
    }
    return_home(state, soldier, origin, site_pos);
}

fn count_duel(state: &mut WorldState, winner: PlayerNumber, loser: PlayerNumber) {
    if let Some(p) = state.players.get_mut(winner) {
        p.kills += 1;
    }
    if let Some(p) = state.players.get_mut(loser) {
        p.casualties += 1;
    }
}

/// Send a surviving attacker back into its origin site, or into stock at
/// the warehouse nearest to `near` if the site is gone or full.
fn return_home(state: &mut WorldState, soldier: Serial, origin: Serial, near: Coords) {
    let Some(owner) = state.objects.worker(soldier).map(|w| w.owner) else {
        return;
    };
    let home = state
        .objects
        .building_mut(origin)
        .filter(|b| b.owner == owner && (b.soldiers.len() as u32) < b.soldier_capacity);
    let Some(b) = home else {
        buildings::release_worker(state, soldier, near);
        return;
    };
    b.soldiers.push(soldier);
    if let Some(worker) = state.objects.worker_mut(soldier) {
        worker.location = Some(origin);
        worker.state = WorkerState::Working;
    }
}

/// Create soldiers with the given levels inside `building`, up to its
/// capacity. Returns the new soldiers.
pub fn station_soldiers(
    state: &mut WorldState,
    building: Serial,
    levels: &[SoldierLevels],
) -> Vec<Serial> {
    let Some((owner, capacity, present)) = state
        .objects
        .building(building)
        .map(|b| (b.owner, b.soldier_capacity, b.soldiers.len()))
    else {
        return Vec::new();
    };
    let Some(descr) = soldier_index(state, owner) else {
        log::error!("Tribe of player {} has no soldiers. Report bug!", owner);
        return Vec::new();
    };
    let room = (capacity as usize).saturating_sub(present);
    let mut created = Vec::new();
    for &l in levels.iter().take(room) {
        let serial = state
            .objects
            .insert_worker(Worker::new_soldier(owner, descr, l, Some(building)));
        created.push(serial);
    }
    if let Some(b) = state.objects.building_mut(building) {
        b.soldiers.extend_from_slice(&created);
    }
    created
}

/// Adjust a training site's priority for one attribute.
pub fn change_training_options(
    state: &mut WorldState,
    player: PlayerNumber,
    site: Serial,
    attribute: TrainingAttribute,
    delta: i32,
) -> Result<(), ActionError> {
    if !matches!(
        finished_kind(state, player, site)?,
        BuildingKind::TrainingSite { .. }
    ) {
        return Err(ActionError::WrongBuildingKind(site));
    }
    if let Some(b) = state.objects.building_mut(site) {
        let priority = b.training_priorities.entry(attribute).or_insert(0);
        *priority = priority.saturating_add(delta);
    }
    Ok(())
}

fn soldier_building(
    state: &WorldState,
    player: PlayerNumber,
    building: Serial,
) -> Result<(), ActionError> {
    match finished_kind(state, player, building)? {
        BuildingKind::Military { .. } | BuildingKind::TrainingSite { .. } => Ok(()),
        _ => Err(ActionError::WrongBuildingKind(building)),
    }
}

/// Release soldiers from a building back into stock.
fn release(state: &mut WorldState, building: Serial, soldiers: &[Serial]) {
    let position = state
        .objects
        .building(building)
        .map_or_else(Coords::default, |b| b.position);
    for &soldier in soldiers {
        buildings::release_worker(state, soldier, position);
    }
}

/// Send one soldier out of a military or training site.
pub fn drop_soldier(
    state: &mut WorldState,
    player: PlayerNumber,
    building: Serial,
    soldier: Serial,
) -> Result<(), ActionError> {
    soldier_building(state, player, building)?;
    let present = state
        .objects
        .building(building)
        .is_some_and(|b| b.soldiers.contains(&soldier))
        && state.objects.worker(soldier).is_some_and(Worker::is_soldier);
    if !present {
        return Err(ActionError::SoldierNotPresent { building, soldier });
    }
    if let Some(b) = state.objects.building_mut(building) {
        b.soldiers.retain(|&s| s != soldier);
    }
    release(state, building, &[soldier]);
    Ok(())
}

/// Set how many soldiers a site holds, clamped to `[1, max_soldiers]`.
/// Surplus soldiers leave, most recently stationed first.
pub fn set_soldier_capacity(
    state: &mut WorldState,
    player: PlayerNumber,
    building: Serial,
    capacity: u32,
) -> Result<(), ActionError> {
    soldier_building(state, player, building)?;
    let max = state
        .objects
        .building(building)
        .and_then(|b| state.tribes.get(b.tribe)?.building(b.descr))
        .map_or(1, |d| d.max_soldiers().max(1));
    let capacity = capacity.clamp(1, max);
    let Some(b) = state.objects.building_mut(building) else {
        return Ok(());
    };
    b.soldier_capacity = capacity;
    let surplus = if b.soldiers.len() > capacity as usize {
        b.soldiers.split_off(capacity as usize)
    } else {
        Vec::new()
    };
    release(state, building, &surplus);
    Ok(())
}

pub fn set_retreat_percentage(
    state: &mut WorldState,
    player: PlayerNumber,
    percentage: u8,
) -> Result<(), ActionError> {
    let limits = state
        .tribe_of(player)
        .ok_or(ActionError::NoSuchPlayer(player))?
        .military();
    let p = state
        .players
        .get_mut(player)
        .ok_or(ActionError::NoSuchPlayer(player))?;
    if !p.allow_retreat_change {
        return Err(ActionError::RetreatChangeNotAllowed(player));
    }
    p.set_retreat_percentage(percentage, limits);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::WorldStateBuilder;

    const SENTRY: u16 = 3;
    const BARRIER: u16 = 4;
    const TOWER: u16 = 5;
    const LUMBERJACK: u16 = 1;
    const TRAININGCAMP: u16 = 8;
    const WAREHOUSE: u16 = 9;

    fn levels(total: u8) -> SoldierLevels {
        SoldierLevels {
            attack: total,
            ..SoldierLevels::default()
        }
    }

    fn site(state: &mut WorldState, player: PlayerNumber, c: Coords, kind: u16) -> Serial {
        placement::force_building(state, player, c, kind, false, &SimConfig::default()).unwrap()
    }

    /// Three players without teams on an empty 32x32 map.
    fn battlefield() -> WorldState {
        WorldStateBuilder::new()
            .map_size(32, 32)
            .with_player(1, 0)
            .with_player(2, 0)
            .with_player(3, 0)
            .build()
    }

    fn enemy_sentry(state: &mut WorldState, defenders: &[SoldierLevels]) -> (Serial, Serial) {
        let sentry = site(state, 2, Coords::new(20, 10), SENTRY);
        station_soldiers(state, sentry, defenders);
        let flag = state.objects.building(sentry).unwrap().flag;
        (sentry, flag)
    }

    #[test]
    fn test_find_attack_soldiers_respects_garrison() {
        let mut state = battlefield();
        let barrier = site(&mut state, 1, Coords::new(10, 10), BARRIER);
        let tower = site(&mut state, 1, Coords::new(10, 14), TOWER);
        let a = station_soldiers(&mut state, barrier, &[levels(0); 6]);
        station_soldiers(&mut state, tower, &[levels(0); 3]);
        let (_, flag) = enemy_sentry(&mut state, &[levels(0)]);

        let found = find_attack_soldiers(&state, 1, flag, 5, 25);
        assert_eq!(found.len(), 4);
        assert_eq!(found, a[..4].to_vec());

        // Fewer wanted than available.
        assert_eq!(find_attack_soldiers(&state, 1, flag, 2, 25).len(), 2);
        // Out of reach.
        assert!(find_attack_soldiers(&state, 1, flag, 5, 3).is_empty());
    }

    #[test]
    fn test_attack_validation() {
        let mut state = battlefield();
        let config = SimConfig::default();
        let (_, flag) = enemy_sentry(&mut state, &[levels(0)]);
        assert_eq!(
            enemy_flag_action(&mut state, 1, flag, 0, 50, &config),
            Err(ActionError::NoSoldiersRequested)
        );
        assert_eq!(
            enemy_flag_action(&mut state, 2, flag, 3, 50, &config),
            Err(ActionError::NotHostile {
                attacker: 2,
                defender: 2
            })
        );
        state.players.set_team_number(1, 1);
        state.players.set_team_number(2, 1);
        assert!(matches!(
            enemy_flag_action(&mut state, 1, flag, 3, 50, &config),
            Err(ActionError::NotHostile { .. })
        ));
        state.players.set_team_number(1, 0);

        let hut = site(&mut state, 3, Coords::new(20, 24), LUMBERJACK);
        let hut_flag = state.objects.building(hut).unwrap().flag;
        assert_eq!(
            enemy_flag_action(&mut state, 1, hut_flag, 3, 50, &config),
            Err(ActionError::NotAttackable(hut_flag))
        );
    }

    #[test]
    fn test_attack_dispatch_clamps_retreat() {
        let mut state = battlefield();
        let config = SimConfig::default();
        let barrier = site(&mut state, 1, Coords::new(12, 10), BARRIER);
        let soldiers = station_soldiers(&mut state, barrier, &[levels(0); 4]);
        let (sentry, flag) = enemy_sentry(&mut state, &[levels(0)]);

        assert_eq!(enemy_flag_action(&mut state, 1, flag, 10, 95, &config), Ok(2));
        assert_eq!(state.objects.building(barrier).unwrap().soldiers.len(), 2);
        let sent = state.objects.worker(soldiers[0]).unwrap();
        assert_eq!(
            sent.state,
            WorkerState::Attacking {
                target: sentry,
                origin: barrier,
                retreat: 70
            }
        );
        assert_eq!(sent.location, None);
        assert!(state
            .queue
            .iter()
            .any(|(_, c)| *c == Scheduled::AttackArrival { soldier: soldiers[0] }));
    }

    #[test]
    fn test_strong_attacker_conquers_weak_site() {
        let mut state = battlefield();
        let config = SimConfig::default();
        let barrier = site(&mut state, 1, Coords::new(12, 10), BARRIER);
        let soldiers = station_soldiers(&mut state, barrier, &[levels(5), levels(5), levels(5)]);
        let (sentry, flag) = enemy_sentry(&mut state, &[levels(1)]);

        enemy_flag_action(&mut state, 1, flag, 1, 50, &config).unwrap();
        resolve_attack_arrival(&mut state, soldiers[0], &config);

        assert!(!state.objects.exists(sentry));
        let attacker = state.players.get(1).unwrap();
        let defender = state.players.get(2).unwrap();
        assert_eq!((attacker.kills, attacker.msites_defeated), (1, 1));
        assert_eq!((defender.casualties, defender.msites_lost), (1, 1));
        // The survivor is back home.
        assert!(state.objects.building(barrier).unwrap().soldiers.contains(&soldiers[0]));
        assert_eq!(
            state.objects.worker(soldiers[0]).unwrap().state,
            WorkerState::Working
        );
        // The defender was told, once.
        let warnings = defender
            .messages
            .iter()
            .filter(|(_, m)| m.sender == "under_attack")
            .count();
        assert_eq!(warnings, 1);
    }

    #[test]
    fn test_tie_goes_to_defender() {
        let mut state = battlefield();
        let config = SimConfig::default();
        let barrier = site(&mut state, 1, Coords::new(12, 10), BARRIER);
        let soldiers = station_soldiers(&mut state, barrier, &[levels(2); 3]);
        let (sentry, flag) = enemy_sentry(&mut state, &[levels(2)]);

        enemy_flag_action(&mut state, 1, flag, 1, 50, &config).unwrap();
        resolve_attack_arrival(&mut state, soldiers[0], &config);

        assert!(state.objects.exists(sentry));
        assert!(state.objects.worker(soldiers[0]).is_none());
        assert_eq!(state.players.get(1).unwrap().casualties, 1);
        assert_eq!(state.players.get(2).unwrap().kills, 1);
    }

    #[test]
    fn test_attacker_keeps_fighting_remaining_defenders() {
        let mut state = battlefield();
        let config = SimConfig::default();
        let barrier = site(&mut state, 1, Coords::new(12, 10), BARRIER);
        let soldiers = station_soldiers(&mut state, barrier, &[levels(9); 3]);
        let (sentry, flag) = enemy_sentry(&mut state, &[levels(0), levels(0)]);

        enemy_flag_action(&mut state, 1, flag, 1, 50, &config).unwrap();
        resolve_attack_arrival(&mut state, soldiers[0], &config);
        assert_eq!(state.objects.building(sentry).unwrap().soldiers.len(), 1);
        state.gametime += config.attack_step_ms;
        crate::step::run_scheduled(&mut state, &config);
        assert!(!state.objects.exists(sentry));
    }

    #[test]
    fn test_attacker_without_home_goes_to_stock() {
        let mut state = battlefield();
        let config = SimConfig::default();
        let warehouse = site(&mut state, 1, Coords::new(6, 10), WAREHOUSE);
        let barrier = site(&mut state, 1, Coords::new(12, 10), BARRIER);
        let soldiers = station_soldiers(&mut state, barrier, &[levels(5); 3]);
        let (sentry, flag) = enemy_sentry(&mut state, &[levels(0)]);

        enemy_flag_action(&mut state, 1, flag, 1, 50, &config).unwrap();
        placement::destroy_building(&mut state, barrier);
        resolve_attack_arrival(&mut state, soldiers[0], &config);

        assert!(!state.objects.exists(sentry));
        let attacker = state.objects.worker(soldiers[0]).unwrap();
        assert_eq!(attacker.location, Some(warehouse));
        assert_eq!(attacker.state, WorkerState::Stored);
        // The garrison left behind went into stock as well.
        assert_eq!(state.objects.building(warehouse).unwrap().workers.len(), 3);
    }

    #[test]
    fn test_soldier_capacity_and_drop() {
        let mut state = battlefield();
        let warehouse = site(&mut state, 1, Coords::new(6, 10), WAREHOUSE);
        let barrier = site(&mut state, 1, Coords::new(12, 10), BARRIER);
        let soldiers = station_soldiers(&mut state, barrier, &[levels(0); 5]);

        set_soldier_capacity(&mut state, 1, barrier, 0).unwrap();
        let b = state.objects.building(barrier).unwrap();
        assert_eq!(b.soldier_capacity, 1);
        assert_eq!(b.soldiers, vec![soldiers[0]]);
        let released = state.objects.worker(soldiers[4]).unwrap();
        assert_eq!(released.state, WorkerState::Stored);
        assert_eq!(released.location, Some(warehouse));
        assert_eq!(
            state.objects.building(warehouse).unwrap().workers,
            soldiers[1..].to_vec()
        );

        set_soldier_capacity(&mut state, 1, barrier, 100).unwrap();
        assert_eq!(state.objects.building(barrier).unwrap().soldier_capacity, 8);

        drop_soldier(&mut state, 1, barrier, soldiers[0]).unwrap();
        assert!(state.objects.building(barrier).unwrap().soldiers.is_empty());
        assert_eq!(
            state.objects.worker(soldiers[0]).unwrap().location,
            Some(warehouse)
        );
        assert_eq!(
            drop_soldier(&mut state, 1, barrier, soldiers[0]),
            Err(ActionError::SoldierNotPresent {
                building: barrier,
                soldier: soldiers[0]
            })
        );
        assert!(matches!(
            set_soldier_capacity(&mut state, 2, barrier, 3),
            Err(ActionError::NotOwner { .. })
        ));
    }

    #[test]
    fn test_training_priorities() {
        let mut state = battlefield();
        let camp = site(&mut state, 1, Coords::new(12, 10), TRAININGCAMP);
        change_training_options(&mut state, 1, camp, TrainingAttribute::Attack, 2).unwrap();
        change_training_options(&mut state, 1, camp, TrainingAttribute::Attack, -5).unwrap();
        let b = state.objects.building(camp).unwrap();
        assert_eq!(b.training_priority(TrainingAttribute::Attack), -3);
        assert_eq!(b.training_priority(TrainingAttribute::Evade), 0);

        let barrier = site(&mut state, 1, Coords::new(4, 20), BARRIER);
        assert_eq!(
            change_training_options(&mut state, 1, barrier, TrainingAttribute::Health, 1),
            Err(ActionError::WrongBuildingKind(barrier))
        );
    }

    #[test]
    fn test_retreat_change_gate() {
        let mut state = battlefield();
        assert_eq!(
            set_retreat_percentage(&mut state, 1, 60),
            Err(ActionError::RetreatChangeNotAllowed(1))
        );
        state.players.get_mut(1).unwrap().allow_retreat_change = true;
        set_retreat_percentage(&mut state, 1, 99).unwrap();
        assert_eq!(state.players.get(1).unwrap().retreat_percentage(), 70);
        set_retreat_percentage(&mut state, 1, 5).unwrap();
        assert_eq!(state.players.get(1).unwrap().retreat_percentage(), 20);
    }
}
