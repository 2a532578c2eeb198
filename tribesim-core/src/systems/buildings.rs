//! Building management: stopping production, flag jobs, warehouse policies,
//! the production cycle and returning idle workers to stock.

use crate::config::SimConfig;
use crate::coords::{Coords, PlayerNumber, Serial};
use crate::immovable::{FlagJob, Immovable, StockItem, StockPolicy};
use crate::queue::Scheduled;
use crate::state::WorldState;
use crate::step::ActionError;
use crate::systems::placement;
use crate::tribe::{BuildingKind, WareIndex};
use crate::worker::WorkerState;
use tracing::instrument;

/// Program a geologist runs when sent to a flag.
pub const GEOLOGIST_PROGRAM: &str = "expedition";

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

/// Toggle whether a production or training site works.
pub fn start_stop_building(
    state: &mut WorldState,
    player: PlayerNumber,
    building: Serial,
) -> Result<(), ActionError> {
    match finished_kind(state, player, building)? {
        BuildingKind::Production | BuildingKind::TrainingSite { .. } => {}
        _ => return Err(ActionError::WrongBuildingKind(building)),
    }
    if let Some(b) = state.objects.building_mut(building) {
        b.stopped = !b.stopped;
        log::debug!(
            "Player {} {} building {}",
            player,
            if b.stopped { "stopped" } else { "started" },
            building
        );
    }
    Ok(())
}

/// Request a geologist expedition at one of the player's flags.
pub fn flag_action(
    state: &mut WorldState,
    player: PlayerNumber,
    flag: Serial,
) -> Result<(), ActionError> {
    let owner = match state.objects.flag(flag) {
        Some(f) => f.owner,
        None if state.objects.exists(flag) => return Err(ActionError::NotAFlag(flag)),
        None => return Err(ActionError::NoSuchObject(flag)),
    };
    if owner != player {
        return Err(ActionError::NotOwner {
            serial: flag,
            player,
        });
    }
    let geologist = state
        .tribe_of(player)
        .and_then(|t| t.worker_index("geologist"))
        .ok_or_else(|| ActionError::UnknownWorkerType("geologist".to_string()))?;
    if let Some(f) = state.objects.flag_mut(flag) {
        f.jobs.push(FlagJob {
            worker: geologist,
            program: GEOLOGIST_PROGRAM.to_string(),
        });
    }
    Ok(())
}

/// Set how a warehouse treats a ware or worker type.
pub fn change_stock_policy(
    state: &mut WorldState,
    player: PlayerNumber,
    warehouse: Serial,
    item: StockItem,
    policy: StockPolicy,
) -> Result<(), ActionError> {
    if !matches!(
        finished_kind(state, player, warehouse)?,
        BuildingKind::Warehouse
    ) {
        return Err(ActionError::WrongBuildingKind(warehouse));
    }
    let tribe = state
        .tribe_of(player)
        .ok_or(ActionError::NoSuchPlayer(player))?;
    match item {
        StockItem::Ware(ware) if tribe.ware(ware).is_none() => {
            return Err(ActionError::UnknownWare(ware));
        }
        StockItem::Worker(worker) if tribe.worker(worker).is_none() => {
            return Err(ActionError::UnknownWorkerType(format!("#{}", worker)));
        }
        _ => {}
    }
    if let Some(b) = state.objects.building_mut(warehouse) {
        b.set_stock_policy(item, policy);
    }
    Ok(())
}

/// Count a produced ware and put it on the building's flag if there is room.
pub fn produce_ware(state: &mut WorldState, building: Serial, ware: WareIndex) {
    let Some((owner, flag)) = state.objects.building(building).map(|b| (b.owner, b.flag)) else {
        return;
    };
    if let Some(player) = state.players.get_mut(owner) {
        if !player.ware_stats.ware_produced(ware) {
            log::error!("Player {} produced unknown ware {}. Report bug!", owner, ware);
            return;
        }
    }
    if let Some(f) = state.objects.flag_mut(flag) {
        if f.has_capacity() {
            f.wares.push(ware);
        }
    }
}

/// The owner's finished warehouse closest to `from`. Ties go to the lower
/// serial.
pub fn nearest_warehouse(state: &WorldState, owner: PlayerNumber, from: Coords) -> Option<Serial> {
    state
        .objects
        .immovables()
        .filter_map(|(serial, imm)| match imm {
            Immovable::Building(b) if b.owner == owner && !b.is_construction_site() => {
                Some((serial, b))
            }
            _ => None,
        })
        .filter(|(_, b)| {
            state
                .tribes
                .get(b.tribe)
                .and_then(|t| t.building(b.descr))
                .is_some_and(|d| d.kind == BuildingKind::Warehouse)
        })
        .min_by_key(|(serial, b)| (state.map.calc_distance(from, b.position), *serial))
        .map(|(serial, _)| serial)
}

/// Put a worker that lost its workplace into stock at the nearest
/// warehouse. Without a warehouse the worker is gone.
pub(crate) fn release_worker(state: &mut WorldState, worker: Serial, from: Coords) {
    let Some(owner) = state.objects.worker(worker).map(|w| w.owner) else {
        return;
    };
    let Some(warehouse) = nearest_warehouse(state, owner, from) else {
        log::debug!("Player {} has no warehouse for worker {}", owner, worker);
        state.objects.remove_worker(worker);
        return;
    };
    if let Some(b) = state.objects.building_mut(warehouse) {
        b.workers.push(worker);
    }
    if let Some(w) = state.objects.worker_mut(worker) {
        w.location = Some(warehouse);
        w.state = WorkerState::Stored;
    }
}

/// One work cycle of a production site. Reschedules itself while the
/// building exists.
#[instrument(skip(state, config))]
pub fn production_cycle(state: &mut WorldState, building: Serial, config: &SimConfig) {
    let Some(b) = state.objects.building(building) else {
        return;
    };
    if !b.stopped {
        let outputs: Vec<WareIndex> = state
            .tribes
            .get(b.tribe)
            .and_then(|t| {
                let descr = t.building(b.descr)?;
                Some(
                    descr
                        .outputs
                        .iter()
                        .filter_map(|name| t.ware_index(name))
                        .collect(),
                )
            })
            .unwrap_or_default();
        for ware in outputs {
            produce_ware(state, building, ware);
        }
    }
    state.queue.schedule(
        state.gametime + config.production_cycle_ms,
        Scheduled::ProductionCycle { building },
    );
}
