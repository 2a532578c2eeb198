//! Construction sites and what happens when a building is finished.

use crate::config::SimConfig;
use crate::coords::{Duration, Serial};
use crate::immovable::BuildingState;
use crate::messages::Message;
use crate::queue::Scheduled;
use crate::state::WorldState;
use crate::systems::{messaging, placement, territory};
use tracing::instrument;

/// How long a "site occupied" message stays in the inbox.
pub const SITE_OCCUPIED_DURATION: Duration = 10 * 60 * 1000;

/// One construction step. Stale entries for vanished or finished sites are
/// ignored.
pub fn advance(state: &mut WorldState, building: Serial, config: &SimConfig) {
    let Some(b) = state.objects.building_mut(building) else {
        return;
    };
    let BuildingState::ConstructionSite { progress, previous } = b.state else {
        return;
    };
    let progress = progress
        .saturating_add(config.construction_step_percent.max(1))
        .min(100);
    b.state = BuildingState::ConstructionSite { progress, previous };
    if progress < 100 {
        state.queue.schedule(
            state.gametime + config.construction_step_ms,
            Scheduled::ConstructionStep { building },
        );
        return;
    }
    finish(state, building, config);
}

/// Turn a construction site into the finished building.
#[instrument(skip(state, config))]
pub fn finish(state: &mut WorldState, building: Serial, config: &SimConfig) {
    let Some(b) = state.objects.building_mut(building) else {
        return;
    };
    if !b.is_construction_site() {
        return;
    }
    b.state = BuildingState::Finished;
    let (owner, descr, position) = (b.owner, b.descr, b.position);

    if let Some(player) = state.players.get_mut(owner) {
        match player.census.remove(descr, position) {
            Ok(()) => player.census.add(descr, position, false),
            Err(e) => log::error!("Player {}: {} Report bug!", owner, e),
        }
    }
    if let Some(radius) = placement::building_vision(state, building) {
        state.see_area(owner, position, radius);
    }
    state.unsee_area(owner, position, placement::CONSTRUCTION_SITE_VISION);
    log::info!(
        "Player {} finished building {} (type {}) at {}",
        owner,
        building,
        descr,
        position
    );
    on_finished(state, building, config);
}

/// Effects of a building coming into service: military sites claim land,
/// production sites start working.
pub(crate) fn on_finished(state: &mut WorldState, building: Serial, config: &SimConfig) {
    let Some(b) = state.objects.building(building) else {
        return;
    };
    let (owner, position) = (b.owner, b.position);
    let Some(descr) = state.tribes.get(b.tribe).and_then(|t| t.building(b.descr)) else {
        return;
    };
    let conquers = descr.is_military().then(|| descr.conquers());
    let produces = !descr.outputs.is_empty();
    let name = descr.name.clone();

    if let Some(radius) = conquers {
        territory::conquer_area(state, owner, position, radius);
        let message = Message::new(
            "site_occupied",
            state.gametime,
            Some(SITE_OCCUPIED_DURATION),
            "Military site occupied",
            format!("Your soldiers occupied your {}.", name),
            position,
        );
        messaging::add_message(state, owner, message, false, config);
    }
    if produces {
        state.queue.schedule(
            state.gametime + config.production_cycle_ms,
            Scheduled::ProductionCycle { building },
        );
    }
}
