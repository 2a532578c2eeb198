use crate::config::SimConfig;
use crate::coords::{Coords, PlayerNumber, Serial};
use crate::input::{Command, PlayerInputs};
use crate::messages::MessageId;
use crate::queue::Scheduled;
use crate::state::WorldState;
use crate::systems::{buildings, bulldoze, construction, messaging, military, placement};
use crate::tribe::{BuildingIndex, WareIndex};
use thiserror::Error;
use tracing::instrument;

/// An intent that is illegal in the current state. The command is a no-op.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Player {0} does not exist")]
    NoSuchPlayer(PlayerNumber),
    #[error("Object {0} does not exist")]
    NoSuchObject(Serial),
    #[error("Object {serial} is not owned by player {player}")]
    NotOwner { serial: Serial, player: PlayerNumber },
    #[error("Object {0} is not a flag")]
    NotAFlag(Serial),
    #[error("Object {0} is not a building")]
    NotABuilding(Serial),
    #[error("Building {0} does not support this action")]
    WrongBuildingKind(Serial),
    #[error("Player {player} may not place a flag at {at}")]
    NoFlagRights { at: Coords, player: PlayerNumber },
    #[error("Unknown building type {0}")]
    UnknownBuildingType(BuildingIndex),
    #[error("Building type {0} cannot be placed by players")]
    NotBuildable(BuildingIndex),
    #[error("Building type {0} is not allowed for this player")]
    BuildingNotAllowed(BuildingIndex),
    #[error("Field {0} is too small for the building")]
    InsufficientCaps(Coords),
    #[error("Building road: missed start flag at {0}")]
    MissingStartFlag(Coords),
    #[error("Building road: missed end flag at {0}")]
    MissingEndFlag(Coords),
    #[error("Building road: immovable in the way at {0}")]
    RoadBlocked(Coords),
    #[error("Building road: unwalkable at {0}")]
    Unwalkable(Coords),
    #[error("Road path is too short or crosses itself")]
    BadPath,
    #[error("No road path from {from} to {to}")]
    NoPath { from: Coords, to: Coords },
    #[error("Building {0} may not be bulldozed")]
    NotDestructible(Serial),
    #[error("Building type {to} is not an enhancement of {from}")]
    NotAnEnhancement {
        from: BuildingIndex,
        to: BuildingIndex,
    },
    #[error("Tribe has no {0} worker")]
    UnknownWorkerType(String),
    #[error("Unknown ware {0}")]
    UnknownWare(WareIndex),
    #[error("Player {0} may not change the retreat percentage")]
    RetreatChangeNotAllowed(PlayerNumber),
    #[error("Attack requested with zero soldiers")]
    NoSoldiersRequested,
    #[error("Player {attacker} is not hostile to player {defender}")]
    NotHostile {
        attacker: PlayerNumber,
        defender: PlayerNumber,
    },
    #[error("Flag {0} has no attackable building")]
    NotAttackable(Serial),
    #[error("Soldier {soldier} is not stationed in building {building}")]
    SoldierNotPresent { building: Serial, soldier: Serial },
    #[error("Message {0} does not exist")]
    NoSuchMessage(MessageId),
}

/// Advance the world by one tick.
///
/// Inputs are applied in order, then every scheduled follow-up that is due
/// runs in `(time, insertion)` order. Rejected commands are logged and
/// skipped.
#[instrument(skip_all, fields(tick = state.tick + 1))]
pub fn step_world(state: &WorldState, inputs: &[PlayerInputs], config: &SimConfig) -> WorldState {
    let mut new_state = state.clone();
    new_state.notifications.clear();

    // 1. Advance time
    new_state.tick += 1;
    new_state.gametime = new_state.gametime.saturating_add(config.tick_ms);

    // 2. Process inputs
    for player_input in inputs {
        if new_state.players.get(player_input.player).is_none() {
            log::warn!(
                "Ignoring {} commands from unknown player {}",
                player_input.commands.len(),
                player_input.player
            );
            continue;
        }
        for cmd in &player_input.commands {
            if let Err(e) = execute_command(&mut new_state, player_input.player, cmd, config) {
                log::warn!(
                    "Failed to execute command for player {}: {}",
                    player_input.player,
                    e
                );
            }
        }
    }

    // 3. Scheduled follow-ups
    run_scheduled(&mut new_state, config);

    // 4. Statistics
    if config.statistics_interval > 0 && new_state.tick % config.statistics_interval == 0 {
        sample_statistics(&mut new_state, config.statistics_retention);
    }

    new_state
}

pub fn execute_command(
    state: &mut WorldState,
    player: PlayerNumber,
    cmd: &Command,
    config: &SimConfig,
) -> Result<(), ActionError> {
    match cmd {
        Command::BuildFlag { at } => placement::build_flag(state, player, *at).map(drop),
        Command::BuildRoad { path } => placement::build_road(state, player, path).map(drop),
        Command::BuildBuilding {
            at,
            building,
            construction_site,
        } => placement::build(state, player, *at, *building, *construction_site, config).map(drop),
        Command::Bulldoze { target, recurse } => {
            bulldoze::bulldoze(state, player, *target, *recurse)
        }
        Command::EnhanceBuilding { building, to } => {
            placement::enhance_building(state, player, *building, *to, config).map(drop)
        }
        Command::StartStopBuilding { building } => {
            buildings::start_stop_building(state, player, *building)
        }
        Command::FlagAction { flag } => buildings::flag_action(state, player, *flag),
        Command::ChangeTrainingPriority {
            site,
            attribute,
            delta,
        } => military::change_training_options(state, player, *site, *attribute, *delta),
        Command::DropSoldier { building, soldier } => {
            military::drop_soldier(state, player, *building, *soldier)
        }
        Command::SetSoldierCapacity { building, capacity } => {
            military::set_soldier_capacity(state, player, *building, *capacity)
        }
        Command::SetRetreatPercentage { percentage } => {
            military::set_retreat_percentage(state, player, *percentage)
        }
        Command::AttackFlag {
            flag,
            count,
            retreat,
        } => military::enemy_flag_action(state, player, *flag, *count, *retreat, config).map(drop),
        Command::ChangeStockPolicy {
            warehouse,
            item,
            policy,
        } => buildings::change_stock_policy(state, player, *warehouse, *item, *policy),
        Command::SetMessageStatus { message, status } => {
            messaging::set_message_status(state, player, *message, *status)
        }
        Command::Quit => {
            log::info!("Player {} requested to quit", player);
            state.quit_requested = true;
            Ok(())
        }
    }
}

/// Run every scheduled command that is due.
pub fn run_scheduled(state: &mut WorldState, config: &SimConfig) {
    while let Some((due, command)) = state.queue.pop_due(state.gametime) {
        log::trace!("Running {:?} scheduled for {}", command, due);
        match command {
            Scheduled::ConstructionStep { building } => {
                construction::advance(state, building, config)
            }
            Scheduled::ProductionCycle { building } => {
                buildings::production_cycle(state, building, config)
            }
            Scheduled::AttackArrival { soldier } => {
                military::resolve_attack_arrival(state, soldier, config)
            }
            Scheduled::MessageExpiry { player, message } => {
                messaging::expire_message(state, player, message)
            }
        }
    }
}

/// Flush every player's ware counters into their statistics series.
pub fn sample_statistics(state: &mut WorldState, retention: Option<usize>) {
    for number in state.players.numbers() {
        if let Some(player) = state.players.get_mut(number) {
            player.ware_stats.sample(retention);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Coords;
    use crate::input::Command;
    use crate::testing::WorldStateBuilder;

    fn setup() -> WorldState {
        WorldStateBuilder::new()
            .with_player(1, 0)
            .with_player(2, 0)
            .with_territory(1, Coords::new(5, 5), 4)
            .build()
    }

    #[test]
    fn test_step_advances_time() {
        let state = setup();
        let config = SimConfig::default();
        let next = step_world(&state, &[], &config);
        assert_eq!(next.tick, 1);
        assert_eq!(next.gametime, config.tick_ms);
        // The input state is untouched.
        assert_eq!(state.tick, 0);
    }

    #[test]
    fn test_rejected_command_is_a_no_op() {
        let state = setup();
        let config = SimConfig::default();
        // Player 2 owns nothing around here.
        let inputs = vec![PlayerInputs {
            player: 2,
            commands: vec![Command::BuildFlag {
                at: Coords::new(5, 5),
            }],
        }];
        let next = step_world(&state, &inputs, &config);
        assert!(next.map.field(Coords::new(5, 5)).immovable.is_none());
        assert_eq!(next.objects, state.objects);
    }

    #[test]
    fn test_build_flag_command() {
        let state = setup();
        let config = SimConfig::default();
        let inputs = vec![PlayerInputs {
            player: 1,
            commands: vec![Command::BuildFlag {
                at: Coords::new(5, 5),
            }],
        }];
        let next = step_world(&state, &inputs, &config);
        assert!(next.map.field(Coords::new(5, 5)).has_flag());
    }

    #[test]
    fn test_statistics_sampled_on_interval() {
        let mut state = setup();
        let config = SimConfig {
            statistics_interval: 2,
            ..SimConfig::default()
        };
        for _ in 0..4 {
            state = step_world(&state, &[], &config);
        }
        assert_eq!(state.players.get(1).unwrap().ware_stats.nr_samples(), 2);
    }

    #[test]
    fn test_identical_runs_are_identical() {
        let config = SimConfig::default();
        let inputs = vec![PlayerInputs {
            player: 1,
            commands: vec![
                Command::BuildBuilding {
                    at: Coords::new(5, 5),
                    building: 3,
                    construction_site: true,
                },
                Command::BuildFlag {
                    at: Coords::new(3, 3),
                },
            ],
        }];

        let run = || {
            let mut state = setup();
            state = step_world(&state, &inputs, &config);
            for _ in 0..40 {
                state = step_world(&state, &[], &config);
            }
            state
        };
        let a = run();
        let b = run();
        assert_eq!(a.checksum(), b.checksum());
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_quit() {
        let state = setup();
        let next = step_world(
            &state,
            &[PlayerInputs {
                player: 1,
                commands: vec![Command::Quit],
            }],
            &SimConfig::default(),
        );
        assert!(next.quit_requested);
    }
}
