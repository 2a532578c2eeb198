//! Game start: running each player's chosen initialization.

use crate::coords::PlayerNumber;
use crate::error::{GameDataError, StartError};
use crate::state::{Notification, WorldState};
use tracing::instrument;

/// Request the initialization scripts that set up `player`'s starting
/// infrastructure: one at the player's own starting position and one per
/// further starting position shared in to them.
///
/// Either every script is requested or, on error, none is.
#[instrument(skip(state))]
pub fn create_default_infrastructure(
    state: &mut WorldState,
    player: PlayerNumber,
) -> Result<(), StartError> {
    let p = state
        .players
        .get(player)
        .ok_or(StartError::NoSuchPlayer(player))?;
    let start = state
        .map
        .starting_pos(player)
        .ok_or(StartError::MissingStartingPosition(player))?;
    let tribe = state
        .tribes
        .get(p.tribe)
        .ok_or_else(|| GameDataError::UnknownTribe(format!("#{}", p.tribe)))?;

    let script = |index: u8| {
        tribe
            .initialization(index)
            .map(|init| init.script.clone())
            .ok_or(GameDataError::UnknownInitialization { index })
    };

    let mut requests = vec![Notification::RunScript {
        player,
        script: script(p.initialization_index)?,
        position: Some(start),
    }];
    for shared in &p.shared_starts {
        let position = state
            .map
            .starting_pos(shared.position_of)
            .ok_or(StartError::MissingStartingPosition(shared.position_of))?;
        requests.push(Notification::RunScript {
            player,
            script: script(shared.initialization_index)?,
            position: Some(position),
        });
    }

    log::info!(
        "Player {}: requesting {} initialization script(s)",
        player,
        requests.len()
    );
    state.notifications.extend(requests);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Coords;
    use crate::player::SharedStart;
    use crate::testing::WorldStateBuilder;

    #[test]
    fn test_missing_starting_position_is_fatal() {
        let mut state = WorldStateBuilder::new().with_player(1, 0).build();
        let err = create_default_infrastructure(&mut state, 1).unwrap_err();
        assert_eq!(err, StartError::MissingStartingPosition(1));
        assert_eq!(err.key(), "start.missing_starting_position");
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn test_runs_chosen_initialization() {
        let mut state = WorldStateBuilder::new()
            .with_player(1, 0)
            .with_starting_pos(1, Coords::new(4, 4))
            .build();
        state.players.get_mut(1).unwrap().initialization_index = 1;
        create_default_infrastructure(&mut state, 1).unwrap();
        assert_eq!(
            state.notifications,
            vec![Notification::RunScript {
                player: 1,
                script: "tribes/barbarians/scripting/village.lua".to_string(),
                position: Some(Coords::new(4, 4)),
            }]
        );
    }

    #[test]
    fn test_bad_initialization_index() {
        let mut state = WorldStateBuilder::new()
            .with_player(1, 0)
            .with_starting_pos(1, Coords::new(4, 4))
            .build();
        state.players.get_mut(1).unwrap().initialization_index = 9;
        assert_eq!(
            create_default_infrastructure(&mut state, 1),
            Err(StartError::Data(GameDataError::UnknownInitialization {
                index: 9
            }))
        );
        assert!(state.notifications.is_empty());
    }

    #[test]
    fn test_shared_in_starts() {
        let mut state = WorldStateBuilder::new()
            .with_player(1, 0)
            .with_player(2, 0)
            .with_starting_pos(1, Coords::new(4, 4))
            .with_starting_pos(2, Coords::new(12, 12))
            .build();
        state.players.get_mut(1).unwrap().shared_starts = vec![SharedStart {
            position_of: 2,
            initialization_index: 1,
        }];
        create_default_infrastructure(&mut state, 1).unwrap();
        assert_eq!(state.notifications.len(), 2);
        assert_eq!(
            state.notifications[1],
            Notification::RunScript {
                player: 1,
                script: "tribes/barbarians/scripting/village.lua".to_string(),
                position: Some(Coords::new(12, 12)),
            }
        );
    }
}
