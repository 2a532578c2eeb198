//! User-facing errors.
//!
//! Illegal intents are reported through [`crate::step::ActionError`] and
//! never abort anything. The errors here are the ones a UI has to show in a
//! dialog: broken game data and games that cannot start. Each carries a
//! stable message key plus parameters so the collaborator can localize it.

use crate::coords::PlayerNumber;
use thiserror::Error;

/// Configuration or data error. Aborts only the triggering operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameDataError {
    #[error(
        "the selected initialization index ({index}) is outside the range \
         (tribe edited between preload and game start?)"
    )]
    UnknownInitialization { index: u8 },
    #[error("Unsupported statistics version {0}")]
    UnsupportedStatisticsVersion(u32),
    #[error("Unknown tribe {0:?}")]
    UnknownTribe(String),
    #[error("Corrupt statistics data: {0}")]
    CorruptStatistics(String),
}

impl GameDataError {
    pub fn key(&self) -> &'static str {
        match self {
            Self::UnknownInitialization { .. } => "game_data.unknown_initialization",
            Self::UnsupportedStatisticsVersion(_) => "game_data.statistics_version",
            Self::UnknownTribe(_) => "game_data.unknown_tribe",
            Self::CorruptStatistics(_) => "game_data.corrupt_statistics",
        }
    }

    pub fn params(&self) -> Vec<String> {
        match self {
            Self::UnknownInitialization { index } => vec![index.to_string()],
            Self::UnsupportedStatisticsVersion(version) => vec![version.to_string()],
            Self::UnknownTribe(name) => vec![name.clone()],
            Self::CorruptStatistics(detail) => vec![detail.clone()],
        }
    }
}

/// A precondition for starting the game is missing. Fatal to game start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error(
        "The game could not start, because player {0} has no starting position. \
         Add a starting position in the editor to fix this problem."
    )]
    MissingStartingPosition(PlayerNumber),
    #[error("Player {0} does not exist")]
    NoSuchPlayer(PlayerNumber),
    #[error(transparent)]
    Data(#[from] GameDataError),
}

impl StartError {
    pub fn key(&self) -> &'static str {
        match self {
            Self::MissingStartingPosition(_) => "start.missing_starting_position",
            Self::NoSuchPlayer(_) => "start.no_such_player",
            Self::Data(inner) => inner.key(),
        }
    }

    pub fn params(&self) -> Vec<String> {
        match self {
            Self::MissingStartingPosition(p) | Self::NoSuchPlayer(p) => vec![p.to_string()],
            Self::Data(inner) => inner.params(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_and_params() {
        let err = StartError::MissingStartingPosition(3);
        assert_eq!(err.key(), "start.missing_starting_position");
        assert_eq!(err.params(), vec!["3".to_string()]);
        assert!(err.to_string().contains("player 3"));

        let err: StartError = GameDataError::UnknownInitialization { index: 7 }.into();
        assert_eq!(err.key(), "game_data.unknown_initialization");
        assert_eq!(err.params(), vec!["7".to_string()]);
    }
}
