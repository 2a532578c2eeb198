//! Map coordinates, walking directions and the scalar ids shared by every module.

use serde::{Deserialize, Serialize};

/// Game time in milliseconds since the start of the game.
pub type Time = u32;
/// A span of game time in milliseconds.
pub type Duration = u32;
/// Player number. `0` means "nobody" (unowned land, neutral objects).
pub type PlayerNumber = u8;
/// Team number. `0` means "no team".
pub type TeamNumber = u8;
/// Linear index of a field inside the map's field array.
pub type MapIndex = usize;
/// Stable identifier of any object in the world (immovables, workers).
pub type Serial = u32;

/// Highest supported player number.
pub const MAX_PLAYERS: PlayerNumber = 8;

/// A location on the map. Always normalized before it is stored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The six walking directions of the hex grid.
///
/// Numbered 1..=6 starting at north-east and going clockwise; flags index
/// their attached roads by this number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    SouthWest = 4,
    West = 5,
    NorthWest = 6,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Direction::NorthEast),
            2 => Some(Direction::East),
            3 => Some(Direction::SouthEast),
            4 => Some(Direction::SouthWest),
            5 => Some(Direction::West),
            6 => Some(Direction::NorthWest),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::NorthEast => Direction::SouthWest,
            Direction::East => Direction::West,
            Direction::SouthEast => Direction::NorthWest,
            Direction::SouthWest => Direction::NorthEast,
            Direction::West => Direction::East,
            Direction::NorthWest => Direction::SouthEast,
        }
    }
}
