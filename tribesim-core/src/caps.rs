//! Node capability bitmask.
//!
//! A field's caps say what may be placed on it: a flag, a building of a
//! given size, a mine, and whether units can walk or swim there. The raw
//! terrain caps come from the map; [`crate::map::Map`] derives the effective
//! caps from them and the immovables around, and
//! [`crate::systems::territory::get_buildcaps`] filters those again by the
//! player's territory.

use serde::{Deserialize, Serialize};

/// Size class of a building (or of the building caps of a field).
///
/// Ordered: a field with `Medium` caps can also host `Small` buildings.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum BuildSize {
    #[default]
    None,
    Small,
    Medium,
    Big,
}

/// Bitmask storage for node caps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeCaps(pub u8);

impl NodeCaps {
    pub const NONE: NodeCaps = NodeCaps(0);
    pub const WALK: NodeCaps = NodeCaps(1);
    pub const SWIM: NodeCaps = NodeCaps(2);
    pub const SMALL: NodeCaps = NodeCaps(4);
    pub const MEDIUM: NodeCaps = NodeCaps(8);
    pub const BIG: NodeCaps = NodeCaps(12);
    pub const FLAG: NodeCaps = NodeCaps(16);
    pub const MINE: NodeCaps = NodeCaps(32);

    pub const SIZE_MASK: u8 = 12;
    pub const MOVE_MASK: u8 = 3;
    /// Everything that means "a building can go here".
    pub const BUILDING_MASK: u8 = Self::SIZE_MASK | Self::MINE.0;

    /// Caps of open, flat land: walkable, flag and big building.
    pub const fn open_land() -> Self {
        NodeCaps(Self::WALK.0 | Self::FLAG.0 | Self::BIG.0)
    }

    #[inline]
    pub fn contains(self, other: NodeCaps) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: NodeCaps) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: NodeCaps) {
        self.0 &= !other.0;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether any building capability (size or mine) is present.
    #[inline]
    pub fn can_build(self) -> bool {
        self.0 & Self::BUILDING_MASK != 0
    }

    pub fn can_walk(self) -> bool {
        self.contains(Self::WALK)
    }

    pub fn size(self) -> BuildSize {
        match self.0 & Self::SIZE_MASK {
            4 => BuildSize::Small,
            8 => BuildSize::Medium,
            12 => BuildSize::Big,
            _ => BuildSize::None,
        }
    }

    /// Replace the size bits, keeping every other capability.
    pub fn with_size(self, size: BuildSize) -> Self {
        let bits = match size {
            BuildSize::None => 0,
            BuildSize::Small => Self::SMALL.0,
            BuildSize::Medium => Self::MEDIUM.0,
            BuildSize::Big => Self::BIG.0,
        };
        NodeCaps((self.0 & !Self::SIZE_MASK) | bits)
    }

    /// Drop every building capability (size and mine).
    pub fn without_building(self) -> Self {
        NodeCaps(self.0 & !Self::BUILDING_MASK)
    }
}

impl std::ops::BitOr for NodeCaps {
    type Output = NodeCaps;

    fn bitor(self, rhs: NodeCaps) -> NodeCaps {
        NodeCaps(self.0 | rhs.0)
    }
}
