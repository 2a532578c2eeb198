//! The authoritative field store.
//!
//! The map is a wrapped hex grid stored row by row. Odd rows are shifted half
//! a field to the right, which is why the vertical neighbours depend on the
//! row parity. The height must be even so that wrapping keeps the parity
//! consistent.
//!
//! Fields only hold weak references to immovables ([`FieldImmovable`]); the
//! immovables themselves live in [`crate::immovable::Objects`].

use crate::caps::{BuildSize, NodeCaps};
use crate::coords::{Coords, Direction, MapIndex, PlayerNumber, Serial, MAX_PLAYERS};
use crate::immovable::ImmovableKind;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

pub type TerrainId = u8;
pub type ResourceId = u8;

pub const ROAD_NONE: u8 = 0;
pub const ROAD_NORMAL: u8 = 1;
pub const ROAD_BUSY: u8 = 2;
pub const ROAD_MASK: u8 = 3;

/// Bit offsets of the three road edges a field stores itself.
pub const ROAD_EAST: u8 = 0;
pub const ROAD_SOUTHEAST: u8 = 2;
pub const ROAD_SOUTHWEST: u8 = 4;

/// The two triangles below-right (`r`) and below (`d`) of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Terrains {
    pub r: TerrainId,
    pub d: TerrainId,
}

/// Weak reference from a field to the immovable standing on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldImmovable {
    pub serial: Serial,
    pub kind: ImmovableKind,
    pub size: BuildSize,
}

/// One node of the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub terrains: Terrains,
    /// 2 bits per edge, see [`ROAD_EAST`], [`ROAD_SOUTHEAST`], [`ROAD_SOUTHWEST`].
    pub roads: u8,
    pub owned_by: PlayerNumber,
    pub is_border: bool,
    pub immovable: Option<FieldImmovable>,
    pub resource: ResourceId,
    pub resource_amount: u8,
    /// Caps given by the terrain alone.
    pub terrain_caps: NodeCaps,
    /// Caps after taking immovables into account.
    pub caps: NodeCaps,
}

impl Field {
    /// A field is interior to a player when it is owned and not on the border.
    pub fn is_interior(&self, player: PlayerNumber) -> bool {
        player != 0 && self.owned_by == player && !self.is_border
    }

    pub fn road(&self, shift: u8) -> u8 {
        (self.roads >> shift) & ROAD_MASK
    }

    pub fn has_flag(&self) -> bool {
        matches!(self.immovable, Some(imm) if imm.kind == ImmovableKind::Flag)
    }

    pub fn has_road(&self) -> bool {
        matches!(self.immovable, Some(imm) if imm.kind == ImmovableKind::Road)
    }

    /// Whether something of at least small size occupies the field.
    pub fn is_blocked(&self) -> bool {
        matches!(self.immovable, Some(imm) if imm.size >= BuildSize::Small)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("Map dimensions must be positive, got {width}x{height}")]
    Empty { width: i32, height: i32 },
    #[error("Map height must be even for the hex layout to wrap, got {0}")]
    OddHeight(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Map {
    width: i32,
    height: i32,
    fields: Vec<Field>,
    /// Starting position per player, index = player number - 1.
    starting_positions: Vec<Option<Coords>>,
}

impl Map {
    /// Create a map of open land.
    pub fn new(width: i32, height: i32) -> Result<Self, MapError> {
        if width <= 0 || height <= 0 {
            return Err(MapError::Empty { width, height });
        }
        if height % 2 != 0 {
            return Err(MapError::OddHeight(height));
        }
        let land = Field {
            terrain_caps: NodeCaps::open_land(),
            caps: NodeCaps::open_land(),
            ..Default::default()
        };
        let mut map = Self {
            width,
            height,
            fields: vec![land; (width * height) as usize],
            starting_positions: vec![None; MAX_PLAYERS as usize],
        };
        map.recalc_all_caps();
        Ok(map)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn max_index(&self) -> usize {
        self.fields.len()
    }

    pub fn normalize(&self, c: Coords) -> Coords {
        Coords::new(c.x.rem_euclid(self.width), c.y.rem_euclid(self.height))
    }

    pub fn index(&self, c: Coords) -> MapIndex {
        let c = self.normalize(c);
        (c.y * self.width + c.x) as MapIndex
    }

    pub fn coords_of(&self, index: MapIndex) -> Coords {
        let i = index as i32;
        Coords::new(i % self.width, i / self.width)
    }

    pub fn field(&self, c: Coords) -> &Field {
        &self.fields[self.index(c)]
    }

    pub fn field_mut(&mut self, c: Coords) -> &mut Field {
        let i = self.index(c);
        &mut self.fields[i]
    }

    pub fn starting_pos(&self, player: PlayerNumber) -> Option<Coords> {
        if player == 0 {
            return None;
        }
        self.starting_positions
            .get(player as usize - 1)
            .copied()
            .flatten()
    }

    pub fn set_starting_pos(&mut self, player: PlayerNumber, c: Option<Coords>) {
        if player == 0 || player > MAX_PLAYERS {
            return;
        }
        let c = c.map(|c| self.normalize(c));
        self.starting_positions[player as usize - 1] = c;
    }

    // ========================================================================
    // Neighbours
    // ========================================================================

    pub fn l_n(&self, c: Coords) -> Coords {
        self.normalize(Coords::new(c.x - 1, c.y))
    }

    pub fn r_n(&self, c: Coords) -> Coords {
        self.normalize(Coords::new(c.x + 1, c.y))
    }

    pub fn tl_n(&self, c: Coords) -> Coords {
        let c = self.normalize(c);
        let dx = if c.y & 1 == 1 { 0 } else { -1 };
        self.normalize(Coords::new(c.x + dx, c.y - 1))
    }

    pub fn tr_n(&self, c: Coords) -> Coords {
        let c = self.normalize(c);
        let dx = if c.y & 1 == 1 { 1 } else { 0 };
        self.normalize(Coords::new(c.x + dx, c.y - 1))
    }

    pub fn bl_n(&self, c: Coords) -> Coords {
        let c = self.normalize(c);
        let dx = if c.y & 1 == 1 { 0 } else { -1 };
        self.normalize(Coords::new(c.x + dx, c.y + 1))
    }

    pub fn br_n(&self, c: Coords) -> Coords {
        let c = self.normalize(c);
        let dx = if c.y & 1 == 1 { 1 } else { 0 };
        self.normalize(Coords::new(c.x + dx, c.y + 1))
    }

    pub fn neighbour(&self, c: Coords, dir: Direction) -> Coords {
        match dir {
            Direction::NorthEast => self.tr_n(c),
            Direction::East => self.r_n(c),
            Direction::SouthEast => self.br_n(c),
            Direction::SouthWest => self.bl_n(c),
            Direction::West => self.l_n(c),
            Direction::NorthWest => self.tl_n(c),
        }
    }

    pub fn neighbours(&self, c: Coords) -> [Coords; 6] {
        Direction::ALL.map(|dir| self.neighbour(c, dir))
    }

    /// Wrapped hex distance between two nodes.
    pub fn calc_distance(&self, a: Coords, b: Coords) -> u32 {
        let a = self.normalize(a);
        let b = self.normalize(b);
        let mut best = u32::MAX;
        for kx in -1..=1 {
            for ky in -1..=1 {
                let shifted = Coords::new(b.x + kx * self.width, b.y + ky * self.height);
                best = best.min(cube_distance(a, shifted));
            }
        }
        best
    }

    /// Every node within `radius` steps of `center`, ring by ring.
    pub fn region(&self, center: Coords, radius: u32) -> Vec<Coords> {
        let center = self.normalize(center);
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut queue = VecDeque::new();
        seen.insert(self.index(center));
        queue.push_back((center, 0u32));
        while let Some((c, dist)) = queue.pop_front() {
            out.push(c);
            if dist == radius {
                continue;
            }
            for n in self.neighbours(c) {
                if seen.insert(self.index(n)) {
                    queue.push_back((n, dist + 1));
                }
            }
        }
        out
    }

    // ========================================================================
    // Roads
    // ========================================================================

    /// Where the road bits for the edge leaving `c` in `dir` are stored.
    fn road_slot(&self, c: Coords, dir: Direction) -> (Coords, u8) {
        match dir {
            Direction::East => (self.normalize(c), ROAD_EAST),
            Direction::SouthEast => (self.normalize(c), ROAD_SOUTHEAST),
            Direction::SouthWest => (self.normalize(c), ROAD_SOUTHWEST),
            other => {
                let n = self.neighbour(c, other);
                let (_, shift) = self.road_slot(n, other.opposite());
                (n, shift)
            }
        }
    }

    pub fn road(&self, c: Coords, dir: Direction) -> u8 {
        let (at, shift) = self.road_slot(c, dir);
        self.field(at).road(shift)
    }

    pub fn set_road(&mut self, c: Coords, dir: Direction, value: u8) {
        let (at, shift) = self.road_slot(c, dir);
        let field = self.field_mut(at);
        field.roads &= !(ROAD_MASK << shift);
        field.roads |= (value & ROAD_MASK) << shift;
    }

    // ========================================================================
    // Terrain and caps
    // ========================================================================

    pub fn set_terrain_caps(&mut self, c: Coords, caps: NodeCaps) {
        self.field_mut(c).terrain_caps = caps;
        self.recalc_caps_around(c, 2);
    }

    pub fn set_terrains(&mut self, c: Coords, terrains: Terrains) {
        self.field_mut(c).terrains = terrains;
    }

    pub fn set_immovable(&mut self, c: Coords, immovable: Option<FieldImmovable>) {
        self.field_mut(c).immovable = immovable;
    }

    fn neighbour_has_flag(&self, c: Coords) -> bool {
        self.neighbours(c).iter().any(|&n| self.field(n).has_flag())
    }

    /// Whether a flag could be placed on `c` given the immovables around.
    fn flag_possible(&self, c: Coords) -> bool {
        let field = self.field(c);
        field.terrain_caps.contains(NodeCaps::FLAG)
            && !field.is_blocked()
            && !self.neighbour_has_flag(c)
    }

    fn compute_caps(&self, c: Coords) -> NodeCaps {
        let field = self.field(c);
        let terrain = field.terrain_caps;
        let mut caps = NodeCaps(terrain.0 & NodeCaps::MOVE_MASK);
        if field.is_blocked() {
            return caps;
        }
        if self.flag_possible(c) {
            caps.insert(NodeCaps::FLAG);
        }
        if field.has_road() || !terrain.can_build() {
            return caps;
        }

        let flag_site = self.br_n(c);
        if !(self.field(flag_site).has_flag() || self.flag_possible(flag_site)) {
            return caps;
        }
        if terrain.contains(NodeCaps::MINE) {
            caps.insert(NodeCaps::MINE);
        }
        let mut size = terrain.size();
        if size == BuildSize::Big {
            let cramped = [self.tl_n(c), self.tr_n(c), self.l_n(c)]
                .iter()
                .any(|&n| self.field(n).immovable.is_some());
            if cramped {
                size = BuildSize::Medium;
            }
        }
        caps.with_size(size)
    }

    pub fn recalc_caps(&mut self, c: Coords) {
        let caps = self.compute_caps(c);
        self.field_mut(c).caps = caps;
    }

    pub fn recalc_caps_around(&mut self, c: Coords, radius: u32) {
        for n in self.region(c, radius) {
            self.recalc_caps(n);
        }
    }

    pub fn recalc_all_caps(&mut self) {
        for i in 0..self.max_index() {
            let c = self.coords_of(i);
            self.recalc_caps(c);
        }
    }

    // ========================================================================
    // Ownership
    // ========================================================================

    pub fn set_owner(&mut self, c: Coords, player: PlayerNumber) {
        self.field_mut(c).owned_by = player;
    }

    fn compute_border(&self, c: Coords) -> bool {
        let owner = self.field(c).owned_by;
        owner != 0
            && self
                .neighbours(c)
                .iter()
                .any(|&n| self.field(n).owned_by != owner)
    }

    pub fn recalc_borders_around(&mut self, c: Coords, radius: u32) {
        for n in self.region(c, radius) {
            let border = self.compute_border(n);
            self.field_mut(n).is_border = border;
        }
    }
}

/// Hex distance on the unwrapped plane, odd rows shifted right.
fn cube_distance(a: Coords, b: Coords) -> u32 {
    let to_cube = |c: Coords| {
        let x = c.x - (c.y - (c.y & 1)) / 2;
        let z = c.y;
        (x, -x - z, z)
    };
    let (ax, ay, az) = to_cube(a);
    let (bx, by, bz) = to_cube(b);
    let d = (ax - bx).abs().max((ay - by).abs()).max((az - bz).abs());
    d as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> Map {
        Map::new(10, 10).unwrap()
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert_eq!(Map::new(10, 9), Err(MapError::OddHeight(9)));
        assert!(matches!(Map::new(0, 10), Err(MapError::Empty { .. })));
    }

    #[test]
    fn test_neighbour_parity() {
        let map = map();
        // Even row: upper neighbours are up-left shifted.
        assert_eq!(map.tl_n(Coords::new(5, 4)), Coords::new(4, 3));
        assert_eq!(map.tr_n(Coords::new(5, 4)), Coords::new(5, 3));
        assert_eq!(map.br_n(Coords::new(5, 4)), Coords::new(5, 5));
        // Odd row: shifted right.
        assert_eq!(map.tl_n(Coords::new(5, 5)), Coords::new(5, 4));
        assert_eq!(map.tr_n(Coords::new(5, 5)), Coords::new(6, 4));
        assert_eq!(map.br_n(Coords::new(5, 5)), Coords::new(6, 6));
        assert_eq!(map.bl_n(Coords::new(5, 5)), Coords::new(5, 6));
    }

    #[test]
    fn test_neighbours_are_mutual() {
        let map = map();
        for i in 0..map.max_index() {
            let c = map.coords_of(i);
            for dir in Direction::ALL {
                let n = map.neighbour(c, dir);
                assert_eq!(map.neighbour(n, dir.opposite()), c);
                assert_eq!(map.calc_distance(c, n), 1);
            }
        }
    }

    #[test]
    fn test_wrapping() {
        let map = map();
        assert_eq!(map.l_n(Coords::new(0, 0)), Coords::new(9, 0));
        assert_eq!(map.tl_n(Coords::new(0, 0)), Coords::new(9, 9));
        assert_eq!(map.calc_distance(Coords::new(0, 0), Coords::new(9, 0)), 1);
    }

    #[test]
    fn test_region_sizes() {
        let map = map();
        assert_eq!(map.region(Coords::new(5, 5), 0).len(), 1);
        assert_eq!(map.region(Coords::new(5, 5), 1).len(), 7);
        assert_eq!(map.region(Coords::new(5, 5), 2).len(), 19);
        for c in map.region(Coords::new(5, 5), 2) {
            assert!(map.calc_distance(Coords::new(5, 5), c) <= 2);
        }
    }

    #[test]
    fn test_region_wraps_without_duplicates() {
        let map = map();
        let nodes = map.region(Coords::new(0, 0), 20);
        assert_eq!(nodes.len(), map.max_index());
        let unique: FxHashSet<MapIndex> = nodes.iter().map(|&c| map.index(c)).collect();
        assert_eq!(unique.len(), map.max_index());
        // Ring order: the centre first, then its neighbours.
        assert_eq!(nodes[0], Coords::new(0, 0));
        assert!(nodes[1..7]
            .iter()
            .all(|&c| map.calc_distance(Coords::new(0, 0), c) == 1));
    }

    #[test]
    fn test_road_bits_shared_between_neighbours() {
        let mut map = map();
        let c = Coords::new(3, 3);
        map.set_road(c, Direction::West, ROAD_NORMAL);
        assert_eq!(map.road(map.l_n(c), Direction::East), ROAD_NORMAL);
        assert_eq!(map.field(map.l_n(c)).road(ROAD_EAST), ROAD_NORMAL);
        assert_eq!(map.field(c).roads, 0);
    }

    #[test]
    fn test_flag_blocks_neighbour_flags() {
        let mut map = map();
        let c = Coords::new(4, 4);
        map.set_immovable(
            c,
            Some(FieldImmovable {
                serial: 1,
                kind: ImmovableKind::Flag,
                size: BuildSize::Small,
            }),
        );
        map.recalc_caps_around(c, 2);
        assert!(map.field(c).caps.is_empty() || map.field(c).caps == NodeCaps::WALK);
        for n in map.neighbours(c) {
            assert!(!map.field(n).caps.contains(NodeCaps::FLAG));
        }
        // The field whose flag site is `c` can still host a building.
        let top_left = map.tl_n(c);
        assert!(map.field(top_left).caps.can_build());
    }

    #[test]
    fn test_borders() {
        let mut map = map();
        for c in map.region(Coords::new(5, 5), 2) {
            map.set_owner(c, 1);
        }
        map.recalc_borders_around(Coords::new(5, 5), 3);
        assert!(map.field(Coords::new(5, 5)).is_interior(1));
        assert!(!map.field(Coords::new(5, 5)).is_interior(2));
        assert!(map.field(Coords::new(7, 5)).is_border);
        assert!(!map.field(Coords::new(8, 5)).is_border);
    }
}
