//! Per-player vision map.
//!
//! Every player owns one [`PlayerField`] per map node. The vision counter of
//! a field is `0` when the node was never seen, `1` when it is remembered
//! and `>= 2` while at least one observer sees it (each observer adds one).
//! When a node comes into view its snapshot is refreshed from the
//! authoritative map ("rediscovery"); when it drops back to `1` the time is
//! recorded so the UI can show how stale the memory is.

use crate::coords::{Coords, MapIndex, PlayerNumber, Time};
use crate::immovable::{BuildingState, Immovable, Objects};
use crate::map::{Map, Terrains, ROAD_EAST, ROAD_MASK, ROAD_SOUTHEAST, ROAD_SOUTHWEST};
use crate::tribe::{BuildingIndex, TribeDescr};
use serde::{Deserialize, Serialize};

pub type Vision = u16;

/// Number of frames of the construction-site build animation.
pub const CONSTRUCTION_FRAMES: u32 = 16;

/// What a player remembers about the object on a node.
///
/// Roads are never recorded here; they live in the road bits. Secondary
/// nodes of big buildings are left blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeenObject {
    Flag {
        owner: PlayerNumber,
    },
    Building {
        owner: PlayerNumber,
        descr: BuildingIndex,
        animation: String,
        /// Only set for construction sites.
        construction_frame: Option<u32>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerField {
    pub terrains: Terrains,
    pub roads: u8,
    pub owner: PlayerNumber,
    pub object: Option<SeenObject>,
    pub vision: Vision,
    /// When the field last went from seen to remembered.
    pub time_last_unseen: Time,
}

/// What a player currently knows about a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Unseen,
    Remembered { last_seen: Time },
    Seen,
}

/// Read-only access to the world needed for rediscovery.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    pub map: &'a Map,
    pub objects: &'a Objects,
    pub tribes: &'a [TribeDescr],
}

impl WorldView<'_> {
    /// Snapshot of the object standing on `c`, as a player would see it.
    pub fn seen_object(&self, c: Coords) -> Option<SeenObject> {
        let field_imm = self.map.field(c).immovable?;
        match self.objects.immovable(field_imm.serial)? {
            Immovable::Road(_) => None,
            Immovable::Flag(flag) => Some(SeenObject::Flag { owner: flag.owner }),
            Immovable::Building(building) => {
                if building.position != self.map.normalize(c) {
                    return None;
                }
                let (animation, construction_frame) = match building.state {
                    BuildingState::ConstructionSite { progress, .. } => (
                        "build".to_string(),
                        Some(progress as u32 * (CONSTRUCTION_FRAMES - 1) / 100),
                    ),
                    BuildingState::Finished => {
                        let descr = self
                            .tribes
                            .get(building.tribe)
                            .and_then(|t| t.building(building.descr));
                        let animation = match descr {
                            Some(d) if d.has_animation("unoccupied") => "unoccupied",
                            _ => "idle",
                        };
                        (animation.to_string(), None)
                    }
                };
                Some(SeenObject::Building {
                    owner: building.owner,
                    descr: building.descr,
                    animation,
                    construction_frame,
                })
            }
        }
    }
}

/// One player's private copy of the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisionMap {
    fields: Vec<PlayerField>,
}

impl VisionMap {
    /// Allocated once the map size is known; never resized afterwards.
    pub fn new(map: &Map) -> Self {
        Self {
            fields: vec![PlayerField::default(); map.max_index()],
        }
    }

    pub fn field(&self, index: MapIndex) -> &PlayerField {
        &self.fields[index]
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn visibility(&self, index: MapIndex) -> Visibility {
        let field = &self.fields[index];
        match field.vision {
            0 => Visibility::Unseen,
            1 => Visibility::Remembered {
                last_seen: field.time_last_unseen,
            },
            _ => Visibility::Seen,
        }
    }

    /// Add one observer to the node.
    pub fn see(&mut self, view: WorldView<'_>, index: MapIndex) {
        let mut vision = self.fields[index].vision.max(1);
        if vision == 1 {
            self.rediscover(view, index);
        }
        vision += 1;
        self.fields[index].vision = vision;
    }

    /// Remove one observer from the node.
    ///
    /// Returns `false` (and leaves the field untouched) when the node is not
    /// currently seen; that is a bookkeeping bug in the caller.
    pub fn unsee(&mut self, index: MapIndex, now: Time) -> bool {
        let field = &mut self.fields[index];
        if field.vision <= 1 {
            return false;
        }
        field.vision -= 1;
        if field.vision == 1 {
            field.time_last_unseen = now;
        }
        true
    }

    /// Whether the node is currently seen (before any update).
    pub fn is_seen(&self, index: MapIndex) -> bool {
        self.fields[index].vision > 1
    }

    fn rediscover(&mut self, view: WorldView<'_>, index: MapIndex) {
        let map = view.map;
        let c = map.coords_of(index);
        let source = map.field(c);
        let object = view.seen_object(c);
        {
            let field = &mut self.fields[index];
            field.terrains = source.terrains;
            field.roads = source.roads;
            field.owner = source.owned_by;
            field.object = object;
        }

        // Edges and triangles of the upper and left neighbours that touch
        // this node, unless the neighbour is in view itself.
        let tr = map.tr_n(c);
        let tr_source = map.field(tr);
        let tr_field = &mut self.fields[map.index(tr)];
        if tr_field.vision <= 1 {
            tr_field.terrains.d = tr_source.terrains.d;
            copy_road_edge(&mut tr_field.roads, tr_source.roads, ROAD_SOUTHWEST);
        }

        let tl = map.tl_n(c);
        let tl_source = map.field(tl);
        let tl_field = &mut self.fields[map.index(tl)];
        if tl_field.vision <= 1 {
            tl_field.terrains = tl_source.terrains;
            copy_road_edge(&mut tl_field.roads, tl_source.roads, ROAD_SOUTHEAST);
        }

        let l = map.l_n(c);
        let l_source = map.field(l);
        let l_field = &mut self.fields[map.index(l)];
        if l_field.vision <= 1 {
            l_field.terrains.r = l_source.terrains.r;
            copy_road_edge(&mut l_field.roads, l_source.roads, ROAD_EAST);
        }
    }
}

fn copy_road_edge(target: &mut u8, source: u8, shift: u8) {
    *target &= !(ROAD_MASK << shift);
    *target |= source & (ROAD_MASK << shift);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::ROAD_NORMAL;
    use proptest::prelude::*;

    fn view_parts() -> (Map, Objects, Vec<TribeDescr>) {
        (Map::new(10, 10).unwrap(), Objects::default(), Vec::new())
    }

    #[test]
    fn test_first_sight_rediscovers() {
        let (mut map, objects, tribes) = view_parts();
        let c = Coords::new(3, 3);
        map.set_owner(c, 2);
        map.set_terrains(c, Terrains { r: 7, d: 9 });
        let mut vision = VisionMap::new(&map);
        let index = map.index(c);
        assert_eq!(vision.visibility(index), Visibility::Unseen);

        let view = WorldView {
            map: &map,
            objects: &objects,
            tribes: &tribes,
        };
        vision.see(view, index);
        assert_eq!(vision.field(index).vision, 2);
        assert_eq!(vision.field(index).owner, 2);
        assert_eq!(vision.field(index).terrains, Terrains { r: 7, d: 9 });
        assert_eq!(vision.visibility(index), Visibility::Seen);
    }

    #[test]
    fn test_unsee_records_time() {
        let (map, objects, tribes) = view_parts();
        let view = WorldView {
            map: &map,
            objects: &objects,
            tribes: &tribes,
        };
        let mut vision = VisionMap::new(&map);
        vision.see(view, 5);
        vision.see(view, 5);
        assert!(vision.unsee(5, 100));
        assert_eq!(vision.visibility(5), Visibility::Seen);
        assert!(vision.unsee(5, 250));
        assert_eq!(
            vision.visibility(5),
            Visibility::Remembered { last_seen: 250 }
        );
        // Underflow is refused.
        assert!(!vision.unsee(5, 300));
        assert_eq!(vision.field(5).vision, 1);
    }

    #[test]
    fn test_remembered_snapshot_is_stale() {
        let (mut map, objects, tribes) = view_parts();
        let c = Coords::new(4, 4);
        let index = map.index(c);
        let mut vision = VisionMap::new(&map);
        vision.see(
            WorldView {
                map: &map,
                objects: &objects,
                tribes: &tribes,
            },
            index,
        );
        vision.unsee(index, 10);
        map.set_owner(c, 3);
        assert_eq!(vision.field(index).owner, 0);

        vision.see(
            WorldView {
                map: &map,
                objects: &objects,
                tribes: &tribes,
            },
            index,
        );
        assert_eq!(vision.field(index).owner, 3);
    }

    #[test]
    fn test_neighbour_edges_are_discovered() {
        let (mut map, objects, tribes) = view_parts();
        let c = Coords::new(4, 4);
        let l = map.l_n(c);
        map.set_road(l, crate::coords::Direction::East, ROAD_NORMAL);
        let mut vision = VisionMap::new(&map);
        vision.see(
            WorldView {
                map: &map,
                objects: &objects,
                tribes: &tribes,
            },
            map.index(c),
        );
        let l_field = vision.field(map.index(l));
        assert_eq!(l_field.vision, 0);
        assert_eq!((l_field.roads >> ROAD_EAST) & ROAD_MASK, ROAD_NORMAL);
    }

    proptest! {
        #[test]
        fn prop_see_unsee_balances(times in 1usize..20, index in 0usize..100) {
            let (map, objects, tribes) = view_parts();
            let view = WorldView { map: &map, objects: &objects, tribes: &tribes };
            let mut vision = VisionMap::new(&map);
            vision.see(view, index);
            vision.unsee(index, 1);
            let before = vision.field(index).vision;

            for _ in 0..times {
                vision.see(view, index);
            }
            for t in 0..times {
                prop_assert!(vision.unsee(index, t as Time));
            }
            prop_assert_eq!(vision.field(index).vision, before);
            prop_assert!(!vision.unsee(index, 0));
            prop_assert_eq!(vision.field(index).vision, 1);
        }
    }
}
