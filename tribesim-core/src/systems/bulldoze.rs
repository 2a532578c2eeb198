//! Demolishing a player's own immovables.
//!
//! With `recurse` set, demolition spreads to flags that become dead ends.
//! Work items are kept on an explicit stack and re-resolved by serial
//! before use, since earlier steps may already have removed them.

use crate::coords::{PlayerNumber, Serial};
use crate::immovable::Immovable;
use crate::state::WorldState;
use crate::step::ActionError;
use crate::systems::placement;
use tracing::instrument;

#[instrument(skip(state))]
pub fn bulldoze(
    state: &mut WorldState,
    player: PlayerNumber,
    target: Serial,
    recurse: bool,
) -> Result<(), ActionError> {
    let imm = state
        .objects
        .immovable(target)
        .ok_or(ActionError::NoSuchObject(target))?;
    if imm.owner() != player {
        return Err(ActionError::NotOwner {
            serial: target,
            player,
        });
    }
    if let Some(building) = blocking_building(state, target) {
        return Err(ActionError::NotDestructible(building));
    }

    let mut worklist = vec![target];
    while let Some(serial) = worklist.pop() {
        let Some(imm) = state.objects.immovable(serial) else {
            continue;
        };
        if imm.owner() != player {
            return Ok(());
        }
        match imm {
            Immovable::Building(building) => {
                if !is_destructible(state, serial) {
                    return Ok(());
                }
                let flag = building.flag;
                placement::destroy_building(state, serial);
                if recurse && state.objects.is_dead_end(flag) {
                    worklist.push(flag);
                }
            }
            Immovable::Flag(_) => {
                if let Some(building) = blocking_building(state, serial) {
                    log::warn!(
                        "Player trying to rip flag ({}) with undestroyable building ({})",
                        serial,
                        building
                    );
                    return Ok(());
                }
                if recurse {
                    bulldoze_roads_at(state, serial, &mut worklist);
                }
                if state.objects.exists(serial) {
                    placement::destroy_flag(state, serial);
                }
            }
            Immovable::Road(road) => {
                let (start, end) = (road.start, road.end);
                placement::destroy_road(state, serial);
                if recurse {
                    // Every road between the two flags goes, not just this one.
                    while let Some(parallel) = state.objects.road_between(start, end) {
                        placement::destroy_road(state, parallel);
                    }
                    if state.objects.is_dead_end(start) {
                        worklist.push(start);
                    }
                    if state.objects.is_dead_end(end) {
                        worklist.push(end);
                    }
                }
            }
        }
    }
    Ok(())
}

/// Destroy every road at `flag`, queueing far ends that became dead ends.
fn bulldoze_roads_at(state: &mut WorldState, flag: Serial, worklist: &mut Vec<Serial>) {
    for dir in crate::coords::Direction::ALL.iter().rev() {
        let Some(f) = state.objects.flag(flag) else {
            return;
        };
        let Some(road) = f.road(*dir) else {
            continue;
        };
        let Some(other) = state.objects.road(road).map(|r| r.other_flag(flag)) else {
            continue;
        };
        log::debug!(
            "Destroying road from {} going in dir {}",
            f.position,
            dir.index()
        );
        placement::destroy_road(state, road);
        if state.objects.is_dead_end(other) {
            worklist.push(other);
        }
    }
}

fn is_destructible(state: &WorldState, building: Serial) -> bool {
    let Some(b) = state.objects.building(building) else {
        return false;
    };
    if b.is_construction_site() {
        return true;
    }
    state
        .tribes
        .get(b.tribe)
        .and_then(|t| t.building(b.descr))
        .is_some_and(|d| d.destructible)
}

/// The building that keeps `serial` from being bulldozed, if any: the
/// target itself or the building on the target flag.
fn blocking_building(state: &WorldState, serial: Serial) -> Option<Serial> {
    let building = match state.objects.immovable(serial)? {
        Immovable::Building(_) => serial,
        Immovable::Flag(flag) => flag.building?,
        Immovable::Road(_) => return None,
    };
    (!is_destructible(state, building)).then_some(building)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::coords::{Coords, Direction};
    use crate::path::Path;
    use crate::testing::WorldStateBuilder;

    const HEADQUARTERS: u16 = 0;
    const LUMBERJACK: u16 = 1;

    fn setup() -> WorldState {
        WorldStateBuilder::new()
            .with_player(1, 0)
            .with_player(2, 0)
            .with_territory(1, Coords::new(8, 8), 6)
            .build()
    }

    fn road(state: &mut WorldState, from: Coords, steps: usize) -> Serial {
        let path = Path::from_steps(&state.map, from, &vec![Direction::East; steps]);
        placement::build_road(state, 1, &path).unwrap()
    }

    #[test]
    fn test_headquarters_cannot_be_bulldozed() {
        let mut state = setup();
        let hq = placement::force_building(
            &mut state,
            1,
            Coords::new(8, 8),
            HEADQUARTERS,
            false,
            &SimConfig::default(),
        )
        .unwrap();
        let flag = state.objects.building(hq).unwrap().flag;
        let before = state.clone();

        assert_eq!(
            bulldoze(&mut state, 1, hq, false),
            Err(ActionError::NotDestructible(hq))
        );
        assert_eq!(
            bulldoze(&mut state, 1, flag, true),
            Err(ActionError::NotDestructible(hq))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_foreign_objects_are_rejected() {
        let mut state = setup();
        let flag = placement::build_flag(&mut state, 1, Coords::new(8, 8)).unwrap();
        assert_eq!(
            bulldoze(&mut state, 2, flag, false),
            Err(ActionError::NotOwner {
                serial: flag,
                player: 2
            })
        );
        assert_eq!(
            bulldoze(&mut state, 1, 9999, false),
            Err(ActionError::NoSuchObject(9999))
        );
        assert!(state.objects.exists(flag));
    }

    #[test]
    fn test_bulldoze_flag_takes_building_and_roads() {
        let mut state = setup();
        let hut = placement::build(
            &mut state,
            1,
            Coords::new(6, 8),
            LUMBERJACK,
            true,
            &SimConfig::default(),
        )
        .unwrap();
        let flag = state.objects.building(hut).unwrap().flag;
        let flag_pos = state.objects.flag(flag).unwrap().position;
        placement::build_flag(&mut state, 1, Coords::new(flag_pos.x + 3, flag_pos.y)).unwrap();
        let r = road(&mut state, flag_pos, 3);

        bulldoze(&mut state, 1, flag, false).unwrap();
        assert!(!state.objects.exists(flag));
        assert!(!state.objects.exists(hut));
        assert!(!state.objects.exists(r));
        assert!(state.map.field(Coords::new(6, 8)).immovable.is_none());
        assert_eq!(state.players.get(1).unwrap().census.total(), 0);
    }

    #[test]
    fn test_recursive_bulldoze_removes_dead_ends() {
        let mut state = setup();
        // a -- b -- c, with a second branch b -- d.
        let a = placement::build_flag(&mut state, 1, Coords::new(4, 8)).unwrap();
        let b = placement::build_flag(&mut state, 1, Coords::new(7, 8)).unwrap();
        let c = placement::build_flag(&mut state, 1, Coords::new(10, 8)).unwrap();
        let d = placement::build_flag(&mut state, 1, Coords::new(7, 11)).unwrap();
        let ab = road(&mut state, Coords::new(4, 8), 3);
        let bc = road(&mut state, Coords::new(7, 8), 3);
        let planned =
            placement::plan_road(&state, 1, Coords::new(7, 8), Coords::new(7, 11)).unwrap();
        let bd = placement::build_road(&mut state, 1, &planned).unwrap();

        bulldoze(&mut state, 1, ab, true).unwrap();
        // `a` became a dead end and went; `b` still joins c and d.
        assert!(!state.objects.exists(ab));
        assert!(!state.objects.exists(a));
        assert!(state.objects.exists(b));
        assert!(state.objects.exists(bc));
        assert!(state.objects.exists(bd));

        bulldoze(&mut state, 1, bc, true).unwrap();
        // Now b, c and d form a dead-end chain and all go.
        for serial in [b, c, d, bc, bd] {
            assert!(!state.objects.exists(serial), "{} survived", serial);
        }
    }

    #[test]
    fn test_non_recursive_road_keeps_flags() {
        let mut state = setup();
        let a = placement::build_flag(&mut state, 1, Coords::new(4, 8)).unwrap();
        let b = placement::build_flag(&mut state, 1, Coords::new(7, 8)).unwrap();
        let ab = road(&mut state, Coords::new(4, 8), 3);

        bulldoze(&mut state, 1, ab, false).unwrap();
        assert!(state.objects.exists(a));
        assert!(state.objects.exists(b));
        assert_eq!(state.objects.flag(a).unwrap().road(Direction::East), None);
        assert!(!state.map.field(Coords::new(5, 8)).has_road());
    }

    #[test]
    fn test_recursive_building_removes_lonely_flag() {
        let mut state = setup();
        let hut = placement::build(
            &mut state,
            1,
            Coords::new(8, 8),
            LUMBERJACK,
            true,
            &SimConfig::default(),
        )
        .unwrap();
        let flag = state.objects.building(hut).unwrap().flag;
        bulldoze(&mut state, 1, hut, true).unwrap();
        assert!(!state.objects.exists(hut));
        assert!(!state.objects.exists(flag));
    }
}
