//! Step-wise paths across the map, as used by roads.

use crate::coords::{Coords, Direction};
use crate::map::Map;
use serde::{Deserialize, Serialize};

/// A start node plus a list of steps. The end is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path {
    start: Coords,
    end: Coords,
    steps: Vec<Direction>,
}

impl Path {
    pub fn new(map: &Map, start: Coords) -> Self {
        let start = map.normalize(start);
        Self {
            start,
            end: start,
            steps: Vec::new(),
        }
    }

    /// Build a path from a start node and a list of steps.
    pub fn from_steps(map: &Map, start: Coords, steps: &[Direction]) -> Self {
        let mut path = Self::new(map, start);
        for &dir in steps {
            path.append(map, dir);
        }
        path
    }

    /// Build a path through a list of adjacent nodes. Returns `None` if two
    /// consecutive nodes are not neighbours.
    pub fn through(map: &Map, nodes: &[Coords]) -> Option<Self> {
        let (&first, rest) = nodes.split_first()?;
        let mut path = Self::new(map, first);
        for &next in rest {
            let next = map.normalize(next);
            let dir = Direction::ALL
                .into_iter()
                .find(|&dir| map.neighbour(path.end, dir) == next)?;
            path.append(map, dir);
        }
        Some(path)
    }

    pub fn append(&mut self, map: &Map, dir: Direction) {
        self.end = map.neighbour(self.end, dir);
        self.steps.push(dir);
    }

    pub fn start(&self) -> Coords {
        self.start
    }

    pub fn end(&self) -> Coords {
        self.end
    }

    pub fn nsteps(&self) -> usize {
        self.steps.len()
    }

    pub fn steps(&self) -> &[Direction] {
        &self.steps
    }

    /// Every node of the path, start and end included.
    pub fn nodes(&self, map: &Map) -> Vec<Coords> {
        let mut c = self.start;
        let mut out = Vec::with_capacity(self.steps.len() + 1);
        out.push(c);
        for &dir in &self.steps {
            c = map.neighbour(c, dir);
            out.push(c);
        }
        out
    }

    /// The same path walked backwards.
    pub fn reversed(&self) -> Self {
        Self {
            start: self.end,
            end: self.start,
            steps: self.steps.iter().rev().map(|d| d.opposite()).collect(),
        }
    }

    /// Split the path at node `index` into `[start..=index]` and `[index..=end]`.
    pub fn split_at(&self, map: &Map, index: usize) -> (Path, Path) {
        let head = Path::from_steps(map, self.start, &self.steps[..index]);
        let tail = Path::from_steps(map, head.end, &self.steps[index..]);
        (head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_follows_steps() {
        let map = Map::new(10, 10).unwrap();
        let path = Path::from_steps(
            &map,
            Coords::new(2, 2),
            &[Direction::East, Direction::East, Direction::SouthEast],
        );
        assert_eq!(path.end(), map.br_n(Coords::new(4, 2)));
        assert_eq!(path.nodes(&map).len(), 4);
    }

    #[test]
    fn test_through_rejects_gaps() {
        let map = Map::new(10, 10).unwrap();
        assert!(Path::through(&map, &[Coords::new(1, 1), Coords::new(3, 1)]).is_none());
        let path = Path::through(&map, &[Coords::new(1, 1), Coords::new(2, 1)]).unwrap();
        assert_eq!(path.steps(), &[Direction::East]);
    }

    #[test]
    fn test_reversed_and_split() {
        let map = Map::new(10, 10).unwrap();
        let path = Path::from_steps(
            &map,
            Coords::new(2, 2),
            &[Direction::East, Direction::SouthEast, Direction::East],
        );
        let back = path.reversed();
        assert_eq!(back.start(), path.end());
        assert_eq!(back.end(), path.start());

        let (head, tail) = path.split_at(&map, 1);
        assert_eq!(head.end(), Coords::new(3, 2));
        assert_eq!(tail.start(), Coords::new(3, 2));
        assert_eq!(tail.end(), path.end());
        assert_eq!(head.nsteps() + tail.nsteps(), path.nsteps());
    }
}
