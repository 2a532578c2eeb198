//! Generic graph search for grid-based games.
//!
//! Both searches are deterministic: for a given graph and context they
//! always return the same result, because ties are broken by the order in
//! which [`Graph::neighbors`] yields nodes and never by hash order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// A trait for graphs that can be searched.
///
/// `Node`: The type of node identifiers (e.g., a map coordinate).
/// `Ctx`: A context object passed to cost calculations (e.g., the world and
/// the player whose movement rules apply).
pub trait Graph<Node, Ctx> {
    /// Return the neighbors of a node that may be entered from it.
    fn neighbors(&self, node: Node, context: &Ctx) -> Vec<Node>;

    /// Calculate the cost to move from `from` to `to`.
    fn cost(&self, from: Node, to: Node, context: &Ctx) -> u32;

    /// Calculate the estimated cost (heuristic) from `from` to `target`.
    /// For A*, this must be admissible (never overestimate).
    fn heuristic(&self, from: Node, target: Node, context: &Ctx) -> u32;
}

/// A generic A* pathfinder.
pub struct AStar;

impl AStar {
    /// Find the shortest path from `start` to `goal`.
    ///
    /// Returns the nodes including both ends, and the total cost. Among
    /// equally cheap candidates the one pushed first is expanded first.
    pub fn find_path<Node, Ctx, G>(
        graph: &G,
        start: Node,
        goal: Node,
        context: &Ctx,
    ) -> Option<(Vec<Node>, u32)>
    where
        Node: Copy + Eq + Hash + std::fmt::Debug,
        G: Graph<Node, Ctx>,
    {
        let mut open_set = BinaryHeap::new();
        let mut came_from: HashMap<Node, Node> = HashMap::new();
        let mut g_score: HashMap<Node, u32> = HashMap::new();
        let mut closed_set: HashSet<Node> = HashSet::new();
        let mut seq = 0u64;

        g_score.insert(start, 0);
        open_set.push(State {
            node: start,
            cost: 0,
            priority: graph.heuristic(start, goal, context),
            seq,
        });

        while let Some(State { node: current, .. }) = open_set.pop() {
            // Skip if already processed with a better path
            if !closed_set.insert(current) {
                continue;
            }

            if current == goal {
                let mut path = vec![current];
                let mut curr = current;
                while let Some(&prev) = came_from.get(&curr) {
                    path.push(prev);
                    curr = prev;
                }
                path.reverse();
                return Some((path, g_score[&goal]));
            }

            let current_g = g_score[&current];

            for neighbor in graph.neighbors(current, context) {
                if closed_set.contains(&neighbor) {
                    continue;
                }

                let tentative_g = current_g.saturating_add(graph.cost(current, neighbor, context));

                if tentative_g < *g_score.get(&neighbor).unwrap_or(&u32::MAX) {
                    came_from.insert(neighbor, current);
                    g_score.insert(neighbor, tentative_g);
                    seq += 1;
                    open_set.push(State {
                        node: neighbor,
                        cost: tentative_g,
                        priority: tentative_g.saturating_add(graph.heuristic(
                            neighbor, goal, context,
                        )),
                        seq,
                    });
                }
            }
        }

        None
    }
}

/// Breadth-first flood fill bounded by step count.
pub struct Flood;

impl Flood {
    /// Every node reachable from `start` in at most `max_steps` moves, in
    /// discovery order (`start` first). Costs and heuristics are ignored.
    pub fn reachable_within<Node, Ctx, G>(
        graph: &G,
        start: Node,
        max_steps: u32,
        context: &Ctx,
    ) -> Vec<Node>
    where
        Node: Copy + Eq + Hash,
        G: Graph<Node, Ctx>,
    {
        let mut visited: HashSet<Node> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        visited.insert(start);
        queue.push_back((start, 0u32));
        while let Some((node, steps)) = queue.pop_front() {
            order.push(node);
            if steps == max_steps {
                continue;
            }
            for neighbor in graph.neighbors(node, context) {
                if visited.insert(neighbor) {
                    queue.push_back((neighbor, steps + 1));
                }
            }
        }
        order
    }
}

/// Helper struct for the priority queue.
#[derive(Copy, Clone, Eq, PartialEq)]
struct State<Node> {
    node: Node,
    cost: u32,     // Actual cost from start (g_score)
    priority: u32, // Estimated total cost (f_score = g + h)
    seq: u64,      // Push order, breaks remaining ties
}

// The priority queue depends on `Ord`.
// Explicitly implement the trait so the queue becomes a min-heap.
impl<Node: Eq> Ord for State<Node> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.cost.cmp(&other.cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<Node: Eq> PartialOrd for State<Node> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Simple grid graph for testing
    // 0 1 2
    // 3 4 5
    // 6 7 8
    struct GridGraph;

    impl Graph<u32, ()> for GridGraph {
        fn neighbors(&self, node: u32, _context: &()) -> Vec<u32> {
            let mut n = Vec::new();
            let x = node % 3;
            let y = node / 3;

            if x > 0 {
                n.push(node - 1);
            } // Left
            if x < 2 {
                n.push(node + 1);
            } // Right
            if y > 0 {
                n.push(node - 3);
            } // Up
            if y < 2 {
                n.push(node + 3);
            } // Down
            n
        }

        fn cost(&self, _from: u32, _to: u32, _context: &()) -> u32 {
            1
        }

        fn heuristic(&self, from: u32, target: u32, _context: &()) -> u32 {
            // Manhattan distance
            let x1 = (from % 3) as i32;
            let y1 = (from / 3) as i32;
            let x2 = (target % 3) as i32;
            let y2 = (target / 3) as i32;
            ((x1 - x2).abs() + (y1 - y2).abs()) as u32
        }
    }

    /// Grid with the middle node blocked.
    struct Walled;

    impl Graph<u32, ()> for Walled {
        fn neighbors(&self, node: u32, context: &()) -> Vec<u32> {
            GridGraph
                .neighbors(node, context)
                .into_iter()
                .filter(|&n| n != 4)
                .collect()
        }

        fn cost(&self, _from: u32, _to: u32, _context: &()) -> u32 {
            1
        }

        fn heuristic(&self, from: u32, target: u32, context: &()) -> u32 {
            GridGraph.heuristic(from, target, context)
        }
    }

    #[test]
    fn test_grid_pathfinding() {
        let (path, cost) = AStar::find_path(&GridGraph, 0, 8, &()).unwrap();
        assert_eq!(cost, 4);
        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&8));
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn test_paths_are_reproducible() {
        let first = AStar::find_path(&GridGraph, 0, 8, &());
        for _ in 0..10 {
            assert_eq!(AStar::find_path(&GridGraph, 0, 8, &()), first);
        }
    }

    #[test]
    fn test_routes_around_walls() {
        let (path, cost) = AStar::find_path(&Walled, 3, 5, &()).unwrap();
        assert_eq!(cost, 4);
        assert!(!path.contains(&4));
        assert!(AStar::find_path(&Walled, 0, 4, &()).is_none());
    }

    struct WeightedGraph; // 0 -> 1 (cost 10), 0 -> 2 (cost 1), 2 -> 1 (cost 1)

    impl Graph<u32, ()> for WeightedGraph {
        fn neighbors(&self, node: u32, _context: &()) -> Vec<u32> {
            match node {
                0 => vec![1, 2],
                2 => vec![1],
                _ => vec![],
            }
        }

        fn cost(&self, from: u32, to: u32, _context: &()) -> u32 {
            match (from, to) {
                (0, 1) => 10,
                _ => 1,
            }
        }

        fn heuristic(&self, _from: u32, _target: u32, _context: &()) -> u32 {
            0
        }
    }

    #[test]
    fn test_weighted_pathfinding() {
        let (path, cost) = AStar::find_path(&WeightedGraph, 0, 1, &()).unwrap();
        assert_eq!(cost, 2);
        assert_eq!(path, vec![0, 2, 1]);
    }

    #[test]
    fn test_flood_discovery_order() {
        let order = Flood::reachable_within(&GridGraph, 0, 1, &());
        assert_eq!(order, vec![0, 1, 3]);

        let order = Flood::reachable_within(&GridGraph, 0, 2, &());
        assert_eq!(order, vec![0, 1, 3, 2, 4, 6]);

        let all = Flood::reachable_within(&Walled, 0, 10, &());
        assert_eq!(all.len(), 8);
        assert!(!all.contains(&4));
    }
}
