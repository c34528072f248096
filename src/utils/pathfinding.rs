//! # Pathfinding Algorithms
//!
//! A* search over the 8-connected battle grid.
//!
//! Every query carries its own admissible set (usually the tiles highlighted
//! for a move) and an occupancy source. Step cost and heuristic are both
//! Euclidean; on an 8-connected grid this heuristic is admissible but not
//! strictly consistent, which is accepted.

use crate::GridCoordinate;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Source of occupancy information for path queries.
pub trait Occupancy {
    /// Whether a unit currently stands on the coordinate.
    fn is_occupied(&self, coord: GridCoordinate) -> bool;
}

impl Occupancy for HashSet<GridCoordinate> {
    fn is_occupied(&self, coord: GridCoordinate) -> bool {
        self.contains(&coord)
    }
}

/// Nothing is occupied.
impl Occupancy for () {
    fn is_occupied(&self, _coord: GridCoordinate) -> bool {
        false
    }
}

/// A* path planner.
///
/// # Examples
///
/// ```
/// use std::collections::HashSet;
/// use tactica::{GridCoordinate, PathPlanner};
///
/// let admissible: HashSet<_> = (0..5).map(|x| GridCoordinate::new(x, 0)).collect();
/// let path = PathPlanner::new()
///     .find_path(GridCoordinate::new(0, 0), GridCoordinate::new(4, 0), &admissible, &())
///     .unwrap();
/// assert_eq!(path.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPlanner;

impl PathPlanner {
    /// Creates a new path planner.
    pub fn new() -> Self {
        Self
    }

    /// Finds a path from `start` to `goal`, both inclusive.
    ///
    /// Only coordinates in `admissible` that are not occupied are expanded;
    /// `start` itself is exempt since the mover stands on it. Returns `None`
    /// when the open set runs dry before the goal is expanded.
    pub fn find_path<O>(
        &self,
        start: GridCoordinate,
        goal: GridCoordinate,
        admissible: &HashSet<GridCoordinate>,
        occupancy: &O,
    ) -> Option<Vec<GridCoordinate>>
    where
        O: Occupancy + ?Sized,
    {
        let mut open = BinaryHeap::new();
        let mut records: HashMap<GridCoordinate, NodeRecord> = HashMap::new();
        let mut closed: HashSet<GridCoordinate> = HashSet::new();
        let mut sequence = 0u64;

        records.insert(
            start,
            NodeRecord {
                g: 0.0,
                parent: None,
                sequence,
            },
        );
        open.push(OpenEntry {
            coord: start,
            f: start.euclidean_distance(goal),
            g: 0.0,
            sequence,
        });

        while let Some(entry) = open.pop() {
            let current = entry.coord;
            if closed.contains(&current) {
                continue;
            }
            let current_g = records[&current].g;
            if entry.g > current_g {
                // Superseded by a cheaper relaxation
                continue;
            }
            closed.insert(current);

            if current == goal {
                return Some(reconstruct(&records, goal));
            }

            for neighbor in current.neighbors() {
                if !admissible.contains(&neighbor)
                    || closed.contains(&neighbor)
                    || occupancy.is_occupied(neighbor)
                {
                    continue;
                }

                let tentative_g = current_g + current.euclidean_distance(neighbor);
                let entry_sequence = match records.get_mut(&neighbor) {
                    None => {
                        sequence += 1;
                        records.insert(
                            neighbor,
                            NodeRecord {
                                g: tentative_g,
                                parent: Some(current),
                                sequence,
                            },
                        );
                        sequence
                    }
                    Some(record) if tentative_g < record.g => {
                        record.g = tentative_g;
                        record.parent = Some(current);
                        record.sequence
                    }
                    Some(_) => continue,
                };

                open.push(OpenEntry {
                    coord: neighbor,
                    f: tentative_g + neighbor.euclidean_distance(goal),
                    g: tentative_g,
                    sequence: entry_sequence,
                });
            }
        }

        log::debug!("No path from {} to {}", start, goal);
        None
    }
}

#[derive(Debug, Clone, Copy)]
struct NodeRecord {
    g: f64,
    parent: Option<GridCoordinate>,
    sequence: u64,
}

/// Open-set entry ordered for min-heap behavior in `BinaryHeap`.
///
/// Lower `f` wins; equal `f` falls back to first insertion.
#[derive(Debug, Clone, Copy)]
struct OpenEntry {
    coord: GridCoordinate,
    f: f64,
    g: f64,
    sequence: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

fn reconstruct(
    records: &HashMap<GridCoordinate, NodeRecord>,
    goal: GridCoordinate,
) -> Vec<GridCoordinate> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(parent) = records.get(&current).and_then(|record| record.parent) {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}
