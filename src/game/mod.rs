//! # Game Module
//!
//! Core match state, grid representation, units and the turn state machine.
//!
//! This module contains the fundamental building blocks of a skirmish:
//! - The tile grid and its terrain
//! - Units, their action budgets and the occupancy registry
//! - Movement tasks advanced once per simulation tick
//! - Turn sequencing and victory detection
//! - The owning [`Match`] that exposes the request/query interface

pub mod grid;
pub mod movement;
pub mod state;
pub mod turns;
pub mod units;

pub use grid::*;
pub use movement::*;
pub use state::*;
pub use turns::*;
pub use units::*;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Integer coordinate of a tile on the battle grid.
///
/// # Examples
///
/// ```
/// use tactica::GridCoordinate;
///
/// let coord = GridCoordinate::new(4, 3);
/// assert_eq!(coord.x, 4);
/// assert_eq!(coord.y, 3);
///
/// let neighbors = coord.neighbors();
/// assert_eq!(neighbors.len(), 8); // All 8 surrounding coordinates
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct GridCoordinate {
    pub x: i32,
    pub y: i32,
}

/// Neighbour offsets in expansion order: orthogonal first, then diagonal.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

impl GridCoordinate {
    /// Creates a new coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another coordinate.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::GridCoordinate;
    ///
    /// let a = GridCoordinate::new(0, 0);
    /// let b = GridCoordinate::new(3, 4);
    /// assert_eq!(a.manhattan_distance(b), 7);
    /// ```
    pub fn manhattan_distance(self, other: GridCoordinate) -> u32 {
        (self.x - other.x).unsigned_abs() + (self.y - other.y).unsigned_abs()
    }

    /// Calculates the Euclidean distance to another coordinate.
    pub fn euclidean_distance(self, other: GridCoordinate) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// Returns the 8 surrounding coordinates in expansion order.
    pub fn neighbors(self) -> [GridCoordinate; 8] {
        NEIGHBOR_OFFSETS.map(|(dx, dy)| GridCoordinate::new(self.x + dx, self.y + dy))
    }

    /// Returns only the 4 orthogonal neighbours.
    pub fn orthogonal_neighbors(self) -> [GridCoordinate; 4] {
        [
            GridCoordinate::new(self.x + 1, self.y),
            GridCoordinate::new(self.x - 1, self.y),
            GridCoordinate::new(self.x, self.y + 1),
            GridCoordinate::new(self.x, self.y - 1),
        ]
    }

    /// Whether `other` is one of the 8 surrounding coordinates.
    pub fn is_adjacent(self, other: GridCoordinate) -> bool {
        self != other && (self.x - other.x).abs() <= 1 && (self.y - other.y).abs() <= 1
    }
}

impl fmt::Display for GridCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridCoordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl std::ops::Add for GridCoordinate {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for GridCoordinate {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// One of the two opposing sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Team {
    Zero,
    One,
}

impl Team {
    /// Both teams in roster order.
    pub const ALL: [Team; 2] = [Team::Zero, Team::One];

    /// Returns the opposing team.
    pub fn other(self) -> Team {
        match self {
            Team::Zero => Team::One,
            Team::One => Team::Zero,
        }
    }

    /// Numeric team id (0 or 1).
    pub fn id(self) -> u8 {
        match self {
            Team::Zero => 0,
            Team::One => 1,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team {}", self.id())
    }
}

/// The three kinds of action a unit may spend from its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Move,
    Attack,
    Skill,
}

impl ActionKind {
    /// Manhattan radius within which the action may target tiles.
    pub fn range(self) -> u32 {
        match self {
            ActionKind::Move => crate::config::MOVE_RANGE,
            ActionKind::Attack => crate::config::ATTACK_RANGE,
            ActionKind::Skill => crate::config::SKILL_RANGE,
        }
    }
}

/// Unique identifier for units.
pub type UnitId = Uuid;

/// Creates a new unique unit ID.
pub fn new_unit_id() -> UnitId {
    Uuid::new_v4()
}
