//! # Tactica
//!
//! Simulation core for a turn-based tactical grid game.
//!
//! ## Architecture Overview
//!
//! The crate is organised around a single owning [`Match`] that wires together
//! the pieces of a skirmish between two fixed rosters:
//!
//! - **Grid**: the authoritative tile store ([`GridModel`]) with terrain and
//!   highlight state, but no occupancy of its own
//! - **Units**: the [`UnitRegistry`] keeps every unit plus an incremental
//!   coordinate index used for occupancy checks
//! - **Turns**: the [`TurnController`] state machine decides who acts next and
//!   when the match is over
//! - **Pathfinding**: an A* [`PathPlanner`] restricted to an admissible set
//! - **Generation**: wave function collapse terrain synthesis from a small seed
//!   sample ([`WfcSynthesizer`])
//!
//! Presentation layers talk to the core through discrete [`Command`]s and read
//! back reachable sets, the current actor and [`GameEvent`]s.

pub mod game;
pub mod generation;
pub mod input;
pub mod utils;

pub use game::*;
pub use generation::*;
pub use input::*;
pub use utils::*;

/// Core error type for the Tactica simulation.
#[derive(thiserror::Error, Debug)]
pub enum TacticaError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Seed sample is malformed or holds an unknown terrain value
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Requested grid or output dimensions are unusable
    #[error("Invalid size: {0}")]
    InvalidSize(String),

    /// Constraint propagation emptied a wave cell
    #[error("Generation contradiction at lattice cell ({x}, {y})")]
    GenerationContradiction { x: usize, y: usize },

    /// Game state is invalid
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the Tactica codebase.
pub type TacticaResult<T> = Result<T, TacticaError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tuning values shared by the match and generation configs.
pub mod config {
    /// Default grid width in tiles
    pub const DEFAULT_GRID_WIDTH: u32 = 10;

    /// Default grid height in tiles
    pub const DEFAULT_GRID_HEIGHT: u32 = 10;

    /// Units per team roster
    pub const DEFAULT_ROSTER_SIZE: usize = 3;

    /// Seconds each unit has to act before its turn ends
    pub const DEFAULT_TURN_DURATION: f32 = 30.0;

    /// Seconds a movement animation takes, independent of path length
    pub const DEFAULT_MOVE_DURATION: f32 = 1.0;

    /// Starting hit points of a unit
    pub const DEFAULT_UNIT_HP: u32 = 5;

    /// Starting energy of a unit
    pub const DEFAULT_UNIT_ENERGY: u32 = 5;

    /// Damage dealt by a basic attack
    pub const ATTACK_DAMAGE: u32 = 1;

    /// Energy consumed by a skill
    pub const SKILL_ENERGY_COST: u32 = 3;

    /// Manhattan range of a move request
    pub const MOVE_RANGE: u32 = 3;

    /// Manhattan range of an attack request
    pub const ATTACK_RANGE: u32 = 1;

    /// Manhattan range of a skill request
    pub const SKILL_RANGE: u32 = 2;

    /// Fixed simulation tick used by the headless runner
    pub const TICK_SECONDS: f32 = 1.0 / 60.0;
}
