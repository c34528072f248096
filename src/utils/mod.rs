//! # Utilities Module
//!
//! Interpolation maths and grid pathfinding.

pub mod math;
pub mod pathfinding;

pub use math::*;
pub use pathfinding::*;
