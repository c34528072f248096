//! # Movement Module
//!
//! Unit movement as an explicit task object resumed once per simulation tick.
//!
//! Total travel time is fixed regardless of path length. Each segment of the
//! path receives a share of that time proportional to its length, so a long
//! diagonal run and a single orthogonal step both finish in the same duration.

use crate::{utils::math, GridCoordinate, GridModel, UnitId, WorldPoint};
use serde::{Deserialize, Serialize};

/// Height above the ground plane at which units travel.
pub const MOVE_HEIGHT: f32 = 1.0;

/// Progress of a movement task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementStatus {
    InProgress,
    Complete,
}

/// An in-flight movement of one unit along a planned path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementTask {
    unit: UnitId,
    path: Vec<GridCoordinate>,
    waypoints: Vec<WorldPoint>,
    segment_durations: Vec<f32>,
    duration: f32,
    elapsed: f32,
}

impl MovementTask {
    /// Plans the interpolation for a path of at least two coordinates.
    pub fn new(unit: UnitId, path: Vec<GridCoordinate>, duration: f32, grid: &GridModel) -> Self {
        debug_assert!(path.len() > 1, "movement needs at least one segment");

        let waypoints: Vec<WorldPoint> = path
            .iter()
            .map(|coord| {
                let mut point = grid.world_position(*coord);
                point[1] = MOVE_HEIGHT;
                point
            })
            .collect();

        let lengths: Vec<f32> = waypoints
            .windows(2)
            .map(|pair| math::distance(pair[0], pair[1]))
            .collect();
        let total: f32 = lengths.iter().sum();
        let duration = duration.max(0.0);

        let segment_durations = if total > 0.0 {
            lengths.iter().map(|len| duration * len / total).collect()
        } else {
            vec![duration / lengths.len().max(1) as f32; lengths.len()]
        };

        Self {
            unit,
            path,
            waypoints,
            segment_durations,
            duration,
            elapsed: 0.0,
        }
    }

    /// The moving unit.
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// The planned path, start and destination inclusive.
    pub fn path(&self) -> &[GridCoordinate] {
        &self.path
    }

    /// Final coordinate of the path.
    pub fn destination(&self) -> GridCoordinate {
        self.path[self.path.len() - 1]
    }

    /// Time allotted to each path segment.
    pub fn segment_durations(&self) -> &[f32] {
        &self.segment_durations
    }

    /// Fraction of the total duration already elapsed.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn status(&self) -> MovementStatus {
        if self.elapsed >= self.duration {
            MovementStatus::Complete
        } else {
            MovementStatus::InProgress
        }
    }

    /// Advances the task by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f32) -> MovementStatus {
        if dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.duration);
        } else if self.duration <= 0.0 {
            self.elapsed = self.duration;
        }
        self.status()
    }

    /// Interpolated world position at the current elapsed time.
    pub fn world_position(&self) -> WorldPoint {
        let mut remaining = self.elapsed;
        for (i, &segment) in self.segment_durations.iter().enumerate() {
            if remaining < segment {
                let t = if segment > 0.0 { remaining / segment } else { 1.0 };
                return math::lerp(self.waypoints[i], self.waypoints[i + 1], t);
            }
            remaining -= segment;
        }
        self.waypoints[self.waypoints.len() - 1]
    }
}
