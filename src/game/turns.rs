//! # Turn Module
//!
//! The turn state machine shared by both rosters.
//!
//! A turn belongs to one unit. When it ends, the next active unit of the same
//! team takes over; once the team has nobody left to act, control passes to
//! the other team, whose living units are all reactivated first. Being
//! "active" means both alive and not skipped, so a unit that was force-skipped
//! only comes back when its team regains control through such a switch.

use crate::{Team, UnitId, UnitRegistry};
use serde::{Deserialize, Serialize};

/// How a finished match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    Winner(Team),
    Draw,
}

/// Where the state machine currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    /// The unit in `index` of `team`'s roster is acting
    Active { team: Team, index: usize },
    /// Terminal state
    GameOver(GameOutcome),
}

/// Turn sequencing, countdown and victory detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnController {
    phase: TurnPhase,
    turn_duration: f32,
    time_remaining: f32,
    turn_number: u64,
}

impl TurnController {
    /// Creates a controller pointing at the first slot of team zero.
    ///
    /// No turn is running until [`TurnController::begin`] is called.
    pub fn new(turn_duration: f32) -> Self {
        Self {
            phase: TurnPhase::Active {
                team: Team::Zero,
                index: 0,
            },
            turn_duration,
            time_remaining: turn_duration,
            turn_number: 0,
        }
    }

    /// Starts the first turn of the match.
    pub fn begin(&mut self, units: &mut UnitRegistry) -> TurnPhase {
        let first_active = units
            .unit_in_slot(Team::Zero, 0)
            .map(|unit| unit.active)
            .unwrap_or(false);

        if first_active {
            self.start_turn(Team::Zero, 0, units);
            self.phase
        } else {
            self.advance_turn(units)
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    /// Team and roster index of the acting unit, unless the game is over.
    pub fn current(&self) -> Option<(Team, usize)> {
        match self.phase {
            TurnPhase::Active { team, index } => Some((team, index)),
            TurnPhase::GameOver(_) => None,
        }
    }

    /// Id of the acting unit.
    pub fn current_unit(&self, units: &UnitRegistry) -> Option<UnitId> {
        let (team, index) = self.current()?;
        units.roster(team).get(index).copied()
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        match self.phase {
            TurnPhase::GameOver(outcome) => Some(outcome),
            TurnPhase::Active { .. } => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.phase, TurnPhase::GameOver(_))
    }

    /// Seconds left on the current turn's countdown.
    pub fn time_remaining(&self) -> f32 {
        self.time_remaining
    }

    /// Number of turns started so far.
    pub fn turn_number(&self) -> u64 {
        self.turn_number
    }

    /// Hands the turn to a roster slot and restarts the countdown.
    ///
    /// # Panics
    ///
    /// Panics if the slot does not exist or holds an inactive unit.
    pub fn start_turn(&mut self, team: Team, index: usize, units: &mut UnitRegistry) {
        let unit = units
            .unit_in_slot_mut(team, index)
            .unwrap_or_else(|| panic!("turn pointer references missing slot {index} of {team}"));
        assert!(unit.active, "turn pointer references inactive {}", unit.name);

        unit.reset_actions();
        log::info!("{}'s turn: {}", team, unit.name);

        self.phase = TurnPhase::Active { team, index };
        self.time_remaining = self.turn_duration;
        self.turn_number += 1;
    }

    /// Counts the turn timer down.
    ///
    /// Returns `true` once the countdown has run out. The caller decides
    /// whether the turn can actually end right now.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.is_game_over() {
            return false;
        }
        self.time_remaining = (self.time_remaining - dt.max(0.0)).max(0.0);
        self.time_remaining <= 0.0
    }

    /// Moves the turn to the next unit that may act.
    ///
    /// Does nothing once the game is over.
    pub fn advance_turn(&mut self, units: &mut UnitRegistry) -> TurnPhase {
        let TurnPhase::Active { team, index } = self.phase else {
            return self.phase;
        };

        if let Some(next) = first_active_from(units, team, index + 1) {
            self.start_turn(team, next, units);
            return self.phase;
        }

        let next_team = team.other();
        units.reactivate_team(next_team);

        if let Some(next) = first_active_from(units, next_team, 0) {
            self.start_turn(next_team, next, units);
            return self.phase;
        }

        let outcome = match (
            units.alive_count(Team::Zero) > 0,
            units.alive_count(Team::One) > 0,
        ) {
            (true, false) => GameOutcome::Winner(Team::Zero),
            (false, true) => GameOutcome::Winner(Team::One),
            _ => GameOutcome::Draw,
        };
        log::info!("No units left to act, game over: {:?}", outcome);
        self.phase = TurnPhase::GameOver(outcome);
        self.phase
    }

    /// Deactivates the acting unit without harming it, then advances.
    pub fn force_skip(&mut self, units: &mut UnitRegistry) -> TurnPhase {
        let TurnPhase::Active { team, index } = self.phase else {
            return self.phase;
        };

        if let Some(unit) = units.unit_in_slot_mut(team, index) {
            log::debug!("{} skipped its turn", unit.name);
            unit.active = false;
        }
        self.advance_turn(units)
    }

    /// Ends the match if a team has no living units left.
    ///
    /// Must run after every hit point reduction, before any turn advance.
    pub fn check_victory(&mut self, units: &UnitRegistry) -> Option<GameOutcome> {
        if let TurnPhase::GameOver(outcome) = self.phase {
            return Some(outcome);
        }

        let outcome = match (
            units.alive_count(Team::Zero) > 0,
            units.alive_count(Team::One) > 0,
        ) {
            (true, true) => return None,
            (false, true) => GameOutcome::Winner(Team::One),
            (true, false) => GameOutcome::Winner(Team::Zero),
            (false, false) => GameOutcome::Draw,
        };

        log::info!("Game over: {:?}", outcome);
        self.phase = TurnPhase::GameOver(outcome);
        Some(outcome)
    }
}

/// Scans a roster from `start` (mod size), wrapping once.
fn first_active_from(units: &UnitRegistry, team: Team, start: usize) -> Option<usize> {
    let count = units.roster(team).len();
    (0..count)
        .map(|offset| (start + offset) % count)
        .find(|&idx| {
            units
                .unit_in_slot(team, idx)
                .map(|unit| unit.active)
                .unwrap_or(false)
        })
}
