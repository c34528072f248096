//! # Input Module
//!
//! Commands and the automatic controller used by headless skirmishes.

pub mod commands;

pub use commands::*;

use crate::{config, ActionKind, GameEvent, GameOutcome, GridCoordinate, Match, TargetTag, Team};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Picks commands for whichever unit is acting.
///
/// The controller attacks when it can, uses its skill when an enemy is in
/// reach, and otherwise closes distance to the nearest enemy. When nothing
/// useful is left it skips, which is also how control passes between teams.
#[derive(Debug, Clone, Default)]
pub struct AutoController {
    /// Teams driven by the controller; empty means both
    pub teams: Vec<Team>,
}

impl AutoController {
    /// Creates a controller that plays both sides.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::{AutoController, Command, GridModel, Match, MatchConfig};
    ///
    /// let config = MatchConfig::new();
    /// let grid = GridModel::new(config.grid_width, config.grid_height);
    /// let game = Match::new(config, grid).unwrap();
    ///
    /// let controller = AutoController::new();
    /// let mut rng = rand::SeedableRng::seed_from_u64(1);
    /// let plan = controller.plan(&game, &mut rng);
    /// assert!(!plan.is_empty());
    /// ```
    pub fn new() -> Self {
        Self { teams: Vec::new() }
    }

    /// Whether the controller is responsible for `team`.
    pub fn controls(&self, team: Team) -> bool {
        self.teams.is_empty() || self.teams.contains(&team)
    }

    /// Commands for the acting unit's next step.
    ///
    /// Empty while a unit is moving or once the match is over.
    pub fn plan(&self, game: &Match, rng: &mut StdRng) -> Vec<Command> {
        if game.is_busy() || game.is_game_over() {
            return Vec::new();
        }
        let Some(actor) = game.current_actor() else {
            return Vec::new();
        };

        if actor.budget.can_attack {
            let weakest = valid_targets(game, ActionKind::Attack)
                .into_iter()
                .filter_map(|coord| game.unit_at(coord))
                .min_by_key(|unit| unit.hp);
            if let Some(target) = weakest {
                return vec![
                    Command::SelectAction(ActionKind::Attack),
                    Command::Target(target.position),
                ];
            }
        }

        if actor.budget.can_skill && actor.energy >= game.config().skill_energy_cost {
            if let Some(&target) = valid_targets(game, ActionKind::Skill).first() {
                return vec![
                    Command::SelectAction(ActionKind::Skill),
                    Command::Target(target),
                ];
            }
        }

        if actor.budget.can_move {
            let enemies: Vec<GridCoordinate> = game
                .units()
                .iter()
                .filter(|unit| unit.is_alive() && unit.team != actor.team)
                .map(|unit| unit.position)
                .collect();
            let closeness = |coord: GridCoordinate| {
                enemies
                    .iter()
                    .map(|enemy| coord.manhattan_distance(*enemy))
                    .min()
                    .unwrap_or(u32::MAX)
            };

            let current = closeness(actor.position);
            let tiles = valid_targets(game, ActionKind::Move);
            if let Some(best) = tiles.iter().map(|coord| closeness(*coord)).min() {
                if best < current {
                    let candidates: Vec<GridCoordinate> = tiles
                        .into_iter()
                        .filter(|coord| closeness(*coord) == best)
                        .collect();
                    if let Some(&target) = candidates.choose(rng) {
                        return vec![
                            Command::SelectAction(ActionKind::Move),
                            Command::Target(target),
                        ];
                    }
                }
            }
        }

        vec![Command::SkipTurn]
    }
}

fn valid_targets(game: &Match, kind: ActionKind) -> Vec<GridCoordinate> {
    game.reachable_set(kind)
        .into_iter()
        .filter(|tile| tile.tag == TargetTag::ValidTarget)
        .map(|tile| tile.coordinate)
        .collect()
}

/// Summary of a headless skirmish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkirmishReport {
    /// Turns started, including the first
    pub turns: u64,
    /// `None` when the turn limit was hit first
    pub outcome: Option<GameOutcome>,
    /// Every event raised during the run, in order
    pub events: Vec<GameEvent>,
}

/// Plays a match with the controller until it ends or `max_turns` is reached.
///
/// Rejected commands make the acting unit skip, so every step either spends
/// budget or passes the turn.
pub fn run_skirmish(
    game: &mut Match,
    controller: &AutoController,
    rng: &mut StdRng,
    max_turns: u64,
) -> SkirmishReport {
    let mut events = game.drain_events();

    while !game.is_game_over() && game.turn_number() <= max_turns {
        if game.is_busy() {
            game.tick(config::TICK_SECONDS);
            events.extend(game.drain_events());
            continue;
        }

        let controlled = game
            .current_team()
            .map(|team| controller.controls(team))
            .unwrap_or(false);
        let plan = if controlled {
            controller.plan(game, rng)
        } else {
            vec![Command::EndTurn]
        };

        for command in plan {
            if let Err(rejection) = game.apply(command) {
                log::debug!("{:?} rejected ({}), skipping", command, rejection);
                if let Err(rejection) = game.apply(Command::SkipTurn) {
                    log::warn!("Skip rejected: {}", rejection);
                }
                break;
            }
        }
        events.extend(game.drain_events());
    }

    SkirmishReport {
        turns: game.turn_number(),
        outcome: game.outcome(),
        events,
    }
}
