//! # Match State Module
//!
//! Central match state and the request/query interface used by presentation.
//!
//! [`Match`] is the single owner of the grid, both rosters, the turn state
//! machine and any in-flight movement. Presentation feeds it discrete
//! requests (select an action, pick a target, skip) and calls
//! [`Match::tick`] once per simulation step; everything else it needs is read
//! back through queries and drained [`GameEvent`]s.

use crate::{
    config, ActionKind, Command, GameOutcome, Generator, GridCoordinate, GridModel,
    MovementStatus, MovementTask, PathPlanner, SynthesisConfig, TacticaError, TacticaResult, Team,
    TerrainMap, TurnController, TurnPhase, Unit, UnitId, UnitRegistry, WfcSynthesizer,
};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A roster's worth of spawn points along row `y`, starting at column 4.
fn spawn_row(y: i32) -> Vec<GridCoordinate> {
    (0..config::DEFAULT_ROSTER_SIZE as i32)
        .map(|offset| GridCoordinate::new(4 + offset, y))
        .collect()
}

/// Tunable rules of a match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Grid width in tiles
    pub grid_width: u32,
    /// Grid height in tiles
    pub grid_height: u32,
    /// Seconds a unit has before its turn ends on its own
    pub turn_duration: f32,
    /// Seconds every movement takes, whatever the path length
    pub move_duration: f32,
    /// Starting hit points
    pub unit_hp: u32,
    /// Starting energy
    pub unit_energy: u32,
    /// Damage of a basic attack
    pub attack_damage: u32,
    /// Energy consumed by a skill
    pub skill_energy_cost: u32,
    /// Spawn coordinates per team; their count fixes each roster's size
    pub spawn_points: [Vec<GridCoordinate>; 2],
}

impl MatchConfig {
    /// Creates the standard 10x10 three-versus-three setup.
    pub fn new() -> Self {
        Self {
            grid_width: config::DEFAULT_GRID_WIDTH,
            grid_height: config::DEFAULT_GRID_HEIGHT,
            turn_duration: config::DEFAULT_TURN_DURATION,
            move_duration: config::DEFAULT_MOVE_DURATION,
            unit_hp: config::DEFAULT_UNIT_HP,
            unit_energy: config::DEFAULT_UNIT_ENERGY,
            attack_damage: config::ATTACK_DAMAGE,
            skill_energy_cost: config::SKILL_ENERGY_COST,
            spawn_points: [spawn_row(3), spawn_row(7)],
        }
    }

    /// Creates a configuration for testing with a single unit per team
    /// standing next to each other.
    pub fn for_testing() -> Self {
        Self {
            spawn_points: [vec![GridCoordinate::new(4, 4)], vec![GridCoordinate::new(4, 5)]],
            ..Self::new()
        }
    }

    /// Number of units on a team's roster.
    pub fn roster_size(&self, team: Team) -> usize {
        self.spawn_points[team.id() as usize].len()
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Notifications for presentation collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A movement task started along `path`
    MoveStarted {
        unit: UnitId,
        path: Vec<GridCoordinate>,
    },
    /// A movement task finished
    UnitMoved {
        unit: UnitId,
        from: GridCoordinate,
        to: GridCoordinate,
    },
    /// A unit lost hit points
    UnitDamaged {
        unit: UnitId,
        source: Option<UnitId>,
        amount: u32,
        remaining_hp: u32,
    },
    /// A unit reached zero hit points
    UnitDestroyed { unit: UnitId, at: GridCoordinate },
    /// A unit spent energy on its skill
    SkillUsed {
        unit: UnitId,
        target: UnitId,
        energy_left: u32,
    },
    /// Control passed to another unit
    TurnAdvanced {
        team: Team,
        index: usize,
        unit: UnitId,
    },
    /// The match ended
    GameOver { outcome: GameOutcome },
}

/// A request that was refused. Refusals never change match state.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionRejection {
    #[error("no action selected")]
    NoActionSelected,
    #[error("action already used this turn")]
    ActionAlreadyUsed,
    #[error("target is out of range")]
    OutOfRange,
    #[error("tile is occupied")]
    TileOccupied,
    #[error("not a valid target")]
    InvalidTarget,
    #[error("no path to target")]
    NoPath,
    #[error("not enough energy")]
    InsufficientEnergy,
    #[error("a unit is still moving")]
    UnitBusy,
    #[error("the game is over")]
    GameOver,
}

/// Classification of a tile inside an action's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetTag {
    /// Action already used, or a move onto an occupied tile
    Blocked,
    ValidTarget,
    InvalidTarget,
}

/// One entry of a reachable set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachableTile {
    pub coordinate: GridCoordinate,
    pub tag: TargetTag,
}

/// A running skirmish between two rosters.
#[derive(Debug, Clone)]
pub struct Match {
    config: MatchConfig,
    grid: GridModel,
    units: UnitRegistry,
    turns: TurnController,
    planner: PathPlanner,
    selected_action: Option<ActionKind>,
    movement: Option<MovementTask>,
    events: Vec<GameEvent>,
    game_over_reported: bool,
}

impl Match {
    /// Sets up both rosters on an existing grid and starts the first turn.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::{GridModel, Match, MatchConfig, Team};
    ///
    /// let config = MatchConfig::new();
    /// let grid = GridModel::new(config.grid_width, config.grid_height);
    /// let game = Match::new(config, grid).unwrap();
    /// assert_eq!(game.current_team(), Some(Team::Zero));
    /// assert_eq!(game.current_actor().unwrap().slot, 0);
    /// ```
    pub fn new(config: MatchConfig, grid: GridModel) -> TacticaResult<Self> {
        for (team, spawns) in Team::ALL.iter().zip(&config.spawn_points) {
            if spawns.is_empty() {
                return Err(TacticaError::InvalidState(format!("{team} has an empty roster")));
            }
            if let Some(outside) = spawns.iter().find(|coord| !grid.contains(**coord)) {
                return Err(TacticaError::InvalidState(format!(
                    "spawn point {outside} lies outside the grid"
                )));
            }
        }

        let units =
            UnitRegistry::with_rosters(&config.spawn_points, config.unit_hp, config.unit_energy)?;
        let turns = TurnController::new(config.turn_duration);

        let mut game = Self {
            config,
            grid,
            units,
            turns,
            planner: PathPlanner::new(),
            selected_action: None,
            movement: None,
            events: Vec::new(),
            game_over_reported: false,
        };

        let phase = game.turns.begin(&mut game.units);
        game.on_phase_change(phase);
        Ok(game)
    }

    /// Synthesizes terrain for a fresh grid and sets up the match on it.
    ///
    /// Contradictions are returned as-is; retries only happen when the
    /// synthesis config opts into more than one attempt.
    pub fn with_generated_terrain(
        config: MatchConfig,
        synthesis: &SynthesisConfig,
        rng: &mut StdRng,
    ) -> TacticaResult<Self> {
        let grid = GridModel::initialize(
            config.grid_width,
            config.grid_height,
            &WfcSynthesizer::new(),
            synthesis,
            rng,
        )?;
        Self::new(config, grid)
    }

    /// Rebuilds the terrain in place, leaving units and turn state untouched.
    pub fn regenerate_terrain<G: Generator<TerrainMap>>(
        &mut self,
        generator: &G,
        synthesis: &SynthesisConfig,
        rng: &mut StdRng,
    ) -> TacticaResult<()> {
        let synthesis = synthesis
            .clone()
            .with_output_size(self.grid.width() as usize, self.grid.height() as usize);
        let terrain = generator.generate(&synthesis, rng)?;
        generator.validate(&terrain, &synthesis)?;
        self.grid.apply_terrain(&terrain);
        log::info!("Terrain rebuilt with {}", generator.generator_type());
        Ok(())
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridModel {
        &self.grid
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(id)
    }

    pub fn unit_at(&self, coord: GridCoordinate) -> Option<&Unit> {
        self.units.unit_at(coord)
    }

    pub fn phase(&self) -> TurnPhase {
        self.turns.phase()
    }

    /// The unit whose turn it is.
    pub fn current_actor(&self) -> Option<&Unit> {
        self.turns
            .current_unit(&self.units)
            .and_then(|id| self.units.get(id))
    }

    pub fn current_team(&self) -> Option<Team> {
        self.turns.current().map(|(team, _)| team)
    }

    pub fn turn_time_remaining(&self) -> f32 {
        self.turns.time_remaining()
    }

    pub fn turn_number(&self) -> u64 {
        self.turns.turn_number()
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.turns.outcome()
    }

    pub fn is_game_over(&self) -> bool {
        self.turns.is_game_over()
    }

    pub fn selected_action(&self) -> Option<ActionKind> {
        self.selected_action
    }

    /// The in-flight movement task, if any.
    pub fn movement(&self) -> Option<&MovementTask> {
        self.movement.as_ref()
    }

    /// Whether a unit is moving; requests and turn changes wait until it stops.
    pub fn is_busy(&self) -> bool {
        self.movement.is_some()
    }

    /// Takes all notifications raised since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Tiles within the action's Manhattan range of the acting unit.
    ///
    /// Sorted row-major. Empty when nobody is acting.
    pub fn reachable_set(&self, kind: ActionKind) -> Vec<ReachableTile> {
        let Some(actor) = self.current_actor() else {
            return Vec::new();
        };
        let available = actor.budget.allows(kind);

        self.grid
            .coordinates()
            .into_iter()
            .filter(|coord| actor.position.manhattan_distance(*coord) <= kind.range())
            .map(|coordinate| {
                let tag = if !available {
                    TargetTag::Blocked
                } else {
                    let occupant = self.units.unit_at(coordinate);
                    match kind {
                        ActionKind::Move if occupant.is_some() => TargetTag::Blocked,
                        ActionKind::Move => TargetTag::ValidTarget,
                        ActionKind::Attack | ActionKind::Skill => match occupant {
                            Some(unit) if unit.team != actor.team => TargetTag::ValidTarget,
                            _ => TargetTag::InvalidTarget,
                        },
                    }
                };
                ReachableTile { coordinate, tag }
            })
            .collect()
    }

    /// Dispatches a command to the matching request.
    pub fn apply(&mut self, command: Command) -> Result<(), ActionRejection> {
        match command {
            Command::SelectAction(kind) => self.request_action(kind),
            Command::Target(coord) => self.request_target(coord),
            Command::SkipTurn => self.request_skip_turn(),
            Command::EndTurn => self.request_end_turn(),
        }
    }

    /// Selects a pending action for the acting unit and highlights its tiles.
    pub fn request_action(&mut self, kind: ActionKind) -> Result<(), ActionRejection> {
        self.ensure_ready()?;
        let allowed = self
            .current_actor()
            .map(|actor| actor.budget.allows(kind))
            .unwrap_or(false);

        if !allowed {
            self.clear_selection();
            log::debug!("{:?} already used this turn", kind);
            return Err(ActionRejection::ActionAlreadyUsed);
        }

        self.selected_action = Some(kind);
        self.grid.reset_interactable(false);
        for tile in self.reachable_set(kind) {
            self.grid
                .set_interactable(tile.coordinate, tile.tag == TargetTag::ValidTarget);
        }
        log::debug!("Selected action {:?}", kind);
        Ok(())
    }

    /// Resolves the selected action against a tile or its occupant.
    ///
    /// The selection is cleared whatever the result.
    pub fn request_target(&mut self, target: GridCoordinate) -> Result<(), ActionRejection> {
        let selected = self.selected_action;
        let result = match selected {
            None => Err(ActionRejection::NoActionSelected),
            Some(kind) => self
                .ensure_ready()
                .and_then(|()| self.resolve_target(kind, target)),
        };
        self.clear_selection();

        if let Err(rejection) = result {
            log::warn!("{:?} on {} rejected: {}", selected, target, rejection);
        }
        result
    }

    /// Forces the end of the acting unit's turn and deactivates it.
    pub fn request_skip_turn(&mut self) -> Result<(), ActionRejection> {
        self.ensure_ready()?;
        let phase = self.turns.force_skip(&mut self.units);
        self.on_phase_change(phase);
        Ok(())
    }

    /// Ends the acting unit's turn without deactivating it.
    pub fn request_end_turn(&mut self) -> Result<(), ActionRejection> {
        self.ensure_ready()?;
        self.end_turn();
        Ok(())
    }

    /// Starts moving the acting unit toward `target`.
    ///
    /// The route may only cross tiles the move highlight marks as valid.
    pub fn begin_move(&mut self, target: GridCoordinate) -> Result<(), ActionRejection> {
        self.ensure_ready()?;
        let actor = self.current_actor().ok_or(ActionRejection::GameOver)?;
        if !actor.budget.can_move {
            return Err(ActionRejection::ActionAlreadyUsed);
        }
        let (unit_id, start) = (actor.id, actor.position);

        let admissible: HashSet<GridCoordinate> = self
            .reachable_set(ActionKind::Move)
            .into_iter()
            .filter(|tile| tile.tag == TargetTag::ValidTarget)
            .map(|tile| tile.coordinate)
            .collect();

        let path = self
            .planner
            .find_path(start, target, &admissible, &self.units)
            .filter(|path| path.len() > 1)
            .ok_or(ActionRejection::NoPath)?;

        log::debug!("Moving along {} steps to {}", path.len() - 1, target);
        self.events.push(GameEvent::MoveStarted {
            unit: unit_id,
            path: path.clone(),
        });
        if let Some(unit) = self.units.get_mut(unit_id) {
            unit.moving = true;
        }
        self.movement = Some(MovementTask::new(
            unit_id,
            path,
            self.config.move_duration,
            &self.grid,
        ));
        Ok(())
    }

    /// Applies damage to a unit and immediately checks for victory.
    pub fn apply_damage(&mut self, unit: UnitId, amount: u32, source: Option<UnitId>) {
        let position = match self.units.get(unit) {
            Some(target) if target.is_alive() => target.position,
            _ => return,
        };
        let Some(report) = self.units.apply_damage(unit, amount) else {
            return;
        };

        self.events.push(GameEvent::UnitDamaged {
            unit,
            source,
            amount,
            remaining_hp: report.remaining_hp,
        });
        if report.destroyed {
            self.events.push(GameEvent::UnitDestroyed { unit, at: position });
        }

        if let Some(outcome) = self.turns.check_victory(&self.units) {
            self.finish(outcome);
            return;
        }

        // A destroyed actor loses the turn, and any move it started with it
        if report.destroyed && self.turns.current_unit(&self.units) == Some(unit) {
            if self.movement.as_ref().map(|task| task.unit()) == Some(unit) {
                log::debug!("Movement cancelled: mover was destroyed");
                self.movement = None;
                if let Some(victim) = self.units.get_mut(unit) {
                    victim.moving = false;
                }
            }
            self.end_turn();
        }
    }

    /// Advances the simulation by one tick of `dt` seconds.
    ///
    /// Runs the turn countdown and the movement task. A turn whose countdown
    /// expires while a unit is moving ends once the movement completes.
    pub fn tick(&mut self, dt: f32) {
        if self.is_game_over() {
            return;
        }

        self.turns.tick(dt);
        self.advance_movement(dt);

        if !self.is_busy() && !self.is_game_over() && self.turns.time_remaining() <= 0.0 {
            log::debug!("Turn timer expired");
            self.end_turn();
        }
    }

    fn advance_movement(&mut self, dt: f32) {
        let Some(task) = self.movement.as_mut() else {
            return;
        };
        if task.advance(dt) == MovementStatus::InProgress {
            return;
        }

        let unit_id = task.unit();
        let destination = task.destination();
        let from = task.path()[0];
        self.movement = None;

        let placed = self.units.set_position(unit_id, destination);
        debug_assert!(placed.is_ok(), "movement could not finish: {placed:?}");
        if let Err(err) = placed {
            log::warn!("Movement could not finish: {}", err);
            if let Some(unit) = self.units.get_mut(unit_id) {
                unit.moving = false;
            }
            return;
        }
        let mut exhausted = false;
        if let Some(unit) = self.units.get_mut(unit_id) {
            unit.moving = false;
            unit.budget.can_move = false;
            exhausted = unit.budget.is_exhausted();
            log::debug!("{} finished moving to {}", unit.name, destination);
        }
        self.events.push(GameEvent::UnitMoved {
            unit: unit_id,
            from,
            to: destination,
        });

        if exhausted {
            self.end_turn();
        }
    }

    fn resolve_target(
        &mut self,
        kind: ActionKind,
        target: GridCoordinate,
    ) -> Result<(), ActionRejection> {
        let actor = self.current_actor().ok_or(ActionRejection::GameOver)?;
        if !actor.budget.allows(kind) {
            return Err(ActionRejection::ActionAlreadyUsed);
        }
        if !self.grid.contains(target) {
            return Err(ActionRejection::InvalidTarget);
        }
        if actor.position.manhattan_distance(target) > kind.range() {
            return Err(ActionRejection::OutOfRange);
        }
        let (actor_id, actor_team, actor_energy) = (actor.id, actor.team, actor.energy);

        match kind {
            ActionKind::Move => {
                if self.units.unit_at(target).is_some() {
                    return Err(ActionRejection::TileOccupied);
                }
                return self.begin_move(target);
            }
            ActionKind::Attack => {
                let victim = self.enemy_at(target, actor_team)?;
                if let Some(unit) = self.units.get_mut(actor_id) {
                    unit.budget.spend(ActionKind::Attack);
                }
                self.apply_damage(victim, self.config.attack_damage, Some(actor_id));
            }
            ActionKind::Skill => {
                let victim = self.enemy_at(target, actor_team)?;
                if actor_energy < self.config.skill_energy_cost {
                    return Err(ActionRejection::InsufficientEnergy);
                }
                let cost = self.config.skill_energy_cost;
                let energy_left = match self.units.get_mut(actor_id) {
                    Some(unit) => {
                        unit.spend_energy(cost);
                        unit.budget.spend(ActionKind::Skill);
                        unit.energy
                    }
                    None => 0,
                };
                self.events.push(GameEvent::SkillUsed {
                    unit: actor_id,
                    target: victim,
                    energy_left,
                });
            }
        }

        let exhausted = self
            .units
            .get(actor_id)
            .map(|unit| unit.budget.is_exhausted())
            .unwrap_or(false);
        if exhausted && !self.is_game_over() {
            self.end_turn();
        }
        Ok(())
    }

    /// Finds an enemy of `team` that can be targeted on `coord`.
    fn enemy_at(&self, coord: GridCoordinate, team: Team) -> Result<UnitId, ActionRejection> {
        match self.units.unit_at(coord) {
            Some(unit) if unit.team != team && !unit.moving => Ok(unit.id),
            _ => Err(ActionRejection::InvalidTarget),
        }
    }

    fn ensure_ready(&self) -> Result<(), ActionRejection> {
        if self.is_game_over() {
            Err(ActionRejection::GameOver)
        } else if self.is_busy() {
            Err(ActionRejection::UnitBusy)
        } else {
            Ok(())
        }
    }

    fn end_turn(&mut self) {
        let phase = self.turns.advance_turn(&mut self.units);
        self.on_phase_change(phase);
    }

    fn clear_selection(&mut self) {
        self.selected_action = None;
        self.grid.reset_interactable(true);
    }

    fn on_phase_change(&mut self, phase: TurnPhase) {
        self.clear_selection();
        match phase {
            TurnPhase::Active { team, index } => {
                if let Some(&unit) = self.units.roster(team).get(index) {
                    self.events.push(GameEvent::TurnAdvanced { team, index, unit });
                }
            }
            TurnPhase::GameOver(outcome) => self.finish(outcome),
        }
    }

    fn finish(&mut self, outcome: GameOutcome) {
        if !self.game_over_reported {
            self.game_over_reported = true;
            log::info!("Match finished: {:?}", outcome);
            self.events.push(GameEvent::GameOver { outcome });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_match() -> Match {
        let config = MatchConfig::new();
        let grid = GridModel::new(config.grid_width, config.grid_height);
        Match::new(config, grid).unwrap()
    }

    fn duel(hp: u32) -> Match {
        let config = MatchConfig {
            unit_hp: hp,
            ..MatchConfig::for_testing()
        };
        let grid = GridModel::new(config.grid_width, config.grid_height);
        Match::new(config, grid).unwrap()
    }

    fn run_until_idle(game: &mut Match) {
        for _ in 0..1000 {
            if !game.is_busy() {
                break;
            }
            game.tick(config::TICK_SECONDS);
        }
    }

    #[test]
    fn test_match_creation() {
        let mut game = standard_match();
        assert_eq!(game.units().roster(Team::Zero).len(), config::DEFAULT_ROSTER_SIZE);
        assert_eq!(game.units().roster(Team::One).len(), config::DEFAULT_ROSTER_SIZE);
        assert_eq!(game.current_actor().unwrap().position, GridCoordinate::new(4, 3));
        assert_eq!(game.turn_time_remaining(), config::DEFAULT_TURN_DURATION);

        let events = game.drain_events();
        assert!(matches!(
            events.as_slice(),
            [GameEvent::TurnAdvanced { team: Team::Zero, index: 0, .. }]
        ));
        assert!(game.drain_events().is_empty());
    }

    #[test]
    fn test_spawn_outside_grid_is_rejected() {
        let config = MatchConfig::new();
        let grid = GridModel::new(5, 5);
        assert!(matches!(
            Match::new(config, grid),
            Err(TacticaError::InvalidState(_))
        ));
    }

    #[test]
    fn test_reachable_set_move() {
        let game = standard_match();
        let tiles = game.reachable_set(ActionKind::Move);

        // Manhattan diamond of radius 3 fully inside the grid
        assert_eq!(tiles.len(), 25);
        let tag_at = |x, y| {
            tiles
                .iter()
                .find(|t| t.coordinate == GridCoordinate::new(x, y))
                .map(|t| t.tag)
        };
        assert_eq!(tag_at(4, 3), Some(TargetTag::Blocked)); // the actor itself
        assert_eq!(tag_at(5, 3), Some(TargetTag::Blocked)); // ally
        assert_eq!(tag_at(4, 6), Some(TargetTag::ValidTarget));
        assert_eq!(tag_at(4, 7), None); // distance 4
    }

    #[test]
    fn test_reachable_set_attack() {
        let game = duel(5);
        let tiles = game.reachable_set(ActionKind::Attack);
        let valid: Vec<_> = tiles
            .iter()
            .filter(|t| t.tag == TargetTag::ValidTarget)
            .map(|t| t.coordinate)
            .collect();
        assert_eq!(valid, vec![GridCoordinate::new(4, 5)]);
        assert!(tiles
            .iter()
            .filter(|t| t.coordinate != GridCoordinate::new(4, 5))
            .all(|t| t.tag == TargetTag::InvalidTarget));
    }

    #[test]
    fn test_request_action_highlights_tiles() {
        let mut game = duel(5);
        game.request_action(ActionKind::Attack).unwrap();
        assert_eq!(game.selected_action(), Some(ActionKind::Attack));

        let grid = game.grid();
        assert!(grid.tile_at(GridCoordinate::new(4, 5)).unwrap().interactable);
        assert!(!grid.tile_at(GridCoordinate::new(4, 3)).unwrap().interactable);
        assert!(!grid.tile_at(GridCoordinate::new(0, 0)).unwrap().interactable);
    }

    #[test]
    fn test_target_without_selection() {
        let mut game = duel(5);
        assert_eq!(
            game.request_target(GridCoordinate::new(4, 5)),
            Err(ActionRejection::NoActionSelected)
        );
    }

    #[test]
    fn test_attack_damages_enemy_once_per_turn() {
        let mut game = duel(5);
        let enemy = game.unit_at(GridCoordinate::new(4, 5)).unwrap().id;

        game.request_action(ActionKind::Attack).unwrap();
        game.request_target(GridCoordinate::new(4, 5)).unwrap();
        assert_eq!(game.unit(enemy).unwrap().hp, 4);
        assert_eq!(game.selected_action(), None);

        assert_eq!(
            game.request_action(ActionKind::Attack),
            Err(ActionRejection::ActionAlreadyUsed)
        );
    }

    #[test]
    fn test_attack_rejects_ally_and_empty_tiles() {
        let mut game = standard_match();
        game.request_action(ActionKind::Attack).unwrap();
        assert_eq!(
            game.request_target(GridCoordinate::new(5, 3)),
            Err(ActionRejection::InvalidTarget)
        );
        game.request_action(ActionKind::Attack).unwrap();
        assert_eq!(
            game.request_target(GridCoordinate::new(4, 6)),
            Err(ActionRejection::OutOfRange)
        );
        assert!(game.current_actor().unwrap().budget.can_attack);
    }

    #[test]
    fn test_skill_costs_energy() {
        let mut game = duel(5);
        game.request_action(ActionKind::Skill).unwrap();
        game.request_target(GridCoordinate::new(4, 5)).unwrap();

        let actor = game.current_actor().unwrap();
        assert_eq!(actor.energy, 2);
        assert!(!actor.budget.can_skill);
        assert!(game
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::SkillUsed { energy_left: 2, .. })));
    }

    #[test]
    fn test_skill_requires_energy() {
        let config = MatchConfig {
            unit_energy: 2,
            ..MatchConfig::for_testing()
        };
        let grid = GridModel::new(config.grid_width, config.grid_height);
        let mut game = Match::new(config, grid).unwrap();

        game.request_action(ActionKind::Skill).unwrap();
        assert_eq!(
            game.request_target(GridCoordinate::new(4, 5)),
            Err(ActionRejection::InsufficientEnergy)
        );
        assert!(game.current_actor().unwrap().budget.can_skill);
    }

    #[test]
    fn test_move_onto_occupied_tile_is_rejected() {
        let mut game = standard_match();
        game.request_action(ActionKind::Move).unwrap();
        assert_eq!(
            game.request_target(GridCoordinate::new(5, 3)),
            Err(ActionRejection::TileOccupied)
        );
        assert!(!game.is_busy());
    }

    #[test]
    fn test_move_blocks_requests_until_complete() {
        let mut game = standard_match();
        game.request_action(ActionKind::Move).unwrap();
        game.request_target(GridCoordinate::new(3, 5)).unwrap();
        assert!(game.is_busy());
        assert!(game.current_actor().unwrap().moving);

        assert_eq!(
            game.request_action(ActionKind::Attack),
            Err(ActionRejection::UnitBusy)
        );
        assert_eq!(game.request_skip_turn(), Err(ActionRejection::UnitBusy));

        run_until_idle(&mut game);
        let actor = game.current_actor().unwrap();
        assert_eq!(actor.position, GridCoordinate::new(3, 5));
        assert!(!actor.moving);
        assert!(!actor.budget.can_move);
        assert!(game.unit_at(GridCoordinate::new(4, 3)).is_none());
    }

    #[test]
    fn test_timer_expiry_waits_for_movement() {
        let config = MatchConfig {
            turn_duration: 0.5,
            move_duration: 1.0,
            ..MatchConfig::new()
        };
        let grid = GridModel::new(config.grid_width, config.grid_height);
        let mut game = Match::new(config, grid).unwrap();
        let mover = game.current_actor().unwrap().id;

        game.request_action(ActionKind::Move).unwrap();
        game.request_target(GridCoordinate::new(4, 5)).unwrap();

        game.tick(0.75);
        assert_eq!(game.current_actor().unwrap().id, mover);
        assert!(game.is_busy());

        game.tick(0.5);
        assert!(!game.is_busy());
        assert_ne!(game.current_actor().unwrap().id, mover);
    }

    #[test]
    fn test_exhausted_budget_ends_turn() {
        let mut game = duel(5);
        let first = game.current_actor().unwrap().id;

        game.request_action(ActionKind::Attack).unwrap();
        game.request_target(GridCoordinate::new(4, 5)).unwrap();
        game.request_action(ActionKind::Skill).unwrap();
        game.request_target(GridCoordinate::new(4, 5)).unwrap();
        game.request_action(ActionKind::Move).unwrap();
        game.request_target(GridCoordinate::new(3, 3)).unwrap();
        run_until_idle(&mut game);

        // Single-unit roster: the same unit starts a fresh turn
        let actor = game.current_actor().unwrap();
        assert_eq!(actor.id, first);
        assert!(actor.budget.can_move && actor.budget.can_attack && actor.budget.can_skill);
        assert_eq!(game.turn_number(), 2);
    }

    #[test]
    fn test_lethal_attack_ends_match_immediately() {
        let mut game = duel(1);
        game.drain_events();

        game.request_action(ActionKind::Attack).unwrap();
        game.request_target(GridCoordinate::new(4, 5)).unwrap();

        assert_eq!(game.outcome(), Some(GameOutcome::Winner(Team::Zero)));
        assert!(game.unit_at(GridCoordinate::new(4, 5)).is_none());
        let events = game.drain_events();
        assert!(matches!(
            events.last(),
            Some(GameEvent::GameOver {
                outcome: GameOutcome::Winner(Team::Zero)
            })
        ));
        assert_eq!(
            game.request_action(ActionKind::Move),
            Err(ActionRejection::GameOver)
        );
    }

    #[test]
    fn test_skip_passes_turn() {
        let mut game = duel(5);
        game.request_skip_turn().unwrap();
        assert_eq!(game.current_team(), Some(Team::One));
        assert_eq!(game.turn_number(), 2);
    }

    #[test]
    fn test_destroyed_actor_loses_turn() {
        let mut game = standard_match();
        let actor = game.current_actor().unwrap().id;
        game.drain_events();

        game.apply_damage(actor, 100, None);

        assert!(!game.is_game_over());
        assert_eq!(game.phase(), TurnPhase::Active { team: Team::Zero, index: 1 });
        let next = game.current_actor().unwrap();
        assert_ne!(next.id, actor);
        assert!(next.is_alive());
        assert!(!game.unit(actor).unwrap().active);

        let events = game.drain_events();
        assert!(matches!(
            events.as_slice(),
            [
                GameEvent::UnitDamaged { .. },
                GameEvent::UnitDestroyed { .. },
                GameEvent::TurnAdvanced { team: Team::Zero, index: 1, .. }
            ]
        ));
        assert!(game.request_action(ActionKind::Move).is_ok());
    }

    #[test]
    fn test_destroyed_mover_cancels_movement() {
        let mut game = standard_match();
        let mover = game.current_actor().unwrap().id;
        game.request_action(ActionKind::Move).unwrap();
        game.request_target(GridCoordinate::new(3, 5)).unwrap();
        game.tick(config::TICK_SECONDS);
        assert!(game.is_busy());
        game.drain_events();

        game.apply_damage(mover, 100, None);
        assert!(!game.is_busy());
        run_until_idle(&mut game);
        for _ in 0..120 {
            game.tick(config::TICK_SECONDS);
        }

        let unit = game.unit(mover).unwrap();
        assert!(!unit.moving);
        assert_eq!(unit.position, GridCoordinate::new(4, 3));
        assert!(game.unit_at(GridCoordinate::new(3, 5)).is_none());
        assert!(!game
            .drain_events()
            .iter()
            .any(|event| matches!(event, GameEvent::UnitMoved { .. })));
        assert_eq!(game.current_team(), Some(Team::Zero));
        assert_ne!(game.current_actor().unwrap().id, mover);
    }
}
