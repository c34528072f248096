//! # Units Module
//!
//! Units, their per-turn action budget, and the registry that owns both
//! rosters together with the coordinate index used for occupancy checks.

use crate::{
    utils::Occupancy, ActionKind, GridCoordinate, TacticaError, TacticaResult, Team, UnitId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which actions a unit may still perform this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBudget {
    pub can_move: bool,
    pub can_attack: bool,
    pub can_skill: bool,
}

impl ActionBudget {
    /// Creates a budget with every action available.
    pub fn full() -> Self {
        Self {
            can_move: true,
            can_attack: true,
            can_skill: true,
        }
    }

    /// Makes every action available again.
    pub fn reset(&mut self) {
        *self = Self::full();
    }

    /// Whether the given action has not been used yet.
    pub fn allows(&self, kind: ActionKind) -> bool {
        match kind {
            ActionKind::Move => self.can_move,
            ActionKind::Attack => self.can_attack,
            ActionKind::Skill => self.can_skill,
        }
    }

    /// Marks the given action as used.
    pub fn spend(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Move => self.can_move = false,
            ActionKind::Attack => self.can_attack = false,
            ActionKind::Skill => self.can_skill = false,
        }
    }

    /// Whether nothing is left to do this turn.
    pub fn is_exhausted(&self) -> bool {
        !self.can_move && !self.can_attack && !self.can_skill
    }
}

impl Default for ActionBudget {
    fn default() -> Self {
        Self::full()
    }
}

/// A single combat unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Stable identifier
    pub id: UnitId,
    /// Display name, e.g. `Team0_Robot_1`
    pub name: String,
    /// Owning team
    pub team: Team,
    /// Index of this unit in its team's roster
    pub slot: usize,
    /// Current grid coordinate
    pub position: GridCoordinate,
    /// Remaining hit points
    pub hp: u32,
    /// Remaining energy for skills
    pub energy: u32,
    /// Actions still available this turn
    pub budget: ActionBudget,
    /// Alive and not skipped
    pub active: bool,
    /// A movement task is in flight
    pub moving: bool,
}

impl Unit {
    /// Creates a unit with a full action budget.
    pub fn new(team: Team, slot: usize, position: GridCoordinate, hp: u32, energy: u32) -> Self {
        Self {
            id: crate::new_unit_id(),
            name: format!("Team{}_Robot_{}", team.id(), slot),
            team,
            slot,
            position,
            hp,
            energy,
            budget: ActionBudget::full(),
            active: hp > 0,
            moving: false,
        }
    }

    /// Whether the unit still has hit points.
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Makes every action available again. Called at the start of a turn.
    pub fn reset_actions(&mut self) {
        self.budget.reset();
    }

    /// Applies damage, clamping hit points at zero.
    ///
    /// Returns `true` when this hit destroyed the unit. A destroyed unit is
    /// permanently inactive.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        if !self.is_alive() {
            return false;
        }

        self.hp = self.hp.saturating_sub(amount);
        log::debug!("{} took {} damage, {} hp left", self.name, amount, self.hp);

        if self.hp == 0 {
            self.active = false;
            log::info!("{} has been destroyed", self.name);
            true
        } else {
            false
        }
    }

    /// Consumes energy if enough is available.
    pub fn spend_energy(&mut self, amount: u32) -> bool {
        if self.energy < amount {
            return false;
        }
        self.energy -= amount;
        true
    }
}

/// Result of applying damage through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReport {
    pub remaining_hp: u32,
    pub destroyed: bool,
}

/// Owner of both rosters plus a coordinate index of living units.
///
/// Rosters are fixed once the match is set up: units are never removed, a
/// destroyed unit only leaves the coordinate index.
#[derive(Debug, Clone, Default)]
pub struct UnitRegistry {
    units: HashMap<UnitId, Unit>,
    rosters: [Vec<UnitId>; 2],
    position_index: HashMap<GridCoordinate, UnitId>,
}

impl UnitRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds both rosters from their spawn points.
    ///
    /// # Examples
    ///
    /// ```
    /// use tactica::{GridCoordinate, Team, UnitRegistry};
    ///
    /// let spawns = [
    ///     vec![GridCoordinate::new(4, 3)],
    ///     vec![GridCoordinate::new(4, 7)],
    /// ];
    /// let registry = UnitRegistry::with_rosters(&spawns, 5, 5).unwrap();
    /// assert_eq!(registry.roster(Team::One).len(), 1);
    /// assert!(registry.unit_at(GridCoordinate::new(4, 7)).is_some());
    /// ```
    pub fn with_rosters(
        spawns: &[Vec<GridCoordinate>; 2],
        hp: u32,
        energy: u32,
    ) -> TacticaResult<Self> {
        let mut registry = Self::new();
        for team in Team::ALL {
            for &position in &spawns[team.id() as usize] {
                registry.spawn(team, position, hp, energy)?;
            }
        }
        Ok(registry)
    }

    fn spawn(
        &mut self,
        team: Team,
        position: GridCoordinate,
        hp: u32,
        energy: u32,
    ) -> TacticaResult<UnitId> {
        if self.position_index.contains_key(&position) {
            return Err(TacticaError::InvalidState(format!(
                "spawn point {position} is already occupied"
            )));
        }

        let roster = &mut self.rosters[team.id() as usize];
        let unit = Unit::new(team, roster.len(), position, hp, energy);
        let id = unit.id;

        log::debug!("Spawned {} at {}", unit.name, position);
        roster.push(id);
        if unit.is_alive() {
            self.position_index.insert(position, id);
        }
        self.units.insert(id, unit);
        Ok(id)
    }

    /// Gets a unit by id.
    pub fn get(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    /// Unit ids of a team in roster order.
    pub fn roster(&self, team: Team) -> &[UnitId] {
        &self.rosters[team.id() as usize]
    }

    /// Gets the unit in a roster slot.
    pub fn unit_in_slot(&self, team: Team, slot: usize) -> Option<&Unit> {
        self.roster(team)
            .get(slot)
            .and_then(|id| self.units.get(id))
    }

    pub(crate) fn unit_in_slot_mut(&mut self, team: Team, slot: usize) -> Option<&mut Unit> {
        let id = *self.rosters[team.id() as usize].get(slot)?;
        self.units.get_mut(&id)
    }

    /// Iterates over every unit, team zero first, in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &Unit> + '_ {
        self.rosters
            .iter()
            .flatten()
            .filter_map(move |id| self.units.get(id))
    }

    /// Gets the living unit standing on a coordinate.
    pub fn unit_at(&self, coord: GridCoordinate) -> Option<&Unit> {
        self.position_index
            .get(&coord)
            .and_then(|id| self.units.get(id))
    }

    /// Moves a living unit, keeping the coordinate index in sync.
    pub fn set_position(&mut self, id: UnitId, position: GridCoordinate) -> TacticaResult<()> {
        if let Some(&other) = self.position_index.get(&position) {
            if other != id {
                return Err(TacticaError::InvalidState(format!(
                    "coordinate {position} is already occupied"
                )));
            }
        }

        let unit = self
            .units
            .get_mut(&id)
            .ok_or_else(|| TacticaError::InvalidState(format!("unit {id} not found")))?;
        if !unit.is_alive() {
            return Err(TacticaError::InvalidState(format!(
                "{} is destroyed and cannot move",
                unit.name
            )));
        }

        self.position_index.remove(&unit.position);
        unit.position = position;
        self.position_index.insert(position, id);
        Ok(())
    }

    /// Applies damage to a unit, freeing its coordinate when destroyed.
    pub fn apply_damage(&mut self, id: UnitId, amount: u32) -> Option<DamageReport> {
        let unit = self.units.get_mut(&id)?;
        let destroyed = unit.take_damage(amount);
        let report = DamageReport {
            remaining_hp: unit.hp,
            destroyed,
        };

        if destroyed {
            let position = unit.position;
            if self.position_index.get(&position) == Some(&id) {
                self.position_index.remove(&position);
            }
        }
        Some(report)
    }

    /// Number of units on a team with hit points left.
    pub fn alive_count(&self, team: Team) -> usize {
        self.roster(team)
            .iter()
            .filter_map(|id| self.units.get(id))
            .filter(|unit| unit.is_alive())
            .count()
    }

    /// Reactivates every living unit of a team.
    pub fn reactivate_team(&mut self, team: Team) {
        for id in &self.rosters[team.id() as usize] {
            if let Some(unit) = self.units.get_mut(id) {
                if unit.is_alive() {
                    unit.active = true;
                }
            }
        }
    }
}

impl Occupancy for UnitRegistry {
    fn is_occupied(&self, coord: GridCoordinate) -> bool {
        self.position_index.contains_key(&coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> UnitRegistry {
        let spawns = [
            vec![GridCoordinate::new(0, 0), GridCoordinate::new(1, 0)],
            vec![GridCoordinate::new(0, 2), GridCoordinate::new(1, 2)],
        ];
        UnitRegistry::with_rosters(&spawns, 5, 5).unwrap()
    }

    #[test]
    fn test_budget_spend_and_reset() {
        let mut budget = ActionBudget::full();
        budget.spend(ActionKind::Move);
        budget.spend(ActionKind::Attack);
        assert!(!budget.allows(ActionKind::Move));
        assert!(budget.allows(ActionKind::Skill));
        assert!(!budget.is_exhausted());

        budget.spend(ActionKind::Skill);
        assert!(budget.is_exhausted());

        budget.reset();
        assert_eq!(budget, ActionBudget::full());
    }

    #[test]
    fn test_unit_damage_clamps_at_zero() {
        let mut unit = Unit::new(Team::Zero, 0, GridCoordinate::new(0, 0), 2, 5);
        assert!(!unit.take_damage(1));
        assert_eq!(unit.hp, 1);
        assert!(unit.take_damage(5));
        assert_eq!(unit.hp, 0);
        assert!(!unit.active);

        // Further damage on a destroyed unit does nothing
        assert!(!unit.take_damage(1));
        assert_eq!(unit.hp, 0);
    }

    #[test]
    fn test_unit_energy() {
        let mut unit = Unit::new(Team::One, 2, GridCoordinate::new(0, 0), 5, 5);
        assert_eq!(unit.name, "Team1_Robot_2");
        assert!(unit.spend_energy(3));
        assert!(!unit.spend_energy(3));
        assert_eq!(unit.energy, 2);
    }

    #[test]
    fn test_registry_rosters() {
        let registry = two_by_two();
        assert_eq!(registry.roster(Team::Zero).len(), 2);
        assert_eq!(registry.unit_in_slot(Team::One, 1).unwrap().slot, 1);
        assert_eq!(registry.iter().count(), 4);
        assert_eq!(registry.alive_count(Team::Zero), 2);
    }

    #[test]
    fn test_registry_rejects_shared_spawn() {
        let spawns = [vec![GridCoordinate::new(0, 0)], vec![GridCoordinate::new(0, 0)]];
        assert!(UnitRegistry::with_rosters(&spawns, 5, 5).is_err());
    }

    #[test]
    fn test_set_position_updates_index() {
        let mut registry = two_by_two();
        let id = registry.roster(Team::Zero)[0];
        let target = GridCoordinate::new(3, 3);

        registry.set_position(id, target).unwrap();
        assert!(registry.is_occupied(target));
        assert!(!registry.is_occupied(GridCoordinate::new(0, 0)));
        assert_eq!(registry.unit_at(target).unwrap().id, id);

        // Cannot move onto another unit
        assert!(registry.set_position(id, GridCoordinate::new(1, 0)).is_err());
    }

    #[test]
    fn test_destroyed_unit_frees_coordinate() {
        let mut registry = two_by_two();
        let id = registry.roster(Team::One)[0];
        let report = registry.apply_damage(id, 10).unwrap();

        assert!(report.destroyed);
        assert_eq!(report.remaining_hp, 0);
        assert!(!registry.is_occupied(GridCoordinate::new(0, 2)));
        assert_eq!(registry.roster(Team::One).len(), 2);
        assert_eq!(registry.alive_count(Team::One), 1);
    }

    #[test]
    fn test_reactivate_skips_destroyed_units() {
        let mut registry = two_by_two();
        let dead = registry.roster(Team::Zero)[0];
        let skipped = registry.roster(Team::Zero)[1];
        registry.apply_damage(dead, 5);
        registry.get_mut(skipped).unwrap().active = false;

        registry.reactivate_team(Team::Zero);
        assert!(!registry.get(dead).unwrap().active);
        assert!(registry.get(skipped).unwrap().active);
    }
}
