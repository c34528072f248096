//! # Command Definitions
//!
//! Discrete requests presentation feeds into a [`Match`](crate::Match).

use crate::{ActionKind, GridCoordinate, TacticaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single request against the running match.
///
/// Commands serialize to JSON so a whole skirmish can be scripted:
///
/// ```
/// use tactica::{ActionKind, Command, GridCoordinate};
///
/// let script = r#"[
///     {"command": "select_action", "args": "Move"},
///     {"command": "target", "args": {"x": 4, "y": 6}},
///     {"command": "skip_turn"}
/// ]"#;
/// let commands = Command::load_script(script).unwrap();
/// assert_eq!(commands[0], Command::SelectAction(ActionKind::Move));
/// assert_eq!(commands[1], Command::Target(GridCoordinate::new(4, 6)));
/// assert_eq!(commands[2], Command::SkipTurn);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "args", rename_all = "snake_case")]
pub enum Command {
    /// Select the pending action of the acting unit
    SelectAction(ActionKind),
    /// Resolve the pending action against a tile
    Target(GridCoordinate),
    /// Deactivate the acting unit and pass the turn
    SkipTurn,
    /// Pass the turn without deactivating
    EndTurn,
}

impl Command {
    /// Parses a JSON array of commands.
    pub fn load_script(json: &str) -> TacticaResult<Vec<Command>> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a command script from disk.
    pub fn load_script_file(path: impl AsRef<Path>) -> TacticaResult<Vec<Command>> {
        let json = std::fs::read_to_string(path)?;
        Self::load_script(&json)
    }

    /// Serializes commands as a JSON array.
    pub fn to_script(commands: &[Command]) -> TacticaResult<String> {
        Ok(serde_json::to_string_pretty(commands)?)
    }
}
