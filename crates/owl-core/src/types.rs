//! State, Action, and Reward types shared across OWL

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OwlError;

/// Reward value produced by a single environment step
pub type Reward = f64;

/// Discrete observation of the world: player tile plus the map it sits on.
///
/// States are plain value keys. Two states are equal exactly when all three
/// fields are equal, and the hash is derived from the same three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct State {
    pub x: u32,
    pub y: u32,
    pub map_id: u32,
}

impl State {
    pub const fn new(x: u32, y: u32, map_id: u32) -> Self {
        Self { x, y, map_id }
    }

    /// Tile coordinates without the map
    pub const fn position(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

impl From<(u32, u32, u32)> for State {
    fn from((x, y, map_id): (u32, u32, u32)) -> Self {
        Self { x, y, map_id }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, map {})", self.x, self.y, self.map_id)
    }
}

/// Directional input. The set is closed; its declaration order is the
/// canonical order used for indexing and greedy tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in canonical order
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    /// Position of this action in the canonical order
    pub const fn index(self) -> usize {
        match self {
            Action::Up => 0,
            Action::Down => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }

    /// Create action from index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Number of discrete actions
    pub const fn action_space_size() -> usize {
        Self::ALL.len()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = OwlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| OwlError::InvalidAction(s.to_string()))
    }
}

impl TryFrom<usize> for Action {
    type Error = OwlError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index).ok_or_else(|| OwlError::InvalidAction(format!("index {index}")))
    }
}
