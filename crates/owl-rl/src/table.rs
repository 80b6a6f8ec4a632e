//! State-action value table
//!
//! Rows are created lazily: the first time a state is seen, it gets a fresh
//! row with all four actions at `0.0`. Rows are never removed.

use std::collections::hash_map::{self, HashMap};
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use owl_core::{Action, State};

/// Q-values for the four actions of a single state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "NamedValues", into = "NamedValues")]
pub struct ActionValues([f64; 4]);

/// Wire shape of a row: every action is named and required
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct NamedValues {
    up: f64,
    down: f64,
    left: f64,
    right: f64,
}

impl From<NamedValues> for ActionValues {
    fn from(v: NamedValues) -> Self {
        Self([v.up, v.down, v.left, v.right])
    }
}

impl From<ActionValues> for NamedValues {
    fn from(ActionValues([up, down, left, right]): ActionValues) -> Self {
        Self {
            up,
            down,
            left,
            right,
        }
    }
}

impl ActionValues {
    /// Fresh row with every action at `0.0`
    pub const fn new() -> Self {
        Self([0.0; 4])
    }

    pub const fn from_array(values: [f64; 4]) -> Self {
        Self(values)
    }

    pub const fn as_array(&self) -> &[f64; 4] {
        &self.0
    }

    pub fn get(&self, action: Action) -> f64 {
        self.0[action.index()]
    }

    pub fn set(&mut self, action: Action, value: f64) {
        self.0[action.index()] = value;
    }

    /// Largest value in the row
    pub fn max_value(&self) -> f64 {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Action with the largest value; ties go to the earliest action in
    /// canonical order
    pub fn best_action(&self) -> Action {
        let mut best = Action::ALL[0];
        for action in Action::ALL.into_iter().skip(1) {
            if self.get(action) > self.get(best) {
                best = action;
            }
        }
        best
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, f64)> + '_ {
        Action::ALL.into_iter().map(move |a| (a, self.get(a)))
    }

    /// True when every value is a finite number
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl Index<Action> for ActionValues {
    type Output = f64;

    fn index(&self, action: Action) -> &f64 {
        &self.0[action.index()]
    }
}

impl IndexMut<Action> for ActionValues {
    fn index_mut(&mut self, action: Action) -> &mut f64 {
        &mut self.0[action.index()]
    }
}

/// Mapping from state to its action values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    rows: HashMap<State, ActionValues>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Row for `state`, inserting a zeroed row first if the state is new
    pub fn entry(&mut self, state: State) -> &mut ActionValues {
        self.rows.entry(state).or_insert_with(ActionValues::new)
    }

    /// Row for `state` without inserting
    pub fn get(&self, state: &State) -> Option<&ActionValues> {
        self.rows.get(state)
    }

    pub fn contains(&self, state: &State) -> bool {
        self.rows.contains_key(state)
    }

    /// Store a complete row, returning the row it replaced
    pub fn insert(&mut self, state: State, values: ActionValues) -> Option<ActionValues> {
        self.rows.insert(state, values)
    }

    /// Number of states in the table
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, State, ActionValues> {
        self.rows.iter()
    }

    /// All rows ordered by state
    pub fn sorted_entries(&self) -> Vec<(State, ActionValues)> {
        let mut entries: Vec<_> = self.rows.iter().map(|(s, v)| (*s, *v)).collect();
        entries.sort_unstable_by_key(|(state, _)| *state);
        entries
    }
}

impl<'a> IntoIterator for &'a ValueTable {
    type Item = (&'a State, &'a ActionValues);
    type IntoIter = hash_map::Iter<'a, State, ActionValues>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl FromIterator<(State, ActionValues)> for ValueTable {
    fn from_iter<I: IntoIterator<Item = (State, ActionValues)>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
