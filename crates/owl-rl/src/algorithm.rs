//! Action selection and value updates

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use owl_core::{Action, OwlError, Result, Reward, State};

use crate::table::ValueTable;

/// Trait for tabular control algorithms.
///
/// The value table is passed in on every call rather than owned, so a single
/// table can outlive the algorithm instance and be persisted independently.
pub trait TabularAlgorithm {
    /// Algorithm name
    fn name(&self) -> &str;

    /// Pick an action for `state`, inserting a zeroed row if the state is new
    fn select_action(&mut self, table: &mut ValueTable, state: State) -> Action;

    /// Apply one transition to the table and return the TD error
    fn update(
        &self,
        table: &mut ValueTable,
        state: State,
        action: Action,
        reward: Reward,
        next_state: State,
    ) -> f64;

    /// Called by the trainer after every episode
    fn end_episode(&mut self) {}

    /// Get algorithm parameters as JSON
    fn params(&self) -> serde_json::Value;
}

/// Hyperparameters for [`QLearning`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QLearningParams {
    /// Step size α
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Discount factor γ
    #[serde(default = "default_discount_factor")]
    pub discount_factor: f64,

    /// Exploration rate ε
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Multiplier applied to ε after each episode (1.0 keeps it fixed)
    #[serde(default = "default_epsilon_decay")]
    pub epsilon_decay: f64,

    /// Floor for the decayed ε
    #[serde(default)]
    pub min_epsilon: f64,

    /// Seed for exploration draws; unseeded runs use OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_learning_rate() -> f64 {
    0.1
}
fn default_discount_factor() -> f64 {
    0.9
}
fn default_epsilon() -> f64 {
    0.3
}
fn default_epsilon_decay() -> f64 {
    1.0
}

impl Default for QLearningParams {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            discount_factor: default_discount_factor(),
            epsilon: default_epsilon(),
            epsilon_decay: default_epsilon_decay(),
            min_epsilon: 0.0,
            seed: None,
        }
    }
}

impl QLearningParams {
    pub fn validate(&self) -> Result<()> {
        let unit = |name: &str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(OwlError::Config(format!(
                    "{name} must be within [0, 1], got {value}"
                )))
            }
        };

        unit("learning_rate", self.learning_rate)?;
        unit("discount_factor", self.discount_factor)?;
        unit("epsilon", self.epsilon)?;
        unit("epsilon_decay", self.epsilon_decay)?;
        unit("min_epsilon", self.min_epsilon)?;

        if self.learning_rate == 0.0 {
            return Err(OwlError::Config("learning_rate must be positive".to_string()));
        }
        if self.epsilon_decay == 0.0 {
            return Err(OwlError::Config("epsilon_decay must be positive".to_string()));
        }
        Ok(())
    }
}

/// Epsilon-greedy tabular Q-learning
pub struct QLearning {
    params: QLearningParams,
    epsilon: f64,
    rng: StdRng,
}

impl QLearning {
    pub fn new(params: QLearningParams) -> Result<Self> {
        params.validate()?;
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            epsilon: params.epsilon,
            params,
            rng,
        })
    }

    /// Current exploration rate
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn hyperparameters(&self) -> &QLearningParams {
        &self.params
    }

    /// Best known action for `state`, inserting a zeroed row if the state is new
    pub fn greedy_action(table: &mut ValueTable, state: State) -> Action {
        table.entry(state).best_action()
    }
}

impl Default for QLearning {
    fn default() -> Self {
        Self {
            params: QLearningParams::default(),
            epsilon: default_epsilon(),
            rng: StdRng::from_entropy(),
        }
    }
}

impl TabularAlgorithm for QLearning {
    fn name(&self) -> &str {
        "q_learning"
    }

    fn select_action(&mut self, table: &mut ValueTable, state: State) -> Action {
        let row = *table.entry(state);

        if self.rng.gen::<f64>() < self.epsilon {
            Action::ALL[self.rng.gen_range(0..Action::action_space_size())]
        } else {
            row.best_action()
        }
    }

    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    fn update(
        &self,
        table: &mut ValueTable,
        state: State,
        action: Action,
        reward: Reward,
        next_state: State,
    ) -> f64 {
        let max_next_q = table.entry(next_state).max_value();

        let row = table.entry(state);
        let current_q = row.get(action);
        let td_error = reward + self.params.discount_factor * max_next_q - current_q;
        row.set(action, current_q + self.params.learning_rate * td_error);

        td_error
    }

    fn end_episode(&mut self) {
        self.epsilon = (self.epsilon * self.params.epsilon_decay).max(self.params.min_epsilon);
    }

    fn params(&self) -> serde_json::Value {
        serde_json::json!({
            "learning_rate": self.params.learning_rate,
            "discount_factor": self.params.discount_factor,
            "epsilon": self.epsilon,
            "epsilon_decay": self.params.epsilon_decay,
            "min_epsilon": self.params.min_epsilon,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ActionValues;

    fn seeded(epsilon: f64) -> QLearning {
        QLearning::new(QLearningParams {
            epsilon,
            seed: Some(7),
            ..QLearningParams::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_params() {
        let params = QLearningParams::default();
        assert_eq!(params.learning_rate, 0.1);
        assert_eq!(params.discount_factor, 0.9);
        assert_eq!(params.epsilon, 0.3);
        assert_eq!(params.epsilon_decay, 1.0);
        assert!(params.seed.is_none());
    }

    #[test]
    fn test_params_partial_deserialize() {
        let params: QLearningParams = serde_json::from_str(r#"{"epsilon": 0.05}"#).unwrap();
        assert_eq!(params.epsilon, 0.05);
        assert_eq!(params.learning_rate, 0.1);
    }

    #[test]
    fn test_invalid_params_rejected() {
        for params in [
            QLearningParams {
                epsilon: 1.5,
                ..QLearningParams::default()
            },
            QLearningParams {
                learning_rate: 0.0,
                ..QLearningParams::default()
            },
            QLearningParams {
                discount_factor: -0.1,
                ..QLearningParams::default()
            },
            QLearningParams {
                epsilon_decay: 0.0,
                ..QLearningParams::default()
            },
        ] {
            assert!(matches!(QLearning::new(params), Err(OwlError::Config(_))));
        }
    }

    #[test]
    fn test_update_from_zero() {
        let algo = seeded(0.3);
        let mut table = ValueTable::new();
        let s = State::new(5, 5, 0);
        let next = State::new(6, 5, 0);

        let td_error = algo.update(&mut table, s, Action::Right, 1.0, next);

        assert_eq!(td_error, 1.0);
        assert_eq!(table.get(&s).unwrap().get(Action::Right), 0.1);
        assert_eq!(*table.get(&next).unwrap(), ActionValues::new());
    }

    #[test]
    fn test_update_bootstraps_from_next_state() {
        let algo = seeded(0.3);
        let mut table = ValueTable::new();
        let s = State::new(0, 0, 0);
        let next = State::new(0, 1, 0);
        table.entry(next).set(Action::Down, 2.0);
        table.entry(next).set(Action::Up, 1.0);

        algo.update(&mut table, s, Action::Down, 0.0, next);

        // 0.0 + 0.1 * (0.0 + 0.9 * 2.0 - 0.0)
        let q = table.get(&s).unwrap().get(Action::Down);
        assert!((q - 0.18).abs() < 1e-12);
    }

    #[test]
    fn test_update_self_loop_uses_pre_update_max() {
        let algo = seeded(0.3);
        let mut table = ValueTable::new();
        let s = State::new(3, 3, 0);
        table.entry(s).set(Action::Left, 1.0);

        algo.update(&mut table, s, Action::Left, -0.05, s);

        // 1.0 + 0.1 * (-0.05 + 0.9 * 1.0 - 1.0)
        let q = table.get(&s).unwrap().get(Action::Left);
        assert!((q - 0.985).abs() < 1e-12);
    }

    #[test]
    fn test_select_inserts_unseen_state() {
        let mut algo = seeded(0.3);
        let mut table = ValueTable::new();
        let s = State::new(1, 2, 3);

        algo.select_action(&mut table, s);

        assert_eq!(table.len(), 1);
        assert_eq!(*table.get(&s).unwrap(), ActionValues::new());
    }

    #[test]
    fn test_greedy_selection_without_exploration() {
        let mut algo = seeded(0.0);
        let mut table = ValueTable::new();
        let s = State::new(1, 1, 0);
        table.entry(s).set(Action::Left, 0.4);

        for _ in 0..50 {
            assert_eq!(algo.select_action(&mut table, s), Action::Left);
        }
    }

    #[test]
    fn test_greedy_ties_pick_first_action() {
        let mut algo = seeded(0.0);
        let mut table = ValueTable::new();
        assert_eq!(algo.select_action(&mut table, State::new(0, 0, 0)), Action::Up);
    }

    #[test]
    fn test_full_exploration_covers_all_actions() {
        let mut algo = seeded(1.0);
        let mut table = ValueTable::new();
        let s = State::new(1, 1, 0);
        table.entry(s).set(Action::Left, 10.0);

        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[algo.select_action(&mut table, s).index()] = true;
        }
        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = seeded(0.5);
        let mut b = seeded(0.5);
        let mut table = ValueTable::new();
        let s = State::new(4, 4, 0);

        let picks_a: Vec<Action> = (0..32).map(|_| a.select_action(&mut table, s)).collect();
        let picks_b: Vec<Action> = (0..32).map(|_| b.select_action(&mut table, s)).collect();
        assert_eq!(picks_a, picks_b);
    }

    #[test]
    fn test_epsilon_decay() {
        let mut algo = QLearning::new(QLearningParams {
            epsilon: 0.5,
            epsilon_decay: 0.5,
            min_epsilon: 0.1,
            ..QLearningParams::default()
        })
        .unwrap();

        algo.end_episode();
        assert_eq!(algo.epsilon(), 0.25);
        algo.end_episode();
        algo.end_episode();
        assert_eq!(algo.epsilon(), 0.1);
    }

    #[test]
    fn test_fixed_epsilon_by_default() {
        let mut algo = seeded(0.3);
        for _ in 0..10 {
            algo.end_episode();
        }
        assert_eq!(algo.epsilon(), 0.3);
    }

    #[test]
    fn test_params_json() {
        let algo = seeded(0.3);
        let params = algo.params();
        assert_eq!(params["learning_rate"], 0.1);
        assert_eq!(params["epsilon"], 0.3);
        assert_eq!(algo.name(), "q_learning");
    }
}
