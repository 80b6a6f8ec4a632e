//! Exploration environment
//!
//! Wraps a [`World`] and turns its raw position readings into transitions.
//! Reward shaping favours reaching tiles and maps the agent has not seen in
//! the current episode:
//!
//! - tile term: `+new_tile` for a novel tile, `-revisit_penalty` otherwise
//!   (what counts as novel depends on [`RewardMode`])
//! - map term: `+new_map_bonus` when the map changed and the new map has not
//!   been visited this episode
//!
//! There is no terminal condition; `done` is always `false` and the caller
//! bounds episode length.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use owl_core::{Action, InputTiming, OwlError, Result, Reward, State, World};

/// How the tile term of the reward is decided. Exactly one mode is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RewardMode {
    /// Novel means the `(x, y, map)` triple is not yet in this episode's visited set
    #[default]
    VisitedSet,
    /// Novel means `(x, y)` differs from the previous step's `(x, y)`; the map is ignored
    LastPosition,
}

impl RewardMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            RewardMode::VisitedSet => "visited-set",
            RewardMode::LastPosition => "last-position",
        }
    }
}

impl fmt::Display for RewardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RewardMode {
    type Err = OwlError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "visited" | "visited-set" => Ok(RewardMode::VisitedSet),
            "last-position" | "position" => Ok(RewardMode::LastPosition),
            other => Err(OwlError::Config(format!("unknown reward mode: {other}"))),
        }
    }
}

/// Reward magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub new_tile: f64,
    pub revisit_penalty: f64,
    pub new_map_bonus: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            new_tile: 1.0,
            revisit_penalty: 0.05,
            new_map_bonus: 3.0,
        }
    }
}

/// Environment settings
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub reward_mode: RewardMode,
    pub rewards: RewardConfig,
    pub timing: InputTiming,
}

/// Outcome of a single step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: State,
    pub reward: Reward,
    pub done: bool,
}

/// Reward-shaping wrapper around a world
pub struct Environment<W> {
    world: W,
    config: EnvironmentConfig,
    visited: HashSet<State>,
    visited_maps: HashSet<u32>,
    last_position: Option<(u32, u32)>,
    last_map: Option<u32>,
}

impl<W: World> Environment<W> {
    pub fn new(world: W, config: EnvironmentConfig) -> Self {
        Self {
            world,
            config,
            visited: HashSet::new(),
            visited_maps: HashSet::new(),
            last_position: None,
            last_map: None,
        }
    }

    /// Environment with default rewards and timing
    pub fn with_mode(world: W, reward_mode: RewardMode) -> Self {
        Self::new(
            world,
            EnvironmentConfig {
                reward_mode,
                ..EnvironmentConfig::default()
            },
        )
    }

    /// Start a new episode from wherever the world currently is.
    ///
    /// The current state becomes the only visited tile (none in
    /// [`RewardMode::LastPosition`]) and its map the only visited map.
    pub fn reset(&mut self) -> Result<State> {
        let state = self.world.read_state()?;

        self.visited.clear();
        if self.config.reward_mode == RewardMode::VisitedSet {
            self.visited.insert(state);
        }
        self.visited_maps.clear();
        self.visited_maps.insert(state.map_id);
        self.last_position = Some(state.position());
        self.last_map = Some(state.map_id);

        debug!("Environment reset at {}", state);
        Ok(state)
    }

    /// Execute `action`, wait for the world to settle, and score the new state
    pub fn step(&mut self, action: Action) -> Result<Step> {
        self.world.execute(action, self.config.timing)?;
        let state = self.world.read_state()?;
        let rewards = self.config.rewards;
        let mut reward = 0.0;

        match self.config.reward_mode {
            RewardMode::VisitedSet => {
                if self.visited.insert(state) {
                    reward += rewards.new_tile;
                } else {
                    reward -= rewards.revisit_penalty;
                }
            }
            RewardMode::LastPosition => {
                // Without a previous reading there is nothing to compare against
                if let Some(last) = self.last_position {
                    if state.position() != last {
                        reward += rewards.new_tile;
                    } else {
                        reward -= rewards.revisit_penalty;
                    }
                }
            }
        }
        self.last_position = Some(state.position());

        if self.last_map != Some(state.map_id) && !self.visited_maps.contains(&state.map_id) {
            reward += rewards.new_map_bonus;
            self.visited_maps.insert(state.map_id);
        }
        self.last_map = Some(state.map_id);

        debug!("Step {} -> {}, reward {:.2}", action, state, reward);

        Ok(Step {
            state,
            reward,
            done: false,
        })
    }

    /// Parse an action name and step with it. Unknown names fail before the
    /// world is touched.
    pub fn step_named(&mut self, action: &str) -> Result<Step> {
        let action: Action = action.parse()?;
        self.step(action)
    }

    /// Distinct states seen this episode
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Distinct maps seen this episode
    pub fn maps_visited_count(&self) -> usize {
        self.visited_maps.len()
    }

    pub fn is_visited(&self, state: &State) -> bool {
        self.visited.contains(state)
    }

    pub fn is_map_visited(&self, map_id: u32) -> bool {
        self.visited_maps.contains(&map_id)
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    /// Replays a fixed list of positions, one per executed input
    struct Replay {
        current: State,
        upcoming: VecDeque<State>,
        executed: Vec<Action>,
    }

    impl Replay {
        fn new(start: (u32, u32, u32), upcoming: &[(u32, u32, u32)]) -> Self {
            Self {
                current: start.into(),
                upcoming: upcoming.iter().map(|s| State::from(*s)).collect(),
                executed: Vec::new(),
            }
        }
    }

    impl World for Replay {
        fn read_state(&mut self) -> Result<State> {
            Ok(self.current)
        }

        fn execute(&mut self, action: Action, _timing: InputTiming) -> Result<()> {
            self.executed.push(action);
            if let Some(next) = self.upcoming.pop_front() {
                self.current = next;
            }
            Ok(())
        }
    }

    fn rewards(env: &mut Environment<Replay>, steps: usize) -> Vec<f64> {
        (0..steps)
            .map(|_| env.step(Action::Right).unwrap().reward)
            .collect()
    }

    #[test]
    fn test_reset_seeds_visited_sets() {
        let mut env = Environment::with_mode(Replay::new((5, 5, 0), &[]), RewardMode::VisitedSet);
        let state = env.reset().unwrap();

        assert_eq!(state, State::new(5, 5, 0));
        assert_eq!(env.visited_count(), 1);
        assert!(env.is_visited(&state));
        assert_eq!(env.maps_visited_count(), 1);
        assert!(env.is_map_visited(0));
    }

    #[test]
    fn test_reset_in_last_position_mode_clears_visited() {
        let mut env = Environment::with_mode(Replay::new((5, 5, 0), &[]), RewardMode::LastPosition);
        env.reset().unwrap();

        assert_eq!(env.visited_count(), 0);
        assert_eq!(env.maps_visited_count(), 1);
    }

    #[test]
    fn test_visited_set_rewards() {
        let world = Replay::new((5, 5, 0), &[(6, 5, 0), (7, 5, 0), (6, 5, 0), (5, 5, 0)]);
        let mut env = Environment::with_mode(world, RewardMode::VisitedSet);
        env.reset().unwrap();

        assert_eq!(rewards(&mut env, 4), vec![1.0, 1.0, -0.05, -0.05]);
        assert_eq!(env.visited_count(), 3);
    }

    #[test]
    fn test_standing_still_is_penalised() {
        let world = Replay::new((5, 5, 0), &[(5, 5, 0)]);
        let mut env = Environment::with_mode(world, RewardMode::VisitedSet);
        env.reset().unwrap();

        assert_eq!(env.step(Action::Up).unwrap().reward, -0.05);
    }

    #[test]
    fn test_last_position_rewards() {
        let world = Replay::new((5, 5, 0), &[(6, 5, 0), (6, 5, 0), (5, 5, 0), (5, 5, 1)]);
        let mut env = Environment::with_mode(world, RewardMode::LastPosition);
        env.reset().unwrap();

        // moving back onto an old tile still counts as movement
        // (5, 5, 1) has the same (x, y) as the previous step but is a new map
        assert_eq!(rewards(&mut env, 4), vec![1.0, -0.05, 1.0, -0.05 + 3.0]);
        assert_eq!(env.visited_count(), 0);
    }

    #[test]
    fn test_new_map_bonus() {
        let world = Replay::new((5, 5, 0), &[(0, 0, 1), (1, 0, 1), (5, 6, 0), (0, 0, 1)]);
        let mut env = Environment::with_mode(world, RewardMode::VisitedSet);
        env.reset().unwrap();

        let got = rewards(&mut env, 4);
        assert_eq!(got[0], 4.0);
        assert_eq!(got[1], 1.0);
        // back to the starting map, seeded at reset
        assert_eq!(got[2], 1.0);
        // map 1 again: no bonus, tile already visited
        assert_eq!(got[3], -0.05);
        assert_eq!(env.maps_visited_count(), 2);
    }

    #[test]
    fn test_done_is_always_false() {
        let world = Replay::new((0, 0, 0), &[(1, 0, 0), (0, 0, 9)]);
        let mut env = Environment::with_mode(world, RewardMode::VisitedSet);
        env.reset().unwrap();

        for _ in 0..5 {
            assert!(!env.step(Action::Down).unwrap().done);
        }
    }

    #[test]
    fn test_reset_starts_a_fresh_episode() {
        let world = Replay::new((5, 5, 0), &[(6, 5, 0), (0, 0, 1)]);
        let mut env = Environment::with_mode(world, RewardMode::VisitedSet);
        env.reset().unwrap();
        rewards(&mut env, 2);
        assert_eq!(env.visited_count(), 3);

        let state = env.reset().unwrap();
        assert_eq!(state, State::new(0, 0, 1));
        assert_eq!(env.visited_count(), 1);
        assert_eq!(env.maps_visited_count(), 1);
        assert!(!env.is_visited(&State::new(6, 5, 0)));
    }

    #[test]
    fn test_step_named() {
        let world = Replay::new((5, 5, 0), &[(5, 4, 0)]);
        let mut env = Environment::with_mode(world, RewardMode::VisitedSet);
        env.reset().unwrap();

        let step = env.step_named("up").unwrap();
        assert_eq!(step.state, State::new(5, 4, 0));
        assert_eq!(env.world().executed, vec![Action::Up]);
    }

    #[test]
    fn test_step_named_rejects_unknown_action() {
        let world = Replay::new((5, 5, 0), &[(5, 4, 0)]);
        let mut env = Environment::with_mode(world, RewardMode::VisitedSet);
        env.reset().unwrap();

        let err = env.step_named("select").unwrap_err();
        assert!(matches!(err, OwlError::InvalidAction(_)));
        assert!(env.world().executed.is_empty());
        assert_eq!(env.visited_count(), 1);
    }

    #[test]
    fn test_custom_rewards() {
        let world = Replay::new((0, 0, 0), &[(1, 0, 0), (1, 0, 0), (0, 0, 2)]);
        let config = EnvironmentConfig {
            rewards: RewardConfig {
                new_tile: 0.5,
                revisit_penalty: 0.25,
                new_map_bonus: 10.0,
            },
            ..EnvironmentConfig::default()
        };
        let mut env = Environment::new(world, config);
        env.reset().unwrap();

        assert_eq!(env.config(), &config);
        assert_eq!(rewards(&mut env, 3), vec![0.5, -0.25, 10.5]);
    }

    #[test]
    fn test_reward_mode_parse() {
        assert_eq!("visited".parse::<RewardMode>().unwrap(), RewardMode::VisitedSet);
        assert_eq!(
            "last_position".parse::<RewardMode>().unwrap(),
            RewardMode::LastPosition
        );
        assert!(matches!(
            "random".parse::<RewardMode>(),
            Err(OwlError::Config(_))
        ));
        assert_eq!(RewardMode::LastPosition.to_string(), "last-position");
    }

    #[test]
    fn test_config_deserialize() {
        let config: EnvironmentConfig = serde_json::from_str(
            r#"{"reward_mode": "last-position", "timing": {"settle_ticks": 60}}"#,
        )
        .unwrap();

        assert_eq!(config.reward_mode, RewardMode::LastPosition);
        assert_eq!(config.timing, InputTiming::new(5, 60));
        assert_eq!(config.rewards, RewardConfig::default());
    }
}
