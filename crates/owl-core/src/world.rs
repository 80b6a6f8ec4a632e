//! World contract consumed by the learner
//!
//! A world is whatever produces player coordinates and accepts directional
//! input: an emulator binding, a scripted replay, or the in-memory
//! [`GridWorld`](crate::grid::GridWorld). The learner only ever needs the two
//! primitives below and treats every failure they report as terminal.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Action, State};

/// How long an input is held and how long the world idles afterwards, in ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputTiming {
    pub hold_ticks: u32,
    pub settle_ticks: u32,
}

impl InputTiming {
    pub const fn new(hold_ticks: u32, settle_ticks: u32) -> Self {
        Self {
            hold_ticks,
            settle_ticks,
        }
    }

    /// Total ticks one input consumes
    pub const fn total_ticks(&self) -> u64 {
        self.hold_ticks as u64 + self.settle_ticks as u64
    }
}

impl Default for InputTiming {
    fn default() -> Self {
        Self::new(5, 20)
    }
}

/// Black-box simulation the agent acts in.
///
/// Both calls are synchronous. `execute` must not return until the world has
/// fully settled, so the next `read_state` never observes a half-finished move.
pub trait World {
    /// Snapshot of the player's tile and map
    fn read_state(&mut self) -> Result<State>;

    /// Hold `action` for `timing.hold_ticks`, release it, then idle for
    /// `timing.settle_ticks`
    fn execute(&mut self, action: Action, timing: InputTiming) -> Result<()>;
}

impl<W: World + ?Sized> World for &mut W {
    fn read_state(&mut self) -> Result<State> {
        (**self).read_state()
    }

    fn execute(&mut self, action: Action, timing: InputTiming) -> Result<()> {
        (**self).execute(action, timing)
    }
}

impl<W: World + ?Sized> World for Box<W> {
    fn read_state(&mut self) -> Result<State> {
        (**self).read_state()
    }

    fn execute(&mut self, action: Action, timing: InputTiming) -> Result<()> {
        (**self).execute(action, timing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OwlError;

    struct Stuck {
        state: State,
        inputs: Vec<(Action, InputTiming)>,
    }

    impl World for Stuck {
        fn read_state(&mut self) -> Result<State> {
            Ok(self.state)
        }

        fn execute(&mut self, action: Action, timing: InputTiming) -> Result<()> {
            self.inputs.push((action, timing));
            Ok(())
        }
    }

    struct Broken;

    impl World for Broken {
        fn read_state(&mut self) -> Result<State> {
            Err(OwlError::world("no memory"))
        }

        fn execute(&mut self, _: Action, _: InputTiming) -> Result<()> {
            Err(OwlError::world("no input"))
        }
    }

    #[test]
    fn test_default_timing() {
        let timing = InputTiming::default();
        assert_eq!(timing.hold_ticks, 5);
        assert_eq!(timing.settle_ticks, 20);
        assert_eq!(timing.total_ticks(), 25);
    }

    #[test]
    fn test_timing_partial_deserialize() {
        let timing: InputTiming = serde_json::from_str(r#"{"settle_ticks": 60}"#).unwrap();
        assert_eq!(timing, InputTiming::new(5, 60));
    }

    fn drive<W: World>(mut world: W) -> State {
        world.execute(Action::Left, InputTiming::default()).unwrap();
        world.read_state().unwrap()
    }

    #[test]
    fn test_world_through_mut_ref() {
        let mut world = Stuck {
            state: State::new(1, 2, 3),
            inputs: Vec::new(),
        };

        assert_eq!(drive(&mut world), State::new(1, 2, 3));
        assert_eq!(drive(&mut world), State::new(1, 2, 3));
        assert_eq!(world.inputs.len(), 2);
        assert_eq!(world.inputs[0], (Action::Left, InputTiming::default()));
    }

    #[test]
    fn test_boxed_world_propagates_errors() {
        let mut world: Box<dyn World> = Box::new(Broken);
        assert!(matches!(world.read_state(), Err(OwlError::World(_))));
        assert!(matches!(
            world.execute(Action::Up, InputTiming::default()),
            Err(OwlError::World(_))
        ));
    }
}
