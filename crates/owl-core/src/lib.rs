//! OWL Core - Core types, traits, and shared functionality
//!
//! This crate provides the foundational types used across all OWL components:
//! the discrete state key, the closed action set, the error taxonomy, and the
//! `World` contract the learner drives.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod grid;
pub mod types;
pub mod world;

pub use error::{OwlError, Result};
pub use grid::{GridWorld, MapLayout, SpawnPoint, WarpLayout, WorldLayout};
pub use types::*;
pub use world::{InputTiming, World};
