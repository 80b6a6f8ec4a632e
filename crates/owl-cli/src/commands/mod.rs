//! CLI command modules

pub mod config;
pub mod evaluate;
pub mod inspect;
pub mod train;

use std::path::Path;

use anyhow::{Context, Result};
use owl_core::GridWorld;

use crate::config::Config;

/// Load configuration from an explicit file or from the default search path
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(Some(path)),
        None => Config::load(),
    }
}

/// Build the grid world named by the config, falling back to the demo layout
pub fn build_world(layout: Option<&Path>) -> Result<GridWorld> {
    match layout {
        Some(path) => GridWorld::from_file(path)
            .with_context(|| format!("Failed to load world layout {}", path.display())),
        None => GridWorld::demo().context("Failed to build demo world"),
    }
}
