//! Configuration management commands

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::{Config, DEFAULT_CONFIG};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Configuration file to read instead of the default search path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Initialize configuration file
    Init {
        /// Where to write the file
        #[arg(default_value = "owl.toml")]
        path: PathBuf,

        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands) -> Result<()> {
    match cmd {
        ConfigCommands::Show { config } => show(config.as_deref()),
        ConfigCommands::Init { path, force } => init(&path, force),
    }
}

fn show(path: Option<&Path>) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");

    let source = path.map(Path::to_path_buf).or_else(Config::find_config_file);
    match &source {
        Some(path) => println!("Config file: {}\n", path.display()),
        None => println!("No configuration file found. Using defaults.\n"),
    }

    let config = Config::load_from(source.as_deref())?;
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        println!("Configuration file already exists: {}", path.display());
        println!("Use --force to overwrite");
        return Ok(());
    }

    write_default(path)?;
    Config::from_file(path)?;
    println!("Configuration file created: {}", path.display());

    Ok(())
}

fn write_default(path: &Path) -> Result<()> {
    std::fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_init_writes_loadable_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("owl.toml");

        init(&path, false).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.training.num_episodes, 100);
    }

    #[test]
    fn test_init_keeps_existing_without_force() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("owl.toml");
        std::fs::write(&path, "[training]\nnum_episodes = 9\n").unwrap();

        init(&path, false).unwrap();
        assert_eq!(
            Config::from_file(&path).unwrap().training.num_episodes,
            9
        );

        init(&path, true).unwrap();
        assert_eq!(
            Config::from_file(&path).unwrap().training.num_episodes,
            100
        );
    }
}
