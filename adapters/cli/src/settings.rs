use std::{fs, path::Path};

use anyhow::{Context, Result};
use siege_sim_core::{ArenaConfig, ArenaSettings};

/// Settings document shipped with the binary.
pub(crate) const BUNDLED_SETTINGS: &str = include_str!("../config/arena.toml");

/// Loads and validates the arena configuration.
///
/// Falls back to the bundled document when no path is given.
pub(crate) fn load(path: Option<&Path>) -> Result<ArenaConfig> {
    let contents = match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read settings from {}", path.display()))?,
        None => BUNDLED_SETTINGS.to_owned(),
    };
    parse(&contents)
}

pub(crate) fn parse(contents: &str) -> Result<ArenaConfig> {
    let settings: ArenaSettings = toml::from_str(contents)
        .context("failed to parse arena settings toml")?;
    ArenaConfig::try_from(&settings).context("arena settings failed validation")
}
