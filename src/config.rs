//! Optional TOML configuration for the command-line front-end.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{catalog::PlanKey, prelude::*};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Default plan pair for `compare` when `--plans` is not given.
    pub plans: Vec<PlanKey>,

    /// The household qualifies for EV-specific plans.
    pub ev_eligible: bool,
}

impl Config {
    /// Load the configuration, defaulting to an empty one when the file does
    /// not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse `{}`", path.display()))
    }
}
