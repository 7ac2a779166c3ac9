//! Rule options loaded from TOML.
//!
//! The defaults follow FIDE practice: threefold repetition and the 50-move
//! rule must be claimed, while fivefold repetition and the 75-move rule end
//! the game automatically.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rules::Variant;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Options that change how a [`Game`](crate::Game) adjudicates.
///
/// ```toml
/// variant = "atomic"
/// arbiter_draw_after_threefold_repetition = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Variant used by [`Game::from_config`](crate::Game::from_config).
    #[serde(default)]
    pub variant: Variant,
    /// End the game on threefold repetition without waiting for a claim.
    #[serde(default)]
    pub arbiter_draw_after_threefold_repetition: bool,
    /// End the game on fivefold repetition.
    #[serde(default = "enabled")]
    pub automatic_draw_after_fivefold_repetition: bool,
    /// End the game once the 50-move rule could be claimed.
    #[serde(default)]
    pub arbiter_draw_after_100_halfmove_clock: bool,
    /// Reject moves once the game is over.
    #[serde(default = "enabled")]
    pub block_if_game_over: bool,
    /// Draw automatically when neither side can mate.
    #[serde(default = "enabled")]
    pub check_for_insufficient_material: bool,
}

fn enabled() -> bool {
    true
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            variant: Variant::Standard,
            arbiter_draw_after_threefold_repetition: false,
            automatic_draw_after_fivefold_repetition: true,
            arbiter_draw_after_100_halfmove_clock: false,
            block_if_game_over: true,
            check_for_insufficient_material: true,
        }
    }
}

impl RulesConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads a configuration file. A missing file is an error; callers that
    /// want defaults should use [`RulesConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadError`] if the file cannot be read, or
    /// [`ConfigError::ParseError`] if it is not valid TOML for this type.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}
