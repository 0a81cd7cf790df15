//! Defines all configuration structures for the Hyperprompt engine.
//!
//! These structs are designed to be deserialized from a configuration file
//! (e.g., a TOML file) using `serde`, layered under environment variables with
//! the `config` crate. Every field has a default, so an empty source produces
//! a usable configuration.

use crate::error::{PromptError, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Prefix for environment overrides, e.g. `HYPERPROMPT_PACING__MIN_SECONDS=3`.
pub const ENV_PREFIX: &str = "HYPERPROMPT";

/// The top-level configuration for a teleprompter session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Raw pacing options. Validated into a `PacingConfig` before playback.
    pub pacing: PacingOptions,

    /// Delay before the first unit is shown, in milliseconds.
    pub start_delay_ms: u64,

    /// Look of the presentation surface. Passed through untouched.
    pub presentation: PresentationConfig,
}

/// Pacing options as the user supplies them.
///
/// Exactly one effective rate comes out of these: a positive
/// `seconds_per_word` wins, otherwise it is derived from `words_per_minute`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingOptions {
    /// Seconds per word. `0` means "derive from `words_per_minute`".
    pub seconds_per_word: f64,
    pub words_per_minute: f64,
    /// Minimum seconds a text unit stays on screen.
    pub min_seconds: f64,
    /// Optional upper bound on seconds per text unit.
    pub max_seconds: Option<f64>,
}

/// The validated, immutable pacing used by the duration calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingConfig {
    pub seconds_per_word: f64,
    pub min_seconds: f64,
    pub max_seconds: Option<f64>,
}

/// Presentation settings for the sink. The core never interprets these.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresentationConfig {
    pub width: Option<u16>,
    pub height: Option<u16>,
    pub x: Option<u16>,
    pub y: Option<u16>,
    pub font: String,
    pub size: u16,
    pub fg: String,
    pub bg: String,
    pub pad: u16,
    pub borderless: bool,
}

impl PromptConfig {
    /// Loads the configuration from an optional TOML file, then applies
    /// `HYPERPROMPT_*` environment overrides on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with(path, environment())
    }

    /// Like [`PromptConfig::load`], with the environment layer supplied by
    /// the caller.
    pub fn load_with(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let config = builder.add_source(env).build()?;
        Ok(config.try_deserialize()?)
    }
}

impl PacingOptions {
    /// Validates the options and resolves the single effective rate.
    pub fn resolve(&self) -> Result<PacingConfig> {
        check_finite("seconds_per_word", self.seconds_per_word)?;
        check_finite("words_per_minute", self.words_per_minute)?;
        check_finite("min_seconds", self.min_seconds)?;
        if self.seconds_per_word < 0.0 {
            return Err(invalid("seconds_per_word", self.seconds_per_word, "must be >= 0"));
        }
        if self.words_per_minute <= 0.0 {
            return Err(invalid("words_per_minute", self.words_per_minute, "must be > 0"));
        }
        if self.min_seconds < 0.0 {
            return Err(invalid("min_seconds", self.min_seconds, "must be >= 0"));
        }
        if let Some(max) = self.max_seconds {
            check_finite("max_seconds", max)?;
            if max < 0.0 {
                return Err(invalid("max_seconds", max, "must be >= 0"));
            }
        }

        let seconds_per_word = if self.seconds_per_word > 0.0 {
            self.seconds_per_word
        } else {
            60.0 / self.words_per_minute
        };
        Ok(PacingConfig {
            seconds_per_word,
            min_seconds: self.min_seconds,
            max_seconds: self.max_seconds,
        })
    }
}

/// The `HYPERPROMPT_*` environment layer, with `__` between nested keys.
pub fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn check_finite(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, value, "must be a finite number"))
    }
}

fn invalid(field: &'static str, value: f64, reason: &'static str) -> PromptError {
    PromptError::InvalidPacing {
        field,
        value,
        reason,
    }
}

// --- Defaults ---

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            pacing: PacingOptions::default(),
            start_delay_ms: 500,
            presentation: PresentationConfig::default(),
        }
    }
}

impl Default for PacingOptions {
    fn default() -> Self {
        Self {
            seconds_per_word: 0.0,
            words_per_minute: 150.0,
            min_seconds: 2.0,
            max_seconds: None,
        }
    }
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            x: None,
            y: None,
            font: "Helvetica".to_string(),
            size: 28,
            fg: "#ffffff".to_string(),
            bg: "#000000".to_string(),
            pad: 14,
            borderless: false,
        }
    }
}
