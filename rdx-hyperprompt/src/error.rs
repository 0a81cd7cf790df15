//! The error type for everything that can go wrong before playback starts.
//!
//! Once the engine is running nothing is fatal: stale timers are ignored and
//! cursor overruns are clamped.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no input provided")]
    NoInput,

    #[error("no non-empty paragraphs found (split on blank lines)")]
    NoContent,

    #[error("invalid pacing value for `{field}`: {value} ({reason})")]
    InvalidPacing {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("failed to read `{path}`")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported text encoding `{0}`")]
    UnsupportedEncoding(String),

    #[error("`{path}` is not valid {encoding} text")]
    Decode { path: PathBuf, encoding: &'static str },

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, PromptError>;
