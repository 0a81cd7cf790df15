//! # Hyperprompt
//!
//! A paced, word-highlighting teleprompter engine for Rust.
//!
//! Hyperprompt turns a script into timed UI mutations: each paragraph stays on
//! screen for a duration derived from its word count, the words are marked as
//! spoken one by one while it is shown, and playback then moves on to the
//! next paragraph. Playback can be paused, resumed, restarted and overridden
//! with manual navigation at any moment.
//!
//! ## Core Concepts
//!
//! - **DisplayUnit**: one paragraph, or an inline `[break:X]` pause. The
//!   segmenter builds the sequence once at startup.
//! - **Word-highlight scheduler**: a pure state machine that splits a unit's
//!   duration across its words in whole milliseconds.
//! - **Single writer**: all input and every timer fire arrive as `Command`s
//!   on one queue consumed by the engine task, the only code that mutates
//!   playback state.
//! - **Presentation sink**: the UI is an external collaborator driven through
//!   the `PresentationSink` trait.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use hyperprompt::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Load configuration and segment the script.
//!     let config = PromptConfig::default();
//!     let units = load_units("Hello there.\n\n[break:2]\n\nGoodbye.")?;
//!
//!     // 2. Create the engine with a sink.
//!     let (engine, handle) = PromptEngine::new(units, &config, TracingSink::default())?;
//!
//!     // 3. Subscribe to playback events before starting the engine.
//!     let mut events = handle.subscribe_playback_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Received Playback Event: {:?}", event);
//!         }
//!     });
//!
//!     // 4. Run the engine. It stops on `Command::Quit` or Ctrl+C.
//!     engine.run().await;
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Hyperprompt";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod common;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod input;
pub mod pacing;
pub mod scheduler;
pub mod segment;
pub mod sink;
pub mod timers;

/// A prelude module for easy importing of the most common Hyperprompt types.
pub mod prelude {
    pub use crate::common::{TimerId, TimerKind};
    pub use crate::config::{PacingConfig, PacingOptions, PresentationConfig, PromptConfig};
    pub use crate::controller::{PlaybackController, PlaybackState};
    pub use crate::engine::{EngineHandle, PromptEngine};
    pub use crate::error::PromptError;
    pub use crate::events::{Command, PlaybackEvent, ViewCommand};
    pub use crate::input::{load_units, TextEncoding, TextSource};
    pub use crate::pacing::{duration_ms, word_spans, IntervalPlan, WordSpan};
    pub use crate::scheduler::{HighlightState, Step, WordScheduler};
    pub use crate::segment::{segment, DisplayUnit};
    pub use crate::sink::{Paint, PresentationSink, RecordingSink, TracingSink};
    pub use crate::timers::{TimerDriver, TokioTimers};
}
