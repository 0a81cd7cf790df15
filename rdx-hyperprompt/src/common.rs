//! Contains common, primitive types shared across the Hyperprompt crate.
//!
//! Timers are identified by generational slotmap keys. A key handed out for
//! one timer is never equal to the key of a later timer, so a fire event that
//! arrives after its timer was cancelled can always be recognized as stale.

use slotmap::new_key_type;

new_key_type! {
    /// Uniquely identifies one armed timer in the playback state.
    ///
    /// The key is returned when the controller arms a timer and travels back
    /// through the command queue inside `Command::TimerFired` when it elapses.
    pub struct TimerId;
}

/// What a pending timer will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// The start delay before the first unit is shown.
    Start,
    /// The next step of the word-highlight scheduler for the current unit.
    Step,
}
