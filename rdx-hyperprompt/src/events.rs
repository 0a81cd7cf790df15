//! Defines the commands the engine consumes and the events it broadcasts.
//!
//! Commands are the single input surface: key presses, timer fires and
//! shutdown all arrive through the same queue. `PlaybackEvent`s are the
//! outbound stream subscribers can listen to.

use crate::common::TimerId;

/// Everything that can change playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePause,
    Next,
    Previous,
    Restart,
    /// A presentation-only change, forwarded to the sink untouched.
    View(ViewCommand),
    Quit,
    /// Posted by the timer driver when an armed timer elapses.
    TimerFired(TimerId),
}

/// Commands that only concern the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    FontLarger,
    FontSmaller,
    FontReset,
    ToggleBorder,
    /// The surface was resized to `columns` x `rows`; text must re-wrap.
    Resize { columns: u16, rows: u16 },
}

impl Command {
    /// Maps a key name to a command.
    ///
    /// Accepts the teleprompter's bindings by name (`space`, `right`, `esc`,
    /// ...) as well as the single characters bound to them. Case-insensitive.
    /// An empty name is the Enter key.
    pub fn from_key(key: &str) -> Option<Self> {
        let command = match key.trim().to_ascii_lowercase().as_str() {
            "space" | "p" | "pause" => Self::TogglePause,
            "" | "enter" | "return" | "right" | "down" | "n" | "next" => Self::Next,
            "left" | "up" | "b" | "prev" | "previous" => Self::Previous,
            "+" | "=" | "kp_add" | "bigger" => Self::View(ViewCommand::FontLarger),
            "-" | "_" | "kp_subtract" | "smaller" => Self::View(ViewCommand::FontSmaller),
            "0" | "reset" => Self::View(ViewCommand::FontReset),
            "t" | "border" => Self::View(ViewCommand::ToggleBorder),
            "r" | "restart" => Self::Restart,
            "esc" | "escape" | "q" | "quit" | "exit" => Self::Quit,
            _ => return None,
        };
        Some(command)
    }
}

/// Notifications broadcast by the engine as playback progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// Fired when the start delay is armed.
    Scheduled { delay_ms: u64 },
    /// A unit became current. `duration_ms` is `None` when no timer chain was
    /// started for it (playback is paused).
    UnitShown {
        index: usize,
        total: usize,
        is_break: bool,
        duration_ms: Option<u64>,
    },
    /// Words `0..=word` of unit `index` are now marked as spoken.
    WordHighlighted { index: usize, word: usize },
    Paused { index: usize },
    Resumed { index: usize },
    Restarted,
    /// The last unit finished.
    Finished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_map_to_bindings() {
        assert_eq!(Command::from_key(" space "), Some(Command::TogglePause));
        assert_eq!(Command::from_key("P"), Some(Command::TogglePause));
        assert_eq!(Command::from_key(""), Some(Command::Next));
        assert_eq!(Command::from_key("Down"), Some(Command::Next));
        assert_eq!(Command::from_key("up"), Some(Command::Previous));
        assert_eq!(
            Command::from_key("="),
            Some(Command::View(ViewCommand::FontLarger))
        );
        assert_eq!(
            Command::from_key("_"),
            Some(Command::View(ViewCommand::FontSmaller))
        );
        assert_eq!(
            Command::from_key("0"),
            Some(Command::View(ViewCommand::FontReset))
        );
        assert_eq!(
            Command::from_key("T"),
            Some(Command::View(ViewCommand::ToggleBorder))
        );
        assert_eq!(Command::from_key("R"), Some(Command::Restart));
        assert_eq!(Command::from_key("Esc"), Some(Command::Quit));
        assert_eq!(Command::from_key("jump"), None);
    }
}
