//! The render interface the controller drives, plus two headless sinks.
//!
//! A sink paints; it never decides anything. The only thing that flows back
//! out of a presentation surface is raw input, which arrives at the engine as
//! a [`Command`](crate::events::Command).

use crate::events::ViewCommand;
use crate::pacing::WordSpan;
use crate::segment::DisplayUnit;
use std::ops::Range;
use tracing::{debug, info};

pub trait PresentationSink {
    /// Replaces the displayed unit and clears any spoken marking.
    fn show_unit(&mut self, unit: &DisplayUnit);

    /// Marks `spoken` (a byte range of the current unit's text) as read.
    /// The range always starts at the first word and only ever grows within
    /// one unit.
    fn mark_spoken(&mut self, spoken: Range<usize>);

    /// Asks the surface to bring `word` into view, e.g. by scrolling.
    fn reveal(&mut self, _word: WordSpan) {}

    fn set_status(&mut self, status: &str);

    /// Font size and border changes. Surfaces without these may ignore them.
    fn apply_view(&mut self, _command: ViewCommand) {}
}

/// A sink that narrates every paint call through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink {
    current: String,
}

impl PresentationSink for TracingSink {
    fn show_unit(&mut self, unit: &DisplayUnit) {
        self.current = unit.as_str().to_string();
        info!("[SHOW] {}", unit.as_str());
    }

    fn mark_spoken(&mut self, spoken: Range<usize>) {
        let read = self.current.get(spoken.clone()).unwrap_or_default();
        debug!("[SPOKEN] {:?} {}", spoken, read);
    }

    fn set_status(&mut self, status: &str) {
        info!("[STATUS] {}", status);
    }

    fn apply_view(&mut self, command: ViewCommand) {
        info!("[VIEW] {:?}", command);
    }
}

/// One call made on a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Paint {
    Show(String),
    Spoken(Range<usize>),
    Reveal(WordSpan),
    Status(String),
    View(ViewCommand),
}

/// A sink that keeps every paint call in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub paints: Vec<Paint>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of every shown unit, in order.
    pub fn shown(&self) -> Vec<&str> {
        self.paints
            .iter()
            .filter_map(|paint| match paint {
                Paint::Show(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The most recent status string.
    pub fn status(&self) -> Option<&str> {
        self.paints.iter().rev().find_map(|paint| match paint {
            Paint::Status(status) => Some(status.as_str()),
            _ => None,
        })
    }

    /// Spoken ranges painted since the last `Show`.
    pub fn spoken_since_show(&self) -> Vec<Range<usize>> {
        let start = self
            .paints
            .iter()
            .rposition(|paint| matches!(paint, Paint::Show(_)))
            .map_or(0, |index| index + 1);
        self.paints[start..]
            .iter()
            .filter_map(|paint| match paint {
                Paint::Spoken(range) => Some(range.clone()),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSink for RecordingSink {
    fn show_unit(&mut self, unit: &DisplayUnit) {
        self.paints.push(Paint::Show(unit.as_str().to_string()));
    }

    fn mark_spoken(&mut self, spoken: Range<usize>) {
        self.paints.push(Paint::Spoken(spoken));
    }

    fn reveal(&mut self, word: WordSpan) {
        self.paints.push(Paint::Reveal(word));
    }

    fn set_status(&mut self, status: &str) {
        self.paints.push(Paint::Status(status.to_string()));
    }

    fn apply_view(&mut self, command: ViewCommand) {
        self.paints.push(Paint::View(command));
    }
}
