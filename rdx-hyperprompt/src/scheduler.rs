//! The word-highlight scheduler for a single display unit.
//!
//! The scheduler is a pure state machine. It never touches timers or the
//! presentation itself: each call returns a [`Step`] that the controller turns
//! into paint calls and at most one armed timer. Transitions happen only on
//! [`WordScheduler::begin`], [`WordScheduler::on_timer`] and
//! [`WordScheduler::cancel`].

use crate::pacing::{word_spans, IntervalPlan, WordSpan};
use crate::segment::DisplayUnit;
use std::ops::Range;
use std::time::Duration;
use tracing::{trace, warn};

/// Where the scheduler is within the current unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightState {
    /// No unit is being paced.
    Idle,
    /// `word` is highlighted; transition `interval` is running.
    Highlighting { word: usize, interval: usize },
    /// The last word (or a word-less unit) is on screen, waiting to advance.
    Holding,
    /// A break unit is on screen, waiting to advance.
    BreakWaiting,
}

/// What the controller must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Mark words `0..=cursor` as spoken, reveal word `cursor`, then wait.
    Highlight { cursor: usize, wait: Duration },
    /// Wait without touching the highlight.
    Wait(Duration),
    /// The unit is exhausted; move on to the next one.
    Advance,
}

#[derive(Debug)]
pub struct WordScheduler {
    state: HighlightState,
    spans: Vec<WordSpan>,
    plan: IntervalPlan,
}

impl Default for WordScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl WordScheduler {
    pub fn new() -> Self {
        Self {
            state: HighlightState::Idle,
            spans: Vec::new(),
            plan: IntervalPlan {
                transitions: Vec::new(),
                hold: 0,
            },
        }
    }

    pub fn state(&self) -> HighlightState {
        self.state
    }

    /// Word spans of the unit being paced. Empty for break units.
    pub fn spans(&self) -> &[WordSpan] {
        &self.spans
    }

    /// Byte range marked as spoken when `cursor` is highlighted: from the start
    /// of the first word through the end of word `cursor`.
    pub fn spoken_range(&self, cursor: usize) -> Range<usize> {
        match (self.spans.first(), self.spans.get(self.clamp(cursor))) {
            (Some(first), Some(last)) => first.start..last.end,
            _ => 0..0,
        }
    }

    /// Starts pacing `unit` over `total_ms`, discarding any previous progress.
    pub fn begin(&mut self, unit: &DisplayUnit, total_ms: u64) -> Step {
        if unit.is_break() {
            self.spans.clear();
            self.plan = IntervalPlan::partition(total_ms, 0);
            self.state = HighlightState::BreakWaiting;
            return Step::Wait(millis(total_ms));
        }

        self.spans = word_spans(unit.as_str());
        let words = self.spans.len();
        self.plan = IntervalPlan::partition(total_ms, words);

        if words == 0 {
            self.state = HighlightState::Holding;
            return Step::Wait(millis(total_ms));
        }
        if total_ms == 0 {
            self.state = HighlightState::Holding;
            return Step::Highlight {
                cursor: words - 1,
                wait: Duration::ZERO,
            };
        }
        if words == 1 {
            self.state = HighlightState::Holding;
            return Step::Highlight {
                cursor: 0,
                wait: millis(total_ms),
            };
        }

        self.state = HighlightState::Highlighting {
            word: 0,
            interval: 0,
        };
        Step::Highlight {
            cursor: 0,
            wait: millis(self.plan.transitions[0]),
        }
    }

    /// Advances the state machine after its pending timer elapsed.
    ///
    /// Returns `None` when idle: a timer reaching an idle scheduler belongs to
    /// nothing and must be dropped.
    pub fn on_timer(&mut self) -> Option<Step> {
        match self.state {
            HighlightState::Idle => None,
            HighlightState::Holding | HighlightState::BreakWaiting => {
                self.state = HighlightState::Idle;
                Some(Step::Advance)
            }
            HighlightState::Highlighting { word, interval } => {
                let next_word = word + 1;
                let cursor = self.clamp(next_word);
                if cursor != next_word {
                    warn!(word = next_word, "Highlight cursor ran past the last word, clamping.");
                }
                let next_interval = interval + 1;
                let step = match self.plan.transitions.get(next_interval) {
                    Some(&delay) => {
                        self.state = HighlightState::Highlighting {
                            word: cursor,
                            interval: next_interval,
                        };
                        Step::Highlight {
                            cursor,
                            wait: millis(delay),
                        }
                    }
                    None => {
                        self.state = HighlightState::Holding;
                        Step::Highlight {
                            cursor,
                            wait: millis(self.plan.hold),
                        }
                    }
                };
                trace!(?step, "Word transition.");
                Some(step)
            }
        }
    }

    /// Drops all progress for the current unit.
    pub fn cancel(&mut self) {
        self.state = HighlightState::Idle;
    }

    fn clamp(&self, cursor: usize) -> usize {
        cursor.min(self.spans.len().saturating_sub(1))
    }
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Runs a unit to completion, returning each highlighted cursor and the
    /// total time waited.
    fn drive(unit: &DisplayUnit, total_ms: u64) -> (Vec<usize>, Duration) {
        let mut scheduler = WordScheduler::new();
        let mut cursors = Vec::new();
        let mut waited = Duration::ZERO;
        let mut step = scheduler.begin(unit, total_ms);
        loop {
            match step {
                Step::Highlight { cursor, wait } => {
                    cursors.push(cursor);
                    waited += wait;
                }
                Step::Wait(wait) => waited += wait,
                Step::Advance => break,
            }
            step = scheduler.on_timer().expect("scheduler went idle mid-unit");
        }
        assert_eq!(scheduler.state(), HighlightState::Idle);
        (cursors, waited)
    }

    #[test]
    fn three_words_visit_each_cursor_once() {
        let (cursors, waited) = drive(&DisplayUnit::text("one two three"), 1000);
        assert_eq!(cursors, [0, 1, 2]);
        assert_eq!(waited, Duration::from_millis(1000));
    }

    #[test]
    fn every_word_is_visited_in_order_and_time_adds_up() {
        let text = (0..23).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let unit = DisplayUnit::text(text);
        for total in [1, 22, 23, 24, 1000, 9_201] {
            let (cursors, waited) = drive(&unit, total);
            assert_eq!(cursors, (0..23).collect::<Vec<_>>());
            assert_eq!(waited, Duration::from_millis(total));
        }
    }

    #[test]
    fn single_word_holds_for_the_whole_duration() {
        let mut scheduler = WordScheduler::new();
        let step = scheduler.begin(&DisplayUnit::text("hello"), 2000);
        assert_eq!(
            step,
            Step::Highlight {
                cursor: 0,
                wait: Duration::from_millis(2000)
            }
        );
        assert_eq!(scheduler.state(), HighlightState::Holding);
        assert_eq!(scheduler.on_timer(), Some(Step::Advance));
    }

    #[test]
    fn zero_duration_highlights_everything_and_advances_immediately() {
        let mut scheduler = WordScheduler::new();
        let step = scheduler.begin(&DisplayUnit::text("a b c"), 0);
        assert_eq!(
            step,
            Step::Highlight {
                cursor: 2,
                wait: Duration::ZERO
            }
        );
        assert_eq!(scheduler.spoken_range(2), 0..5);
        assert_eq!(scheduler.on_timer(), Some(Step::Advance));
    }

    #[test]
    fn wordless_unit_only_waits() {
        let (cursors, waited) = drive(&DisplayUnit::text("   "), 2000);
        assert!(cursors.is_empty());
        assert_eq!(waited, Duration::from_millis(2000));
    }

    #[test]
    fn break_unit_is_never_highlighted() {
        let mut scheduler = WordScheduler::new();
        let step = scheduler.begin(&DisplayUnit::pause(3.0), 3000);
        assert_eq!(step, Step::Wait(Duration::from_millis(3000)));
        assert_eq!(scheduler.state(), HighlightState::BreakWaiting);
        assert!(scheduler.spans().is_empty());
        assert_eq!(scheduler.on_timer(), Some(Step::Advance));
    }

    #[test]
    fn spoken_range_is_cumulative_and_clamped() {
        let mut scheduler = WordScheduler::new();
        scheduler.begin(&DisplayUnit::text("  to be or"), 900);
        assert_eq!(scheduler.spoken_range(0), 2..4);
        assert_eq!(scheduler.spoken_range(1), 2..7);
        assert_eq!(scheduler.spoken_range(2), 2..10);
        assert_eq!(scheduler.spoken_range(99), 2..10);
    }

    #[test]
    fn cancel_makes_late_timers_inert() {
        let mut scheduler = WordScheduler::new();
        scheduler.begin(&DisplayUnit::text("one two"), 1000);
        scheduler.cancel();
        assert_eq!(scheduler.state(), HighlightState::Idle);
        assert_eq!(scheduler.on_timer(), None);
    }

    #[test]
    fn begin_restarts_from_the_first_word() {
        let mut scheduler = WordScheduler::new();
        let unit = DisplayUnit::text("one two three");
        scheduler.begin(&unit, 3000);
        scheduler.on_timer();
        let step = scheduler.begin(&unit, 3000);
        assert!(matches!(step, Step::Highlight { cursor: 0, .. }));
        assert_eq!(
            scheduler.state(),
            HighlightState::Highlighting {
                word: 0,
                interval: 0
            }
        );
    }
}
