//! Duration calculation, word-span detection and the per-word interval split.

use crate::config::PacingConfig;
use crate::segment::DisplayUnit;
use std::ops::Range;

/// Half-open byte range of one whitespace-delimited token within a unit.
///
/// Offsets always fall on `char` boundaries, so `&text[span.range()]` is safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
}

impl WordSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Finds every whitespace-delimited token in `text`, left to right.
pub fn word_spans(text: &str) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut start = None;
    for (offset, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(begin)) => {
                spans.push(WordSpan { start: begin, end: offset });
                start = None;
            }
            (false, None) => start = Some(offset),
            _ => {}
        }
    }
    if let Some(begin) = start {
        spans.push(WordSpan {
            start: begin,
            end: text.len(),
        });
    }
    spans
}

/// Total on-screen time of `unit` in milliseconds.
///
/// Break units return their literal override; word count and rate are ignored.
pub fn duration_ms(unit: &DisplayUnit, pacing: &PacingConfig) -> u64 {
    if let Some(ms) = unit.override_duration_ms() {
        return ms;
    }
    let words = unit.as_str().split_whitespace().count();
    let mut seconds = pacing.min_seconds.max(words as f64 * pacing.seconds_per_word);
    if let Some(max) = pacing.max_seconds {
        seconds = seconds.min(max);
    }
    (seconds * 1000.0).round().max(0.0) as u64
}

/// How a unit's total duration is spread across its words.
///
/// `transitions[i]` is the delay between highlighting word `i` and word
/// `i + 1`; `hold` is how long the last word stays highlighted. Together they
/// sum to exactly the unit's total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalPlan {
    pub transitions: Vec<u64>,
    pub hold: u64,
}

impl IntervalPlan {
    /// Splits `total_ms` over `words` words in whole milliseconds.
    ///
    /// The last word takes its floor share plus one when the division leaves a
    /// remainder. What is left is spread over the transitions with any rounding
    /// excess going to the earliest ones, so no interval is more than 1 ms off
    /// its ideal share.
    pub fn partition(total_ms: u64, words: usize) -> Self {
        if words <= 1 {
            return Self {
                transitions: Vec::new(),
                hold: total_ms,
            };
        }
        let n = words as u64;
        let per_word = total_ms / n;
        let hold = per_word + u64::from(total_ms % n > 0);

        let remaining = total_ms - hold;
        let gaps = n - 1;
        let base = remaining / gaps;
        let rem = remaining % gaps;
        let transitions = (0..gaps).map(|i| base + u64::from(i < rem)).collect();

        Self { transitions, hold }
    }

    pub fn total_ms(&self) -> u64 {
        self.transitions.iter().sum::<u64>() + self.hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pacing(seconds_per_word: f64, min_seconds: f64, max_seconds: Option<f64>) -> PacingConfig {
        PacingConfig {
            seconds_per_word,
            min_seconds,
            max_seconds,
        }
    }

    #[test]
    fn minimum_applies_to_short_units() {
        let unit = DisplayUnit::text("one two three");
        assert_eq!(duration_ms(&unit, &pacing(0.4, 2.0, None)), 2000);
    }

    #[test]
    fn long_units_scale_with_word_count_and_clamp_to_maximum() {
        let unit = DisplayUnit::text("a b c d e f g h i j");
        assert_eq!(duration_ms(&unit, &pacing(0.4, 2.0, None)), 4000);
        assert_eq!(duration_ms(&unit, &pacing(0.4, 2.0, Some(3.0))), 3000);
    }

    #[test]
    fn duration_rounds_instead_of_truncating() {
        let unit = DisplayUnit::text("a");
        assert_eq!(duration_ms(&unit, &pacing(0.0007, 0.0, None)), 1);
        let unit = DisplayUnit::text("a b");
        assert_eq!(duration_ms(&unit, &pacing(0.2502, 0.0, None)), 500);
    }

    #[test]
    fn break_units_ignore_rate_and_word_count() {
        let unit = DisplayUnit::pause(2.5);
        assert_eq!(duration_ms(&unit, &pacing(10.0, 60.0, Some(1.0))), 2500);
        assert_eq!(duration_ms(&unit, &pacing(0.01, 0.0, None)), 2500);
    }

    #[test]
    fn spans_cover_each_token_with_byte_offsets() {
        let text = "  héllo\twörld \n!";
        let spans = word_spans(text);
        let words: Vec<&str> = spans.iter().map(|s| &text[s.range()]).collect();
        assert_eq!(words, ["héllo", "wörld", "!"]);
        assert_eq!(spans[0].start, 2);
        assert_eq!(spans[2].end, text.len());
    }

    #[test]
    fn whitespace_only_text_has_no_spans() {
        assert!(word_spans(" \t\n ").is_empty());
        assert!(word_spans("").is_empty());
    }

    #[test]
    fn thousand_ms_over_three_words() {
        let plan = IntervalPlan::partition(1000, 3);
        assert_eq!(plan.transitions, [333, 333]);
        assert_eq!(plan.hold, 334);
    }

    #[test]
    fn rounding_excess_goes_to_earliest_transitions() {
        // per word 142, extra 6 -> hold 143, remaining 857 over 6 gaps -> 142 r5
        let plan = IntervalPlan::partition(1000, 7);
        assert_eq!(plan.hold, 143);
        assert_eq!(plan.transitions, [143, 143, 143, 143, 143, 142]);
    }

    #[test]
    fn partition_always_sums_to_total() {
        for total in [0, 1, 2, 7, 999, 1000, 1001, 4321, 60_000] {
            for words in 0..40 {
                let plan = IntervalPlan::partition(total, words);
                assert_eq!(plan.total_ms(), total, "total {total} words {words}");
                assert_eq!(plan.transitions.len(), words.saturating_sub(1));
                let ideal = total / words.max(1) as u64;
                for interval in plan.transitions.iter().chain([&plan.hold]) {
                    assert!(interval.abs_diff(ideal) <= 1, "total {total} words {words}");
                }
            }
        }
    }
}
