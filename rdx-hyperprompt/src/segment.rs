//! Splits raw script text into the ordered display units the scheduler walks.
//!
//! Paragraphs are separated by one or more blank lines. Inside a paragraph an
//! inline pause token of the form `[break:X]` (X in seconds, tag matched
//! case-insensitively) splits the paragraph and becomes a break unit of its
//! own.

use regex::Regex;
use std::sync::LazyLock;

static PARAGRAPH_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("paragraph separator pattern is valid"));

static BREAK_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[break:(\d+(?:\.\d+)?)\]").expect("break token pattern is valid")
});

/// One paragraph or inline pause.
///
/// Break units, and only break units, carry an override duration. Units are
/// addressed by their position in the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUnit {
    text: String,
    override_duration_ms: Option<u64>,
}

impl DisplayUnit {
    /// A regular text unit, paced by its word count.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            override_duration_ms: None,
        }
    }

    /// A pause of `seconds`, displayed as `Break (X s)`.
    pub fn pause(seconds: f64) -> Self {
        let seconds = seconds.max(0.0);
        Self {
            text: format!("Break ({seconds} s)"),
            override_duration_ms: Some((seconds * 1000.0).round() as u64),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_break(&self) -> bool {
        self.override_duration_ms.is_some()
    }

    pub fn override_duration_ms(&self) -> Option<u64> {
        self.override_duration_ms
    }
}

/// Segments raw text into display units.
///
/// An input without any non-empty paragraph yields an empty vector; callers
/// must treat that as a fatal configuration error.
pub fn segment(raw: &str) -> Vec<DisplayUnit> {
    let mut units = Vec::new();
    for paragraph in split_paragraphs(raw) {
        expand_breaks(paragraph, &mut units);
    }
    units
}

/// Normalizes line endings and splits on blank lines, dropping empty paragraphs.
pub fn split_paragraphs(raw: &str) -> Vec<String> {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    PARAGRAPH_SEPARATOR
        .split(&text)
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .map(str::to_string)
        .collect()
}

fn expand_breaks(paragraph: String, units: &mut Vec<DisplayUnit>) {
    let mut last_end = 0;
    let mut had_token = false;

    for captures in BREAK_TOKEN.captures_iter(&paragraph) {
        let (Some(token), Some(seconds)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        had_token = true;
        push_text(&paragraph[last_end..token.start()], units);
        // The pattern only admits decimal digits, so parsing cannot fail.
        let seconds: f64 = seconds.as_str().parse().unwrap_or(0.0);
        units.push(DisplayUnit::pause(seconds));
        last_end = token.end();
    }

    if had_token {
        push_text(&paragraph[last_end..], units);
    } else {
        units.push(DisplayUnit::text(paragraph));
    }
}

fn push_text(fragment: &str, units: &mut Vec<DisplayUnit>) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        units.push(DisplayUnit::text(fragment));
    }
}
