//! A presentation sink that paints the teleprompter into the terminal.
//!
//! Geometry and padding are read as character cells. The terminal cannot
//! change its font, so the font size is tracked and shown next to the status
//! instead.

use colored::{ColoredString, Colorize};
use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::{queue, QueueableCommand};
use hyperprompt::prelude::*;
use std::io::{self, Write};
use std::ops::Range;
use tracing::warn;

const FONT_STEP: u16 = 2;
const FONT_MIN: u16 = 6;
const FONT_MAX: u16 = 200;

/// Where the frame sits on screen, in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Frame {
    /// Resolves the configured geometry against the terminal size. Missing
    /// values default to a frame spanning ~96% of the width at the top.
    pub fn resolve(presentation: &PresentationConfig, (columns, rows): (u16, u16)) -> Self {
        let width = presentation
            .width
            .unwrap_or_else(|| (u32::from(columns) * 96 / 100) as u16)
            .clamp(20, columns.max(20));
        let height = presentation.height.unwrap_or(rows).clamp(4, rows.max(4));
        let x = presentation
            .x
            .unwrap_or(columns.saturating_sub(width) / 2)
            .min(columns.saturating_sub(width));
        let y = presentation.y.unwrap_or(0).min(rows.saturating_sub(height));
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

pub struct TerminalSink<W: Write> {
    out: W,
    presentation: PresentationConfig,
    frame: Frame,
    pad: u16,
    fg: (u8, u8, u8),
    bg: (u8, u8, u8),
    base_size: u16,
    font_size: u16,
    borderless: bool,
    text: String,
    spoken_end: usize,
    scroll: usize,
    status: String,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, presentation: &PresentationConfig, terminal: (u16, u16)) -> Self {
        let frame = Frame::resolve(presentation, terminal);
        let size = presentation.size.clamp(FONT_MIN, FONT_MAX);
        Self {
            out,
            presentation: presentation.clone(),
            frame,
            pad: presentation.pad.min(frame.width / 8),
            fg: parse_hex_color(&presentation.fg).unwrap_or((255, 255, 255)),
            bg: parse_hex_color(&presentation.bg).unwrap_or((0, 0, 0)),
            base_size: size,
            font_size: size,
            borderless: presentation.borderless,
            text: String::new(),
            spoken_end: 0,
            scroll: 0,
            status: String::new(),
        }
    }

    /// Re-fits the frame to a new terminal size and re-wraps from the top.
    fn relayout(&mut self, terminal: (u16, u16)) {
        self.frame = Frame::resolve(&self.presentation, terminal);
        self.pad = self.presentation.pad.min(self.frame.width / 8);
        self.scroll = 0;
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn is_borderless(&self) -> bool {
        self.borderless
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Columns available for text inside border and padding.
    fn text_width(&self) -> usize {
        let border = if self.borderless { 0 } else { 2 };
        usize::from(self.frame.width.saturating_sub(border + 2 * self.pad)).max(1)
    }

    /// Rows available for text; the last inner row holds the status.
    fn text_rows(&self) -> usize {
        let border = if self.borderless { 0 } else { 2 };
        usize::from(self.frame.height.saturating_sub(border + 1)).max(1)
    }

    fn paint(&mut self, body: impl FnOnce(&mut Self) -> io::Result<()>) {
        if let Err(e) = body(&mut *self).and_then(|()| self.redraw()) {
            warn!("Failed to paint the terminal frame: {}", e);
        }
    }

    fn redraw(&mut self) -> io::Result<()> {
        let Frame {
            x,
            y,
            width,
            height,
        } = self.frame;
        let (bg, fg) = (self.bg, self.fg);
        self.out.queue(Clear(ClearType::All))?;

        let blank = on_bg(" ".repeat(usize::from(width)).normal(), bg);
        for row in 0..height {
            queue!(self.out, MoveTo(x, y + row), Print(&blank))?;
        }
        let inset = if self.borderless {
            0
        } else {
            self.draw_border()?;
            1
        };

        let lines = wrap_lines(&self.text, self.text_width());
        let left = x + inset + self.pad;
        let visible = lines.iter().skip(self.scroll).take(self.text_rows());
        for (row, line) in visible.enumerate() {
            let (spoken, rest) = split_line(&self.text, line.clone(), self.spoken_end);
            let spoken = on_bg(spoken.bold().truecolor(fg.0, fg.1, fg.2), bg);
            let rest = on_bg(rest.dimmed().truecolor(fg.0, fg.1, fg.2), bg);
            queue!(
                self.out,
                MoveTo(left, y + inset + row as u16),
                Print(spoken),
                Print(rest)
            )?;
        }

        let status = format!("{}  {}pt", self.status, self.font_size);
        let status_x = (x + width)
            .saturating_sub(inset + self.pad + status.chars().count() as u16)
            .max(left);
        let status_y = y + height.saturating_sub(1 + inset);
        let status = on_bg(status.truecolor(fg.0, fg.1, fg.2).italic(), bg);
        queue!(self.out, MoveTo(status_x, status_y), Print(status))?;
        self.out.flush()
    }

    fn draw_border(&mut self) -> io::Result<()> {
        let Frame {
            x,
            y,
            width,
            height,
        } = self.frame;
        let inner = usize::from(width.saturating_sub(2));
        let top = on_bg(format!("┌{}┐", "─".repeat(inner)).dimmed(), self.bg);
        let bottom = on_bg(format!("└{}┘", "─".repeat(inner)).dimmed(), self.bg);
        let side = on_bg("│".dimmed(), self.bg);
        let right = x + width.saturating_sub(1);

        queue!(self.out, MoveTo(x, y), Print(top))?;
        for row in 1..height.saturating_sub(1) {
            queue!(
                self.out,
                MoveTo(x, y + row),
                Print(&side),
                MoveTo(right, y + row),
                Print(&side)
            )?;
        }
        queue!(self.out, MoveTo(x, y + height.saturating_sub(1)), Print(bottom))?;
        Ok(())
    }
}

fn on_bg(text: ColoredString, (r, g, b): (u8, u8, u8)) -> ColoredString {
    text.on_truecolor(r, g, b)
}

impl<W: Write> PresentationSink for TerminalSink<W> {
    fn show_unit(&mut self, unit: &DisplayUnit) {
        self.paint(|sink| {
            sink.text = unit.as_str().to_string();
            sink.spoken_end = 0;
            sink.scroll = 0;
            Ok(())
        });
    }

    fn mark_spoken(&mut self, spoken: Range<usize>) {
        self.paint(|sink| {
            sink.spoken_end = spoken.end.min(sink.text.len());
            Ok(())
        });
    }

    fn reveal(&mut self, word: WordSpan) {
        let lines = wrap_lines(&self.text, self.text_width());
        let Some(line) = lines.iter().position(|line| line.contains(&word.start)) else {
            return;
        };
        let rows = self.text_rows();
        let scroll = if line < self.scroll {
            line
        } else if line >= self.scroll + rows {
            line + 1 - rows
        } else {
            return;
        };
        self.paint(|sink| {
            sink.scroll = scroll;
            Ok(())
        });
    }

    fn set_status(&mut self, status: &str) {
        self.paint(|sink| {
            sink.status = status.to_string();
            Ok(())
        });
    }

    fn apply_view(&mut self, command: ViewCommand) {
        self.paint(|sink| {
            match command {
                ViewCommand::FontLarger => {
                    sink.font_size = sink.font_size.saturating_add(FONT_STEP).min(FONT_MAX);
                }
                ViewCommand::FontSmaller => {
                    sink.font_size = sink.font_size.saturating_sub(FONT_STEP).max(FONT_MIN);
                }
                ViewCommand::FontReset => sink.font_size = sink.base_size,
                ViewCommand::ToggleBorder => {
                    sink.borderless = !sink.borderless;
                    sink.scroll = 0;
                }
                ViewCommand::Resize { columns, rows } => sink.relayout((columns, rows)),
            }
            Ok(())
        });
    }
}

/// Parses `#rrggbb` (or `rrggbb`) into an RGB triple.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

/// Greedy word wrap. Each line is the byte range from its first word's start
/// to its last word's end; hard line breaks in the text are kept.
pub fn wrap_lines(text: &str, width: usize) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for hard_line in text.split('\n') {
        let mut current: Option<Range<usize>> = None;
        let mut current_len = 0;
        for span in word_spans(hard_line) {
            let word = span.start + offset..span.end + offset;
            let word_len = text[word.clone()].chars().count();
            current = match current {
                Some(line) if current_len + 1 + word_len <= width => {
                    current_len += 1 + word_len;
                    Some(line.start..word.end)
                }
                Some(line) => {
                    lines.push(line);
                    current_len = word_len;
                    Some(word)
                }
                None => {
                    current_len = word_len;
                    Some(word)
                }
            };
        }
        lines.extend(current);
        offset += hard_line.len() + 1;
    }
    lines
}

/// Splits one wrapped line at the end of the spoken range.
fn split_line(text: &str, line: Range<usize>, spoken_end: usize) -> (&str, &str) {
    let split = spoken_end.clamp(line.start, line.end);
    (&text[line.start..split], &text[split..line.end])
}
