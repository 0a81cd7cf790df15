//! Command-line flags shared by the Hyperprompt binaries.
//!
//! Flags are the last configuration layer: anything given here overrides the
//! config file and the `HYPERPROMPT_*` environment.

use crate::config::PromptConfig;
use crate::input::TextSource;
use clap::Args;
use std::path::PathBuf;

/// Where the script comes from, and how it is paced.
#[derive(Args, Debug, Clone, Default)]
pub struct ScriptArgs {
    /// Path to a Markdown/Text file.
    pub file: Option<PathBuf>,

    /// Inline text (overrides the file).
    #[arg(long)]
    pub text: Option<String>,

    /// File encoding.
    #[arg(long, default_value = "utf-8")]
    pub encoding: String,

    /// Optional TOML configuration file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seconds per word (e.g. 0.4 ≈ 150 wpm). If 0, uses --wpm.
    #[arg(long = "spw", allow_negative_numbers = true)]
    pub seconds_per_word: Option<f64>,

    /// Words per minute.
    #[arg(long = "wpm", allow_negative_numbers = true)]
    pub words_per_minute: Option<f64>,

    /// Minimum seconds per paragraph.
    #[arg(long = "min-sec", allow_negative_numbers = true)]
    pub min_seconds: Option<f64>,

    /// Maximum seconds per paragraph.
    #[arg(long = "max-sec", allow_negative_numbers = true)]
    pub max_seconds: Option<f64>,

    /// Delay before starting, in milliseconds.
    #[arg(long)]
    pub start_delay_ms: Option<u64>,
}

/// Look of the presentation surface.
#[derive(Args, Debug, Clone, Default)]
pub struct PresentationArgs {
    /// Frame width.
    #[arg(long)]
    pub width: Option<u16>,
    /// Frame height.
    #[arg(long)]
    pub height: Option<u16>,
    /// Frame X position.
    #[arg(long)]
    pub x: Option<u16>,
    /// Frame Y position.
    #[arg(long)]
    pub y: Option<u16>,
    /// Font family.
    #[arg(long)]
    pub font: Option<String>,
    /// Font size.
    #[arg(long)]
    pub size: Option<u16>,
    /// Text color.
    #[arg(long)]
    pub fg: Option<String>,
    /// Background color.
    #[arg(long)]
    pub bg: Option<String>,
    /// Padding inside the frame.
    #[arg(long)]
    pub pad: Option<u16>,
    /// Start without a border.
    #[arg(long)]
    pub borderless: bool,
}

impl ScriptArgs {
    /// The text source named on the command line, if any.
    pub fn text_source(&self) -> Option<TextSource> {
        if let Some(text) = &self.text {
            return Some(TextSource::Literal(text.clone()));
        }
        self.file.as_ref().map(|path| TextSource::File {
            path: path.clone(),
            encoding: self.encoding.clone(),
        })
    }

    /// Applies pacing flags on top of `config`.
    pub fn apply(&self, config: &mut PromptConfig) {
        let pacing = &mut config.pacing;
        if let Some(spw) = self.seconds_per_word {
            pacing.seconds_per_word = spw;
        }
        if let Some(wpm) = self.words_per_minute {
            pacing.words_per_minute = wpm;
        }
        if let Some(min) = self.min_seconds {
            pacing.min_seconds = min;
        }
        if self.max_seconds.is_some() {
            pacing.max_seconds = self.max_seconds;
        }
        if let Some(delay) = self.start_delay_ms {
            config.start_delay_ms = delay;
        }
    }
}

impl PresentationArgs {
    /// Applies presentation flags on top of `config`.
    pub fn apply(&self, config: &mut PromptConfig) {
        let presentation = &mut config.presentation;
        presentation.width = self.width.or(presentation.width);
        presentation.height = self.height.or(presentation.height);
        presentation.x = self.x.or(presentation.x);
        presentation.y = self.y.or(presentation.y);
        if let Some(font) = &self.font {
            presentation.font = font.clone();
        }
        if let Some(size) = self.size {
            presentation.size = size;
        }
        if let Some(fg) = &self.fg {
            presentation.fg = fg.clone();
        }
        if let Some(bg) = &self.bg {
            presentation.bg = bg.clone();
        }
        if let Some(pad) = self.pad {
            presentation.pad = pad;
        }
        presentation.borderless |= self.borderless;
    }
}
