//! Loading script text and turning it into display units.
//!
//! Text comes either as a literal string or from a file read with a declared
//! encoding. Any failure here is fatal and happens before playback starts.

use crate::error::{PromptError, Result};
use crate::segment::{segment, DisplayUnit};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the script text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    Literal(String),
    File { path: PathBuf, encoding: String },
}

/// Text encodings accepted for script files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// UTF-8 with an optional leading byte-order mark, which is dropped.
    Utf8Sig,
    Ascii,
    Latin1,
}

impl TextEncoding {
    /// Resolves an encoding label such as `utf-8`, `UTF8` or `iso_8859_1`.
    pub fn from_label(label: &str) -> Result<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        let encoding = match normalized.as_str() {
            "utf-8" | "utf8" => Self::Utf8,
            "utf-8-sig" | "utf8-sig" => Self::Utf8Sig,
            "ascii" | "us-ascii" => Self::Ascii,
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Self::Latin1,
            _ => return Err(PromptError::UnsupportedEncoding(label.to_string())),
        };
        Ok(encoding)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Sig => "utf-8-sig",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin-1",
        }
    }

    /// Decodes `bytes`, returning `None` if they are not valid in this encoding.
    pub fn decode(&self, bytes: Vec<u8>) -> Option<String> {
        match self {
            Self::Utf8 => String::from_utf8(bytes).ok(),
            Self::Utf8Sig => {
                let text = String::from_utf8(bytes).ok()?;
                Some(match text.strip_prefix('\u{feff}') {
                    Some(rest) => rest.to_string(),
                    None => text,
                })
            }
            Self::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().copied().map(char::from).collect()),
            Self::Latin1 => Some(bytes.iter().copied().map(char::from).collect()),
        }
    }
}

impl TextSource {
    /// Reads the full script text.
    pub fn load(&self) -> Result<String> {
        match self {
            Self::Literal(text) => Ok(text.clone()),
            Self::File { path, encoding } => read_file(path, encoding),
        }
    }
}

/// Reads `path` and decodes it with the encoding named by `label`.
pub fn read_file(path: &Path, label: &str) -> Result<String> {
    let encoding = TextEncoding::from_label(label)?;
    let bytes = std::fs::read(path).map_err(|source| PromptError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), encoding = encoding.name(), "Read script file.");
    encoding.decode(bytes).ok_or_else(|| PromptError::Decode {
        path: path.to_path_buf(),
        encoding: encoding.name(),
    })
}

/// Segments `text`, failing when it holds no non-empty paragraph.
pub fn load_units(text: &str) -> Result<Vec<DisplayUnit>> {
    let units = segment(text);
    if units.is_empty() {
        return Err(PromptError::NoContent);
    }
    Ok(units)
}
