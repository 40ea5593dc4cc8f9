//! # Word Boxes
//!
//! Recognition output is kept per text line: a [`LineBox`] holds the line's bounding box
//! and the [`WordBox`]es it is made of.
//!
//! ## Artifact Format
//!
//! The `.words` artifact is UTF-8 text with one JSON-encoded [`LineBox`] per line:
//!
//! ```text
//! {"position":{"x0":12,"y0":40,"x1":310,"y1":62},"words":[{"position":{...},"text":"Invoice"}]}
//! ```
//!
//! Blank lines are ignored when reading. Any text survives a write/read cycle unchanged,
//! since JSON escapes embedded newlines.

use crate::error::{PaperError, Result};
use serde::{Deserialize, Serialize};

/// Pixel rectangle, `(x0, y0)` top-left inclusive, `(x1, y1)` bottom-right exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl BoundingBox {
    pub fn new(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_size(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> u32 {
        self.x1.saturating_sub(self.x0)
    }

    pub fn height(&self) -> u32 {
        self.y1.saturating_sub(self.y0)
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordBox {
    pub position: BoundingBox,
    pub text: String,
}

impl WordBox {
    pub fn new(text: impl Into<String>, position: BoundingBox) -> Self {
        Self {
            position,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBox {
    pub position: BoundingBox,
    pub words: Vec<WordBox>,
}

impl LineBox {
    pub fn new(words: Vec<WordBox>, position: BoundingBox) -> Self {
        Self { position, words }
    }

    /// Builds a line whose position is the union of its words. `None` for no words.
    pub fn from_words(words: Vec<WordBox>) -> Option<Self> {
        let position = words
            .iter()
            .map(|w| w.position)
            .reduce(|acc, b| acc.union(&b))?;
        Some(Self { position, words })
    }

    pub fn content(&self) -> String {
        self.words
            .iter()
            .map(|w| w.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn encode(lines: &[LineBox]) -> Result<String> {
    let mut out = String::new();
    for line in lines {
        out.push_str(&serde_json::to_string(line)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn decode(raw: &str) -> Result<Vec<LineBox>> {
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str::<LineBox>(l).map_err(PaperError::from))
        .collect()
}

/// Plain text of a page: line contents, one per line.
pub fn text_of(lines: &[LineBox]) -> String {
    lines
        .iter()
        .map(LineBox::content)
        .collect::<Vec<_>>()
        .join("\n")
}
