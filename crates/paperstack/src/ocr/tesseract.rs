//! Recognition through the `tesseract` command line tool.
//!
//! Images are piped to the binary as PNG (`tesseract stdin stdout -l <lang>`). Boxes are
//! read from its `tsv` output, where level 5 rows are words; words are grouped into lines
//! by their `(block, paragraph, line)` numbers.

use super::{EngineRegistry, OcrEngine};
use crate::boxes::{BoundingBox, LineBox, WordBox};
use crate::error::{PaperError, Result};
use image::{DynamicImage, ImageFormat};
use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, warn};

const WORD_LEVEL: &str = "5";

pub struct TesseractEngine {
    binary: PathBuf,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// True when the binary can be executed.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn run(&self, image: &DynamicImage, lang: &str, extra: &[&str]) -> Result<String> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let mut child = Command::new(&self.binary)
            .args(["stdin", "stdout", "-l", lang])
            .args(extra)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PaperError::Recognition(format!("Failed to run tesseract: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&png)?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PaperError::Recognition(format!(
                "Tesseract failed: {}",
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl OcrEngine for TesseractEngine {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize_text(&self, image: &DynamicImage, lang: &str) -> Result<String> {
        self.run(image, lang, &[])
    }

    fn recognize_boxes(&self, image: &DynamicImage, lang: &str) -> Result<Vec<LineBox>> {
        let tsv = self.run(image, lang, &["tsv"])?;
        Ok(parse_tsv(&tsv))
    }
}

/// Parses tesseract's TSV output into lines of words, in reading order.
pub fn parse_tsv(tsv: &str) -> Vec<LineBox> {
    let mut lines: BTreeMap<(u32, u32, u32, u32), Vec<WordBox>> = BTreeMap::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != WORD_LEVEL {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }
        let nums: Option<Vec<u32>> = cols[1..10].iter().map(|c| c.parse().ok()).collect();
        let Some(nums) = nums else {
            debug!(row, "skipping malformed tsv row");
            continue;
        };
        // page, block, par, line, word, left, top, width, height
        let position = BoundingBox::from_size(nums[5], nums[6], nums[7], nums[8]);
        lines
            .entry((nums[0], nums[1], nums[2], nums[3]))
            .or_default()
            .push(WordBox::new(text, position));
    }

    lines.into_values().filter_map(LineBox::from_words).collect()
}

/// Offers the tesseract engine when its binary responds to `--version`.
pub struct TesseractRegistry {
    engine: Arc<TesseractEngine>,
    available: OnceCell<bool>,
}

impl TesseractRegistry {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            engine: Arc::new(TesseractEngine::new(binary)),
            available: OnceCell::new(),
        }
    }
}

impl EngineRegistry for TesseractRegistry {
    fn available(&self) -> Vec<Arc<dyn OcrEngine>> {
        let available = *self.available.get_or_init(|| {
            let ok = self.engine.is_available();
            if !ok {
                warn!("tesseract binary not found");
            }
            ok
        });
        if available {
            vec![self.engine.clone() as Arc<dyn OcrEngine>]
        } else {
            Vec::new()
        }
    }
}
