//! # Configuration
//!
//! Paperstack configuration is managed by [`confique`], which handles layered loading
//! from a TOML file, environment variables, and compiled defaults.
//!
//! ## Storage Hierarchy
//!
//! Configuration is resolved in priority order:
//! 1. **Environment variables**: `PAPERSTACK_WORKDIR`, `PAPERSTACK_OCR_LANG`, etc.
//! 2. **Config file**: `--config <path>` or `paperstack.toml` in the OS config directory
//!    (via `directories`). A missing file is not an error.
//! 3. **Compiled Defaults**: Built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `workdir` | `<data dir>/papers` | Root directory holding one directory per document |
//! | `ocr_lang` | `eng` | Language passed to the recognition engine |
//! | `spelling_lang` | none | Dictionary used to score orientation candidates |
//! | `dictionary_dir` | none | Directory containing `<spelling_lang>.dic` |
//! | `scanner_resolution` | `300` | Resolution (DPI) of incoming scans |
//! | `scanner_calibration` | none | `[x0, y0, x1, y1]` crop, expressed at 200 DPI |
//! | `thumbnail_width` | `150` | Default thumbnail width in pixels |
//! | `ocr_workers` | CPU count | Orientation candidates recognized in parallel |
//! | `tesseract_path` | `tesseract` | Recognition binary |

use crate::error::Result;
use crate::model::{CropRegion, LanguageConfig};
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Resolution at which `scanner_calibration` coordinates are expressed.
pub const CALIBRATION_RESOLUTION: u32 = 200;

pub const CONFIG_FILE_NAME: &str = "paperstack.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "paperstack", "paperstack")
}

/// Configuration for paperstack, stored in `paperstack.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PaperConfig {
    /// Root directory holding the document directories.
    #[config(env = "PAPERSTACK_WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Recognition language (e.g. "eng", "fra").
    #[config(env = "PAPERSTACK_OCR_LANG", default = "eng")]
    pub ocr_lang: String,

    /// Dictionary name used by the spell-check scorer (e.g. "en_US").
    #[config(env = "PAPERSTACK_SPELLING_LANG")]
    pub spelling_lang: Option<String>,

    /// Directory holding `<spelling_lang>.dic` word lists.
    #[config(env = "PAPERSTACK_DICTIONARY_DIR")]
    pub dictionary_dir: Option<PathBuf>,

    #[config(env = "PAPERSTACK_SCANNER_RESOLUTION", default = 300)]
    pub scanner_resolution: u32,

    /// Crop applied to every scan before orientation detection, at 200 DPI.
    pub scanner_calibration: Option<[u32; 4]>,

    #[config(env = "PAPERSTACK_THUMBNAIL_WIDTH", default = 150)]
    pub thumbnail_width: u32,

    #[config(env = "PAPERSTACK_OCR_WORKERS")]
    pub ocr_workers: Option<usize>,

    #[config(env = "PAPERSTACK_TESSERACT")]
    pub tesseract_path: Option<PathBuf>,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            workdir: None,
            ocr_lang: "eng".to_string(),
            spelling_lang: None,
            dictionary_dir: None,
            scanner_resolution: 300,
            scanner_calibration: None,
            thumbnail_width: 150,
            ocr_workers: None,
            tesseract_path: None,
        }
    }
}

impl PaperConfig {
    /// Load from the environment plus `path`, or the default config file when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        match path {
            Some(path) => builder = builder.file(path),
            None => {
                if let Some(default) = Self::default_path() {
                    builder = builder.file(default);
                }
            }
        }
        Ok(builder.load()?)
    }

    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn workdir(&self) -> PathBuf {
        self.workdir.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join("papers"))
                .unwrap_or_else(|| PathBuf::from("papers"))
        })
    }

    pub fn languages(&self) -> LanguageConfig {
        LanguageConfig {
            ocr: self.ocr_lang.clone(),
            spelling: self.spelling_lang.clone(),
        }
    }

    /// Calibration scaled to the resolution of the scan at hand.
    pub fn crop_region(&self, scan_resolution: u32) -> Option<CropRegion> {
        if scan_resolution == 0 {
            return None;
        }
        let [x0, y0, x1, y1] = self.scanner_calibration?;
        let scale = |v: u32| v * scan_resolution / CALIBRATION_RESOLUTION;
        Some(CropRegion::from_corners(
            scale(x0),
            scale(y0),
            scale(x1),
            scale(y1),
        ))
    }

    pub fn workers(&self) -> usize {
        match self.ocr_workers {
            Some(n) if n > 0 => n,
            _ => std::thread::available_parallelism().map_or_else(
                |e| {
                    tracing::error!("Failed to get available parallelism for OCR: {e:#?}");
                    1
                },
                |non_zero| non_zero.get(),
            ),
        }
    }

    pub fn tesseract_path(&self) -> PathBuf {
        self.tesseract_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("tesseract"))
    }
}
