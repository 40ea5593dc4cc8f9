use crate::config::PaperConfig;
use crate::context::PaperContext;
use crate::store::FsBackend;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A filesystem-backed context in a temporary workdir, without recognition engines.
pub struct TestEnv {
    // Kept so the directory outlives the test
    pub _temp_dir: TempDir,
    pub context: PaperContext<FsBackend>,
    pub root: PathBuf,
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let config = PaperConfig {
            workdir: Some(root.join("papers")),
            ocr_workers: Some(2),
            ..Default::default()
        };
        let context = PaperContext::new(config, FsBackend::new());
        Self {
            _temp_dir: temp_dir,
            context,
            root,
        }
    }

    pub fn workdir(&self) -> &Path {
        self.context.store().workdir()
    }

    /// Writes a `width`x`height` PNG with a shade derived from `seed`, returning its path.
    pub fn scan_file(&self, name: &str, width: u32, height: u32, seed: u8) -> PathBuf {
        let path = self.root.join(name);
        let image = RgbImage::from_pixel(width, height, Rgb([seed, seed, seed]));
        DynamicImage::ImageRgb8(image)
            .save(&path)
            .expect("failed to write scan file");
        path
    }
}
