//! # Text Recognition and Orientation
//!
//! Recognition itself is external. This module defines the seams it plugs into and the
//! [`resolver::OrientationResolver`] that uses them to decide which way up a scan is.
//!
//! - [`OcrEngine`]: recognizes text, or line/word boxes, in an image.
//! - [`EngineRegistry`]: lists the engines available on this machine; the first one is used.
//! - [`scoring`]: ranks recognized text so the resolver can compare rotations.
//!
//! Engines are called from blocking worker threads, hence `Send + Sync` and synchronous
//! signatures.

use crate::boxes::LineBox;
use crate::error::Result;
use crate::model::Rotation;
use image::DynamicImage;
use std::sync::Arc;

pub mod resolver;
pub mod scoring;
pub mod tesseract;

pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    fn recognize_text(&self, image: &DynamicImage, lang: &str) -> Result<String>;

    fn recognize_boxes(&self, image: &DynamicImage, lang: &str) -> Result<Vec<LineBox>>;
}

pub trait EngineRegistry: Send + Sync {
    fn available(&self) -> Vec<Arc<dyn OcrEngine>>;

    fn first(&self) -> Option<Arc<dyn OcrEngine>> {
        self.available().into_iter().next()
    }
}

/// Fixed list of engines.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    engines: Vec<Arc<dyn OcrEngine>>,
}

impl StaticRegistry {
    pub fn new(engines: Vec<Arc<dyn OcrEngine>>) -> Self {
        Self { engines }
    }

    pub fn single(engine: Arc<dyn OcrEngine>) -> Self {
        Self::new(vec![engine])
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl EngineRegistry for StaticRegistry {
    fn available(&self) -> Vec<Arc<dyn OcrEngine>> {
        self.engines.clone()
    }
}

/// One rotation of a scan, before and after recognition.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub rotation: Rotation,
    pub image: DynamicImage,
    pub text: String,
    pub score: i64,
}

impl Candidate {
    pub fn new(rotation: Rotation, image: DynamicImage) -> Self {
        Self {
            rotation,
            image,
            text: String::new(),
            score: 0,
        }
    }
}
