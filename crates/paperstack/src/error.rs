use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaperError {
    /// A rename would give a second page the same on-disk key. The index of the
    /// document is corrupt; nothing is repaired automatically.
    #[error("Page key collision: {} already exists", .0.display())]
    KeyCollision(PathBuf),

    #[error("Transfer destination already occupied: {}", .0.display())]
    DestinationOccupied(PathBuf),

    #[error("No OCR engine available")]
    NoOcrEngine,

    #[error("Recognition failed: {0}")]
    Recognition(String),

    #[error("Scoring failed: {0}")]
    Scoring(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Invalid page index {index} (document has {count} pages)")]
    InvalidIndex { index: usize, count: usize },

    #[error("Page not found: {document} page {index}")]
    PageNotFound { document: String, index: usize },

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl PaperError {
    /// Invariant violations abort the operation and must reach the user.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PaperError::KeyCollision(_) | PaperError::DestinationOccupied(_) | PaperError::NoOcrEngine
        )
    }
}

pub type Result<T> = std::result::Result<T, PaperError>;
