//! # Paperstack Architecture
//!
//! Paperstack keeps scanned paper documents on disk: one directory per document, a set of
//! artifacts per page (image, recognized word boxes, thumbnail), and a page order that is
//! nothing more than the numbers in the file names. It is a library that happens to have a
//! CLI client.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (paperstack-cli)                                 │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Normalizes inputs (document ids, 1-based page numbers)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Scan, list, move, delete, transfer, redo OCR             │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                             │
//!                 ▼                             ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Page Index Engine (index.rs) │ │  Orientation (ocr/)       │
//! │  - Dense keys, safe renames   │ │  - 4 rotations, scoring   │
//! └───────────────────────────────┘ └───────────────────────────┘
//!                 │                             │
//!                 ▼                             ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - StorageBackend trait, FsBackend / MemBackend             │
//! │  - ArtifactStore: naming, thumbnails, derived-data cache    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! From `api.rs` inward nothing writes to stdout/stderr or exits the process. Diagnostics go
//! through `tracing`; the client decides where they end up.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Business logic for each command
//! - [`index`]: Page key arithmetic and reordering
//! - [`ocr`]: Recognition engines, scoring chain and orientation resolution
//! - [`store`]: Storage abstraction, artifact naming and thumbnails
//! - [`model`]: Documents, pages, keys, rotations
//! - [`boxes`]: Word and line boxes and their on-disk encoding
//! - [`events`]: Change notifications for observers
//! - [`context`]: Shared handles passed to every command
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod boxes;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod index;
pub mod model;
pub mod ocr;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use api::PaperApi;
pub use context::PaperContext;
pub use error::{PaperError, Result};
pub use model::{Document, Page, PageKey, Rotation};
