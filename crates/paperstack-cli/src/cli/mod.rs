//! # CLI Behavior
//!
//! One possible client for paperstack. Pages are addressed as `<document> <number>`, with
//! numbers starting at 1 as printed by `paperstack pages`.
//!
//! ## Scanning
//!
//! `paperstack scan a.png b.png` treats every file as one sheet coming out of the feeder,
//! detects its orientation with tesseract and stores it as a new document. `--document`
//! appends to an existing one; `--no-ocr` stores pages as they are, without text.
//!
//! Ctrl-C stops a running scan or OCR pass. Pages already stored are kept.
//!
//! ## Logging
//!
//! Diagnostics go to stderr through `tracing`. The default level is `warn`; `-v` raises it
//! to `debug`, and `RUST_LOG` overrides both.
//!
//! ## Module Structure
//!
//! - `commands`: Context setup and per-command dispatch
//! - `render`: Output formatting
//! - `setup`: Argument parsing via clap

mod commands;
mod render;
pub mod setup;

pub use commands::run;
pub use render::error_hint;
