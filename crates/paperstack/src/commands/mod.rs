//! # Command Layer
//!
//! Each operation a client can ask for lives in its own submodule as a plain function over a
//! [`PaperContext`](crate::context::PaperContext).
//!
//! Commands do the work and return a [`CmdResult`]: the pages they touched, listings,
//! extracted text and messages with a level. They never print, prompt or pick exit codes;
//! the client renders the result.
//!
//! Command tests run against [`MemBackend`](crate::store::MemBackend) and scripted
//! recognition engines.
//!
//! ## Command Modules
//!
//! - [`scan`]: acquire pages from a [`scan::ScanSource`], resolve orientation, persist
//! - [`redo_ocr`]: recognize existing pages again, rewriting their word boxes
//! - [`documents`]: list documents and their pages
//! - [`pages`]: move, delete, transfer, text and thumbnails of single pages

use crate::model::Page;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

pub mod documents;
pub mod pages;
pub mod redo_ocr;
pub mod scan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

/// A document as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub path: PathBuf,
    pub pages: usize,
    /// Most recent word-box modification among its pages.
    pub last_modified: Option<DateTime<Utc>>,
}

/// A page as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub document: String,
    /// 1-based, as shown to users.
    pub number: usize,
    pub complete: bool,
    pub last_modified: Option<DateTime<Utc>>,
    /// First line of recognized text.
    pub title: String,
}

/// Text of one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageText {
    pub document: String,
    pub number: usize,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Pages created or changed, with their post-operation index.
    pub affected_pages: Vec<Page>,
    pub listed_pages: Vec<PageSummary>,
    pub documents: Vec<DocumentSummary>,
    pub texts: Vec<PageText>,
    pub paths: Vec<PathBuf>,
    pub messages: Vec<CmdMessage>,
    pub scan_outcome: Option<scan::ScanOutcome>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected_pages(mut self, pages: Vec<Page>) -> Self {
        self.affected_pages = pages;
        self
    }
}
