//! # Change Notifications
//!
//! Whenever a page is created, renumbered, rewritten or its document removed, the
//! operation emits a [`DocumentEvent`] to every registered [`DocumentListener`].
//! Search indexers and UI refresh logic subscribe here; neither lives in this crate.
//!
//! Events are delivered synchronously, after the operation has left the document in a
//! dense state.

use crate::model::{Document, Page};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    PageAdded(Page),
    /// Text or image of the page was rewritten in place.
    PageChanged(Page),
    /// The page left its document, deleted or transferred away. Any later pages
    /// follow as `PagesReindexed`.
    PageRemoved(Page),
    /// Indices of `pages` changed (or their content moved in from elsewhere).
    PagesReindexed { document: Document, pages: Vec<usize> },
    DocumentDestroyed(Document),
}

impl DocumentEvent {
    pub fn document(&self) -> &Document {
        match self {
            DocumentEvent::PageAdded(page)
            | DocumentEvent::PageChanged(page)
            | DocumentEvent::PageRemoved(page) => &page.document,
            DocumentEvent::PagesReindexed { document, .. } => document,
            DocumentEvent::DocumentDestroyed(document) => document,
        }
    }
}

pub trait DocumentListener: Send + Sync {
    fn on_event(&self, event: &DocumentEvent);
}

#[derive(Clone, Default)]
pub struct Notifier {
    listeners: Vec<Arc<dyn DocumentListener>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Arc<dyn DocumentListener>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: DocumentEvent) {
        debug!(?event, listeners = self.listeners.len(), "document event");
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }
}

/// Listener that records every event, for collaborators that poll and for tests.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<DocumentEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DocumentEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn take(&self) -> Vec<DocumentEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DocumentListener for EventLog {
    fn on_event(&self, event: &DocumentEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
