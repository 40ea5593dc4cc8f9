//! # Page Index Engine
//!
//! A page's index is its on-disk key, so changing the order of a document means renaming
//! files. This engine keeps every document dense (`0..N-1`, no gaps, no duplicates) while
//! never letting a rename land on a file that already exists.
//!
//! ## The Shift Primitive
//!
//! Every renumbering is a sequence of [`PageIndexEngine::shift`] calls, each mapping key
//! `k` to `(k + offset) * factor`:
//!
//! | Step | Offset | Factor | Effect |
//! |------|--------|--------|--------|
//! | Park | `+1` | `-1` | `k` → `-(k + 1)`, out of the page range |
//! | Slide up | `+1` | `+1` | `k` → `k + 1` |
//! | Slide down | `-1` | `+1` | `k` → `k - 1` |
//! | Restore | `(old - new) + 1` | `-1` | parked key → `new` |
//!
//! Before renaming anything, a shift checks that none of its destination paths exist. One
//! occupied destination aborts the whole shift with
//! [`PaperError::KeyCollision`]: the document is corrupt and nothing is repaired here.
//!
//! ## Operations
//!
//! - **Move**: park the page, slide the pages between old and new position toward the
//!   vacated slot (starting next to it, so each target was freed by the previous step),
//!   restore into the new slot.
//! - **Delete**: remove the artifacts, slide every higher page down in ascending order.
//!   Deleting the last page destroys the document.
//! - **Insert at end**: the next free index. Nothing moves.
//! - **Transfer**: check every destination is free, move the artifacts into the other
//!   document, then compact the source as a delete would.
//!
//! Structural operations on one document are not safe to run concurrently; callers
//! serialize them.

use crate::context::PaperContext;
use crate::error::{PaperError, Result};
use crate::events::{DocumentEvent, Notifier};
use crate::model::{Document, Page, PageKey};
use crate::store::{ArtifactStore, StorageBackend};
use std::sync::Arc;
use tracing::{debug, error, info};

/// What happened to the source document after a page left it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// Higher pages moved down; these are their new indices.
    Compacted { reindexed: Vec<usize> },
    /// The page was the only one, so the document is gone.
    DocumentDestroyed,
}

pub struct PageIndexEngine<B: StorageBackend> {
    store: Arc<ArtifactStore<B>>,
    notifier: Notifier,
}

impl<B: StorageBackend> PageIndexEngine<B> {
    pub fn new(store: Arc<ArtifactStore<B>>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub fn from_context(context: &PaperContext<B>) -> Self {
        Self::new(Arc::clone(&context.store), context.notifier.clone())
    }

    fn invalidate_key(&self, document: &Document, key: PageKey) {
        if let Some(index) = key.as_index() {
            self.store.invalidate_page(&document.page(index));
        }
    }

    fn existing_page(&self, page: &Page) -> Result<usize> {
        let count = self.store.page_count(&page.document)?;
        if page.index >= count {
            return Err(PaperError::PageNotFound {
                document: page.document.id.clone(),
                index: page.index,
            });
        }
        Ok(count)
    }

    /// Renames every artifact of `key` to `(key + offset) * factor` and returns the new key.
    pub fn shift(
        &self,
        document: &Document,
        key: PageKey,
        offset: i64,
        factor: i64,
    ) -> Result<PageKey> {
        let target = key.shifted(offset, factor);
        let present = self.store.present_artifacts(document, key);

        for kind in &present {
            let path = self.store.artifact_path(document, target, *kind);
            if self.store.backend().exists(&path) {
                error!(
                    document = %document,
                    from = %key,
                    to = %target,
                    path = %path.display(),
                    "page key collision"
                );
                return Err(PaperError::KeyCollision(path));
            }
        }

        for kind in present {
            self.store.rename_artifact(document, kind, key, target)?;
        }

        self.invalidate_key(document, key);
        self.invalidate_key(document, target);
        self.store.invalidate_page_list(document);
        debug!(document = %document, from = %key, to = %target, "shifted page");
        Ok(target)
    }

    /// Page that a new page appended to `document` should use.
    pub fn insert_at_end(&self, document: &Document) -> Result<Page> {
        let next = self
            .store
            .page_indices(document)?
            .last()
            .map_or(0, |last| last + 1);
        Ok(document.page(next))
    }

    /// Moves `page` to `new_index`, shifting the pages in between. Returns the moved page.
    pub fn move_to(&self, page: &Page, new_index: usize) -> Result<Page> {
        let document = &page.document;
        let count = self.existing_page(page)?;
        if new_index >= count {
            return Err(PaperError::InvalidIndex {
                index: new_index,
                count,
            });
        }
        let old = page.index;
        if old == new_index {
            return Ok(page.clone());
        }

        let parked = self.shift(document, page.key(), 1, -1)?;
        if new_index < old {
            for index in (new_index..old).rev() {
                self.shift(document, PageKey::from_index(index), 1, 1)?;
            }
        } else {
            for index in old + 1..=new_index {
                self.shift(document, PageKey::from_index(index), -1, 1)?;
            }
        }
        let restore_offset = old as i64 - new_index as i64 + 1;
        self.shift(document, parked, restore_offset, -1)?;

        info!(document = %document, from = old, to = new_index, "moved page");
        self.notifier.emit(DocumentEvent::PagesReindexed {
            document: document.clone(),
            pages: (old.min(new_index)..=old.max(new_index)).collect(),
        });
        Ok(document.page(new_index))
    }

    /// Deletes `page`, or the whole document when it is the last page.
    pub fn delete(&self, page: &Page) -> Result<Removal> {
        let count = self.existing_page(page)?;
        if count <= 1 {
            return self.destroy(&page.document);
        }
        self.store.remove_page_artifacts(page)?;
        let removal = self.compact(&page.document, page.index, count)?;
        info!(page = %page, "deleted page");
        Ok(removal)
    }

    /// Moves the artifacts of `source` onto `destination` (in another document), then
    /// compacts the source document.
    pub fn transfer_content(&self, source: &Page, destination: &Page) -> Result<Removal> {
        if source.document == destination.document {
            return Err(PaperError::Api(
                "Source and destination are in the same document; use move".to_string(),
            ));
        }
        let count = self.existing_page(source)?;
        let present = self.store.present_artifacts(&source.document, source.key());

        let moves: Vec<_> = present
            .into_iter()
            .map(|kind| {
                (
                    self.store.page_path(source, kind),
                    self.store.page_path(destination, kind),
                )
            })
            .collect();
        for (_, to) in &moves {
            if self.store.backend().exists(to) {
                error!(
                    source = %source,
                    destination = %destination,
                    path = %to.display(),
                    "transfer destination occupied"
                );
                return Err(PaperError::DestinationOccupied(to.clone()));
            }
        }

        self.store
            .backend()
            .create_dir(&destination.document.path)?;
        for (from, to) in &moves {
            self.store.move_artifact(from, to)?;
        }
        self.store.invalidate_page(source);
        self.store.invalidate_page(destination);
        self.store.invalidate_page_list(&source.document);
        self.store.invalidate_page_list(&destination.document);
        info!(source = %source, destination = %destination, "transferred page");
        self.notifier
            .emit(DocumentEvent::PageAdded(destination.clone()));

        if count <= 1 {
            self.destroy(&source.document)
        } else {
            self.compact(&source.document, source.index, count)
        }
    }

    /// Appends `source` to `destination`. Returns the new page and what became of the source.
    pub fn transfer_to_document(
        &self,
        source: &Page,
        destination: &Document,
    ) -> Result<(Page, Removal)> {
        let target = self.insert_at_end(destination)?;
        let removal = self.transfer_content(source, &target)?;
        Ok((target, removal))
    }

    /// Slides pages `vacated + 1..count` down by one, lowest first.
    fn compact(&self, document: &Document, vacated: usize, count: usize) -> Result<Removal> {
        for index in vacated + 1..count {
            self.shift(document, PageKey::from_index(index), -1, 1)?;
        }
        let reindexed: Vec<usize> = (vacated..count - 1).collect();
        self.notifier
            .emit(DocumentEvent::PageRemoved(document.page(vacated)));
        if !reindexed.is_empty() {
            self.notifier.emit(DocumentEvent::PagesReindexed {
                document: document.clone(),
                pages: reindexed.clone(),
            });
        }
        Ok(Removal::Compacted { reindexed })
    }

    fn destroy(&self, document: &Document) -> Result<Removal> {
        self.store.destroy_document(document)?;
        info!(document = %document, "destroyed document");
        self.notifier
            .emit(DocumentEvent::DocumentDestroyed(document.clone()));
        Ok(Removal::DocumentDestroyed)
    }
}
