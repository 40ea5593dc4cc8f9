use crate::boxes::LineBox;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Data derived from page artifacts, kept until a write or reindex touches the page.
///
/// Entries are keyed by document path and page index, so any renumbering must drop the
/// affected entries; the index engine does this through the store's invalidation hooks.
#[derive(Debug, Default)]
pub struct DerivedCache {
    boxes: Mutex<HashMap<(PathBuf, usize), Arc<Vec<LineBox>>>>,
    indices: Mutex<HashMap<PathBuf, Vec<usize>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl DerivedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxes(&self, document: &Path, index: usize) -> Option<Arc<Vec<LineBox>>> {
        lock(&self.boxes)
            .get(&(document.to_path_buf(), index))
            .cloned()
    }

    pub fn store_boxes(&self, document: &Path, index: usize, lines: Arc<Vec<LineBox>>) {
        lock(&self.boxes).insert((document.to_path_buf(), index), lines);
    }

    pub fn page_indices(&self, document: &Path) -> Option<Vec<usize>> {
        lock(&self.indices).get(document).cloned()
    }

    pub fn store_page_indices(&self, document: &Path, indices: Vec<usize>) {
        lock(&self.indices).insert(document.to_path_buf(), indices);
    }

    pub fn invalidate_page_indices(&self, document: &Path) {
        lock(&self.indices).remove(document);
    }

    pub fn invalidate_page(&self, document: &Path, index: usize) {
        lock(&self.boxes).remove(&(document.to_path_buf(), index));
    }

    /// Drops every entry of the document, including its page list.
    pub fn invalidate_document(&self, document: &Path) {
        lock(&self.boxes).retain(|(doc, _), _| doc != document);
        lock(&self.indices).remove(document);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalidate_page_keeps_siblings() {
        let cache = DerivedCache::new();
        let doc = Path::new("/w/doc");
        cache.store_boxes(doc, 0, Arc::new(Vec::new()));
        cache.store_boxes(doc, 1, Arc::new(Vec::new()));

        cache.invalidate_page(doc, 0);
        assert!(cache.boxes(doc, 0).is_none());
        assert!(cache.boxes(doc, 1).is_some());
    }

    #[test]
    fn test_invalidate_document_only_touches_that_document() {
        let cache = DerivedCache::new();
        let a = Path::new("/w/a");
        let b = Path::new("/w/b");
        cache.store_boxes(a, 0, Arc::new(Vec::new()));
        cache.store_boxes(b, 0, Arc::new(Vec::new()));
        cache.store_page_indices(a, vec![0]);

        cache.invalidate_document(a);
        assert!(cache.boxes(a, 0).is_none());
        assert!(cache.page_indices(a).is_none());
        assert!(cache.boxes(b, 0).is_some());
    }
}
