use crate::commands::{CmdResult, DocumentSummary, PageSummary};
use crate::context::PaperContext;
use crate::error::Result;
use crate::model::Document;
use crate::store::StorageBackend;

/// Every document with its page count and last modification.
pub fn list<B: StorageBackend>(context: &PaperContext<B>) -> Result<CmdResult> {
    let store = context.store();
    let mut result = CmdResult::default();

    for document in store.list_documents()? {
        let pages = store.pages(&document)?;
        let mut last_modified = None;
        for page in &pages {
            last_modified = last_modified.max(store.last_modified(page)?);
        }
        result.documents.push(DocumentSummary {
            id: document.id.clone(),
            path: document.path.clone(),
            pages: pages.len(),
            last_modified,
        });
    }

    Ok(result)
}

/// Pages of `document` in index order.
pub fn pages<B: StorageBackend>(
    context: &PaperContext<B>,
    document: &Document,
) -> Result<CmdResult> {
    let store = context.store();
    let mut result = CmdResult::default();

    for page in store.pages(document)? {
        let title = store
            .read_word_boxes(&page)?
            .first()
            .map(|line| line.content())
            .unwrap_or_default();
        result.listed_pages.push(PageSummary {
            document: document.id.clone(),
            number: page.index + 1,
            complete: store.is_complete(&page),
            last_modified: store.last_modified(&page)?,
            title,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{BoundingBox, LineBox, WordBox};
    use crate::config::PaperConfig;
    use crate::store::MemBackend;
    use image::DynamicImage;
    use std::path::PathBuf;

    fn context() -> PaperContext<MemBackend> {
        let config = PaperConfig {
            workdir: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        PaperContext::new(config, MemBackend::new())
    }

    fn add_page(context: &PaperContext<MemBackend>, document: &Document, index: usize, text: &str) {
        let store = context.store();
        let page = document.page(index);
        store
            .write_image(&page, &DynamicImage::new_rgb8(4, 4))
            .unwrap();
        let line = LineBox::from_words(vec![WordBox::new(text, BoundingBox::new(0, 0, 1, 1))]);
        store
            .write_word_boxes(&page, &line.into_iter().collect::<Vec<_>>())
            .unwrap();
    }

    #[test]
    fn test_list_counts_pages_and_latest_change() {
        let context = context();
        let store = context.store();
        let a = store.create_document_named("a").unwrap();
        let b = store.create_document_named("b").unwrap();
        add_page(&context, &a, 0, "one");
        add_page(&context, &a, 1, "two");

        let result = list(&context).unwrap();

        assert_eq!(result.documents.len(), 2);
        assert_eq!(result.documents[0].id, "a");
        assert_eq!(result.documents[0].pages, 2);
        assert_eq!(
            result.documents[0].last_modified,
            store.last_modified(&a.page(1)).unwrap()
        );
        assert_eq!(result.documents[1].id, b.id);
        assert_eq!(result.documents[1].pages, 0);
        assert_eq!(result.documents[1].last_modified, None);
    }

    #[test]
    fn test_pages_are_numbered_from_one() {
        let context = context();
        let doc = context.store().create_document_named("doc").unwrap();
        add_page(&context, &doc, 0, "Invoice");
        add_page(&context, &doc, 1, "Receipt");

        let result = pages(&context, &doc).unwrap();

        let numbers: Vec<usize> = result.listed_pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(result.listed_pages[1].title, "Receipt");
        // No thumbnail yet
        assert!(!result.listed_pages[0].complete);
    }
}
