//! # API Facade
//!
//! The API layer is a thin facade over the command layer and the single entry point for
//! clients. It turns user-facing references (document ids, 1-based page numbers) into
//! [`Page`] values, dispatches to a command function and hands back its [`CmdResult`].
//!
//! Business logic belongs in [`crate::commands`]; printing and exit codes belong to the
//! client.
//!
//! Structural operations take `&mut self`: one facade serializes the renames it issues.

use crate::commands::{self, CmdResult};
use crate::context::PaperContext;
use crate::error::{PaperError, Result};
use crate::model::{Document, Page};
use crate::store::StorageBackend;
use tokio_util::sync::CancellationToken;

pub struct PaperApi<B: StorageBackend> {
    context: PaperContext<B>,
}

impl<B: StorageBackend> PaperApi<B> {
    pub fn new(context: PaperContext<B>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &PaperContext<B> {
        &self.context
    }

    pub fn document(&self, id: &str) -> Result<Document> {
        self.context.store().document(id)
    }

    /// Page `number` (1-based) of document `id`.
    pub fn page(&self, id: &str, number: usize) -> Result<Page> {
        let index = number
            .checked_sub(1)
            .ok_or_else(|| PaperError::Api("Page numbers start at 1".to_string()))?;
        let document = self.document(id)?;
        self.context.store().page(&document, index)
    }

    fn pages(&self, id: &str, numbers: &[usize]) -> Result<Vec<Page>> {
        if numbers.is_empty() {
            let document = self.document(id)?;
            return self.context.store().pages(&document);
        }
        numbers.iter().map(|n| self.page(id, *n)).collect()
    }

    pub async fn scan(
        &mut self,
        source: &mut dyn commands::scan::ScanSource,
        request: &commands::scan::ScanRequest,
        cancel: &CancellationToken,
    ) -> Result<CmdResult> {
        commands::scan::run(&self.context, source, request, cancel).await
    }

    pub fn list_documents(&self) -> Result<CmdResult> {
        commands::documents::list(&self.context)
    }

    pub fn list_pages(&self, id: &str) -> Result<CmdResult> {
        let document = self.document(id)?;
        commands::documents::pages(&self.context, &document)
    }

    /// Text of the given pages, or of every page when `numbers` is empty.
    pub fn page_text(&self, id: &str, numbers: &[usize]) -> Result<CmdResult> {
        let pages = self.pages(id, numbers)?;
        commands::pages::text(&self.context, &pages)
    }

    pub fn move_page(&mut self, id: &str, number: usize, new_number: usize) -> Result<CmdResult> {
        let page = self.page(id, number)?;
        let new_index = new_number
            .checked_sub(1)
            .ok_or_else(|| PaperError::Api("Page numbers start at 1".to_string()))?;
        commands::pages::move_page(&self.context, &page, new_index)
    }

    pub fn delete_page(&mut self, id: &str, number: usize) -> Result<CmdResult> {
        let page = self.page(id, number)?;
        commands::pages::delete_page(&self.context, &page)
    }

    pub fn transfer_page(
        &mut self,
        id: &str,
        number: usize,
        destination: &str,
    ) -> Result<CmdResult> {
        let page = self.page(id, number)?;
        let destination = self.document(destination)?;
        commands::pages::transfer_page(&self.context, &page, &destination)
    }

    /// Recognizes the given pages again, or every page when `numbers` is empty.
    pub async fn redo_ocr(
        &mut self,
        id: &str,
        numbers: &[usize],
        cancel: &CancellationToken,
    ) -> Result<CmdResult> {
        let pages = self.pages(id, numbers)?;
        commands::redo_ocr::run(&self.context, &pages, cancel).await
    }

    pub fn thumbnail(&self, id: &str, number: usize, width: Option<u32>) -> Result<CmdResult> {
        let page = self.page(id, number)?;
        commands::pages::thumbnail(&self.context, &page, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaperConfig;
    use crate::store::MemBackend;
    use image::DynamicImage;
    use std::path::PathBuf;

    fn api_with_pages(n: usize) -> PaperApi<MemBackend> {
        let config = PaperConfig {
            workdir: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let context = PaperContext::new(config, MemBackend::new());
        let doc = context.store().create_document_named("doc").unwrap();
        for index in 0..n {
            context
                .store()
                .write_image(&doc.page(index), &DynamicImage::new_rgb8(2, 2))
                .unwrap();
        }
        PaperApi::new(context)
    }

    #[test]
    fn test_page_numbers_are_one_based() {
        let api = api_with_pages(2);
        assert_eq!(api.page("doc", 1).unwrap().index, 0);
        assert!(matches!(api.page("doc", 0), Err(PaperError::Api(_))));
        assert!(matches!(
            api.page("doc", 3),
            Err(PaperError::PageNotFound { index: 2, .. })
        ));
        assert!(matches!(
            api.page("other", 1),
            Err(PaperError::DocumentNotFound(_))
        ));
    }

    #[test]
    fn test_move_page_converts_target_number() {
        let mut api = api_with_pages(3);
        let result = api.move_page("doc", 3, 1).unwrap();
        assert_eq!(result.affected_pages[0].index, 0);
        assert!(api.move_page("doc", 1, 0).is_err());
    }

    #[test]
    fn test_empty_selection_means_every_page() {
        let api = api_with_pages(3);
        assert_eq!(api.page_text("doc", &[]).unwrap().texts.len(), 3);
        assert_eq!(api.page_text("doc", &[2]).unwrap().texts.len(), 1);
    }

    #[test]
    fn test_delete_and_list() {
        let mut api = api_with_pages(2);
        api.delete_page("doc", 1).unwrap();
        let listing = api.list_documents().unwrap();
        assert_eq!(listing.documents[0].pages, 1);
        assert_eq!(api.list_pages("doc").unwrap().listed_pages.len(), 1);
    }
}
