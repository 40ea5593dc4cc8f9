use crate::commands::{CmdMessage, CmdResult, PageText};
use crate::context::PaperContext;
use crate::error::Result;
use crate::index::{PageIndexEngine, Removal};
use crate::model::{ArtifactKind, Document, Page};
use crate::store::StorageBackend;

fn removal_message(document: &Document, removal: &Removal) -> Option<CmdMessage> {
    match removal {
        Removal::DocumentDestroyed => Some(CmdMessage::info(format!(
            "Document {} had no pages left and was removed",
            document
        ))),
        Removal::Compacted { .. } => None,
    }
}

pub fn move_page<B: StorageBackend>(
    context: &PaperContext<B>,
    page: &Page,
    new_index: usize,
) -> Result<CmdResult> {
    let engine = PageIndexEngine::from_context(context);
    let moved = engine.move_to(page, new_index)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Moved {} to {}", page, moved)));
    Ok(result.with_affected_pages(vec![moved]))
}

pub fn delete_page<B: StorageBackend>(context: &PaperContext<B>, page: &Page) -> Result<CmdResult> {
    let engine = PageIndexEngine::from_context(context);
    let removal = engine.delete(page)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Deleted {}", page)));
    if let Some(message) = removal_message(&page.document, &removal) {
        result.add_message(message);
    }
    Ok(result)
}

/// Appends `page` to `destination`, removing it from its own document.
pub fn transfer_page<B: StorageBackend>(
    context: &PaperContext<B>,
    page: &Page,
    destination: &Document,
) -> Result<CmdResult> {
    let engine = PageIndexEngine::from_context(context);
    let (target, removal) = engine.transfer_to_document(page, destination)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Moved {} to {}", page, target)));
    if let Some(message) = removal_message(&page.document, &removal) {
        result.add_message(message);
    }
    Ok(result.with_affected_pages(vec![target]))
}

pub fn text<B: StorageBackend>(context: &PaperContext<B>, pages: &[Page]) -> Result<CmdResult> {
    let store = context.store();
    let mut result = CmdResult::default();
    for page in pages {
        result.texts.push(PageText {
            document: page.document.id.clone(),
            number: page.index + 1,
            text: store.page_text(page)?,
        });
    }
    Ok(result)
}

/// Makes sure the thumbnail of `page` is current at `width` and returns its path.
pub fn thumbnail<B: StorageBackend>(
    context: &PaperContext<B>,
    page: &Page,
    width: Option<u32>,
) -> Result<CmdResult> {
    let store = context.store();
    let width = width.unwrap_or(context.config.thumbnail_width);
    let thumb = store.thumbnail(page, width)?;
    let mut result = CmdResult::default();
    result.paths.push(store.page_path(page, ArtifactKind::Thumbnail));
    result.add_message(CmdMessage::info(format!(
        "Thumbnail of {}: {}x{}",
        page,
        thumb.width(),
        thumb.height()
    )));
    Ok(result)
}
