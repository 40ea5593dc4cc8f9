use crate::commands::{CmdMessage, CmdResult};
use crate::context::PaperContext;
use crate::error::Result;
use crate::events::DocumentEvent;
use crate::model::Page;
use crate::store::StorageBackend;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Recognizes `pages` again as they are stored, rewriting their word boxes in place.
/// The image is not rotated again.
pub async fn run<B: StorageBackend>(
    context: &PaperContext<B>,
    pages: &[Page],
    cancel: &CancellationToken,
) -> Result<CmdResult> {
    let store = context.store();
    let resolver = context.resolver();
    let langs = context.config.languages();
    let mut result = CmdResult::default();

    for page in pages {
        let image = store.read_image(page)?;
        let resolution = resolver.recognize_single(&image, &langs, cancel).await?;
        store.write_word_boxes(page, &resolution.boxes)?;
        info!(page = %page, lines = resolution.boxes.len(), "page recognized again");
        context
            .notifier
            .emit(DocumentEvent::PageChanged(page.clone()));

        result.add_message(CmdMessage::success(format!(
            "Recognized {}: {} lines",
            page,
            resolution.boxes.len()
        )));
        result.affected_pages.push(page.clone());
    }

    Ok(result)
}
