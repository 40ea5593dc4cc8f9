use crate::commands::{CmdMessage, CmdResult};
use crate::context::PaperContext;
use crate::error::{PaperError, Result};
use crate::events::DocumentEvent;
use crate::index::PageIndexEngine;
use crate::model::{Document, Rotation};
use crate::ocr::resolver::Resolution;
use crate::store::StorageBackend;
use image::DynamicImage;
use std::collections::VecDeque;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Where scanned pages come from. `Ok(None)` means the feeder ran dry.
pub trait ScanSource: Send {
    fn next_page(&mut self) -> Result<Option<DynamicImage>>;

    /// Resolution (DPI) of the produced images, when known.
    fn resolution(&self) -> Option<u32>;
}

/// Reads image files in order, one page per file.
pub struct ImageFileSource {
    files: VecDeque<PathBuf>,
    resolution: Option<u32>,
}

impl ImageFileSource {
    pub fn new(files: Vec<PathBuf>, resolution: Option<u32>) -> Self {
        Self {
            files: files.into(),
            resolution,
        }
    }
}

impl ScanSource for ImageFileSource {
    fn next_page(&mut self) -> Result<Option<DynamicImage>> {
        match self.files.pop_front() {
            Some(path) => Ok(Some(image::open(&path)?)),
            None => Ok(None),
        }
    }

    fn resolution(&self) -> Option<u32> {
        self.resolution
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    /// Existing document to append to; a new one is created when `None`.
    pub document: Option<String>,
    pub pages: usize,
    /// Skip recognition and keep pages unrotated, without text.
    pub skip_ocr: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Complete { pages: usize },
    FeederEmpty { pages: usize, requested: usize },
}

/// Scans a batch. A document this run created is removed again if it fails before
/// storing any page.
pub async fn run<B: StorageBackend>(
    context: &PaperContext<B>,
    source: &mut dyn ScanSource,
    request: &ScanRequest,
    cancel: &CancellationToken,
) -> Result<CmdResult> {
    let mut created = None;
    let mut result = CmdResult::default();

    match scan_pages(context, source, request, cancel, &mut created, &mut result).await {
        Ok(outcome) => {
            result.scan_outcome = Some(outcome);
            Ok(result)
        }
        Err(e) => {
            if let Some(doc) = created.filter(|_| result.affected_pages.is_empty()) {
                warn!(document = %doc, "removing empty document after failed scan");
                if let Err(cleanup) = context.store().destroy_document(&doc) {
                    warn!(document = %doc, error = %cleanup, "failed to remove empty document");
                }
            }
            Err(e)
        }
    }
}

async fn scan_pages<B: StorageBackend>(
    context: &PaperContext<B>,
    source: &mut dyn ScanSource,
    request: &ScanRequest,
    cancel: &CancellationToken,
    created: &mut Option<Document>,
    result: &mut CmdResult,
) -> Result<ScanOutcome> {
    let store = context.store();
    let engine = PageIndexEngine::from_context(context);
    let resolver = context.resolver();
    let langs = context.config.languages();
    let crop = context
        .config
        .crop_region(source.resolution().unwrap_or(context.config.scanner_resolution));

    let mut document: Option<Document> = match &request.document {
        Some(id) => Some(store.document(id)?),
        None => None,
    };
    let mut outcome = ScanOutcome::Complete {
        pages: request.pages,
    };

    for scanned in 0..request.pages {
        if cancel.is_cancelled() {
            return Err(PaperError::Cancelled);
        }
        let Some(image) = source.next_page()? else {
            warn!(scanned, requested = request.pages, "feeder is empty");
            outcome = ScanOutcome::FeederEmpty {
                pages: scanned,
                requested: request.pages,
            };
            result.add_message(CmdMessage::warning(format!(
                "Feeder appears to be empty: scanned {} of {} pages",
                scanned, request.pages
            )));
            break;
        };

        let doc = match &document {
            Some(doc) => doc.clone(),
            None => {
                let doc = store.create_document()?;
                document = Some(doc.clone());
                *created = Some(doc.clone());
                doc
            }
        };

        let resolution = if request.skip_ocr {
            let image = match crop {
                Some(region) => region.apply(&image),
                None => image,
            };
            Resolution {
                rotation: Rotation::Deg0,
                image: DynamicImage::ImageRgb8(image.to_rgb8()),
                text: String::new(),
                boxes: Vec::new(),
                score: 0,
            }
        } else {
            resolver
                .resolve(store, &doc, &image, &langs, crop, cancel)
                .await?
        };

        let page = engine.insert_at_end(&doc)?;
        store.write_image(&page, &resolution.image)?;
        store.write_word_boxes(&page, &resolution.boxes)?;
        store.thumbnail(&page, context.config.thumbnail_width)?;
        info!(page = %page, rotation = %resolution.rotation, "page added");
        context
            .notifier
            .emit(DocumentEvent::PageAdded(page.clone()));

        result.add_message(CmdMessage::success(format!(
            "Scanned {} (rotated {})",
            page, resolution.rotation
        )));
        result.affected_pages.push(page);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::{BoundingBox, LineBox, WordBox};
    use crate::config::PaperConfig;
    use crate::events::EventLog;
    use crate::ocr::{OcrEngine, StaticRegistry};
    use crate::store::MemBackend;
    use std::sync::Arc;

    /// Source handing out prepared images.
    struct QueueSource(VecDeque<DynamicImage>);

    impl ScanSource for QueueSource {
        fn next_page(&mut self) -> Result<Option<DynamicImage>> {
            Ok(self.0.pop_front())
        }

        fn resolution(&self) -> Option<u32> {
            Some(300)
        }
    }

    /// Hands out the inner pages, then fails.
    struct FailingAfter {
        inner: QueueSource,
    }

    impl ScanSource for FailingAfter {
        fn next_page(&mut self) -> Result<Option<DynamicImage>> {
            match self.inner.next_page()? {
                Some(image) => Ok(Some(image)),
                None => Err(PaperError::Store("paper jam".to_string())),
            }
        }

        fn resolution(&self) -> Option<u32> {
            self.inner.resolution()
        }
    }

    /// Reads text only from landscape images.
    struct LandscapeEngine;

    impl OcrEngine for LandscapeEngine {
        fn name(&self) -> &str {
            "landscape"
        }

        fn recognize_text(&self, image: &DynamicImage, _lang: &str) -> Result<String> {
            if image.width() > image.height() {
                Ok("Invoice total amount".to_string())
            } else {
                Ok(String::new())
            }
        }

        fn recognize_boxes(&self, _image: &DynamicImage, _lang: &str) -> Result<Vec<LineBox>> {
            Ok(vec![LineBox::from_words(vec![WordBox::new(
                "Invoice",
                BoundingBox::new(0, 0, 4, 1),
            )])
            .unwrap()])
        }
    }

    fn context() -> (PaperContext<MemBackend>, Arc<EventLog>) {
        let events = Arc::new(EventLog::new());
        let config = PaperConfig {
            workdir: Some(PathBuf::from("/work")),
            ocr_workers: Some(2),
            ..Default::default()
        };
        let context = PaperContext::new(config, MemBackend::new())
            .with_ocr(Arc::new(StaticRegistry::single(Arc::new(LandscapeEngine))))
            .with_listener(events.clone());
        (context, events)
    }

    fn source(n: usize) -> QueueSource {
        QueueSource((0..n).map(|_| DynamicImage::new_rgb8(2, 8)).collect())
    }

    #[tokio::test]
    async fn test_scan_creates_document_and_resolves_orientation() {
        let (context, events) = context();
        let request = ScanRequest {
            pages: 2,
            ..Default::default()
        };

        let result = run(&context, &mut source(2), &request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.scan_outcome, Some(ScanOutcome::Complete { pages: 2 }));
        assert_eq!(result.affected_pages.len(), 2);
        let doc = result.affected_pages[0].document.clone();
        let store = context.store();
        assert_eq!(store.page_indices(&doc).unwrap(), vec![0, 1]);

        let page = doc.page(1);
        assert!(store.is_complete(&page));
        assert_eq!(store.page_text(&page).unwrap(), "Invoice");
        // Portrait scan was turned into landscape
        let image = store.read_image(&page).unwrap();
        assert_eq!((image.width(), image.height()), (8, 2));
        // Only persisted artifacts remain
        assert_eq!(store.backend().file_names(&doc.path).len(), 6);
        assert_eq!(
            events.events(),
            vec![
                DocumentEvent::PageAdded(doc.page(0)),
                DocumentEvent::PageAdded(doc.page(1)),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_feeder_ends_batch_softly() {
        let (context, _) = context();
        let request = ScanRequest {
            pages: 3,
            ..Default::default()
        };

        let result = run(&context, &mut source(1), &request, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            result.scan_outcome,
            Some(ScanOutcome::FeederEmpty {
                pages: 1,
                requested: 3
            })
        );
        assert_eq!(result.affected_pages.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_feeder_creates_no_document() {
        let (context, _) = context();
        let request = ScanRequest {
            pages: 1,
            ..Default::default()
        };
        run(&context, &mut source(0), &request, &CancellationToken::new())
            .await
            .unwrap();
        assert!(context.store().list_documents().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scan_appends_to_existing_document() {
        let (context, _) = context();
        let doc = context.store().create_document_named("existing").unwrap();
        let request = ScanRequest {
            document: Some("existing".to_string()),
            pages: 1,
            skip_ocr: true,
        };
        run(&context, &mut source(1), &request, &CancellationToken::new())
            .await
            .unwrap();
        run(&context, &mut source(1), &request, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(context.store().page_indices(&doc).unwrap(), vec![0, 1]);
    }

    #[tokio::test]
    async fn test_skip_ocr_keeps_scan_as_is() {
        let events = Arc::new(EventLog::new());
        let config = PaperConfig {
            workdir: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        // No engine at all: skipping recognition must not need one
        let context = PaperContext::new(config, MemBackend::new()).with_listener(events.clone());
        let request = ScanRequest {
            pages: 1,
            skip_ocr: true,
            ..Default::default()
        };

        let result = run(&context, &mut source(1), &request, &CancellationToken::new())
            .await
            .unwrap();

        let page = &result.affected_pages[0];
        let image = context.store().read_image(page).unwrap();
        assert_eq!((image.width(), image.height()), (2, 8));
        assert_eq!(context.store().page_text(page).unwrap(), "");
        assert!(context.store().is_complete(page));
        assert_eq!(events.events().len(), 1);
    }

    #[tokio::test]
    async fn test_scan_without_engine_fails() {
        let config = PaperConfig {
            workdir: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let context = PaperContext::new(config, MemBackend::new());
        let request = ScanRequest {
            pages: 1,
            ..Default::default()
        };
        let err = run(&context, &mut source(1), &request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PaperError::NoOcrEngine));
        assert!(context.store().list_documents().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_scan_keeps_existing_document() {
        let config = PaperConfig {
            workdir: Some(PathBuf::from("/work")),
            ..Default::default()
        };
        let context = PaperContext::new(config, MemBackend::new());
        context.store().create_document_named("existing").unwrap();
        let request = ScanRequest {
            document: Some("existing".to_string()),
            pages: 1,
            skip_ocr: false,
        };

        run(&context, &mut source(1), &request, &CancellationToken::new())
            .await
            .unwrap_err();

        let ids: Vec<String> = context
            .store()
            .list_documents()
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["existing".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_after_first_page_keeps_stored_pages() {
        let (context, _) = context();
        let request = ScanRequest {
            pages: 3,
            ..Default::default()
        };
        // The second sheet cannot be decoded
        let mut feeder = FailingAfter { inner: source(1) };

        let err = run(&context, &mut feeder, &request, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PaperError::Store(_)));
        let docs = context.store().list_documents().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(context.store().page_indices(&docs[0]).unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_cancelled_scan_stops_before_next_page() {
        let (context, _) = context();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = ScanRequest {
            pages: 2,
            ..Default::default()
        };
        let err = run(&context, &mut source(2), &request, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, PaperError::Cancelled));
        assert!(context.store().list_documents().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_target_document() {
        let (context, _) = context();
        let request = ScanRequest {
            document: Some("nope".to_string()),
            pages: 1,
            skip_ocr: false,
        };
        let err = run(&context, &mut source(1), &request, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PaperError::DocumentNotFound(_)));
    }

    #[tokio::test]
    async fn test_image_files_scanned_into_workdir() {
        let env = crate::test_utils::TestEnv::new();
        let files = vec![
            env.scan_file("front.png", 12, 30, 10),
            env.scan_file("back.png", 13, 30, 200),
        ];
        let request = ScanRequest {
            pages: 2,
            skip_ocr: true,
            ..Default::default()
        };

        let result = run(
            &env.context,
            &mut ImageFileSource::new(files, Some(300)),
            &request,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let doc = &result.affected_pages[0].document;
        assert!(doc.path.starts_with(env.workdir()));
        assert!(doc.path.join("paper.2.thumb.jpg").is_file());
        let widths: Vec<u32> = env
            .context
            .store()
            .pages(doc)
            .unwrap()
            .iter()
            .map(|page| env.context.store().read_image(page).unwrap().width())
            .collect();
        assert_eq!(widths, vec![12, 13]);
    }
}
