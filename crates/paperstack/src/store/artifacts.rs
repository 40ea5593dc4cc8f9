use super::backend::StorageBackend;
use super::cache::DerivedCache;
use crate::boxes::{self, LineBox};
use crate::error::{PaperError, Result};
use crate::model::{parse_artifact_name, ArtifactKind, Document, Page, PageKey, Rotation};
use chrono::{DateTime, Local, Utc};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

const DOCUMENT_ID_FORMAT: &str = "%Y%m%d_%H%M_%S";

pub struct ArtifactStore<B: StorageBackend> {
    /// Exposed as pub(crate) for the index engine and tests.
    pub(crate) backend: B,
    workdir: PathBuf,
    cache: DerivedCache,
}

fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    // JPEG and BMP writers reject alpha channels
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut bytes = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

/// Height keeping the aspect ratio of `source` at `width`, truncated, at least 1.
pub fn thumbnail_height(source_width: u32, source_height: u32, width: u32) -> u32 {
    if source_width == 0 || source_height == 0 {
        return 1;
    }
    let ratio = f64::from(source_width) / f64::from(source_height);
    ((f64::from(width) / ratio) as u32).max(1)
}

impl<B: StorageBackend> ArtifactStore<B> {
    pub fn new(backend: B, workdir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            workdir: workdir.into(),
            cache: DerivedCache::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    // --- Paths ---

    pub fn artifact_path(&self, document: &Document, key: PageKey, kind: ArtifactKind) -> PathBuf {
        document.path.join(kind.file_name(key))
    }

    pub fn page_path(&self, page: &Page, kind: ArtifactKind) -> PathBuf {
        self.artifact_path(&page.document, page.key(), kind)
    }

    pub fn temp_path(&self, document: &Document, rotation: Rotation) -> PathBuf {
        document.path.join(rotation.temp_file_name())
    }

    // --- Documents ---

    /// Creates a new, empty document named after the current local time.
    pub fn create_document(&self) -> Result<Document> {
        let base = Local::now().format(DOCUMENT_ID_FORMAT).to_string();
        let mut id = base.clone();
        let mut suffix = 1;
        while self.backend.dir_exists(&self.workdir.join(&id)) {
            id = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.create_document_named(&id)
    }

    pub fn create_document_named(&self, id: &str) -> Result<Document> {
        let document = Document::in_workdir(&self.workdir, id);
        self.backend.create_dir(&document.path)?;
        debug!(document = %document, "created document");
        Ok(document)
    }

    pub fn document(&self, id: &str) -> Result<Document> {
        let document = Document::in_workdir(&self.workdir, id);
        if self.backend.dir_exists(&document.path) {
            Ok(document)
        } else {
            Err(PaperError::DocumentNotFound(id.to_string()))
        }
    }

    /// Every document directory in the workdir, ordered by id.
    pub fn list_documents(&self) -> Result<Vec<Document>> {
        let mut documents: Vec<Document> = self
            .backend
            .list_dirs(&self.workdir)?
            .into_iter()
            .map(Document::new)
            .collect();
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(documents)
    }

    pub fn destroy_document(&self, document: &Document) -> Result<()> {
        self.backend.remove_dir(&document.path)?;
        self.cache.invalidate_document(&document.path);
        debug!(document = %document, "destroyed document");
        Ok(())
    }

    // --- Pages ---

    /// Indices of every page with at least one artifact on disk, ascending.
    /// A dense document yields exactly `0..N`.
    pub fn page_indices(&self, document: &Document) -> Result<Vec<usize>> {
        if let Some(indices) = self.cache.page_indices(&document.path) {
            return Ok(indices);
        }
        let keys: BTreeSet<usize> = self
            .backend
            .list_files(&document.path)?
            .iter()
            .filter_map(|name| parse_artifact_name(name))
            .filter_map(|(key, _)| key.as_index())
            .collect();
        let indices: Vec<usize> = keys.into_iter().collect();
        self.cache
            .store_page_indices(&document.path, indices.clone());
        Ok(indices)
    }

    pub fn page_count(&self, document: &Document) -> Result<usize> {
        Ok(self.page_indices(document)?.len())
    }

    pub fn pages(&self, document: &Document) -> Result<Vec<Page>> {
        Ok(self
            .page_indices(document)?
            .into_iter()
            .map(|index| document.page(index))
            .collect())
    }

    pub fn page(&self, document: &Document, index: usize) -> Result<Page> {
        let page = document.page(index);
        if self.present_artifacts(document, page.key()).is_empty() {
            return Err(PaperError::PageNotFound {
                document: document.id.clone(),
                index,
            });
        }
        Ok(page)
    }

    /// Artifact kinds of `key` currently on disk.
    pub fn present_artifacts(&self, document: &Document, key: PageKey) -> Vec<ArtifactKind> {
        ArtifactKind::ALL
            .into_iter()
            .filter(|kind| {
                self.backend
                    .exists(&self.artifact_path(document, key, *kind))
            })
            .collect()
    }

    /// A page is complete when image, word boxes and thumbnail all exist.
    pub fn is_complete(&self, page: &Page) -> bool {
        self.present_artifacts(&page.document, page.key()).len() == ArtifactKind::ALL.len()
    }

    pub(crate) fn rename_artifact(
        &self,
        document: &Document,
        kind: ArtifactKind,
        from: PageKey,
        to: PageKey,
    ) -> Result<()> {
        let source = self.artifact_path(document, from, kind);
        let target = self.artifact_path(document, to, kind);
        debug!(from = %source.display(), to = %target.display(), "rename");
        self.backend.rename(&source, &target)
    }

    pub(crate) fn move_artifact(&self, from: &Path, to: &Path) -> Result<()> {
        debug!(from = %from.display(), to = %to.display(), "move");
        self.backend.rename(from, to)
    }

    pub fn remove_page_artifacts(&self, page: &Page) -> Result<()> {
        for kind in ArtifactKind::ALL {
            self.backend.remove(&self.page_path(page, kind))?;
        }
        self.invalidate_page(page);
        self.cache.invalidate_page_indices(&page.document.path);
        Ok(())
    }

    // --- Artifacts ---

    pub fn read_image(&self, page: &Page) -> Result<DynamicImage> {
        let bytes = self
            .backend
            .read(&self.page_path(page, ArtifactKind::Image))?
            .ok_or_else(|| PaperError::PageNotFound {
                document: page.document.id.clone(),
                index: page.index,
            })?;
        Ok(image::load_from_memory(&bytes)?)
    }

    pub fn write_image(&self, page: &Page, image: &DynamicImage) -> Result<()> {
        let bytes = encode_image(image, ImageFormat::Jpeg)?;
        self.backend
            .write(&self.page_path(page, ArtifactKind::Image), &bytes)?;
        self.invalidate_page(page);
        self.cache.invalidate_page_indices(&page.document.path);
        Ok(())
    }

    /// Word boxes of the page; empty when the page has no word-box artifact.
    pub fn read_word_boxes(&self, page: &Page) -> Result<Arc<Vec<LineBox>>> {
        if let Some(lines) = self.cache.boxes(&page.document.path, page.index) {
            return Ok(lines);
        }
        let lines = match self
            .backend
            .read(&self.page_path(page, ArtifactKind::WordBoxes))?
        {
            Some(bytes) => boxes::decode(&String::from_utf8_lossy(&bytes))?,
            None => Vec::new(),
        };
        let lines = Arc::new(lines);
        self.cache
            .store_boxes(&page.document.path, page.index, Arc::clone(&lines));
        Ok(lines)
    }

    pub fn write_word_boxes(&self, page: &Page, lines: &[LineBox]) -> Result<()> {
        let encoded = boxes::encode(lines)?;
        self.backend.write(
            &self.page_path(page, ArtifactKind::WordBoxes),
            encoded.as_bytes(),
        )?;
        self.invalidate_page(page);
        self.cache.invalidate_page_indices(&page.document.path);
        Ok(())
    }

    pub fn page_text(&self, page: &Page) -> Result<String> {
        Ok(boxes::text_of(&self.read_word_boxes(page)?))
    }

    /// Modification time of the word-box artifact.
    pub fn last_modified(&self, page: &Page) -> Result<Option<DateTime<Utc>>> {
        self.backend
            .modified(&self.page_path(page, ArtifactKind::WordBoxes))
    }

    /// Thumbnail of the page at `width`, regenerated when older than the image or sized differently.
    pub fn thumbnail(&self, page: &Page, width: u32) -> Result<DynamicImage> {
        let width = width.max(1);
        let image_path = self.page_path(page, ArtifactKind::Image);
        let thumb_path = self.page_path(page, ArtifactKind::Thumbnail);

        let image_mtime =
            self.backend
                .modified(&image_path)?
                .ok_or_else(|| PaperError::PageNotFound {
                    document: page.document.id.clone(),
                    index: page.index,
                })?;

        if let Some(thumb_mtime) = self.backend.modified(&thumb_path)? {
            if thumb_mtime >= image_mtime {
                match self.load_thumbnail(&thumb_path) {
                    Ok(thumb) if thumb.width() == width => return Ok(thumb),
                    Ok(thumb) => debug!(page = %page, cached = thumb.width(), width, "thumbnail width changed"),
                    Err(e) => warn!(page = %page, error = %e, "unreadable thumbnail, regenerating"),
                }
            }
        }

        let source = self.read_image(page)?;
        let height = thumbnail_height(source.width(), source.height(), width);
        let thumb = source.resize_exact(width, height, FilterType::Lanczos3);
        let bytes = encode_image(&thumb, ImageFormat::Jpeg)?;
        self.backend.write(&thumb_path, &bytes)?;
        debug!(page = %page, width, height, "thumbnail regenerated");
        Ok(thumb)
    }

    fn load_thumbnail(&self, path: &Path) -> Result<DynamicImage> {
        let bytes = self
            .backend
            .read(path)?
            .ok_or_else(|| PaperError::Store(format!("Thumbnail vanished: {}", path.display())))?;
        Ok(image::load_from_memory(&bytes)?)
    }

    // --- Temporary candidates ---

    pub fn write_temp_candidate(
        &self,
        document: &Document,
        rotation: Rotation,
        image: &DynamicImage,
    ) -> Result<PathBuf> {
        let path = self.temp_path(document, rotation);
        let bytes = encode_image(image, ImageFormat::Bmp)?;
        self.backend.write(&path, &bytes)?;
        Ok(path)
    }

    pub fn remove_temp(&self, path: &Path) -> Result<()> {
        self.backend.remove(path)
    }

    // --- Cache invalidation ---

    pub fn invalidate_page(&self, page: &Page) {
        self.cache.invalidate_page(&page.document.path, page.index);
    }

    /// Forgets the document's page list; page entries are kept.
    pub fn invalidate_page_list(&self, document: &Document) {
        self.cache.invalidate_page_indices(&document.path);
    }
}
