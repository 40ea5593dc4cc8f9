//! # Domain Model: Documents, Pages and On-Disk Keys
//!
//! A [`Document`] is a directory. A [`Page`] is a value: the document it belongs to plus
//! its index. Nothing about a page is stored apart from its artifacts, and every artifact
//! path is recomputed from `(document path, key, kind)` on each access. Changing a page's
//! index therefore means renaming files, and a [`Page`] value obtained before a reindex is
//! simply stale; operations hand back the new value.
//!
//! ## Keys and File Numbers
//!
//! [`PageKey`] is the signed on-disk key. Page `i` has key `i` and is stored under file
//! number `i + 1`:
//!
//! ```text
//! <doc>/paper.1.jpg        # page 0 image
//! <doc>/paper.1.words      # page 0 word boxes
//! <doc>/paper.1.thumb.jpg  # page 0 thumbnail
//! <doc>/rotated.2.bmp      # temporary orientation candidate (180°)
//! ```
//!
//! Negative keys form the sentinel region used while renumbering. Key `-(i + 1)` maps to
//! file number `-i`, which is never `>= 1`, so a parked page can never be mistaken for a
//! persisted one.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const FILE_PREFIX: &str = "paper.";
pub const ROTATED_FILE_PREFIX: &str = "rotated.";

/// A document: an ordered, densely indexed sequence of pages living in one directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Document {
    pub id: String,
    pub path: PathBuf,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { id, path }
    }

    pub fn in_workdir(workdir: &Path, id: &str) -> Self {
        Self {
            id: id.to_string(),
            path: workdir.join(id),
        }
    }

    pub fn page(&self, index: usize) -> Page {
        Page::new(self.clone(), index)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Page {
    pub document: Document,
    pub index: usize,
}

impl Page {
    pub fn new(document: Document, index: usize) -> Self {
        Self { document, index }
    }

    pub fn key(&self) -> PageKey {
        PageKey::from_index(self.index)
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} p{}", self.document.id, self.index + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey(pub i64);

impl PageKey {
    pub fn from_index(index: usize) -> Self {
        Self(index as i64)
    }

    pub fn from_file_number(number: i64) -> Self {
        Self(number - 1)
    }

    pub fn file_number(self) -> i64 {
        self.0 + 1
    }

    /// `(key + offset) * factor`, the single primitive every renumbering is built from.
    pub fn shifted(self, offset: i64, factor: i64) -> Self {
        Self((self.0 + offset) * factor)
    }

    pub fn as_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Image,
    WordBoxes,
    Thumbnail,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::WordBoxes,
        ArtifactKind::Image,
        ArtifactKind::Thumbnail,
    ];

    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Image => "jpg",
            ArtifactKind::WordBoxes => "words",
            ArtifactKind::Thumbnail => "thumb.jpg",
        }
    }

    pub fn file_name(self, key: PageKey) -> String {
        format!("{}{}.{}", FILE_PREFIX, key.file_number(), self.extension())
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "jpg" => Some(ArtifactKind::Image),
            "words" => Some(ArtifactKind::WordBoxes),
            "thumb.jpg" => Some(ArtifactKind::Thumbnail),
            _ => None,
        }
    }
}

/// Parses `paper.<n>.<ext>` back into its key and kind. Temporary and foreign files yield `None`.
pub fn parse_artifact_name(name: &str) -> Option<(PageKey, ArtifactKind)> {
    let rest = name.strip_prefix(FILE_PREFIX)?;
    let (number, ext) = rest.split_once('.')?;
    let number: i64 = number.parse().ok()?;
    let kind = ArtifactKind::from_extension(ext)?;
    Some((PageKey::from_file_number(number), kind))
}

/// Clockwise rotation applied to a scan to build an orientation candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Rotation; 4] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    pub fn id(self) -> u8 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 1,
            Rotation::Deg180 => 2,
            Rotation::Deg270 => 3,
        }
    }

    pub fn degrees(self) -> u32 {
        u32::from(self.id()) * 90
    }

    pub fn apply(self, image: &DynamicImage) -> DynamicImage {
        match self {
            Rotation::Deg0 => image.clone(),
            Rotation::Deg90 => image.rotate90(),
            Rotation::Deg180 => image.rotate180(),
            Rotation::Deg270 => image.rotate270(),
        }
    }

    pub fn temp_file_name(self) -> String {
        format!("{}{}.bmp", ROTATED_FILE_PREFIX, self.id())
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Languages handed to the recognition engine and the spell checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub ocr: String,
    pub spelling: Option<String>,
}

impl LanguageConfig {
    pub fn new(ocr: impl Into<String>) -> Self {
        Self {
            ocr: ocr.into(),
            spelling: None,
        }
    }

    pub fn with_spelling(mut self, spelling: impl Into<String>) -> Self {
        self.spelling = Some(spelling.into());
        self
    }
}

/// Pixel region kept from a raw scan before rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn from_corners(x0: u32, y0: u32, x1: u32, y1: u32) -> Self {
        let (left, right) = (x0.min(x1), x0.max(x1));
        let (top, bottom) = (y0.min(y1), y0.max(y1));
        Self {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }

    pub fn apply(&self, image: &DynamicImage) -> DynamicImage {
        image.crop_imm(self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_zero_lives_in_file_one() {
        let doc = Document::new("/tmp/work/20240101_1200_00");
        let page = doc.page(0);
        assert_eq!(page.key().file_number(), 1);
        assert_eq!(ArtifactKind::Image.file_name(page.key()), "paper.1.jpg");
        assert_eq!(
            ArtifactKind::Thumbnail.file_name(page.key()),
            "paper.1.thumb.jpg"
        );
        assert_eq!(doc.id, "20240101_1200_00");
    }

    #[test]
    fn test_sentinel_round_trip() {
        let key = PageKey::from_index(3);
        let parked = key.shifted(1, -1);
        assert_eq!(parked.as_index(), None);
        assert_eq!(parked, PageKey(-4));
        // Parked keys never produce a persisted file number.
        assert!(parked.file_number() < 1);

        // Restore into index 1: offset = (old - new) + 1, factor = -1.
        let restored = parked.shifted((3 - 1) + 1, -1);
        assert_eq!(restored, PageKey(1));
    }

    #[test]
    fn test_sentinel_of_page_zero_is_disjoint() {
        let parked = PageKey::from_index(0).shifted(1, -1);
        assert_eq!(parked.file_number(), 0);
        assert_eq!(parked.as_index(), None);
    }

    #[test]
    fn test_parse_artifact_name() {
        assert_eq!(
            parse_artifact_name("paper.3.words"),
            Some((PageKey(2), ArtifactKind::WordBoxes))
        );
        assert_eq!(
            parse_artifact_name("paper.1.thumb.jpg"),
            Some((PageKey(0), ArtifactKind::Thumbnail))
        );
        assert_eq!(
            parse_artifact_name("paper.-2.jpg"),
            Some((PageKey(-3), ArtifactKind::Image))
        );
        assert_eq!(parse_artifact_name("rotated.1.bmp"), None);
        assert_eq!(parse_artifact_name("paper.x.jpg"), None);
        assert_eq!(parse_artifact_name("paper.1.png"), None);
    }

    #[test]
    fn test_rotation_names_are_disjoint_from_pages() {
        for rotation in Rotation::ALL {
            assert!(parse_artifact_name(&rotation.temp_file_name()).is_none());
        }
        assert_eq!(Rotation::Deg270.temp_file_name(), "rotated.3.bmp");
        assert_eq!(Rotation::Deg180.to_string(), "180°");
    }

    #[test]
    fn test_rotation_swaps_dimensions() {
        let image = DynamicImage::new_rgb8(40, 10);
        assert_eq!(Rotation::Deg90.apply(&image).width(), 10);
        assert_eq!(Rotation::Deg180.apply(&image).width(), 40);
        assert_eq!(Rotation::Deg270.apply(&image).height(), 40);
    }

    #[test]
    fn test_crop_region_normalizes_corners() {
        let region = CropRegion::from_corners(50, 80, 10, 20);
        assert_eq!(
            region,
            CropRegion {
                x: 10,
                y: 20,
                width: 40,
                height: 60
            }
        );
        let cropped = region.apply(&DynamicImage::new_rgb8(100, 100));
        assert_eq!((cropped.width(), cropped.height()), (40, 60));
    }
}
