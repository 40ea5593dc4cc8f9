//! # Storage Layer
//!
//! Pages have no record apart from their files. The [`ArtifactStore`] maps a page value to
//! its artifacts and owns everything derived from them; the [`StorageBackend`] trait does
//! the raw I/O.
//!
//! ## Files are Truth
//!
//! - A page exists when at least one of its artifacts exists. A page missing any of the
//!   three is *incomplete* but still counted, so a half-written scan never opens a gap.
//! - The document's page list is the set of non-negative keys found in its directory.
//!   Sentinel keys (file numbers `<= 0`) and `rotated.*` temporaries are ignored.
//! - Renames never replace an existing file. Both backends return
//!   [`PaperError::KeyCollision`](crate::error::PaperError::KeyCollision) instead.
//!
//! ## Derived Data
//!
//! Word boxes and page lists are cached in a [`DerivedCache`] until a write, a rename or
//! a destroy touches the page. Thumbnails are persisted and checked against the image by
//! modification time: a thumbnail older than its image, missing or unreadable is rebuilt
//! on the next request.
//!
//! ## Implementations
//!
//! - [`fs_backend::FsBackend`]: Production backend, atomic tmp-then-rename writes.
//! - [`mem_backend::MemBackend`]: For testing without filesystem I/O. Logical clock for
//!   modification times, plus a log of every rename attempt.
//!
//! ## Storage Layout
//!
//! ```text
//! <workdir>/
//! └── 20240312_0915_07/        # Document (creation time)
//!     ├── paper.1.jpg          # Page 0 image
//!     ├── paper.1.words        # Page 0 word boxes
//!     ├── paper.1.thumb.jpg    # Page 0 thumbnail
//!     ├── paper.2.jpg          # Page 1 ...
//!     └── rotated.0.bmp        # Orientation candidate, only while a scan is resolved
//! ```

pub mod artifacts;
pub mod backend;
pub mod cache;
pub mod fs_backend;
pub mod mem_backend;

pub use artifacts::ArtifactStore;
pub use backend::StorageBackend;
pub use cache::DerivedCache;
pub use fs_backend::FsBackend;
pub use mem_backend::MemBackend;
