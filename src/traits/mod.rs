//! # Backend Traits
//!
//! The capability contract a storage provider implements so the core can
//! navigate, search and mutate it.
//!
//! ## Trait Layers
//!
//! ```text
//! FsNavigate + FsMutate + FsContent = Backend
//! ```
//!
//! | Trait | Responsibility |
//! |-------|----------------|
//! | [`FsNavigate`] | `root_url`, `case_sensitive`, `resolve`, `list`, `revision` |
//! | [`FsMutate`] | `delete`, `rename`, `create_dir`, same-backend `move_item`/`copy_item` |
//! | [`FsContent`] | `check_access`, `content_len`, `read_range`, `write_at`, `truncate` |
//!
//! [`Backend`] has a blanket implementation: implement the three component
//! traits and the backend can be handed to [`Filesystem`](crate::Filesystem).
//!
//! ## Object Safety
//!
//! All traits are object-safe; the core holds backends as `Arc<dyn Backend>`.
//!
//! ```rust
//! use ezfs::Backend;
//!
//! fn describe(backend: &dyn Backend) -> String {
//!     format!("{} (case sensitive: {})", backend.root_url(), backend.case_sensitive())
//! }
//! ```

mod fs_content;
mod fs_mutate;
mod fs_navigate;

pub use fs_content::FsContent;
pub use fs_mutate::FsMutate;
pub use fs_navigate::FsNavigate;

/// A complete storage provider.
///
/// Automatically implemented for any type implementing [`FsNavigate`],
/// [`FsMutate`] and [`FsContent`]. You never implement `Backend` directly.
///
/// # Available Methods
///
/// From [`FsNavigate`]:
/// - `root_url`, `case_sensitive`, `resolve`, `list`, `revision`
///
/// From [`FsMutate`]:
/// - `delete`, `rename`, `create_dir`, `move_item`, `copy_item`
///
/// From [`FsContent`]:
/// - `check_access`, `content_len`, `read_range`, `write_at`, `truncate`
pub trait Backend: FsNavigate + FsMutate + FsContent {}

// Blanket implementation - any type implementing all three gets Backend for free
impl<T: FsNavigate + FsMutate + FsContent> Backend for T {}
