//! Tree mutation hooks for backends.

use crate::{FsError, FsUrl};

/// Structural changes a backend applies on behalf of items.
///
/// [`Item`](crate::Item) and [`Directory`](crate::Directory) never change
/// backend state themselves; they delegate here.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsMutate`.
pub trait FsMutate: Send + Sync {
    /// Remove the node at `url`, including everything below a directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing lives at `url`
    /// - [`FsError::AccessDenied`] if the backend refuses (e.g. the root)
    fn delete(&self, url: &FsUrl) -> Result<(), FsError>;

    /// Give the node at `url` a new name within the same directory.
    ///
    /// Returns the node's new location.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing lives at `url`
    /// - [`FsError::AlreadyExists`] if a sibling already has `new_name`
    fn rename(&self, url: &FsUrl, new_name: &str) -> Result<FsUrl, FsError>;

    /// Create an empty directory at `url` (the parent must exist).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent does not exist
    /// - [`FsError::AlreadyExists`] if the path already exists
    fn create_dir(&self, url: &FsUrl) -> Result<(), FsError>;

    /// Move a node to another location on this same backend.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotImplemented`] unless the backend overrides it
    fn move_item(&self, from: &FsUrl, _to: &FsUrl) -> Result<(), FsError> {
        Err(FsError::NotImplemented {
            operation: "move",
            url: from.to_string(),
        })
    }

    /// Copy a node to another location on this same backend.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotImplemented`] unless the backend overrides it
    fn copy_item(&self, from: &FsUrl, _to: &FsUrl) -> Result<(), FsError> {
        Err(FsError::NotImplemented {
            operation: "copy",
            url: from.to_string(),
        })
    }
}
