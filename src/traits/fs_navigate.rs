//! Navigation operations for backends.

use crate::{Entry, FsError, FsUrl};

/// Lookup and listing operations a backend must answer.
///
/// All methods use `&self`; backends manage their own synchronization.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsNavigate`.
pub trait FsNavigate: Send + Sync {
    /// The URL of this backend's root directory (path `/`).
    fn root_url(&self) -> &FsUrl;

    /// Whether name lookups must match case exactly.
    ///
    /// Defaults to `true`.
    fn case_sensitive(&self) -> bool {
        true
    }

    /// Describe the node at `url`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing lives at `url`
    fn resolve(&self, url: &FsUrl) -> Result<Entry, FsError>;

    /// List the direct children of the directory at `dir`.
    ///
    /// Called on every access; the core keeps no listing cache.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the directory does not exist
    /// - [`FsError::NotADirectory`] if `dir` is a file
    fn list(&self, dir: &FsUrl) -> Result<Vec<Entry>, FsError>;

    /// A change counter for the node at `url`, used by watchers.
    ///
    /// `Ok(None)` means the backend cannot detect changes; this is the default.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing lives at `url`
    fn revision(&self, _url: &FsUrl) -> Result<Option<u64>, FsError> {
        Ok(None)
    }
}
