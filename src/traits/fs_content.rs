//! Byte-level content hooks for backends.

use crate::{AccessMode, FsError, FsUrl};

/// Content access used by [`File`](crate::File) streams.
///
/// The core never touches storage; every byte goes through these calls.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsContent`.
pub trait FsContent: Send + Sync {
    /// Check whether the file at `url` may be opened with `mode`.
    ///
    /// Defaults to allowing everything.
    ///
    /// # Errors
    ///
    /// - [`FsError::AccessDenied`] if the backend refuses the mode
    /// - [`FsError::NotFound`] if the file is missing and `mode` does not create
    fn check_access(&self, _url: &FsUrl, _mode: AccessMode) -> Result<(), FsError> {
        Ok(())
    }

    /// Length of the file at `url` in bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::NotAFile`] if `url` is a directory
    fn content_len(&self, url: &FsUrl) -> Result<u64, FsError>;

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// Returns fewer bytes at end of file, and none past it.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::NotAFile`] if `url` is a directory
    fn read_range(&self, url: &FsUrl, offset: u64, len: usize) -> Result<Vec<u8>, FsError>;

    /// Write `data` at `offset`, creating the file if needed.
    ///
    /// Writing past the end zero-fills the gap.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent directory does not exist
    /// - [`FsError::AccessDenied`] if the file is read-only
    fn write_at(&self, url: &FsUrl, offset: u64, data: &[u8]) -> Result<(), FsError>;

    /// Resize the file at `url` to exactly `size` bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::AccessDenied`] if the file is read-only
    fn truncate(&self, url: &FsUrl, size: u64) -> Result<(), FsError>;
}
