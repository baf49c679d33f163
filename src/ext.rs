//! # Extension Traits
//!
//! Convenience methods for backends.
//!
//! ## Overview
//!
//! [`BackendExt`] provides commonly-needed helpers that aren't part of the
//! capability contract. They are default methods with a blanket
//! implementation, so any [`Backend`] gets them for free.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`exists`](BackendExt::exists) | Check if anything lives at a URL |
//! | [`is_file`](BackendExt::is_file) | Check if a URL is a file |
//! | [`is_dir`](BackendExt::is_dir) | Check if a URL is a directory |
//! | [`read_all`](BackendExt::read_all) | Read a whole file |
//! | [`write_all`](BackendExt::write_all) | Replace a file's content |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, [`BackendExtJson`] adds `read_json` and
//! `write_json`.

use crate::{Backend, FsError, FsUrl, ItemKind};

/// Extension methods for any backend.
///
/// # Example
///
/// ```rust
/// use ezfs::{BackendExt, FsUrl, MemoryFs};
///
/// let fs = MemoryFs::new();
/// fs.insert_file("/notes.txt", "hello").unwrap();
///
/// let url = FsUrl::parse("mem:///notes.txt").unwrap();
/// assert!(fs.is_file(&url).unwrap());
/// assert_eq!(fs.read_all(&url).unwrap(), b"hello");
/// ```
pub trait BackendExt: Backend {
    /// Check if anything lives at `url`.
    ///
    /// Returns `Ok(false)` for a missing node; other failures are errors.
    fn exists(&self, url: &FsUrl) -> Result<bool, FsError> {
        match self.resolve(url) {
            Ok(_) => Ok(true),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if `url` is a file.
    ///
    /// Returns `Ok(false)` if the node doesn't exist (not an error).
    fn is_file(&self, url: &FsUrl) -> Result<bool, FsError> {
        match self.resolve(url) {
            Ok(entry) => Ok(entry.kind == ItemKind::File),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check if `url` is a directory.
    ///
    /// Returns `Ok(false)` if the node doesn't exist (not an error).
    fn is_dir(&self, url: &FsUrl) -> Result<bool, FsError> {
        match self.resolve(url) {
            Ok(entry) => Ok(entry.kind == ItemKind::Directory),
            Err(FsError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Read the entire content of the file at `url`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the file does not exist
    /// - [`FsError::NotAFile`] if `url` is a directory
    fn read_all(&self, url: &FsUrl) -> Result<Vec<u8>, FsError> {
        let len = self.content_len(url)?;
        let len = usize::try_from(len).map_err(|_| FsError::Backend(format!(
            "file too large to read into memory: {url}"
        )))?;
        self.read_range(url, 0, len)
    }

    /// Replace the content of the file at `url`, creating it if needed.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the parent directory does not exist
    /// - [`FsError::AccessDenied`] if the file is read-only
    fn write_all(&self, url: &FsUrl, data: &[u8]) -> Result<(), FsError> {
        self.write_at(url, 0, data)?;
        self.truncate(url, data.len() as u64)
    }
}

// Blanket implementation - any backend gets BackendExt for free
impl<B: Backend + ?Sized> BackendExt for B {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{Serialize, de::DeserializeOwned};

    /// JSON serialization extension methods.
    ///
    /// Available when the `serde` feature is enabled.
    pub trait BackendExtJson: Backend {
        /// Read a file and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - `FsError::NotFound`: File doesn't exist
        /// - `FsError::Deserialization`: JSON parsing failed
        fn read_json<T: DeserializeOwned>(&self, url: &FsUrl) -> Result<T, FsError> {
            let bytes = self.read_all(url)?;
            serde_json::from_slice(&bytes).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize a value as pretty JSON and write it to a file.
        ///
        /// # Errors
        ///
        /// - `FsError::Serialization`: JSON serialization failed
        /// - Any error from [`BackendExt::write_all`]
        fn write_json<T: Serialize>(&self, url: &FsUrl, value: &T) -> Result<(), FsError> {
            let bytes = serde_json::to_vec_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.write_all(url, &bytes)
        }
    }

    impl<B: Backend + ?Sized> BackendExtJson for B {}
}

#[cfg(feature = "serde")]
pub use json::BackendExtJson;
