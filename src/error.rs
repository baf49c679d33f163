//! Error types for the ezfs virtual filesystem tree.

/// Filesystem error type with contextual variants.
///
/// Every variant that concerns a location carries the offending URL so that
/// failures surfacing from deep inside a traversal can still be traced back to
/// the request that caused them. Uses `#[non_exhaustive]` for forward
/// compatibility.
///
/// # Examples
///
/// ```rust
/// use ezfs::FsError;
///
/// let err = FsError::NotFound { url: "mem:///missing".into() };
/// assert_eq!(err.to_string(), "not found: mem:///missing");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    // Dispatch Errors
    /// No registered backend claims the URL's protocol.
    #[error("url protocol not supported: {url}")]
    UnsupportedProtocol {
        /// The URL nobody claimed.
        url: String,
    },

    /// The input could not be turned into an absolute, protocol-qualified URL.
    #[error("invalid url: {url} ({reason})")]
    InvalidUrl {
        /// The rejected input.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    // Navigation Errors
    /// A path segment has no matching child.
    #[error("not found: {url}")]
    NotFound {
        /// The full requested location.
        url: String,
    },

    /// Attempted to descend through something that is not a directory.
    #[error("not a directory: {url}")]
    NotADirectory {
        /// The item that is not a directory.
        url: String,
    },

    /// Expected a file but found a directory.
    #[error("not a file: {url}")]
    NotAFile {
        /// The item that is not a file.
        url: String,
    },

    /// A `..` segment tried to climb above the filesystem root.
    #[error("path escapes root: {url}")]
    PathEscapesRoot {
        /// The requested location.
        url: String,
    },

    /// Target already exists.
    #[error("{operation}: already exists: {url}")]
    AlreadyExists {
        /// The location that already exists.
        url: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// More items matched than the operation can handle.
    #[error("too many files ({count}) found for operation: {url}")]
    TooManyFiles {
        /// The location that was searched.
        url: String,
        /// How many items matched.
        count: usize,
    },

    /// Malformed glob or regular expression.
    #[error("invalid pattern: {pattern} ({reason})")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Compiler diagnostic.
        reason: String,
    },

    // Access Errors
    /// The backend refuses the requested access mode.
    #[error("unable to open with mode \"{mode}\": {url}")]
    AccessDenied {
        /// The location access was denied to.
        url: String,
        /// The requested access mode.
        mode: String,
    },

    /// Stream operation on a file that is not open.
    #[error("file is not open: {url}")]
    NotOpen {
        /// The closed file.
        url: String,
    },

    /// Operation intentionally unsupported by a backend.
    #[error("{operation}: not implemented: {url}")]
    NotImplemented {
        /// The unsupported operation.
        operation: &'static str,
        /// The location the operation targeted.
        url: String,
    },

    // Data Errors
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    // Backend Errors
    /// Generic backend error.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error with context.
    #[error("{operation} failed for {url}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The location involved in the operation.
        url: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// The URL this error is about, if it carries one.
    pub fn url(&self) -> Option<&str> {
        match self {
            FsError::UnsupportedProtocol { url }
            | FsError::InvalidUrl { url, .. }
            | FsError::NotFound { url }
            | FsError::NotADirectory { url }
            | FsError::NotAFile { url }
            | FsError::PathEscapesRoot { url }
            | FsError::AlreadyExists { url, .. }
            | FsError::TooManyFiles { url, .. }
            | FsError::AccessDenied { url, .. }
            | FsError::NotOpen { url }
            | FsError::NotImplemented { url, .. }
            | FsError::Io { url, .. } => Some(url),
            FsError::InvalidPattern { .. }
            | FsError::Serialization(_)
            | FsError::Deserialization(_)
            | FsError::Backend(_) => None,
        }
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound { url: String::new() },
            std::io::ErrorKind::PermissionDenied => FsError::AccessDenied {
                url: String::new(),
                mode: "io".into(),
            },
            std::io::ErrorKind::AlreadyExists => FsError::AlreadyExists {
                url: String::new(),
                operation: "io",
            },
            _ => FsError::Io {
                operation: "io",
                url: String::new(),
                source: error,
            },
        }
    }
}

impl From<FsError> for std::io::Error {
    fn from(error: FsError) -> Self {
        use std::io::ErrorKind;

        let kind = match &error {
            FsError::NotFound { .. } => ErrorKind::NotFound,
            FsError::AccessDenied { .. } => ErrorKind::PermissionDenied,
            FsError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            FsError::NotImplemented { .. } => ErrorKind::Unsupported,
            FsError::InvalidUrl { .. } | FsError::InvalidPattern { .. } => ErrorKind::InvalidInput,
            FsError::Io { source, .. } => source.kind(),
            _ => ErrorKind::Other,
        };
        std::io::Error::new(kind, error)
    }
}
