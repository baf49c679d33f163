//! Core types for the ezfs virtual filesystem tree.

use std::fmt;

use crate::{FsError, FsUrl};

/// Kind of an item in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ItemKind {
    /// Regular file.
    File,
    /// Container of other items.
    Directory,
}

/// What a backend reports about a single node.
///
/// Backends produce these from [`FsNavigate::resolve`](crate::FsNavigate::resolve)
/// and [`FsNavigate::list`](crate::FsNavigate::list); the core turns them into
/// [`Item`](crate::Item) views.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    /// Absolute location of the node.
    pub url: FsUrl,
    /// Whether the node is a file or a directory.
    pub kind: ItemKind,
    /// Opaque backend-specific identifier.
    pub fs_id: Option<String>,
}

impl Entry {
    /// A file entry without a backend identifier.
    pub fn file(url: FsUrl) -> Self {
        Self {
            url,
            kind: ItemKind::File,
            fs_id: None,
        }
    }

    /// A directory entry without a backend identifier.
    pub fn directory(url: FsUrl) -> Self {
        Self {
            url,
            kind: ItemKind::Directory,
            fs_id: None,
        }
    }

    /// Attach a backend identifier.
    pub fn with_fs_id(mut self, fs_id: impl Into<String>) -> Self {
        self.fs_id = Some(fs_id.into());
        self
    }
}

/// Flags describing how a file is opened.
///
/// Parsed from the familiar `"r"`, `"w"`, `"a"`, `"rw"`, `"r+"`, `"w+"`,
/// `"a+"` strings (a `b` suffix is accepted and ignored).
///
/// # Examples
///
/// ```rust
/// use ezfs::AccessMode;
///
/// let mode = AccessMode::parse("a+").unwrap();
/// assert!(mode.read && mode.write && mode.append);
/// assert_eq!(AccessMode::parse("rw").unwrap(), AccessMode::READ_WRITE);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccessMode {
    /// Open for reading.
    pub read: bool,
    /// Open for writing.
    pub write: bool,
    /// Create the file if it doesn't exist.
    pub create: bool,
    /// Truncate the file to zero length on open.
    pub truncate: bool,
    /// Writes always go to the end of the file.
    pub append: bool,
}

impl AccessMode {
    /// Read-only access.
    pub const READ: Self = Self {
        read: true,
        write: false,
        create: false,
        truncate: false,
        append: false,
    };

    /// Write access with create and truncate.
    pub const WRITE: Self = Self {
        read: false,
        write: true,
        create: true,
        truncate: true,
        append: false,
    };

    /// Read and write access without truncation.
    pub const READ_WRITE: Self = Self {
        read: true,
        write: true,
        create: false,
        truncate: false,
        append: false,
    };

    /// Append mode - writes go to end of file.
    pub const APPEND: Self = Self {
        read: false,
        write: true,
        create: true,
        truncate: false,
        append: true,
    };

    /// Parse a mode string.
    ///
    /// # Errors
    ///
    /// - [`FsError::AccessDenied`] for an unrecognized mode
    pub fn parse(mode: &str) -> Result<Self, FsError> {
        let normalized: String = mode.chars().filter(|c| *c != 'b').collect();
        let parsed = match normalized.as_str() {
            "r" => Self::READ,
            "w" => Self::WRITE,
            "a" => Self::APPEND,
            "rw" | "wr" | "r+" => Self::READ_WRITE,
            "w+" => Self {
                read: true,
                ..Self::WRITE
            },
            "a+" | "ra" | "ar" => Self {
                read: true,
                ..Self::APPEND
            },
            _ => {
                return Err(FsError::AccessDenied {
                    url: String::new(),
                    mode: mode.to_string(),
                });
            }
        };
        Ok(parsed)
    }
}

impl Default for AccessMode {
    fn default() -> Self {
        Self::READ_WRITE
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match (self.read, self.write, self.append, self.truncate) {
            (true, false, _, _) => "r",
            (false, true, true, _) => "a",
            (true, true, true, _) => "a+",
            (false, true, false, _) => "w",
            (true, true, false, true) => "w+",
            (true, true, false, false) => "rw",
            (false, false, _, _) => "",
        };
        f.write_str(text)
    }
}

impl std::str::FromStr for AccessMode {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Order in which [`Directory::walk`](crate::Directory::walk) visits descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Traversal {
    /// Visit a directory, then everything below it.
    #[default]
    PreOrder,
    /// Visit everything below a directory, then the directory itself.
    PostOrder,
    /// Visit all items one level down before any item two levels down.
    LevelOrder,
}

/// Options applied when a backend is connected.
///
/// # Examples
///
/// ```rust
/// use ezfs::FsOptions;
///
/// let options = FsOptions::default().case_sensitive(false);
/// assert!(!options.case_sensitive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FsOptions {
    /// Whether name lookups must match case exactly.
    pub case_sensitive: bool,
    /// Initial working directory, relative to the connected URL.
    pub working_directory: Option<String>,
}

impl FsOptions {
    /// Set the case-sensitivity policy.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Set the initial working directory.
    pub fn working_directory(mut self, path: impl Into<String>) -> Self {
        self.working_directory = Some(path.into());
        self
    }
}

impl Default for FsOptions {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            working_directory: None,
        }
    }
}

/// Plain description of an item, e.g. for listing output or serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemInfo {
    /// Short name.
    pub name: String,
    /// Absolute location.
    pub url: FsUrl,
    /// File or directory.
    pub kind: ItemKind,
    /// Size in bytes for files, `None` for directories.
    pub size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_mode_parse_variants() {
        assert_eq!(AccessMode::parse("r").unwrap(), AccessMode::READ);
        assert_eq!(AccessMode::parse("rb").unwrap(), AccessMode::READ);
        assert_eq!(AccessMode::parse("w").unwrap(), AccessMode::WRITE);
        assert_eq!(AccessMode::parse("a").unwrap(), AccessMode::APPEND);
        assert_eq!(AccessMode::parse("r+").unwrap(), AccessMode::READ_WRITE);

        let w_plus = AccessMode::parse("w+").unwrap();
        assert!(w_plus.read && w_plus.write && w_plus.truncate);
    }

    #[test]
    fn access_mode_parse_rejects_garbage() {
        let err = AccessMode::parse("x").unwrap_err();
        assert!(matches!(err, FsError::AccessDenied { mode, .. } if mode == "x"));
    }

    #[test]
    fn access_mode_display_round_trips_common_modes() {
        for text in ["r", "w", "a", "rw", "w+", "a+"] {
            assert_eq!(AccessMode::parse(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn access_mode_default_is_read_write() {
        assert_eq!(AccessMode::default(), AccessMode::READ_WRITE);
    }

    #[test]
    fn traversal_default_is_pre_order() {
        assert_eq!(Traversal::default(), Traversal::PreOrder);
    }

    #[test]
    fn fs_options_builder() {
        let options = FsOptions::default()
            .case_sensitive(false)
            .working_directory("a/c");
        assert!(!options.case_sensitive);
        assert_eq!(options.working_directory.as_deref(), Some("a/c"));
    }
}
