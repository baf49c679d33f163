//! Absolute, protocol-qualified locations.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use percent_encoding::percent_decode_str;
use url::{PathSegmentsMut, Url};

use crate::{FsError, ItemKind};

/// An absolute, protocol-qualified location of an item.
///
/// Wraps [`url::Url`]. Parsing collapses `.`/`..` segments, and equality,
/// ordering and hashing use a normalized key with any trailing separator
/// removed, so `mem:///a/c` and `mem:///a/./c/` identify the same item.
///
/// # Examples
///
/// ```rust
/// use ezfs::FsUrl;
///
/// let a = FsUrl::parse("mem:///a/c").unwrap();
/// let b = FsUrl::parse("mem:///a/./c/").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.protocol(), "mem");
/// assert_eq!(a.name(), "c");
/// ```
#[derive(Clone)]
pub struct FsUrl {
    url: Url,
    key: String,
}

impl FsUrl {
    /// Parse a `scheme://` URL or an absolute local path.
    ///
    /// Absolute paths without a scheme become `file://` URLs.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidUrl`] if the input is relative or malformed
    pub fn parse(input: &str) -> Result<Self, FsError> {
        let invalid = |reason: String| FsError::InvalidUrl {
            url: input.to_string(),
            reason,
        };

        let url = if input.contains("://") {
            Url::parse(input).map_err(|e| invalid(e.to_string()))?
        } else if input.starts_with('/') {
            Url::parse(&format!("file://{input}")).map_err(|e| invalid(e.to_string()))?
        } else {
            return Err(invalid("relative location without a base".into()));
        };

        if url.cannot_be_a_base() {
            return Err(invalid("url has no hierarchical path".into()));
        }
        Ok(Self::from_parsed(url))
    }

    fn from_parsed(url: Url) -> Self {
        let path = url.path();
        let key = if path.len() > 1 && path.ends_with('/') {
            let mut trimmed = url.clone();
            trimmed.set_path(path.trim_end_matches('/'));
            String::from(trimmed)
        } else {
            url.as_str().to_string()
        };
        Self { url, key }
    }

    fn edit_segments(&self, edit: impl FnOnce(&mut PathSegmentsMut<'_>)) -> Self {
        let mut url = self.url.clone();
        // Construction rejects cannot-be-a-base URLs, so this always succeeds.
        if let Ok(mut segments) = url.path_segments_mut() {
            edit(&mut segments);
        }
        Self::from_parsed(url)
    }

    /// The full URL string.
    #[inline]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The normalized identity key (no trailing separator except at the root).
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying [`url::Url`].
    #[inline]
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// The scheme, e.g. `"mem"` or `"ftp"`.
    #[inline]
    pub fn protocol(&self) -> &str {
        self.url.scheme()
    }

    /// The host, if the URL has a non-empty one.
    pub fn host(&self) -> Option<&str> {
        self.url.host_str().filter(|h| !h.is_empty())
    }

    /// The percent-encoded path, always starting with `/`.
    #[inline]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Decoded, non-empty path segments.
    pub fn segments(&self) -> Vec<String> {
        self.url
            .path_segments()
            .map(|segments| {
                segments
                    .filter(|s| !s.is_empty())
                    .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The decoded last path segment, or `""` at the root.
    pub fn name(&self) -> String {
        self.segments().pop().unwrap_or_default()
    }

    /// Whether the path is `/`.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.url.path() == "/"
    }

    /// Whether the path carries a trailing separator.
    #[inline]
    pub fn is_dir_form(&self) -> bool {
        self.url.path().ends_with('/')
    }

    /// The same URL with the path replaced by `/`.
    pub fn root(&self) -> Self {
        let mut url = self.url.clone();
        url.set_path("/");
        Self::from_parsed(url)
    }

    /// The containing directory, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(self.edit_segments(|segments| {
            segments.pop_if_empty().pop().push("");
        }))
    }

    /// The same location with a trailing separator.
    pub fn as_dir(&self) -> Self {
        if self.is_dir_form() {
            return self.clone();
        }
        self.edit_segments(|segments| {
            segments.push("");
        })
    }

    /// The same location without a trailing separator (root stays `/`).
    pub fn as_file(&self) -> Self {
        if self.is_root() || !self.is_dir_form() {
            return self.clone();
        }
        self.edit_segments(|segments| {
            segments.pop_if_empty();
        })
    }

    /// The child called `name`, in directory form when `kind` is a directory.
    ///
    /// `name` is a single segment; separators inside it are escaped.
    pub fn child(&self, name: &str, kind: ItemKind) -> Self {
        self.edit_segments(|segments| {
            segments.pop_if_empty().push(name);
            if kind == ItemKind::Directory {
                segments.push("");
            }
        })
    }

    /// The item called `name` next to this one.
    pub fn sibling(&self, name: &str, kind: ItemKind) -> Self {
        match self.parent() {
            Some(parent) => parent.child(name, kind),
            None => self.child(name, kind),
        }
    }

    /// Resolve `relative` against this location treated as a directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidUrl`] if the result cannot be parsed
    pub fn join(&self, relative: &str) -> Result<Self, FsError> {
        let base = self.as_dir();
        let url = base.url.join(relative).map_err(|e| FsError::InvalidUrl {
            url: format!("{base}{relative}"),
            reason: e.to_string(),
        })?;
        Ok(Self::from_parsed(url))
    }

    /// Whether `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &FsUrl) -> bool {
        let prefix = ancestor.as_dir();
        self.key != ancestor.key && self.key.starts_with(prefix.as_str())
    }
}

impl PartialEq for FsUrl {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FsUrl {}

impl Hash for FsUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for FsUrl {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FsUrl {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for FsUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl fmt::Debug for FsUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FsUrl").field(&self.url.as_str()).finish()
    }
}

impl FromStr for FsUrl {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FsUrl {
    type Error = FsError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for FsUrl {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for FsUrl {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FsUrl::parse(&raw).map_err(serde::de::Error::custom)
    }
}
