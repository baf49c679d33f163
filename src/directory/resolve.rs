//! Path resolution relative to a directory.

use tracing::debug;

use super::{Directory, match_child};
use crate::{FsError, Item};

/// Strip a leading `scheme://authority`, leaving an absolute path.
fn strip_protocol(path: &str) -> &str {
    match path.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
        None => path,
    }
}

impl Directory {
    /// The item at `path`, which may be relative, absolute (`/...`, restarts
    /// at the backend root) or a full URL on this backend.
    ///
    /// `""` and `.` resolve to the directory itself and `..` to its parent.
    /// Each name is matched exactly first; a case-folded match is only tried
    /// on case-insensitive backends.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] with the full requested URL if a name has no match
    /// - [`FsError::NotADirectory`] if a file is descended through
    /// - [`FsError::PathEscapesRoot`] if `..` climbs above the backend root
    ///
    /// # Example
    ///
    /// ```rust
    /// use ezfs::{Filesystem, MemoryFs};
    /// use std::sync::Arc;
    ///
    /// let fs = MemoryFs::new();
    /// fs.insert_file("/a/c/d.txt", "").unwrap();
    /// let root = Filesystem::new(Arc::new(fs)).root().unwrap();
    ///
    /// let c = root.get("a/c").unwrap();
    /// assert_eq!(c.url().as_str(), "mem:///a/c/");
    /// assert_eq!(root.get("a/./c/../c/d.txt").unwrap().name(), "d.txt");
    /// ```
    pub fn get(&self, path: &str) -> Result<Item, FsError> {
        let path = strip_protocol(path);
        let segments: Vec<&str> = path.split('/').collect();
        let requested = self
            .relative(path)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| path.to_string());
        self.resolve_segments(&segments, requested)
    }

    /// The item at pre-split `segments`. A leading empty segment makes the
    /// path absolute.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Directory::get).
    pub fn get_segments<S: AsRef<str>>(&self, segments: &[S]) -> Result<Item, FsError> {
        let segments: Vec<&str> = segments.iter().map(AsRef::as_ref).collect();
        let requested = self
            .relative(&segments.join("/"))
            .map(|url| url.to_string())
            .unwrap_or_else(|_| segments.join("/"));
        self.resolve_segments(&segments, requested)
    }

    fn resolve_segments(&self, segments: &[&str], requested: String) -> Result<Item, FsError> {
        let (mut current, rest) = match segments.split_first() {
            Some((&"", rest)) if !rest.is_empty() => (self.root()?.into_item(), rest),
            _ => (self.item().clone(), segments),
        };
        let fold = !self.backend().case_sensitive();

        for segment in rest {
            if segment.is_empty() || *segment == "." {
                continue;
            }
            let dir = current.into_dir()?;
            current = if *segment == ".." {
                dir.parent()?
                    .ok_or_else(|| FsError::PathEscapesRoot {
                        url: requested.clone(),
                    })?
                    .into_item()
            } else {
                let children = dir.children()?;
                let searched: Vec<String> = children.iter().map(Item::name).collect();
                match match_child(children, segment, fold) {
                    Some(child) => child,
                    None => {
                        debug!(
                            segment,
                            directory = %dir.url(),
                            ?searched,
                            "path segment not found"
                        );
                        return Err(FsError::NotFound { url: requested });
                    }
                }
            };
        }
        Ok(current)
    }
}
