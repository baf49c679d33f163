//! # Directories
//!
//! [`Directory`] is the container view of an [`Item`]. It owns navigation
//! and search over a backend's tree:
//!
//! | Concern | Methods |
//! |---------|---------|
//! | Children | [`children`](Directory::children), [`child_at`](Directory::child_at), [`child_named`](Directory::child_named), [`list`](Directory::list) |
//! | Path resolution | [`get`](Directory::get), [`get_segments`](Directory::get_segments) |
//! | Traversal | [`walk`](Directory::walk), [`get_all`](Directory::get_all), [`tree`](Directory::tree) |
//! | Search | [`glob`](Directory::glob), [`regex_find`](Directory::regex_find) |
//! | Mutation | [`open`](Directory::open), [`mkdir`](Directory::mkdir), [`make_path_exist`](Directory::make_path_exist), [`delete_child`](Directory::delete_child), [`rename_child`](Directory::rename_child) |
//!
//! Children are never cached: every call asks the backend again, so changes
//! made through any handle are visible immediately.

mod resolve;
mod search;
mod walk;

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::{AccessMode, File, FsError, FsUrl, Item, ItemKind};

/// A directory view of an [`Item`].
///
/// Dereferences to [`Item`] for the shared operations (name, url, parent,
/// rename, ...).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Directory(Item);

impl Directory {
    pub(crate) fn from_item(item: Item) -> Self {
        debug_assert!(item.is_dir());
        Self(item)
    }

    /// The underlying item.
    pub fn item(&self) -> &Item {
        &self.0
    }

    /// Give up the directory view.
    pub fn into_item(self) -> Item {
        self.0
    }

    /// Delete this directory and everything below it.
    pub fn delete(self) -> Result<(), FsError> {
        self.0.delete()
    }

    /// Direct children, in backend order.
    ///
    /// # Errors
    ///
    /// Any error from the backend listing.
    pub fn children(&self) -> Result<Vec<Item>, FsError> {
        let backend = self.backend();
        Ok(backend
            .list(self.url())?
            .into_iter()
            .map(|entry| Item::from_entry(entry, Arc::clone(backend)))
            .collect())
    }

    /// Number of direct children.
    pub fn len(&self) -> Result<usize, FsError> {
        Ok(self.backend().list(self.url())?.len())
    }

    /// Whether the directory has no children.
    pub fn is_empty(&self) -> Result<bool, FsError> {
        Ok(self.len()? == 0)
    }

    /// The child at `index` in backend order.
    pub fn child_at(&self, index: usize) -> Result<Option<Item>, FsError> {
        Ok(self.children()?.into_iter().nth(index))
    }

    /// The child called `name`: exact match first, then a case-folded match
    /// on case-insensitive backends.
    pub fn child_named(&self, name: &str) -> Result<Option<Item>, FsError> {
        let fold = !self.backend().case_sensitive();
        Ok(match_child(self.children()?, name, fold))
    }

    /// `path` resolved against this directory's URL, without touching the
    /// backend.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidUrl`] if the result does not parse
    pub fn relative(&self, path: &str) -> Result<FsUrl, FsError> {
        self.url().join(path)
    }

    /// Children of the directory at `path` (or of this one).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if `path` names a file
    pub fn list(&self, path: Option<&str>) -> Result<Vec<Item>, FsError> {
        match path {
            Some(path) => self.get(path)?.into_dir()?.children(),
            None => self.children(),
        }
    }

    /// Open the file at `path`, creating it when `mode` allows.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotAFile`] if `path` names a directory
    /// - [`FsError::NotFound`] if the file is missing and `mode` does not create
    /// - [`FsError::AccessDenied`] if the backend refuses `mode`
    pub fn open(&self, path: &str, mode: AccessMode) -> Result<File, FsError> {
        let mut file = match self.get(path) {
            Ok(item) => item.into_file()?,
            Err(FsError::NotFound { .. }) if mode.create => {
                let (dir, name) = match path.trim_end_matches('/').rsplit_once('/') {
                    Some((dir, name)) => (self.get(if dir.is_empty() { "/" } else { dir })?, name),
                    None => (self.0.clone(), path),
                };
                let url = dir.into_dir()?.url().child(name, ItemKind::File);
                File::from_item(Item::new_file(url, Arc::clone(self.backend())))
            }
            Err(e) => return Err(e),
        };
        file.open(Some(mode))?;
        Ok(file)
    }

    /// Create (or truncate) the file `name` and open it for writing.
    pub fn create_file(&self, name: &str) -> Result<File, FsError> {
        self.open(name, AccessMode::WRITE)
    }

    /// Delete the child at `path`.
    pub fn delete_child(&self, path: &str) -> Result<(), FsError> {
        self.get(path)?.delete()
    }

    /// Rename the child at `path`, returning it under its new name.
    pub fn rename_child(&self, path: &str, new_name: &str) -> Result<Item, FsError> {
        let mut item = self.get(path)?;
        item.rename(new_name)?;
        Ok(item)
    }

    /// Create the subdirectory `name`.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if `name` is taken
    pub fn mkdir(&self, name: &str) -> Result<Directory, FsError> {
        let url = self.url().child(name, ItemKind::Directory);
        self.backend().create_dir(&url)?;
        Item::resolve(Arc::clone(self.backend()), &url)?.into_dir()
    }

    /// Resolve `path`, creating every missing directory along the way.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if a component is a file
    pub fn make_path_exist(&self, path: &str) -> Result<Directory, FsError> {
        let mut current = if path.starts_with('/') {
            self.root()?
        } else {
            self.clone()
        };
        for segment in path.split('/') {
            current = match segment {
                "" | "." => continue,
                ".." => current.parent()?.ok_or_else(|| FsError::PathEscapesRoot {
                    url: self.url().to_string(),
                })?,
                name => match current.child_named(name)? {
                    Some(child) => child.into_dir()?,
                    None => current.mkdir(name)?,
                },
            };
        }
        Ok(current)
    }

    /// Indented rendering of everything below this directory.
    ///
    /// ```text
    /// a/
    ///   b.txt
    ///   c/
    ///     d.txt
    /// ```
    pub fn tree(&self) -> Result<String, FsError> {
        let mut out = format!("{}/\n", self.display_name());
        self.walk(crate::Traversal::PreOrder, |item, depth| {
            let indent = "  ".repeat(depth);
            let suffix = if item.is_dir() { "/" } else { "" };
            out.push_str(&format!("{indent}{}{suffix}\n", item.name()));
            std::ops::ControlFlow::<()>::Continue(())
        })?;
        Ok(out)
    }

    fn display_name(&self) -> String {
        let name = self.name();
        if name.is_empty() {
            self.url().to_string().trim_end_matches('/').to_string()
        } else {
            name
        }
    }

    /// Mounting another filesystem under a directory.
    ///
    /// # Errors
    ///
    /// Always [`FsError::NotImplemented`].
    pub fn mount(&self, _filesystem: &crate::Filesystem) -> Result<(), FsError> {
        Err(FsError::NotImplemented {
            operation: "mount",
            url: self.url().to_string(),
        })
    }
}

/// Exact name match first; a case-folded pass only when `fold` is set.
pub(crate) fn match_child(children: Vec<Item>, name: &str, fold: bool) -> Option<Item> {
    if let Some(index) = children.iter().position(|c| c.name() == name) {
        return children.into_iter().nth(index);
    }
    if !fold {
        return None;
    }
    let folded = name.to_lowercase();
    children
        .into_iter()
        .find(|c| c.name().to_lowercase() == folded)
}

impl Deref for Directory {
    type Target = Item;

    fn deref(&self) -> &Item {
        &self.0
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Directory").field(self.url()).finish()
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
