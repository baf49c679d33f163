//! Addressable nodes: the view shared by files and directories.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use crate::{
    Backend, BackendExt, Directory, Entry, File, Filesystem, FsError, FsUrl, ItemInfo, ItemKind,
};

/// A file or directory on some backend.
///
/// An `Item` is a view of backend state, not the state itself: it holds its
/// location and a handle to the owning backend, and derives everything else
/// (parent, children, content) by asking the backend again. Two items are
/// equal when their normalized URLs are equal, whichever path produced them.
#[derive(Clone)]
pub struct Item {
    url: FsUrl,
    kind: ItemKind,
    fs_id: Option<String>,
    backend: Arc<dyn Backend>,
}

impl Item {
    /// Wrap a backend answer. Directory URLs always get a trailing separator.
    pub fn from_entry(entry: Entry, backend: Arc<dyn Backend>) -> Self {
        let url = match entry.kind {
            ItemKind::Directory => entry.url.as_dir(),
            ItemKind::File => entry.url,
        };
        Self {
            url,
            kind: entry.kind,
            fs_id: entry.fs_id,
            backend,
        }
    }

    /// Ask `backend` for the item at `url`.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing lives at `url`
    pub fn resolve(backend: Arc<dyn Backend>, url: &FsUrl) -> Result<Self, FsError> {
        let entry = backend.resolve(url)?;
        Ok(Self::from_entry(entry, backend))
    }

    /// A file item that may not exist yet (for create-on-open).
    pub(crate) fn new_file(url: FsUrl, backend: Arc<dyn Backend>) -> Self {
        Self {
            url,
            kind: ItemKind::File,
            fs_id: None,
            backend,
        }
    }

    /// The item's location.
    #[inline]
    pub fn url(&self) -> &FsUrl {
        &self.url
    }

    /// File or directory.
    #[inline]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Whether this is a file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == ItemKind::File
    }

    /// Whether this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == ItemKind::Directory
    }

    /// Backend-specific identifier, if the backend reports one.
    pub fn fs_id(&self) -> Option<&str> {
        self.fs_id.as_deref()
    }

    /// The last path segment (`""` for a backend root).
    pub fn name(&self) -> String {
        self.url.name()
    }

    /// The URL path.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// Always `false`: only a [`Filesystem`] is a root.
    pub fn is_root(&self) -> bool {
        false
    }

    /// The backend answering for this item.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub(crate) fn same_backend(&self, other: &Item) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.backend), Arc::as_ptr(&other.backend))
    }

    /// The containing directory, or `None` at the backend root.
    ///
    /// # Errors
    ///
    /// Any error from resolving the parent location.
    pub fn parent(&self) -> Result<Option<Directory>, FsError> {
        if self.url == *self.backend.root_url() {
            return Ok(None);
        }
        match self.url.parent() {
            Some(parent) => {
                let item = Self::resolve(Arc::clone(&self.backend), &parent)?;
                item.into_dir().map(Some)
            }
            None => Ok(None),
        }
    }

    /// The backend's root directory.
    ///
    /// # Errors
    ///
    /// Any error from resolving the root location.
    pub fn root(&self) -> Result<Directory, FsError> {
        Self::resolve(Arc::clone(&self.backend), self.backend.root_url())?.into_dir()
    }

    /// A fresh [`Filesystem`] over this item's backend.
    pub fn filesystem(&self) -> Filesystem {
        Filesystem::new(Arc::clone(&self.backend))
    }

    /// Whether the backend still has this item.
    ///
    /// # Errors
    ///
    /// Backend failures other than "not found".
    pub fn exists(&self) -> Result<bool, FsError> {
        self.backend.exists(&self.url)
    }

    /// Name, location, kind and (for files) size.
    ///
    /// # Errors
    ///
    /// Any error from the backend's size query.
    pub fn info(&self) -> Result<ItemInfo, FsError> {
        let size = match self.kind {
            ItemKind::File => Some(self.backend.content_len(&self.url)?),
            ItemKind::Directory => None,
        };
        Ok(ItemInfo {
            name: self.name(),
            url: self.url.clone(),
            kind: self.kind,
            size,
        })
    }

    /// The whole content of a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotAFile`] for a directory
    pub fn read(&self) -> Result<Vec<u8>, FsError> {
        if self.is_dir() {
            return Err(FsError::NotAFile {
                url: self.url.to_string(),
            });
        }
        self.backend.read_all(&self.url)
    }

    /// A directory view of this item, if it is one.
    pub fn as_dir(&self) -> Option<Directory> {
        self.is_dir().then(|| Directory::from_item(self.clone()))
    }

    /// Convert into a directory view.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] for a file
    pub fn into_dir(self) -> Result<Directory, FsError> {
        if self.is_dir() {
            Ok(Directory::from_item(self))
        } else {
            Err(FsError::NotADirectory {
                url: self.url.to_string(),
            })
        }
    }

    /// Convert into a (closed) file handle.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotAFile`] for a directory
    pub fn into_file(self) -> Result<File, FsError> {
        if self.is_file() {
            Ok(File::from_item(self))
        } else {
            Err(FsError::NotAFile {
                url: self.url.to_string(),
            })
        }
    }

    /// Delete the item (recursively for a directory).
    ///
    /// Consumes the handle; a deleted item cannot be used again.
    pub fn delete(self) -> Result<(), FsError> {
        self.backend.delete(&self.url)
    }

    /// Rename in place, updating this handle's URL.
    ///
    /// A `new_name` containing `/` is resolved against the parent directory
    /// and the item is moved there instead.
    ///
    /// # Errors
    ///
    /// - [`FsError::AlreadyExists`] if the target name is taken
    /// - [`FsError::NotFound`] if a target directory is missing
    pub fn rename(&mut self, new_name: &str) -> Result<(), FsError> {
        match new_name.rsplit_once('/') {
            Some((dir, name)) => {
                let parent = self.parent()?.ok_or_else(|| FsError::PathEscapesRoot {
                    url: self.url.to_string(),
                })?;
                let dir = if dir.is_empty() { "/" } else { dir };
                let target = parent.get(dir)?.into_dir()?;
                let name = (!name.is_empty()).then_some(name);
                *self = self.clone().move_to(&target, name)?;
            }
            None => {
                let url = self.backend.rename(&self.url, new_name)?;
                self.url = match self.kind {
                    ItemKind::Directory => url.as_dir(),
                    ItemKind::File => url,
                };
            }
        }
        Ok(())
    }

    /// Move into `dest`, optionally under a new name.
    ///
    /// Within one backend this is the backend's own move. Across backends a
    /// file is read, written to the target and then deleted; if the delete
    /// fails both copies are left in place and the error is returned.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotImplemented`] for a directory across backends
    pub fn move_to(self, dest: &Directory, new_name: Option<&str>) -> Result<Item, FsError> {
        let name = new_name.map_or_else(|| self.name(), str::to_string);
        let target = dest.url().child(&name, self.kind);
        if self.same_backend(dest) {
            self.backend.move_item(&self.url, &target)?;
            return Self::resolve(Arc::clone(&self.backend), &target);
        }
        let moved = self.transfer(dest, &target, "move")?;
        self.backend.delete(&self.url)?;
        Ok(moved)
    }

    /// Copy into `dest`, optionally under a new name.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotImplemented`] for a directory across backends
    pub fn copy_to(&self, dest: &Directory, new_name: Option<&str>) -> Result<Item, FsError> {
        let name = new_name.map_or_else(|| self.name(), str::to_string);
        let target = dest.url().child(&name, self.kind);
        if self.same_backend(dest) {
            self.backend.copy_item(&self.url, &target)?;
            return Self::resolve(Arc::clone(&self.backend), &target);
        }
        self.transfer(dest, &target, "copy")
    }

    fn transfer(
        &self,
        dest: &Directory,
        target: &FsUrl,
        operation: &'static str,
    ) -> Result<Item, FsError> {
        if self.is_dir() {
            return Err(FsError::NotImplemented {
                operation,
                url: self.url.to_string(),
            });
        }
        debug!(from = %self.url, to = %target, operation, "cross-backend transfer");
        let data = self.read()?;
        dest.backend().write_all(target, &data)?;
        Self::resolve(Arc::clone(dest.backend()), target)
    }
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Item {}

impl Hash for Item {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("url", &self.url)
            .field("kind", &self.kind)
            .field("fs_id", &self.fs_id)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryFs;

    fn backend() -> Arc<dyn Backend> {
        let fs = MemoryFs::new();
        fs.insert_file("/a/b.txt", "bee").unwrap();
        fs.insert_file("/a/c/d.txt", "dee").unwrap();
        Arc::new(fs)
    }

    fn item(backend: &Arc<dyn Backend>, url: &str) -> Item {
        Item::resolve(Arc::clone(backend), &FsUrl::parse(url).unwrap()).unwrap()
    }

    #[test]
    fn directory_urls_get_trailing_separator() {
        let backend = backend();
        let dir = item(&backend, "mem:///a/c");
        assert_eq!(dir.url().as_str(), "mem:///a/c/");
        assert!(dir.is_dir());
        assert!(!dir.is_root());
    }

    #[test]
    fn equality_ignores_path_spelling() {
        let backend = backend();
        assert_eq!(item(&backend, "mem:///a/c"), item(&backend, "mem:///a/./c/"));
    }

    #[test]
    fn parent_and_root() {
        let backend = backend();
        let file = item(&backend, "mem:///a/c/d.txt");
        let parent = file.parent().unwrap().unwrap();
        assert_eq!(parent.url().as_str(), "mem:///a/c/");
        let root = file.root().unwrap();
        assert!(root.parent().unwrap().is_none());
    }

    #[test]
    fn read_file_but_not_directory() {
        let backend = backend();
        assert_eq!(item(&backend, "mem:///a/b.txt").read().unwrap(), b"bee");
        assert!(matches!(
            item(&backend, "mem:///a").read(),
            Err(FsError::NotAFile { .. })
        ));
    }

    #[test]
    fn rename_updates_url() {
        let backend = backend();
        let mut file = item(&backend, "mem:///a/b.txt");
        file.rename("bee.txt").unwrap();
        assert_eq!(file.url().as_str(), "mem:///a/bee.txt");
        assert_eq!(file.read().unwrap(), b"bee");
    }

    #[test]
    fn rename_with_path_moves() {
        let backend = backend();
        let mut file = item(&backend, "mem:///a/b.txt");
        file.rename("c/moved.txt").unwrap();
        assert_eq!(file.url().as_str(), "mem:///a/c/moved.txt");
        assert!(!backend.exists(&FsUrl::parse("mem:///a/b.txt").unwrap()).unwrap());
    }

    #[test]
    fn cross_backend_file_move() {
        let source = backend();
        let other: Arc<dyn Backend> = Arc::new(MemoryFs::named("other"));
        let dest = item(&other, "mem://other/").into_dir().unwrap();

        let moved = item(&source, "mem:///a/b.txt").move_to(&dest, None).unwrap();
        assert_eq!(moved.url().as_str(), "mem://other/b.txt");
        assert_eq!(moved.read().unwrap(), b"bee");
        assert!(!source.exists(&FsUrl::parse("mem:///a/b.txt").unwrap()).unwrap());
    }

    #[test]
    fn cross_backend_directory_copy_is_not_implemented() {
        let source = backend();
        let other: Arc<dyn Backend> = Arc::new(MemoryFs::named("other"));
        let dest = item(&other, "mem://other/").into_dir().unwrap();

        let err = item(&source, "mem:///a/c").copy_to(&dest, None).unwrap_err();
        assert!(matches!(err, FsError::NotImplemented { operation: "copy", .. }));
        assert!(other.list(other.root_url()).unwrap().is_empty());
    }

    #[test]
    fn delete_consumes_item() {
        let backend = backend();
        item(&backend, "mem:///a/c").delete().unwrap();
        assert!(!backend.exists(&FsUrl::parse("mem:///a/c/d.txt").unwrap()).unwrap());
    }
}
