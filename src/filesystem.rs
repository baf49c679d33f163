//! The root view of one backend connection.

use std::fmt;
use std::ops::ControlFlow;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::{AccessMode, Backend, Directory, File, FsError, FsUrl, Item, Traversal};

/// One connected backend plus a working directory.
///
/// Relative operations (`get`, `list`, `glob`, ...) run against the working
/// directory. It is resolved lazily from [`url`](Filesystem::url) and cached
/// until the URL changes; once resolved, `url` reports the location the
/// backend actually resolved to.
///
/// # Example
///
/// ```rust
/// use ezfs::{Filesystem, MemoryFs};
/// use std::sync::Arc;
///
/// let fs = MemoryFs::new();
/// fs.insert_file("/a/c/d.txt", "").unwrap();
///
/// let mut filesystem = Filesystem::new(Arc::new(fs));
/// filesystem.cd("a/c").unwrap();
/// assert_eq!(filesystem.url().as_str(), "mem:///a/c/");
/// assert_eq!(filesystem.get("d.txt").unwrap().name(), "d.txt");
/// ```
pub struct Filesystem {
    backend: Arc<dyn Backend>,
    url: FsUrl,
    working_directory: OnceLock<Directory>,
}

impl Filesystem {
    /// A filesystem whose working directory is the backend root.
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let url = backend.root_url().clone();
        Self::with_url(backend, url)
    }

    /// A filesystem whose working directory is `url`.
    pub fn with_url(backend: Arc<dyn Backend>, url: FsUrl) -> Self {
        Self {
            backend,
            url,
            working_directory: OnceLock::new(),
        }
    }

    /// The backend behind this filesystem.
    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// The working-directory URL.
    pub fn url(&self) -> &FsUrl {
        match self.working_directory.get() {
            Some(dir) => dir.url(),
            None => &self.url,
        }
    }

    /// Point the working directory at `url`; it is resolved on next use.
    pub fn set_url(&mut self, url: FsUrl) {
        self.url = url;
        self.working_directory = OnceLock::new();
    }

    /// Always `true`.
    pub fn is_root(&self) -> bool {
        true
    }

    /// Whether name lookups must match case exactly.
    pub fn case_sensitive(&self) -> bool {
        self.backend.case_sensitive()
    }

    /// The backend's root directory.
    pub fn root(&self) -> Result<Directory, FsError> {
        Item::resolve(Arc::clone(&self.backend), self.backend.root_url())?.into_dir()
    }

    /// The working directory, resolved on first use.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if the URL does not resolve
    /// - [`FsError::NotADirectory`] if it names a file
    pub fn working_directory(&self) -> Result<&Directory, FsError> {
        if let Some(dir) = self.working_directory.get() {
            return Ok(dir);
        }
        let dir = Item::resolve(Arc::clone(&self.backend), &self.url)?.into_dir()?;
        Ok(self.working_directory.get_or_init(|| dir))
    }

    /// Change the working directory to `path`, relative to the current one.
    ///
    /// # Errors
    ///
    /// Any error from [`Directory::get`], or [`FsError::NotADirectory`].
    pub fn change_directory(&mut self, path: &str) -> Result<(), FsError> {
        let dir = self.working_directory()?.get(path)?.into_dir()?;
        debug!(from = %self.url(), to = %dir.url(), "working directory changed");
        self.url = dir.url().clone();
        self.working_directory = OnceLock::from(dir);
        Ok(())
    }

    /// Alias for [`change_directory`](Filesystem::change_directory).
    pub fn cd(&mut self, path: &str) -> Result<(), FsError> {
        self.change_directory(path)
    }

    /// See [`Directory::get`].
    pub fn get(&self, path: &str) -> Result<Item, FsError> {
        self.working_directory()?.get(path)
    }

    /// See [`Directory::list`].
    pub fn list(&self, path: Option<&str>) -> Result<Vec<Item>, FsError> {
        self.working_directory()?.list(path)
    }

    /// See [`Directory::walk`].
    pub fn walk<R, F>(&self, order: Traversal, visit: F) -> Result<Option<R>, FsError>
    where
        F: FnMut(&Item, usize) -> ControlFlow<R>,
    {
        self.working_directory()?.walk(order, visit)
    }

    /// See [`Directory::glob`].
    pub fn glob(&self, pattern: &str, ignore_case: bool) -> Result<Vec<Item>, FsError> {
        self.working_directory()?.glob(pattern, ignore_case)
    }

    /// See [`Directory::regex_find`].
    pub fn regex_find(&self, pattern: &str, ignore_case: bool) -> Result<Vec<Item>, FsError> {
        self.working_directory()?.regex_find(pattern, ignore_case)
    }

    /// See [`Directory::get_all_under`].
    pub fn get_all(&self, path: Option<&str>) -> Result<Vec<Item>, FsError> {
        self.working_directory()?.get_all_under(path)
    }

    /// See [`Directory::open`].
    pub fn open(&self, path: &str, mode: AccessMode) -> Result<File, FsError> {
        self.working_directory()?.open(path, mode)
    }

    /// Delete the item at `path`.
    pub fn delete(&self, path: &str) -> Result<(), FsError> {
        self.working_directory()?.delete_child(path)
    }

    /// See [`Directory::rename_child`].
    pub fn rename(&self, path: &str, new_name: &str) -> Result<Item, FsError> {
        self.working_directory()?.rename_child(path, new_name)
    }

    /// See [`Directory::tree`].
    pub fn tree(&self) -> Result<String, FsError> {
        self.working_directory()?.tree()
    }
}

impl fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem")
            .field("root", self.backend.root_url())
            .field("url", self.url())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryFs;

    fn filesystem() -> Filesystem {
        let fs = MemoryFs::new();
        fs.insert_file("/a/b.txt", "bee").unwrap();
        fs.insert_file("/a/c/d.txt", "dee").unwrap();
        Filesystem::new(Arc::new(fs))
    }

    #[test]
    fn working_directory_defaults_to_root() {
        let fs = filesystem();
        assert!(fs.is_root());
        assert!(fs.case_sensitive());
        assert_eq!(fs.working_directory().unwrap().url().as_str(), "mem:///");
        assert!(!fs.working_directory().unwrap().is_root());
    }

    #[test]
    fn url_is_rehomed_to_resolved_location() {
        let backend: Arc<dyn Backend> = Arc::new({
            let fs = MemoryFs::new();
            fs.insert_dir("/a/c").unwrap();
            fs
        });
        let fs = Filesystem::with_url(backend, FsUrl::parse("mem:///a/./c").unwrap());
        assert_eq!(fs.url().as_str(), "mem:///a/c");
        fs.working_directory().unwrap();
        assert_eq!(fs.url().as_str(), "mem:///a/c/");
    }

    #[test]
    fn cd_and_relative_operations() {
        let mut fs = filesystem();
        fs.cd("a").unwrap();
        assert_eq!(fs.url().as_str(), "mem:///a/");
        assert_eq!(fs.list(None).unwrap().len(), 2);
        fs.cd("c").unwrap();
        assert_eq!(fs.get("d.txt").unwrap().read().unwrap(), b"dee");
        fs.cd("..").unwrap();
        assert_eq!(fs.url().as_str(), "mem:///a/");
        assert!(matches!(fs.cd("b.txt"), Err(FsError::NotADirectory { .. })));
    }

    #[test]
    fn set_url_invalidates_working_directory() {
        let mut fs = filesystem();
        fs.cd("a/c").unwrap();
        fs.set_url(FsUrl::parse("mem:///a").unwrap());
        assert_eq!(fs.working_directory().unwrap().url().as_str(), "mem:///a/");

        fs.set_url(FsUrl::parse("mem:///missing").unwrap());
        assert!(matches!(
            fs.working_directory(),
            Err(FsError::NotFound { .. })
        ));
    }

    #[test]
    fn pass_through_search() {
        let fs = filesystem();
        assert_eq!(fs.glob("a/*", false).unwrap().len(), 2);
        assert_eq!(fs.regex_find("d", false).unwrap().len(), 1);
        assert_eq!(fs.get_all(None).unwrap().len(), 4);
        assert!(fs.tree().unwrap().starts_with("mem:/"));
    }

    #[test]
    fn mutations_through_filesystem() {
        let fs = filesystem();
        let renamed = fs.rename("a/b.txt", "z.txt").unwrap();
        assert_eq!(renamed.url().as_str(), "mem:///a/z.txt");
        fs.delete("a/z.txt").unwrap();
        assert!(matches!(fs.get("a/z.txt"), Err(FsError::NotFound { .. })));
    }
}
