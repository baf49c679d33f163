//! The one-stop façade: a registry, a current filesystem, and watches.

use std::io::{Read, Seek};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::{
    AccessMode, Directory, File, FilebasedProvider, FilesystemProvider, Filesystem, FsError,
    FsOptions, FsUrl, Item, ItemWatch, MAGIC_LEN, Poller, Registry, Traversal, WatchId,
};

/// Whether `path` carries its own protocol.
fn is_url(path: &str) -> bool {
    path.contains("://")
}

/// Navigation across every registered backend from one current location.
///
/// Plain paths are relative to the current filesystem's working directory;
/// anything with a `scheme://` prefix is dispatched through the registry.
///
/// # Example
///
/// ```rust
/// use ezfs::{Ez, Registry};
/// use std::sync::Arc;
///
/// let mut ez = Ez::new(Arc::new(Registry::with_defaults()), "mem://scratch/").unwrap();
/// assert!(ez.open("notes/today.txt", "w").is_err());
///
/// ez.filesystem().root().unwrap().mkdir("notes").unwrap();
/// let mut file = ez.open("notes/today.txt", "w").unwrap();
/// file.write_bytes(b"hello").unwrap();
/// drop(file);
///
/// ez.cd("notes").unwrap();
/// assert_eq!(ez.get("today.txt").unwrap().read().unwrap(), b"hello");
/// assert_eq!(ez.find("*.txt").unwrap().len(), 1);
/// ```
pub struct Ez {
    registry: Arc<Registry>,
    options: FsOptions,
    filesystem: Filesystem,
    watches: Option<Poller<ItemWatch>>,
}

impl Ez {
    /// Connect to `url` with default options.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnsupportedProtocol`] if no provider claims `url`
    pub fn new(registry: Arc<Registry>, url: &str) -> Result<Self, FsError> {
        Self::with_options(registry, url, FsOptions::default())
    }

    /// Connect to `url`, then change into `options.working_directory` if set.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnsupportedProtocol`] if no provider claims `url`
    /// - Any error from changing into the working directory
    pub fn with_options(
        registry: Arc<Registry>,
        url: &str,
        options: FsOptions,
    ) -> Result<Self, FsError> {
        let filesystem = Self::connect_with(&registry, url, &options)?;
        let mut ez = Self {
            registry,
            options,
            filesystem,
            watches: None,
        };
        if let Some(path) = ez.options.working_directory.clone() {
            ez.cd(&path)?;
        }
        Ok(ez)
    }

    fn connect_with(
        registry: &Registry,
        url: &str,
        options: &FsOptions,
    ) -> Result<Filesystem, FsError> {
        let url = FsUrl::parse(url)?;
        let backend = registry.connect(&url, options)?;
        Ok(Filesystem::with_url(backend, url))
    }

    /// The shared registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// The current filesystem.
    pub fn filesystem(&self) -> &Filesystem {
        &self.filesystem
    }

    /// The provider that would serve `url`.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidUrl`] or [`FsError::UnsupportedProtocol`]
    pub fn url_support(&self, url: &str) -> Result<Arc<dyn FilesystemProvider>, FsError> {
        self.registry.url_support(&FsUrl::parse(url)?)
    }

    /// A new filesystem for `url`, leaving the current one untouched.
    pub fn connect(&self, url: &str) -> Result<Filesystem, FsError> {
        Self::connect_with(&self.registry, url, &self.options)
    }

    /// The item at `path` (relative, absolute, or a full URL).
    pub fn get(&self, path: &str) -> Result<Item, FsError> {
        if is_url(path) {
            let url = FsUrl::parse(path)?;
            let backend = self.registry.connect(&url, &self.options)?;
            return Item::resolve(backend, &url);
        }
        self.filesystem.get(path)
    }

    fn directory(&self, path: &str) -> Result<Directory, FsError> {
        if is_url(path) {
            let filesystem = self.connect(path)?;
            return filesystem.working_directory().cloned();
        }
        self.filesystem.get(path)?.into_dir()
    }

    fn directory_creating(&self, path: &str) -> Result<Directory, FsError> {
        if is_url(path) {
            let url = FsUrl::parse(path)?;
            let filesystem = self.connect(path)?;
            return filesystem.root()?.make_path_exist(&url.segments().join("/"));
        }
        self.filesystem.working_directory()?.make_path_exist(path)
    }

    /// Open the file at `path` with a mode string such as `"r"` or `"a+"`.
    ///
    /// # Errors
    ///
    /// - [`FsError::AccessDenied`] for an unknown mode or a refused one
    pub fn open(&self, path: &str, mode: &str) -> Result<File, FsError> {
        let mode = AccessMode::parse(mode).map_err(|_| FsError::AccessDenied {
            url: path.to_string(),
            mode: mode.to_string(),
        })?;
        if is_url(path) {
            return self.connect(path)?.root()?.open(path, mode);
        }
        self.filesystem.open(path, mode)
    }

    /// The file-based provider able to read `reader`, restoring its position.
    pub fn embedded_fs_for<R: Read + Seek>(
        &self,
        reader: &mut R,
        filename: Option<&str>,
        mimetype: Option<&str>,
    ) -> Result<Option<Arc<dyn FilebasedProvider>>, FsError> {
        self.registry.sniff(reader, filename, mimetype)
    }

    /// Open the filesystem stored inside `file`, if any provider reads it.
    ///
    /// Returns `Ok(None)` when the content is not a recognized embedded
    /// filesystem.
    pub fn mount_embedded(&self, file: &File) -> Result<Option<Filesystem>, FsError> {
        let head = file.backend().read_range(file.url(), 0, MAGIC_LEN)?;
        let name = file.name();
        let Some(provider) = self.registry.filebased_for_bytes(Some(&name), &head, None) else {
            return Ok(None);
        };
        debug!(file = %file.url(), provider = provider.name(), "mounting embedded filesystem");
        Ok(Some(Filesystem::new(provider.open(file)?)))
    }

    /// Copy `source` into the directory `dest` (created if missing).
    pub fn copy(&self, source: &str, dest: &str, new_name: Option<&str>) -> Result<Item, FsError> {
        let item = self.get(source)?;
        let dest = self.directory_creating(dest)?;
        item.copy_to(&dest, new_name)
    }

    /// Move `source` into the directory `dest` (created if missing).
    pub fn move_item(
        &self,
        source: &str,
        dest: &str,
        new_name: Option<&str>,
    ) -> Result<Item, FsError> {
        let item = self.get(source)?;
        let dest = self.directory_creating(dest)?;
        item.move_to(&dest, new_name)
    }

    /// Delete the item at `path`.
    pub fn delete(&self, path: &str) -> Result<(), FsError> {
        self.get(path)?.delete()
    }

    /// Rename the item at `path`.
    pub fn rename(&self, path: &str, new_name: &str) -> Result<Item, FsError> {
        let mut item = self.get(path)?;
        item.rename(new_name)?;
        Ok(item)
    }

    /// Change the working directory. A URL switches to another backend.
    ///
    /// Any watches on the old working directory are dropped.
    pub fn cd(&mut self, path: &str) -> Result<(), FsError> {
        if is_url(path) {
            let filesystem = self.connect(path)?;
            filesystem.working_directory()?;
            self.filesystem = filesystem;
        } else {
            self.filesystem.cd(path)?;
        }
        self.watches = None;
        Ok(())
    }

    /// Children of `path` (or of the working directory).
    pub fn list(&self, path: Option<&str>) -> Result<Vec<Item>, FsError> {
        match path {
            Some(path) => self.directory(path)?.children(),
            None => self.filesystem.list(None),
        }
    }

    /// See [`Directory::glob`].
    pub fn find(&self, pattern: &str) -> Result<Vec<Item>, FsError> {
        self.filesystem.glob(pattern, false)
    }

    /// See [`Directory::regex_find`].
    pub fn regex_find(&self, pattern: &str) -> Result<Vec<Item>, FsError> {
        self.filesystem.regex_find(pattern, false)
    }

    /// Every item below `path` (or the working directory).
    pub fn get_all(&self, path: Option<&str>) -> Result<Vec<Item>, FsError> {
        match path {
            Some(path) if is_url(path) => self.directory(path)?.get_all(),
            _ => self.filesystem.get_all(path),
        }
    }

    /// See [`Directory::tree`].
    pub fn tree(&self) -> Result<String, FsError> {
        self.filesystem.tree()
    }

    /// See [`Directory::walk`].
    pub fn walk<R, F>(&self, order: Traversal, visit: F) -> Result<Option<R>, FsError>
    where
        F: FnMut(&Item, usize) -> ControlFlow<R>,
    {
        self.filesystem.walk(order, visit)
    }

    /// Watch the working directory for changes.
    pub fn add_watch<F>(&mut self, callback: F, interval: Duration) -> Result<WatchId, FsError>
    where
        F: FnMut(&ItemWatch) + Send + 'static,
    {
        let mut poller = match self.watches.take() {
            Some(poller) => poller,
            None => {
                let dir = self.filesystem.working_directory()?.item().clone();
                Poller::new(ItemWatch::new(dir))
            }
        };
        let id = poller.add_watch(callback, interval);
        self.watches = Some(poller);
        Ok(id)
    }

    /// Stop a watch. Returns `false` if `id` was not registered.
    pub fn remove_watch(&mut self, id: WatchId) -> bool {
        self.watches
            .as_mut()
            .is_some_and(|poller| poller.remove_watch(id))
    }

    /// Sample the working directory if due; `true` if callbacks ran.
    pub fn poll_watches(&mut self) -> bool {
        self.watches
            .as_mut()
            .is_some_and(|poller| poller.test_poll())
    }

    /// Mounting one filesystem inside another.
    ///
    /// # Errors
    ///
    /// Always [`FsError::NotImplemented`].
    pub fn mount(&mut self, path: &str, _filesystem: Filesystem) -> Result<(), FsError> {
        Err(FsError::NotImplemented {
            operation: "mount",
            url: path.to_string(),
        })
    }
}

impl std::fmt::Debug for Ez {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ez")
            .field("registry", &self.registry)
            .field("filesystem", &self.filesystem)
            .field("watches", &self.watches)
            .finish_non_exhaustive()
    }
}
