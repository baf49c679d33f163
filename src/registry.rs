//! # Backend Dispatch
//!
//! A [`Registry`] maps locations to the providers that can serve them:
//!
//! | Provider | Selected by | Trait |
//! |----------|-------------|-------|
//! | Protocol-based | URL protocol (`mem://`, `ftp://`, ...) | [`FilesystemProvider`] |
//! | File-based | first [`MAGIC_LEN`] bytes of a file (archives, images) | [`FilebasedProvider`] |
//!
//! Dispatch is first-match-wins in registration order. The registry is an
//! ordinary value: build it once at startup and share it as
//! `Arc<Registry>`.

use std::fmt;
use std::io::{Read, Seek, SeekFrom};
use std::sync::Arc;

use tracing::debug;

use crate::{Backend, File, FsError, FsOptions, FsUrl, MemoryProvider};

/// How many leading bytes file-based providers get to inspect.
pub const MAGIC_LEN: usize = 128;

/// A provider answering for one or more URL protocols.
pub trait FilesystemProvider: Send + Sync {
    /// Short name for logs and listings.
    fn name(&self) -> &str;

    /// Claimed protocol prefixes, including `://` (e.g. `"mem://"`).
    fn url_protocols(&self) -> &[&str];

    /// Whether this provider claims `url`.
    fn supports_url(&self, url: &FsUrl) -> bool {
        let prefix = format!("{}://", url.protocol());
        self.url_protocols()
            .iter()
            .any(|p| p.eq_ignore_ascii_case(&prefix))
    }

    /// Connect a backend for `url`.
    ///
    /// # Errors
    ///
    /// Provider-specific connection failures.
    fn connect(&self, url: &FsUrl, options: &FsOptions) -> Result<Arc<dyn Backend>, FsError>;
}

/// A provider for filesystems stored inside a file of another filesystem.
pub trait FilebasedProvider: Send + Sync {
    /// Short name for logs and listings.
    fn name(&self) -> &str;

    /// Whether this provider can parse a file starting with `head` (at most
    /// [`MAGIC_LEN`] bytes). `filename` and `mimetype` are hints only.
    fn can_read(&self, filename: Option<&str>, head: &[u8], mimetype: Option<&str>) -> bool;

    /// Open the filesystem stored in `host`.
    ///
    /// # Errors
    ///
    /// Provider-specific parse failures.
    fn open(&self, host: &File) -> Result<Arc<dyn Backend>, FsError>;
}

/// Ordered sets of protocol-based and file-based providers.
///
/// # Example
///
/// ```rust
/// use ezfs::{FsError, FsUrl, Registry};
///
/// let registry = Registry::with_defaults();
/// let mem = registry.url_support(&FsUrl::parse("mem:///").unwrap()).unwrap();
/// assert_eq!(mem.name(), "memory");
///
/// let ftp = registry.url_support(&FsUrl::parse("ftp://host/path").unwrap());
/// assert!(matches!(ftp, Err(FsError::UnsupportedProtocol { .. })));
/// ```
#[derive(Default)]
pub struct Registry {
    filesystems: Vec<Arc<dyn FilesystemProvider>>,
    filebased: Vec<Arc<dyn FilebasedProvider>>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the built-in [`MemoryProvider`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_filesystem(Arc::new(MemoryProvider::new()));
        registry
    }

    /// Append a protocol-based provider.
    pub fn register_filesystem(&mut self, provider: Arc<dyn FilesystemProvider>) -> &mut Self {
        debug!(provider = provider.name(), protocols = ?provider.url_protocols(), "registered filesystem");
        self.filesystems.push(provider);
        self
    }

    /// Append a file-based provider.
    pub fn register_filebased(&mut self, provider: Arc<dyn FilebasedProvider>) -> &mut Self {
        debug!(provider = provider.name(), "registered file-based filesystem");
        self.filebased.push(provider);
        self
    }

    /// Protocol-based providers, in registration order.
    pub fn filesystems(&self) -> &[Arc<dyn FilesystemProvider>] {
        &self.filesystems
    }

    /// File-based providers, in registration order.
    pub fn filebased(&self) -> &[Arc<dyn FilebasedProvider>] {
        &self.filebased
    }

    /// The first provider claiming `url`'s protocol.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnsupportedProtocol`] if none does
    pub fn url_support(&self, url: &FsUrl) -> Result<Arc<dyn FilesystemProvider>, FsError> {
        let provider = self
            .filesystems
            .iter()
            .find(|p| p.supports_url(url))
            .cloned()
            .ok_or_else(|| FsError::UnsupportedProtocol {
                url: url.to_string(),
            })?;
        debug!(url = %url, provider = provider.name(), "protocol dispatch");
        Ok(provider)
    }

    /// Connect the backend that serves `url`.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnsupportedProtocol`] if no provider claims `url`
    pub fn connect(&self, url: &FsUrl, options: &FsOptions) -> Result<Arc<dyn Backend>, FsError> {
        self.url_support(url)?.connect(url, options)
    }

    /// The first file-based provider that can read content starting with
    /// `head`. Only the first [`MAGIC_LEN`] bytes are offered.
    ///
    /// `None` means the content is not a recognized embedded filesystem.
    pub fn filebased_for_bytes(
        &self,
        filename: Option<&str>,
        head: &[u8],
        mimetype: Option<&str>,
    ) -> Option<Arc<dyn FilebasedProvider>> {
        let head = &head[..head.len().min(MAGIC_LEN)];
        let found = self
            .filebased
            .iter()
            .find(|p| p.can_read(filename, head, mimetype))
            .cloned();
        debug!(
            ?filename,
            provider = found.as_ref().map(|p| p.name()),
            "content dispatch"
        );
        found
    }

    /// Like [`filebased_for_bytes`](Registry::filebased_for_bytes), reading
    /// the head from `reader`. The reader is put back where it was, even
    /// when reading fails.
    ///
    /// # Errors
    ///
    /// I/O errors from reading or seeking.
    pub fn sniff<R: Read + Seek>(
        &self,
        reader: &mut R,
        filename: Option<&str>,
        mimetype: Option<&str>,
    ) -> Result<Option<Arc<dyn FilebasedProvider>>, FsError> {
        let start = reader.stream_position()?;
        let mut head = Vec::with_capacity(MAGIC_LEN);
        let read = reader.by_ref().take(MAGIC_LEN as u64).read_to_end(&mut head);
        reader.seek(SeekFrom::Start(start))?;
        read?;
        Ok(self.filebased_for_bytes(filename, &head, mimetype))
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filesystems: Vec<&str> = self.filesystems.iter().map(|p| p.name()).collect();
        let filebased: Vec<&str> = self.filebased.iter().map(|p| p.name()).collect();
        f.debug_struct("Registry")
            .field("filesystems", &filesystems)
            .field("filebased", &filebased)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    struct Magic {
        name: &'static str,
        magic: &'static [u8],
    }

    impl FilebasedProvider for Magic {
        fn name(&self) -> &str {
            self.name
        }

        fn can_read(&self, _filename: Option<&str>, head: &[u8], _mimetype: Option<&str>) -> bool {
            head.starts_with(self.magic)
        }

        fn open(&self, host: &File) -> Result<Arc<dyn Backend>, FsError> {
            Err(FsError::NotImplemented {
                operation: "open",
                url: host.url().to_string(),
            })
        }
    }

    struct HeadLen;

    impl FilebasedProvider for HeadLen {
        fn name(&self) -> &str {
            "head-len"
        }

        fn can_read(&self, _filename: Option<&str>, head: &[u8], _mimetype: Option<&str>) -> bool {
            assert!(head.len() <= MAGIC_LEN);
            false
        }

        fn open(&self, host: &File) -> Result<Arc<dyn Backend>, FsError> {
            Err(FsError::NotImplemented {
                operation: "open",
                url: host.url().to_string(),
            })
        }
    }

    fn registry() -> Registry {
        let mut registry = Registry::with_defaults();
        registry
            .register_filebased(Arc::new(HeadLen))
            .register_filebased(Arc::new(Magic {
                name: "first",
                magic: b"AB",
            }))
            .register_filebased(Arc::new(Magic {
                name: "second",
                magic: b"A",
            }));
        registry
    }

    #[test]
    fn unsupported_protocol() {
        let err = registry()
            .connect(&FsUrl::parse("ftp://host/path").unwrap(), &FsOptions::default())
            .err()
            .unwrap();
        match err {
            FsError::UnsupportedProtocol { url } => assert_eq!(url, "ftp://host/path"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn content_dispatch_is_first_match() {
        let registry = registry();
        let found = registry.filebased_for_bytes(None, b"ABC", None).unwrap();
        assert_eq!(found.name(), "first");
        let found = registry.filebased_for_bytes(None, b"AC", None).unwrap();
        assert_eq!(found.name(), "second");
        assert!(registry.filebased_for_bytes(None, b"zz", None).is_none());
    }

    #[test]
    fn sniff_restores_position_and_limits_head() {
        let registry = registry();
        let mut data = vec![b'x'; 4];
        data.extend_from_slice(b"AB");
        data.extend(std::iter::repeat_n(0u8, 500));
        let mut cursor = Cursor::new(data);
        cursor.set_position(4);

        let found = registry.sniff(&mut cursor, Some("a.txt"), None).unwrap();
        assert_eq!(found.unwrap().name(), "first");
        assert_eq!(cursor.position(), 4);
    }

    /// Yields a few bytes, then fails.
    struct Flaky(Cursor<Vec<u8>>);

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.0.position() >= 3 {
                return Err(std::io::Error::other("device went away"));
            }
            let len = buf.len().min(3);
            self.0.read(&mut buf[..len])
        }
    }

    impl Seek for Flaky {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.0.seek(pos)
        }
    }

    #[test]
    fn sniff_restores_position_when_read_fails() {
        let mut reader = Flaky(Cursor::new(b"ABCDEF".to_vec()));
        let result = registry().sniff(&mut reader, None, None);
        assert!(result.is_err());
        assert_eq!(reader.0.position(), 0);
    }

    #[test]
    fn debug_lists_provider_names() {
        let text = format!("{:?}", registry());
        assert!(text.contains("memory"));
        assert!(text.contains("head-len"));
    }
}
