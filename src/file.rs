//! Stream access to file items.

use std::fmt;
use std::io::{self, SeekFrom};
use std::ops::Deref;

use tracing::{debug, warn};

use crate::{AccessMode, BackendExt, FsError, Item};

const LINE_CHUNK: usize = 256;

/// A file item with open/close state, an access mode and a stream position.
///
/// Every read and write goes straight to the backend at the current
/// position. Dropping an open file closes it.
///
/// # Example
///
/// ```rust
/// use ezfs::{AccessMode, Filesystem, MemoryFs};
/// use std::io::{Read, Write};
/// use std::sync::Arc;
///
/// let filesystem = Filesystem::new(Arc::new(MemoryFs::new()));
/// let root = filesystem.root().unwrap();
///
/// let mut file = root.open("notes.txt", AccessMode::WRITE).unwrap();
/// file.write_all(b"first line\nsecond").unwrap();
///
/// file.set_access_mode(AccessMode::READ).unwrap();
/// file.open(None).unwrap();
/// assert_eq!(file.read_line().unwrap(), b"first line\n");
///
/// let mut rest = String::new();
/// file.read_to_string(&mut rest).unwrap();
/// assert_eq!(rest, "second");
/// ```
pub struct File {
    item: Item,
    mode: AccessMode,
    open: bool,
    position: u64,
}

impl File {
    pub(crate) fn from_item(item: Item) -> Self {
        Self {
            item,
            mode: AccessMode::default(),
            open: false,
            position: 0,
        }
    }

    /// The underlying item.
    pub fn item(&self) -> &Item {
        &self.item
    }

    /// Whether the file is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The mode used by the next (or current) open.
    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    /// Change the access mode. An open file is closed first, so the position
    /// starts over on the next open.
    pub fn set_access_mode(&mut self, mode: AccessMode) -> Result<(), FsError> {
        if self.open {
            self.close()?;
        }
        self.mode = mode;
        Ok(())
    }

    /// Open the file, optionally switching mode first.
    ///
    /// Write modes create a missing file, `w` truncates and `a` starts at
    /// the end. Opening an already open file with no new mode is a no-op.
    ///
    /// # Errors
    ///
    /// - [`FsError::AccessDenied`] if the backend refuses the mode
    /// - [`FsError::NotFound`] if the file is missing and the mode cannot create it
    pub fn open(&mut self, mode: Option<AccessMode>) -> Result<(), FsError> {
        match mode {
            Some(mode) => self.set_access_mode(mode)?,
            None if self.open => return Ok(()),
            None => {}
        }
        let backend = self.item.backend();
        let url = self.item.url();
        backend.check_access(url, self.mode)?;
        if self.mode.create && !backend.exists(url)? {
            backend.write_at(url, 0, &[])?;
        }
        if self.mode.truncate {
            backend.truncate(url, 0)?;
        }
        self.position = if self.mode.append {
            backend.content_len(url)?
        } else {
            0
        };
        self.open = true;
        debug!(url = %url, mode = %self.mode, "file opened");
        Ok(())
    }

    /// Close the file. Closing a closed file is a no-op.
    pub fn close(&mut self) -> Result<(), FsError> {
        if self.open {
            self.flush()?;
            self.open = false;
            self.position = 0;
        }
        Ok(())
    }

    /// Whether the file is open in a mode that reads.
    pub fn readable(&self) -> bool {
        self.open && self.mode.read
    }

    /// Whether the file is open in a mode that writes.
    pub fn writable(&self) -> bool {
        self.open && self.mode.write
    }

    fn ensure_open(&self) -> Result<(), FsError> {
        if self.open {
            Ok(())
        } else {
            Err(FsError::NotOpen {
                url: self.item.url().to_string(),
            })
        }
    }

    fn ensure(&self, allowed: bool) -> Result<(), FsError> {
        self.ensure_open()?;
        if allowed {
            Ok(())
        } else {
            Err(FsError::AccessDenied {
                url: self.item.url().to_string(),
                mode: self.mode.to_string(),
            })
        }
    }

    /// Read up to `len` bytes (everything remaining for `None`).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotOpen`] if the file is closed
    /// - [`FsError::AccessDenied`] if the mode does not read
    pub fn read_bytes(&mut self, len: Option<usize>) -> Result<Vec<u8>, FsError> {
        self.ensure(self.mode.read)?;
        let len = match len {
            Some(len) => len,
            None => {
                let total = self.item.backend().content_len(self.item.url())?;
                usize::try_from(total.saturating_sub(self.position)).unwrap_or(usize::MAX)
            }
        };
        let data = self
            .item
            .backend()
            .read_range(self.item.url(), self.position, len)?;
        self.position += data.len() as u64;
        Ok(data)
    }

    /// Read everything from the current position.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, FsError> {
        self.read_bytes(None)
    }

    /// Read through the next `\n` (included) or to the end of the file.
    pub fn read_line(&mut self) -> Result<Vec<u8>, FsError> {
        self.ensure(self.mode.read)?;
        let mut line = Vec::new();
        loop {
            let chunk = self
                .item
                .backend()
                .read_range(self.item.url(), self.position, LINE_CHUNK)?;
            if chunk.is_empty() {
                return Ok(line);
            }
            match chunk.iter().position(|b| *b == b'\n') {
                Some(end) => {
                    line.extend_from_slice(&chunk[..=end]);
                    self.position += end as u64 + 1;
                    return Ok(line);
                }
                None => {
                    self.position += chunk.len() as u64;
                    line.extend(chunk);
                }
            }
        }
    }

    /// Read up to `max` lines (all remaining lines when `None`), stopping
    /// early at the end of the file.
    pub fn read_lines(&mut self, max: Option<usize>) -> Result<Vec<Vec<u8>>, FsError> {
        let mut lines = Vec::new();
        while max.is_none_or(|max| lines.len() < max) {
            let line = self.read_line()?;
            if line.is_empty() {
                break;
            }
            lines.push(line);
        }
        Ok(lines)
    }

    /// Write each line followed by `\n`. Returns the number of bytes written.
    pub fn write_lines<I>(&mut self, lines: I) -> Result<usize, FsError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let mut written = 0;
        for line in lines {
            written += self.write_bytes(line.as_ref())?;
            written += self.write_bytes(b"\n")?;
        }
        Ok(written)
    }

    /// Write `data` at the current position (at the end in append mode).
    ///
    /// # Errors
    ///
    /// - [`FsError::NotOpen`] if the file is closed
    /// - [`FsError::AccessDenied`] if the mode does not write
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<usize, FsError> {
        self.ensure(self.mode.write)?;
        let backend = self.item.backend();
        if self.mode.append {
            self.position = backend.content_len(self.item.url())?;
        }
        backend.write_at(self.item.url(), self.position, data)?;
        self.position += data.len() as u64;
        Ok(data.len())
    }

    /// Move the stream position.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotOpen`] if the file is closed
    /// - [`FsError::Backend`] for a position before the start
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, FsError> {
        self.ensure_open()?;
        let (base, offset) = match pos {
            SeekFrom::Start(n) => {
                self.position = n;
                return Ok(n);
            }
            SeekFrom::Current(n) => (self.position, n),
            SeekFrom::End(n) => (self.item.backend().content_len(self.item.url())?, n),
        };
        self.position = base.checked_add_signed(offset).ok_or_else(|| {
            FsError::Backend(format!("seek before start of {}", self.item.url()))
        })?;
        Ok(self.position)
    }

    /// The current stream position.
    pub fn tell(&self) -> u64 {
        self.position
    }

    /// Writes are not buffered, so this only checks the file is open.
    pub fn flush(&mut self) -> Result<(), FsError> {
        self.ensure_open()
    }
}

impl Deref for File {
    type Target = Item;

    fn deref(&self) -> &Item {
        &self.item
    }
}

impl Drop for File {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(url = %self.item.url(), error = %e, "failed to close file on drop");
        }
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("url", self.item.url())
            .field("mode", &self.mode)
            .field("open", &self.open)
            .field("position", &self.position)
            .finish()
    }
}

impl io::Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.read_bytes(Some(buf.len()))?;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

impl io::Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(File::flush(self)?)
    }
}

impl io::Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(File::seek(self, pos)?)
    }
}
