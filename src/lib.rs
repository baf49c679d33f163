//! # ezfs
//!
//! A URL-addressed **virtual filesystem tree** over pluggable storage backends.
//!
//! Clients navigate, search and mutate files and directories without knowing
//! which backend answers for a given location: a registry maps each URL
//! protocol (and each embedded-file format) to the provider that serves it.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use ezfs::{Ez, MemoryFs, MemoryProvider, Registry};
//! use std::sync::Arc;
//!
//! let demo = MemoryFs::named("demo");
//! demo.insert_file("/a/b.txt", "bee")?;
//! demo.insert_file("/a/c/d.txt", "dee")?;
//!
//! let mut registry = Registry::new();
//! registry.register_filesystem(Arc::new(MemoryProvider::new().with_volume("demo", Arc::new(demo))));
//!
//! let ez = Ez::new(Arc::new(registry), "mem://demo/")?;
//! assert_eq!(ez.get("a/c/d.txt")?.read()?, b"dee");
//! assert_eq!(ez.find("a/*")?.len(), 2);
//! assert_eq!(ez.regex_find("^d")?.len(), 1);
//! # Ok::<(), ezfs::FsError>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Item`] | Any addressable node; equality by normalized URL |
//! | [`Directory`] | Container view: path resolution, walk, glob, regex search |
//! | [`File`] | Stream view with open/close state and an access mode |
//! | [`Filesystem`] | One backend connection plus a working directory |
//! | [`Registry`] | Dispatch by URL protocol and by content sniffing |
//! | [`Ez`] | Façade tying a registry to a current filesystem |
//! | [`Poller`] | Change watching by periodic sampling |
//! | [`FsError`] | Error type carrying the offending URL |
//!
//! ---
//!
//! ## Backends
//!
//! ```text
//! FsNavigate + FsMutate + FsContent = Backend
//! ```
//!
//! [`Backend`] has a blanket implementation. Items hold an
//! `Arc<dyn Backend>` and derive parents, children and content by asking it,
//! so views never go stale and never form reference cycles.
//! [`MemoryFs`] is the built-in `mem://` backend.
//!
//! ---
//!
//! ## Error Handling
//!
//! ```rust
//! use ezfs::FsError;
//!
//! let err = FsError::NotFound { url: "mem:///missing.txt".into() };
//! assert_eq!(err.to_string(), "not found: mem:///missing.txt");
//! ```
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for [`FsUrl`], [`ItemInfo`], [`FsOptions`], ...; JSON helpers via `BackendExtJson` |
//! | `cli` | The `ezfs` command-line binary |

// Private modules
mod directory;
mod error;
mod ext;
mod ez;
mod file;
mod filesystem;
mod item;
mod memory;
mod poller;
mod registry;
mod traits;
mod types;
mod url;

// Public re-exports - errors and plain types
pub use error::FsError;
pub use types::{AccessMode, Entry, FsOptions, ItemInfo, ItemKind, Traversal};
pub use self::url::FsUrl;

// Public re-exports - backend traits
pub use ext::BackendExt;
pub use traits::{Backend, FsContent, FsMutate, FsNavigate};

// Public re-exports - tree views
pub use directory::Directory;
pub use file::File;
pub use filesystem::Filesystem;
pub use item::Item;

// Public re-exports - dispatch and watching
pub use ez::Ez;
pub use poller::{ItemWatch, PollSource, Poller, WatchId};
pub use registry::{FilebasedProvider, FilesystemProvider, MAGIC_LEN, Registry};

// Public re-exports - built-in backend
pub use memory::{MemoryFs, MemoryProvider};

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::BackendExtJson;
