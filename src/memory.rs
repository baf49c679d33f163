//! In-memory reference backend (`mem://`).
//!
//! [`MemoryFs`] keeps a whole tree in a map keyed by path. It is what the CLI
//! demo runs on and what the test suites use to exercise the core, so it also
//! models a few awkward backend behaviors: read-only files, change revisions,
//! and links that expose one node under a second parent.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{
    AccessMode, Backend, Entry, FilesystemProvider, FsContent, FsError, FsMutate, FsNavigate,
    FsOptions, FsUrl, ItemKind,
};

const ROOT_KEY: &str = "/";

#[derive(Debug, Clone)]
enum NodeKind {
    File(Vec<u8>),
    Directory,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    read_only: bool,
    revision: u64,
    id: u64,
}

impl Node {
    fn item_kind(&self) -> ItemKind {
        match self.kind {
            NodeKind::File(_) => ItemKind::File,
            NodeKind::Directory => ItemKind::Directory,
        }
    }
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    /// link path -> target path
    links: BTreeMap<String, String>,
    clock: u64,
    next_id: u64,
}

impl State {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn new_node(&mut self, kind: NodeKind) -> Node {
        self.next_id += 1;
        let revision = self.tick();
        Node {
            kind,
            read_only: false,
            revision,
            id: self.next_id,
        }
    }

    /// Bump the revision of `key` and its parent directory.
    fn touch(&mut self, key: &str) {
        let revision = self.tick();
        if let Some(node) = self.nodes.get_mut(key) {
            node.revision = revision;
        }
        if let Some(parent) = parent_key(key) {
            if let Some(node) = self.nodes.get_mut(parent) {
                node.revision = revision;
            }
        }
    }

    /// Follow a link, if `key` is one.
    fn target<'a>(&'a self, key: &'a str) -> &'a str {
        self.links.get(key).map(String::as_str).unwrap_or(key)
    }

    fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.get(self.target(key))
    }

    fn subtree_keys(&self, key: &str) -> Vec<String> {
        let prefix = descendant_prefix(key);
        let mut keys = vec![key.to_string()];
        keys.extend(
            self.nodes
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, _)| k.clone()),
        );
        keys
    }
}

fn parent_key(key: &str) -> Option<&str> {
    if key == ROOT_KEY {
        return None;
    }
    match key.rfind('/') {
        Some(0) => Some(ROOT_KEY),
        Some(i) => Some(&key[..i]),
        None => None,
    }
}

fn descendant_prefix(key: &str) -> String {
    if key == ROOT_KEY {
        ROOT_KEY.to_string()
    } else {
        format!("{key}/")
    }
}

fn join_key(parent: &str, name: &str) -> String {
    if parent == ROOT_KEY {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn normalize_key(path: &str) -> String {
    let segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    if segments.is_empty() {
        ROOT_KEY.to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}

/// An in-memory backend answering for one `mem://` volume.
///
/// # Example
///
/// ```rust
/// use ezfs::{Filesystem, MemoryFs};
/// use std::sync::Arc;
///
/// let fs = MemoryFs::new();
/// fs.insert_file("/a/b.txt", "hello").unwrap();
///
/// let filesystem = Filesystem::new(Arc::new(fs));
/// let item = filesystem.get("a/b.txt").unwrap();
/// assert_eq!(item.read().unwrap(), b"hello");
/// ```
#[derive(Debug)]
pub struct MemoryFs {
    root: FsUrl,
    case_sensitive: bool,
    state: RwLock<State>,
}

impl MemoryFs {
    /// An empty, case-sensitive volume at `mem:///`.
    pub fn new() -> Self {
        Self::with_root(Self::volume_url(""))
    }

    /// An empty, case-sensitive volume at `mem://{volume}/`.
    pub fn named(volume: &str) -> Self {
        Self::with_root(Self::volume_url(volume))
    }

    fn volume_url(volume: &str) -> FsUrl {
        let raw = format!("mem://{volume}/");
        FsUrl::parse(&raw).unwrap_or_else(|_| Self::fallback_root())
    }

    fn fallback_root() -> FsUrl {
        FsUrl::parse("mem:///").unwrap_or_else(|_| unreachable!("static url parses"))
    }

    fn with_root(root: FsUrl) -> Self {
        let mut state = State::default();
        let node = state.new_node(NodeKind::Directory);
        state.nodes.insert(ROOT_KEY.to_string(), node);
        Self {
            root,
            case_sensitive: true,
            state: RwLock::new(state),
        }
    }

    /// Apply connection options.
    pub fn with_options(mut self, options: &FsOptions) -> Self {
        self.case_sensitive = options.case_sensitive;
        self
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The URL of the node stored under `key`.
    fn url_of(&self, key: &str, kind: ItemKind) -> FsUrl {
        let segments: Vec<&str> = key.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, dirs)) = segments.split_last() else {
            return self.root.clone();
        };
        let parent = dirs
            .iter()
            .fold(self.root.clone(), |url, seg| url.child(seg, ItemKind::Directory));
        parent.child(last, kind)
    }

    fn key_of(&self, url: &FsUrl) -> Result<String, FsError> {
        if url.root() != self.root {
            return Err(FsError::NotFound {
                url: url.to_string(),
            });
        }
        let segments = url.segments();
        if segments.is_empty() {
            Ok(ROOT_KEY.to_string())
        } else {
            Ok(format!("/{}", segments.join("/")))
        }
    }

    fn entry(&self, key: &str, node: &Node) -> Entry {
        Entry {
            url: self.url_of(key, node.item_kind()),
            kind: node.item_kind(),
            fs_id: Some(node.id.to_string()),
        }
    }

    fn not_found(&self, key: &str) -> FsError {
        FsError::NotFound {
            url: self.url_of(key, ItemKind::File).to_string(),
        }
    }

    /// Create a directory and any missing parents.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if a component exists as a file
    pub fn insert_dir(&self, path: &str) -> Result<(), FsError> {
        let key = normalize_key(path);
        let mut state = self.write_state();
        Self::ensure_dir(&mut state, &key, |k| self.url_of(k, ItemKind::File))
    }

    fn ensure_dir(
        state: &mut State,
        key: &str,
        url_of: impl Fn(&str) -> FsUrl + Copy,
    ) -> Result<(), FsError> {
        match state.nodes.get(key) {
            Some(node) => match node.kind {
                NodeKind::Directory => Ok(()),
                NodeKind::File(_) => Err(FsError::NotADirectory {
                    url: url_of(key).to_string(),
                }),
            },
            None => {
                if let Some(parent) = parent_key(key) {
                    Self::ensure_dir(state, parent, url_of)?;
                }
                let node = state.new_node(NodeKind::Directory);
                state.nodes.insert(key.to_string(), node);
                state.touch(key);
                Ok(())
            }
        }
    }

    /// Create or replace a file, creating any missing parents.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotADirectory`] if a parent component exists as a file
    /// - [`FsError::NotAFile`] if `path` is a directory
    pub fn insert_file(&self, path: &str, data: impl Into<Vec<u8>>) -> Result<(), FsError> {
        let key = normalize_key(path);
        let mut state = self.write_state();
        if let Some(parent) = parent_key(&key) {
            Self::ensure_dir(&mut state, parent, |k| self.url_of(k, ItemKind::File))?;
        }
        if let Some(Node {
            kind: NodeKind::Directory,
            ..
        }) = state.nodes.get(&key)
        {
            return Err(FsError::NotAFile {
                url: self.url_of(&key, ItemKind::Directory).to_string(),
            });
        }
        let node = state.new_node(NodeKind::File(data.into()));
        state.nodes.insert(key.clone(), node);
        state.touch(&key);
        Ok(())
    }

    /// Mark a file read-only, so opening it for writing is refused.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if nothing lives at `path`
    pub fn set_read_only(&self, path: &str, read_only: bool) -> Result<(), FsError> {
        let key = normalize_key(path);
        let mut state = self.write_state();
        match state.nodes.get_mut(&key) {
            Some(node) => {
                node.read_only = read_only;
                Ok(())
            }
            None => Err(self.not_found(&key)),
        }
    }

    /// Expose the node at `target` a second time, as `path`.
    ///
    /// Listings of `path`'s parent report the target node itself (same URL),
    /// the way hard links or symlinked directories look to a client.
    ///
    /// # Errors
    ///
    /// - [`FsError::NotFound`] if `target` or the parent of `path` is missing
    /// - [`FsError::AlreadyExists`] if `path` is taken
    pub fn link(&self, path: &str, target: &str) -> Result<(), FsError> {
        let key = normalize_key(path);
        let target = normalize_key(target);
        let mut state = self.write_state();
        if !state.nodes.contains_key(&target) {
            return Err(self.not_found(&target));
        }
        let parent = parent_key(&key).unwrap_or(ROOT_KEY).to_string();
        if !matches!(
            state.nodes.get(&parent).map(|n| &n.kind),
            Some(NodeKind::Directory)
        ) {
            return Err(self.not_found(&parent));
        }
        if state.nodes.contains_key(&key) || state.links.contains_key(&key) {
            return Err(FsError::AlreadyExists {
                url: self.url_of(&key, ItemKind::File).to_string(),
                operation: "link",
            });
        }
        state.links.insert(key.clone(), target);
        state.touch(&key);
        Ok(())
    }

    fn relocate(state: &mut State, from: &str, to: &str) {
        for old in state.subtree_keys(from) {
            if let Some(node) = state.nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                state.nodes.insert(new, node);
            }
        }
        let moved_links: Vec<String> = state
            .links
            .keys()
            .filter(|k| k.as_str() == from || k.starts_with(&descendant_prefix(from)))
            .cloned()
            .collect();
        for old in moved_links {
            if let Some(target) = state.links.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                state.links.insert(new, target);
            }
        }
        state.touch(from);
        state.touch(to);
    }

    fn check_destination(&self, state: &State, from: &str, to: &str) -> Result<(), FsError> {
        if state.node(to).is_some() {
            return Err(FsError::AlreadyExists {
                url: self.url_of(to, ItemKind::File).to_string(),
                operation: "move",
            });
        }
        if to.starts_with(&descendant_prefix(from)) {
            return Err(FsError::Backend(format!(
                "cannot place {} inside itself",
                self.url_of(from, ItemKind::Directory)
            )));
        }
        let parent = parent_key(to).unwrap_or(ROOT_KEY);
        match state.node(parent).map(|n| &n.kind) {
            Some(NodeKind::Directory) => Ok(()),
            Some(NodeKind::File(_)) => Err(FsError::NotADirectory {
                url: self.url_of(parent, ItemKind::File).to_string(),
            }),
            None => Err(self.not_found(parent)),
        }
    }

    fn file_bytes<'a>(&self, state: &'a State, key: &str) -> Result<&'a Vec<u8>, FsError> {
        match state.node(key).map(|n| &n.kind) {
            Some(NodeKind::File(data)) => Ok(data),
            Some(NodeKind::Directory) => Err(FsError::NotAFile {
                url: self.url_of(key, ItemKind::Directory).to_string(),
            }),
            None => Err(self.not_found(key)),
        }
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FsNavigate for MemoryFs {
    fn root_url(&self) -> &FsUrl {
        &self.root
    }

    fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    fn resolve(&self, url: &FsUrl) -> Result<Entry, FsError> {
        let key = self.key_of(url)?;
        let state = self.read_state();
        let target = state.target(&key);
        state
            .nodes
            .get(target)
            .map(|node| self.entry(target, node))
            .ok_or_else(|| self.not_found(&key))
    }

    fn list(&self, dir: &FsUrl) -> Result<Vec<Entry>, FsError> {
        let key = self.key_of(dir)?;
        let state = self.read_state();
        let key = state.target(&key).to_string();
        match state.nodes.get(&key).map(|n| &n.kind) {
            Some(NodeKind::Directory) => {}
            Some(NodeKind::File(_)) => {
                return Err(FsError::NotADirectory {
                    url: dir.to_string(),
                });
            }
            None => return Err(self.not_found(&key)),
        }

        let prefix = descendant_prefix(&key);
        let is_child = |k: &str| {
            k.starts_with(&prefix) && k != ROOT_KEY && !k[prefix.len()..].contains('/')
        };

        let mut entries: Vec<Entry> = state
            .nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| is_child(k.as_str()))
            .map(|(k, node)| self.entry(k, node))
            .collect();
        for (_, target) in state.links.iter().filter(|(k, _)| is_child(k.as_str())) {
            if let Some(node) = state.nodes.get(target) {
                entries.push(self.entry(target, node));
            }
        }
        Ok(entries)
    }

    fn revision(&self, url: &FsUrl) -> Result<Option<u64>, FsError> {
        let key = self.key_of(url)?;
        let state = self.read_state();
        state
            .node(&key)
            .map(|node| Some(node.revision))
            .ok_or_else(|| self.not_found(&key))
    }
}

impl FsMutate for MemoryFs {
    fn delete(&self, url: &FsUrl) -> Result<(), FsError> {
        let key = self.key_of(url)?;
        if key == ROOT_KEY {
            return Err(FsError::AccessDenied {
                url: url.to_string(),
                mode: "delete".into(),
            });
        }
        let mut state = self.write_state();
        if state.links.remove(&key).is_some() {
            state.touch(&key);
            return Ok(());
        }
        if !state.nodes.contains_key(&key) {
            return Err(self.not_found(&key));
        }
        for k in state.subtree_keys(&key) {
            state.nodes.remove(&k);
        }
        let prefix = descendant_prefix(&key);
        state.links.retain(|k, target| {
            !k.starts_with(&prefix) && *target != key && !target.starts_with(&prefix)
        });
        state.touch(&key);
        Ok(())
    }

    fn rename(&self, url: &FsUrl, new_name: &str) -> Result<FsUrl, FsError> {
        if new_name.is_empty() || new_name.contains('/') || new_name == "." || new_name == ".." {
            return Err(FsError::InvalidUrl {
                url: new_name.to_string(),
                reason: "not a single path segment".into(),
            });
        }
        let key = self.key_of(url)?;
        let parent = parent_key(&key).ok_or_else(|| FsError::AccessDenied {
            url: url.to_string(),
            mode: "rename".into(),
        })?;
        let new_key = join_key(parent, new_name);
        let mut state = self.write_state();
        let kind = state
            .nodes
            .get(&key)
            .map(Node::item_kind)
            .ok_or_else(|| self.not_found(&key))?;
        if new_key != key {
            if state.node(&new_key).is_some() {
                return Err(FsError::AlreadyExists {
                    url: self.url_of(&new_key, kind).to_string(),
                    operation: "rename",
                });
            }
            Self::relocate(&mut state, &key, &new_key);
        }
        Ok(self.url_of(&new_key, kind))
    }

    fn create_dir(&self, url: &FsUrl) -> Result<(), FsError> {
        let key = self.key_of(url)?;
        let mut state = self.write_state();
        if state.node(&key).is_some() {
            return Err(FsError::AlreadyExists {
                url: url.to_string(),
                operation: "create_dir",
            });
        }
        let parent = parent_key(&key).unwrap_or(ROOT_KEY);
        match state.node(parent).map(|n| &n.kind) {
            Some(NodeKind::Directory) => {}
            Some(NodeKind::File(_)) => {
                return Err(FsError::NotADirectory {
                    url: self.url_of(parent, ItemKind::File).to_string(),
                });
            }
            None => return Err(self.not_found(parent)),
        }
        let node = state.new_node(NodeKind::Directory);
        state.nodes.insert(key.clone(), node);
        state.touch(&key);
        Ok(())
    }

    fn move_item(&self, from: &FsUrl, to: &FsUrl) -> Result<(), FsError> {
        let from_key = self.key_of(from)?;
        let to_key = self.key_of(to)?;
        if from_key == ROOT_KEY {
            return Err(FsError::AccessDenied {
                url: from.to_string(),
                mode: "move".into(),
            });
        }
        let mut state = self.write_state();
        if !state.nodes.contains_key(&from_key) {
            return Err(self.not_found(&from_key));
        }
        if from_key == to_key {
            return Ok(());
        }
        self.check_destination(&state, &from_key, &to_key)?;
        Self::relocate(&mut state, &from_key, &to_key);
        Ok(())
    }

    fn copy_item(&self, from: &FsUrl, to: &FsUrl) -> Result<(), FsError> {
        let from_key = self.key_of(from)?;
        let to_key = self.key_of(to)?;
        let mut state = self.write_state();
        let from_key = state.target(&from_key).to_string();
        if !state.nodes.contains_key(&from_key) {
            return Err(self.not_found(&from_key));
        }
        self.check_destination(&state, &from_key, &to_key)?;
        for old in state.subtree_keys(&from_key) {
            if let Some(node) = state.nodes.get(&old).cloned() {
                let mut copy = state.new_node(node.kind);
                copy.read_only = node.read_only;
                let new = format!("{to_key}{}", &old[from_key.len()..]);
                state.nodes.insert(new, copy);
            }
        }
        state.touch(&to_key);
        Ok(())
    }
}

impl FsContent for MemoryFs {
    fn check_access(&self, url: &FsUrl, mode: AccessMode) -> Result<(), FsError> {
        let key = self.key_of(url)?;
        let state = self.read_state();
        match state.node(&key) {
            Some(Node {
                kind: NodeKind::Directory,
                ..
            }) => Err(FsError::NotAFile {
                url: url.to_string(),
            }),
            Some(node) if node.read_only && mode.write => Err(FsError::AccessDenied {
                url: url.to_string(),
                mode: mode.to_string(),
            }),
            Some(_) => Ok(()),
            None if mode.create => {
                let parent = parent_key(&key).unwrap_or(ROOT_KEY);
                match state.node(parent).map(|n| &n.kind) {
                    Some(NodeKind::Directory) => Ok(()),
                    _ => Err(self.not_found(parent)),
                }
            }
            None => Err(self.not_found(&key)),
        }
    }

    fn content_len(&self, url: &FsUrl) -> Result<u64, FsError> {
        let key = self.key_of(url)?;
        let state = self.read_state();
        Ok(self.file_bytes(&state, &key)?.len() as u64)
    }

    fn read_range(&self, url: &FsUrl, offset: u64, len: usize) -> Result<Vec<u8>, FsError> {
        let key = self.key_of(url)?;
        let state = self.read_state();
        let data = self.file_bytes(&state, &key)?;
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let end = start.saturating_add(len).min(data.len());
        Ok(data[start..end].to_vec())
    }

    fn write_at(&self, url: &FsUrl, offset: u64, data: &[u8]) -> Result<(), FsError> {
        let key = self.key_of(url)?;
        let (offset, end) = usize::try_from(offset)
            .ok()
            .and_then(|offset| Some((offset, offset.checked_add(data.len())?)))
            .filter(|&(_, end)| isize::try_from(end).is_ok())
            .ok_or_else(|| FsError::Backend(format!("write at offset {offset} out of range: {url}")))?;
        let mut state = self.write_state();
        let key = state.target(&key).to_string();
        if !state.nodes.contains_key(&key) {
            let parent = parent_key(&key).unwrap_or(ROOT_KEY);
            if !matches!(
                state.nodes.get(parent).map(|n| &n.kind),
                Some(NodeKind::Directory)
            ) {
                return Err(self.not_found(parent));
            }
            let node = state.new_node(NodeKind::File(Vec::new()));
            state.nodes.insert(key.clone(), node);
        }
        match state.nodes.get_mut(&key) {
            Some(Node { read_only: true, .. }) => {
                return Err(FsError::AccessDenied {
                    url: url.to_string(),
                    mode: "w".into(),
                });
            }
            Some(Node {
                kind: NodeKind::File(bytes),
                ..
            }) => {
                if bytes.len() < end {
                    bytes.resize(end, 0);
                }
                bytes[offset..end].copy_from_slice(data);
            }
            Some(_) => {
                return Err(FsError::NotAFile {
                    url: url.to_string(),
                });
            }
            None => return Err(self.not_found(&key)),
        }
        state.touch(&key);
        Ok(())
    }

    fn truncate(&self, url: &FsUrl, size: u64) -> Result<(), FsError> {
        let key = self.key_of(url)?;
        let mut state = self.write_state();
        let key = state.target(&key).to_string();
        let size = usize::try_from(size)
            .map_err(|_| FsError::Backend(format!("size {size} out of range")))?;
        match state.nodes.get_mut(&key) {
            Some(Node { read_only: true, .. }) => {
                return Err(FsError::AccessDenied {
                    url: url.to_string(),
                    mode: "w".into(),
                });
            }
            Some(Node {
                kind: NodeKind::File(bytes),
                ..
            }) => bytes.resize(size, 0),
            Some(_) => {
                return Err(FsError::NotAFile {
                    url: url.to_string(),
                });
            }
            None => return Err(self.not_found(&key)),
        }
        state.touch(&key);
        Ok(())
    }
}

/// Protocol provider for `mem://` URLs.
///
/// Each URL host names a volume; connecting twice to the same host yields the
/// same [`MemoryFs`], so items from both connections belong to one backend.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    volumes: Mutex<HashMap<String, Arc<MemoryFs>>>,
}

impl MemoryProvider {
    /// A provider with no volumes; they are created on first connect.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-register a volume under `name` (the URL host).
    pub fn with_volume(self, name: &str, volume: Arc<MemoryFs>) -> Self {
        self.volumes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), volume);
        self
    }

    /// The volume called `name`, created empty if it does not exist yet.
    pub fn volume(&self, name: &str, options: &FsOptions) -> Arc<MemoryFs> {
        self.volumes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryFs::named(name).with_options(options)))
            .clone()
    }
}

impl FilesystemProvider for MemoryProvider {
    fn name(&self) -> &str {
        "memory"
    }

    fn url_protocols(&self) -> &[&str] {
        &["mem://"]
    }

    fn connect(&self, url: &FsUrl, options: &FsOptions) -> Result<Arc<dyn Backend>, FsError> {
        let volume: Arc<dyn Backend> = self.volume(url.host().unwrap_or(""), options);
        Ok(volume)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BackendExt;

    fn url(s: &str) -> FsUrl {
        FsUrl::parse(s).unwrap()
    }

    fn names(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(|e| e.url.name()).collect()
    }

    fn sample() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.insert_file("/a/b.txt", "bee").unwrap();
        fs.insert_file("/a/c/d.txt", "dee").unwrap();
        fs
    }

    #[test]
    fn root_exists_and_is_directory() {
        let fs = MemoryFs::new();
        let entry = fs.resolve(&url("mem:///")).unwrap();
        assert_eq!(entry.kind, ItemKind::Directory);
        assert!(entry.url.is_root());
    }

    #[test]
    fn insert_creates_parents() {
        let fs = sample();
        assert!(fs.is_dir(&url("mem:///a/c")).unwrap());
        let entry = fs.resolve(&url("mem:///a/c")).unwrap();
        assert_eq!(entry.url.as_str(), "mem:///a/c/");
    }

    #[test]
    fn list_returns_direct_children_in_name_order() {
        let fs = sample();
        let entries = fs.list(&url("mem:///a/")).unwrap();
        assert_eq!(names(&entries), vec!["b.txt", "c"]);
        assert_eq!(fs.list(&url("mem:///")).unwrap().len(), 1);
    }

    #[test]
    fn list_on_file_is_not_a_directory() {
        let fs = sample();
        let err = fs.list(&url("mem:///a/b.txt")).unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }));
    }

    #[test]
    fn other_volume_is_not_found() {
        let fs = sample();
        let err = fs.resolve(&url("mem://other/a")).unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }

    #[test]
    fn rename_moves_subtree() {
        let fs = sample();
        let new_url = fs.rename(&url("mem:///a/c"), "z").unwrap();
        assert_eq!(new_url.as_str(), "mem:///a/z/");
        assert!(fs.is_file(&url("mem:///a/z/d.txt")).unwrap());
        assert!(!fs.exists(&url("mem:///a/c")).unwrap());
    }

    #[test]
    fn rename_refuses_existing_sibling() {
        let fs = sample();
        let err = fs.rename(&url("mem:///a/c"), "b.txt").unwrap_err();
        assert!(matches!(err, FsError::AlreadyExists { .. }));
    }

    #[test]
    fn delete_removes_subtree_but_not_root() {
        let fs = sample();
        fs.delete(&url("mem:///a/c")).unwrap();
        assert!(!fs.exists(&url("mem:///a/c/d.txt")).unwrap());
        assert!(matches!(
            fs.delete(&url("mem:///")),
            Err(FsError::AccessDenied { .. })
        ));
    }

    #[test]
    fn move_and_copy_within_volume() {
        let fs = sample();
        fs.copy_item(&url("mem:///a/c"), &url("mem:///copy")).unwrap();
        fs.move_item(&url("mem:///a/b.txt"), &url("mem:///copy/b.txt"))
            .unwrap();
        assert!(fs.is_file(&url("mem:///copy/d.txt")).unwrap());
        assert!(fs.is_file(&url("mem:///a/c/d.txt")).unwrap());
        assert_eq!(fs.read_all(&url("mem:///copy/b.txt")).unwrap(), b"bee");
        assert!(!fs.exists(&url("mem:///a/b.txt")).unwrap());
    }

    #[test]
    fn move_into_itself_is_refused() {
        let fs = sample();
        let err = fs
            .move_item(&url("mem:///a"), &url("mem:///a/c/a"))
            .unwrap_err();
        assert!(matches!(err, FsError::Backend(_)));
    }

    #[test]
    fn write_at_extends_and_creates() {
        let fs = sample();
        let target = url("mem:///a/new.txt");
        fs.write_at(&target, 2, b"xy").unwrap();
        assert_eq!(fs.read_all(&target).unwrap(), b"\0\0xy");
        assert_eq!(fs.read_range(&target, 3, 10).unwrap(), b"y");
        assert!(fs.read_range(&target, 10, 10).unwrap().is_empty());
    }

    #[test]
    fn write_at_unaddressable_offset_fails_cleanly() {
        let fs = sample();
        let existing = url("mem:///a/b.txt");
        let err = fs.write_at(&existing, u64::MAX - 1, b"xyz").unwrap_err();
        assert!(matches!(err, FsError::Backend(_)));
        assert_eq!(fs.read_all(&existing).unwrap(), b"bee");

        let fresh = url("mem:///a/never.txt");
        assert!(fs.write_at(&fresh, u64::MAX, b"x").is_err());
        assert!(!fs.exists(&fresh).unwrap());
    }

    #[test]
    fn read_only_refuses_writes() {
        let fs = sample();
        fs.set_read_only("/a/b.txt", true).unwrap();
        let target = url("mem:///a/b.txt");
        assert!(matches!(
            fs.check_access(&target, AccessMode::WRITE),
            Err(FsError::AccessDenied { .. })
        ));
        assert!(fs.check_access(&target, AccessMode::READ).is_ok());
        assert!(matches!(
            fs.write_at(&target, 0, b"x"),
            Err(FsError::AccessDenied { .. })
        ));
    }

    #[test]
    fn link_lists_target_node() {
        let fs = sample();
        fs.insert_dir("/other").unwrap();
        fs.link("/other/alias", "/a/c").unwrap();
        let entries = fs.list(&url("mem:///other/")).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url.as_str(), "mem:///a/c/");
        let via_link = fs.resolve(&url("mem:///other/alias")).unwrap();
        assert_eq!(via_link.url, url("mem:///a/c/"));
    }

    #[test]
    fn revision_changes_on_write() {
        let fs = sample();
        let target = url("mem:///a/b.txt");
        let dir = url("mem:///a/");
        let before = fs.revision(&target).unwrap();
        let dir_before = fs.revision(&dir).unwrap();
        fs.write_at(&target, 0, b"B").unwrap();
        assert_ne!(fs.revision(&target).unwrap(), before);
        assert_ne!(fs.revision(&dir).unwrap(), dir_before);
    }

    #[test]
    fn provider_shares_volumes_by_host() {
        let provider = MemoryProvider::new();
        let options = FsOptions::default();
        let a = provider.connect(&url("mem://scratch/x"), &options).unwrap();
        let b = provider.connect(&url("mem://scratch/y"), &options).unwrap();
        assert_eq!(a.root_url(), b.root_url());
        assert_eq!(a.root_url().as_str(), "mem://scratch/");
        assert!(provider.supports_url(&url("mem:///")));
        assert!(!provider.supports_url(&url("ftp://host/")));
    }
}
