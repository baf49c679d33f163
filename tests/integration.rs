//! Integration tests exercising the public API end to end.
//!
//! These tests verify that:
//! 1. Dispatch picks backends by protocol and embedded formats by content
//! 2. Path resolution, walking and search agree on the same tree
//! 3. Cross-backend transfers and their failure modes behave safely
//! 4. Watches are gated by the smallest registered interval

use ezfs::*;
use proptest::prelude::*;
use std::io::Cursor;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

// =============================================================================
// Mock ZIP Provider
// =============================================================================

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Recognizes ZIP local-file headers. The "archive" body is a newline
/// separated list of member paths, which is enough to build a tree.
struct MockZip {
    opened: AtomicUsize,
}

impl MockZip {
    fn new() -> Self {
        Self {
            opened: AtomicUsize::new(0),
        }
    }
}

impl FilebasedProvider for MockZip {
    fn name(&self) -> &str {
        "zip"
    }

    fn can_read(&self, _filename: Option<&str>, head: &[u8], _mimetype: Option<&str>) -> bool {
        head.starts_with(ZIP_MAGIC)
    }

    fn open(&self, host: &File) -> Result<Arc<dyn Backend>, FsError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        let data = host.read()?;
        let body = String::from_utf8_lossy(&data[ZIP_MAGIC.len()..]).into_owned();
        let archive = MemoryFs::named(&host.name());
        for member in body.lines().filter(|l| !l.is_empty()) {
            if member.ends_with('/') {
                archive.insert_dir(member)?;
            } else {
                archive.insert_file(member, member.as_bytes())?;
            }
        }
        Ok(Arc::new(archive))
    }
}

/// Recognizes JPEG images, which some callers mount as single-file trees.
struct Jpeg;

impl FilebasedProvider for Jpeg {
    fn name(&self) -> &str {
        "jpeg"
    }

    fn can_read(&self, _filename: Option<&str>, head: &[u8], _mimetype: Option<&str>) -> bool {
        head.starts_with(&[0xFF, 0xD8, 0xFF])
    }

    fn open(&self, host: &File) -> Result<Arc<dyn Backend>, FsError> {
        Err(FsError::NotImplemented {
            operation: "open",
            url: host.url().to_string(),
        })
    }
}

/// A volume whose deletes always fail.
struct Undeletable(MemoryFs);

impl FsNavigate for Undeletable {
    fn root_url(&self) -> &FsUrl {
        self.0.root_url()
    }

    fn resolve(&self, url: &FsUrl) -> Result<Entry, FsError> {
        self.0.resolve(url)
    }

    fn list(&self, dir: &FsUrl) -> Result<Vec<Entry>, FsError> {
        self.0.list(dir)
    }
}

impl FsMutate for Undeletable {
    fn delete(&self, url: &FsUrl) -> Result<(), FsError> {
        Err(FsError::AccessDenied {
            url: url.to_string(),
            mode: "delete".into(),
        })
    }

    fn rename(&self, url: &FsUrl, new_name: &str) -> Result<FsUrl, FsError> {
        self.0.rename(url, new_name)
    }

    fn create_dir(&self, url: &FsUrl) -> Result<(), FsError> {
        self.0.create_dir(url)
    }
}

impl FsContent for Undeletable {
    fn content_len(&self, url: &FsUrl) -> Result<u64, FsError> {
        self.0.content_len(url)
    }

    fn read_range(&self, url: &FsUrl, offset: u64, len: usize) -> Result<Vec<u8>, FsError> {
        self.0.read_range(url, offset, len)
    }

    fn write_at(&self, url: &FsUrl, offset: u64, data: &[u8]) -> Result<(), FsError> {
        self.0.write_at(url, offset, data)
    }

    fn truncate(&self, url: &FsUrl, size: u64) -> Result<(), FsError> {
        self.0.truncate(url, size)
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// `/a/b.txt`, `/a/c/`, `/a/c/d.txt` on `mem://demo/`.
fn demo() -> Arc<MemoryFs> {
    let fs = MemoryFs::named("demo");
    fs.insert_file("/a/b.txt", "bee").unwrap();
    fs.insert_file("/a/c/d.txt", "dee").unwrap();
    Arc::new(fs)
}

fn registry_with(volume: Arc<MemoryFs>) -> (Arc<Registry>, Arc<MockZip>) {
    let zip = Arc::new(MockZip::new());
    let mut registry = Registry::new();
    registry
        .register_filesystem(Arc::new(MemoryProvider::new().with_volume("demo", volume)))
        .register_filebased(Arc::new(Jpeg))
        .register_filebased(zip.clone());
    (Arc::new(registry), zip)
}

fn names(items: &[Item]) -> Vec<String> {
    items.iter().map(Item::name).collect()
}

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

// =============================================================================
// Dispatch
// =============================================================================

#[test]
fn unknown_protocol_is_unsupported() {
    let (registry, _) = registry_with(demo());
    let err = Ez::new(registry, "ftp://host/path").unwrap_err();
    assert!(matches!(err, FsError::UnsupportedProtocol { ref url } if url == "ftp://host/path"));
}

#[test]
fn zip_magic_wins_over_misleading_extension() {
    let (registry, _) = registry_with(demo());
    let mut data = ZIP_MAGIC.to_vec();
    data.extend_from_slice(b"docs/readme.md\n");
    let mut cursor = Cursor::new(data);

    let ez = Ez::new(registry.clone(), "mem://demo/").unwrap();
    let provider = ez
        .embedded_fs_for(&mut cursor, Some("holiday.jpg"), Some("image/jpeg"))
        .unwrap()
        .unwrap();
    assert_eq!(provider.name(), "zip");
    assert_eq!(cursor.position(), 0);

    assert!(
        registry
            .filebased_for_bytes(Some("real.zip"), b"not a zip", None)
            .is_none()
    );
}

#[test]
fn mount_embedded_archive() {
    let volume = demo();
    let mut body = ZIP_MAGIC.to_vec();
    body.extend_from_slice(b"docs/readme.md\ndocs/img/\nsrc/main.rs\n");
    volume.insert_file("/a/bundle.bin", body).unwrap();
    let (registry, zip) = registry_with(volume);

    let ez = Ez::new(registry, "mem://demo/").unwrap();
    let host = ez.open("a/bundle.bin", "r").unwrap();
    let archive = ez.mount_embedded(&host).unwrap().unwrap();
    assert_eq!(zip.opened.load(Ordering::SeqCst), 1);
    assert_eq!(archive.url().as_str(), "mem://bundle.bin/");
    assert_eq!(
        sorted(names(&archive.get_all(None).unwrap())),
        vec!["docs", "img", "main.rs", "readme.md", "src"]
    );

    let plain = ez.open("a/b.txt", "r").unwrap();
    assert!(ez.mount_embedded(&plain).unwrap().is_none());
}

// =============================================================================
// Navigation and Search
// =============================================================================

#[test]
fn glob_and_regex_scenarios() {
    let (registry, _) = registry_with(demo());
    let mut ez = Ez::new(registry, "mem://demo/").unwrap();

    assert_eq!(names(&ez.find("a/*").unwrap()), vec!["b.txt", "c"]);
    assert_eq!(names(&ez.find("a/c/*.txt").unwrap()), vec!["d.txt"]);

    ez.cd("a").unwrap();
    assert_eq!(names(&ez.regex_find("^d.*").unwrap()), vec!["d.txt"]);
}

#[test]
fn resolved_urls_ignore_spelling_variants() {
    let (registry, _) = registry_with(demo());
    let ez = Ez::new(registry, "mem://demo/").unwrap();
    let canonical = ez.get("mem://demo/a/c/").unwrap();
    for spelling in ["mem://demo/a/c", "mem://demo/./a/c/", "mem://demo/a/./c"] {
        assert_eq!(ez.get(spelling).unwrap().url(), canonical.url());
    }
    assert_eq!(ez.get("./a/c/").unwrap(), canonical);
}

#[test]
fn escaping_root_is_never_not_found() {
    let (registry, _) = registry_with(demo());
    let mut ez = Ez::new(registry, "mem://demo/").unwrap();
    ez.cd("a/c").unwrap();
    for path in ["../../..", "../../../a", "/../a", "../../../nope"] {
        assert!(
            matches!(ez.get(path), Err(FsError::PathEscapesRoot { .. })),
            "{path}"
        );
    }
}

#[test]
fn case_insensitive_backend_folds_names() {
    let fs = MemoryFs::named("ci").with_options(&FsOptions::default().case_sensitive(false));
    fs.insert_file("/Music/Track.MP3", "x").unwrap();
    fs.insert_file("/foo", "lower").unwrap();
    fs.insert_file("/FOO", "upper").unwrap();
    let filesystem = Filesystem::new(Arc::new(fs));

    assert!(!filesystem.case_sensitive());
    assert_eq!(filesystem.get("music/track.mp3").unwrap().name(), "Track.MP3");
    assert_eq!(filesystem.get("foo").unwrap().read().unwrap(), b"lower");
    assert_eq!(filesystem.get("FOO").unwrap().read().unwrap(), b"upper");
    assert_eq!(names(&filesystem.glob("MUSIC/TRACK.mp3", false).unwrap()), vec!["Track.MP3"]);
}

#[test]
fn get_all_emits_aliased_items_once() {
    let volume = demo();
    volume.insert_dir("/links").unwrap();
    volume.link("/links/c-again", "/a/c").unwrap();
    volume.link("/links/home", "/").unwrap();
    let filesystem = Filesystem::new(volume);

    let all = filesystem.get_all(None).unwrap();
    let urls: Vec<&str> = all.iter().map(|i| i.url().as_str()).collect();
    let mut unique = urls.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(urls.len(), unique.len());
    assert_eq!(
        sorted(names(&all)),
        vec!["a", "b.txt", "c", "d.txt", "links"]
    );
}

#[test]
fn pre_and_post_order_agree_on_nodes() {
    let filesystem = Filesystem::new(demo());
    let collect = |order| {
        let mut seen = Vec::new();
        filesystem
            .walk(order, |item, _| {
                seen.push(item.url().to_string());
                ControlFlow::<()>::Continue(())
            })
            .unwrap();
        seen
    };
    let pre = collect(Traversal::PreOrder);
    let post = collect(Traversal::PostOrder);
    let level = collect(Traversal::LevelOrder);
    assert_eq!(sorted(pre.clone()), sorted(post.clone()));
    assert_eq!(sorted(pre.clone()), sorted(level));

    let position = |list: &[String], url: &str| list.iter().position(|u| u == url).unwrap();
    assert!(position(&pre, "mem://demo/a/c/") < position(&pre, "mem://demo/a/c/d.txt"));
    assert!(position(&post, "mem://demo/a/c/") > position(&post, "mem://demo/a/c/d.txt"));
}

#[test]
fn nearest_match_with_level_order() {
    let volume = demo();
    volume.insert_file("/z/target", "shallow").unwrap();
    volume.insert_file("/a/c/deep/target", "deep").unwrap();
    let filesystem = Filesystem::new(volume);
    let found = filesystem
        .walk(Traversal::LevelOrder, |item, depth| {
            if item.name() == "target" {
                ControlFlow::Break((item.read().unwrap(), depth))
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
    assert_eq!(found, Some((b"shallow".to_vec(), 2)));
}

// =============================================================================
// Mutation
// =============================================================================

#[test]
fn cross_backend_move_of_file_then_directory() {
    let (registry, _) = registry_with(demo());
    let ez = Ez::new(registry, "mem://demo/").unwrap();

    let moved = ez.move_item("a/b.txt", "mem://archive/old", None).unwrap();
    assert_eq!(moved.url().as_str(), "mem://archive/old/b.txt");
    assert_eq!(moved.read().unwrap(), b"bee");
    assert!(matches!(ez.get("a/b.txt"), Err(FsError::NotFound { .. })));

    let err = ez.move_item("a/c", "mem://archive/old", None).unwrap_err();
    assert!(matches!(err, FsError::NotImplemented { operation: "move", .. }));
    assert!(ez.get("a/c/d.txt").is_ok());
    assert!(ez.get("mem://archive/old/c").is_err());
}

#[test]
fn failed_delete_after_copy_keeps_both() {
    let inner = MemoryFs::named("locked");
    inner.insert_file("/pinned.txt", "pin").unwrap();
    let locked = Filesystem::new(Arc::new(Undeletable(inner)));
    let dest = Filesystem::new(demo()).root().unwrap();

    let source = locked.get("pinned.txt").unwrap();
    let err = source.clone().move_to(&dest, None).unwrap_err();
    assert!(matches!(err, FsError::AccessDenied { .. }));

    assert_eq!(source.read().unwrap(), b"pin");
    assert_eq!(dest.get("pinned.txt").unwrap().read().unwrap(), b"pin");
}

#[test]
fn read_only_file_refuses_write_modes() {
    let volume = demo();
    volume.set_read_only("/a/b.txt", true).unwrap();
    let (registry, _) = registry_with(volume);
    let ez = Ez::new(registry, "mem://demo/").unwrap();

    for mode in ["w", "a", "r+", "w+"] {
        assert!(
            matches!(ez.open("a/b.txt", mode), Err(FsError::AccessDenied { .. })),
            "{mode}"
        );
    }
    assert_eq!(ez.open("a/b.txt", "r").unwrap().read_to_end().unwrap(), b"bee");
}

// =============================================================================
// Watching
// =============================================================================

#[test]
fn watch_interval_is_the_minimum() {
    let filesystem = Filesystem::new(demo());
    let dir = filesystem.get("a").unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let mut poller = Poller::new(ItemWatch::new(dir.clone()));
    for interval in [10, 2] {
        let hits = Arc::clone(&hits);
        poller.add_watch_at(
            move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            },
            Duration::from_secs(interval),
            start,
        );
    }
    assert_eq!(poller.least_interval(), Some(Duration::from_secs(2)));

    let backend = dir.backend();
    backend
        .write_all(&dir.url().child("new.txt", ItemKind::File), b"n")
        .unwrap();
    assert!(!poller.test_poll_at(start + Duration::from_secs(1)));
    assert!(poller.test_poll_at(start + Duration::from_secs(2)));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn resolution_normalizes_trailing_slash_and_dot_prefix(
        segments in prop::collection::vec("[a-z]{1,6}", 1..4),
        trailing in any::<bool>(),
        dotted in any::<bool>(),
    ) {
        let fs = MemoryFs::new();
        fs.insert_dir(&segments.join("/")).unwrap();
        let filesystem = Filesystem::new(Arc::new(fs));

        let canonical = filesystem.get(&segments.join("/")).unwrap();
        let mut spelled = segments.join("/");
        if trailing {
            spelled.push('/');
        }
        if dotted {
            spelled = format!("./{spelled}");
        }
        let resolved = filesystem.get(&spelled).unwrap();
        prop_assert_eq!(resolved.url().as_str(), canonical.url().as_str());
        prop_assert!(resolved.url().as_str().ends_with('/'));
    }

    #[test]
    fn climbing_past_root_always_escapes(depth in 0usize..4, extra in 1usize..3) {
        let fs = MemoryFs::new();
        let path: Vec<String> = (0..depth).map(|i| format!("d{i}")).collect();
        if depth > 0 {
            fs.insert_dir(&path.join("/")).unwrap();
        }
        let mut filesystem = Filesystem::new(Arc::new(fs));
        if depth > 0 {
            filesystem.cd(&path.join("/")).unwrap();
        }
        let climb = vec![".."; depth + extra].join("/");
        let escaped = matches!(
            filesystem.get(&climb),
            Err(FsError::PathEscapesRoot { .. })
        );
        prop_assert!(escaped);
    }
}
