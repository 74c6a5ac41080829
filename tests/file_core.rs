//! File Engine Tests
//!
//! Integration tests for listing, removal, copy and move against the real
//! filesystem, with a wrapper that injects failures on chosen paths.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};

use filedeck::file::{
    copy, list, move_file, probe, remove, FanOut, Filesystem, LocalFs, PathResolver,
    COPY_CHUNK_SIZE,
};
use filedeck::FiledeckError;
use tempfile::TempDir;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Host filesystem that fails with `PermissionDenied` on selected paths.
///
/// Streams opened on a path in `break_read`/`break_write` fail after their
/// first chunk.
#[derive(Debug, Default)]
struct FaultyFs {
    inner: LocalFs,
    deny_metadata: HashSet<PathBuf>,
    deny_read_dir: HashSet<PathBuf>,
    deny_remove_file: HashSet<PathBuf>,
    break_read: HashSet<PathBuf>,
    break_write: HashSet<PathBuf>,
}

impl FaultyFs {
    fn deny_metadata(mut self, path: impl Into<PathBuf>) -> Self {
        self.deny_metadata.insert(path.into());
        self
    }

    fn deny_read_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.deny_read_dir.insert(path.into());
        self
    }

    fn deny_remove_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.deny_remove_file.insert(path.into());
        self
    }

    fn break_read(mut self, path: impl Into<PathBuf>) -> Self {
        self.break_read.insert(path.into());
        self
    }

    fn break_write(mut self, path: impl Into<PathBuf>) -> Self {
        self.break_write.insert(path.into());
        self
    }
}

fn denied() -> io::Error {
    io::Error::from(io::ErrorKind::PermissionDenied)
}

/// File stream that errors once `budget` transfers have gone through.
#[derive(Debug)]
struct FaultyFile {
    inner: tokio::fs::File,
    budget: Option<usize>,
}

impl FaultyFile {
    fn new(inner: tokio::fs::File, broken: bool) -> Self {
        Self {
            inner,
            budget: broken.then_some(1),
        }
    }

    fn check(&self) -> io::Result<()> {
        match self.budget {
            Some(0) => Err(io::Error::new(io::ErrorKind::Other, "injected stream failure")),
            _ => Ok(()),
        }
    }

    fn charge<T>(&mut self, poll: &Poll<io::Result<T>>) {
        if let (Poll::Ready(Ok(_)), Some(left)) = (poll, self.budget.as_mut()) {
            *left = left.saturating_sub(1);
        }
    }
}

impl AsyncRead for FaultyFile {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.check()?;
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        self.charge(&poll);
        poll
    }
}

impl AsyncWrite for FaultyFile {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.check()?;
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        self.charge(&poll);
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

impl Filesystem for FaultyFs {
    type Reader = FaultyFile;
    type Writer = FaultyFile;

    async fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        if self.deny_metadata.contains(path) {
            return Err(denied());
        }
        self.inner.metadata(path).await
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        if self.deny_read_dir.contains(path) {
            return Err(denied());
        }
        self.inner.read_dir(path).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.deny_remove_file.contains(path) {
            return Err(denied());
        }
        self.inner.remove_file(path).await
    }

    async fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.inner.remove_dir(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.inner.write(path, contents).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path).await
    }

    async fn open_read(&self, path: &Path) -> io::Result<FaultyFile> {
        let file = self.inner.open_read(path).await?;
        Ok(FaultyFile::new(file, self.break_read.contains(path)))
    }

    async fn create_write(&self, path: &Path) -> io::Result<FaultyFile> {
        let file = self.inner.create_write(path).await?;
        Ok(FaultyFile::new(file, self.break_write.contains(path)))
    }
}

/// Host filesystem that records the peak number of concurrent stat calls.
#[derive(Debug, Default)]
struct TrackingFs {
    inner: LocalFs,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl TrackingFs {
    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl Filesystem for TrackingFs {
    type Reader = tokio::fs::File;
    type Writer = tokio::fs::File;

    async fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        let result = self.inner.metadata(path).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        self.inner.read_dir(path).await
    }

    async fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.inner.remove_file(path).await
    }

    async fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.inner.remove_dir(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        self.inner.write(path, contents).await
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path).await
    }

    async fn open_read(&self, path: &Path) -> io::Result<tokio::fs::File> {
        self.inner.open_read(path).await
    }

    async fn create_write(&self, path: &Path) -> io::Result<tokio::fs::File> {
        self.inner.create_write(path).await
    }
}

fn setup() -> (TempDir, PathResolver) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let resolver = PathResolver::new(temp.path()).expect("Failed to create resolver");
    (temp, resolver)
}

fn create_file(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_resolution_is_deterministic() {
    let (temp, resolver) = setup();
    let other = PathResolver::new(temp.path()).unwrap();

    let inputs: [&[&str]; 4] = [&["a/b", "../c"], &["./x", "", "y"], &["/abs", "z"], &[".."]];
    for segments in inputs {
        let first = resolver.resolve(segments.iter());
        assert_eq!(first, resolver.resolve(segments.iter()));
        assert_eq!(first, other.resolve(segments.iter()));
    }
}

#[cfg(unix)]
#[test]
fn test_resolution_is_not_confined_to_base() {
    let (temp, resolver) = setup();

    let outside = resolver.resolve_one("../../elsewhere");

    assert!(!outside.starts_with(temp.path()));
    assert_eq!(resolver.resolve_one("/etc/hosts").as_path(), Path::new("/etc/hosts"));
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_listing_is_complete() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "tree/a.txt", b"a");
    create_file(temp.path(), "tree/b/c.txt", b"c");
    create_file(temp.path(), "tree/b/d/e.txt", b"e");
    std::fs::create_dir_all(temp.path().join("tree/empty")).unwrap();

    let entries = list(&LocalFs, &FanOut::default(), &resolver.resolve_one("tree"), true)
        .await
        .unwrap();

    let mut seen: Vec<(String, bool, bool)> = entries
        .iter()
        .map(|e| {
            let rel = e.path.strip_prefix(temp.path().join("tree")).unwrap();
            (
                rel.to_string_lossy().into_owned(),
                e.stats.is_directory,
                e.stats.is_file,
            )
        })
        .collect();
    seen.sort();

    assert_eq!(
        seen,
        vec![
            ("a.txt".to_string(), false, true),
            ("b".to_string(), true, false),
            ("b/c.txt".to_string(), false, true),
            ("b/d".to_string(), true, false),
            ("b/d/e.txt".to_string(), false, true),
            ("empty".to_string(), true, false),
        ]
    );
}

#[tokio::test]
async fn test_listing_fails_fast_on_unreadable_entry() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "tree/ok.txt", b"1");
    create_file(temp.path(), "tree/deep/locked.txt", b"2");
    create_file(temp.path(), "tree/deep/fine.txt", b"3");
    let locked = resolver.resolve_one("tree/deep/locked.txt");
    let fs = FaultyFs::default().deny_metadata(locked.as_path());

    let result = list(&fs, &FanOut::default(), &resolver.resolve_one("tree"), true).await;

    match result {
        Err(FiledeckError::AccessDenied(path)) => assert_eq!(path, locked.as_path()),
        other => panic!("expected AccessDenied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_listing_fails_fast_on_unreadable_directory() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "tree/ok.txt", b"1");
    create_file(temp.path(), "tree/sealed/inner.txt", b"2");
    create_file(temp.path(), "tree/open/fine.txt", b"3");
    let sealed = resolver.resolve_one("tree/sealed");
    let fs = FaultyFs::default().deny_read_dir(sealed.as_path());

    let result = list(&fs, &FanOut::default(), &resolver.resolve_one("tree"), true).await;

    match result {
        Err(FiledeckError::AccessDenied(path)) => assert_eq!(path, sealed.as_path()),
        other => panic!("expected AccessDenied, got {other:?}"),
    }
}

#[tokio::test]
async fn test_listing_survives_out_of_range_timestamp() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "far.txt", b"x");
    let far_future = SystemTime::UNIX_EPOCH + Duration::from_secs(1 << 50);
    let file = std::fs::File::options()
        .write(true)
        .open(temp.path().join("far.txt"))
        .unwrap();
    if file.set_modified(far_future).is_err() {
        // Filesystem cannot store the time at all
        return;
    }
    drop(file);

    let entries = list(&LocalFs, &FanOut::unbounded(), &resolver.base(), false)
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert!(entries[0].stats.is_file);
    if let Some(modified) = entries[0].stats.modified_at {
        assert!(modified.timestamp() < 1 << 50);
    }
}

#[tokio::test]
async fn test_listing_fan_out_is_capped() {
    let (temp, resolver) = setup();
    for i in 0..12 {
        create_file(temp.path(), &format!("wide/f{i}.txt"), b"x");
    }
    let dir = resolver.resolve_one("wide");

    let bounded = TrackingFs::default();
    let entries = list(&bounded, &FanOut::bounded(3), &dir, false).await.unwrap();
    assert_eq!(entries.len(), 12);
    assert!(bounded.peak() <= 3, "peak was {}", bounded.peak());

    let unbounded = TrackingFs::default();
    list(&unbounded, &FanOut::unbounded(), &dir, false).await.unwrap();
    assert!(unbounded.peak() > 3, "peak was {}", unbounded.peak());
}

// ============================================================================
// Removal
// ============================================================================

#[tokio::test]
async fn test_removal_tolerates_one_undeletable_file() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "tree/a.txt", b"a");
    create_file(temp.path(), "tree/keep/locked.txt", b"l");
    create_file(temp.path(), "tree/keep/other.txt", b"o");
    create_file(temp.path(), "tree/sub/x.txt", b"x");
    create_file(temp.path(), "tree/sub/deeper/y.txt", b"y");
    let locked = resolver.resolve_one("tree/keep/locked.txt");
    let fs = FaultyFs::default().deny_remove_file(locked.as_path());

    let result = remove(&fs, &FanOut::default(), &resolver.resolve_one("tree"), true).await;

    let aggregate = match result {
        Err(FiledeckError::Aggregate(aggregate)) => aggregate,
        other => panic!("expected an aggregate error, got {other:?}"),
    };
    assert_eq!(aggregate.len(), 1);
    assert!(matches!(
        &aggregate.causes()[0],
        FiledeckError::AccessDenied(path) if path == locked.as_path()
    ));
    assert!(aggregate.to_string().starts_with("Errors occurred:"));

    // Everything else is gone; only the chain down to the locked file stays.
    assert!(locked.exists());
    assert!(!temp.path().join("tree/a.txt").exists());
    assert!(!temp.path().join("tree/keep/other.txt").exists());
    assert!(!temp.path().join("tree/sub").exists());
    let mut left: Vec<_> = std::fs::read_dir(temp.path().join("tree"))
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    left.sort();
    assert_eq!(left, vec![OsString::from("keep")]);
}

#[tokio::test]
async fn test_removal_collects_every_failure() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "tree/one/a.txt", b"a");
    create_file(temp.path(), "tree/two/b.txt", b"b");
    create_file(temp.path(), "tree/c.txt", b"c");
    let fs = FaultyFs::default()
        .deny_remove_file(resolver.resolve_one("tree/one/a.txt").as_path())
        .deny_remove_file(resolver.resolve_one("tree/two/b.txt").as_path());

    let err = remove(&fs, &FanOut::bounded(1), &resolver.resolve_one("tree"), true)
        .await
        .unwrap_err();

    let FiledeckError::Aggregate(aggregate) = err else {
        panic!("expected an aggregate error");
    };
    assert_eq!(aggregate.len(), 2);
    let message = aggregate.to_string();
    assert!(message.contains("a.txt"));
    assert!(message.contains("b.txt"));
    assert!(!temp.path().join("tree/c.txt").exists());
}

#[tokio::test]
async fn test_removal_continues_past_unreadable_entry() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "tree/a.txt", b"a");
    create_file(temp.path(), "tree/locked.txt", b"l");
    create_file(temp.path(), "tree/sub/x.txt", b"x");
    let locked = resolver.resolve_one("tree/locked.txt");
    let fs = FaultyFs::default().deny_metadata(locked.as_path());

    let err = remove(&fs, &FanOut::default(), &resolver.resolve_one("tree"), true)
        .await
        .unwrap_err();

    let aggregate = match err {
        FiledeckError::Aggregate(aggregate) => aggregate,
        other => panic!("expected an aggregate error, got {other:?}"),
    };
    assert_eq!(aggregate.len(), 1);
    assert!(matches!(
        &aggregate.causes()[0],
        FiledeckError::AccessDenied(path) if path == locked.as_path()
    ));
    assert!(locked.exists());
    assert!(!temp.path().join("tree/a.txt").exists());
    assert!(!temp.path().join("tree/sub").exists());
}

#[tokio::test]
async fn test_removal_skips_parent_of_unreadable_directory() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "tree/a.txt", b"a");
    create_file(temp.path(), "tree/sealed/inner.txt", b"i");
    create_file(temp.path(), "tree/other/y.txt", b"y");
    let sealed = resolver.resolve_one("tree/sealed");
    let fs = FaultyFs::default().deny_read_dir(sealed.as_path());

    let err = remove(&fs, &FanOut::bounded(2), &resolver.resolve_one("tree"), true)
        .await
        .unwrap_err();

    let aggregate = match err {
        FiledeckError::Aggregate(aggregate) => aggregate,
        other => panic!("expected an aggregate error, got {other:?}"),
    };
    assert_eq!(aggregate.len(), 1);
    assert!(matches!(
        &aggregate.causes()[0],
        FiledeckError::AccessDenied(path) if path == sealed.as_path()
    ));
    assert!(temp.path().join("tree/sealed/inner.txt").exists());
    assert!(!temp.path().join("tree/a.txt").exists());
    assert!(!temp.path().join("tree/other").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_removal_follows_directory_symlinks() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "outside/target.txt", b"t");
    create_file(temp.path(), "tree/a.txt", b"a");
    std::os::unix::fs::symlink(temp.path().join("outside"), temp.path().join("tree/link"))
        .unwrap();
    let link = resolver.resolve_one("tree/link");

    let err = remove(&LocalFs, &FanOut::default(), &resolver.resolve_one("tree"), true)
        .await
        .unwrap_err();

    let aggregate = match err {
        FiledeckError::Aggregate(aggregate) => aggregate,
        other => panic!("expected an aggregate error, got {other:?}"),
    };
    assert_eq!(aggregate.len(), 1);
    assert!(matches!(
        &aggregate.causes()[0],
        FiledeckError::NotADirectory(path) if path == link.as_path()
    ));
    // The link target was emptied, the link itself stays.
    assert!(!temp.path().join("outside/target.txt").exists());
    assert!(temp.path().join("outside").is_dir());
    assert!(std::fs::symlink_metadata(&link).is_ok());
    assert!(!temp.path().join("tree/a.txt").exists());
}

#[tokio::test]
async fn test_removing_missing_path_is_not_found() {
    let (_temp, resolver) = setup();

    let result = remove(&LocalFs, &FanOut::default(), &resolver.resolve_one("gone"), true).await;

    assert!(matches!(result, Err(FiledeckError::NotFound(_))));
}

// ============================================================================
// Copy / move
// ============================================================================

#[tokio::test]
async fn test_copy_preserves_bytes() {
    let (temp, resolver) = setup();
    let data: Vec<u8> = (0..COPY_CHUNK_SIZE * 3 + 17).map(|i| (i % 251) as u8).collect();
    create_file(temp.path(), "src.bin", &data);
    let src = resolver.resolve_one("src.bin");
    let dst = resolver.resolve_one("dst.bin");

    copy(&LocalFs, &src, &dst).await.unwrap();

    assert_eq!(std::fs::read(&dst).unwrap(), data);
    assert_eq!(std::fs::read(&src).unwrap(), data);
    let src_stats = probe(&LocalFs, &src).await.unwrap();
    let dst_stats = probe(&LocalFs, &dst).await.unwrap();
    assert_eq!(src_stats.size, dst_stats.size);
}

#[tokio::test]
async fn test_copy_fails_on_read_error_mid_stream() {
    let (temp, resolver) = setup();
    let data = vec![7u8; COPY_CHUNK_SIZE * 4];
    create_file(temp.path(), "src.bin", &data);
    let src = resolver.resolve_one("src.bin");
    let dst = resolver.resolve_one("dst.bin");
    let fs = FaultyFs::default().break_read(src.as_path());

    let err = copy(&fs, &src, &dst).await.unwrap_err();

    match err {
        FiledeckError::CopyFailure { from, to, cause } => {
            assert_eq!(from, src.as_path());
            assert_eq!(to, dst.as_path());
            assert_eq!(cause.kind(), io::ErrorKind::Other);
        }
        other => panic!("expected a copy failure, got {other:?}"),
    }
    assert!(dst.exists());
    assert!(std::fs::metadata(&dst).unwrap().len() < data.len() as u64);
    assert_eq!(std::fs::read(&src).unwrap(), data);
}

#[tokio::test]
async fn test_copy_fails_on_write_error_mid_stream() {
    let (temp, resolver) = setup();
    let data = vec![9u8; COPY_CHUNK_SIZE * 4];
    create_file(temp.path(), "src.bin", &data);
    let src = resolver.resolve_one("src.bin");
    let dst = resolver.resolve_one("dst.bin");
    let fs = FaultyFs::default().break_write(dst.as_path());

    let err = copy(&fs, &src, &dst).await.unwrap_err();

    assert!(matches!(err, FiledeckError::CopyFailure { .. }));
    assert!(dst.exists());
    assert!(std::fs::metadata(&dst).unwrap().len() < data.len() as u64);
}

#[tokio::test]
async fn test_move_relocates_file() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "from.txt", b"contents");
    let src = resolver.resolve_one("from.txt");
    let dst = resolver.resolve_one("to.txt");

    move_file(&LocalFs, &src, &dst).await.unwrap();

    assert!(!src.exists());
    assert_eq!(std::fs::read(&dst).unwrap(), b"contents");
}

#[tokio::test]
async fn test_move_leaves_duplicate_when_unlink_fails() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "from.txt", b"contents");
    let src = resolver.resolve_one("from.txt");
    let dst = resolver.resolve_one("to.txt");
    let fs = FaultyFs::default().deny_remove_file(src.as_path());

    let result = move_file(&fs, &src, &dst).await;

    assert!(matches!(result, Err(FiledeckError::AccessDenied(_))));
    assert_eq!(std::fs::read(&dst).unwrap(), b"contents");
    assert_eq!(std::fs::read(&src).unwrap(), b"contents");
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_recursive_listing_of_small_tree() {
    let (temp, resolver) = setup();
    create_file(temp.path(), "data/a/b.txt", b"b");
    create_file(temp.path(), "data/a/c/d.txt", b"d");

    let entries = list(&LocalFs, &FanOut::default(), &resolver.resolve_one("data/a"), true)
        .await
        .unwrap();

    assert_eq!(entries.len(), 3);
    let find = |rel: &str| {
        let path = temp.path().join(rel);
        entries
            .iter()
            .find(|e| e.path.as_path() == path)
            .unwrap_or_else(|| panic!("missing {rel}"))
    };
    assert!(find("data/a/b.txt").stats.is_file);
    assert!(find("data/a/c").stats.is_directory);
    assert!(find("data/a/c/d.txt").stats.is_file);
}
