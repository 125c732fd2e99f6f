//! Filesystem-backed providers.
//!
//! These keep the same layout the hosted backends use: archive objects land
//! as files under the object root (one path segment per key segment), index
//! items live as one JSON file per item grouped by partition key, and queued
//! work waits as JSON spool files named so lexicographic order is arrival
//! order.

use crate::Result;
use crate::store::{IndexItem, ObjectStore, RecordStore, ScanOrder, WorkMessage, WorkQueue};
use chrono::Utc;
use ohno::IntoAppError;
use std::fs;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

const LOG_TARGET: &str = "     store";

/// Sanitize a string for use as a path component.
///
/// Removes path traversal sequences and dangerous characters to prevent
/// directory traversal attacks and filesystem issues.
#[must_use]
fn sanitize_path_component(s: &str) -> String {
    // First remove path traversal sequences (replace ".." but allow single ".")
    let s = s.replace("..", "__");
    // Then remove other dangerous filesystem characters
    s.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_")
}

/// Object store writing each archive object to a file under a root
/// directory, one path segment per `/`-separated key segment.
#[derive(Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory objects are written under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in key.split('/').filter(|s| !s.is_empty()) {
            path.push(sanitize_path_component(segment));
        }

        path
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, body: &[u8], content_type: &str, content_encoding: &str) -> Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{}'", parent.display()))?;
        }

        let file = File::create(&path).into_app_err_with(|| format!("creating archive object '{}'", path.display()))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(body)
            .into_app_err_with(|| format!("writing archive object '{}'", path.display()))?;
        writer
            .flush()
            .into_app_err_with(|| format!("flushing archive object '{}'", path.display()))?;

        log::debug!(target: LOG_TARGET, "Stored object {key} ({} bytes, {content_type}, {content_encoding})", body.len());
        Ok(())
    }
}

/// Record store keeping one JSON file per item under
/// `<root>/<partition key>/<sort key>.json`.
///
/// Sort keys may contain characters the filesystem rejects, so queries order
/// by the sort key stored inside each file rather than by filename.
#[derive(Debug)]
pub struct FsRecordStore {
    root: PathBuf,
}

impl FsRecordStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn partition_dir(&self, pk: &str) -> PathBuf {
        self.root.join(sanitize_path_component(pk))
    }
}

impl RecordStore for FsRecordStore {
    fn put(&self, item: IndexItem) -> Result<()> {
        let dir = self.partition_dir(&item.pk);
        fs::create_dir_all(&dir).into_app_err_with(|| format!("creating directory '{}'", dir.display()))?;

        let path = dir.join(format!("{}.json", sanitize_path_component(&item.sk)));
        let file = File::create(&path).into_app_err_with(|| format!("creating index item '{}'", path.display()))?;
        let mut writer = BufWriter::new(file);
        #[cfg(debug_assertions)]
        let result = serde_json::to_writer_pretty(&mut writer, &item);
        #[cfg(not(debug_assertions))]
        let result = serde_json::to_writer(&mut writer, &item);
        result.into_app_err_with(|| format!("writing index item '{}'", path.display()))?;
        writer
            .flush()
            .into_app_err_with(|| format!("flushing index item '{}'", path.display()))?;

        Ok(())
    }

    fn query(&self, pk: &str, prefix: &str, order: ScanOrder, limit: usize) -> Result<Vec<IndexItem>> {
        let dir = self.partition_dir(pk);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).into_app_err_with(|| format!("reading directory '{}'", dir.display())),
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.into_app_err_with(|| format!("reading directory '{}'", dir.display()))?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let file = File::open(&path).into_app_err_with(|| format!("opening index item '{}'", path.display()))?;
            let item: IndexItem = match serde_json::from_reader(BufReader::new(file)) {
                Ok(item) => item,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Skipping unreadable index item {}: {e:#}", path.display());
                    continue;
                }
            };

            if item.pk == pk && item.sk.starts_with(prefix) {
                matches.push(item);
            }
        }

        matches.sort_by(|a, b| a.sk.cmp(&b.sk));
        if order == ScanOrder::Descending {
            matches.reverse();
        }

        matches.truncate(limit);
        Ok(matches)
    }
}

/// Work queue spooling messages as JSON files whose names sort in arrival
/// order. A single counter breaks ties between messages enqueued in the same
/// millisecond.
#[derive(Debug)]
pub struct FsWorkQueue {
    dir: PathBuf,
    seq: AtomicU64,
    receive_guard: Mutex<()>,
}

impl FsWorkQueue {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            seq: AtomicU64::new(0),
            receive_guard: Mutex::new(()),
        }
    }

    fn next_path(&self) -> PathBuf {
        let millis = Utc::now().timestamp_millis().max(0);
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.dir.join(format!("{millis:013}-{seq:06}.json"))
    }

    fn oldest_file(&self) -> Result<Option<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).into_app_err_with(|| format!("reading queue directory '{}'", self.dir.display())),
        };

        let mut oldest: Option<PathBuf> = None;
        for entry in entries {
            let entry = entry.into_app_err_with(|| format!("reading queue directory '{}'", self.dir.display()))?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            if oldest.as_ref().is_none_or(|current| path < *current) {
                oldest = Some(path);
            }
        }

        Ok(oldest)
    }
}

impl WorkQueue for FsWorkQueue {
    fn send(&self, message: &WorkMessage) -> Result<()> {
        fs::create_dir_all(&self.dir).into_app_err_with(|| format!("creating queue directory '{}'", self.dir.display()))?;

        let path = self.next_path();
        let file = File::create(&path).into_app_err_with(|| format!("creating queue message '{}'", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, message).into_app_err_with(|| format!("writing queue message '{}'", path.display()))?;
        writer
            .flush()
            .into_app_err_with(|| format!("flushing queue message '{}'", path.display()))?;

        Ok(())
    }

    fn receive(&self) -> Result<Option<WorkMessage>> {
        let _guard = self.receive_guard.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        loop {
            let Some(path) = self.oldest_file()? else {
                return Ok(None);
            };

            let file = File::open(&path).into_app_err_with(|| format!("opening queue message '{}'", path.display()))?;
            let parsed: core::result::Result<WorkMessage, _> = serde_json::from_reader(BufReader::new(file));
            fs::remove_file(&path).into_app_err_with(|| format!("removing queue message '{}'", path.display()))?;

            match parsed {
                Ok(message) => return Ok(Some(message)),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Dropping unreadable queue message {}: {e:#}", path.display());
                }
            }
        }
    }
}
