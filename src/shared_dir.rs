//! The network-shared directory: rendezvous files, per-worker counters,
//! response-time traces, and simtime checkpoints (§6 "Shared-directory
//! layout", §9 "Atomic publish = temp + rename").

use anyhow::{Context, Result};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Write `contents` to `path` atomically: write to `<path>.notyet`, then
/// rename. A reader never observes a partially-written destination (§5,
/// §8 round-trip law).
pub fn atomic_write(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = path.with_extension("notyet");
    fs::write(&tmp, contents)
        .with_context(|| format!("failed to write temp file {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed to publish {} atomically", path.display()))?;
    Ok(())
}

/// Touch an empty sentinel file into existence (not atomic — sentinels are
/// single-writer and their mere presence is the signal).
pub fn touch(path: &Path) -> Result<()> {
    fs::write(path, b"").with_context(|| format!("failed to touch {}", path.display()))
}

/// Block until `path` exists, polling every `interval`, or until `abort`
/// returns true.
pub fn wait_for(path: &Path, interval: Duration, mut abort: impl FnMut() -> bool) -> bool {
    loop {
        if path.exists() {
            return true;
        }
        if abort() {
            return false;
        }
        std::thread::sleep(interval);
    }
}

/// Appends JSON objects into one top-level array file (§4.4 step 5,
/// §6 "per-worker file is a JSON array"). Commas are written *before*
/// every entry but the first, so the file on disk is always a valid
/// JSON-array prefix (`[obj1,obj2`) even if the worker is killed mid-run
/// — a reader only ever has to append `]`, never strip a trailing comma
/// (§5's append-only guarantee).
pub struct SnapshotWriter {
    file: fs::File,
    wrote_any: bool,
}

impl SnapshotWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let mut file = fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(b"[")
            .with_context(|| format!("failed to write to {}", path.display()))?;
        Ok(Self {
            file,
            wrote_any: false,
        })
    }

    pub fn append(&mut self, json: &[u8]) -> Result<()> {
        if self.wrote_any {
            self.file.write_all(b",")?;
        }
        self.file.write_all(json)?;
        self.file.flush()?;
        self.wrote_any = true;
        Ok(())
    }

    /// Write the closing `]` and flush. Consumes `self` since no further
    /// writes are valid once the array is closed.
    pub fn close(mut self) -> Result<()> {
        self.file.write_all(b"]")?;
        self.file.flush()?;
        Ok(())
    }
}

pub struct SharedPaths {
    root: PathBuf,
}

impl SharedPaths {
    pub fn new(network_shared_dir: &Path) -> Self {
        Self {
            root: network_shared_dir.to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_exists(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))
    }

    pub fn starting_gun(&self) -> PathBuf {
        self.root.join("starting-gun.tmp")
    }

    pub fn stop_file(&self) -> PathBuf {
        self.root.join("stop-file.tmp")
    }

    pub fn abort_file(&self) -> PathBuf {
        self.root.join("abort.tmp")
    }

    pub fn pause_file(&self) -> PathBuf {
        self.root.join("pause.tmp")
    }

    pub fn checkered_flag(&self) -> PathBuf {
        self.root.join("checkered_flag.tmp")
    }

    pub fn thread_ready(&self, host: &str, tid: usize) -> PathBuf {
        self.root.join(format!("thread_ready.{host}.{tid}.tmp"))
    }

    pub fn host_ready(&self, host: &str) -> PathBuf {
        self.root.join(format!("host_ready.{host}.tmp"))
    }

    pub fn host_result(&self, host: &str) -> PathBuf {
        self.root.join(format!("{host}_result.json"))
    }

    pub fn counters_file(&self, tid: usize, host: &str) -> PathBuf {
        self.root.join(format!("counters.{tid}.{host}.json"))
    }

    pub fn rsptimes_file(&self, host: &str, tid: usize) -> PathBuf {
        self.root
            .join(format!("host-{host}_thrd-{tid}_rsptimes.csv"))
    }

    pub fn simtime_checkpoint(&self, host: &str, tid: usize) -> PathBuf {
        self.root
            .join(format!("fs-drift-simtime-hst-{host}-thrd-{tid}.tmp"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn atomic_write_leaves_no_partial_destination() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("starting-gun.tmp");
        atomic_write(&path, b"go").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"go");
        assert!(!path.with_extension("notyet").exists());
    }

    #[test]
    fn wait_for_returns_true_once_file_appears() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gun.tmp");
        fs::write(&path, b"").unwrap();
        assert!(wait_for(&path, Duration::from_millis(1), || false));
    }

    #[test]
    fn wait_for_aborts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.tmp");
        assert!(!wait_for(&path, Duration::from_millis(1), || true));
    }

    #[test]
    fn snapshot_writer_produces_json_array_of_appended_objects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counters.0.local.json");
        let mut w = SnapshotWriter::create(&path).unwrap();
        w.append(br#"{"a":1}"#).unwrap();
        w.append(br#"{"a":2}"#).unwrap();
        w.append(br#"{"a":3}"#).unwrap();
        w.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[2]["a"], 3);
    }

    #[test]
    fn snapshot_writer_is_a_valid_json_prefix_before_close() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counters.1.local.json");
        let mut w = SnapshotWriter::create(&path).unwrap();
        w.append(br#"{"a":1}"#).unwrap();
        w.append(br#"{"a":2}"#).unwrap();
        // simulate an abort: never call close()

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.ends_with(','));
        let recovered: Vec<serde_json::Value> =
            serde_json::from_str(&format!("{contents}]")).unwrap();
        assert_eq!(recovered.len(), 2);
    }

    #[test]
    fn snapshot_writer_with_no_entries_is_empty_array() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("counters.2.local.json");
        let w = SnapshotWriter::create(&path).unwrap();
        w.close().unwrap();
        let parsed: Vec<serde_json::Value> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.is_empty());
    }
}
