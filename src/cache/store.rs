//! Snapshot storage backends.
//!
//! [`SnapshotStore`] abstracts where multi-body snapshot records live.
//! Two strategies, selected once at startup from configuration:
//!
//! - [`LocalOnly`] — process-local memory. The fully supported
//!   single-process deployment; nothing to configure.
//! - [`LocalWithSharedMirror`] — local memory plus a shared directory
//!   mirror (one JSON document per mode, atomic tmp + rename writes).
//!   Reads prefer the mirror and refresh the local copy; writes always
//!   land locally and mirror only genuine refreshes. Mirror errors are
//!   logged and swallowed — local memory stays authoritative.
//!
//! The mirror is best-effort shared mutable storage: concurrent
//! writers race and last-write-wins is accepted, staleness being
//! bounded by TTL rather than eliminated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::record::{CacheBackendKind, CachePolicy, CacheRecord};
use crate::types::{FetchMode, Snapshot};

/// Storage strategy for multi-body snapshot records.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Best available record for a mode, any freshness, with the
    /// backend it came from. `None` only when no backend has data.
    async fn load(&self, mode: FetchMode) -> Option<(CacheRecord<Snapshot>, CacheBackendKind)>;

    /// Persist a record. `fresh_write` is true when the record comes
    /// from a genuine refresh (stale-serves and read-through copies
    /// never reach the mirror).
    async fn store(&self, mode: FetchMode, record: &CacheRecord<Snapshot>, fresh_write: bool);
}

/// Process-local record slots, replaced whole.
#[derive(Default)]
struct MemorySlots {
    slots: Mutex<HashMap<FetchMode, CacheRecord<Snapshot>>>,
}

impl MemorySlots {
    fn get(&self, mode: FetchMode) -> Option<CacheRecord<Snapshot>> {
        self.slots.lock().expect("snapshot slots poisoned").get(&mode).cloned()
    }

    fn put(&self, mode: FetchMode, record: CacheRecord<Snapshot>) {
        self.slots.lock().expect("snapshot slots poisoned").insert(mode, record);
    }
}

/// Memory-only storage strategy.
#[derive(Default)]
pub struct LocalOnly {
    memory: MemorySlots,
}

impl LocalOnly {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for LocalOnly {
    async fn load(&self, mode: FetchMode) -> Option<(CacheRecord<Snapshot>, CacheBackendKind)> {
        self.memory.get(mode).map(|r| (r, CacheBackendKind::Memory))
    }

    async fn store(&self, mode: FetchMode, record: &CacheRecord<Snapshot>, _fresh_write: bool) {
        self.memory.put(mode, record.clone());
    }
}

/// On-disk document format of one mirrored snapshot.
#[derive(Debug, Serialize, Deserialize)]
struct MirrorDocument {
    snapshot: Snapshot,
    /// Capture time, unix milliseconds.
    cached_at_ms: i64,
    generated_at: DateTime<Utc>,
}

/// Local memory fronted by a shared directory mirror.
pub struct LocalWithSharedMirror {
    memory: MemorySlots,
    dir: PathBuf,
    policy: CachePolicy,
}

impl LocalWithSharedMirror {
    /// `dir` is the shared directory; it is created on first write.
    /// The policy is needed to rebuild freshness bounds on reads.
    pub fn new(dir: impl Into<PathBuf>, policy: CachePolicy) -> Self {
        Self {
            memory: MemorySlots::default(),
            dir: dir.into(),
            policy,
        }
    }

    fn document_path(&self, mode: FetchMode) -> PathBuf {
        self.dir.join(format!("snapshot-{}.json", mode.as_str()))
    }

    /// Mirror entries are honored one stale-window span past logical
    /// staleness, then treated as absent.
    fn retention(&self) -> Duration {
        self.policy.ttl + self.policy.stale_window * 2
    }

    fn read_mirror(&self, mode: FetchMode) -> Option<CacheRecord<Snapshot>> {
        let path = self.document_path(mode);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read snapshot mirror");
                return None;
            }
        };
        let doc: MirrorDocument = match serde_json::from_str(&content) {
            Ok(d) => d,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt snapshot mirror document");
                return None;
            }
        };
        let age_ms = (Utc::now().timestamp_millis() - doc.cached_at_ms).max(0) as u64;
        let age = Duration::from_millis(age_ms);
        if age >= self.retention() {
            return None;
        }
        Some(CacheRecord::restore(
            doc.snapshot,
            age,
            &self.policy,
            doc.generated_at,
        ))
    }

    fn write_mirror(&self, mode: FetchMode, record: &CacheRecord<Snapshot>) {
        let path = self.document_path(mode);
        if let Err(e) = self.try_write_mirror(&path, record) {
            warn!(path = %path.display(), error = %e, "failed to write snapshot mirror");
        }
    }

    /// Atomic write via tmp + rename.
    fn try_write_mirror(
        &self,
        path: &Path,
        record: &CacheRecord<Snapshot>,
    ) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let age_ms = record.age().as_millis() as i64;
        let doc = MirrorDocument {
            snapshot: record.payload().as_ref().clone(),
            cached_at_ms: Utc::now().timestamp_millis() - age_ms,
            generated_at: record.generated_at(),
        };
        let json = serde_json::to_string(&doc).map_err(std::io::Error::other)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

#[async_trait]
impl SnapshotStore for LocalWithSharedMirror {
    async fn load(&self, mode: FetchMode) -> Option<(CacheRecord<Snapshot>, CacheBackendKind)> {
        if let Some(record) = self.read_mirror(mode) {
            // write-through on read: refresh the local copy
            self.memory.put(mode, record.clone());
            return Some((record, CacheBackendKind::Shared));
        }
        self.memory.get(mode).map(|r| (r, CacheBackendKind::Memory))
    }

    async fn store(&self, mode: FetchMode, record: &CacheRecord<Snapshot>, fresh_write: bool) {
        self.memory.put(mode, record.clone());
        if fresh_write {
            self.write_mirror(mode, record);
        }
    }
}
