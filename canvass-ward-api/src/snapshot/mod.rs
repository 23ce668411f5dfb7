use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Time source for TTL checks, injectable so expiry is testable.
pub trait Clock: Send + Sync {
    /// Time elapsed since the Unix epoch.
    fn now(&self) -> Duration;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(thiserror::Error, Debug)]
#[error("{message}")]
pub struct StorageError {
    pub message: String,
}

/// String key-value backing store for snapshots.
///
/// In the browser this is session storage; natively an in-memory map.
/// Implementations may fail (quota exceeded, storage disabled) — the cache
/// treats every failure as a miss and never propagates it.
pub trait SnapshotStore: Send + Sync {
    fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write_raw(&self, key: &str, value: String) -> Result<(), StorageError>;
    fn remove_raw(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn read_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock()
            .map_err(|_| StorageError { message: String::from("Snapshot store lock poisoned.") })?;
        Ok(entries.get(key).cloned())
    }

    fn write_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut entries = self.entries.lock()
            .map_err(|_| StorageError { message: String::from("Snapshot store lock poisoned.") })?;
        entries.insert(String::from(key), value);
        Ok(())
    }

    fn remove_raw(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock()
            .map_err(|_| StorageError { message: String::from("Snapshot store lock poisoned.") })?;
        entries.remove(key);
        Ok(())
    }
}

/// Partition key: resource kind plus an optional filter discriminator,
/// so e.g. "nominees" and "nominees filtered to rejected" never collide.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct CacheKey {
    kind: String,
    discriminator: Option<String>,
}

impl CacheKey {

    pub fn for_resource(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            discriminator: None,
        }
    }

    pub fn with_discriminator(mut self, discriminator: impl Into<String>) -> Self {
        self.discriminator = Some(discriminator.into());
        self
    }

    fn storage_key(&self) -> String {
        match &self.discriminator {
            Some(discriminator) => format!("canvass.{}#{}", self.kind, discriminator),
            None => format!("canvass.{}", self.kind),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.storage_key())
    }
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    ts: u64,
    data: Vec<Value>,
}

/// Time-boxed snapshot cache used to paint a list before the fresh fetch
/// lands. Best-effort only: every failure path degrades to a miss.
#[derive(Clone)]
pub struct SnapshotCache {
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SnapshotCache {

    pub const DEFAULT_TTL: Duration = Duration::from_secs(2 * 60);

    pub fn new(store: Arc<dyn SnapshotStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemorySnapshotStore::new()), Arc::new(SystemClock), ttl)
    }

    /// Returns the cached rows, or `None` on miss, expiry, storage failure
    /// or an undecodable entry. Never blocks, never fails.
    pub fn read<T>(&self, key: &CacheKey) -> Option<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let raw = match self.store.read_raw(&key.storage_key()) {
            Ok(raw) => raw?,
            Err(cause) => {
                debug!("Reading snapshot <{key}> failed, treating as miss: {cause}");
                return None;
            }
        };

        let entry = serde_json::from_str::<CacheEntry>(&raw).ok()?;

        let now = self.clock.now().as_millis() as u64;
        if now.saturating_sub(entry.ts) >= self.ttl.as_millis() as u64 {
            return None;
        }

        serde_json::from_value(Value::Array(entry.data)).ok()
    }

    /// Replaces the entry for `key` wholesale. Best-effort.
    pub fn write<T>(&self, key: &CacheKey, rows: &[T])
    where
        T: Serialize,
    {
        let data = match rows.iter().map(serde_json::to_value).collect::<Result<Vec<_>, _>>() {
            Ok(data) => data,
            Err(cause) => {
                debug!("Serializing snapshot <{key}> failed, skipping write: {cause}");
                return;
            }
        };

        let entry = CacheEntry {
            ts: self.clock.now().as_millis() as u64,
            data,
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(cause) => {
                debug!("Serializing snapshot <{key}> failed, skipping write: {cause}");
                return;
            }
        };

        if let Err(cause) = self.store.write_raw(&key.storage_key(), raw) {
            debug!("Writing snapshot <{key}> failed, skipping write: {cause}");
        }
    }

    pub fn invalidate(&self, key: &CacheKey) {
        if let Err(cause) = self.store.remove_raw(&key.storage_key()) {
            debug!("Removing snapshot <{key}> failed: {cause}");
        }
    }
}
