use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::CachedData;
use crate::query::QueryKey;

/// Index file listing every stored response
const INDEX_FILE: &str = "index.json";

/// Responses older than a week are never served.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(60 * 60 * 24 * 7);
pub const DEFAULT_MAX_ENTRIES: usize = 120;
pub const DEFAULT_MAX_BYTES: u64 = 8 * 1024 * 1024;
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 4 * 1024 * 1024;

/// Size and age limits for the offline store. A zero count or byte limit
/// disables that limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineLimits {
    #[serde(with = "duration_secs")]
    pub max_age: Duration,
    pub max_entries: usize,
    pub max_bytes: u64,
    pub max_entry_bytes: u64,
}

impl Default for OfflineLimits {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_bytes: DEFAULT_MAX_BYTES,
            max_entry_bytes: DEFAULT_MAX_ENTRY_BYTES,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    key: QueryKey,
    file: String,
    cached_at: DateTime<Utc>,
    size: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    key: QueryKey,
    data: Value,
    cached_at: DateTime<Utc>,
}

/// Summary of one stored response, for display.
#[derive(Debug, Clone)]
pub struct OfflineEntry {
    pub key: QueryKey,
    pub age: String,
    pub size: u64,
}

/// Disk-backed store of the last good response for each query key.
///
/// The query cache reads from it when the network is unreachable. Every
/// method reports storage problems as errors; callers decide whether to
/// log or ignore them.
#[derive(Debug)]
pub struct OfflineStore {
    dir: PathBuf,
    limits: OfflineLimits,
    index: Mutex<Vec<IndexEntry>>,
}

impl OfflineStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        Self::with_limits(dir, OfflineLimits::default())
    }

    pub fn with_limits(dir: PathBuf, limits: OfflineLimits) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create offline cache dir {}", dir.display()))?;
        let index = Self::read_index(&dir).unwrap_or_else(|e| {
            debug!(error = %e, "Offline index unreadable, rebuilding");
            Self::rebuild_index(&dir)
        });
        let store = Self {
            dir,
            limits,
            index: Mutex::new(index),
        };
        store.prune()?;
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn limits(&self) -> &OfflineLimits {
        &self.limits
    }

    fn lock_index(&self) -> MutexGuard<'_, Vec<IndexEntry>> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn file_name(key: &QueryKey) -> String {
        format!("{:016x}.json", stable_hash(&key.to_string()))
    }

    fn entry_path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_index(dir: &Path) -> Result<Vec<IndexEntry>> {
        let contents = std::fs::read_to_string(dir.join(INDEX_FILE))
            .context("Failed to read offline index")?;
        serde_json::from_str(&contents).context("Failed to parse offline index")
    }

    /// Recover the index from the entry files themselves.
    fn rebuild_index(dir: &Path) -> Vec<IndexEntry> {
        let Ok(read_dir) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut entries = Vec::new();
        for item in read_dir.flatten() {
            let file = item.file_name().to_string_lossy().into_owned();
            if file == INDEX_FILE || !file.ends_with(".json") {
                continue;
            }
            let Ok(raw) = std::fs::read_to_string(item.path()) else {
                continue;
            };
            match serde_json::from_str::<StoredEntry>(&raw) {
                Ok(stored) => entries.push(IndexEntry {
                    key: stored.key,
                    file,
                    cached_at: stored.cached_at,
                    size: raw.len() as u64,
                }),
                Err(e) => debug!(file = %file, error = %e, "Skipping invalid offline entry"),
            }
        }
        entries
    }

    fn persist_index(&self, entries: &[IndexEntry]) -> Result<()> {
        let contents = serde_json::to_string(entries)?;
        write_atomic(&self.dir.join(INDEX_FILE), &contents).context("Failed to write offline index")?;
        Ok(())
    }

    fn remove_files(&self, files: &[String]) {
        for file in files {
            if let Err(e) = std::fs::remove_file(self.entry_path(file)) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(file = %file, error = %e, "Failed to remove offline entry");
                }
            }
        }
    }

    /// Store `data` as the latest response for `key`.
    ///
    /// Returns `false` when the entry was not kept because it exceeds the
    /// per-entry limit or would be evicted straight away.
    pub fn save(&self, key: &QueryKey, data: &Value) -> Result<bool> {
        let stored = StoredEntry {
            key: key.clone(),
            data: data.clone(),
            cached_at: Utc::now(),
        };
        let raw = serde_json::to_string(&stored)?;
        let size = raw.len() as u64;
        let file = Self::file_name(key);

        let mut index = self.lock_index();

        if self.limits.max_entry_bytes > 0 && size > self.limits.max_entry_bytes {
            debug!(key = %key, size, "Response too large for offline store");
            let outcome = trim(index.clone(), Utc::now(), &self.limits);
            self.apply_trim(&mut index, outcome)?;
            return Ok(false);
        }

        let mut next = vec![IndexEntry {
            key: key.clone(),
            file: file.clone(),
            cached_at: stored.cached_at,
            size,
        }];
        for entry in index.iter().filter(|e| e.key != *key) {
            if entry.file == file {
                // Two keys hashed to one file; the old entry loses its data
                warn!(key = %key, evicted = %entry.key, file = %file, "Offline file name collision");
                continue;
            }
            next.push(entry.clone());
        }

        let outcome = trim(next, Utc::now(), &self.limits);
        if !outcome.kept.iter().any(|e| e.key == *key) {
            let outcome = trim(index.clone(), Utc::now(), &self.limits);
            self.apply_trim(&mut index, outcome)?;
            return Ok(false);
        }

        write_atomic(&self.entry_path(&file), &raw)
            .with_context(|| format!("Failed to write offline entry for {}", key))?;
        self.apply_trim(&mut index, outcome)?;
        Ok(true)
    }

    fn apply_trim(&self, index: &mut Vec<IndexEntry>, outcome: TrimOutcome) -> Result<()> {
        if !outcome.removed.is_empty() {
            debug!(count = outcome.removed.len(), "Dropping offline entries");
            self.remove_files(&outcome.removed);
        }
        *index = outcome.kept;
        self.persist_index(index)
    }

    /// Load the stored response for `key`, if one exists and is young enough.
    pub fn load(&self, key: &QueryKey) -> Result<Option<CachedData<Value>>> {
        let file = Self::file_name(key);
        let path = self.entry_path(&file);
        if !path.exists() {
            return Ok(None);
        }

        let parsed = std::fs::read_to_string(&path)
            .context("Failed to read offline entry")
            .and_then(|raw| {
                serde_json::from_str::<StoredEntry>(&raw).context("Failed to parse offline entry")
            });

        let stored = match parsed {
            Ok(stored) if stored.key == *key => stored,
            Ok(_) => return Ok(None),
            Err(e) => {
                debug!(key = %key, error = %e, "Discarding unreadable offline entry");
                self.forget(&file)?;
                return Ok(None);
            }
        };

        let cached = CachedData {
            data: stored.data,
            cached_at: stored.cached_at,
        };
        if cached.is_older_than(self.limits.max_age) {
            debug!(key = %key, "Offline entry expired");
            self.forget(&file)?;
            return Ok(None);
        }
        Ok(Some(cached))
    }

    fn forget(&self, file: &str) -> Result<()> {
        self.remove_files(&[file.to_string()]);
        let mut index = self.lock_index();
        let before = index.len();
        index.retain(|e| e.file != file);
        if index.len() != before {
            self.persist_index(&index)?;
        }
        Ok(())
    }

    /// Drop expired entries and evict the oldest until the limits hold.
    /// Returns how many entries were removed.
    pub fn prune(&self) -> Result<usize> {
        let mut index = self.lock_index();
        let outcome = trim(index.clone(), Utc::now(), &self.limits);
        let removed = outcome.removed.len();
        self.apply_trim(&mut index, outcome)?;
        Ok(removed)
    }

    /// Delete every stored response.
    pub fn clear(&self) -> Result<()> {
        let mut index = self.lock_index();
        let files: Vec<String> = index.iter().map(|e| e.file.clone()).collect();
        self.remove_files(&files);
        index.clear();
        self.persist_index(&index)
    }

    pub fn len(&self) -> usize {
        self.lock_index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored entries, newest first.
    pub fn entries(&self) -> Vec<OfflineEntry> {
        self.lock_index()
            .iter()
            .map(|e| OfflineEntry {
                key: e.key.clone(),
                age: CachedData {
                    data: (),
                    cached_at: e.cached_at,
                }
                .age_display(),
                size: e.size,
            })
            .collect()
    }
}

/// Write through a sibling temp file so readers never see half a file.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

struct TrimOutcome {
    kept: Vec<IndexEntry>,
    removed: Vec<String>,
}

/// Split `entries` into those kept (newest first) and the files to delete.
fn trim(entries: Vec<IndexEntry>, now: DateTime<Utc>, limits: &OfflineLimits) -> TrimOutcome {
    let max_age = chrono::Duration::from_std(limits.max_age).ok();
    let (mut fresh, expired): (Vec<_>, Vec<_>) = entries
        .into_iter()
        .partition(|e| max_age.map_or(true, |max_age| now - e.cached_at <= max_age));
    let mut removed: Vec<String> = expired.into_iter().map(|e| e.file).collect();

    fresh.sort_by_key(|e| e.cached_at);
    let mut total: u64 = fresh.iter().map(|e| e.size).sum();
    let mut start = 0;
    while start < fresh.len() {
        let count = fresh.len() - start;
        let over_count = limits.max_entries > 0 && count > limits.max_entries;
        let over_bytes = limits.max_bytes > 0 && total > limits.max_bytes;
        if !over_count && !over_bytes {
            break;
        }
        total -= fresh[start].size;
        removed.push(fresh[start].file.clone());
        start += 1;
    }

    let mut kept = fresh.split_off(start);
    kept.reverse();
    TrimOutcome { kept, removed }
}

/// djb2 over the rendered key; stable across builds and platforms.
fn stable_hash(value: &str) -> u64 {
    value
        .bytes()
        .fold(5381u64, |hash, b| hash.wrapping_mul(33) ^ u64::from(b))
}
