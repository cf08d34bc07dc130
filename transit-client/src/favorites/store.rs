//! Favorite storage backends.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::error::StorageError;
use crate::persist::write_atomic;

use super::record::FavoriteRecord;

/// Default favorites file name inside the data directory.
pub const DEFAULT_FAVORITES_FILE: &str = "favorites.json";

#[async_trait]
pub trait FavoritesStore: Send + Sync {
    /// Every stored favorite, in insertion order.
    async fn all(&self) -> Result<Vec<FavoriteRecord>, StorageError>;

    /// Insert a favorite, or replace the one with the same id.
    ///
    /// A non-positive id is replaced with the next free one. Returns the
    /// stored record.
    async fn add(&self, record: FavoriteRecord) -> Result<FavoriteRecord, StorageError>;

    async fn set_active(&self, id: i64, active: bool) -> Result<(), StorageError>;

    async fn remove(&self, id: i64) -> Result<(), StorageError>;

    /// Favorites whose reminder is switched on.
    async fn active(&self) -> Result<Vec<FavoriteRecord>, StorageError> {
        let mut records = self.all().await?;
        records.retain(|r| r.active);
        Ok(records)
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0).max(0) + 1
}

fn upsert(records: &mut Vec<FavoriteRecord>, mut record: FavoriteRecord) -> FavoriteRecord {
    if record.id <= 0 {
        record.id = next_id(records.iter().map(|r| r.id));
    }
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record.clone(),
        None => records.push(record.clone()),
    }
    record
}

fn find_mut(records: &mut [FavoriteRecord], id: i64) -> Result<&mut FavoriteRecord, StorageError> {
    records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| StorageError::NotFound(format!("favorite {id}")))
}

/// Favorites held in memory only.
#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
    records: RwLock<Vec<FavoriteRecord>>,
}

impl MemoryFavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<FavoriteRecord>) -> Self {
        Self {
            records: RwLock::new(records),
        }
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavoritesStore {
    async fn all(&self) -> Result<Vec<FavoriteRecord>, StorageError> {
        Ok(self.records.read().await.clone())
    }

    async fn add(&self, record: FavoriteRecord) -> Result<FavoriteRecord, StorageError> {
        Ok(upsert(&mut *self.records.write().await, record))
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<(), StorageError> {
        find_mut(&mut self.records.write().await, id)?.active = active;
        Ok(())
    }

    async fn remove(&self, id: i64) -> Result<(), StorageError> {
        self.records.write().await.retain(|r| r.id != id);
        Ok(())
    }
}

/// Favorites persisted as a JSON array in a single file.
///
/// Entries that no longer deserialize are logged and returned as
/// [`FavoriteRecord::unreadable`] placeholders, so they are counted as
/// invalid rather than silently dropped. Updates edit the raw JSON, leaving
/// such entries in the file exactly as they were.
#[derive(Debug)]
pub struct JsonFavoritesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_FAVORITES_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<Vec<Value>, StorageError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::read("favorites", e)),
        };
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| StorageError::Read(format!("favorites file is corrupt: {e}")))
    }

    async fn write_entries(&self, entries: &[Value]) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Other(format!("failed to serialize favorites: {e}")))?;
        write_atomic(&self.path, &json, "favorites").await
    }
}

fn entry_id(entry: &Value) -> Option<i64> {
    entry.get("id").and_then(Value::as_i64)
}

fn decode_entry(index: usize, entry: Value) -> FavoriteRecord {
    let id = entry_id(&entry).unwrap_or_default();
    let active = entry.get("active").and_then(Value::as_bool).unwrap_or(true);
    match serde_json::from_value(entry) {
        Ok(record) => record,
        Err(e) => {
            warn!(index, id, error = %e, "Unreadable favorite entry");
            FavoriteRecord::unreadable(id, active)
        }
    }
}

#[async_trait]
impl FavoritesStore for JsonFavoritesStore {
    async fn all(&self) -> Result<Vec<FavoriteRecord>, StorageError> {
        Ok(self
            .read_entries()
            .await?
            .into_iter()
            .enumerate()
            .map(|(index, entry)| decode_entry(index, entry))
            .collect())
    }

    async fn add(&self, mut record: FavoriteRecord) -> Result<FavoriteRecord, StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        if record.id <= 0 {
            record.id = next_id(entries.iter().filter_map(entry_id));
        }

        let value = serde_json::to_value(&record)
            .map_err(|e| StorageError::Other(format!("failed to serialize favorite: {e}")))?;
        match entries.iter_mut().find(|e| entry_id(e) == Some(record.id)) {
            Some(existing) => *existing = value,
            None => entries.push(value),
        }
        self.write_entries(&entries).await?;
        Ok(record)
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let entry = entries
            .iter_mut()
            .find(|e| entry_id(e) == Some(id))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| StorageError::NotFound(format!("favorite {id}")))?;
        entry.insert("active".to_string(), Value::Bool(active));
        self.write_entries(&entries).await
    }

    async fn remove(&self, id: i64) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.read_entries().await?;
        let before = entries.len();
        entries.retain(|e| entry_id(e) != Some(id));
        if entries.len() != before {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}
