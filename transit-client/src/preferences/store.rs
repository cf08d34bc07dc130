//! Persistent key-value settings storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::error::StorageError;
use crate::persist::write_atomic;

/// Default settings file name inside the data directory.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

/// A stored preference value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PreferenceValue {
    Bool(bool),
    Int(i64),
    Text(String),
    TextSet(Vec<String>),
}

impl PreferenceValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PreferenceValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            PreferenceValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PreferenceValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Set members; a single text value is read as a comma-separated list.
    pub fn as_text_set(&self) -> Option<Vec<&str>> {
        match self {
            PreferenceValue::TextSet(items) => Some(items.iter().map(String::as_str).collect()),
            PreferenceValue::Text(s) => Some(s.split(',').map(str::trim).collect()),
            _ => None,
        }
    }
}

/// Async key-value store for user preferences.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read every stored preference.
    async fn load_all(&self) -> Result<HashMap<String, PreferenceValue>, StorageError>;

    async fn set(&self, key: &str, value: PreferenceValue) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Settings held in memory only.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: RwLock<HashMap<String, PreferenceValue>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `values`.
    pub fn with_values<K: Into<String>>(values: impl IntoIterator<Item = (K, PreferenceValue)>) -> Self {
        Self {
            values: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load_all(&self) -> Result<HashMap<String, PreferenceValue>, StorageError> {
        Ok(self.values.read().await.clone())
    }

    async fn set(&self, key: &str, value: PreferenceValue) -> Result<(), StorageError> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

/// Settings persisted as a JSON object in a single file.
#[derive(Debug)]
pub struct JsonSettingsStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Settings file named [`DEFAULT_SETTINGS_FILE`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The file as raw JSON values, so entries this version cannot read
    /// survive a rewrite untouched.
    async fn read_raw(&self) -> Result<Map<String, Value>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(Map::new()),
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| StorageError::Read(format!("settings file is corrupt: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(StorageError::read("settings", e)),
        }
    }

    async fn write_raw(&self, map: &Map<String, Value>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Other(format!("failed to serialize settings: {e}")))?;
        write_atomic(&self.path, &json, "settings").await
    }
}

#[async_trait]
impl SettingsStore for JsonSettingsStore {
    /// Values that are not a bool, integer, string or string list are
    /// skipped with a warning; `null` is treated as unset.
    async fn load_all(&self) -> Result<HashMap<String, PreferenceValue>, StorageError> {
        Ok(self
            .read_raw()
            .await?
            .into_iter()
            .filter_map(|(key, value)| {
                if value.is_null() {
                    return None;
                }
                match serde_json::from_value(value) {
                    Ok(value) => Some((key, value)),
                    Err(e) => {
                        warn!(key = %key, error = %e, "Skipping unreadable setting");
                        None
                    }
                }
            })
            .collect())
    }

    async fn set(&self, key: &str, value: PreferenceValue) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_raw().await?;
        let value = serde_json::to_value(value)
            .map_err(|e| StorageError::Other(format!("failed to serialize setting: {e}")))?;
        map.insert(key.to_string(), value);
        self.write_raw(&map).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.read_raw().await?;
        if map.remove(key).is_some() {
            self.write_raw(&map).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn values_serialize_untagged() {
        let map: HashMap<String, PreferenceValue> = serde_json::from_str(
            r#"{"a": true, "b": 42, "c": "ENABLED", "d": ["MONDAY", "FRIDAY"]}"#,
        )
        .unwrap();

        assert_eq!(map["a"], PreferenceValue::Bool(true));
        assert_eq!(map["b"], PreferenceValue::Int(42));
        assert_eq!(map["c"], PreferenceValue::Text("ENABLED".into()));
        assert_eq!(
            map["d"],
            PreferenceValue::TextSet(vec!["MONDAY".into(), "FRIDAY".into()])
        );
    }

    #[test]
    fn text_reads_as_comma_separated_set() {
        let v = PreferenceValue::Text("MONDAY, TUESDAY".into());
        assert_eq!(v.as_text_set().unwrap(), vec!["MONDAY", "TUESDAY"]);
        assert_eq!(PreferenceValue::Int(1).as_text_set(), None);
    }

    #[tokio::test]
    async fn memory_store_set_and_remove() {
        let store = MemorySettingsStore::new();
        store.set("k", PreferenceValue::Bool(false)).await.unwrap();
        assert_eq!(store.load_all().await.unwrap()["k"], PreferenceValue::Bool(false));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn json_store_persists_across_instances() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::in_dir(dir.path());
        store.set("mode", PreferenceValue::Text("WEEKDAYS".into())).await.unwrap();
        store.set("until", PreferenceValue::Int(1_700_000_000_000)).await.unwrap();

        let reopened = JsonSettingsStore::in_dir(dir.path());
        let map = reopened.load_all().await.unwrap();
        assert_eq!(map["mode"].as_text(), Some("WEEKDAYS"));
        assert_eq!(map["until"].as_int(), Some(1_700_000_000_000));
    }

    #[tokio::test]
    async fn json_store_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::in_dir(dir.path());
        assert!(store.load_all().await.unwrap().is_empty());
        store.remove("anything").await.unwrap();
    }

    #[tokio::test]
    async fn json_store_skips_unreadable_values_only() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::in_dir(dir.path());
        std::fs::write(
            store.path(),
            r#"{"notification_quiet_mode": "DISABLED",
                "notification_quiet_until": null,
                "ratio": 0.5,
                "nested": {"a": 1},
                "notification_vibration": false}"#,
        )
        .unwrap();

        let map = store.load_all().await.unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["notification_quiet_mode"].as_text(), Some("DISABLED"));
        assert_eq!(map["notification_vibration"].as_bool(), Some(false));
    }

    #[tokio::test]
    async fn json_store_write_keeps_unreadable_values() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::in_dir(dir.path());
        std::fs::write(store.path(), r#"{"ratio": 0.5, "nested": {"a": 1}}"#).unwrap();

        store.set("mode", PreferenceValue::Text("WEEKDAYS".into())).await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["ratio"], serde_json::json!(0.5));
        assert_eq!(raw["nested"]["a"], serde_json::json!(1));
        assert_eq!(raw["mode"], serde_json::json!("WEEKDAYS"));
    }

    #[tokio::test]
    async fn json_store_corrupt_file_is_read_error() {
        let dir = tempdir().unwrap();
        let store = JsonSettingsStore::in_dir(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.load_all().await, Err(StorageError::Read(_))));
    }
}
