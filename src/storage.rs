//! Key-value storage adapters.
//!
//! The note lifecycle is written against [`StorageAdapter`], a small
//! asynchronous contract over named records. Two adapters are provided: an
//! in-process [`MemoryStore`] and a [`JsonFileStore`] that keeps every record
//! in one JSON document on disk.
use std::{
    collections::HashMap,
    io::{self, Write},
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use log::{debug, error, info, trace};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tokio::sync::Mutex as TokioMutex;

use crate::{NoteError, Result};

/// Asynchronous key-value contract the note lifecycle runs against.
///
/// Implementations must apply a single `set` or `remove` call as a unit: a
/// concurrent `get` sees either none or all of its keys changed.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Returns the values of the requested keys that exist. Missing keys are
    /// simply absent from the result.
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Upserts the given records, leaving all other records untouched.
    async fn set(&self, items: HashMap<String, Value>) -> Result<()>;

    /// Removes the given records. Removing a missing key is not an error.
    async fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// In-process adapter, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: TokioMutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with raw records.
    pub fn with_records(records: HashMap<String, Value>) -> Self {
        Self {
            records: TokioMutex::new(records),
        }
    }

    /// Copy of every record currently held.
    pub async fn snapshot(&self) -> HashMap<String, Value> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl StorageAdapter for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let records = self.records.lock().await;
        Ok(keys
            .iter()
            .filter_map(|k| records.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<()> {
        trace!("Memory store set: {:?}", items.keys().collect::<Vec<_>>());
        self.records.lock().await.extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut records = self.records.lock().await;
        for key in keys {
            records.remove(*key);
        }
        Ok(())
    }
}

/// Adapter persisting all records as one JSON object in a single file.
///
/// Every write replaces the file through a temporary file in the same
/// directory, so readers never observe a half-written document. Access from
/// within one process is serialized; separate processes sharing the file are
/// last-writer-wins.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    file_lock: TokioMutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_lock: TokioMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> Result<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Store file {} does not exist yet", self.path.display());
                return Ok(Map::new());
            }
            Err(e) => {
                error!("Failed to read store file {}: {}", self.path.display(), e);
                return Err(NoteError::Io(e));
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        let document = serde_json::from_str::<Value>(&content).map_err(|e| {
            error!("Failed to parse store file {}: {}", self.path.display(), e);
            NoteError::Serialization(e)
        })?;

        match document {
            Value::Object(map) => Ok(map),
            other => {
                let message = format!(
                    "Store file {} does not hold a JSON object (found {})",
                    self.path.display(),
                    type_name(&other)
                );
                error!("{}", message);
                Err(NoteError::storage(message))
            }
        }
    }

    async fn write_document(&self, document: Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(&Value::Object(document)).map_err(|e| {
            error!("Failed to serialize store document: {}", e);
            NoteError::Serialization(e)
        })?;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || persist_atomically(&path, json.as_bytes()))
            .await
            .map_err(|e| NoteError::storage(format!("Store write task failed: {}", e)))?
    }
}

#[async_trait]
impl StorageAdapter for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let _guard = self.file_lock.lock().await;
        let mut document = self.read_document().await?;
        Ok(keys
            .iter()
            .filter_map(|k| document.remove(*k).map(|v| (k.to_string(), v)))
            .collect())
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        let mut document = self.read_document().await?;
        document.extend(items);
        self.write_document(document).await
    }

    async fn remove(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.file_lock.lock().await;
        let mut document = self.read_document().await?;
        let before = document.len();
        for key in keys {
            document.remove(*key);
        }
        if document.len() == before {
            trace!("Remove touched no records, skipping write");
            return Ok(());
        }
        self.write_document(document).await
    }
}

/// Writes `bytes` to `path` via a temporary file and an atomic rename.
fn persist_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    if !dir.exists() {
        debug!("Creating store directory: {}", dir.display());
        std::fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create directory {}: {}", dir.display(), e);
            NoteError::Io(e)
        })?;
    }

    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        NoteError::Io(e)
    })?;

    temp_file.write_all(bytes).map_err(|e| {
        error!("Failed to write to temporary file: {}", e);
        NoteError::Io(e)
    })?;

    temp_file.as_file().sync_all().map_err(|e| {
        error!("Failed to flush temporary file: {}", e);
        NoteError::Io(e)
    })?;

    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        NoteError::Io(e.error)
    })?;

    info!("Store written to {}", path.display());
    Ok(())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn memory_store_get_returns_only_present_keys() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([("a".to_string(), json!(1))]))
            .await
            .unwrap();

        let got = store.get(&["a", "b"]).await.unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got["a"], json!(1));
    }

    #[tokio::test]
    async fn memory_store_set_is_partial_upsert() {
        let store = MemoryStore::new();
        store
            .set(HashMap::from([
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!(2)),
            ]))
            .await
            .unwrap();
        store
            .set(HashMap::from([("a".to_string(), json!(10))]))
            .await
            .unwrap();
        store.remove(&["missing"]).await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot["a"], json!(10));
        assert_eq!(snapshot["b"], json!(2));
    }

    #[tokio::test]
    async fn file_store_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("notes.json"));
        assert!(store.get(&["notes"]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("notes.json");

        let store = JsonFileStore::new(&path);
        store
            .set(HashMap::from([
                ("pinHash".to_string(), json!("abc")),
                ("notes".to_string(), json!([])),
            ]))
            .await
            .unwrap();
        store.remove(&["pinHash"]).await.unwrap();

        let reopened = JsonFileStore::new(&path);
        let got = reopened.get(&["notes", "pinHash"]).await.unwrap();
        assert_eq!(got.get("notes"), Some(&json!([])));
        assert!(!got.contains_key("pinHash"));
    }

    #[tokio::test]
    async fn file_store_reports_unparsable_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "{ \"notes\": [").unwrap();

        let err = JsonFileStore::new(&path).get(&["notes"]).await.unwrap_err();
        assert!(matches!(err, NoteError::Serialization(_)));
    }

    #[tokio::test]
    async fn file_store_rejects_non_object_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let err = JsonFileStore::new(&path).get(&["notes"]).await.unwrap_err();
        assert!(matches!(err, NoteError::Storage { .. }));
    }
}
