//! JSON-file-backed realtime store.
//!
//! The file holds one JSON object keyed by entry key. Writes go through a temp
//! file and rename so readers never observe a torn file. Change pushes reach
//! subscribers in this process only.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{RealtimeStore, StoreError, StoreSubscription, Subscribers};
use crate::api::StoreRecord;
use crate::core::BeadId;

#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
    subscribers: Subscribers,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
            subscribers: Subscribers::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents; a missing file reads as an empty collection.
    pub fn load(&self) -> Result<Value, StoreError> {
        Ok(Value::Object(self.load_entries()?))
    }

    fn load_entries(&self) -> Result<Map<String, Value>, StoreError> {
        if !self.path.exists() {
            return Ok(Map::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(Value::Null) => Ok(Map::new()),
            Ok(other) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: format!("expected an object of entries, found {}", kind_of(&other)),
            }),
            Err(e) => Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(|e| self.io_error(e))?;
        let contents = serde_json::to_vec_pretty(entries).map_err(|e| StoreError::WriteFailed {
            reason: format!("failed to encode entries: {e}"),
        })?;
        let temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        fs::write(temp.path(), contents).map_err(|e| self.io_error(e))?;
        temp.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn io_error(&self, err: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            reason: err.to_string(),
        }
    }
}

impl RealtimeStore for FileStore {
    fn append(&self, id: BeadId) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let mut entries = self.load_entries()?;
        let record = StoreRecord::new(id, OffsetDateTime::now_utc());
        let value = serde_json::to_value(&record).map_err(|e| StoreError::WriteFailed {
            reason: format!("failed to encode record: {e}"),
        })?;
        entries.insert(Uuid::now_v7().to_string(), value);
        self.write_entries(&entries)?;
        tracing::debug!(bead = %id, path = %self.path.display(), "appended to file store");
        self.subscribers.publish(Value::Object(entries))
    }

    fn subscribe(&self) -> Result<StoreSubscription, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::LockPoisoned)?;
        let current = self.load()?;
        self.subscribers.subscribe(current)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
