//! JSON-file-backed collection store
//!
//! A collection is a JSON array of objects kept in a single file. Nothing is
//! cached: every call reads the file again, and every mutation rewrites the
//! whole array. Mutations hold the file's write lock from the read until the
//! rewrite has finished.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::error::StoreError;
use crate::storage::locks::{FileLock, FileLocks};

/// A schema-less record
pub type Record = Map<String, Value>;

/// How an update combines the submitted item with the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpdateMode {
    Replace,
    Merge,
}

/// Store over one backing file
#[derive(Debug, Clone)]
pub struct CollectionStore {
    path: PathBuf,
    id_field: String,
    lock: FileLock,
}

impl CollectionStore {
    /// Create a store for `path`, sharing the file's lock through `locks`
    pub fn new(path: impl Into<PathBuf>, id_field: impl Into<String>, locks: &FileLocks) -> Self {
        let path = path.into();
        let lock = locks.lock_for(&path);
        Self {
            path,
            id_field: id_field.into(),
            lock,
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the identity field
    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// File content, byte for byte
    pub fn read_raw(&self) -> Result<Vec<u8>, StoreError> {
        let _guard = self.lock.read();
        self.read_bytes()
    }

    /// Decode the whole collection
    pub fn load(&self) -> Result<Vec<Record>, StoreError> {
        let _guard = self.lock.read();
        self.load_unlocked()
    }

    /// First record whose identity, as a string, equals `id`
    pub fn find_by_id(&self, id: &str) -> Result<Option<Record>, StoreError> {
        let records = self.load()?;
        debug!("Looking up id {} among {} records in {:?}", id, records.len(), self.path);
        Ok(records
            .into_iter()
            .find(|record| self.identity_of(record).as_deref() == Some(id)))
    }

    /// Append `item`, assigning an identity when it has none
    pub fn insert(&self, mut item: Record) -> Result<Record, StoreError> {
        let _guard = self.lock.write();
        let mut records = self.load_unlocked()?;

        let has_identity = item.get(&self.id_field).is_some_and(|id| !id.is_null());
        if !has_identity {
            let id = self.next_identity(&records);
            debug!("Assigned {} = {} in {:?}", self.id_field, id, self.path);
            item.insert(self.id_field.clone(), id);
        }

        records.push(item.clone());
        self.persist_unlocked(&records)?;
        Ok(item)
    }

    /// Swap the stored record with the same identity for `item`
    pub fn replace(&self, item: Record) -> Result<Record, StoreError> {
        self.update(item, UpdateMode::Replace)
    }

    /// Overlay the keys of `item` onto the stored record with the same identity
    pub fn merge(&self, item: Record) -> Result<Record, StoreError> {
        self.update(item, UpdateMode::Merge)
    }

    /// Overwrite the backing file with `records`
    pub fn persist(&self, records: &[Record]) -> Result<(), StoreError> {
        let _guard = self.lock.write();
        self.persist_unlocked(records)
    }

    fn update(&self, item: Record, mode: UpdateMode) -> Result<Record, StoreError> {
        let id = self.identity_of(&item).ok_or_else(|| StoreError::MissingIdentity {
            field: self.id_field.clone(),
        })?;

        let _guard = self.lock.write();
        let mut records = self.load_unlocked()?;

        let slot = records
            .iter_mut()
            .find(|record| self.identity_of(record).as_deref() == Some(id.as_str()))
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        match mode {
            UpdateMode::Replace => *slot = item,
            UpdateMode::Merge => slot.extend(item),
        }
        let updated = slot.clone();

        debug!("{:?} record {} in {:?}", mode, id, self.path);
        self.persist_unlocked(&records)?;
        Ok(updated)
    }

    fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        std::fs::read(&self.path).map_err(|e| StoreError::io(&self.path, e))
    }

    fn load_unlocked(&self) -> Result<Vec<Record>, StoreError> {
        let bytes = self.read_bytes()?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::parse(&self.path, e))
    }

    fn persist_unlocked(&self, records: &[Record]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(records).map_err(StoreError::Encode)?;
        std::fs::write(&self.path, bytes).map_err(|e| StoreError::io(&self.path, e))
    }

    /// Identity of `record` as a non-empty string
    fn identity_of(&self, record: &Record) -> Option<String> {
        record
            .get(&self.id_field)
            .and_then(identity_string)
            .filter(|id| !id.is_empty())
    }

    /// One past the largest integer identity, or an encoded timestamp when
    /// no identity parses as an integer
    fn next_identity(&self, records: &[Record]) -> Value {
        records
            .iter()
            .filter_map(|record| self.identity_of(record)?.parse::<i64>().ok())
            .max()
            .and_then(|max| max.checked_add(1))
            .map(Value::from)
            .unwrap_or_else(|| {
                let now = chrono::Local::now().to_string();
                Value::String(STANDARD.encode(now))
            })
    }
}

/// String form of an identity value, used for loose comparison.
///
/// Integral floats print without a fraction so `5.0` and `"5"` compare
/// equal. `null` is no identity.
pub fn identity_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !n.is_i64() && !n.is_u64() && f.fract() == 0.0 && f.abs() < 1e15 => {
                Some(format!("{}", f as i64))
            }
            _ => Some(n.to_string()),
        },
        other => Some(other.to_string()),
    }
}
