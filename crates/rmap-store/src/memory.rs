use std::collections::{BTreeMap, BTreeSet};

use crate::error::{StoreError, StoreResult};
use crate::pattern::glob_match;
use crate::traits::{HashStore, Record};

/// In-memory, `BTreeMap`-based hash store.
///
/// Intended for tests and embedding. Mirrors the Redis semantics the mapper
/// relies on: a record exists while it has fields, and a closed store
/// rejects every operation.
#[derive(Default)]
pub struct InMemoryHashStore {
    records: BTreeMap<String, Record>,
    closed: bool,
}

impl InMemoryHashStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Borrow a record without going through the trait.
    pub fn record(&self, key: &str) -> Option<&Record> {
        self.records.get(key)
    }

    /// Replace a whole record, e.g. to seed data written by another tool.
    pub fn insert_record(&mut self, key: impl Into<String>, record: Record) {
        self.records.insert(key.into(), record);
    }

    /// Remove all records from the store.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Returns `true` once [`HashStore::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl HashStore for InMemoryHashStore {
    fn hset(&mut self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.records
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn hget(&mut self, key: &str, field: &str) -> StoreResult<Option<String>> {
        self.ensure_open()?;
        Ok(self
            .records
            .get(key)
            .and_then(|record| record.get(field))
            .cloned())
    }

    fn hgetall(&mut self, key: &str) -> StoreResult<Record> {
        self.ensure_open()?;
        Ok(self.records.get(key).cloned().unwrap_or_default())
    }

    fn exists(&mut self, key: &str) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.records.get(key).is_some_and(|record| !record.is_empty()))
    }

    fn keys(&mut self, pattern: &str) -> StoreResult<BTreeSet<String>> {
        self.ensure_open()?;
        Ok(self
            .records
            .iter()
            .filter(|(key, record)| !record.is_empty() && glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn delete(&mut self, key: &str) -> StoreResult<bool> {
        self.ensure_open()?;
        Ok(self.records.remove(key).is_some_and(|record| !record.is_empty()))
    }

    fn close(&mut self) -> StoreResult<()> {
        self.closed = true;
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryHashStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHashStore")
            .field("record_count", &self.records.len())
            .field("closed", &self.closed)
            .finish()
    }
}
