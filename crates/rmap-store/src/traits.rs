use std::collections::{BTreeMap, BTreeSet};

use crate::error::StoreResult;

/// All fields of one stored hash, keyed by field name.
pub type Record = BTreeMap<String, String>;

/// A key-value store of flat string hashes.
///
/// All implementations must satisfy these invariants:
/// - A record exists while it has at least one field.
/// - Writing a field with an empty value stores the empty string; it does
///   not delete the field.
/// - `keys` uses Redis glob syntax (see [`glob_match`](crate::glob_match)).
/// - All transport errors are propagated, never silently ignored.
pub trait HashStore: Send {
    /// Set one field of the record at `key`, creating the record if needed.
    fn hset(&mut self, key: &str, field: &str, value: &str) -> StoreResult<()>;

    /// Set several fields of the record at `key` in one operation.
    ///
    /// Default implementation calls `hset()` for each entry. Backends may
    /// override for fewer round-trips.
    fn hset_multiple(&mut self, key: &str, entries: &[(String, String)]) -> StoreResult<()> {
        for (field, value) in entries {
            self.hset(key, field, value)?;
        }
        Ok(())
    }

    /// Read one field. Returns `Ok(None)` if the record or field is missing.
    fn hget(&mut self, key: &str, field: &str) -> StoreResult<Option<String>>;

    /// Read every field of a record. Missing records read as empty.
    fn hgetall(&mut self, key: &str) -> StoreResult<Record>;

    /// Check whether a record exists.
    fn exists(&mut self, key: &str) -> StoreResult<bool>;

    /// Every record key matching a glob pattern.
    fn keys(&mut self, pattern: &str) -> StoreResult<BTreeSet<String>>;

    /// Delete a record. Returns `true` if it existed.
    fn delete(&mut self, key: &str) -> StoreResult<bool>;

    /// Release the underlying connection.
    ///
    /// Closing twice is a no-op.
    fn close(&mut self) -> StoreResult<()>;
}
