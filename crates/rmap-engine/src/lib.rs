//! Graph persistence engine for the rmap record mapper.
//!
//! [`Mapper`] persists plain Rust values into a flat hash store and rebuilds
//! them later, driven entirely by each type's [`Schema`](rmap_schema::Schema).
//!
//! # Record Layout
//!
//! Every instance is one hash keyed by its encoded identity:
//!
//! - scalar fields hold their encoded text; absent values hold `""`
//! - list fields hold their items joined with `,`
//! - reference fields hold the identity of the referenced record, which is
//!   persisted as a record of its own
//! - the reserved `_class` field holds the type name
//!
//! # Error Model
//!
//! - Misdeclared types and null identities fail the call with [`EngineError`].
//! - Loading a missing record returns `Ok(None)`.
//! - Persisting `None` or an unregistered value through
//!   [`Mapper::persist_any`] returns `Ok(false)`.
//! - Unparseable stored text degrades to an absent field and is logged.
//! - Store failures propagate unchanged; nothing is retried.

pub mod error;
mod load;
pub mod mapper;
mod persist;

#[cfg(test)]
mod fixtures;

pub use error::{EngineError, EngineResult};
pub use mapper::{Mapper, LIST_DELIMITER};

pub use rmap_schema::{KeyMap, Persistable, Registry, Schema, CLASS_KEY};
pub use rmap_store::{HashStore, InMemoryHashStore, RedisHashStore, StoreConfig};
pub use rmap_types::Scalar;
