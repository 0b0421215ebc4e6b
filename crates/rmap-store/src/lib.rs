//! Flat hash storage for the rmap record mapper.
//!
//! The mapper stores every instance as one hash: a record key (the instance's
//! identity) holding string fields. This crate provides that substrate.
//!
//! # Storage Backends
//!
//! All backends implement the [`HashStore`] trait:
//!
//! - [`InMemoryHashStore`] -- `BTreeMap`-based store for tests and embedding
//! - [`RedisHashStore`] -- one Redis connection, selected database
//!
//! # Design Rules
//!
//! 1. A store owns exactly one logical connection and is used by one caller at a time.
//! 2. Every operation blocks until it completes; there is no retry, backoff, or timeout.
//! 3. Transport errors are propagated, never silently ignored.
//! 4. After [`HashStore::close`], every operation fails with [`StoreError::Closed`].
//! 5. The store never interprets field values -- they are opaque strings.

pub mod config;
pub mod error;
pub mod memory;
pub mod pattern;
pub mod redis_store;
pub mod traits;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryHashStore;
pub use pattern::glob_match;
pub use redis_store::RedisHashStore;
pub use traits::{HashStore, Record};
