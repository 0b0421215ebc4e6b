//! Metadata model for the rmap record mapper.
//!
//! A type becomes persistable by implementing [`Persistable`] and describing
//! its fields once through a [`SchemaBuilder`]. The resulting [`Schema`] is
//! built lazily, cached for the life of the process, and never mutated. The
//! mapper walks it instead of inspecting types at runtime.
//!
//! # Architecture
//!
//! - **Identity field** — exactly one scalar field whose encoded value is the
//!   store key of an instance.
//! - **Persisted fields** — scalars, lists of scalars, references to other
//!   persistable types, and lists of such references. Anything not declared
//!   is invisible to the mapper.
//! - **Lazy fields** — persisted, but skipped by eager loading.
//! - **Key mapping** — a static [`KeyMap`] translating field names into the
//!   key names found in the store.
//! - **Registry** — a [`Registry`] of validated schemas, used to recognise
//!   type-erased values and to resolve the stored type marker.
//!
//! # Modules
//!
//! - [`error`] — [`SchemaError`]
//! - [`field`] — [`Field`] descriptors and their type-erased accessors
//! - [`schema`] — [`Schema`], [`SchemaBuilder`], and the [`Persistable`] trait
//! - [`keymap`] — Field-name to store-key translation
//! - [`registry`] — [`Registry`] of validated schemas

pub mod error;
pub mod field;
pub mod keymap;
pub mod registry;
pub mod schema;

pub use error::{SchemaError, SchemaResult};
pub use field::{Field, FieldKind, FieldRole, FieldUpdate, FieldValue, SchemaRef};
pub use keymap::{KeyMap, KeyOverride};
pub use registry::Registry;
pub use schema::{Persistable, Schema, SchemaBuilder};

/// Store key reserved for the originating type name of a record.
///
/// No field may be named, or mapped, to this key.
pub const CLASS_KEY: &str = "_class";
