//! Error types for schema declaration and field access.

use rmap_types::CoercionError;
use thiserror::Error;

/// Errors raised by a misdeclared persistable type.
///
/// These are configuration errors: they indicate a type was described
/// incorrectly and must be fixed where it is declared.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The type declares no identity field.
    #[error("type {type_name} must declare an identity field (@Id)")]
    MissingIdentity { type_name: String },

    /// The type declares more than one identity field.
    #[error("type {type_name} declares more than one identity field: {first}, {second}")]
    DuplicateIdentity {
        type_name: String,
        first: String,
        second: String,
    },

    /// The identity field was marked lazy.
    #[error("identity field {type_name}.{field} cannot be lazy")]
    LazyIdentity { type_name: String, field: String },

    /// Two fields share a name.
    #[error("type {type_name} declares field {field} twice")]
    DuplicateField { type_name: String, field: String },

    /// Two fields map to the same store key.
    #[error("type {type_name}: fields {first} and {second} both map to store key {key:?}")]
    DuplicateKey {
        type_name: String,
        first: String,
        second: String,
        key: String,
    },

    /// A field name or mapped key collides with the reserved type marker.
    #[error("{owner}: {name:?} collides with the reserved key {reserved:?}")]
    ReservedKey {
        owner: String,
        name: String,
        reserved: &'static str,
    },

    /// A `lazy` or `aliases` declaration names a field that does not exist.
    #[error("type {type_name} has no field named {field}")]
    UnknownField { type_name: String, field: String },

    /// A key map is not one-to-one.
    #[error("key map is ambiguous: {0}")]
    AmbiguousKeyMap(String),

    /// Two registered schemas share a type name.
    #[error("type name {0} is already registered")]
    DuplicateType(String),

    /// An accessor was handed a value of the wrong type.
    #[error("field {type_name}.{field} accessed with a value of another type")]
    TypeMismatch { type_name: String, field: String },

    /// A decoded value did not fit the field it was written to.
    #[error("field {field}: {source}")]
    Coercion {
        field: String,
        #[source]
        source: CoercionError,
    },
}

/// Convenience type alias for schema operations.
pub type SchemaResult<T> = std::result::Result<T, SchemaError>;
