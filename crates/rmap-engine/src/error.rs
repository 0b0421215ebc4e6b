use rmap_schema::SchemaError;
use rmap_store::StoreError;
use thiserror::Error;

/// Errors from persist and load operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The type is misdeclared (e.g. it has no identity field).
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The identity of an instance was null or empty.
    #[error("identity field {type_name}.{field} cannot be null")]
    NullIdentity { type_name: String, field: String },

    /// A record's type marker names a type the registry does not know.
    #[error("record {key} has type {type_name}, which is not registered")]
    UnknownType { key: String, type_name: String },

    /// A record exists but carries no type marker.
    #[error("record {key} has no type marker")]
    MissingTypeMarker { key: String },

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
