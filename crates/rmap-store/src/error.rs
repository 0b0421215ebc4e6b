/// Errors from hash store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Error reported by the Redis client or server.
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    /// The store was closed and can no longer be used.
    #[error("store is closed")]
    Closed,

    /// Configuration could not be read or parsed.
    #[error("invalid store configuration: {0}")]
    Config(String),

    /// I/O error while reading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
