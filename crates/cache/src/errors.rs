/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Error type internal to the cache layer.
///
/// None of these escape [`crate::CacheStore::get`]: decryption and parse
/// failures are handled as cache misses and the offending entry is deleted.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Auth-tag mismatch or malformed encrypted blob
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Networked backend unreachable or misbehaving
    #[error("cache backend error: {0}")]
    Backend(String),

    /// Stored record could not be parsed
    #[error("corrupt cache entry: {0}")]
    Corrupt(String),

    /// Encryption key file could not be read or written
    #[error("key file error: {0}")]
    KeyFile(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        CacheError::Backend(error.to_string())
    }
}
