//! Encrypted, TTL'd, namespace-isolated key-value cache
//!
//! Entries are wrapped in a JSON [`CacheEntry`] record carrying creation and
//! expiry timestamps. Sensitive payloads are encrypted at rest with
//! AES-256-GCM via [`SecretCipher`]. Two interchangeable backends are
//! supported: a networked Redis backend and a local disk backend, with
//! automatic fallback to disk when Redis is unreachable. A disabled variant
//! satisfies the same contract so callers never branch on configuration.

pub mod cipher;
pub mod entry;
pub mod errors;
pub mod keys;
pub mod store;

pub use cipher::SecretCipher;
pub use entry::CacheEntry;
pub use errors::{CacheError, Result};
pub use store::{CacheStats, CacheStore};
