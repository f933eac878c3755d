//! On-disk / on-wire cache record.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single cache record as serialized to the backend.
///
/// When `encrypted` is true, `value` holds
/// `base64(nonce(12) || auth_tag(16) || ciphertext)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: String,
    pub encrypted: bool,
    pub created_at: i64,
    pub expires_at: i64,
}

impl CacheEntry {
    /// Wrap a value, stamping `expires_at = created_at + ttl`.
    pub fn new(value: String, encrypted: bool, ttl_secs: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            value,
            encrypted,
            created_at: now,
            expires_at: now + ttl_secs as i64,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.expires_at
    }
}
