//! Workspace-wide constants

/// Default cache entry lifetime in seconds (one hour).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 3600;

/// Default namespace prefix for cache keys.
pub const DEFAULT_CACHE_PREFIX: &str = "keysweep";

/// Directory under the home directory holding cache state.
pub const STATE_DIR_NAME: &str = ".keysweep";

/// Placeholder emitted for secret values when exposure is disabled.
pub const REDACTED_PLACEHOLDER: &str = "{SECRET}";
