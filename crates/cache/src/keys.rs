//! Namespaced cache key handling.
//!
//! A full key is `{prefix}:{logical}`. Logical keys are composite tuples
//! (`kind:name:space:region:application`, secrets embed their owner) built
//! by the entity layer; this module only handles namespacing and the
//! reversible disk filename encoding.

/// Join a store prefix and a logical key.
pub fn namespaced(prefix: &str, logical: &str) -> String {
    format!("{prefix}:{logical}")
}

/// Strip this store's prefix from a full key, if it matches.
pub fn strip_prefix<'a>(prefix: &str, full: &'a str) -> Option<&'a str> {
    full.strip_prefix(prefix)?.strip_prefix(':')
}

/// Leading `kind` segment of a logical key, for per-type stats.
pub fn kind_of(logical: &str) -> &str {
    logical.split(':').next().unwrap_or(logical)
}

/// Disk filename for a full key. Hex keeps arbitrary key bytes filesystem
/// safe while staying reversible for prefix checks and stats.
pub fn filename(full_key: &str) -> String {
    format!("{}.json", hex::encode(full_key))
}

/// Recover the full key from a disk filename produced by [`filename`].
pub fn key_from_filename(name: &str) -> Option<String> {
    let stem = name.strip_suffix(".json")?;
    let bytes = hex::decode(stem).ok()?;
    String::from_utf8(bytes).ok()
}
