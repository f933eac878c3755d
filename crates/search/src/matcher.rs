//! Glob/exact key matching.

use keysweep_core::Error;
use regex::{Regex, RegexBuilder};
use tracing::warn;

/// Case-sensitive match of a key against a pattern: exact string equality,
/// or an anchored glob where `*` means any character sequence.
pub fn match_key(key: &str, pattern: &str) -> bool {
    match_key_with_case(key, pattern, false)
}

/// Like [`match_key`] with optional case folding.
///
/// A pattern of exactly `*`, or one exactly equal to the key, matches
/// without regex compilation. An invalid pattern is reported and treated as
/// "no match".
pub fn match_key_with_case(key: &str, pattern: &str, insensitive: bool) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return if insensitive {
            key.eq_ignore_ascii_case(pattern)
        } else {
            key == pattern
        };
    }
    if key == pattern {
        return true;
    }

    match compile_pattern(pattern, insensitive) {
        Ok(re) => re.is_match(key),
        Err(e) => {
            warn!(error = %e, "search pattern rejected, treating as no match");
            false
        }
    }
}

/// Translate a glob pattern into an anchored regex. Metacharacters other
/// than `*` are literal.
fn compile_pattern(pattern: &str, insensitive: bool) -> Result<Regex, Error> {
    let expr = format!("^{}$", regex::escape(pattern).replace("\\*", ".*"));
    RegexBuilder::new(&expr)
        .case_insensitive(insensitive)
        .build()
        .map_err(|e| Error::invalid_pattern(pattern, e.to_string()))
}
