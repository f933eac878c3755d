//! Key search across entity scopes
//!
//! Glob/exact key matching over an environment's configs and secret key
//! lists, deferred secret-job batching resolved by concurrent workers, and
//! diff-based coloring of results against the counterpart scope.

pub mod data;
pub mod matcher;
pub mod results;
pub mod searcher;

pub use data::SearchData;
pub use matcher::{match_key, match_key_with_case};
pub use results::{SearchResult, SearchValue, ValueColor};
pub use searcher::{KeySearcher, SearchOptions};
