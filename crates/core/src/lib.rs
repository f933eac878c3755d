//! Shared types for keysweep
//!
//! This crate provides the error taxonomy, the `Result` alias, and the
//! externally supplied configuration consumed by the cache and fetch layers.

pub mod config;
pub mod constants;
pub mod errors;

pub use config::{CacheConfig, Settings, ToolConfig};
pub use errors::{Error, Result};
