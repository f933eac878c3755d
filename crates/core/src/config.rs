//! Externally supplied configuration
//!
//! These structs are built once by the embedding layer (CLI, tests) and
//! passed by reference to every component that needs them. There is no
//! global instance.

use crate::constants::{DEFAULT_CACHE_PREFIX, DEFAULT_CACHE_TTL_SECS, STATE_DIR_NAME};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Cache layer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether caching is enabled at all; `false` selects the disabled store.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Entry lifetime in seconds.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Directory for the disk backend.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    /// Namespace prefix; bulk operations never cross prefixes.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Connection string for the networked backend. When unset, or when the
    /// connection fails, the disk backend is used.
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Path of the local encryption key file.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
            dir: default_cache_dir(),
            prefix: DEFAULT_CACHE_PREFIX.to_string(),
            redis_url: None,
            key_file: default_key_file(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_ttl() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_prefix() -> String {
    DEFAULT_CACHE_PREFIX.to_string()
}

fn state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATE_DIR_NAME)
}

fn default_cache_dir() -> PathBuf {
    state_dir().join("cache")
}

fn default_key_file() -> PathBuf {
    state_dir().join("secret.key")
}

/// How commands for the external provisioning tool are rendered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Binary name or path of the provisioning tool.
    pub binary: String,
    /// Application scope passed with every command.
    pub application: String,
}

impl ToolConfig {
    pub fn new(binary: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            application: application.into(),
        }
    }
}

/// Operator settings consumed by the entity layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Named group -> environment names belonging to it.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

impl Settings {
    /// All environment names across every group, first occurrence wins.
    pub fn all_environment_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for env_names in self.groups.values() {
            for name in env_names {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }
}
