//! The fetchable-entity contract.

use keysweep_core::{Result, ToolConfig};

use crate::identity::Identity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Environment,
    Group,
    Secret,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Environment => "environment",
            EntityKind::Group => "group",
            EntityKind::Secret => "secret",
        }
    }
}

/// Entity lifecycle. `fetch` moves an entity from `Unloaded` through
/// `Fetching` to `Loaded` or `Failed`; a loaded entity is never re-fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Unloaded,
    Fetching,
    Loaded,
    Failed,
}

/// A named, typed domain object with an externally fetchable representation.
pub trait Entity: Send {
    fn kind(&self) -> EntityKind;
    fn identity(&self) -> &Identity;
    fn state(&self) -> LoadState;
    fn set_state(&mut self, state: LoadState);

    /// Command line retrieving this entity's data from the provisioning
    /// tool.
    fn command(&self, tool: &ToolConfig) -> String;

    /// Parse raw tool output, populate this entity, and return the
    /// cacheable payload.
    fn absorb(&mut self, stdout: &str) -> Result<String>;

    /// Re-populate from a cached payload, re-deriving secondary state.
    fn hydrate(&mut self, payload: &str) -> Result<()>;

    /// Whether the cacheable payload must be encrypted at rest.
    fn sensitive(&self) -> bool;

    /// Logical cache key (`kind:name:space:region:application`; secrets
    /// embed their owner's identity).
    fn cache_key(&self) -> String;

    /// Secret key names at this entity's own scope matching a predicate.
    ///
    /// Only Environments and Groups own secret key lists; calling this on
    /// a Secret is a programmer error.
    fn matched_secret_keys(&self, matches: &dyn Fn(&str) -> bool) -> Result<Vec<String>>;
}
