//! Environment entity.

use keysweep_core::{Result, ToolConfig};

use crate::data::EntityData;
use crate::entity::{Entity, EntityKind, LoadState};
use crate::identity::Identity;

/// A deployable environment. May reference a [`crate::Group`] by name,
/// resolved against the entity set after load.
#[derive(Debug, Clone)]
pub struct Environment {
    identity: Identity,
    state: LoadState,
    data: Option<EntityData>,
}

impl Environment {
    /// Create an unloaded environment, inferring space and region from the
    /// name.
    pub fn new(name: impl Into<String>, application: impl Into<String>) -> Self {
        Self::with_identity(Identity::for_environment(name, application))
    }

    pub fn with_identity(identity: Identity) -> Self {
        Self {
            identity,
            state: LoadState::Unloaded,
            data: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn data(&self) -> Option<&EntityData> {
        self.data.as_ref()
    }

    pub fn group_name(&self) -> Option<&str> {
        self.data.as_ref()?.group.as_deref()
    }

    /// Identity of the group this environment references, if any. The group
    /// shares the environment's space, region and application.
    pub fn group_identity(&self) -> Option<Identity> {
        let group_name = self.group_name()?;
        Some(Identity::new(
            group_name,
            self.identity.space.clone(),
            self.identity.region.clone(),
            self.identity.application.clone(),
        ))
    }
}

impl Entity for Environment {
    fn kind(&self) -> EntityKind {
        EntityKind::Environment
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn state(&self) -> LoadState {
        self.state
    }

    fn set_state(&mut self, state: LoadState) {
        self.state = state;
    }

    fn command(&self, tool: &ToolConfig) -> String {
        let mut cmd = format!(
            "{} view -s {} -e {} -a {}",
            tool.binary, self.identity.space, self.identity.name, tool.application
        );
        if let Some(region) = &self.identity.region {
            cmd.push_str(&format!(" -r {region}"));
        }
        cmd
    }

    fn absorb(&mut self, stdout: &str) -> Result<String> {
        let data = EntityData::from_yaml(stdout)?;
        let payload = serde_json::to_string(&data)?;
        self.data = Some(data);
        Ok(payload)
    }

    fn hydrate(&mut self, payload: &str) -> Result<()> {
        self.data = Some(serde_json::from_str(payload)?);
        Ok(())
    }

    fn sensitive(&self) -> bool {
        self.data
            .as_ref()
            .map(EntityData::has_secret_keys)
            .unwrap_or(false)
    }

    fn cache_key(&self) -> String {
        format!("environment:{}", self.identity.segments())
    }

    fn matched_secret_keys(&self, matches: &dyn Fn(&str) -> bool) -> Result<Vec<String>> {
        let Some(data) = &self.data else {
            return Ok(Vec::new());
        };
        Ok(data
            .secret_keys
            .iter()
            .filter(|key| matches(key))
            .cloned()
            .collect())
    }
}
