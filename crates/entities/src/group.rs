//! Group entity, shareable by multiple environments.

use keysweep_core::{Result, ToolConfig};

use crate::data::EntityData;
use crate::entity::{Entity, EntityKind, LoadState};
use crate::identity::Identity;

/// A configuration group. Two environments referencing the identical group
/// identity tuple resolve to one `Group` instance and one fetch.
#[derive(Debug, Clone)]
pub struct Group {
    identity: Identity,
    state: LoadState,
    data: Option<EntityData>,
}

impl Group {
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
}

impl Entity for Group {
    fn kind(&self) -> EntityKind {
        EntityKind::Group
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
            "{} view -s {} -a {} -g {}",
            tool.binary, self.identity.space, tool.application, self.identity.name
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
        format!("group:{}", self.identity.segments())
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
