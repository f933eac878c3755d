//! Secret entity, owned by exactly one Environment or Group.

use keysweep_core::{Error, Result, ToolConfig};

use crate::entity::{Entity, EntityKind, LoadState};
use crate::identity::Identity;

/// Which scope a secret is defined at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecretScope {
    Environment,
    Group,
}

impl SecretScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecretScope::Environment => "env",
            SecretScope::Group => "group",
        }
    }
}

/// A single secret value. The cache key embeds the owner's identity so
/// environment-scoped and group-scoped secrets of the same name stay
/// distinct.
#[derive(Debug, Clone)]
pub struct Secret {
    identity: Identity,
    owner: Identity,
    scope: SecretScope,
    state: LoadState,
    value: Option<String>,
}

impl Secret {
    pub fn new(key: impl Into<String>, scope: SecretScope, owner: Identity) -> Self {
        let key = key.into();
        let identity = Identity::new(
            key,
            owner.space.clone(),
            owner.region.clone(),
            owner.application.clone(),
        );
        Self {
            identity,
            owner,
            scope,
            state: LoadState::Unloaded,
            value: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.identity.name
    }

    pub fn scope(&self) -> SecretScope {
        self.scope
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn take_value(self) -> Option<String> {
        self.value
    }

    /// `KEY=value` output parsing: the trimmed text after the first `=`,
    /// or the raw trimmed text when no `=` is present.
    pub fn parse_value(raw: &str) -> String {
        match raw.split_once('=') {
            Some((_, value)) => value.trim().to_string(),
            None => raw.trim().to_string(),
        }
    }

    /// Logical cache key prefix covering every secret under `owner` at
    /// `scope`; used for purges.
    pub fn owner_prefix(scope: SecretScope, owner: &Identity) -> String {
        format!("secret:{}:{}:", scope.as_str(), owner.segments())
    }
}

impl Entity for Secret {
    fn kind(&self) -> EntityKind {
        EntityKind::Secret
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
        let scope_flag = match self.scope {
            SecretScope::Environment => "-e",
            SecretScope::Group => "-g",
        };
        let mut cmd = format!(
            "{} secret get {} -s {} -a {} {} {}",
            tool.binary,
            self.identity.name,
            self.owner.space,
            tool.application,
            scope_flag,
            self.owner.name
        );
        if let Some(region) = &self.owner.region {
            cmd.push_str(&format!(" -r {region}"));
        }
        cmd
    }

    fn absorb(&mut self, stdout: &str) -> Result<String> {
        let value = Self::parse_value(stdout);
        self.value = Some(value.clone());
        Ok(value)
    }

    fn hydrate(&mut self, payload: &str) -> Result<()> {
        self.value = Some(payload.to_string());
        Ok(())
    }

    fn sensitive(&self) -> bool {
        true
    }

    fn cache_key(&self) -> String {
        format!(
            "{}{}",
            Self::owner_prefix(self.scope, &self.owner),
            self.identity.name
        )
    }

    fn matched_secret_keys(&self, _matches: &dyn Fn(&str) -> bool) -> Result<Vec<String>> {
        Err(Error::unsupported_entity("secret", "matched_secret_keys"))
    }
}
