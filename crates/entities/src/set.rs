//! Three-phase expansion: environments, deduplicated groups, matching
//! secrets.

use std::collections::BTreeMap;
use std::collections::HashSet;
use tracing::debug;

use keysweep_core::{Error, Result, Settings};

use crate::entity::{Entity, LoadState};
use crate::environment::Environment;
use crate::fetcher::Fetcher;
use crate::group::Group;
use crate::identity::Identity;
use crate::secret::{Secret, SecretScope};

/// Which environments a run targets.
#[derive(Debug, Clone)]
pub enum Targets {
    /// Explicit environment names.
    Environments(Vec<String>),
    /// Every environment of a named group from the settings.
    Group(String),
    /// Every environment any settings group names.
    All,
}

impl Targets {
    /// Resolve to a deduplicated list of environment names.
    pub fn resolve(&self, settings: &Settings) -> Result<Vec<String>> {
        match self {
            Targets::Environments(names) => {
                let mut seen = Vec::new();
                for name in names {
                    if !seen.contains(name) {
                        seen.push(name.clone());
                    }
                }
                Ok(seen)
            }
            Targets::Group(group_name) => settings
                .groups
                .get(group_name)
                .cloned()
                .ok_or_else(|| Error::configuration(format!("unknown group: {group_name}"))),
            Targets::All => Ok(settings.all_environment_names()),
        }
    }
}

/// The entities a run operates on.
pub struct EntitySet {
    environments: Vec<Environment>,
    groups: Vec<Group>,
    secrets: Vec<Secret>,
}

impl EntitySet {
    /// Instantiate unloaded environments for the resolved target names.
    pub fn new(
        settings: &Settings,
        targets: &Targets,
        application: impl Into<String>,
    ) -> Result<Self> {
        let application = application.into();
        let environments = targets
            .resolve(settings)?
            .into_iter()
            .map(|name| Environment::new(name, application.clone()))
            .collect();
        Ok(Self {
            environments,
            groups: Vec::new(),
            secrets: Vec::new(),
        })
    }

    pub fn environments(&self) -> &[Environment] {
        &self.environments
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn secrets(&self) -> &[Secret] {
        &self.secrets
    }

    /// Loaded environments only; failed ones are excluded from output.
    pub fn loaded_environments(&self) -> impl Iterator<Item = &Environment> {
        self.environments
            .iter()
            .filter(|env| env.state() == LoadState::Loaded)
    }

    /// Canonical identity lookup for groups.
    pub fn find_group(&self, identity: &Identity) -> Option<&Group> {
        self.groups.iter().find(|group| group.identity() == identity)
    }

    /// The group an environment references, if it loaded.
    pub fn group_for(&self, env: &Environment) -> Option<&Group> {
        let identity = env.group_identity()?;
        self.find_group(&identity)
            .filter(|group| group.state() == LoadState::Loaded)
    }

    /// Resolved secret values for one owner at one scope, keyed by secret
    /// name.
    pub fn resolved_secret_values(
        &self,
        scope: SecretScope,
        owner: &Identity,
    ) -> BTreeMap<String, String> {
        self.secrets
            .iter()
            .filter(|secret| secret.scope() == scope && secret.owner() == owner)
            .filter_map(|secret| {
                secret
                    .value()
                    .map(|value| (secret.key().to_string(), value.to_string()))
            })
            .collect()
    }

    /// Run the three-phase expansion. `secret_matcher` is the active search
    /// pattern as a key predicate; when absent, phase 3 is skipped and no
    /// secret values are resolved.
    pub fn load(
        &mut self,
        fetcher: &Fetcher<'_>,
        secret_matcher: Option<&(dyn Fn(&str) -> bool + Sync)>,
    ) -> Result<()> {
        // Phase 1: environments.
        let loaded = fetcher.fetch_all(&mut self.environments);
        debug!(
            loaded,
            total = self.environments.len(),
            "environments fetched"
        );

        // Phase 2: distinct group identities from loaded environments.
        let mut wanted: HashSet<Identity> = HashSet::new();
        for env in self.loaded_environments() {
            if let Some(identity) = env.group_identity() {
                if self.find_group(&identity).is_none() {
                    wanted.insert(identity);
                }
            }
        }
        self.groups
            .extend(wanted.into_iter().map(Group::with_identity));
        let loaded = fetcher.fetch_all(&mut self.groups);
        debug!(loaded, total = self.groups.len(), "groups fetched");

        // Phase 3: matching secrets of every loaded entity.
        let Some(matches) = secret_matcher else {
            return Ok(());
        };

        let mut secrets = Vec::new();
        for env in &self.environments {
            if env.state() != LoadState::Loaded {
                continue;
            }
            for key in env.matched_secret_keys(matches)? {
                secrets.push(Secret::new(
                    key,
                    SecretScope::Environment,
                    env.identity().clone(),
                ));
            }
        }
        for group in &self.groups {
            if group.state() != LoadState::Loaded {
                continue;
            }
            for key in group.matched_secret_keys(matches)? {
                secrets.push(Secret::new(key, SecretScope::Group, group.identity().clone()));
            }
        }
        self.secrets = secrets;
        let loaded = fetcher.fetch_all(&mut self.secrets);
        debug!(loaded, total = self.secrets.len(), "secrets resolved");

        Ok(())
    }
}
