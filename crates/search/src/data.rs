//! Per-environment search input assembled from loaded entities.

use std::collections::BTreeMap;

use keysweep_entities::{Entity, EntitySet, Environment, Identity, SecretScope};

/// Everything `search` needs for one environment: its configs, the secret
/// key lists of both scopes, resolved secret values (when exposure fetched
/// them), and the identities secret jobs are keyed under.
#[derive(Debug, Clone, Default)]
pub struct SearchData {
    pub env: Option<Identity>,
    pub group: Option<Identity>,
    pub configs: BTreeMap<String, String>,
    pub secret_keys: Vec<String>,
    pub group_secret_keys: Vec<String>,
    pub secret_values: BTreeMap<String, String>,
    pub group_secret_values: BTreeMap<String, String>,
}

impl SearchData {
    /// Assemble search data for one loaded environment of an entity set.
    pub fn from_entity_set(set: &EntitySet, env: &Environment) -> Self {
        let mut data = SearchData {
            env: Some(env.identity().clone()),
            ..SearchData::default()
        };

        if let Some(env_data) = env.data() {
            data.configs = env_data.configs.clone();
            data.secret_keys = env_data.secret_keys.clone();
            data.group_secret_keys = env_data.group_secret_keys.clone();
        }
        data.secret_values = set.resolved_secret_values(SecretScope::Environment, env.identity());

        if let Some(group) = set.group_for(env) {
            data.group = Some(group.identity().clone());
            // The group's own key list is authoritative when it loaded.
            if let Some(group_data) = group.data() {
                data.group_secret_keys = group_data.secret_keys.clone();
            }
            data.group_secret_values =
                set.resolved_secret_values(SecretScope::Group, group.identity());
        }

        data
    }
}
