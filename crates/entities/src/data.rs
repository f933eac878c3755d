//! Parsed payload of an Environment or Group.

use keysweep_core::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// The cacheable payload parsed from the provisioning tool's YAML output.
///
/// Secret key lists are placeholders only; resolved secret values are never
/// stored here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    /// Name of the group this environment belongs to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Plain configuration values.
    #[serde(default)]
    pub configs: BTreeMap<String, String>,
    /// Secret key names defined at this entity's own scope.
    #[serde(default)]
    pub secret_keys: Vec<String>,
    /// Secret key names inherited from the group, as reported on an
    /// environment view.
    #[serde(default)]
    pub group_secret_keys: Vec<String>,
}

impl EntityData {
    /// Parse a YAML document of the shape the provisioning tool emits:
    /// `group`, `configs`, `secrets.keys`, `group_secrets.keys`.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(raw)?;
        let mut data = EntityData::default();

        data.group = doc
            .get("group")
            .and_then(Value::as_str)
            .map(str::to_string);

        if let Some(configs) = doc.get("configs").and_then(Value::as_mapping) {
            for (key, value) in configs {
                if let Some(key) = key.as_str() {
                    data.configs.insert(key.to_string(), render_scalar(value));
                }
            }
        }

        data.secret_keys = key_list(doc.get("secrets"));
        data.group_secret_keys = key_list(doc.get("group_secrets"));

        Ok(data)
    }

    /// Whether this payload carries secret key lists and therefore must be
    /// cached as sensitive.
    pub fn has_secret_keys(&self) -> bool {
        !self.secret_keys.is_empty() || !self.group_secret_keys.is_empty()
    }
}

/// The tool emits key lists either as `secrets: {keys: [...]}` or as a bare
/// sequence `secrets: [...]`; both forms are accepted.
fn key_list(section: Option<&Value>) -> Vec<String> {
    let seq = match section {
        Some(Value::Sequence(seq)) => Some(seq),
        Some(other) => other.get("keys").and_then(Value::as_sequence),
        None => None,
    };
    seq.map(|seq| {
        seq.iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Render a YAML scalar the way it appears in output tables.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}
