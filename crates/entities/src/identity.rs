//! Entity identity and name-based scope inference.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Identity of an entity within the provisioning tool.
///
/// This is the single canonical equality used for dedup and lookup:
/// two entities are the same iff every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub space: String,
    pub region: Option<String>,
    pub application: String,
}

impl Identity {
    pub fn new(
        name: impl Into<String>,
        space: impl Into<String>,
        region: Option<String>,
        application: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            space: space.into(),
            region,
            application: application.into(),
        }
    }

    /// Build an environment identity, inferring space and region from the
    /// environment name.
    pub fn for_environment(name: impl Into<String>, application: impl Into<String>) -> Self {
        let name = name.into();
        let space = infer_space(&name);
        let region = infer_region(&name);
        Self {
            name,
            space,
            region,
            application: application.into(),
        }
    }

    /// Colon-joined key segments (`name:space:region:application`), with an
    /// empty segment for an absent region.
    pub fn segments(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.name,
            self.space,
            self.region.as_deref().unwrap_or(""),
            self.application
        )
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments())
    }
}

/// Production-like environments share the `prod` space; everything else
/// lives in a space named after itself.
pub fn infer_space(name: &str) -> String {
    if name.starts_with("prod") || name.starts_with("staging") {
        "prod".to_string()
    } else {
        name.to_string()
    }
}

/// Region from a trailing shard number: 1-99 us-east, 101-199 eu-central,
/// 201-299 ap-southeast.
pub fn infer_region(name: &str) -> Option<String> {
    static SHARD: OnceLock<Regex> = OnceLock::new();
    let re = SHARD.get_or_init(|| Regex::new(r"s(\d+)$").expect("static regex"));

    let captures = re.captures(name)?;
    let num: u32 = captures[1].parse().ok()?;
    let region = match num {
        1..=99 => "use1",
        101..=199 => "euc1",
        201..=299 => "apse2",
        _ => return None,
    };
    Some(region.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prod_and_staging_share_prod_space() {
        assert_eq!(infer_space("prod"), "prod");
        assert_eq!(infer_space("prods42"), "prod");
        assert_eq!(infer_space("staging"), "prod");
        assert_eq!(infer_space("dev"), "dev");
    }

    #[test]
    fn region_comes_from_shard_number() {
        assert_eq!(infer_region("prods1").as_deref(), Some("use1"));
        assert_eq!(infer_region("prods99").as_deref(), Some("use1"));
        assert_eq!(infer_region("prods101").as_deref(), Some("euc1"));
        assert_eq!(infer_region("prods250").as_deref(), Some("apse2"));
        assert_eq!(infer_region("prods100"), None);
        assert_eq!(infer_region("prod"), None);
        assert_eq!(infer_region("s5suffix"), None);
    }

    #[test]
    fn segments_use_empty_region_slot() {
        let id = Identity::for_environment("dev", "app");
        assert_eq!(id.segments(), "dev:dev::app");

        let id = Identity::for_environment("prods101", "app");
        assert_eq!(id.segments(), "prods101:prod:euc1:app");
    }

    #[test]
    fn identity_equality_covers_all_fields() {
        let a = Identity::new("g", "prod", Some("use1".into()), "app");
        let b = Identity::new("g", "prod", Some("use1".into()), "app");
        let c = Identity::new("g", "prod", None, "app");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
