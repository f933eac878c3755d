//! Entity model and fetch orchestration
//!
//! Environments, Groups and Secrets are typed, identity-keyed data holders
//! fetched from an external provisioning tool. [`Fetcher`] performs
//! cache-checked parallel retrieval; [`EntitySet`] drives the three-phase
//! expansion from target environments to deduplicated groups to matching
//! secrets.

pub mod data;
pub mod entity;
pub mod environment;
pub mod fetcher;
pub mod group;
pub mod identity;
pub mod runner;
pub mod secret;
pub mod set;

pub use data::EntityData;
pub use entity::{Entity, EntityKind, LoadState};
pub use environment::Environment;
pub use fetcher::Fetcher;
pub use group::Group;
pub use identity::Identity;
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
pub use secret::{Secret, SecretScope};
pub use set::{EntitySet, Targets};
