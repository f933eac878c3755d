//! Cache-checked, parallel entity retrieval.

use std::collections::BTreeSet;
use tracing::{debug, warn};

use keysweep_cache::CacheStore;
use keysweep_core::{Result, ToolConfig};

use crate::entity::{Entity, EntityKind, LoadState};
use crate::runner::CommandRunner;
use crate::secret::{Secret, SecretScope};

/// Fetches entities from cache or the external tool.
pub struct Fetcher<'a> {
    cache: &'a CacheStore,
    runner: &'a dyn CommandRunner,
    tool: &'a ToolConfig,
}

impl<'a> Fetcher<'a> {
    pub fn new(cache: &'a CacheStore, runner: &'a dyn CommandRunner, tool: &'a ToolConfig) -> Self {
        Self {
            cache,
            runner,
            tool,
        }
    }

    pub fn cache(&self) -> &CacheStore {
        self.cache
    }

    /// Fetch one entity. Returns `Ok(true)` when the entity ends up loaded,
    /// `Ok(false)` when the external fetch failed; external failures are
    /// logged, never raised, so batch siblings proceed.
    ///
    /// Idempotent: a second call on a loaded entity is a no-op.
    pub fn fetch(&self, entity: &mut dyn Entity) -> Result<bool> {
        if entity.state() == LoadState::Loaded {
            return Ok(true);
        }

        let key = entity.cache_key();
        if let Some(payload) = self.cache.get(&key) {
            match entity.hydrate(&payload) {
                Ok(()) => {
                    debug!(key = %key, "cache hit");
                    entity.set_state(LoadState::Loaded);
                    return Ok(true);
                }
                Err(e) => {
                    debug!(key = %key, error = %e, "stale cached payload, refetching");
                    self.cache.delete(&key);
                }
            }
        }

        entity.set_state(LoadState::Fetching);
        let command = entity.command(self.tool);
        let output = match self.runner.run(&command) {
            Ok(output) => output,
            Err(e) => {
                debug!(key = %key, error = %e, "external command failed");
                entity.set_state(LoadState::Failed);
                return Ok(false);
            }
        };

        if !output.success() || output.stdout.trim().is_empty() {
            debug!(
                key = %key,
                exit_code = ?output.exit_code,
                stderr = %output.stderr.trim(),
                "external fetch failed"
            );
            entity.set_state(LoadState::Failed);
            return Ok(false);
        }

        let payload = match entity.absorb(&output.stdout) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(key = %key, error = %e, "unparseable tool output");
                entity.set_state(LoadState::Failed);
                return Ok(false);
            }
        };
        entity.set_state(LoadState::Loaded);

        if !self.cache.set(&key, &payload, entity.sensitive()) && self.cache.enabled() {
            warn!(key = %key, "failed to cache fetched payload");
        }

        Ok(true)
    }

    /// Fetch every entity concurrently, one worker per entity, with no
    /// ordering guarantee. Each distinct space is pinged exactly once first
    /// to pre-warm the tool's connection. Returns the loaded count.
    pub fn fetch_all<E: Entity>(&self, entities: &mut [E]) -> usize {
        let spaces: BTreeSet<&str> = entities
            .iter()
            .filter(|e| e.state() != LoadState::Loaded)
            .map(|e| e.identity().space.as_str())
            .collect();
        for space in spaces {
            self.ping(space);
        }

        std::thread::scope(|scope| {
            let handles: Vec<_> = entities
                .iter_mut()
                .map(|entity| scope.spawn(move || self.fetch(entity)))
                .collect();
            handles
                .into_iter()
                .filter_map(|handle| handle.join().ok())
                .filter(|loaded| matches!(loaded, Ok(true)))
                .count()
        })
    }

    /// Connection pre-warm; failures are irrelevant to correctness.
    fn ping(&self, space: &str) {
        let command = format!("{} ping -s {}", self.tool.binary, space);
        if let Err(e) = self.runner.run(&command) {
            debug!(space, error = %e, "ping failed");
        }
    }

    /// Invalidate an entity's cache entry and every secret entry keyed
    /// under its identity.
    pub fn purge_entity(&self, entity: &dyn Entity) -> bool {
        let mut ok = self.cache.delete(&entity.cache_key());
        match entity.kind() {
            EntityKind::Environment => {
                ok &= self.cache.purge_logical_prefix(&Secret::owner_prefix(
                    SecretScope::Environment,
                    entity.identity(),
                ));
            }
            EntityKind::Group => {
                ok &= self
                    .cache
                    .purge_logical_prefix(&Secret::owner_prefix(SecretScope::Group, entity.identity()));
            }
            EntityKind::Secret => {}
        }
        ok
    }
}
