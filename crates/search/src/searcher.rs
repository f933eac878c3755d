//! Scanning, coloring, and deferred secret resolution.

use parking_lot::Mutex;
use tracing::debug;

use keysweep_entities::{Fetcher, Identity, Secret, SecretScope};

use crate::data::SearchData;
use crate::matcher::match_key_with_case;
use crate::results::{SearchResult, SearchValue, ValueColor};

/// Options for one search call.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub pattern: String,
    pub expose: bool,
    pub insensitive: bool,
}

/// A deferred secret fetch for one Pending result.
struct SecretJob {
    path: String,
    key: String,
    scope: SecretScope,
    owner: Identity,
}

/// Scans one environment's search data and resolves matching secrets.
pub struct KeySearcher<'a> {
    fetcher: &'a Fetcher<'a>,
}

impl<'a> KeySearcher<'a> {
    pub fn new(fetcher: &'a Fetcher<'a>) -> Self {
        Self { fetcher }
    }

    /// Scan configs and both secret key lists for keys matching the
    /// pattern. With `expose`, matching secrets are emitted as Pending and
    /// resolved concurrently before returning; otherwise they are redacted.
    pub fn search(&self, data: &SearchData, opts: &SearchOptions) -> Vec<SearchResult> {
        let mut results = Vec::new();
        let mut jobs = Vec::new();

        self.scan_configs(data, opts, &mut results);
        self.scan_secrets(data, opts, &mut results, &mut jobs);
        self.scan_group_secrets(data, opts, &mut results, &mut jobs);

        if !jobs.is_empty() {
            self.resolve_jobs(jobs, &mut results);
        }

        results
    }

    fn matches(&self, key: &str, opts: &SearchOptions) -> bool {
        match_key_with_case(key, &opts.pattern, opts.insensitive)
    }

    fn scan_configs(&self, data: &SearchData, opts: &SearchOptions, results: &mut Vec<SearchResult>) {
        for (key, value) in &data.configs {
            if !self.matches(key, opts) {
                continue;
            }
            // No group-side configs section exists, so a config value never
            // has a counterpart to diff against.
            results.push(SearchResult::new(
                format!("configs.{key}"),
                key.clone(),
                SearchValue::Resolved(value.clone()),
                Some(ValueColor::Own),
            ));
        }
    }

    fn scan_secrets(
        &self,
        data: &SearchData,
        opts: &SearchOptions,
        results: &mut Vec<SearchResult>,
        jobs: &mut Vec<SecretJob>,
    ) {
        for key in &data.secret_keys {
            if !self.matches(key, opts) {
                continue;
            }
            let path = format!("secrets.{key}");
            let color = Some(env_secret_color(data, key));

            if opts.expose {
                // Values already resolved during entity loading need no job.
                if let Some(value) = data.secret_values.get(key) {
                    results.push(SearchResult::new(
                        path,
                        key.clone(),
                        SearchValue::Resolved(value.clone()),
                        color,
                    ));
                    continue;
                }
                if let Some(owner) = data.env.clone() {
                    jobs.push(SecretJob {
                        path: path.clone(),
                        key: key.clone(),
                        scope: SecretScope::Environment,
                        owner,
                    });
                    results.push(SearchResult::new(path, key.clone(), SearchValue::Pending, color));
                    continue;
                }
            }
            results.push(SearchResult::new(path, key.clone(), SearchValue::Redacted, color));
        }
    }

    fn scan_group_secrets(
        &self,
        data: &SearchData,
        opts: &SearchOptions,
        results: &mut Vec<SearchResult>,
        jobs: &mut Vec<SecretJob>,
    ) {
        for key in &data.group_secret_keys {
            if !self.matches(key, opts) {
                continue;
            }
            let path = format!("group_secrets.{key}");
            let color = group_secret_color(data, key);

            if opts.expose {
                if let Some(value) = data.group_secret_values.get(key) {
                    results.push(SearchResult::new(
                        path,
                        key.clone(),
                        SearchValue::Resolved(value.clone()),
                        color,
                    ));
                    continue;
                }
                if let Some(owner) = data.group.clone() {
                    jobs.push(SecretJob {
                        path: path.clone(),
                        key: key.clone(),
                        scope: SecretScope::Group,
                        owner,
                    });
                    results.push(SearchResult::new(path, key.clone(), SearchValue::Pending, color));
                    continue;
                }
            }
            results.push(SearchResult::new(path, key.clone(), SearchValue::Redacted, color));
        }
    }

    /// Resolve all jobs concurrently, one worker per job. The lock on the
    /// shared results collection is held only around the in-place patch,
    /// never around the cache or tool round trip.
    fn resolve_jobs(&self, jobs: Vec<SecretJob>, results: &mut Vec<SearchResult>) {
        let results = &Mutex::new(results);
        std::thread::scope(|scope| {
            for job in jobs {
                scope.spawn(move || {
                    let value = self.resolve_one(&job);
                    let patched = match value {
                        Some(value) => SearchValue::Resolved(value),
                        None => {
                            debug!(key = %job.key, "secret resolution failed");
                            SearchValue::Redacted
                        }
                    };

                    let mut guard = results.lock();
                    for result in guard.iter_mut() {
                        if result.path == job.path
                            && result.key == job.key
                            && result.value == SearchValue::Pending
                        {
                            result.value = patched.clone();
                        }
                    }
                });
            }
        });
    }

    /// Cache-checked fetch of one secret through the entity contract.
    fn resolve_one(&self, job: &SecretJob) -> Option<String> {
        let mut secret = Secret::new(job.key.clone(), job.scope, job.owner.clone());
        match self.fetcher.fetch(&mut secret) {
            Ok(true) => secret.take_value(),
            _ => None,
        }
    }
}

/// Environment-scope coloring: diff against the group's value for the same
/// key. Without a counterpart the value is the environment's own.
fn env_secret_color(data: &SearchData, key: &str) -> ValueColor {
    let Some(group_value) = data.group_secret_values.get(key) else {
        return ValueColor::Own;
    };
    match data.secret_values.get(key) {
        Some(env_value) if env_value == group_value => ValueColor::Inherited,
        _ => ValueColor::Overridden,
    }
}

/// Group-scope coloring: when the environment defines the same key at its
/// own scope, the environment's entry already represents it and this one
/// gets no color. Listing the key is enough; its value need not have been
/// resolved.
fn group_secret_color(data: &SearchData, key: &str) -> Option<ValueColor> {
    let overridden =
        data.secret_keys.iter().any(|k| k == key) || data.secret_values.contains_key(key);
    if overridden {
        None
    } else {
        Some(ValueColor::FromGroup)
    }
}
