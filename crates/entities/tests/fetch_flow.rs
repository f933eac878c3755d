//! Fetch orchestration against a recording fake of the external tool.

use parking_lot::Mutex;
use std::collections::HashMap;

use keysweep_cache::CacheStore;
use keysweep_core::{CacheConfig, Result, Settings, ToolConfig};
use keysweep_entities::{
    CommandOutput, CommandRunner, Entity, EntitySet, Environment, Fetcher, LoadState, Secret,
    SecretScope, Targets,
};
use tempfile::TempDir;

struct FakeRunner {
    responses: HashMap<String, (i32, String)>,
    log: Mutex<Vec<String>>,
}

impl FakeRunner {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            log: Mutex::new(Vec::new()),
        }
    }

    fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.responses
            .insert(command.to_string(), (0, stdout.to_string()));
        self
    }

    fn commands(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn count_of(&self, command: &str) -> usize {
        self.log.lock().iter().filter(|c| *c == command).count()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        self.log.lock().push(command.to_string());
        match self.responses.get(command) {
            Some((code, stdout)) => Ok(CommandOutput {
                stdout: stdout.clone(),
                stderr: String::new(),
                exit_code: Some(*code),
            }),
            None if command.contains(" ping ") => Ok(CommandOutput {
                stdout: "pong".to_string(),
                stderr: String::new(),
                exit_code: Some(0),
            }),
            None => Ok(CommandOutput {
                stdout: String::new(),
                stderr: format!("unknown target: {command}"),
                exit_code: Some(1),
            }),
        }
    }
}

fn tool() -> ToolConfig {
    ToolConfig::new("provis", "app")
}

fn disk_store(dir: &TempDir) -> CacheStore {
    CacheStore::from_config(&CacheConfig {
        enabled: true,
        ttl_secs: 3600,
        dir: dir.path().join("cache"),
        prefix: "test".to_string(),
        redis_url: None,
        key_file: dir.path().join("secret.key"),
    })
}

fn settings() -> Settings {
    let mut settings = Settings::default();
    settings
        .groups
        .insert("blue".into(), vec!["prods1".into(), "prods2".into()]);
    settings
}

const ENV_YAML: &str = "\
group: shared
configs:
  database_url: postgres://db/main
secrets:
  keys: [API_TOKEN]
group_secrets:
  keys: [SHARED_TOKEN]
";

const GROUP_YAML: &str = "\
configs:
  region_default: use1
secrets:
  keys: [SHARED_TOKEN]
";

#[test]
fn one_failing_entity_does_not_abort_the_batch() {
    let runner = FakeRunner::new()
        .respond("provis view -s a -e a -a app", "configs:\n  x: '1'\n")
        .respond("provis view -s c -e c -a app", "configs:\n  x: '3'\n");
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let mut envs = vec![
        Environment::new("a", "app"),
        Environment::new("b", "app"),
        Environment::new("c", "app"),
    ];
    let loaded = fetcher.fetch_all(&mut envs);

    assert_eq!(loaded, 2);
    assert_eq!(envs[0].state(), LoadState::Loaded);
    assert_eq!(envs[1].state(), LoadState::Failed);
    assert_eq!(envs[2].state(), LoadState::Loaded);
}

#[test]
fn fetch_is_idempotent_once_loaded() {
    let runner =
        FakeRunner::new().respond("provis view -s a -e a -a app", "configs:\n  x: '1'\n");
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let mut env = Environment::new("a", "app");
    assert!(fetcher.fetch(&mut env).unwrap());
    assert!(fetcher.fetch(&mut env).unwrap());

    assert_eq!(runner.count_of("provis view -s a -e a -a app"), 1);
}

#[test]
fn cache_hit_skips_the_external_tool() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    let runner =
        FakeRunner::new().respond("provis view -s a -e a -a app", "configs:\n  x: '1'\n");
    let tool = tool();
    let fetcher = Fetcher::new(&store, &runner, &tool);

    let mut env = Environment::new("a", "app");
    assert!(fetcher.fetch(&mut env).unwrap());

    // Fresh entity, same identity: must come from cache.
    let mut again = Environment::new("a", "app");
    assert!(fetcher.fetch(&mut again).unwrap());
    assert_eq!(again.data(), env.data());
    assert_eq!(runner.count_of("provis view -s a -e a -a app"), 1);
}

#[test]
fn spaces_are_pinged_once_per_batch() {
    let runner = FakeRunner::new()
        .respond("provis view -s prod -e prods1 -a app -r use1", ENV_YAML)
        .respond("provis view -s prod -e prods2 -a app -r use1", ENV_YAML);
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let mut envs = vec![
        Environment::new("prods1", "app"),
        Environment::new("prods2", "app"),
    ];
    fetcher.fetch_all(&mut envs);

    assert_eq!(runner.count_of("provis ping -s prod"), 1);
}

#[test]
fn shared_group_identity_fetches_once() {
    let runner = FakeRunner::new()
        .respond("provis view -s prod -e prods1 -a app -r use1", ENV_YAML)
        .respond("provis view -s prod -e prods2 -a app -r use1", ENV_YAML)
        .respond("provis view -s prod -a app -g shared -r use1", GROUP_YAML);
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let mut set = EntitySet::new(&settings(), &Targets::Group("blue".into()), "app").unwrap();
    set.load(&fetcher, None).unwrap();

    assert_eq!(set.groups().len(), 1);
    assert_eq!(
        runner.count_of("provis view -s prod -a app -g shared -r use1"),
        1
    );

    // Both environments observe the identical group data.
    let envs: Vec<_> = set.loaded_environments().collect();
    assert_eq!(envs.len(), 2);
    let group_a = set.group_for(envs[0]).unwrap();
    let group_b = set.group_for(envs[1]).unwrap();
    assert_eq!(group_a.data(), group_b.data());
}

#[test]
fn matching_secrets_resolve_in_phase_three() {
    let runner = FakeRunner::new()
        .respond("provis view -s prod -e prods1 -a app -r use1", ENV_YAML)
        .respond("provis view -s prod -e prods2 -a app -r use1", ENV_YAML)
        .respond("provis view -s prod -a app -g shared -r use1", GROUP_YAML)
        .respond(
            "provis secret get API_TOKEN -s prod -a app -e prods1 -r use1",
            "API_TOKEN = env-secret-1\n",
        )
        .respond(
            "provis secret get API_TOKEN -s prod -a app -e prods2 -r use1",
            "API_TOKEN = env-secret-2\n",
        )
        .respond(
            "provis secret get SHARED_TOKEN -s prod -a app -g shared -r use1",
            "SHARED_TOKEN = group-secret\n",
        );
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let mut set = EntitySet::new(&settings(), &Targets::Group("blue".into()), "app").unwrap();
    set.load(&fetcher, Some(&|key: &str| key.ends_with("TOKEN")))
        .unwrap();

    assert_eq!(set.secrets().len(), 3);

    let env1 = set
        .loaded_environments()
        .find(|e| e.name() == "prods1")
        .unwrap();
    let values = set.resolved_secret_values(SecretScope::Environment, env1.identity());
    assert_eq!(values.get("API_TOKEN").map(String::as_str), Some("env-secret-1"));

    let group = set.groups().first().unwrap();
    let values = set.resolved_secret_values(SecretScope::Group, group.identity());
    assert_eq!(
        values.get("SHARED_TOKEN").map(String::as_str),
        Some("group-secret")
    );
}

#[test]
fn purge_entity_invalidates_entity_and_its_secrets() {
    let dir = TempDir::new().unwrap();
    let store = disk_store(&dir);
    let runner = FakeRunner::new()
        .respond("provis view -s prod -e prods1 -a app -r use1", ENV_YAML)
        .respond(
            "provis secret get API_TOKEN -s prod -a app -e prods1 -r use1",
            "API_TOKEN = env-secret-1\n",
        );
    let tool = tool();
    let fetcher = Fetcher::new(&store, &runner, &tool);

    let mut env = Environment::new("prods1", "app");
    assert!(fetcher.fetch(&mut env).unwrap());
    let mut secret = Secret::new("API_TOKEN", SecretScope::Environment, env.identity().clone());
    assert!(fetcher.fetch(&mut secret).unwrap());

    // An unrelated group-scope secret survives the purge.
    store.set("secret:group:shared:prod:use1:app:K", "other", true);

    assert!(fetcher.purge_entity(&env));

    assert_eq!(store.get(&env.cache_key()), None);
    assert_eq!(store.get(&secret.cache_key()), None);
    assert_eq!(
        store.get("secret:group:shared:prod:use1:app:K").as_deref(),
        Some("other")
    );

    // Refetching goes back to the tool.
    let mut again = Environment::new("prods1", "app");
    assert!(fetcher.fetch(&mut again).unwrap());
    assert_eq!(runner.count_of("provis view -s prod -e prods1 -a app -r use1"), 2);
}

#[test]
fn failed_environments_are_excluded_from_output() {
    let runner =
        FakeRunner::new().respond("provis view -s prod -e prods1 -a app -r use1", ENV_YAML);
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let mut set = EntitySet::new(&settings(), &Targets::Group("blue".into()), "app").unwrap();
    set.load(&fetcher, None).unwrap();

    let loaded: Vec<_> = set.loaded_environments().map(Environment::name).collect();
    assert_eq!(loaded, vec!["prods1"]);
    assert!(runner
        .commands()
        .contains(&"provis view -s prod -e prods2 -a app -r use1".to_string()));
}
