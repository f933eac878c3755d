//! End-to-end search over fake tool responses.

use parking_lot::Mutex;
use std::collections::HashMap;

use keysweep_cache::CacheStore;
use keysweep_core::{Result, Settings, ToolConfig};
use keysweep_entities::{CommandOutput, CommandRunner, EntitySet, Fetcher, Identity, Targets};
use keysweep_search::{KeySearcher, SearchData, SearchOptions, SearchResult, SearchValue, ValueColor};

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

    fn count_matching(&self, needle: &str) -> usize {
        self.log.lock().iter().filter(|c| c.contains(needle)).count()
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

fn env_identity() -> Identity {
    Identity::new("prods1", "prod", Some("use1".into()), "app")
}

fn opts(pattern: &str, expose: bool, insensitive: bool) -> SearchOptions {
    SearchOptions {
        pattern: pattern.to_string(),
        expose,
        insensitive,
    }
}

fn find<'a>(results: &'a [SearchResult], path: &str) -> &'a SearchResult {
    results
        .iter()
        .find(|r| r.path == path)
        .unwrap_or_else(|| panic!("missing result {path}"))
}

#[test]
fn exposed_secrets_resolve_concurrently_with_none_left_pending() {
    let mut runner = FakeRunner::new();
    let mut data = SearchData {
        env: Some(env_identity()),
        ..SearchData::default()
    };
    for i in 0..8 {
        data.secret_keys.push(format!("TOK_{i}"));
        runner = runner.respond(
            &format!("provis secret get TOK_{i} -s prod -a app -e prods1 -r use1"),
            &format!("TOK_{i} = value-{i}\n"),
        );
    }
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let results = KeySearcher::new(&fetcher).search(&data, &opts("*", true, false));

    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r.value != SearchValue::Pending));
    for i in 0..8 {
        let result = find(&results, &format!("secrets.TOK_{i}"));
        assert_eq!(result.value, SearchValue::Resolved(format!("value-{i}")));
    }
    assert_eq!(runner.count_matching(" secret get "), 8);
}

#[test]
fn suffix_pattern_is_exact_about_case_and_shape() {
    let mut data = SearchData {
        env: Some(env_identity()),
        ..SearchData::default()
    };
    data.configs.insert("TIMEOUT".into(), "30".into());
    data.secret_keys.push("API_TOKEN".into());
    data.secret_keys.push("api_token_old".into());

    let runner = FakeRunner::new();
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let results = KeySearcher::new(&fetcher).search(&data, &opts("*_TOKEN", false, false));

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].key, "API_TOKEN");
    assert_eq!(results[0].path, "secrets.API_TOKEN");
}

#[test]
fn secrets_are_redacted_without_expose() {
    let mut data = SearchData {
        env: Some(env_identity()),
        ..SearchData::default()
    };
    data.secret_keys.push("API_TOKEN".into());

    let runner = FakeRunner::new();
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let results = KeySearcher::new(&fetcher).search(&data, &opts("API_TOKEN", false, false));

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value, SearchValue::Redacted);
    assert_eq!(results[0].value.to_string(), "{SECRET}");
    // No tool traffic when nothing is exposed.
    assert_eq!(runner.count_matching("provis"), 0);
}

#[test]
fn group_secrets_are_colored_or_suppressed_by_environment_override() {
    let mut data = SearchData {
        env: Some(env_identity()),
        group: Some(Identity::new("shared", "prod", Some("use1".into()), "app")),
        ..SearchData::default()
    };
    data.group_secret_keys.push("SHARED_TOKEN".into());
    data.group_secret_keys.push("OVERRIDDEN_TOKEN".into());
    data.secret_keys.push("OVERRIDDEN_TOKEN".into());
    data.secret_values
        .insert("OVERRIDDEN_TOKEN".into(), "env-wins".into());
    // Listed at env scope but never resolved (redacted search).
    data.group_secret_keys.push("UNRESOLVED_TOKEN".into());
    data.secret_keys.push("UNRESOLVED_TOKEN".into());

    let runner = FakeRunner::new();
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let results = KeySearcher::new(&fetcher).search(&data, &opts("*", false, false));

    let shared = find(&results, "group_secrets.SHARED_TOKEN");
    assert_eq!(shared.color, Some(ValueColor::FromGroup));

    let overridden = find(&results, "group_secrets.OVERRIDDEN_TOKEN");
    assert_eq!(overridden.color, None);

    // The env row exists (redacted), so the group row stays uncolored even
    // though no value was resolved.
    assert_eq!(
        find(&results, "secrets.UNRESOLVED_TOKEN").value,
        SearchValue::Redacted
    );
    assert_eq!(find(&results, "group_secrets.UNRESOLVED_TOKEN").color, None);
}

#[test]
fn environment_values_are_diffed_against_the_group() {
    let mut data = SearchData {
        env: Some(env_identity()),
        ..SearchData::default()
    };
    data.secret_keys
        .extend(["OWN_KEY", "SAME_KEY", "DIFF_KEY"].map(String::from));
    data.secret_values.insert("OWN_KEY".into(), "a".into());
    data.secret_values.insert("SAME_KEY".into(), "b".into());
    data.secret_values.insert("DIFF_KEY".into(), "c".into());
    data.group_secret_values.insert("SAME_KEY".into(), "b".into());
    data.group_secret_values.insert("DIFF_KEY".into(), "x".into());

    let runner = FakeRunner::new();
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let results = KeySearcher::new(&fetcher).search(&data, &opts("*_KEY", true, false));

    assert_eq!(find(&results, "secrets.OWN_KEY").color, Some(ValueColor::Own));
    assert_eq!(
        find(&results, "secrets.SAME_KEY").color,
        Some(ValueColor::Inherited)
    );
    assert_eq!(
        find(&results, "secrets.DIFF_KEY").color,
        Some(ValueColor::Overridden)
    );
    // Pre-resolved values are reused, never refetched.
    assert_eq!(runner.count_matching(" secret get "), 0);
    assert_eq!(
        find(&results, "secrets.OWN_KEY").value,
        SearchValue::Resolved("a".into())
    );
}

#[test]
fn failed_resolution_falls_back_to_redacted() {
    let mut data = SearchData {
        env: Some(env_identity()),
        ..SearchData::default()
    };
    data.secret_keys.push("MISSING".into());

    let runner = FakeRunner::new();
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let results = KeySearcher::new(&fetcher).search(&data, &opts("MISSING", true, false));

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].value, SearchValue::Redacted);
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
secrets:
  keys: [SHARED_TOKEN]
";

#[test]
fn full_pipeline_from_entity_set_to_results() {
    let runner = FakeRunner::new()
        .respond("provis view -s prod -e prods1 -a app -r use1", ENV_YAML)
        .respond("provis view -s prod -a app -g shared -r use1", GROUP_YAML)
        .respond(
            "provis secret get API_TOKEN -s prod -a app -e prods1 -r use1",
            "API_TOKEN = env-secret\n",
        )
        .respond(
            "provis secret get SHARED_TOKEN -s prod -a app -g shared -r use1",
            "SHARED_TOKEN = group-secret\n",
        );
    let cache = CacheStore::Disabled;
    let tool = tool();
    let fetcher = Fetcher::new(&cache, &runner, &tool);

    let mut settings = Settings::default();
    settings.groups.insert("blue".into(), vec!["prods1".into()]);
    let mut set =
        EntitySet::new(&settings, &Targets::Environments(vec!["prods1".into()]), "app").unwrap();
    let pattern = opts("*TOKEN", true, false);
    set.load(&fetcher, Some(&|key: &str| {
        keysweep_search::match_key(key, "*TOKEN")
    }))
    .unwrap();

    let env = set.loaded_environments().next().unwrap();
    let data = SearchData::from_entity_set(&set, env);
    let results = KeySearcher::new(&fetcher).search(&data, &pattern);

    assert_eq!(
        find(&results, "secrets.API_TOKEN").value,
        SearchValue::Resolved("env-secret".into())
    );
    assert_eq!(
        find(&results, "group_secrets.SHARED_TOKEN").value,
        SearchValue::Resolved("group-secret".into())
    );
    // Phase-three resolution covered both secrets; search added no fetches.
    assert_eq!(runner.count_matching(" secret get "), 2);
    assert!(results.iter().all(|r| r.value != SearchValue::Pending));
}
