//! Tests for bootstrap config discovery and loading
//!
//! Tests that manipulate VH_CONFIG are marked with #[serial] so they never
//! race each other on the process environment.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use vh_common::config::{
    load_or_default, load_toml_config, ConfigFileResolver, PerplexityMode,
    CONFIG_ENV_VAR,
};

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
#[serial]
fn test_resolver_cli_arg_wins() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/vh-from-env.toml");

    let resolver = ConfigFileResolver::new("vh-verify");
    let path = resolver.resolve(Some(PathBuf::from("/tmp/vh-from-cli.toml").as_path()));

    assert_eq!(path, Some(PathBuf::from("/tmp/vh-from-cli.toml")));

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_env_var() {
    env::set_var(CONFIG_ENV_VAR, "/tmp/vh-from-env.toml");

    let resolver = ConfigFileResolver::new("vh-verify");
    assert_eq!(
        resolver.resolve(None),
        Some(PathBuf::from("/tmp/vh-from-env.toml"))
    );

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_resolver_blank_env_var_ignored() {
    env::set_var(CONFIG_ENV_VAR, "   ");

    let resolver = ConfigFileResolver::new("vh-test-module-that-has-no-file");
    assert_eq!(resolver.resolve(None), None);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
fn test_default_path_uses_module_name() {
    let resolver = ConfigFileResolver::new("vh-verify");
    if let Some(path) = resolver.default_path() {
        assert!(path.ends_with("verihealth/vh-verify.toml"));
    }
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
        port = 6000

        [logging]
        level = "debug"

        [verification]
        timeout_seconds = 5
        max_concurrent_claims = 2

        [consensus]
        api_key = "cons-key"
        candidate_limit = 10

        [perplexity]
        api_key = "pplx-key"
        mode = "structured"

        [openai]
        api_key = "oa-key"
        model = "gpt-4o"

        [roster]
        path = "/srv/roster.json"
        "#,
    );

    let config = load_toml_config(file.path()).unwrap();
    assert_eq!(config.port(), 6000);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.verification.timeout_seconds, 5);
    assert_eq!(config.verification.max_concurrent_claims, 2);
    assert_eq!(config.consensus.api_key.as_deref(), Some("cons-key"));
    assert_eq!(config.consensus.candidate_limit, 10);
    assert_eq!(config.perplexity.mode, PerplexityMode::Structured);
    assert_eq!(config.openai.model, "gpt-4o");
    assert_eq!(config.roster.path, Some(PathBuf::from("/srv/roster.json")));
}

#[test]
fn test_load_malformed_config_is_error() {
    let file = write_config("port = \"not a number\"");
    let result = load_toml_config(file.path());
    assert!(matches!(result, Err(vh_common::Error::Parse(_))));
}

#[test]
fn test_load_unreadable_path_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_toml_config(dir.path());
    assert!(matches!(result, Err(vh_common::Error::Config(_))));
}

#[test]
fn test_load_or_default_missing_file() {
    let config = load_or_default(Some(PathBuf::from("/nonexistent/vh.toml").as_path())).unwrap();
    assert_eq!(config.port(), 5780);
    assert!(config.consensus.api_key.is_none());
}

#[test]
fn test_load_or_default_no_path() {
    let config = load_or_default(None).unwrap();
    assert_eq!(config.verification.max_concurrent_claims, 4);
}

#[test]
fn test_load_or_default_broken_file_is_error() {
    let file = write_config("[verification]\ntimeout_seconds = 0\n");
    assert!(load_or_default(Some(file.path())).is_err());
}
