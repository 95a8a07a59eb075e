//! Config file loading: error messages and round-trips through disk.

use std::fs;

use rstest::rstest;
use stencil_core::{ConfigError, Encoding, EngineConfig, FailurePolicy};
use tempfile::TempDir;

#[test]
fn load_missing_file_returns_io_error_with_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("stencil.yaml");
    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("stencil.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("stencil.yaml");
    fs::write(&path, b": : corrupt : yaml : !!!\n  - broken: [unclosed").expect("write");

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("stencil.yaml"));
}

#[test]
fn saved_config_loads_back_identically() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("stencil.yaml");
    let config = EngineConfig {
        debug: true,
        namespaces: vec!["app::views".into()],
        references: vec![],
        encoding: Encoding::Html,
        cache_capacity: Some(64),
        failure_policy: FailurePolicy::Remember,
    };
    fs::write(&path, serde_yaml::to_string(&config).expect("serialize")).expect("write");

    assert_eq!(EngineConfig::load(&path).expect("load"), config);
}

#[rstest]
#[case("failure_policy: retry", FailurePolicy::Retry)]
#[case("failure_policy: remember", FailurePolicy::Remember)]
#[case("debug: false", FailurePolicy::Retry)]
fn failure_policy_parsing(#[case] yaml: &str, #[case] expected: FailurePolicy) {
    let config = EngineConfig::from_yaml_str(yaml).expect("parse");
    assert_eq!(config.failure_policy, expected);
}
