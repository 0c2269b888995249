//! Unit tests for configuration resolution and graceful degradation
//!
//! Covers:
//! - Missing TOML files do not cause failure (defaults + warning)
//! - Priority order for corpus root resolution (CLI → ENV → TOML → default)
//! - Unparsable TOML is reported as a configuration error
//! - Resolution provenance is recorded for logging after subscriber setup
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate CHORDMIND_CORPUS_ROOT or CHORDMIND_CONFIG are marked
//! with #[serial] so they run sequentially.

use chordmind_common::config::{
    ConfigResolver, ConfigSource, CorpusConfig, RootSource, CONFIG_FILE_ENV, CORPUS_ROOT_ENV,
};
use chordmind_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(CORPUS_ROOT_ENV);
    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_missing_config_file_uses_defaults() {
    clear_env();
    let temp = TempDir::new().unwrap();

    let resolver = ConfigResolver::new().with_config_file(Some(temp.path().join("absent.toml")));
    let config = resolver.resolve().unwrap();

    assert_eq!(config, CorpusConfig::default());
}

#[test]
#[serial]
fn test_toml_corpus_root_used_without_overrides() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("corpus.toml");
    fs::write(
        &config_path,
        "corpus_root = \"/srv/rome\"\nworkers = 3\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let config = ConfigResolver::new()
        .with_config_file(Some(config_path))
        .resolve()
        .unwrap();

    assert_eq!(config.corpus_root, PathBuf::from("/srv/rome"));
    assert_eq!(config.workers, 3);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_env_var_overrides_toml() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("corpus.toml");
    fs::write(&config_path, "corpus_root = \"/srv/rome\"\n").unwrap();

    env::set_var(CORPUS_ROOT_ENV, "/tmp/chordmind-env-root");
    let config = ConfigResolver::new()
        .with_config_file(Some(config_path))
        .resolve()
        .unwrap();

    assert_eq!(config.corpus_root, PathBuf::from("/tmp/chordmind-env-root"));
    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env_var() {
    clear_env();
    let temp = TempDir::new().unwrap();

    env::set_var(CORPUS_ROOT_ENV, "/tmp/chordmind-env-root");
    let config = ConfigResolver::new()
        .with_config_file(Some(temp.path().join("absent.toml")))
        .with_corpus_root(Some(PathBuf::from("/tmp/chordmind-cli-root")))
        .resolve()
        .unwrap();

    assert_eq!(config.corpus_root, PathBuf::from("/tmp/chordmind-cli-root"));
    clear_env();
}

#[test]
#[serial]
fn test_config_path_from_env() {
    clear_env();
    env::set_var(CONFIG_FILE_ENV, "/tmp/chordmind-custom.toml");

    let resolver = ConfigResolver::new();
    assert_eq!(
        resolver.config_path(),
        Some(PathBuf::from("/tmp/chordmind-custom.toml"))
    );
    clear_env();
}

#[test]
#[serial]
fn test_unparsable_config_is_error() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("corpus.toml");
    fs::write(&config_path, "corpus_root = [unterminated").unwrap();

    let result = ConfigResolver::new()
        .with_config_file(Some(config_path))
        .resolve();

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("Parse TOML failed")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_resolution_records_missing_file_and_root_source() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let absent = temp.path().join("absent.toml");

    let resolution = ConfigResolver::new()
        .with_config_file(Some(absent.clone()))
        .resolve_detailed()
        .unwrap();
    assert_eq!(resolution.config_source, ConfigSource::Missing(absent));
    assert_eq!(resolution.root_source, RootSource::ConfigOrDefault);
    assert_eq!(resolution.config, CorpusConfig::default());

    env::set_var(CORPUS_ROOT_ENV, "/tmp/chordmind-env-root");
    let resolution = ConfigResolver::new()
        .with_config_file(Some(temp.path().join("absent.toml")))
        .resolve_detailed()
        .unwrap();
    assert_eq!(resolution.root_source, RootSource::Environment);
    clear_env();
}

#[test]
#[serial]
fn test_resolution_records_loaded_file() {
    clear_env();
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("corpus.toml");
    fs::write(&config_path, "workers = 2\n").unwrap();

    let resolution = ConfigResolver::new()
        .with_config_file(Some(config_path.clone()))
        .with_corpus_root(Some(PathBuf::from("/tmp/chordmind-cli-root")))
        .resolve_detailed()
        .unwrap();

    assert_eq!(resolution.config_source, ConfigSource::File(config_path));
    assert_eq!(resolution.root_source, RootSource::CommandLine);
    assert_eq!(resolution.config.workers, 2);
}
