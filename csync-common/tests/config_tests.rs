//! Configuration resolution tests
//!
//! Tests that touch CSYNC_ROOT_FOLDER / CSYNC_CONFIG are marked #[serial]
//! so environment mutations do not race.

use csync_common::config::{
    default_root_folder, load_config_or_default, load_toml_file, LoggingConfig,
    RootFolderInitializer, RootFolderResolver, CONFIG_PATH_ENV, ROOT_FOLDER_ENV,
};
use csync_common::Error;
use serde::Deserialize;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[derive(Debug, Default, Deserialize)]
struct SampleConfig {
    #[serde(default)]
    port: Option<u16>,
    #[serde(default)]
    logging: LoggingConfig,
}

#[test]
#[serial]
fn test_resolver_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/csync-env-root");

    let resolver = RootFolderResolver::new(
        Some(PathBuf::from("/tmp/csync-cli-root")),
        Some(PathBuf::from("/tmp/csync-toml-root")),
    );
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/csync-cli-root"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/csync-env-root");

    let resolver = RootFolderResolver::new(None, Some(PathBuf::from("/tmp/csync-toml-root")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/csync-env-root"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_falls_back_to_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new(None, Some(PathBuf::from("/tmp/csync-toml-root")));
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/csync-toml-root"));

    let resolver = RootFolderResolver::new(None, None);
    assert_eq!(resolver.resolve(), default_root_folder());
}

#[test]
fn test_initializer_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("csync-root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("csync.db"));
    assert_eq!(initializer.objects_path(), root.join("objects"));
}

#[test]
fn test_load_toml_file_parses_sections() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("csync-cut.toml");
    std::fs::write(&path, "port = 6001\n[logging]\nlevel = \"debug\"\n").unwrap();

    let config: SampleConfig = load_toml_file(&path).unwrap();
    assert_eq!(config.port, Some(6001));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_load_toml_file_reports_parse_errors() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "port = [not toml").unwrap();

    let err = load_toml_file::<SampleConfig>(&path).unwrap_err();
    assert!(matches!(err, Error::ConfigParse { path: ref p, .. } if *p == path));
    assert!(err.to_string().starts_with("Invalid config file"));
}

#[test]
#[serial]
fn test_missing_explicit_config_is_an_error() {
    env::remove_var(CONFIG_PATH_ENV);
    let missing = PathBuf::from("/nonexistent/csync-cut.toml");

    let result = load_config_or_default::<SampleConfig>(Some(&missing), "csync-cut");
    assert!(matches!(result, Err(Error::ConfigMissing(p)) if p == missing));
}

#[test]
#[serial]
fn test_missing_env_config_uses_defaults() {
    env::set_var(CONFIG_PATH_ENV, "/nonexistent/from-env.toml");

    let config = load_config_or_default::<SampleConfig>(None, "csync-cut").unwrap();
    assert_eq!(config.port, None);
    assert_eq!(config.logging, LoggingConfig::default());

    env::remove_var(CONFIG_PATH_ENV);
}
