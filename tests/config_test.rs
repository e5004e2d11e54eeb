//! Integration tests for Settings config loading with layered merge semantics.
//!
//! These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;

use tempfile::TempDir;

use taxon::config::{local_config_path, Settings};
use taxon::domain::BuildPolicy;

#[test]
fn given_no_local_config_when_load_file_missing_then_config_error() {
    let dir = TempDir::new().unwrap();
    let result = Settings::load_file(&dir.path().join("absent.toml"));
    assert!(result.is_err());
}

#[test]
fn given_local_config_when_load_file_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = local_config_path(dir.path());
    fs::write(
        &path,
        r#"
policy = "strict"
base_path = "api/"

[fields]
id = "code"
parent = "parentCode"
"#,
    )
    .unwrap();

    let settings = Settings::load_file(&path).expect("load settings");

    assert_eq!(settings.policy, BuildPolicy::Strict);
    assert_eq!(settings.base_path, "api/");
    assert_eq!(settings.fields.id, "code");
    assert_eq!(settings.fields.parent, "parentCode");
    assert_eq!(settings.fields.label, "name", "unset field keeps default");
    assert_eq!(settings.catalog_dir, None);
}

#[test]
fn given_tilde_catalog_dir_when_load_file_then_expanded() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxon.toml");
    fs::write(&path, "catalog_dir = \"~/mirror\"\n").unwrap();

    let settings = Settings::load_file(&path).expect("load settings");

    let catalog_dir = settings.catalog_dir.expect("catalog_dir set");
    assert!(!catalog_dir.to_string_lossy().starts_with('~'));
    assert!(catalog_dir.ends_with("mirror"));
}

#[test]
fn given_invalid_policy_when_load_file_then_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxon.toml");
    fs::write(&path, "policy = \"loose\"\n").unwrap();

    assert!(Settings::load_file(&path).is_err());
}

#[test]
fn given_malformed_toml_when_load_file_then_error_names_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taxon.toml");
    fs::write(&path, "policy = [\n").unwrap();

    let err = Settings::load_file(&path).unwrap_err();
    assert!(err.to_string().contains("taxon.toml"));
}

#[test]
fn given_settings_when_resolving_catalog_dir_then_falls_back() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::default();
    assert_eq!(settings.catalog_dir_or(dir.path()), dir.path());

    let settings = Settings {
        catalog_dir: Some("/srv/catalog".into()),
        ..Settings::default()
    };
    assert_eq!(
        settings.catalog_dir_or(dir.path()),
        std::path::PathBuf::from("/srv/catalog")
    );
}
