//! Tests for loading [`Config`] from files and the environment.

use std::io::Write;

use hoard::{Config, HoardError, Hoard};

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
default_ttl_secs = 600
key_prefix = "svc:"

[memory]
max_entries = 100
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.default_ttl_secs, 600);
    assert_eq!(config.key_prefix, "svc:");
    assert_eq!(config.memory.max_entries, 100);
    assert!(config.memory.tags);
    assert!(config.enabled);
}

#[test]
fn load_missing_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, HoardError::Configuration(_)));
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn load_invalid_file_names_the_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "default_ttl_secs = 0").unwrap();

    let err = Config::load(file.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("default_ttl_secs"));
    assert!(message.contains("(in "));
}

#[test]
fn unknown_keys_are_ignored() {
    let config = Config::from_toml_str("future_option = 1\nenabled = false").unwrap();
    assert!(!config.enabled);
}

#[test]
fn overrides_after_file_load() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "key_prefix = \"file:\"\nstore = \"memory\"").unwrap();

    let config = Config::load(file.path())
        .unwrap()
        .apply_overrides(|var| (var == "HOARD_KEY_PREFIX").then(|| "env:".to_string()))
        .unwrap();
    assert_eq!(config.key_prefix, "env:");
    assert_eq!(config.store.as_deref(), Some("memory"));
}

#[test]
fn loaded_config_drives_the_builder() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "enabled = false\nstore = \"memory\"").unwrap();

    let proxy = Hoard::builder()
        .config(Config::load(file.path()).unwrap())
        .build()
        .unwrap();
    assert!(!proxy.engine().is_enabled());
    assert_eq!(proxy.engine().store().name(), "memory");
}
