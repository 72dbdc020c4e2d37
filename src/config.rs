//! Engine configuration.
//!
//! Configuration is read once and stays immutable for the lifetime of the
//! engine. It can be built in code, parsed from TOML, or loaded from a file:
//!
//! ```toml
//! enabled = true
//! default_ttl_secs = 3600
//! key_prefix = "hoard:"
//! skip_cache_flag = "skip_cache"
//! store = "memory"
//! interpolate_keys = false
//!
//! [memory]
//! max_entries = 10000
//! tags = true
//! ```
//!
//! A few fields can be overridden from the environment afterwards, see
//! [`Config::apply_env_overrides`].

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::MemoryStoreConfig;
use crate::{HoardError, Result};

/// Field name -> environment variable used by [`Config::apply_env_overrides`].
pub const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("enabled", "HOARD_ENABLED"),
    ("default_ttl_secs", "HOARD_DEFAULT_TTL"),
    ("key_prefix", "HOARD_KEY_PREFIX"),
    ("store", "HOARD_STORE"),
];

/// Global caching configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Master switch. When false every call goes straight to the method.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// TTL for policies that do not set one (default: 3600).
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// Prepended to every key, derived or explicit (default: "hoard:").
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Name of the call option that forces a bypass (default: "skip_cache").
    #[serde(default = "default_skip_cache_flag")]
    pub skip_cache_flag: String,
    /// Which registered store to bind to. `None` = the default store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    /// Substitute `{N}` placeholders in explicit keys with argument N.
    #[serde(default)]
    pub interpolate_keys: bool,
    /// Settings for the built-in memory store.
    #[serde(default)]
    pub memory: MemoryStoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            default_ttl_secs: default_ttl_secs(),
            key_prefix: default_key_prefix(),
            skip_cache_flag: default_skip_cache_flag(),
            store: None,
            interpolate_keys: false,
            memory: MemoryStoreConfig::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_key_prefix() -> String {
    "hoard:".to_string()
}

fn default_skip_cache_flag() -> String {
    "skip_cache".to_string()
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn default_ttl(mut self, secs: u64) -> Self {
        self.default_ttl_secs = secs;
        self
    }

    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn skip_cache_flag(mut self, name: impl Into<String>) -> Self {
        self.skip_cache_flag = name.into();
        self
    }

    pub fn store(mut self, name: impl Into<String>) -> Self {
        self.store = Some(name.into());
        self
    }

    pub fn interpolate_keys(mut self, enabled: bool) -> Self {
        self.interpolate_keys = enabled;
        self
    }

    pub fn memory(mut self, memory: MemoryStoreConfig) -> Self {
        self.memory = memory;
        self
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HoardError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            HoardError::Configuration(msg) => {
                HoardError::Configuration(format!("{msg} (in {path:?})"))
            }
            other => other,
        })
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            HoardError::Configuration(format!("Failed to parse config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML, in the format [`from_toml_str`](Self::from_toml_str) reads.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| {
            HoardError::Configuration(format!("Failed to serialize config: {e}"))
        })
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl_secs == 0 {
            return Err(HoardError::Configuration(
                "default_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.skip_cache_flag.is_empty() {
            return Err(HoardError::Configuration(
                "skip_cache_flag must not be empty".to_string(),
            ));
        }
        if self.store.as_deref().is_some_and(str::is_empty) {
            return Err(HoardError::Configuration(
                "store name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Override fields from `HOARD_*` environment variables (see [`ENV_OVERRIDES`]).
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Override fields from an arbitrary variable lookup.
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        for (field, var) in ENV_OVERRIDES {
            let Some(raw) = lookup(var) else {
                continue;
            };
            match *field {
                "enabled" => self.enabled = parse_bool(var, &raw)?,
                "default_ttl_secs" => {
                    self.default_ttl_secs = raw.trim().parse().map_err(|e| {
                        HoardError::Configuration(format!("Invalid {var}={raw:?}: {e}"))
                    })?;
                }
                "key_prefix" => self.key_prefix = raw,
                "store" => self.store = Some(raw),
                _ => {}
            }
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_bool(var: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HoardError::Configuration(format!(
            "Invalid {var}={raw:?}: expected a boolean"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert!(config.enabled);
        assert_eq!(config.default_ttl_secs, 3600);
        assert_eq!(config.key_prefix, "hoard:");
        assert_eq!(config.skip_cache_flag, "skip_cache");
        assert_eq!(config.store, None);
        assert!(!config.interpolate_keys);
        assert_eq!(config.memory.max_entries, 10_000);
        assert!(config.memory.tags);
    }

    #[test]
    fn parse_minimal_config() {
        let config = Config::from_toml_str("default_ttl_secs = 60").unwrap();
        assert_eq!(config.default_ttl_secs, 60);
        // Defaults preserved
        assert!(config.enabled);
        assert_eq!(config.skip_cache_flag, "skip_cache");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            enabled = false
            default_ttl_secs = 120
            key_prefix = "app:"
            skip_cache_flag = "no_cache"
            store = "primary"
            interpolate_keys = true

            [memory]
            max_entries = 500
            tags = false
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert!(!config.enabled);
        assert_eq!(config.default_ttl_secs, 120);
        assert_eq!(config.key_prefix, "app:");
        assert_eq!(config.skip_cache_flag, "no_cache");
        assert_eq!(config.store.as_deref(), Some("primary"));
        assert!(config.interpolate_keys);
        assert_eq!(config.memory.max_entries, 500);
        assert!(!config.memory.tags);
    }

    #[test]
    fn empty_string_is_default_config() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn toml_output_parses_back() {
        let config = Config::new().key_prefix("app:").store("primary").interpolate_keys(true);
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("key_prefix = \"app:\""));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn zero_default_ttl_rejected() {
        let err = Config::from_toml_str("default_ttl_secs = 0").unwrap_err();
        assert!(matches!(err, HoardError::Configuration(_)));
    }

    #[test]
    fn empty_skip_flag_rejected() {
        assert!(Config::new().skip_cache_flag("").validate().is_err());
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = Config::from_toml_str("enabled = maybe").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn overrides_apply() {
        let vars: HashMap<&str, &str> = [
            ("HOARD_ENABLED", "off"),
            ("HOARD_DEFAULT_TTL", " 90 "),
            ("HOARD_KEY_PREFIX", "env:"),
            ("HOARD_STORE", "redis"),
        ]
        .into_iter()
        .collect();
        let config = Config::default()
            .apply_overrides(|v| vars.get(v).map(|s| s.to_string()))
            .unwrap();
        assert!(!config.enabled);
        assert_eq!(config.default_ttl_secs, 90);
        assert_eq!(config.key_prefix, "env:");
        assert_eq!(config.store.as_deref(), Some("redis"));
    }

    #[test]
    fn missing_overrides_leave_config_untouched() {
        let config = Config::new().default_ttl(5).apply_overrides(|_| None).unwrap();
        assert_eq!(config, Config::new().default_ttl(5));
    }

    #[test]
    fn invalid_override_rejected() {
        assert!(
            Config::default()
                .apply_overrides(|v| (v == "HOARD_ENABLED").then(|| "maybe".to_string()))
                .is_err()
        );
        assert!(
            Config::default()
                .apply_overrides(|v| (v == "HOARD_DEFAULT_TTL").then(|| "0".to_string()))
                .is_err()
        );
    }
}
