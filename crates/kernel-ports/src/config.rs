//! # Runtime Settings
//!
//! [`Config`] is the global settings map handed to the runtime. It is shared
//! as `Arc<Config>`, so mutation goes through an internal lock; the fixture
//! augments it in place after resolving it.
//!
//! [`DatabaseConfig`] is an immutable per-database snapshot. Keys of the form
//! `databases.<name>.<setting>` override `<setting>` for database `<name>`.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::errors::PortError;

/// Provider used for new schema indexes.
pub const DEFAULT_SCHEMA_PROVIDER: &str = "db.index.default_schema_provider";
/// Whether the database rejects writes.
pub const READ_ONLY: &str = "db.read_only";
/// Transaction timeout in milliseconds, `0` for none.
pub const TRANSACTION_TIMEOUT_MS: &str = "db.transaction.timeout_ms";
/// Record format of newly created stores.
pub const RECORD_FORMAT: &str = "db.record_format";
/// Enables the transaction tracers.
pub const TRACER: &str = "db.tracer";

const DATABASE_PREFIX: &str = "databases.";

/// Serialized form of a settings map.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    settings: BTreeMap<String, String>,
}

/// Global settings.
#[derive(Debug, Default)]
pub struct Config {
    settings: RwLock<BTreeMap<String, String>>,
}

impl Config {
    /// An empty settings map.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Settings every runtime starts from.
    pub fn defaults() -> Self {
        let config = Self::empty();
        config.set(READ_ONLY, "false");
        config.set(TRANSACTION_TIMEOUT_MS, "0");
        config.set(RECORD_FORMAT, "standard");
        config.set(TRACER, "null");
        config
    }

    /// Defaults overlaid with the settings in a JSON document of the form
    /// `{"settings": {"key": "value"}}`.
    pub fn from_json(json: &str) -> Result<Self, PortError> {
        let document: SettingsDocument = serde_json::from_str(json)
            .map_err(|e| PortError::MalformedSettings(e.to_string()))?;

        let config = Self::defaults();
        {
            let mut settings = config.settings.write();
            settings.extend(document.settings);
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, PortError> {
        let document = SettingsDocument {
            settings: self.settings.read().clone(),
        };
        serde_json::to_string_pretty(&document)
            .map_err(|e| PortError::MalformedSettings(e.to_string()))
    }

    /// Set `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.settings.write().insert(key.to_string(), value.into());
    }

    /// Set `key` only when it has no value yet. Returns true if it was set.
    pub fn augment(&self, key: &str, value: impl Into<String>) -> bool {
        let mut settings = self.settings.write();
        if settings.contains_key(key) {
            return false;
        }
        settings.insert(key.to_string(), value.into());
        true
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.settings.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.read().contains_key(key)
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, PortError> {
        self.get(key).map(|v| parse_bool(key, &v)).transpose()
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, PortError> {
        self.get(key).map(|v| parse_u64(key, &v)).transpose()
    }

    /// Copy of all settings.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.settings.read().clone()
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, PortError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(PortError::InvalidSetting {
            setting: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, PortError> {
    value.trim().parse().map_err(|_| PortError::InvalidSetting {
        setting: key.to_string(),
        value: value.to_string(),
    })
}

/// Settings as seen by one database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    database_name: String,
    settings: BTreeMap<String, String>,
}

impl DatabaseConfig {
    /// Resolve the view of `config` for `database_name`.
    ///
    /// Per-database overrides win over global values; overrides for other
    /// databases are dropped.
    pub fn from_config(config: &Config, database_name: &str) -> Self {
        let own_prefix = format!("{DATABASE_PREFIX}{database_name}.");
        let all = config.snapshot();

        let mut settings: BTreeMap<String, String> = all
            .iter()
            .filter(|(k, _)| !k.starts_with(DATABASE_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        for (key, value) in &all {
            if let Some(local) = key.strip_prefix(&own_prefix) {
                settings.insert(local.to_string(), value.clone());
            }
        }

        Self {
            database_name: database_name.to_string(),
            settings,
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(String::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, PortError> {
        self.get(key).map(|v| parse_bool(key, v)).transpose()
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, PortError> {
        self.get(key).map(|v| parse_u64(key, v)).transpose()
    }

    pub fn is_read_only(&self) -> Result<bool, PortError> {
        Ok(self.get_bool(READ_ONLY)?.unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_augment_keeps_existing_value() {
        let config = Config::defaults();
        config.set(DEFAULT_SCHEMA_PROVIDER, "native-btree-1.0");

        let applied = config.augment(DEFAULT_SCHEMA_PROVIDER, "empty-1.0");

        assert!(!applied);
        assert_eq!(
            config.get(DEFAULT_SCHEMA_PROVIDER).as_deref(),
            Some("native-btree-1.0")
        );
    }

    #[test]
    fn test_augment_sets_missing_value() {
        let config = Config::empty();

        assert!(config.augment(DEFAULT_SCHEMA_PROVIDER, "empty-1.0"));
        assert_eq!(config.get(DEFAULT_SCHEMA_PROVIDER).as_deref(), Some("empty-1.0"));
    }

    #[test]
    fn test_from_json_overlays_defaults() {
        let json = r#"{"settings": {"db.read_only": "true", "custom": "x"}}"#;

        let config = Config::from_json(json).unwrap();

        assert_eq!(config.get_bool(READ_ONLY).unwrap(), Some(true));
        assert_eq!(config.get("custom").as_deref(), Some("x"));
        assert_eq!(config.get(RECORD_FORMAT).as_deref(), Some("standard"));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let result = Config::from_json("{not json");

        assert!(matches!(result, Err(PortError::MalformedSettings(_))));
    }

    #[test]
    fn test_json_round_trip_preserves_settings() {
        let config = Config::defaults();
        config.set("custom", "value");

        let restored = Config::from_json(&config.to_json().unwrap()).unwrap();

        assert_eq!(restored.snapshot(), config.snapshot());
    }

    #[test]
    fn test_typed_getter_reports_invalid_value() {
        let config = Config::empty();
        config.set(TRANSACTION_TIMEOUT_MS, "soon");

        let result = config.get_u64(TRANSACTION_TIMEOUT_MS);

        assert!(matches!(result, Err(PortError::InvalidSetting { .. })));
    }

    #[test]
    fn test_database_config_applies_own_overrides_only() {
        let config = Config::defaults();
        config.set("databases.users.db.read_only", "true");
        config.set("databases.other.db.record_format", "high_limit");

        let view = DatabaseConfig::from_config(&config, "users");

        assert!(view.is_read_only().unwrap());
        assert_eq!(view.get(RECORD_FORMAT), Some("standard"));
        assert_eq!(view.database_name(), "users");
    }

    #[test]
    fn test_database_config_is_deterministic() {
        let config = Config::defaults();

        let first = DatabaseConfig::from_config(&config, "default");
        let second = DatabaseConfig::from_config(&config, "default");

        assert_eq!(first, second);
    }
}
