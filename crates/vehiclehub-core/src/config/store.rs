//! Flat key/value configuration store.
//!
//! The broker host hands the extension a flat keyed configuration where
//! multi-valued entries are delimited strings. Dynamic key shapes such as
//! `{device_type}.device.mqtt.publish.topics` are looked up here; the
//! statically-shaped sections live in the serde structs of this module's
//! siblings.

use std::collections::HashMap;

use crate::error::AppError;
use crate::result::AppResult;

/// Delimiter between entries of a multi-valued configuration value.
const LIST_DELIMITER: char = ',';

/// Read-only keyed configuration with delimiter-split multi-values.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: HashMap<String, String>,
}

impl ConfigStore {
    /// Creates a store over the given key/value map.
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Creates an empty store (useful for tests and degraded setups).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous one. Intended for host
    /// bootstrap code and tests; the store is read-only afterwards.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the raw value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Returns the raw value or a configuration error naming the key.
    pub fn require(&self, key: &str) -> AppResult<&str> {
        self.get(key)
            .ok_or_else(|| AppError::configuration(format!("Missing configuration key '{key}'")))
    }

    /// Splits a multi-valued entry into trimmed, non-empty parts.
    /// A missing key yields an empty list.
    pub fn get_list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(LIST_DELIMITER)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Like [`get_list`](Self::get_list) but a missing or empty list is a
    /// configuration error naming the key.
    pub fn require_list(&self, key: &str) -> AppResult<Vec<String>> {
        let list = self.get_list(key);
        if list.is_empty() {
            return Err(AppError::configuration(format!(
                "Configuration key '{key}' is missing or empty"
            )));
        }
        Ok(list)
    }

    /// Parses a boolean value; a missing key is `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}
