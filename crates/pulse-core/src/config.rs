// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Opaque, arbitrarily nested configuration values and the key-wise merge rule.
//!
//! The runtime never interprets what a module's configuration means. It only
//! layers configuration blocks on top of each other:
//!
//! - scalar and sequence values are replaced wholesale by the later value,
//! - nested mappings are merged key by key, recursively,
//! - keys that only appear in the earlier block survive.

use crate::error::ModuleError;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

/// The configuration block of a single module.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleConfig {
    values: Mapping,
}

impl ModuleConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already parsed mapping.
    pub fn from_mapping(values: Mapping) -> Self {
        Self { values }
    }

    /// Returns the raw value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Decodes the value stored under `key` into `T`.
    ///
    /// Returns `Ok(None)` when the key is absent, so modules can fall back to
    /// their defaults.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ModuleError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(value) => serde_yaml::from_value(value.clone())
                .map(Some)
                .map_err(|e| ModuleError::invalid_config(key, e)),
        }
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(Value::String(key.into()), value);
    }

    /// Returns `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Layers `overlay` on top of this configuration.
    pub fn merge(&mut self, overlay: ModuleConfig) {
        merge_mapping(&mut self.values, overlay.values);
    }

    /// Number of top-level keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the configuration has no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrows the underlying mapping.
    pub fn as_mapping(&self) -> &Mapping {
        &self.values
    }

    /// Consumes the configuration and returns the underlying mapping.
    pub fn into_mapping(self) -> Mapping {
        self.values
    }
}

impl From<Mapping> for ModuleConfig {
    fn from(values: Mapping) -> Self {
        Self::from_mapping(values)
    }
}

/// Merges `overlay` into `base` following the layering rule of this module.
pub fn merge_value(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            merge_mapping(base_map, overlay_map)
        }
        (slot, overlay) => *slot = overlay,
    }
}

fn merge_mapping(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_value(existing, value),
            None => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> ModuleConfig {
        ModuleConfig::from_mapping(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_later_scalar_wins_and_earlier_keys_survive() {
        let mut base = config("{x: 1, y: 2}");
        base.merge(config("{y: 3}"));
        assert_eq!(base, config("{x: 1, y: 3}"));
    }

    #[test]
    fn test_nested_mappings_merge_recursively() {
        let mut base = config("{db: {host: localhost, port: 7687}, name: roboy}");
        base.merge(config("{db: {password: secret, port: 7688}}"));
        assert_eq!(
            base,
            config("{db: {host: localhost, port: 7688, password: secret}, name: roboy}")
        );
    }

    #[test]
    fn test_sequences_are_replaced_wholesale() {
        let mut base = config("{import: [a, b, c]}");
        base.merge(config("{import: [d]}"));
        assert_eq!(base.get_as::<Vec<String>>("import").unwrap(), Some(vec!["d".to_string()]));
    }

    #[test]
    fn test_mapping_replaced_by_scalar() {
        let mut base = config("{token: {env: TOKEN}}");
        base.merge(config("{token: abc}"));
        assert_eq!(base.get("token"), Some(&Value::String("abc".into())));
    }

    #[test]
    fn test_get_as_missing_key_is_none() {
        let cfg = ModuleConfig::new();
        assert_eq!(cfg.get_as::<u32>("interval").unwrap(), None);
        assert!(cfg.is_empty());
    }

    #[test]
    fn test_get_as_wrong_type_reports_key() {
        let cfg = config("{interval: soon}");
        match cfg.get_as::<u32>("interval") {
            Err(ModuleError::InvalidConfig { key, .. }) => assert_eq!(key, "interval"),
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn test_set_replaces_value() {
        let mut cfg = config("{level: info}");
        cfg.set("level", Value::String("debug".into()));
        assert_eq!(cfg.get_as::<String>("level").unwrap().as_deref(), Some("debug"));
        assert_eq!(cfg.len(), 1);
    }
}
