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

//! Single-value overrides supplied on the command line.

use crate::document::Document;
use pulse_core::ModuleConfig;
use serde_yaml::Value;

/// Replaces one top-level key of one module after all sources were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigOverride {
    /// Target module.
    pub module: String,
    /// Target key.
    pub key: String,
    /// The new value.
    pub value: Value,
}

impl ConfigOverride {
    /// Creates an override with an already typed value.
    pub fn new(module: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            module: module.into(),
            key: key.into(),
            value,
        }
    }

    /// Creates an override from raw text.
    ///
    /// The text is read as a YAML value, so `10` becomes a number and `[a, b]`
    /// a sequence; anything that does not parse is kept as a plain string.
    pub fn parse(module: impl Into<String>, key: impl Into<String>, raw: &str) -> Self {
        let value = serde_yaml::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Self::new(module, key, value)
    }

    /// The override expressed as a one-key document.
    pub fn to_document(&self) -> Document {
        let mut config = ModuleConfig::new();
        config.set(self.key.clone(), self.value.clone());
        Document::new(self.module.clone(), config)
    }
}
