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

//! Folding parsed documents into one configuration block per module.

use crate::document::{parse_documents, Document, Source};
use crate::error::ResolutionError;
use crate::overrides::ConfigOverride;
use pulse_core::ModuleConfig;
use serde_yaml::Value;
use std::collections::BTreeMap;

/// What to do when a source cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MissingSourcePolicy {
    /// Abort resolution. Overlay files usually carry required credentials.
    #[default]
    Fatal,
    /// Log a warning and continue with the remaining sources.
    Skip,
}

/// The effective configuration of every module named in any source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    modules: BTreeMap<String, ModuleConfig>,
}

impl ResolvedConfig {
    /// Folds `documents`, in order, into a fresh configuration.
    ///
    /// Later documents override earlier ones key by key; see
    /// [`pulse_core::config`] for the exact rule.
    pub fn from_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        documents
            .into_iter()
            .fold(Self::default(), |resolved, document| resolved.with(document))
    }

    fn with(mut self, document: Document) -> Self {
        self.modules
            .entry(document.module)
            .or_default()
            .merge(document.config);
        self
    }

    /// The configuration block of `module`, if any source mentioned it.
    pub fn module(&self, module: &str) -> Option<&ModuleConfig> {
        self.modules.get(module)
    }

    /// A single configuration value.
    pub fn get(&self, module: &str, key: &str) -> Option<&Value> {
        self.modules.get(module).and_then(|config| config.get(key))
    }

    /// Returns `true` if any source mentioned `module`.
    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Names of all configured modules, sorted.
    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Number of configured modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns `true` if no module is configured.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Reads and merges an ordered list of sources.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    missing_sources: MissingSourcePolicy,
    overrides: Vec<ConfigOverride>,
}

impl ConfigResolver {
    /// Creates a resolver that treats unreadable sources as fatal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the policy applied to unreadable sources.
    pub fn with_missing_source_policy(mut self, policy: MissingSourcePolicy) -> Self {
        self.missing_sources = policy;
        self
    }

    /// Adds overrides applied after every source.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = ConfigOverride>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Resolves `sources`, strictly in the given order.
    pub fn resolve(&self, sources: &[Source]) -> Result<ResolvedConfig, ResolutionError> {
        let mut documents = Vec::new();

        for source in sources {
            let text = match source.read() {
                Ok(text) => text,
                Err(err @ ResolutionError::MissingSource { .. })
                    if self.missing_sources == MissingSourcePolicy::Skip =>
                {
                    log::warn!("ConfigResolver: Skipping unreadable source: {err}");
                    continue;
                }
                Err(err) => return Err(err),
            };

            let parsed = parse_documents(&source.name(), &text)?;
            log::debug!(
                "ConfigResolver: Loaded {} document(s) from '{}'.",
                parsed.len(),
                source
            );
            documents.extend(parsed);
        }

        documents.extend(self.overrides.iter().map(ConfigOverride::to_document));

        let resolved = ResolvedConfig::from_documents(documents);
        log::info!(
            "ConfigResolver: Resolved configuration for {} module(s) from {} source(s).",
            resolved.len(),
            sources.len()
        );
        Ok(resolved)
    }
}
