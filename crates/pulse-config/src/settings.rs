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

//! Runtime settings carried by the reserved `core` module.

use crate::error::ResolutionError;
use crate::resolver::ResolvedConfig;
use pulse_core::{ModuleConfig, ModuleError, CORE_MODULE};
use serde::de::DeserializeOwned;
use std::time::Duration;

const IMPORT_KEY: &str = "import";
const TICKRATE_KEY: &str = "tickrate";
const DRIFT_THRESHOLD_KEY: &str = "drift_threshold_ms";

/// The settings the runtime reads from the `core` configuration block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSettings {
    /// Modules to activate, in construction order.
    pub import: Vec<String>,
    /// Ticks per second.
    pub tickrate: u32,
    /// Scheduling lag above which a drift warning is reported.
    pub drift_threshold: Duration,
}

impl CoreSettings {
    /// Drift threshold used when `drift_threshold_ms` is not configured.
    pub const DEFAULT_DRIFT_THRESHOLD: Duration = Duration::from_millis(1000);

    /// Extracts the core settings from a resolved configuration.
    ///
    /// `tickrate` is required and must be a positive integer; `import`
    /// defaults to an empty list.
    pub fn from_resolved(resolved: &ResolvedConfig) -> Result<Self, ResolutionError> {
        let empty = ModuleConfig::new();
        let core = resolved.module(CORE_MODULE).unwrap_or(&empty);

        let tickrate: u32 = decode(core, TICKRATE_KEY)?.ok_or_else(|| {
            ResolutionError::MissingKey {
                module: CORE_MODULE.to_string(),
                key: TICKRATE_KEY.to_string(),
            }
        })?;
        if tickrate == 0 {
            return Err(invalid(TICKRATE_KEY, "must be a positive integer"));
        }

        let import: Vec<String> = decode(core, IMPORT_KEY)?.unwrap_or_default();
        let drift_threshold = decode::<u64>(core, DRIFT_THRESHOLD_KEY)?
            .map(Duration::from_millis)
            .unwrap_or(Self::DEFAULT_DRIFT_THRESHOLD);

        Ok(Self {
            import,
            tickrate,
            drift_threshold,
        })
    }

    /// The time budget of one tick.
    pub fn tick_period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tickrate))
    }

    /// The configured imports followed by `extra`, without duplicates.
    ///
    /// The first occurrence of a name decides its position.
    pub fn import_list(&self, extra: &[String]) -> Vec<String> {
        let mut list: Vec<String> = Vec::with_capacity(self.import.len() + extra.len());
        for name in self.import.iter().chain(extra) {
            if list.contains(name) {
                log::warn!("CoreSettings: Module '{name}' is imported more than once.");
                continue;
            }
            list.push(name.clone());
        }
        list
    }
}

fn decode<T: DeserializeOwned>(
    core: &ModuleConfig,
    key: &str,
) -> Result<Option<T>, ResolutionError> {
    core.get_as(key).map_err(|err| match err {
        ModuleError::InvalidConfig { reason, .. } => invalid(key, reason),
        other => invalid(key, other.to_string()),
    })
}

fn invalid(key: &str, reason: impl Into<String>) -> ResolutionError {
    ResolutionError::InvalidValue {
        module: CORE_MODULE.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Source;
    use crate::resolver::ConfigResolver;

    fn settings(yaml: &str) -> Result<CoreSettings, ResolutionError> {
        let resolved = ConfigResolver::new()
            .resolve(&[Source::text("main.yml", yaml)])
            .unwrap();
        CoreSettings::from_resolved(&resolved)
    }

    #[test]
    fn test_reads_import_and_tickrate() {
        let core = settings("module: core\nconfig: {import: [a, b], tickrate: 10}\n").unwrap();
        assert_eq!(core.import, ["a", "b"]);
        assert_eq!(core.tickrate, 10);
        assert_eq!(core.tick_period(), Duration::from_millis(100));
        assert_eq!(core.drift_threshold, CoreSettings::DEFAULT_DRIFT_THRESHOLD);
    }

    #[test]
    fn test_missing_tickrate_is_reported() {
        let err = settings("module: core\nconfig: {import: [a]}\n").unwrap_err();
        match err {
            ResolutionError::MissingKey { module, key } => {
                assert_eq!(module, "core");
                assert_eq!(key, "tickrate");
            }
            other => panic!("expected MissingKey, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_core_block_is_reported() {
        let err = settings("module: a\n").unwrap_err();
        assert!(matches!(err, ResolutionError::MissingKey { .. }));
    }

    #[test]
    fn test_zero_or_negative_tickrate_is_invalid() {
        for body in ["{tickrate: 0}", "{tickrate: -5}", "{tickrate: fast}"] {
            let err = settings(&format!("module: core\nconfig: {body}\n")).unwrap_err();
            assert!(
                matches!(err, ResolutionError::InvalidValue { ref key, .. } if key == "tickrate"),
                "{body}: {err:?}"
            );
        }
    }

    #[test]
    fn test_import_must_be_a_list_of_names() {
        let err = settings("module: core\nconfig: {tickrate: 1, import: {a: 1}}\n").unwrap_err();
        assert!(matches!(err, ResolutionError::InvalidValue { ref key, .. } if key == "import"));
    }

    #[test]
    fn test_drift_threshold_is_configurable() {
        let core = settings("module: core\nconfig: {tickrate: 20, drift_threshold_ms: 250}\n").unwrap();
        assert_eq!(core.drift_threshold, Duration::from_millis(250));
        assert_eq!(core.tick_period(), Duration::from_millis(50));
        assert!(core.import.is_empty());
    }

    #[test]
    fn test_import_list_appends_extra_without_duplicates() {
        let core = CoreSettings {
            import: vec!["a".into(), "b".into()],
            tickrate: 1,
            drift_threshold: CoreSettings::DEFAULT_DRIFT_THRESHOLD,
        };
        let list = core.import_list(&["b".to_string(), "c".to_string(), "c".to_string()]);
        assert_eq!(list, ["a", "b", "c"]);
    }
}
