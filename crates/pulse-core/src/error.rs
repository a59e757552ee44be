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

//! Errors reported by module implementations.

use thiserror::Error;

/// An error returned by a module, either while it is being configured or from
/// its update hook.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModuleError {
    /// A configuration value could not be interpreted by the module.
    #[error("invalid value for config key '{key}': {reason}")]
    InvalidConfig {
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// The module failed for a reason of its own.
    #[error("{0}")]
    Failed(String),
}

impl ModuleError {
    /// Shorthand for [`ModuleError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Shorthand for [`ModuleError::InvalidConfig`].
    pub fn invalid_config(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}
