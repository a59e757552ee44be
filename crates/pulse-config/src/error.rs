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

//! Error types for configuration parsing and resolution.

use thiserror::Error;

/// A source contained text that is not a valid sequence of module documents.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{source_name}, document #{ordinal}: {reason}")]
pub struct ParseError {
    /// Name of the offending source.
    pub source_name: String,
    /// 1-based position of the offending document within the source.
    pub ordinal: usize,
    /// What was wrong with the document.
    pub reason: String,
}

impl ParseError {
    pub(crate) fn new(source_name: &str, ordinal: usize, reason: impl Into<String>) -> Self {
        Self {
            source_name: source_name.to_string(),
            ordinal,
            reason: reason.into(),
        }
    }
}

/// An error raised while building the effective configuration.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// A source could not be read.
    #[error("cannot read config source '{source_name}'")]
    MissingSource {
        /// Name of the unreadable source.
        source_name: String,
        /// The underlying I/O failure.
        #[source]
        error: std::io::Error,
    },
    /// A source could be read but not parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A key the runtime depends on is absent.
    #[error("module '{module}' is missing required config key '{key}'")]
    MissingKey {
        /// Module whose block lacks the key.
        module: String,
        /// The missing key.
        key: String,
    },
    /// A key the runtime depends on holds an unusable value.
    #[error("module '{module}' has an invalid value for config key '{key}': {reason}")]
    InvalidValue {
        /// Module whose block holds the value.
        module: String,
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}
