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

//! # Pulse Config
//!
//! Turns an ordered list of configuration sources into one effective
//! configuration block per module.
//!
//! A source holds one or more YAML documents separated by `---`, each shaped
//! as `{module: <name>, config: <mapping>}`. Sources are folded in order and
//! later sources override earlier ones key by key, so a secret-bearing overlay
//! file can be layered on top of the main configuration.

#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod overrides;
pub mod resolver;
pub mod settings;

pub use document::{parse_documents, Document, Source};
pub use error::{ParseError, ResolutionError};
pub use overrides::ConfigOverride;
pub use resolver::{ConfigResolver, MissingSourcePolicy, ResolvedConfig};
pub use settings::CoreSettings;
