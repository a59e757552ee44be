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

//! Sources and the multi-document parser.

use crate::error::{ParseError, ResolutionError};
use pulse_core::ModuleConfig;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::path::PathBuf;

const MODULE_KEY: &str = "module";
const CONFIG_KEY: &str = "config";

/// An origin of configuration text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file on disk.
    File(PathBuf),
    /// Text held in memory under a descriptive name.
    Text {
        /// Name used in error messages.
        name: String,
        /// The configuration text.
        text: String,
    },
}

impl Source {
    /// A source backed by the file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// A source backed by in-memory text.
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Text {
            name: name.into(),
            text: text.into(),
        }
    }

    /// The name used to identify this source in logs and errors.
    pub fn name(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Text { name, .. } => name.clone(),
        }
    }

    /// Reads the full text of this source.
    pub fn read(&self) -> Result<String, ResolutionError> {
        match self {
            Source::File(path) => {
                std::fs::read_to_string(path).map_err(|error| ResolutionError::MissingSource {
                    source_name: self.name(),
                    error,
                })
            }
            Source::Text { text, .. } => Ok(text.clone()),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// One `{module, config}` unit parsed from a source.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Name of the module this block configures.
    pub module: String,
    /// The module's configuration values.
    pub config: ModuleConfig,
}

impl Document {
    /// Creates a document for `module`.
    pub fn new(module: impl Into<String>, config: ModuleConfig) -> Self {
        Self {
            module: module.into(),
            config,
        }
    }
}

/// Parses every document of one source, in order.
///
/// Empty documents are skipped but still count towards the ordinal reported
/// in errors. Parsing stops at the first malformed document.
pub fn parse_documents(source_name: &str, text: &str) -> Result<Vec<Document>, ParseError> {
    let mut documents = Vec::new();

    for (index, deserializer) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let ordinal = index + 1;
        let value = Value::deserialize(deserializer)
            .map_err(|e| ParseError::new(source_name, ordinal, e.to_string()))?;

        match value {
            Value::Null => {
                log::trace!("Skipping empty document #{ordinal} in '{source_name}'.");
            }
            Value::Mapping(map) => documents.push(document_from_mapping(source_name, ordinal, map)?),
            other => {
                return Err(ParseError::new(
                    source_name,
                    ordinal,
                    format!("expected a mapping, found {}", kind_of(&other)),
                ))
            }
        }
    }

    Ok(documents)
}

fn document_from_mapping(
    source_name: &str,
    ordinal: usize,
    mut map: Mapping,
) -> Result<Document, ParseError> {
    let module = match map.remove(MODULE_KEY) {
        Some(Value::String(name)) if !name.trim().is_empty() => name,
        Some(Value::String(_)) => {
            return Err(ParseError::new(source_name, ordinal, "'module' must not be empty"))
        }
        Some(other) => {
            return Err(ParseError::new(
                source_name,
                ordinal,
                format!("'module' must be a string, found {}", kind_of(&other)),
            ))
        }
        None => return Err(ParseError::new(source_name, ordinal, "missing 'module' key")),
    };

    let config = match map.remove(CONFIG_KEY) {
        None | Some(Value::Null) => ModuleConfig::new(),
        Some(Value::Mapping(values)) => ModuleConfig::from_mapping(values),
        Some(other) => {
            return Err(ParseError::new(
                source_name,
                ordinal,
                format!("'config' of module '{module}' must be a mapping, found {}", kind_of(&other)),
            ))
        }
    };

    for key in map.keys() {
        log::warn!(
            "Ignoring unknown key {:?} in document #{ordinal} of '{source_name}'.",
            key
        );
    }

    Ok(Document { module, config })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_multiple_documents_in_order() {
        let text = "\
module: core
config:
  import: [a, b]
  tickrate: 10
---
module: a
config:
  greeting: hello
";
        let docs = parse_documents("main.yml", text).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].module, "core");
        assert_eq!(docs[0].config.get_as::<u32>("tickrate").unwrap(), Some(10));
        assert_eq!(docs[1].module, "a");
        assert_eq!(
            docs[1].config.get_as::<String>("greeting").unwrap().as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_document_without_config_is_empty() {
        let docs = parse_documents("main.yml", "module: console\n").unwrap();
        assert_eq!(docs, vec![Document::new("console", ModuleConfig::new())]);
    }

    #[test]
    fn test_empty_documents_are_skipped() {
        let text = "---\nmodule: a\n---\n---\nmodule: b\n";
        let docs = parse_documents("main.yml", text).unwrap();
        let names: Vec<_> = docs.iter().map(|d| d.module.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_missing_module_key_reports_ordinal() {
        let text = "module: a\n---\nconfig:\n  x: 1\n";
        let err = parse_documents("keys.yml", text).unwrap_err();
        assert_eq!(err.source_name, "keys.yml");
        assert_eq!(err.ordinal, 2);
        assert!(err.reason.contains("module"));
    }

    #[test]
    fn test_non_mapping_document_is_rejected() {
        let err = parse_documents("list.yml", "- a\n- b\n").unwrap_err();
        assert_eq!(err.ordinal, 1);
        assert!(err.reason.contains("sequence"), "{}", err.reason);
    }

    #[test]
    fn test_config_must_be_a_mapping() {
        let err = parse_documents("main.yml", "module: a\nconfig: [1, 2]\n").unwrap_err();
        assert!(err.reason.contains("'config'"), "{}", err.reason);
    }

    #[test]
    fn test_syntax_error_stops_parsing() {
        let text = "module: a\n---\nmodule: b\nconfig: x: y\n---\nmodule: c\n";
        let err = parse_documents("broken.yml", text).unwrap_err();
        assert_eq!(err.ordinal, 2);
        assert_eq!(err.to_string().split(',').next(), Some("broken.yml"));
    }

    #[test]
    fn test_file_source_reads_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "module: a\n").unwrap();
        let source = Source::file(file.path());
        assert_eq!(source.read().unwrap(), "module: a\n");
        assert_eq!(source.name(), file.path().display().to_string());
    }

    #[test]
    fn test_missing_file_is_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = Source::file(dir.path().join("keys.yml"));
        match source.read() {
            Err(ResolutionError::MissingSource { source_name, .. }) => {
                assert!(source_name.ends_with("keys.yml"))
            }
            other => panic!("expected MissingSource, got {other:?}"),
        }
    }
}
