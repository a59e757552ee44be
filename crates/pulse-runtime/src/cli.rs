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

//! Command-line surface of the `pulse` binary.

use clap::Parser;
use pulse_config::{ConfigOverride, MissingSourcePolicy, Source};
use std::path::PathBuf;

/// Runs a set of modules at a fixed tick rate, assembled from YAML configuration.
#[derive(Parser, Debug)]
#[command(name = "pulse", version, about)]
pub struct Args {
    /// Configuration file. Repeat to layer files; later files override earlier ones.
    #[arg(short = 'f', long = "config", value_name = "PATH")]
    pub config: Vec<PathBuf>,

    /// Override a single configuration value after all files are applied.
    /// The value is read as YAML.
    #[arg(
        short = 'd',
        long = "set",
        num_args = 3,
        value_names = ["MODULE", "KEY", "VALUE"],
        allow_hyphen_values = true
    )]
    pub set: Vec<String>,

    /// Warn about configuration files that cannot be read instead of failing.
    #[arg(long)]
    pub skip_missing: bool,

    /// Additional modules to import after the configured ones.
    #[arg(value_name = "MODULE")]
    pub modules: Vec<String>,
}

impl Args {
    /// The configuration files as sources, in command-line order.
    pub fn sources(&self) -> Vec<Source> {
        self.config.iter().map(Source::file).collect()
    }

    /// The `--set` triples as overrides, in command-line order.
    pub fn overrides(&self) -> Vec<ConfigOverride> {
        self.set
            .chunks_exact(3)
            .map(|triple| ConfigOverride::parse(&triple[0], &triple[1], &triple[2]))
            .collect()
    }

    /// How unreadable configuration files are treated.
    pub fn missing_source_policy(&self) -> MissingSourcePolicy {
        if self.skip_missing {
            MissingSourcePolicy::Skip
        } else {
            MissingSourcePolicy::Fatal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pulse").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_config_files_keep_order() {
        let args = parse(&["-f", "pulse.yml", "--config", "keys.yml"]);
        let names: Vec<String> = args.sources().iter().map(Source::name).collect();
        assert_eq!(names, ["pulse.yml", "keys.yml"]);
        assert_eq!(args.missing_source_policy(), MissingSourcePolicy::Fatal);
    }

    #[test]
    fn test_set_triples_become_overrides() {
        let args = parse(&[
            "-d", "core", "tickrate", "5", "--set", "journal", "level", "debug",
        ]);
        let overrides = args.overrides();

        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0].module, "core");
        assert_eq!(overrides[0].key, "tickrate");
        assert_eq!(overrides[0].value, Value::Number(5.into()));
        assert_eq!(overrides[1].module, "journal");
        assert_eq!(overrides[1].value, Value::String("debug".into()));
    }

    #[test]
    fn test_incomplete_set_is_rejected() {
        let result = Args::try_parse_from(["pulse", "-d", "core", "tickrate"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_positional_modules_and_skip_missing() {
        let args = parse(&["--skip-missing", "-f", "pulse.yml", "heartbeat", "journal"]);
        assert_eq!(args.modules, ["heartbeat", "journal"]);
        assert_eq!(args.missing_source_policy(), MissingSourcePolicy::Skip);
    }
}
