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

//! A module that writes the signals it receives to the log.

use pulse_core::{Module, ModuleConfig, ModuleDescriptor, ModuleError, Signal, TickContext};
use serde::Deserialize;
use std::collections::BTreeSet;

/// Log level of journal entries, as written in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JournalLevel {
    /// `error`
    Error,
    /// `warn`
    Warn,
    /// `info`
    #[default]
    Info,
    /// `debug`
    Debug,
    /// `trace`
    Trace,
}

impl From<JournalLevel> for log::Level {
    fn from(level: JournalLevel) -> Self {
        match level {
            JournalLevel::Error => log::Level::Error,
            JournalLevel::Warn => log::Level::Warn,
            JournalLevel::Info => log::Level::Info,
            JournalLevel::Debug => log::Level::Debug,
            JournalLevel::Trace => log::Level::Trace,
        }
    }
}

/// Logs every signal delivered to it.
///
/// Configuration:
/// - `signals`: if present, only these signal names are written.
/// - `level`: one of `error`, `warn`, `info`, `debug`, `trace`. Defaults to `info`.
#[derive(Debug)]
pub struct Journal {
    filter: Option<BTreeSet<String>>,
    level: log::Level,
    written: u64,
}

impl Journal {
    /// Name under which the module is registered.
    pub const NAME: &'static str = "journal";

    /// Returns `true` if a signal called `name` is written.
    pub fn accepts(&self, name: &str) -> bool {
        self.filter.as_ref().is_none_or(|names| names.contains(name))
    }

    /// The level entries are written at.
    pub fn level(&self) -> log::Level {
        self.level
    }

    /// Entries written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    fn write(&mut self, signal: &Signal) {
        self.written += 1;
        log::log!(
            self.level,
            "Journal: [tick {}] {} from '{}': {}",
            signal.tick(),
            signal.name(),
            signal.source(),
            signal.payload()
        );
    }
}

impl Module for Journal {
    fn descriptor() -> ModuleDescriptor {
        ModuleDescriptor::new(Self::NAME).consumes_any()
    }

    fn configure(config: &ModuleConfig) -> Result<Self, ModuleError> {
        let filter = config
            .get_as::<Vec<String>>("signals")?
            .map(|names| names.into_iter().collect());
        let level = config.get_as::<JournalLevel>("level")?.unwrap_or_default();
        Ok(Self {
            filter,
            level: level.into(),
            written: 0,
        })
    }

    fn on_tick(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ModuleError> {
        for signal in ctx.inbound() {
            if self.accepts(signal.name()) {
                self.write(signal);
            }
        }
        Ok(())
    }

    fn on_shutdown(&mut self) {
        log::debug!("Journal: Wrote {} entr(ies).", self.written);
    }
}
