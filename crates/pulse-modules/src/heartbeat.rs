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

//! A module that emits a beat at a fixed tick interval.

use pulse_core::{Module, ModuleConfig, ModuleDescriptor, ModuleError, TickContext};
use serde_json::json;

/// Emits `heartbeat:beat` every `interval` ticks.
///
/// Configuration:
/// - `interval`: ticks between beats, positive, defaults to 1.
///
/// Each beat carries `{"count": n}` where `n` counts beats from 1.
#[derive(Debug)]
pub struct Heartbeat {
    interval: u64,
    count: u64,
}

impl Heartbeat {
    /// Name under which the module is registered.
    pub const NAME: &'static str = "heartbeat";
    /// The signal emitted on every beat.
    pub const BEAT: &'static str = "heartbeat:beat";

    /// Ticks between two beats.
    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Beats emitted so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl Module for Heartbeat {
    fn descriptor() -> ModuleDescriptor {
        ModuleDescriptor::new(Self::NAME).produces([Self::BEAT])
    }

    fn configure(config: &ModuleConfig) -> Result<Self, ModuleError> {
        let interval = config.get_as::<u64>("interval")?.unwrap_or(1);
        if interval == 0 {
            return Err(ModuleError::invalid_config("interval", "must be at least 1"));
        }
        log::debug!("Heartbeat: Beating every {interval} tick(s).");
        Ok(Self { interval, count: 0 })
    }

    fn on_tick(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ModuleError> {
        if ctx.tick() % self.interval == 0 {
            self.count += 1;
            ctx.emit(Self::BEAT, json!({ "count": self.count }));
        }
        Ok(())
    }

    fn on_shutdown(&mut self) {
        log::info!("Heartbeat: Stopped after {} beat(s).", self.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> ModuleConfig {
        ModuleConfig::from_mapping(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_default_interval() {
        let heartbeat = Heartbeat::configure(&ModuleConfig::new()).unwrap();
        assert_eq!(heartbeat.interval(), 1);
        assert_eq!(heartbeat.count(), 0);
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = Heartbeat::configure(&config("interval: 0")).unwrap_err();
        assert!(matches!(err, ModuleError::InvalidConfig { ref key, .. } if key == "interval"));
    }

    #[test]
    fn test_non_numeric_interval_is_rejected() {
        assert!(Heartbeat::configure(&config("interval: often")).is_err());
    }

    #[test]
    fn test_beats_on_interval() {
        let mut heartbeat = Heartbeat::configure(&config("interval: 3")).unwrap();
        let mut beats = Vec::new();

        for tick in 0..7 {
            let mut ctx = TickContext::new(tick, &[]);
            heartbeat.on_tick(&mut ctx).unwrap();
            for emission in ctx.into_emissions() {
                assert_eq!(emission.name, Heartbeat::BEAT);
                beats.push((tick, emission.payload["count"].as_u64().unwrap()));
            }
        }

        assert_eq!(beats, [(0, 1), (3, 2), (6, 3)]);
        assert_eq!(heartbeat.count(), 3);
    }

    #[test]
    fn test_descriptor() {
        let descriptor = Heartbeat::descriptor();
        assert_eq!(descriptor.name(), "heartbeat");
        assert!(descriptor.produced().contains("heartbeat:beat"));
        assert!(!descriptor.interest().matches("heartbeat:beat"));
    }
}
