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

//! Transient events exchanged between modules.

use std::time::Instant;

/// The opaque payload carried by a [`Signal`].
pub type Payload = serde_json::Value;

/// An event emitted by a module during one tick.
///
/// Signals are never persisted. A signal emitted during tick `N` is delivered
/// to interested modules at tick `N + 1` and then discarded.
#[derive(Debug, Clone)]
pub struct Signal {
    source: String,
    name: String,
    payload: Payload,
    tick: u64,
    emitted_at: Instant,
}

impl Signal {
    /// Name of the signal queued by the runtime before the first tick.
    pub const STARTUP: &'static str = ":startup";

    /// Creates a signal stamped with the current instant.
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        payload: Payload,
        tick: u64,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            payload,
            tick,
            emitted_at: Instant::now(),
        }
    }

    /// Name of the module that emitted this signal.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Name of the signal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The attached payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// The tick during which the signal was emitted.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// The instant at which the signal was emitted.
    pub fn emitted_at(&self) -> Instant {
        self.emitted_at
    }
}
