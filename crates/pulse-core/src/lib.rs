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

//! # Pulse Core
//!
//! Foundational crate containing the module contract, the signal type, and the
//! opaque configuration values handed to modules at construction time.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod module;
pub mod signal;

pub use config::ModuleConfig;
pub use error::ModuleError;
pub use module::{Emission, Interest, Module, ModuleDescriptor, TickContext};
pub use signal::{Payload, Signal};

/// Name of the reserved module carrying runtime metadata (`import`, `tickrate`).
///
/// The core module is never instantiated; its configuration block only drives
/// the registry and the scheduler.
pub const CORE_MODULE: &str = "core";
