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

//! # Pulse Control
//!
//! Builds the live module set from the resolved configuration and drives it
//! at a fixed tick rate.
//!
//! - [`ModuleCatalog`] maps module names to factories. It is populated
//!   explicitly during process initialisation.
//! - [`ModuleRegistry`] turns an import list into an ordered [`ModuleSet`],
//!   all or nothing.
//! - [`Scheduler`] ticks the set, delivering each tick's signals one tick
//!   later and isolating modules whose hooks fail.

#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod scheduler;
pub mod state;

pub use catalog::{ModuleCatalog, ModuleFactory};
pub use error::{RegistryError, SchedulerError};
pub use registry::{ModuleInstance, ModuleRegistry, ModuleSet, ModuleStatus};
pub use scheduler::{
    ModuleFault, Scheduler, SchedulerConfig, SchedulerHandle, SchedulerReport, ShutdownRequester,
    TickSummary,
};
pub use state::SchedulerState;
