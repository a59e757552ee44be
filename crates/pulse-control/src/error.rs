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

//! Error types for building and driving the module set.

use crate::state::SchedulerState;
use pulse_core::ModuleError;
use thiserror::Error;

/// An error raised while registering or constructing modules.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An imported name has no implementation in the catalog.
    #[error("no implementation registered for module '{0}'")]
    UnknownModule(String),
    /// A module factory rejected its configuration.
    #[error("module '{module}' failed to construct")]
    Construction {
        /// The module that failed.
        module: String,
        /// What the factory reported.
        #[source]
        source: ModuleError,
    },
    /// The reserved `core` name was used as a module.
    #[error("'{0}' is reserved for runtime settings and cannot be used as a module")]
    ReservedModule(String),
    /// Two implementations were registered under the same name.
    #[error("module '{0}' is already registered")]
    DuplicateModule(String),
}

/// An error raised by the scheduler itself.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The requested lifecycle transition is not allowed.
    #[error("scheduler cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// The current state.
        from: SchedulerState,
        /// The requested state.
        to: SchedulerState,
    },
    /// The tick driver thread could not be started.
    #[error("failed to spawn the scheduler thread")]
    Spawn(#[source] std::io::Error),
    /// The tick driver thread panicked outside of any module hook.
    #[error("the scheduler thread panicked")]
    ThreadPanicked,
}
