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

//! # Pulse Modules
//!
//! Modules packaged with the runtime. They are made available by calling
//! [`register_builtin`] on the catalog before the module set is built.

#![warn(missing_docs)]

pub mod heartbeat;
pub mod journal;

pub use heartbeat::Heartbeat;
pub use journal::Journal;

use pulse_control::{ModuleCatalog, RegistryError};

/// Registers every packaged module into `catalog`.
pub fn register_builtin(catalog: &mut ModuleCatalog) -> Result<(), RegistryError> {
    catalog.register::<Heartbeat>()?;
    catalog.register::<Journal>()?;
    Ok(())
}
