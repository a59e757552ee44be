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

//! Turning the import list into live module instances.

use crate::catalog::ModuleCatalog;
use crate::error::RegistryError;
use pulse_config::ResolvedConfig;
use pulse_core::{Interest, Module, ModuleConfig, ModuleDescriptor, Signal, CORE_MODULE};
use std::collections::BTreeSet;

/// Whether a module still takes part in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleStatus {
    /// Ticked every cycle.
    Active,
    /// Its update hook failed; it is never ticked again.
    Faulted,
}

/// A constructed module bound to its resolved configuration.
pub struct ModuleInstance {
    descriptor: ModuleDescriptor,
    config: ModuleConfig,
    module: Box<dyn Module>,
    status: ModuleStatus,
}

impl ModuleInstance {
    fn new(descriptor: ModuleDescriptor, config: ModuleConfig, module: Box<dyn Module>) -> Self {
        Self {
            descriptor,
            config,
            module,
            status: ModuleStatus::Active,
        }
    }

    /// The module name.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The static description of the implementation.
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// The configuration the module was constructed with.
    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    /// Current status.
    pub fn status(&self) -> ModuleStatus {
        self.status
    }

    /// Returns `true` unless the module has faulted.
    pub fn is_active(&self) -> bool {
        self.status == ModuleStatus::Active
    }

    pub(crate) fn module_mut(&mut self) -> &mut dyn Module {
        self.module.as_mut()
    }

    pub(crate) fn mark_faulted(&mut self) {
        self.status = ModuleStatus::Faulted;
    }
}

impl std::fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("name", &self.name())
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// The ordered set of modules taking part in a run.
///
/// Order is construction order, which is also tick order.
#[derive(Debug, Default)]
pub struct ModuleSet {
    instances: Vec<ModuleInstance>,
}

impl ModuleSet {
    /// Number of modules.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Module names in tick order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.iter().map(ModuleInstance::name)
    }

    /// Looks a module up by name.
    pub fn get(&self, name: &str) -> Option<&ModuleInstance> {
        self.instances.iter().find(|instance| instance.name() == name)
    }

    /// Iterates the modules in tick order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleInstance> {
        self.instances.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModuleInstance> {
        self.instances.iter_mut()
    }

    /// Number of modules that have not faulted.
    pub fn active_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_active()).count()
    }

    /// `(module, signal)` pairs where a module waits for a signal that no
    /// module in the set declares it produces.
    pub fn unproduced_signals(&self) -> Vec<(String, String)> {
        let produced: BTreeSet<&str> = self
            .instances
            .iter()
            .flat_map(|i| i.descriptor.produced().iter().map(String::as_str))
            .chain([Signal::STARTUP])
            .collect();

        let mut missing = Vec::new();
        for instance in &self.instances {
            if let Interest::Named(names) = instance.descriptor.interest() {
                for name in names.iter().filter(|n| !produced.contains(n.as_str())) {
                    missing.push((instance.name().to_string(), name.clone()));
                }
            }
        }
        missing
    }
}

/// Builds module sets from a [`ModuleCatalog`].
#[derive(Debug)]
pub struct ModuleRegistry {
    catalog: ModuleCatalog,
}

impl ModuleRegistry {
    /// Creates a registry backed by `catalog`.
    pub fn new(catalog: ModuleCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog this registry instantiates from.
    pub fn catalog(&self) -> &ModuleCatalog {
        &self.catalog
    }

    /// Constructs every module named in `imports`, in order.
    ///
    /// Activation is all or nothing: every name is checked against the catalog
    /// before anything is constructed, and a failing factory discards the
    /// modules built before it. Modules without a configuration block are
    /// constructed with an empty configuration.
    pub fn build(
        &self,
        resolved: &ResolvedConfig,
        imports: &[String],
    ) -> Result<ModuleSet, RegistryError> {
        let mut names: Vec<&str> = Vec::with_capacity(imports.len());
        for name in imports {
            if name == CORE_MODULE {
                return Err(RegistryError::ReservedModule(name.clone()));
            }
            if !self.catalog.contains(name) {
                return Err(RegistryError::UnknownModule(name.clone()));
            }
            if names.contains(&name.as_str()) {
                log::warn!("ModuleRegistry: Ignoring repeated import of '{name}'.");
                continue;
            }
            names.push(name);
        }

        let mut instances = Vec::with_capacity(names.len());
        for name in names {
            let config = match resolved.module(name) {
                Some(config) => config.clone(),
                None => {
                    log::debug!("ModuleRegistry: No configuration for '{name}', using defaults.");
                    ModuleConfig::new()
                }
            };

            let module = self
                .catalog
                .instantiate(name, &config)
                .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))?
                .map_err(|source| RegistryError::Construction {
                    module: name.to_string(),
                    source,
                })?;
            let descriptor = self
                .catalog
                .descriptor(name)
                .cloned()
                .ok_or_else(|| RegistryError::UnknownModule(name.to_string()))?;

            log::info!("ModuleRegistry: Constructed '{name}'.");
            instances.push(ModuleInstance::new(descriptor, config, module));
        }

        let set = ModuleSet { instances };
        for (module, signal) in set.unproduced_signals() {
            log::warn!(
                "ModuleRegistry: '{module}' waits for signal '{signal}', which no imported module produces."
            );
        }
        Ok(set)
    }
}
