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

//! The catalog of module implementations linked into the process.

use crate::error::RegistryError;
use pulse_core::{Module, ModuleConfig, ModuleDescriptor, ModuleError, CORE_MODULE};
use std::collections::BTreeMap;
use std::fmt;

/// Builds a module instance from its resolved configuration.
pub type ModuleFactory =
    Box<dyn Fn(&ModuleConfig) -> Result<Box<dyn Module>, ModuleError> + Send + Sync>;

struct CatalogEntry {
    descriptor: ModuleDescriptor,
    factory: ModuleFactory,
}

/// Maps module names to their descriptor and factory.
///
/// The catalog is an ordinary value: each module package registers its
/// implementations through an explicit call during process initialisation, and
/// the populated catalog is then handed to the [`ModuleRegistry`].
///
/// [`ModuleRegistry`]: crate::registry::ModuleRegistry
#[derive(Default)]
pub struct ModuleCatalog {
    entries: BTreeMap<String, CatalogEntry>,
}

impl ModuleCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the implementation `M` under its descriptor's name.
    pub fn register<M: Module>(&mut self) -> Result<(), RegistryError> {
        self.register_factory(M::descriptor(), |config| {
            Ok(Box::new(M::configure(config)?) as Box<dyn Module>)
        })
    }

    /// Registers an arbitrary factory under `descriptor`'s name.
    pub fn register_factory<F>(
        &mut self,
        descriptor: ModuleDescriptor,
        factory: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(&ModuleConfig) -> Result<Box<dyn Module>, ModuleError> + Send + Sync + 'static,
    {
        let name = descriptor.name().to_string();
        if name == CORE_MODULE {
            return Err(RegistryError::ReservedModule(name));
        }
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateModule(name));
        }

        log::debug!("ModuleCatalog: Registered implementation '{name}'.");
        self.entries.insert(
            name,
            CatalogEntry {
                descriptor,
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    /// Returns `true` if an implementation is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The descriptor registered under `name`.
    pub fn descriptor(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.entries.get(name).map(|entry| &entry.descriptor)
    }

    /// Names of all registered implementations, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered implementations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Runs the factory registered under `name`, or returns `None` if there is none.
    pub fn instantiate(
        &self,
        name: &str,
        config: &ModuleConfig,
    ) -> Option<Result<Box<dyn Module>, ModuleError>> {
        self.entries.get(name).map(|entry| (entry.factory)(config))
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::TickContext;

    struct Quiet;

    impl Module for Quiet {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new("quiet")
        }
        fn configure(_: &ModuleConfig) -> Result<Self, ModuleError> {
            Ok(Quiet)
        }
        fn on_tick(&mut self, _: &mut TickContext<'_>) -> Result<(), ModuleError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut catalog = ModuleCatalog::new();
        catalog.register::<Quiet>().unwrap();
        assert!(catalog.contains("quiet"));
        assert_eq!(catalog.descriptor("quiet").map(|d| d.name()), Some("quiet"));
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["quiet"]);
        assert!(catalog.instantiate("quiet", &ModuleConfig::new()).unwrap().is_ok());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut catalog = ModuleCatalog::new();
        catalog.register::<Quiet>().unwrap();
        let err = catalog.register::<Quiet>().unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateModule(ref name) if name == "quiet"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_core_cannot_be_registered() {
        let mut catalog = ModuleCatalog::new();
        let err = catalog
            .register_factory(ModuleDescriptor::new("core"), |_| Ok(Box::new(Quiet)))
            .unwrap_err();
        assert!(matches!(err, RegistryError::ReservedModule(_)));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_unknown_name_instantiates_nothing() {
        let catalog = ModuleCatalog::new();
        assert!(catalog.instantiate("missing", &ModuleConfig::new()).is_none());
    }
}
