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

//! The contract every pluggable module implements.

use crate::config::ModuleConfig;
use crate::error::ModuleError;
use crate::signal::{Payload, Signal};
use std::collections::BTreeSet;

/// Which signals a module wants delivered to its update hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Interest {
    /// The module never receives signals.
    #[default]
    Nothing,
    /// The module receives every signal.
    Any,
    /// The module receives only the named signals.
    Named(BTreeSet<String>),
}

impl Interest {
    /// Returns `true` if a signal called `name` should be delivered.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Interest::Nothing => false,
            Interest::Any => true,
            Interest::Named(names) => names.contains(name),
        }
    }
}

/// Static description of a module implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    name: String,
    produces: BTreeSet<String>,
    interest: Interest,
}

impl ModuleDescriptor {
    /// Creates a descriptor for a module that neither produces nor consumes signals.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            produces: BTreeSet::new(),
            interest: Interest::Nothing,
        }
    }

    /// Declares the signals this module emits.
    pub fn produces<I, S>(mut self, signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.produces.extend(signals.into_iter().map(Into::into));
        self
    }

    /// Subscribes the module to the named signals.
    pub fn consumes<I, S>(mut self, signals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = match self.interest {
            Interest::Named(names) => names,
            _ => BTreeSet::new(),
        };
        names.extend(signals.into_iter().map(Into::into));
        self.interest = Interest::Named(names);
        self
    }

    /// Subscribes the module to every signal.
    pub fn consumes_any(mut self) -> Self {
        self.interest = Interest::Any;
        self
    }

    /// The module name used in configuration and in import lists.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signals this module declares it emits.
    pub fn produced(&self) -> &BTreeSet<String> {
        &self.produces
    }

    /// Signals this module wants delivered.
    pub fn interest(&self) -> &Interest {
        &self.interest
    }
}

/// A signal emitted from an update hook, before the scheduler stamps it.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// Signal name.
    pub name: String,
    /// Signal payload.
    pub payload: Payload,
}

/// Per-invocation view handed to [`Module::on_tick`].
///
/// Holds the signals delivered this tick and collects the module's emissions.
/// Emissions stay private to this context until the scheduler publishes them
/// for the next tick.
pub struct TickContext<'a> {
    tick: u64,
    inbound: &'a [Signal],
    outbox: Vec<Emission>,
}

impl<'a> TickContext<'a> {
    /// Creates a context for `tick` delivering `inbound`.
    pub fn new(tick: u64, inbound: &'a [Signal]) -> Self {
        Self {
            tick,
            inbound,
            outbox: Vec::new(),
        }
    }

    /// The index of the current tick, starting at zero.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Signals emitted during the previous tick that match this module's interest.
    pub fn inbound(&self) -> &'a [Signal] {
        self.inbound
    }

    /// Inbound signals called `name`.
    pub fn received<'n>(&self, name: &'n str) -> impl Iterator<Item = &'a Signal> + 'n
    where
        'a: 'n,
    {
        self.inbound.iter().filter(move |s| s.name() == name)
    }

    /// Queues a signal for delivery at the next tick.
    pub fn emit(&mut self, name: impl Into<String>, payload: Payload) {
        self.outbox.push(Emission {
            name: name.into(),
            payload,
        });
    }

    /// Consumes the context and returns everything emitted through it.
    pub fn into_emissions(self) -> Vec<Emission> {
        self.outbox
    }
}

/// A pluggable unit of behavior driven by the scheduler.
///
/// Implementations are constructed from their resolved configuration block and
/// then ticked at the configured rate for the rest of the process lifetime.
pub trait Module: Send + 'static {
    /// Returns the static description of this implementation.
    fn descriptor() -> ModuleDescriptor
    where
        Self: Sized;

    /// Builds the module from its configuration.
    ///
    /// `config` is empty when no configuration block names this module; a
    /// module must then fall back to its defaults.
    fn configure(config: &ModuleConfig) -> Result<Self, ModuleError>
    where
        Self: Sized;

    /// Runs one update step.
    ///
    /// Returning an error marks the module as faulted and excludes it from all
    /// further ticks.
    fn on_tick(&mut self, ctx: &mut TickContext<'_>) -> Result<(), ModuleError>;

    /// Called once when the scheduler drains, for modules that never faulted.
    fn on_shutdown(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_descriptor_consumes_nothing() {
        let descriptor = ModuleDescriptor::new("idle");
        assert_eq!(descriptor.name(), "idle");
        assert!(!descriptor.interest().matches("anything"));
        assert!(descriptor.produced().is_empty());
    }

    #[test]
    fn test_named_interest_matches_only_listed_signals() {
        let descriptor = ModuleDescriptor::new("nlp")
            .consumes(["rawio:in"])
            .consumes(["telegram:msg"]);
        assert!(descriptor.interest().matches("rawio:in"));
        assert!(descriptor.interest().matches("telegram:msg"));
        assert!(!descriptor.interest().matches("rawio:out"));
    }

    #[test]
    fn test_any_interest_matches_everything() {
        let descriptor = ModuleDescriptor::new("journal").consumes_any();
        assert!(descriptor.interest().matches(Signal::STARTUP));
        assert!(descriptor.interest().matches("x"));
    }

    #[test]
    fn test_tick_context_collects_emissions_in_order() {
        let inbound = vec![
            Signal::new("a", "ping", json!(1), 3),
            Signal::new("b", "pong", json!(2), 3),
        ];
        let mut ctx = TickContext::new(4, &inbound);
        assert_eq!(ctx.tick(), 4);
        assert_eq!(ctx.received("pong").count(), 1);

        ctx.emit("first", json!(null));
        ctx.emit("second", json!({"n": 2}));

        let emitted = ctx.into_emissions();
        let names: Vec<_> = emitted.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }
}
