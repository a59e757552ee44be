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

//! The fixed-rate tick driver.
//!
//! Every tick invokes the active modules in construction order. Signals
//! emitted during tick `N` are collected in a fresh queue which only replaces
//! the pending queue once the whole tick has finished, so every module sees
//! exactly the emissions of tick `N` at tick `N + 1`, whatever its position
//! in the order.

use crate::error::SchedulerError;
use crate::metrics::TickMetrics;
use crate::registry::ModuleSet;
use crate::state::{SchedulerState, SharedState};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use pulse_config::CoreSettings;
use pulse_core::{Payload, Signal, TickContext, CORE_MODULE};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;
use std::time::{Duration, Instant};

/// Configuration for the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Ticks per second.
    pub tick_rate: u32,
    /// Scheduling lag above which a drift warning is reported.
    pub drift_threshold: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            drift_threshold: CoreSettings::DEFAULT_DRIFT_THRESHOLD,
        }
    }
}

impl SchedulerConfig {
    /// The time budget of one tick.
    pub fn period(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate.max(1)))
    }
}

impl From<&CoreSettings> for SchedulerConfig {
    fn from(core: &CoreSettings) -> Self {
        Self {
            tick_rate: core.tickrate,
            drift_threshold: core.drift_threshold,
        }
    }
}

/// A module update hook that failed during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFault {
    /// The faulted module.
    pub module: String,
    /// The tick during which it failed.
    pub tick: u64,
    /// The returned error or panic message.
    pub reason: String,
}

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Index of the tick.
    pub tick: u64,
    /// Number of update hooks invoked.
    pub invoked: usize,
    /// Number of signals that were pending at the start of the tick.
    pub pending: usize,
    /// Number of signals emitted for the next tick.
    pub emitted: usize,
    /// Modules that faulted during this tick.
    pub faulted: Vec<String>,
}

/// Final statistics of a scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Number of completed ticks.
    pub ticks: u64,
    /// Every module fault, in the order they happened.
    pub faults: Vec<ModuleFault>,
    /// How many times drift crossed the threshold.
    pub drift_reports: u32,
    /// Largest drift observed.
    pub max_drift: Duration,
    /// Mean duration of the most recent ticks.
    pub average_tick: Duration,
}

/// Drives a [`ModuleSet`] at a fixed rate.
pub struct Scheduler {
    config: SchedulerConfig,
    modules: ModuleSet,
    pending: Vec<Signal>,
    tick: u64,
    faults: Vec<ModuleFault>,
    metrics: TickMetrics,
    state: SharedState,
}

impl Scheduler {
    /// Creates an idle scheduler owning `modules`.
    ///
    /// The built-in `:startup` signal is queued for delivery at the first tick.
    pub fn new(config: SchedulerConfig, modules: ModuleSet) -> Self {
        let metrics = TickMetrics::new(config.drift_threshold);
        Self {
            config,
            modules,
            pending: vec![Signal::new(CORE_MODULE, Signal::STARTUP, Payload::Null, 0)],
            tick: 0,
            faults: Vec::new(),
            metrics,
            state: SharedState::default(),
        }
    }

    /// The scheduler configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state.get()
    }

    /// The driven modules, in tick order.
    pub fn modules(&self) -> &ModuleSet {
        &self.modules
    }

    /// Number of ticks completed so far, which is also the index of the next tick.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Signals waiting for delivery at the next tick.
    pub fn pending_signals(&self) -> &[Signal] {
        &self.pending
    }

    /// Module faults recorded so far.
    pub fn faults(&self) -> &[ModuleFault] {
        &self.faults
    }

    /// Timing statistics of the current run.
    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    /// Runs exactly one tick without waiting for its deadline.
    ///
    /// Fails once the scheduler is draining or stopped.
    pub fn step(&mut self) -> Result<TickSummary, SchedulerError> {
        let state = self.state();
        if !state.accepts_ticks() {
            return Err(SchedulerError::InvalidTransition {
                from: state,
                to: SchedulerState::Running,
            });
        }

        let tick = self.tick;
        let inbound = std::mem::take(&mut self.pending);
        let mut outbound = Vec::new();
        let mut summary = TickSummary {
            tick,
            pending: inbound.len(),
            ..Default::default()
        };

        for instance in self.modules.iter_mut().filter(|i| i.is_active()) {
            let delivered: Vec<Signal> = inbound
                .iter()
                .filter(|signal| instance.descriptor().interest().matches(signal.name()))
                .cloned()
                .collect();

            let mut ctx = TickContext::new(tick, &delivered);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                instance.module_mut().on_tick(&mut ctx)
            }));
            summary.invoked += 1;

            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(payload) => Some(format!("panicked: {}", panic_message(payload.as_ref()))),
            };

            match failure {
                None => {
                    let source = instance.name();
                    outbound.extend(
                        ctx.into_emissions()
                            .into_iter()
                            .map(|e| Signal::new(source, e.name, e.payload, tick)),
                    );
                }
                Some(reason) => {
                    log::error!(
                        "Scheduler: Module '{}' faulted at tick {tick}: {reason}. It will not be ticked again.",
                        instance.name()
                    );
                    instance.mark_faulted();
                    summary.faulted.push(instance.name().to_string());
                    self.faults.push(ModuleFault {
                        module: instance.name().to_string(),
                        tick,
                        reason,
                    });
                }
            }
        }

        summary.emitted = outbound.len();
        self.pending = outbound;
        self.tick += 1;

        log::trace!(
            "Scheduler: Tick {tick} invoked {} module(s), delivered {} and queued {} signal(s).",
            summary.invoked,
            summary.pending,
            summary.emitted
        );
        Ok(summary)
    }

    /// Ticks on the current thread until `shutdown` receives a message or is
    /// disconnected, then drains and stops.
    ///
    /// Shutdown is only observed between ticks; a request queued before the
    /// first tick stops the scheduler without ticking. A tick that overruns its
    /// period is followed immediately by the next one; the resulting lag is
    /// tracked as drift.
    pub fn run(&mut self, shutdown: &Receiver<()>) -> Result<SchedulerReport, SchedulerError> {
        self.transition(SchedulerState::Running)?;

        let period = self.config.period();
        log::info!(
            "Scheduler: Running {} module(s) at {} Hz ({:?} per tick).",
            self.modules.len(),
            self.config.tick_rate,
            period
        );

        let mut deadline = Instant::now();
        loop {
            match shutdown.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            let started = Instant::now();
            let drift = started.saturating_duration_since(deadline);
            if self.metrics.record_drift(drift) {
                log::warn!(
                    "Scheduler: Running {:?} behind schedule at tick {} (threshold {:?}).",
                    drift,
                    self.tick,
                    self.metrics.threshold()
                );
            }

            self.step()?;
            self.metrics.record_tick(started.elapsed());

            deadline += period;
            let wait = deadline.saturating_duration_since(Instant::now());
            match shutdown.recv_timeout(wait) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }
        }

        self.transition(SchedulerState::Draining)?;
        log::info!("Scheduler: Draining after {} tick(s).", self.tick);
        self.drain();
        self.transition(SchedulerState::Stopped)?;
        log::info!("Scheduler: Stopped.");

        Ok(self.report())
    }

    /// Moves the scheduler to a dedicated thread and starts ticking.
    pub fn spawn(mut self) -> Result<SchedulerHandle, SchedulerError> {
        let state = self.state();
        if state != SchedulerState::Idle {
            return Err(SchedulerError::InvalidTransition {
                from: state,
                to: SchedulerState::Running,
            });
        }

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let shared = self.state.clone();
        let thread = thread::Builder::new()
            .name("pulse-scheduler".to_string())
            .spawn(move || self.run(&shutdown_rx))
            .map_err(SchedulerError::Spawn)?;

        Ok(SchedulerHandle {
            shutdown: shutdown_tx,
            state: shared,
            thread: Some(thread),
        })
    }

    /// A snapshot of the run statistics.
    pub fn report(&self) -> SchedulerReport {
        SchedulerReport {
            ticks: self.tick,
            faults: self.faults.clone(),
            drift_reports: self.metrics.drift_reports(),
            max_drift: self.metrics.max_drift(),
            average_tick: self.metrics.average_tick(),
        }
    }

    fn transition(&self, next: SchedulerState) -> Result<(), SchedulerError> {
        self.state
            .transition(next)
            .map_err(|from| SchedulerError::InvalidTransition { from, to: next })
    }

    fn drain(&mut self) {
        for instance in self.modules.iter_mut().filter(|i| i.is_active()) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                instance.module_mut().on_shutdown()
            }));
            if let Err(payload) = outcome {
                log::error!(
                    "Scheduler: Module '{}' panicked while shutting down: {}",
                    instance.name(),
                    panic_message(payload.as_ref())
                );
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("tick", &self.tick)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}

/// Controls a scheduler running on its own thread.
///
/// Dropping the handle requests shutdown and waits for the thread to finish.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: Sender<()>,
    state: SharedState,
    thread: Option<thread::JoinHandle<Result<SchedulerReport, SchedulerError>>>,
}

impl SchedulerHandle {
    /// Current lifecycle state of the scheduler.
    pub fn state(&self) -> SchedulerState {
        self.state.get()
    }

    /// Asks the scheduler to drain after the tick in flight.
    pub fn request_shutdown(&self) {
        ShutdownRequester::new(&self.shutdown).request();
    }

    /// A cloneable way to request shutdown while another thread waits in
    /// [`SchedulerHandle::join`].
    pub fn shutdown_requester(&self) -> ShutdownRequester {
        ShutdownRequester::new(&self.shutdown)
    }

    /// Waits for the scheduler thread to finish, without requesting shutdown.
    pub fn join(mut self) -> Result<SchedulerReport, SchedulerError> {
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| SchedulerError::ThreadPanicked)?,
            None => Err(SchedulerError::ThreadPanicked),
        }
    }

    /// Requests shutdown and waits for the final report.
    pub fn shutdown(self) -> Result<SchedulerReport, SchedulerError> {
        self.request_shutdown();
        self.join()
    }
}

/// Requests shutdown of a spawned scheduler.
#[derive(Debug, Clone)]
pub struct ShutdownRequester {
    shutdown: Sender<()>,
}

impl ShutdownRequester {
    fn new(shutdown: &Sender<()>) -> Self {
        Self {
            shutdown: shutdown.clone(),
        }
    }

    /// Asks the scheduler to drain after the tick in flight.
    pub fn request(&self) {
        // A full channel means a request is already queued.
        let _ = self.shutdown.try_send(());
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.request_shutdown();
            let _ = thread.join();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
