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

//! Lifecycle of a scheduler run.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Where a scheduler is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum SchedulerState {
    /// Constructed, not ticking yet.
    #[default]
    Idle = 0,
    /// Ticking at the configured rate.
    Running = 1,
    /// Shutdown requested. No new tick begins.
    Draining = 2,
    /// Terminal.
    Stopped = 3,
}

impl SchedulerState {
    /// Returns `true` if moving from `self` to `next` is a valid transition.
    pub fn can_transition_to(self, next: SchedulerState) -> bool {
        use SchedulerState::*;
        matches!(
            (self, next),
            (Idle, Running) | (Idle, Stopped) | (Running, Draining) | (Draining, Stopped)
        )
    }

    /// Returns `true` if ticks may still be executed in this state.
    pub fn accepts_ticks(self) -> bool {
        matches!(self, SchedulerState::Idle | SchedulerState::Running)
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerState::Idle,
            1 => SchedulerState::Running,
            2 => SchedulerState::Draining,
            _ => SchedulerState::Stopped,
        }
    }
}

/// A lifecycle state readable from other threads.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(crate) fn get(&self) -> SchedulerState {
        SchedulerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next`, returning the previous state if the transition is invalid.
    pub(crate) fn transition(&self, next: SchedulerState) -> Result<(), SchedulerState> {
        let current = self.get();
        if !current.can_transition_to(next) {
            return Err(current);
        }
        self.0.store(next as u8, Ordering::Release);
        Ok(())
    }
}
