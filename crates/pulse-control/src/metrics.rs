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

//! Tick timing and drift bookkeeping.

use std::time::Duration;

/// A fixed-size circular buffer of samples.
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    data: [Duration; N],
    index: usize,
    count: usize,
}

impl<const N: usize> RingBuffer<N> {
    /// Creates a new, empty ring buffer.
    pub fn new() -> Self {
        Self {
            data: [Duration::ZERO; N],
            index: 0,
            count: 0,
        }
    }

    /// Pushes a new sample, overwriting the oldest if full.
    pub fn push(&mut self, value: Duration) {
        self.data[self.index] = value;
        self.index = (self.index + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    /// Returns the number of samples currently held.
    pub fn count(&self) -> usize {
        self.count
    }

    fn samples(&self) -> &[Duration] {
        // Until the buffer wraps, samples occupy the first `count` slots.
        &self.data[..self.count]
    }

    /// Mean of the held samples, zero if empty.
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        self.samples().iter().sum::<Duration>() / self.count as u32
    }

    /// Largest held sample, zero if empty.
    pub fn max(&self) -> Duration {
        self.samples().iter().copied().max().unwrap_or(Duration::ZERO)
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling tick durations plus drift tracking for one scheduler run.
///
/// Drift is how far a tick's actual start lags behind its scheduled start.
/// Crossing the threshold is reported once; the report re-arms when the
/// scheduler catches up again.
#[derive(Debug, Clone)]
pub struct TickMetrics {
    durations: RingBuffer<120>,
    threshold: Duration,
    current_drift: Duration,
    max_drift: Duration,
    over_threshold: bool,
    drift_reports: u32,
}

impl TickMetrics {
    /// Creates metrics reporting drift above `threshold`.
    pub fn new(threshold: Duration) -> Self {
        Self {
            durations: RingBuffer::new(),
            threshold,
            current_drift: Duration::ZERO,
            max_drift: Duration::ZERO,
            over_threshold: false,
            drift_reports: 0,
        }
    }

    /// Records how long one tick took.
    pub fn record_tick(&mut self, duration: Duration) {
        self.durations.push(duration);
    }

    /// Records the drift observed at the start of a tick.
    ///
    /// Returns `true` when this sample crosses the threshold, i.e. when a
    /// report should be emitted.
    pub fn record_drift(&mut self, drift: Duration) -> bool {
        self.current_drift = drift;
        self.max_drift = self.max_drift.max(drift);

        if drift > self.threshold {
            if !self.over_threshold {
                self.over_threshold = true;
                self.drift_reports += 1;
                return true;
            }
        } else {
            self.over_threshold = false;
        }
        false
    }

    /// The configured drift threshold.
    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Drift observed at the most recent tick.
    pub fn current_drift(&self) -> Duration {
        self.current_drift
    }

    /// Largest drift observed so far.
    pub fn max_drift(&self) -> Duration {
        self.max_drift
    }

    /// Number of threshold crossings reported so far.
    pub fn drift_reports(&self) -> u32 {
        self.drift_reports
    }

    /// Returns `true` while drift stays above the threshold.
    pub fn is_drifting(&self) -> bool {
        self.over_threshold
    }

    /// Mean duration of the recent ticks.
    pub fn average_tick(&self) -> Duration {
        self.durations.average()
    }

    /// Longest of the recent ticks.
    pub fn longest_tick(&self) -> Duration {
        self.durations.max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_ring_buffer_empty() {
        let buffer = RingBuffer::<4>::new();
        assert_eq!(buffer.count(), 0);
        assert_eq!(buffer.average(), Duration::ZERO);
        assert_eq!(buffer.max(), Duration::ZERO);
    }

    #[test]
    fn test_ring_buffer_overwrites_oldest() {
        let mut buffer = RingBuffer::<3>::new();
        for n in [10, 20, 30, 40] {
            buffer.push(ms(n));
        }
        assert_eq!(buffer.count(), 3);
        // 10 was overwritten by 40
        assert_eq!(buffer.average(), ms(30));
        assert_eq!(buffer.max(), ms(40));
    }

    #[test]
    fn test_drift_below_threshold_is_not_reported() {
        let mut metrics = TickMetrics::new(ms(50));
        assert!(!metrics.record_drift(ms(10)));
        assert!(!metrics.record_drift(ms(50)));
        assert_eq!(metrics.drift_reports(), 0);
        assert_eq!(metrics.max_drift(), ms(50));
    }

    #[test]
    fn test_drift_crossing_is_reported_once() {
        let mut metrics = TickMetrics::new(ms(50));
        assert!(metrics.record_drift(ms(60)));
        assert!(!metrics.record_drift(ms(120)));
        assert!(metrics.is_drifting());
        assert_eq!(metrics.drift_reports(), 1);
        assert_eq!(metrics.max_drift(), ms(120));
    }

    #[test]
    fn test_drift_report_rearms_after_catching_up() {
        let mut metrics = TickMetrics::new(ms(50));
        assert!(metrics.record_drift(ms(60)));
        assert!(!metrics.record_drift(ms(0)));
        assert!(!metrics.is_drifting());
        assert!(metrics.record_drift(ms(70)));
        assert_eq!(metrics.drift_reports(), 2);
        assert_eq!(metrics.current_drift(), ms(70));
    }

    #[test]
    fn test_tick_durations_are_averaged() {
        let mut metrics = TickMetrics::new(ms(50));
        metrics.record_tick(ms(2));
        metrics.record_tick(ms(4));
        assert_eq!(metrics.average_tick(), ms(3));
        assert_eq!(metrics.longest_tick(), ms(4));
    }
}
