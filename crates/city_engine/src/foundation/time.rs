//! Stopwatches and rate limiting

use std::time::{Duration, Instant};

/// Accumulating stopwatch
///
/// Measures wall-clock time across one or more start/stop spans; the restyle
/// budget uses it to meter how much of a tick has been spent.
pub struct Stopwatch {
    start_time: Option<Instant>,
    banked: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a stopwatch that has not started measuring
    pub fn new() -> Self {
        Self {
            start_time: None,
            banked: Duration::ZERO,
        }
    }

    /// Create a stopwatch that is already measuring
    pub fn start_new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            banked: Duration::ZERO,
        }
    }

    /// Begin a measurement span
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// End the current span, banking the time it accrued
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.banked += start.elapsed();
        }
    }

    /// Total measured time, the running span included
    pub fn elapsed(&self) -> Duration {
        let running = self
            .start_time
            .map_or(Duration::ZERO, |start| start.elapsed());
        self.banked + running
    }

    /// Total measured time in fractional milliseconds
    pub fn elapsed_millis(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Whether a span is currently being measured
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

/// Rate limiter for work that must not run more often than a fixed interval.
///
/// Used to bound the cost of the per-tick LOD evaluation on large scenes:
/// callers may invoke it every frame, but the guarded work runs at most once
/// per interval. A zero interval disables the throttle entirely.
pub struct Throttle {
    interval: Duration,
    last_run: Option<Instant>,
}

impl Throttle {
    /// Create a throttle with the given minimum interval between runs
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
        }
    }

    /// Check whether the guarded work may run now.
    ///
    /// Returns `true` (and arms the interval) if the interval has elapsed
    /// since the last accepted call, `false` otherwise. The first call is
    /// always accepted.
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        match self.last_run {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_run = Some(now);
                true
            }
        }
    }

    /// The configured minimum interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Forget the last run so the next `ready` call is accepted
    pub fn reset(&mut self) {
        self.last_run = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopwatch_accumulates() {
        let sw = Stopwatch::start_new();
        assert!(sw.is_running());
        // Immediately read: elapsed is small but monotonic
        let first = sw.elapsed();
        let second = sw.elapsed();
        assert!(second >= first);
    }

    #[test]
    fn test_throttle_rejects_within_interval() {
        let mut throttle = Throttle::new(Duration::from_secs(60));
        assert!(throttle.ready());
        // Second call lands well inside the interval
        assert!(!throttle.ready());
        assert!(!throttle.ready());
    }

    #[test]
    fn test_throttle_zero_interval_always_ready() {
        let mut throttle = Throttle::new(Duration::ZERO);
        assert!(throttle.ready());
        assert!(throttle.ready());
        assert!(throttle.ready());
    }

    #[test]
    fn test_throttle_reset_rearms() {
        let mut throttle = Throttle::new(Duration::from_secs(60));
        assert!(throttle.ready());
        assert!(!throttle.ready());
        throttle.reset();
        assert!(throttle.ready());
    }
}
