//! Time source for animation and frame pacing
//!
//! The frame scheduler never reads the system clock directly; it asks a
//! `Clock`, so tests can drive time by hand and skip real sleeps.

#[cfg(test)]
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time source plus the ability to wait
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created
    fn elapsed(&self) -> Duration;

    /// Block the calling thread for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall-clock implementation backed by `Instant`
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Hand-driven clock for tests
///
/// `sleep` advances the clock and records the request instead of blocking,
/// so pacing decisions can be asserted. It still yields the thread so a
/// loop driven by this clock lets other threads in.
#[cfg(test)]
pub struct ManualClock {
    state: Mutex<ManualClockState>,
}

#[cfg(test)]
struct ManualClockState {
    now: Duration,
    sleeps: Vec<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualClockState {
                now: Duration::ZERO,
                sleeps: Vec::new(),
            }),
        }
    }

    /// Move time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.now += duration;
        }
    }

    /// Every duration passed to `sleep`, in call order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().map(|state| state.sleeps.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        self.state.lock().map(|state| state.now).unwrap_or_default()
    }

    fn sleep(&self, duration: Duration) {
        if let Ok(mut state) = self.state.lock() {
            state.now += duration;
            state.sleeps.push(duration);
        }
        std::thread::yield_now();
    }
}

/// Time left in a fixed-rate budget after `work` took `elapsed`
///
/// `rate_per_second` iterations per second give a budget of
/// `1_000_000 / rate` microseconds. `None` once the budget is spent.
pub fn pacing_delay(rate_per_second: u32, elapsed: Duration) -> Option<Duration> {
    let budget = Duration::from_micros(1_000_000 / u64::from(rate_per_second.max(1)));
    budget.checked_sub(elapsed).filter(|delay| !delay.is_zero())
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
