/// Clock sources for the detection deadline
///
/// The poll loop only needs "what time is it" and "let the processor go for a
/// moment". Both are behind [`Clock`] so tests can drive time by hand.

use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait Clock: Send + Sync {
    /// Current wall-clock time
    fn now(&self) -> SystemTime;

    /// Pause between polls. A zero interval just yields the thread.
    fn idle(&self, interval: Duration);
}

/// Real-time (wall) clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn idle(&self, interval: Duration) {
        if interval.is_zero() {
            thread::yield_now();
        } else {
            thread::sleep(interval);
        }
    }
}

/// Hand-driven clock
///
/// Time only moves through [`ManualClock::advance`] or `idle`. Idling with a
/// zero interval advances by `tick` so a yield-only poll loop still
/// terminates.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: SystemTime,
    now: Arc<Mutex<SystemTime>>,
    tick: Duration,
}

impl ManualClock {
    /// Clock reading the Unix epoch
    pub fn new(tick: Duration) -> Self {
        Self::starting_at(UNIX_EPOCH, tick)
    }

    pub fn starting_at(origin: SystemTime, tick: Duration) -> Self {
        Self {
            origin,
            now: Arc::new(Mutex::new(origin)),
            tick,
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Time advanced since the clock was created
    pub fn elapsed(&self) -> Duration {
        self.now
            .lock()
            .duration_since(self.origin)
            .unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(1))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock()
    }

    fn idle(&self, interval: Duration) {
        let step = if interval.is_zero() { self.tick } else { interval };
        self.advance(step);
    }
}
