use std::time::{Duration, Instant};

/// Monotonic timebase used for sample intervals, calibration windows and bus
/// retry deadlines.
pub trait Clock {
    /// Microseconds since the clock was created.
    fn micros(&self) -> i64;

    /// Milliseconds since the clock was created.
    fn millis(&self) -> i64 { self.micros() / 1000 }

    /// Blocks for `duration`.
    fn delay(&self, duration: Duration);
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self { Self { start: Instant::now() } }
}

impl Default for MonotonicClock {
    fn default() -> Self { Self::new() }
}

impl Clock for MonotonicClock {
    #[allow(clippy::cast_possible_truncation)]
    fn micros(&self) -> i64 { self.start.elapsed().as_micros() as i64 }

    fn delay(&self, duration: Duration) { std::thread::sleep(duration); }
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use super::Clock;
    use std::{cell::Cell, rc::Rc, time::Duration};

    /// Test clock that only moves when told to. Clones share the same time.
    #[derive(Debug, Clone, Default)]
    pub struct ManualClock {
        now_us: Rc<Cell<i64>>,
    }

    impl ManualClock {
        pub fn new() -> Self { Self::default() }

        pub fn advance_us(&self, us: i64) { self.now_us.set(self.now_us.get() + us); }

        pub fn advance_ms(&self, ms: i64) { self.advance_us(ms * 1000); }
    }

    impl Clock for ManualClock {
        fn micros(&self) -> i64 { self.now_us.get() }

        #[allow(clippy::cast_possible_truncation)]
        fn delay(&self, duration: Duration) { self.advance_us(duration.as_micros() as i64); }
    }
}
