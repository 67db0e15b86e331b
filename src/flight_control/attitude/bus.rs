use crate::util::Clock;
use crate::warn;
use std::time::Duration;
use strum_macros::Display;

/// Register-level access to the motion sensor.
///
/// A transfer either completes in full or fails, partial progress is not
/// reported.
pub trait RegisterBus {
    /// Reads `buf.len()` consecutive registers starting at `reg`.
    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), BusError>;

    /// Writes `buf` to consecutive registers starting at `reg`.
    fn write(&mut self, reg: u8, buf: &[u8]) -> Result<(), BusError>;
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    /// A single transfer failed with the given errno.
    Io(i32),
    /// Every attempt allowed by the [`RetryPolicy`] failed.
    RetriesExhausted(u32),
    /// The [`RetryPolicy`] deadline passed before a transfer succeeded.
    Timeout,
}

impl std::error::Error for BusError {}

/// Bounds how long a register transfer may be retried before the failure is
/// escalated to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Deadline measured from the first attempt.
    pub timeout: Duration,
}

impl RetryPolicy {
    /// Five attempts within one 4 ms control period.
    pub const DEFAULT: Self = Self { max_attempts: 5, timeout: Duration::from_millis(4) };

    /// Runs `op` until it succeeds, the attempts run out or the deadline passes.
    ///
    /// # Errors
    /// - [`BusError::RetriesExhausted`] after `max_attempts` failures, at least one.
    /// - [`BusError::Timeout`] if the deadline elapsed first.
    pub fn run<C, T>(&self, clock: &C, mut op: impl FnMut() -> Result<T, BusError>) -> Result<T, BusError>
    where C: Clock {
        let start_us = clock.micros();
        let timeout_us = i64::try_from(self.timeout.as_micros()).unwrap_or(i64::MAX);
        let attempts = self.max_attempts.max(1);
        let mut last_err = None;
        for _ in 0..attempts {
            match op() {
                Ok(val) => return Ok(val),
                Err(e) => last_err = Some(e),
            }
            if clock.micros() - start_us > timeout_us {
                warn!("Bus transfer timed out after {:?}, last error: {last_err:?}", self.timeout);
                return Err(BusError::Timeout);
            }
        }
        warn!("Bus transfer failed {attempts} times, last error: {last_err:?}");
        Err(BusError::RetriesExhausted(attempts))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self { Self::DEFAULT }
}
