mod bus;
mod estimator;
mod linux_i2c;
mod sample;
#[cfg(test)]
pub(crate) mod scripted_bus;
#[cfg(test)]
mod tests;

pub use bus::{BusError, RegisterBus, RetryPolicy};
pub use estimator::{AttitudeEstimator, AttitudeSnapshot, EstimatorError};
pub use linux_i2c::LinuxI2cBus;
