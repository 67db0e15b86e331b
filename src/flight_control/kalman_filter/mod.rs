mod axis_kalman;
#[cfg(test)]
mod tests;

pub use axis_kalman::{AxisKalman, KalmanError};
