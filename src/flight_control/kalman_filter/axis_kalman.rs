use crate::util::{Matrix, StateVector};
use strum_macros::Display;

/// Single-axis angle/bias Kalman filter.
///
/// # State Vector (`state_vec`)
/// - `[angle, bias]`: angle in degrees and gyro bias in deg/s.
///
/// # Measurement Vector (`z`)
/// - `[angle]`: the accelerometer-derived angle in degrees.
///
/// The gyro rate enters as a control input on the predict step, so the filter
/// integrates `rate - bias` and corrects against the accelerometer.
#[derive(Debug, Clone, Copy)]
pub struct AxisKalman {
    /// state vector (x): `[angle, bias]`
    state_vec: StateVector<f64, 2>,
    /// covariance matrix (P): uncertainty of the current state estimate
    cov_mat: Matrix<f64, 2, 2>,
    /// observation matrix (H): only the angle is observed
    obs_matrix: Matrix<f64, 1, 2>,
    /// measurement noise covariance matrix (R)
    meas_noise_cov_mat: Matrix<f64, 1, 1>,
    /// process noise densities (Q), scaled by `dt` on every predict
    process_noise_cov_mat: Matrix<f64, 2, 2>,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum KalmanError {
    /// The sample interval was zero, negative or NaN.
    NonPositiveDt,
    /// Innovation covariance could not be inverted.
    SingularInnovation,
}

impl std::error::Error for KalmanError {}

impl AxisKalman {
    /// Process noise variance of the angle.
    pub const Q_ANGLE: f64 = 0.001;
    /// Process noise variance of the gyro bias.
    pub const Q_BIAS: f64 = 0.003;
    /// Variance of the accelerometer angle measurement.
    pub const R_MEASURE: f64 = 0.03;

    pub fn new() -> Self { Self::with_tuning(Self::Q_ANGLE, Self::Q_BIAS, Self::R_MEASURE) }

    pub fn with_tuning(q_angle: f64, q_bias: f64, r_measure: f64) -> Self {
        Self {
            state_vec: StateVector::zero(),
            cov_mat: Matrix::identity(),
            obs_matrix: Matrix::new([[1.0, 0.0]]),
            meas_noise_cov_mat: Matrix::new([[r_measure]]),
            process_noise_cov_mat: Matrix::diagonal([q_angle, q_bias]),
        }
    }

    /// Hard reset: angle set, bias zeroed, covariance back to identity.
    pub fn set_angle(&mut self, angle: f64) {
        self.state_vec = StateVector::from_array([angle, 0.0]);
        self.cov_mat = Matrix::identity();
    }

    pub fn angle(&self) -> f64 { self.state_vec[0] }

    pub fn bias(&self) -> f64 { self.state_vec[1] }

    pub fn covariance(&self) -> Matrix<f64, 2, 2> { self.cov_mat }

    /// Runs one predict/correct pair and returns the filtered angle.
    ///
    /// # Arguments
    /// - `measured_angle`: accelerometer angle in degrees.
    /// - `measured_rate`: gyro rate in deg/s.
    /// - `dt`: seconds since the previous update, must be strictly positive.
    ///
    /// # Errors
    /// - [`KalmanError::NonPositiveDt`] if `dt <= 0` or NaN. The state is untouched.
    pub fn update(&mut self, measured_angle: f64, measured_rate: f64, dt: f64) -> Result<f64, KalmanError> {
        if dt.is_nan() || dt <= 0.0 {
            return Err(KalmanError::NonPositiveDt);
        }
        let prior = *self;
        self.predict(measured_rate, dt);
        if let Err(e) = self.correct(measured_angle) {
            *self = prior;
            return Err(e);
        }
        Ok(self.angle())
    }

    fn predict(&mut self, rate: f64, dt: f64) {
        // F = [[1, -dt], [0, 1]], rate is the control input on the angle row
        let state_trans_mat = Matrix::new([[1.0, -dt], [0.0, 1.0]]);

        // x = F * x + B * u
        self.state_vec = StateVector::from_matrix(state_trans_mat * self.state_vec.to_matrix());
        self.state_vec[0] += dt * rate;

        // P = F * P * F^T + Q * dt
        self.cov_mat = state_trans_mat * self.cov_mat * state_trans_mat.transpose()
            + self.process_noise_cov_mat * dt;
    }

    fn correct(&mut self, measured_angle: f64) -> Result<(), KalmanError> {
        let z = StateVector::from_array([measured_angle]);

        // y = z - H * x
        let y = z - StateVector::from_matrix(self.obs_matrix * self.state_vec.to_matrix());

        // S = H * P * H^T + R
        let s = self.obs_matrix * self.cov_mat * self.obs_matrix.transpose() + self.meas_noise_cov_mat;
        let s_inv = s.try_inverse().ok_or(KalmanError::SingularInnovation)?;

        // K = P * H^T * S^-1
        let kalman_gain_mat = self.cov_mat * self.obs_matrix.transpose() * s_inv;

        // x = x + K * y
        self.state_vec = self.state_vec + StateVector::from_matrix(kalman_gain_mat * y.to_matrix());

        // P = P - K * H * P
        self.cov_mat = self.cov_mat - kalman_gain_mat * self.obs_matrix * self.cov_mat;

        Ok(())
    }
}

impl Default for AxisKalman {
    fn default() -> Self { Self::new() }
}
