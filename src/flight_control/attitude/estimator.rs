use super::bus::{BusError, RegisterBus, RetryPolicy};
use super::sample::{AttitudeSample, RawSample, accel_angles};
use crate::flight_control::kalman_filter::{AxisKalman, KalmanError};
use crate::util::{Clock, Vec3D};
use crate::info;
use chrono::TimeDelta;
use std::time::Duration;
use strum_macros::Display;

/// Immutable copy of the estimator outputs handed to the controller each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct AttitudeSnapshot {
    /// Kalman roll, Kalman pitch and calibrated gyro yaw, in degrees.
    pub angles: Vec3D<f64>,
    /// Gyro rates in deg/s. Roll rate is frame-corrected.
    pub rates: Vec3D<f64>,
    /// Raw acceleration in counts.
    pub acceleration: Vec3D<f64>,
    /// Body-z acceleration in m/s^2 with gravity removed.
    pub vertical_acceleration: f64,
    /// Integrated velocity in m/s, drifts.
    pub velocity: Vec3D<f64>,
    /// Die temperature in deg C.
    pub temperature: f64,
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorError {
    /// The identity register did not hold the expected device id.
    IdentityMismatch(u8),
    Bus(BusError),
    /// The clock did not advance between two polls.
    NonPositiveDt,
    SingularInnovation,
}

impl std::error::Error for EstimatorError {}

impl From<BusError> for EstimatorError {
    fn from(value: BusError) -> Self { EstimatorError::Bus(value) }
}

impl From<KalmanError> for EstimatorError {
    fn from(value: KalmanError) -> Self {
        match value {
            KalmanError::NonPositiveDt => EstimatorError::NonPositiveDt,
            KalmanError::SingularInnovation => EstimatorError::SingularInnovation,
        }
    }
}

/// Fuses accelerometer and gyro samples into roll, pitch and yaw.
///
/// Roll and pitch come from one [`AxisKalman`] each. Alongside them the
/// estimator keeps raw gyro integrals, a complementary filter, an open-loop
/// velocity integral and the yaw drift calibration.
pub struct AttitudeEstimator<B, C> {
    bus: B,
    clock: C,
    retry: RetryPolicy,

    kalman_roll: AxisKalman,
    kalman_pitch: AxisKalman,
    kal_roll: f64,
    kal_pitch: f64,

    gyro_roll: f64,
    gyro_pitch: f64,
    gyro_yaw: f64,

    comp_roll: f64,
    comp_pitch: f64,

    rates: Vec3D<f64>,
    acc_raw: Vec3D<f64>,
    temp_raw: i16,
    velocity: Vec3D<f64>,

    yaw_offset: f64,
    calibrated: bool,
    start_ms: i64,
    timer_us: i64,
}

impl<B, C> AttitudeEstimator<B, C>
where
    B: RegisterBus,
    C: Clock,
{
    const REG_CONFIG_BASE: u8 = 0x19;
    const REG_PWR_MGMT_1: u8 = 0x6B;
    const REG_WHO_AM_I: u8 = 0x75;
    const REG_ACCEL_XOUT_H: u8 = 0x3B;
    const EXPECTED_ID: u8 = 0x68;

    /// Sample rate divider 7 (1 kHz), 260/256 Hz DLPF, +-250 deg/s, +-2 g.
    const CONFIG_BLOCK: [u8; 4] = [7, 0x00, 0x00, 0x00];
    /// PLL with X gyro reference, sleep disabled.
    const PWR_MGMT_PLL_X: u8 = 0x01;
    const SETTLE_DELAY: Duration = Duration::from_millis(100);

    /// Accelerometer sensitivity at +-2 g full scale, LSB per g.
    pub const ACCEL_SCALE: f64 = 16384.0;
    pub const GRAVITY: f64 = 9.81;
    /// Gyro weight of the complementary filter.
    const COMP_ALPHA: f64 = 0.93;
    /// Window over which the yaw drift is accumulated before it is latched.
    const CALIBRATION_WINDOW: TimeDelta = TimeDelta::seconds(1);

    /// Configures the sensor, verifies its identity and seeds every filter from
    /// one accelerometer reading.
    ///
    /// # Errors
    /// - [`EstimatorError::IdentityMismatch`] if the sensor is not the expected part.
    /// - [`EstimatorError::Bus`] if a transfer fails past the retry policy.
    pub fn initialize(bus: B, clock: C, retry: RetryPolicy) -> Result<Self, EstimatorError> {
        let mut est = Self {
            bus,
            clock,
            retry,
            kalman_roll: AxisKalman::new(),
            kalman_pitch: AxisKalman::new(),
            kal_roll: 0.0,
            kal_pitch: 0.0,
            gyro_roll: 0.0,
            gyro_pitch: 0.0,
            gyro_yaw: 0.0,
            comp_roll: 0.0,
            comp_pitch: 0.0,
            rates: Vec3D::zero(),
            acc_raw: Vec3D::zero(),
            temp_raw: 0,
            velocity: Vec3D::zero(),
            yaw_offset: 0.0,
            calibrated: false,
            start_ms: 0,
            timer_us: 0,
        };

        est.write_register(Self::REG_CONFIG_BASE, &Self::CONFIG_BLOCK)?;
        est.write_register(Self::REG_PWR_MGMT_1, &[Self::PWR_MGMT_PLL_X])?;

        let mut id = [0u8; 1];
        est.read_register(Self::REG_WHO_AM_I, &mut id)?;
        if id[0] != Self::EXPECTED_ID {
            return Err(EstimatorError::IdentityMismatch(id[0]));
        }

        est.clock.delay(Self::SETTLE_DELAY);

        let mut buf = [0u8; RawSample::ACCEL_LEN];
        est.read_register(Self::REG_ACCEL_XOUT_H, &mut buf)?;
        est.acc_raw = Vec3D::from(RawSample::accel_from_bytes(&buf).map(f64::from));
        let (roll, pitch) = accel_angles(est.acc_raw);

        est.kalman_roll.set_angle(roll);
        est.kalman_pitch.set_angle(pitch);
        est.kal_roll = roll;
        est.kal_pitch = pitch;
        est.gyro_roll = roll;
        est.gyro_pitch = pitch;
        est.comp_roll = roll;
        est.comp_pitch = pitch;

        est.timer_us = est.clock.micros();
        est.start_ms = est.clock.millis();
        info!("IMU initialized at roll {roll:.2}, pitch {pitch:.2}");
        Ok(est)
    }

    /// One sampling cycle. Returns the updated estimate.
    ///
    /// # Errors
    /// - [`EstimatorError::Bus`] if the burst read fails past the retry policy.
    /// - [`EstimatorError::NonPositiveDt`] if the clock has not advanced since
    ///   the previous poll. No state is modified in that case.
    #[allow(clippy::cast_precision_loss)]
    pub fn poll(&mut self) -> Result<AttitudeSnapshot, EstimatorError> {
        let mut buf = [0u8; RawSample::BURST_LEN];
        self.read_register(Self::REG_ACCEL_XOUT_H, &mut buf)?;

        let now_us = self.clock.micros();
        if now_us <= self.timer_us {
            return Err(EstimatorError::NonPositiveDt);
        }
        let dt = (now_us - self.timer_us) as f64 / 1_000_000.0;
        self.timer_us = now_us;

        let sample = AttitudeSample::from_raw(&RawSample::from_burst(&buf));
        let (roll, pitch) = (sample.roll, sample.pitch);
        let pitch_rate = sample.gyro_rate.y();
        let yaw_rate = sample.gyro_rate.z();

        // The accelerometer pitch jumps between -180 and 180, restart the
        // pitch estimates on the new side instead of filtering across.
        if (pitch < -90.0 && self.kal_pitch > 90.0) || (pitch > 90.0 && self.kal_pitch < -90.0) {
            self.kalman_pitch.set_angle(pitch);
            self.comp_pitch = pitch;
            self.kal_pitch = pitch;
            self.gyro_pitch = pitch;
        } else {
            self.kal_pitch = self.kalman_pitch.update(pitch, pitch_rate, dt)?;
        }

        // Accelerometer roll is restricted to +-90, flip the rate to match.
        let roll_rate = if self.kal_pitch.abs() > 90.0 {
            -sample.gyro_rate.x()
        } else {
            sample.gyro_rate.x()
        };
        self.kal_roll = self.kalman_roll.update(roll, roll_rate, dt)?;

        self.gyro_roll += roll_rate * dt;
        self.gyro_pitch += pitch_rate * dt;
        self.gyro_yaw += yaw_rate * dt - self.yaw_offset * dt;

        self.velocity = self.velocity + Self::accel_to_mss(sample.acc) * dt;

        if !self.calibrated
            && TimeDelta::milliseconds(self.clock.millis() - self.start_ms) >= Self::CALIBRATION_WINDOW
        {
            self.yaw_offset = self.gyro_yaw;
            self.calibrated = true;
            self.gyro_yaw = 0.0;
            info!("Yaw drift calibrated, offset {:.4}", self.yaw_offset);
        }

        self.comp_roll =
            Self::COMP_ALPHA * (self.comp_roll + roll_rate * dt) + (1.0 - Self::COMP_ALPHA) * roll;
        self.comp_pitch =
            Self::COMP_ALPHA * (self.comp_pitch + pitch_rate * dt) + (1.0 - Self::COMP_ALPHA) * pitch;

        if !(-180.0..=180.0).contains(&self.gyro_roll) {
            self.gyro_roll = self.kal_roll;
        }
        if !(-180.0..=180.0).contains(&self.gyro_pitch) {
            self.gyro_pitch = self.kal_pitch;
        }

        self.rates = Vec3D::new(roll_rate, pitch_rate, yaw_rate);
        self.acc_raw = sample.acc;
        self.temp_raw = sample.temp_raw;

        Ok(self.snapshot())
    }

    /// Current estimate as an owned copy.
    pub fn snapshot(&self) -> AttitudeSnapshot {
        AttitudeSnapshot {
            angles: self.angles(),
            rates: self.rotational_velocity(),
            acceleration: self.acceleration(),
            vertical_acceleration: Self::accel_to_mss(self.acc_raw).z(),
            velocity: self.velocity(),
            temperature: self.temperature(),
        }
    }

    /// Kalman roll, Kalman pitch and calibrated yaw in degrees.
    pub fn angles(&self) -> Vec3D<f64> { Vec3D::new(self.kal_roll, self.kal_pitch, self.gyro_yaw) }

    pub fn rotational_velocity(&self) -> Vec3D<f64> { self.rates }

    /// Raw acceleration of the latest sample, in counts.
    pub fn acceleration(&self) -> Vec3D<f64> { self.acc_raw }

    pub fn velocity(&self) -> Vec3D<f64> { self.velocity }

    pub fn temperature(&self) -> f64 { f64::from(self.temp_raw) / 340.0 + 36.53 }

    /// Unfiltered gyro integrals (roll, pitch, yaw) in degrees.
    pub fn gyro_angles(&self) -> Vec3D<f64> { Vec3D::new(self.gyro_roll, self.gyro_pitch, self.gyro_yaw) }

    /// Complementary-filter roll and pitch in degrees.
    pub fn complementary_angles(&self) -> (f64, f64) { (self.comp_roll, self.comp_pitch) }

    pub fn is_calibrated(&self) -> bool { self.calibrated }

    pub fn yaw_offset(&self) -> f64 { self.yaw_offset }

    #[cfg(test)]
    pub(crate) fn bus_for_test(&self) -> &B { &self.bus }

    #[cfg(test)]
    pub(crate) fn bus_mut_for_test(&mut self) -> &mut B { &mut self.bus }

    /// Counts to m/s^2, z is gravity compensated.
    fn accel_to_mss(acc: Vec3D<f64>) -> Vec3D<f64> {
        let mss = acc * (Self::GRAVITY / Self::ACCEL_SCALE);
        mss.with_z(mss.z() - Self::GRAVITY)
    }

    fn read_register(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), BusError> {
        let bus = &mut self.bus;
        self.retry.run(&self.clock, || bus.read(reg, buf))
    }

    fn write_register(&mut self, reg: u8, buf: &[u8]) -> Result<(), BusError> {
        let bus = &mut self.bus;
        self.retry.run(&self.clock, || bus.write(reg, buf))
    }
}
