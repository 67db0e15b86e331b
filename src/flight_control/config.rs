use super::control_axis::{ControlAxis, PerAxis};
use crate::util::Vec3D;
use strum::IntoEnumIterator;
use strum_macros::Display;

/// Proportional and derivative gain of one control axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct PdGains {
    pub kp: f64,
    pub kd: f64,
}

impl PdGains {
    pub const fn new(kp: f64, kd: f64) -> Self { Self { kp, kd } }

    /// `kp * error + kd * error_rate`
    pub fn apply(&self, error: f64, error_rate: f64) -> f64 { self.kp * error + self.kd * error_rate }
}

/// Allowed range of a single motor command.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ThrustBounds {
    pub min: f64,
    pub max: f64,
}

impl ThrustBounds {
    pub fn clamp(&self, thrust: f64) -> f64 { thrust.clamp(self.min, self.max) }

    pub fn contains(&self, thrust: f64) -> bool { (self.min..=self.max).contains(&thrust) }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The gear raise height must lie strictly above the lower height.
    GearThresholdsOverlap,
    ThrustBoundsInverted,
    /// A motor sign was neither +1 nor -1.
    InvalidMotorSigns,
    NonPositiveHoverThrust,
    /// A parameter was NaN or infinite.
    NonFinite,
}

impl std::error::Error for ConfigError {}

/// Numeric flight parameters consumed by the controller.
///
/// Angles are in degrees, rates in deg/s, heights and distances in m,
/// speeds in m/s and accelerations in m/s^2.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FlightConfig {
    pub gains: PerAxis<PdGains>,
    /// Multiplies every attitude gain and the height PD gain.
    pub master_gain: f64,
    /// Roll, pitch and yaw rate envelope.
    pub max_rotational_vel: Vec3D<f64>,
    pub max_up_speed: f64,
    pub max_down_speed: f64,
    /// Downward acceleration that triggers braking while already descending.
    pub max_down_acceleration: f64,
    pub safety_height: f64,
    pub landing_precision: f64,
    pub gear_raise_height: f64,
    pub gear_lower_height: f64,
    pub thrust: ThrustBounds,
    /// Per-motor command that holds altitude when level.
    pub hover_thrust: f64,
    /// Fraction of `hover_thrust` commanded during failsafe descent.
    pub failsafe_thrust_ratio: f64,
}

impl FlightConfig {
    pub const DEFAULT: Self = Self {
        gains: PerAxis::new(
            PdGains::new(0.002, 0.0005),
            PdGains::new(0.002, 0.0005),
            PdGains::new(0.001, 0.0002),
            PdGains::new(0.1, 0.05),
        ),
        master_gain: 1.0,
        max_rotational_vel: Vec3D::new(60.0, 60.0, 45.0),
        max_up_speed: 2.0,
        max_down_speed: 1.5,
        max_down_acceleration: 3.0,
        safety_height: 1.0,
        landing_precision: 0.5,
        gear_raise_height: 2.0,
        gear_lower_height: 1.5,
        thrust: ThrustBounds { min: 1000.0, max: 2000.0 },
        hover_thrust: 1500.0,
        failsafe_thrust_ratio: 0.9,
    };

    /// Rejects parameter sets the control law cannot work with.
    ///
    /// # Errors
    /// - [`ConfigError::NonFinite`] if any parameter is NaN or infinite.
    /// - [`ConfigError::GearThresholdsOverlap`] if `gear_raise_height <= gear_lower_height`.
    /// - [`ConfigError::ThrustBoundsInverted`] if `thrust.min >= thrust.max`.
    /// - [`ConfigError::NonPositiveHoverThrust`] if `hover_thrust <= 0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_finite() {
            return Err(ConfigError::NonFinite);
        }
        if self.gear_raise_height <= self.gear_lower_height {
            return Err(ConfigError::GearThresholdsOverlap);
        }
        if self.thrust.min >= self.thrust.max {
            return Err(ConfigError::ThrustBoundsInverted);
        }
        if self.hover_thrust <= 0.0 {
            return Err(ConfigError::NonPositiveHoverThrust);
        }
        Ok(())
    }

    fn is_finite(&self) -> bool {
        let gains_finite = ControlAxis::iter().all(|axis| self.gains[axis].kp.is_finite() && self.gains[axis].kd.is_finite());
        let rates = self.max_rotational_vel;
        gains_finite
            && [rates.x(), rates.y(), rates.z()].iter().all(|v| v.is_finite())
            && [
                self.master_gain,
                self.max_up_speed,
                self.max_down_speed,
                self.max_down_acceleration,
                self.safety_height,
                self.landing_precision,
                self.gear_raise_height,
                self.gear_lower_height,
                self.thrust.min,
                self.thrust.max,
                self.hover_thrust,
                self.failsafe_thrust_ratio,
            ]
            .iter()
            .all(|v| v.is_finite())
    }
}

impl Default for FlightConfig {
    fn default() -> Self { Self::DEFAULT }
}
