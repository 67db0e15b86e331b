use super::{
    attitude::AttitudeSnapshot,
    config::{ConfigError, FlightConfig},
    control_axis::{ControlAxis, PerAxis},
    landing_gear::GearState,
    nav_mode::NavMode,
    vehicle::{ThrustVector, VehicleLink},
};
use crate::util::Vec3D;
use crate::{error, event, info, warn};
use strum_macros::Display;

/// Setpoints the control routines steer towards.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct ControlReferences {
    /// Roll, pitch, yaw in degrees.
    pub attitude: Vec3D<f64>,
    /// Roll, pitch, yaw rate in deg/s.
    pub rotational_vel: Vec3D<f64>,
    pub velocity: Vec3D<f64>,
    pub position: Vec3D<f64>,
    /// Its z component never lies below the safety height.
    pub hold_position: Vec3D<f64>,
}

/// Per-motor direction for one control axis, every entry is +1 or -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorSigns([i8; 4]);

impl MotorSigns {
    /// Left pair speeds up for a positive roll correction.
    pub const ROLL: Self = Self([1, -1, -1, 1]);
    /// Rear pair speeds up for a positive pitch correction.
    pub const PITCH: Self = Self([-1, -1, 1, 1]);
    /// All motors together, used for height.
    pub const UNIFORM: Self = Self([1, 1, 1, 1]);

    pub fn get(&self) -> [i8; 4] { self.0 }
}

impl TryFrom<[i8; 4]> for MotorSigns {
    type Error = ConfigError;

    fn try_from(signs: [i8; 4]) -> Result<Self, Self::Error> {
        if signs.iter().all(|s| s.abs() == 1) {
            Ok(Self(signs))
        } else {
            Err(ConfigError::InvalidMotorSigns)
        }
    }
}

/// What a control axis did during one cycle.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AxisOutcome {
    /// The gain was applied to the thrust vector.
    Applied,
    /// The axis had nothing to correct or was not run.
    Idle,
    /// The rate or speed envelope was exceeded, the update was skipped.
    OutOfBounds,
}

/// Result of one [`FlightController::actuate`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub mode: NavMode,
    pub outcomes: PerAxis<AxisOutcome>,
    /// Retract command issued this cycle, if the gear moved.
    pub gear_command: Option<bool>,
    pub thrust: ThrustVector,
}

impl CycleReport {
    pub fn out_of_bounds(&self) -> impl Iterator<Item = ControlAxis> + '_ {
        use strum::IntoEnumIterator;
        ControlAxis::iter().filter(|axis| self.outcomes[*axis] == AxisOutcome::OutOfBounds)
    }
}

/// Labels logged for a positive and a negative correction on an axis.
type DirectionLabels = (&'static str, &'static str);

/// Converts attitude, rate and height errors into motor thrust.
///
/// The thrust vector is rebuilt from the hover baseline every `Hold` cycle and
/// then scaled once per active axis, always in the order roll, pitch, height.
/// The scaling is multiplicative so that order is part of the result.
pub struct FlightController<V> {
    vehicle: V,
    config: FlightConfig,
    references: ControlReferences,
    /// Last computed gain per axis, observability only.
    gains: PerAxis<f64>,
    thrust: ThrustVector,
    mode: NavMode,
    gear: GearState,
    rotation_signs: MotorSigns,
}

impl<V: VehicleLink> FlightController<V> {
    /// Validates `config` and the vehicle's rotation signs, lowers the gear and
    /// starts in [`NavMode::Hold`].
    ///
    /// # Errors
    /// - [`ConfigError`] from [`FlightConfig::validate`].
    /// - [`ConfigError::InvalidMotorSigns`] if a rotation sign is not +1 or -1.
    pub fn new(mut vehicle: V, config: FlightConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rotation_signs = MotorSigns::try_from(vehicle.motor_rotation_signs()).inspect_err(|_| {
            error!("Invalid motor rotation signs {:?}", vehicle.motor_rotation_signs());
        })?;
        vehicle.set_retracts(false);
        let hover = config.thrust.clamp(config.hover_thrust);
        info!("Flight controller ready, hover thrust {hover:.1}");
        Ok(Self {
            vehicle,
            config,
            references: ControlReferences::default(),
            gains: PerAxis::splat(0.0),
            thrust: [hover; 4],
            mode: NavMode::Hold,
            gear: GearState::new(config.gear_raise_height, config.gear_lower_height),
            rotation_signs,
        })
    }

    /// One control cycle: mode dispatch, gear hysteresis, thrust output.
    pub fn actuate(&mut self, attitude: &AttitudeSnapshot) -> CycleReport {
        let outcomes = match self.mode {
            NavMode::Hold => self.hold(attitude),
            NavMode::Land => self.land(),
        };

        let gear_command = self.gear.evaluate(self.vehicle.height());
        if let Some(retract) = gear_command {
            info!("Landing gear {}", if retract { "raised" } else { "lowered" });
            self.vehicle.set_retracts(retract);
        }

        self.vehicle.set_thrust(self.thrust);
        CycleReport { mode: self.mode, outcomes, gear_command, thrust: self.thrust }
    }

    /// Hover in place: level attitude, no horizontal travel.
    pub fn hold(&mut self, attitude: &AttitudeSnapshot) -> PerAxis<AxisOutcome> {
        let angles = attitude.angles;
        let tilt = angles.x().to_radians().cos() * angles.y().to_radians().cos();
        self.thrust = [self.config.thrust.clamp(self.config.hover_thrust / tilt); 4];

        self.references.attitude = Vec3D::zero();
        let diff_att = self.difference_attitude(attitude);
        let diff_rot = self.difference_rotational_vel(attitude);
        let diff_vel = self.difference_vel();
        let abs_direction = Vec3D::zero();

        let mut outcomes = PerAxis::splat(AxisOutcome::Idle);
        outcomes[ControlAxis::Roll] = self.roll_control(diff_att, diff_rot, attitude.rates);
        outcomes[ControlAxis::Pitch] = self.pitch_control(diff_att, diff_rot, attitude.rates);
        outcomes[ControlAxis::Height] =
            self.height_control(abs_direction, diff_vel, attitude.vertical_acceleration);
        outcomes
    }

    /// Keeps the previous thrust, landing trajectories are not implemented.
    fn land(&mut self) -> PerAxis<AxisOutcome> { PerAxis::splat(AxisOutcome::Idle) }

    pub fn roll_control(&mut self, diff_att: Vec3D<f64>, diff_rot: Vec3D<f64>, rates: Vec3D<f64>) -> AxisOutcome {
        let max = self.config.max_rotational_vel.x();
        self.attitude_control(ControlAxis::Roll, (diff_att.x(), diff_rot.x()), rates.x(), max, MotorSigns::ROLL, ("Roll-R", "Roll-L"))
    }

    pub fn pitch_control(&mut self, diff_att: Vec3D<f64>, diff_rot: Vec3D<f64>, rates: Vec3D<f64>) -> AxisOutcome {
        let max = self.config.max_rotational_vel.y();
        self.attitude_control(ControlAxis::Pitch, (diff_att.y(), diff_rot.y()), rates.y(), max, MotorSigns::PITCH, ("Forward", "Backward"))
    }

    /// Yaw hold. Not part of the `Hold` cycle.
    pub fn heading_control(&mut self, diff_att: Vec3D<f64>, diff_rot: Vec3D<f64>, rates: Vec3D<f64>) -> AxisOutcome {
        let max = self.config.max_rotational_vel.z();
        let signs = self.rotation_signs;
        self.attitude_control(ControlAxis::Heading, (diff_att.z(), diff_rot.z()), rates.z(), max, signs, ("Turn-R", "Turn-L"))
    }

    fn attitude_control(
        &mut self,
        axis: ControlAxis,
        (error, rate_error): (f64, f64),
        rate: f64,
        max_rate: f64,
        signs: MotorSigns,
        (positive, negative): DirectionLabels,
    ) -> AxisOutcome {
        let gain = self.config.gains[axis].apply(error, rate_error) * self.config.master_gain;
        self.gains[axis] = gain;

        if !gain.is_finite() {
            warn!("{axis} gain is not finite, skipping update");
            return AxisOutcome::Idle;
        }
        if gain == 0.0 {
            return AxisOutcome::Idle;
        }
        // already turning at the limit in the direction the gain pushes
        if (gain > 0.0 && rate >= max_rate) || (gain < 0.0 && rate <= -max_rate) {
            warn!("{axis} out of bounds set by max rotational velocity {max_rate:.1}");
            return AxisOutcome::OutOfBounds;
        }
        event!("{}", if gain > 0.0 { positive } else { negative });
        self.update_reference_thrust(gain, signs);
        AxisOutcome::Applied
    }

    /// Height hold with a climb-to-safety override and predictive braking.
    pub fn height_control(&mut self, abs_direction: Vec3D<f64>, diff_vel: Vec3D<f64>, vertical_acc: f64) -> AxisOutcome {
        let cfg = self.config;
        let height = self.vehicle.height();
        let z_speed = self.vehicle.z_speed();
        let pd = cfg.gains[ControlAxis::Height];

        let gain = if height < cfg.safety_height && self.vehicle.distance_to_landing_spot() > cfg.landing_precision {
            event!("Below safety height!");
            pd.kp * (cfg.safety_height - height)
        } else {
            pd.apply(abs_direction.z(), diff_vel.z()) * cfg.master_gain
        };
        self.gains[ControlAxis::Height] = gain;

        if !gain.is_finite() {
            warn!("Height gain is not finite, skipping update");
            return AxisOutcome::Idle;
        }
        if z_speed <= -cfg.max_down_speed || (vertical_acc <= -cfg.max_down_acceleration && z_speed < 0.0) {
            event!("Moving down too fast");
            self.update_reference_thrust(gain.abs(), MotorSigns::UNIFORM);
            AxisOutcome::Applied
        } else if z_speed <= cfg.max_up_speed {
            if gain > 0.0 {
                event!("Up");
            } else if gain < 0.0 {
                event!("Down");
            } else {
                return AxisOutcome::Idle;
            }
            self.update_reference_thrust(gain, MotorSigns::UNIFORM);
            AxisOutcome::Applied
        } else {
            warn!("Height out of bounds set by max up speed {:.1}", cfg.max_up_speed);
            AxisOutcome::OutOfBounds
        }
    }

    /// Scales every motor by `1 + gain * sign` and clamps it to the thrust bounds.
    pub fn update_reference_thrust(&mut self, gain: f64, signs: MotorSigns) {
        let bounds = self.config.thrust;
        for (thrust, sign) in self.thrust.iter_mut().zip(signs.get()) {
            *thrust = bounds.clamp(*thrust * (1.0 + gain * f64::from(sign)));
        }
    }

    /// Fixed descent thrust with the gear lowered, used after the sensor is lost.
    pub fn failsafe_descent(&mut self) {
        let descent = self.config.thrust.clamp(self.config.hover_thrust * self.config.failsafe_thrust_ratio);
        self.thrust = [descent; 4];
        if self.gear.is_retracted() {
            self.gear.force(false);
            self.vehicle.set_retracts(false);
        }
        self.vehicle.set_thrust(self.thrust);
    }

    pub fn difference_attitude(&self, attitude: &AttitudeSnapshot) -> Vec3D<f64> {
        self.references.attitude - attitude.angles
    }

    pub fn difference_rotational_vel(&self, attitude: &AttitudeSnapshot) -> Vec3D<f64> {
        self.references.rotational_vel - attitude.rates
    }

    /// Target velocity with the measured vertical speed taken off its z component.
    pub fn difference_vel(&self) -> Vec3D<f64> {
        let target = self.references.velocity;
        target.with_z(target.z() - self.vehicle.z_speed())
    }

    /// Vector from the current position to the target position.
    pub fn absolute_direction(&self) -> Vec3D<f64> { self.references.position - self.vehicle.position() }

    pub fn set_reference_attitude(&mut self, attitude: Vec3D<f64>) { self.references.attitude = attitude; }

    pub fn set_reference_rotational_vel(&mut self, rot_vel: Vec3D<f64>) {
        self.references.rotational_vel = rot_vel;
    }

    pub fn set_reference_vel(&mut self, velocity: Vec3D<f64>) { self.references.velocity = velocity; }

    pub fn set_reference_position(&mut self, position: Vec3D<f64>) { self.references.position = position; }

    /// Stores the hold position, raising it to the safety height if needed.
    pub fn set_hold_position(&mut self, position: Vec3D<f64>) {
        let floor = self.config.safety_height;
        self.references.hold_position =
            if position.z() < floor { position.with_z(floor) } else { position };
    }

    pub fn references(&self) -> &ControlReferences { &self.references }

    pub fn set_mode(&mut self, mode: NavMode) {
        if mode != self.mode {
            info!("Navigation mode {} -> {mode}", self.mode);
            self.mode = mode;
        }
    }

    pub fn mode(&self) -> NavMode { self.mode }

    pub fn gains(&self) -> PerAxis<f64> { self.gains }

    pub fn thrust(&self) -> ThrustVector { self.thrust }

    pub fn gear_retracted(&self) -> bool { self.gear.is_retracted() }

    pub fn config(&self) -> &FlightConfig { &self.config }

    pub fn vehicle(&self) -> &V { &self.vehicle }

    pub fn vehicle_mut(&mut self) -> &mut V { &mut self.vehicle }
}
