use crate::util::Vec3D;
use crate::event;

/// Four motor commands, one per rotor.
pub type ThrustVector = [f64; 4];

/// Physical vehicle state and actuation sink driven by the controller.
pub trait VehicleLink {
    /// Height above ground in m.
    fn height(&self) -> f64;

    /// Vertical speed in m/s, positive up.
    fn z_speed(&self) -> f64;

    fn position(&self) -> Vec3D<f64>;

    /// Horizontal distance to the designated landing spot in m.
    fn distance_to_landing_spot(&self) -> f64;

    /// Spin direction of each motor, used for heading control.
    fn motor_rotation_signs(&self) -> [i8; 4];

    fn set_thrust(&mut self, thrust: ThrustVector);

    fn set_retracts(&mut self, retracted: bool);
}

/// In-memory vehicle for bench runs without an airframe attached.
///
/// Physical state is set from outside, commands are recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchVehicle {
    pub height: f64,
    pub z_speed: f64,
    pub position: Vec3D<f64>,
    pub landing_distance: f64,
    pub rotation_signs: [i8; 4],
    last_thrust: ThrustVector,
    thrust_commands: u64,
    retract_commands: Vec<bool>,
}

impl BenchVehicle {
    /// Quad-X spin pattern, diagonal motors share a direction.
    pub const QUAD_X_ROTATION: [i8; 4] = [1, -1, 1, -1];

    pub fn new() -> Self {
        Self {
            height: 0.0,
            z_speed: 0.0,
            position: Vec3D::zero(),
            landing_distance: f64::INFINITY,
            rotation_signs: Self::QUAD_X_ROTATION,
            last_thrust: [0.0; 4],
            thrust_commands: 0,
            retract_commands: Vec::new(),
        }
    }

    pub fn last_thrust(&self) -> ThrustVector { self.last_thrust }

    pub fn thrust_commands(&self) -> u64 { self.thrust_commands }

    /// Every retract command in issue order.
    pub fn retract_commands(&self) -> &[bool] { &self.retract_commands }
}

impl Default for BenchVehicle {
    fn default() -> Self { Self::new() }
}

impl VehicleLink for BenchVehicle {
    fn height(&self) -> f64 { self.height }

    fn z_speed(&self) -> f64 { self.z_speed }

    fn position(&self) -> Vec3D<f64> { self.position }

    fn distance_to_landing_spot(&self) -> f64 { self.landing_distance }

    fn motor_rotation_signs(&self) -> [i8; 4] { self.rotation_signs }

    fn set_thrust(&mut self, thrust: ThrustVector) {
        self.last_thrust = thrust;
        self.thrust_commands += 1;
    }

    fn set_retracts(&mut self, retracted: bool) {
        event!("Bench gear retract command: {retracted}");
        self.retract_commands.push(retracted);
    }
}
