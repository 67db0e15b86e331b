pub mod attitude;
mod config;
mod control_axis;
mod flight_controller;
pub mod kalman_filter;
mod landing_gear;
mod nav_mode;
mod recorder;
mod supervisor;
mod vehicle;

pub use config::{ConfigError, FlightConfig, PdGains, ThrustBounds};
pub use control_axis::{ControlAxis, PerAxis};
pub use flight_controller::{AxisOutcome, ControlReferences, CycleReport, FlightController, MotorSigns};
pub use landing_gear::GearState;
pub use nav_mode::NavMode;
pub use recorder::{FlightRecorder, RecorderError};
pub use supervisor::{CycleStatus, Supervisor, TelemetrySnapshot};
pub use vehicle::{BenchVehicle, ThrustVector, VehicleLink};
