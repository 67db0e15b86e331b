#![allow(dead_code, clippy::similar_names)]
#![warn(clippy::shadow_reuse, clippy::shadow_same, clippy::builtin_type_shadow)]
mod flight_control;
mod logger;
mod util;

use crate::flight_control::{
    BenchVehicle, FlightConfig, FlightController, FlightRecorder, Supervisor,
    attitude::{AttitudeEstimator, LinuxI2cBus, RetryPolicy},
};
use crate::util::MonotonicClock;
use std::{env, time::Duration};

const DEFAULT_I2C_DEV: &str = "/dev/i2c-1";
/// 250 Hz control loop.
const DEFAULT_LOOP_PERIOD: Duration = Duration::from_millis(4);

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let dev_var = env::var("STAB_I2C_DEV");
    let dev = dev_var.as_ref().map_or(DEFAULT_I2C_DEV, |v| v.as_str());
    let period = loop_period();

    let bus = LinuxI2cBus::open(dev, LinuxI2cBus::IMU_ADDRESS)
        .unwrap_or_else(|e| fatal!("Could not open {dev}: {e:?}"));
    let estimator = AttitudeEstimator::initialize(bus, MonotonicClock::new(), RetryPolicy::DEFAULT)
        .unwrap_or_else(|e| fatal!("Attitude estimator failed to start: {e:?}"));

    let controller = FlightController::new(BenchVehicle::new(), FlightConfig::DEFAULT)
        .unwrap_or_else(|e| fatal!("Flight configuration rejected: {e}"));

    let (supervisor, telemetry_rx) = Supervisor::new(estimator, controller, period);

    if let Ok(path) = env::var("STAB_RECORD_PATH") {
        match FlightRecorder::create(&path) {
            Ok(recorder) => {
                info!("Recording telemetry to {path}");
                recorder.spawn(telemetry_rx);
            }
            Err(e) => error!("Flight recorder disabled, {path} not writable: {e:?}"),
        }
    }

    supervisor.run().await;
}

fn loop_period() -> Duration {
    match env::var("STAB_LOOP_PERIOD_MS").map(|v| v.parse::<u64>()) {
        Ok(Ok(ms)) if ms > 0 => Duration::from_millis(ms),
        Ok(_) => {
            warn!("Invalid STAB_LOOP_PERIOD_MS, using {DEFAULT_LOOP_PERIOD:?}");
            DEFAULT_LOOP_PERIOD
        }
        Err(_) => DEFAULT_LOOP_PERIOD,
    }
}
