use super::{
    attitude::{AttitudeEstimator, AttitudeSnapshot, EstimatorError, RegisterBus},
    control_axis::PerAxis,
    flight_controller::{CycleReport, FlightController},
    nav_mode::NavMode,
    vehicle::{ThrustVector, VehicleLink},
};
use crate::util::Clock;
use crate::{error, info, warn};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};

/// Read-only copy of the loop state published after every cycle.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub timestamp: DateTime<Utc>,
    pub cycle: u64,
    pub attitude: AttitudeSnapshot,
    pub thrust: ThrustVector,
    pub gains: PerAxis<f64>,
    pub gear_retracted: bool,
    pub mode: NavMode,
    pub failsafe: bool,
}

/// What a single supervised cycle did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleStatus {
    Actuated(CycleReport),
    /// No time passed since the last sample, nothing was commanded.
    Skipped,
    /// The sensor was lost, the controller only commands the failsafe descent.
    Failsafe,
}

/// Runs sense, estimate, control and actuate once per fixed period.
pub struct Supervisor<B, C, V> {
    estimator: AttitudeEstimator<B, C>,
    controller: FlightController<V>,
    period: Duration,
    failsafe: bool,
    cycles: u64,
    last_attitude: AttitudeSnapshot,
    telemetry: watch::Sender<TelemetrySnapshot>,
}

impl<B, C, V> Supervisor<B, C, V>
where
    B: RegisterBus,
    C: Clock,
    V: VehicleLink,
{
    /// Creates a new instance of `Supervisor`
    ///
    /// # Returns
    /// A tuple `(Supervisor, watch::Receiver<TelemetrySnapshot>)`, the receiver
    /// observes the state after every cycle.
    pub fn new(
        estimator: AttitudeEstimator<B, C>,
        controller: FlightController<V>,
        period: Duration,
    ) -> (Self, watch::Receiver<TelemetrySnapshot>) {
        let last_attitude = estimator.snapshot();
        let initial = TelemetrySnapshot {
            timestamp: Utc::now(),
            cycle: 0,
            attitude: last_attitude,
            thrust: controller.thrust(),
            gains: controller.gains(),
            gear_retracted: controller.gear_retracted(),
            mode: controller.mode(),
            failsafe: false,
        };
        let (tx, rx) = watch::channel(initial);
        (
            Self {
                estimator,
                controller,
                period,
                failsafe: false,
                cycles: 0,
                last_attitude,
                telemetry: tx,
            },
            rx,
        )
    }

    /// Starts the fixed-rate control loop. Never returns, ticks that were
    /// missed because a cycle overran are skipped, not caught up.
    pub async fn run(mut self) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!("Control loop running every {:?}", self.period);
        loop {
            ticker.tick().await;
            self.cycle();
        }
    }

    /// One supervised cycle.
    pub fn cycle(&mut self) -> CycleStatus {
        if self.failsafe {
            self.controller.failsafe_descent();
            self.publish();
            return CycleStatus::Failsafe;
        }

        let status = match self.estimator.poll() {
            Ok(attitude) => {
                let report = self.controller.actuate(&attitude);
                self.last_attitude = attitude;
                CycleStatus::Actuated(report)
            }
            Err(EstimatorError::NonPositiveDt) => {
                warn!("Sample interval was not positive, skipping cycle");
                return CycleStatus::Skipped;
            }
            Err(e) => {
                error!("Attitude sensor lost: {e:?}. Entering failsafe descent!");
                self.failsafe = true;
                self.controller.failsafe_descent();
                CycleStatus::Failsafe
            }
        };
        self.publish();
        status
    }

    pub fn in_failsafe(&self) -> bool { self.failsafe }

    pub fn controller(&self) -> &FlightController<V> { &self.controller }

    pub fn controller_mut(&mut self) -> &mut FlightController<V> { &mut self.controller }

    #[cfg(test)]
    pub(crate) fn estimator_mut(&mut self) -> &mut AttitudeEstimator<B, C> { &mut self.estimator }

    fn publish(&mut self) {
        self.cycles += 1;
        self.telemetry.send_replace(TelemetrySnapshot {
            timestamp: Utc::now(),
            cycle: self.cycles,
            attitude: self.last_attitude,
            thrust: self.controller.thrust(),
            gains: self.controller.gains(),
            gear_retracted: self.controller.gear_retracted(),
            mode: self.controller.mode(),
            failsafe: self.failsafe,
        });
    }
}
