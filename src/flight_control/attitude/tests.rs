use super::scripted_bus::ScriptedBus;
use super::{AttitudeEstimator, BusError, EstimatorError, RetryPolicy};
use crate::util::{Clock, ManualClock};
use std::time::Duration;

const LEVEL: [i16; 3] = [0, 0, 16384];
const DT_MS: i64 = 10;

fn init_with(seed: [i16; 3]) -> (AttitudeEstimator<ScriptedBus, ManualClock>, ManualClock) {
    let clock = ManualClock::new();
    let bus = ScriptedBus::new(&clock, seed);
    let est = AttitudeEstimator::initialize(bus, clock.clone(), RetryPolicy::DEFAULT).unwrap();
    (est, clock)
}

/// Shortest angular distance in degrees.
fn wrapped_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[test]
fn test_level_initialization() {
    let (est, clock) = init_with(LEVEL);
    let angles = est.angles();
    assert!(angles.x().abs() < 1e-12);
    assert!(angles.y().abs() < 1e-12);
    assert!(angles.z().abs() < 1e-12);
    assert_eq!(est.complementary_angles(), (angles.x(), angles.y()));
    assert!(!est.is_calibrated());
    // sensor settle delay ran on the injected clock
    assert!(clock.millis() >= 100);
}

#[test]
fn test_initialization_configures_sensor() {
    let (est, _) = init_with(LEVEL);
    let bus = est.bus_for_test();
    assert_eq!(bus.writes[0], (0x19, vec![7, 0, 0, 0]));
    assert_eq!(bus.writes[1], (0x6B, vec![0x01]));
}

#[test]
fn test_identity_mismatch_is_rejected() {
    let clock = ManualClock::new();
    let mut bus = ScriptedBus::new(&clock, LEVEL);
    bus.identity = 0x70;
    let res = AttitudeEstimator::initialize(bus, clock, RetryPolicy::DEFAULT);
    assert!(matches!(res, Err(EstimatorError::IdentityMismatch(0x70))));
}

#[test]
fn test_tilted_initialization_seeds_all_estimates() {
    // 30 deg roll: y = sin(30) g, z = cos(30) g
    let (est, _) = init_with([0, 8192, 14189]);
    let roll = est.angles().x();
    assert!((roll - 30.0).abs() < 0.01, "roll = {roll}");
    assert!((est.gyro_angles().x() - roll).abs() < f64::EPSILON);
    assert!((est.complementary_angles().0 - roll).abs() < f64::EPSILON);
}

#[test]
fn test_yaw_is_zero_when_calibration_latches() {
    let (mut est, clock) = init_with(LEVEL);
    // constant 3 deg/s yaw drift
    est.bus_mut_for_test().push(LEVEL, 0, [0, 0, 393]);

    let mut polls = 0;
    while !est.is_calibrated() {
        clock.advance_ms(DT_MS);
        est.poll().unwrap();
        polls += 1;
        assert!(polls <= 200, "calibration never latched");
    }
    assert_eq!(est.angles().z(), 0.0);
    assert!(est.yaw_offset().abs() > 1.0);

    // the latched offset cancels the drift afterwards
    for _ in 0..100 {
        clock.advance_ms(DT_MS);
        est.poll().unwrap();
    }
    assert!(est.angles().z().abs() < 0.05, "yaw = {}", est.angles().z());
}

#[test]
fn test_pitch_wrap_resets_instead_of_sweeping() {
    // accelerometer pitch about +179 deg
    let (mut est, clock) = init_with([-286, 0, -16381]);
    let before = est.angles().y();
    assert!(before > 178.0);

    // one sample later it reads about -179 deg
    est.bus_mut_for_test().push([286, 0, -16381], 0, [0, 0, 0]);
    clock.advance_ms(DT_MS);
    est.poll().unwrap();
    let after = est.angles().y();

    assert!(after < -178.0, "pitch = {after}");
    assert!(wrapped_diff(before, after) < 5.0);
    assert!((est.gyro_angles().y() - after).abs() < f64::EPSILON);
}

#[test]
fn test_pitch_wrap_resets_in_the_negative_direction() {
    // accelerometer pitch about -179 deg
    let (mut est, clock) = init_with([286, 0, -16381]);
    let before = est.angles().y();
    assert!(before < -178.0);

    // one sample later it reads about +179 deg
    est.bus_mut_for_test().push([-286, 0, -16381], 0, [0, 0, 0]);
    clock.advance_ms(DT_MS);
    est.poll().unwrap();
    let after = est.angles().y();

    assert!(after > 178.0, "pitch = {after}");
    assert!(wrapped_diff(before, after) < 5.0);
    assert!((est.gyro_angles().y() - after).abs() < f64::EPSILON);
}

#[test]
fn test_inverted_level_seeds_positive_half_turn() {
    let (est, _) = init_with([0, 0, -16384]);
    let pitch = est.angles().y();
    assert!((pitch - 180.0).abs() < 1e-9, "pitch = {pitch}");
    assert!((est.gyro_angles().y() - pitch).abs() < f64::EPSILON);
    assert!(est.angles().x().abs() < 1e-12);
}

#[test]
fn test_roll_rate_inverted_past_ninety_pitch() {
    let (mut est, clock) = init_with([-286, 0, -16381]);
    est.bus_mut_for_test().push([-286, 0, -16381], 0, [1310, 0, 0]);
    clock.advance_ms(DT_MS);
    est.poll().unwrap();
    assert!((est.rotational_velocity().x() + 10.0).abs() < 1e-9);

    let (mut level, level_clock) = init_with(LEVEL);
    level.bus_mut_for_test().push(LEVEL, 0, [1310, 0, 0]);
    level_clock.advance_ms(DT_MS);
    level.poll().unwrap();
    assert!((level.rotational_velocity().x() - 10.0).abs() < 1e-9);
}

#[test]
fn test_diverged_gyro_angle_falls_back_to_kalman() {
    let (mut est, clock) = init_with(LEVEL);
    // 250 deg/s for a full second pushes the raw integral past 180
    est.bus_mut_for_test().push(LEVEL, 0, [32750, 0, 0]);
    clock.advance_ms(1000);
    est.poll().unwrap();
    assert!((est.gyro_angles().x() - est.angles().x()).abs() < f64::EPSILON);
    assert!((-180.0..=180.0).contains(&est.gyro_angles().x()));
}

#[test]
fn test_complementary_filter_blend() {
    let (mut est, clock) = init_with(LEVEL);
    // 30 deg pitch: x = -sin(30) g, z = cos(30) g
    est.bus_mut_for_test().push([-8192, 0, 14189], 0, [0, 0, 0]);
    clock.advance_ms(DT_MS);
    est.poll().unwrap();
    let (_, comp_pitch) = est.complementary_angles();
    let accel_pitch = 8192f64.atan2(14189.0).to_degrees();
    assert!((comp_pitch - 0.07 * accel_pitch).abs() < 1e-9);
}

#[test]
fn test_velocity_integrates_gravity_compensated_acceleration() {
    let (mut est, clock) = init_with(LEVEL);
    // half a g forward, level otherwise
    est.bus_mut_for_test().push([8192, 0, 16384], 0, [0, 0, 0]);
    for _ in 0..10 {
        clock.advance_ms(DT_MS);
        est.poll().unwrap();
    }
    let vel = est.velocity();
    assert!((vel.x() - 0.4905).abs() < 1e-9, "vx = {}", vel.x());
    assert!(vel.y().abs() < 1e-12);
    assert!(vel.z().abs() < 1e-12);
    assert!(est.snapshot().vertical_acceleration.abs() < 1e-12);
}

#[test]
fn test_temperature_transform() {
    let (mut est, clock) = init_with(LEVEL);
    est.bus_mut_for_test().push(LEVEL, 340, [0, 0, 0]);
    clock.advance_ms(DT_MS);
    let snap = est.poll().unwrap();
    assert!((snap.temperature - 37.53).abs() < 1e-9);
}

#[test]
fn test_poll_without_elapsed_time_is_rejected() {
    let (mut est, clock) = init_with(LEVEL);
    clock.advance_ms(DT_MS);
    let first = est.poll().unwrap();
    assert_eq!(est.poll(), Err(EstimatorError::NonPositiveDt));
    assert_eq!(est.snapshot(), first);
}

#[test]
fn test_transient_bus_failures_are_retried() {
    let (mut est, clock) = init_with(LEVEL);
    est.bus_mut_for_test().fail_next = 2;
    clock.advance_ms(DT_MS);
    assert!(est.poll().is_ok());
}

#[test]
fn test_persistent_bus_failure_is_bounded() {
    let (mut est, clock) = init_with(LEVEL);
    est.bus_mut_for_test().fail_next = u32::MAX;
    clock.advance_ms(DT_MS);
    assert_eq!(
        est.poll(),
        Err(EstimatorError::Bus(BusError::RetriesExhausted(RetryPolicy::DEFAULT.max_attempts)))
    );
}

#[test]
fn test_slow_bus_failure_hits_deadline() {
    let (mut est, clock) = init_with(LEVEL);
    let bus = est.bus_mut_for_test();
    bus.fail_next = u32::MAX;
    bus.fail_cost_us = 3_000;
    clock.advance_ms(DT_MS);
    assert_eq!(est.poll(), Err(EstimatorError::Bus(BusError::Timeout)));
}

#[test]
fn test_retry_policy_stops_on_first_success() {
    let clock = ManualClock::new();
    let policy = RetryPolicy { max_attempts: 3, timeout: Duration::from_secs(1) };
    let mut calls = 0;
    let res = policy.run(&clock, || {
        calls += 1;
        if calls < 2 { Err(BusError::Io(libc::EIO)) } else { Ok(calls) }
    });
    assert_eq!(res, Ok(2));
}

#[test]
fn test_retry_policy_without_attempts_still_tries_once() {
    let clock = ManualClock::new();
    let policy = RetryPolicy { max_attempts: 0, timeout: Duration::from_secs(1) };

    let mut calls = 0;
    let res = policy.run(&clock, || {
        calls += 1;
        Ok(calls)
    });
    assert_eq!(res, Ok(1));

    let mut failures = 0;
    let res: Result<(), _> = policy.run(&clock, || {
        failures += 1;
        Err(BusError::Io(libc::EIO))
    });
    assert_eq!(failures, 1);
    assert_eq!(res, Err(BusError::RetriesExhausted(1)));
}
