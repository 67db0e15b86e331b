use super::{AxisKalman, KalmanError};
use crate::util::Matrix;
use rand::{Rng, SeedableRng, rngs::StdRng};

const DT: f64 = 0.01;

/// Scalar form of the same filter, written out term by term.
struct ScalarReference {
    angle: f64,
    bias: f64,
    p: [[f64; 2]; 2],
}

impl ScalarReference {
    fn step(&mut self, new_angle: f64, new_rate: f64, dt: f64) -> f64 {
        let p = &mut self.p;
        self.angle += dt * (new_rate - self.bias);
        p[0][0] += dt * (dt * p[1][1] - p[0][1] - p[1][0] + AxisKalman::Q_ANGLE);
        p[0][1] -= dt * p[1][1];
        p[1][0] -= dt * p[1][1];
        p[1][1] += AxisKalman::Q_BIAS * dt;

        let s = p[0][0] + AxisKalman::R_MEASURE;
        let k = [p[0][0] / s, p[1][0] / s];
        let y = new_angle - self.angle;
        self.angle += k[0] * y;
        self.bias += k[1] * y;

        let (p00, p01) = (p[0][0], p[0][1]);
        p[0][0] -= k[0] * p00;
        p[0][1] -= k[0] * p01;
        p[1][0] -= k[1] * p00;
        p[1][1] -= k[1] * p01;
        self.angle
    }
}

#[test]
fn test_set_angle_resets_bias_and_covariance() {
    let mut kalman = AxisKalman::new();
    for i in 0..50 {
        kalman.update(12.0, 3.0 + f64::from(i) * 0.1, DT).unwrap();
    }
    assert!(kalman.bias().abs() > 0.0);

    kalman.set_angle(-42.5);
    assert!((kalman.angle() + 42.5).abs() < f64::EPSILON);
    assert!(kalman.bias().abs() < f64::EPSILON);
    assert_eq!(kalman.covariance(), Matrix::identity());
}

#[test]
fn test_matrix_form_matches_scalar_equations() {
    let mut kalman = AxisKalman::new();
    kalman.set_angle(5.0);
    let mut reference = ScalarReference { angle: 5.0, bias: 0.0, p: [[1.0, 0.0], [0.0, 1.0]] };

    for i in 0..400 {
        let t = f64::from(i) * DT;
        let meas_angle = 5.0 + 20.0 * (t * 0.7).sin();
        let meas_rate = 14.0 * (t * 0.7).cos() + 0.4;
        let got = kalman.update(meas_angle, meas_rate, DT).unwrap();
        let want = reference.step(meas_angle, meas_rate, DT);
        assert!((got - want).abs() < 1e-9, "step {i}: {got} != {want}");
        assert!((kalman.bias() - reference.bias).abs() < 1e-9);
    }
}

#[test]
fn test_converges_to_constant_angle() {
    let mut kalman = AxisKalman::new();
    kalman.set_angle(0.0);
    for _ in 0..500 {
        kalman.update(30.0, 0.0, DT).unwrap();
    }
    assert!((kalman.angle() - 30.0).abs() < 1e-2, "angle = {}", kalman.angle());
}

#[test]
fn test_learns_constant_gyro_bias() {
    let mut kalman = AxisKalman::new();
    kalman.set_angle(10.0);
    // Vehicle is still, the gyro reads a constant 2 deg/s offset.
    for _ in 0..20_000 {
        kalman.update(10.0, 2.0, DT).unwrap();
    }
    assert!((kalman.bias() - 2.0).abs() < 0.05, "bias = {}", kalman.bias());
    assert!((kalman.angle() - 10.0).abs() < 0.05, "angle = {}", kalman.angle());
}

#[test]
fn test_tracks_ramp_with_consistent_rate() {
    let mut kalman = AxisKalman::new();
    kalman.set_angle(0.0);
    let rate = 5.0;
    let mut truth = 0.0;
    for _ in 0..1000 {
        truth += rate * DT;
        kalman.update(truth, rate, DT).unwrap();
    }
    assert!((kalman.angle() - truth).abs() < 1e-2);
}

#[test]
fn test_noisy_measurements_are_smoothed() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut kalman = AxisKalman::new();
    kalman.set_angle(-15.0);

    let mut err_sum = 0.0;
    let mut err_max: f64 = 0.0;
    for i in 0..3000 {
        let noisy = -15.0 + rng.random_range(-1.0..1.0);
        let angle = kalman.update(noisy, 0.0, DT).unwrap();
        if i >= 2000 {
            let err = (angle + 15.0).abs();
            err_sum += err;
            err_max = err_max.max(err);
        }
    }
    assert!(err_sum / 1000.0 < 0.3, "mean error {}", err_sum / 1000.0);
    assert!(err_max < 1.0, "max error {err_max}");
    assert!(kalman.covariance().is_finite());
}

#[test]
fn test_rejects_non_positive_dt() {
    let mut kalman = AxisKalman::new();
    kalman.set_angle(7.0);
    let before = kalman.covariance();

    for dt in [0.0, -0.01, f64::NAN] {
        assert_eq!(kalman.update(50.0, 10.0, dt), Err(KalmanError::NonPositiveDt));
    }
    assert!((kalman.angle() - 7.0).abs() < f64::EPSILON);
    assert_eq!(kalman.covariance(), before);
}
