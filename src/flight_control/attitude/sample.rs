use crate::util::Vec3D;

/// One burst read of the sensor's measurement registers, as signed counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub acc: [i16; 3],
    pub temp: i16,
    pub gyro: [i16; 3],
}

impl RawSample {
    /// Accel XYZ, temperature and gyro XYZ, two big-endian bytes each.
    pub const BURST_LEN: usize = 14;
    /// Accel XYZ only.
    pub const ACCEL_LEN: usize = 6;

    pub fn from_burst(buf: &[u8; RawSample::BURST_LEN]) -> Self {
        let word = |i: usize| i16::from_be_bytes([buf[2 * i], buf[2 * i + 1]]);
        Self {
            acc: [word(0), word(1), word(2)],
            temp: word(3),
            gyro: [word(4), word(5), word(6)],
        }
    }

    pub fn accel_from_bytes(buf: &[u8; RawSample::ACCEL_LEN]) -> [i16; 3] {
        let word = |i: usize| i16::from_be_bytes([buf[2 * i], buf[2 * i + 1]]);
        [word(0), word(1), word(2)]
    }
}

/// Quantities derived from a [`RawSample`]. Recomputed on every poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeSample {
    /// Raw acceleration in counts.
    pub acc: Vec3D<f64>,
    /// Gyro rate in deg/s.
    pub gyro_rate: Vec3D<f64>,
    /// Accelerometer roll in degrees, restricted to +-90.
    pub roll: f64,
    /// Accelerometer pitch in degrees, full +-180.
    pub pitch: f64,
    pub temp_raw: i16,
}

impl AttitudeSample {
    /// Gyro sensitivity at +-250 deg/s full scale, LSB per deg/s.
    pub const GYRO_SCALE: f64 = 131.0;

    pub fn from_raw(raw: &RawSample) -> Self {
        let acc = Vec3D::from(raw.acc.map(f64::from));
        let (roll, pitch) = accel_angles(acc);
        Self {
            acc,
            gyro_rate: Vec3D::from(raw.gyro.map(|g| f64::from(g) / Self::GYRO_SCALE)),
            roll,
            pitch,
            temp_raw: raw.temp,
        }
    }
}

/// Roll and pitch in degrees from an acceleration vector.
///
/// Roll is `atan(y / sqrt(x^2 + z^2))`, written with `atan2` so an all-zero
/// reading yields 0 instead of NaN.
pub fn accel_angles(acc: Vec3D<f64>) -> (f64, f64) {
    let roll = acc.y().atan2(acc.x().hypot(acc.z())).to_degrees();
    // subtracting keeps a zero x at +0.0, so an inverted level reading is +180
    let pitch = (0.0 - acc.x()).atan2(acc.z()).to_degrees();
    (roll, pitch)
}
