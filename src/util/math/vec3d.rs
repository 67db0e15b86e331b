use num::traits::Zero;
use std::ops::{Add, Mul, Sub};

/// A 3D vector generic over any numeric type.
///
/// Used for attitude triples (roll, pitch, yaw in degrees), rates, velocities
/// and positions. Component order is always x/roll, y/pitch, z/yaw.
#[derive(Debug, PartialEq, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct Vec3D<T> {
    x: T,
    y: T,
    z: T,
}

impl<T: Copy> Vec3D<T> {
    /// Creates a new vector with the given components.
    pub const fn new(x: T, y: T, z: T) -> Self { Self { x, y, z } }

    pub const fn x(&self) -> T { self.x }

    pub const fn y(&self) -> T { self.y }

    pub const fn z(&self) -> T { self.z }

    /// Returns a copy with the z-component replaced.
    pub const fn with_z(self, z: T) -> Self { Self { z, ..self } }
}

impl<T: Copy + Zero> Vec3D<T> {
    pub fn zero() -> Self { Self::new(T::zero(), T::zero(), T::zero()) }
}

impl<T: Copy + Zero> Default for Vec3D<T> {
    fn default() -> Self { Self::zero() }
}

impl<T: Copy + Add<Output = T>> Add for Vec3D<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl<T: Copy + Sub<Output = T>> Sub for Vec3D<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl<T: Copy + Mul<Output = T>> Mul<T> for Vec3D<T> {
    type Output = Self;

    fn mul(self, rhs: T) -> Self::Output { Self::new(self.x * rhs, self.y * rhs, self.z * rhs) }
}

impl<T: Copy> From<[T; 3]> for Vec3D<T> {
    fn from(a: [T; 3]) -> Self { Self::new(a[0], a[1], a[2]) }
}
