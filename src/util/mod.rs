mod clock;
mod math;

pub use clock::{Clock, MonotonicClock};
#[cfg(test)]
pub use clock::ManualClock;
pub use math::matrix::Matrix;
pub use math::state_vector::StateVector;
pub use math::vec3d::Vec3D;
