pub mod matrix;
pub mod state_vector;
pub mod vec3d;
