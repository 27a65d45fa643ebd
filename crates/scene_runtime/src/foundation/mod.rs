//! Foundation utilities: math types, quaternion algebra, logging

pub mod logging;
pub mod math;
pub mod quat;

pub use math::{Mat3, Mat4, Vec3, Vec4};
pub use quat::{Quat, QuatError};
