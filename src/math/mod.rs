mod aabb;
mod matrix;
mod rotation;
mod vector;

pub use aabb::Aabb;
pub use matrix::{Mat2, Mat3};
pub use rotation::Rot2;
pub use vector::Vec2;

/// Constant for a very small number, used for comparisons
pub const EPSILON: f32 = 1.0e-6;

/// Returns true if the two floating point values are approximately equal
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Returns true if the value is approximately zero
#[inline]
pub fn approx_zero(a: f32) -> bool {
    a.abs() < EPSILON
}

/// Clamps a value between a minimum and maximum value
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// Converts degrees to radians
#[inline]
pub fn to_radians(degrees: f32) -> f32 {
    degrees * std::f32::consts::PI / 180.0
}

/// Converts radians to degrees
#[inline]
pub fn to_degrees(radians: f32) -> f32 {
    radians * 180.0 / std::f32::consts::PI
}
