use crate::math::Vec2;
use serde::{Deserialize, Serialize};

/// A 2D rotation stored as cached sine and cosine of the angle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rot2 {
    /// Sine of the rotation angle
    pub s: f32,

    /// Cosine of the rotation angle
    pub c: f32,
}

impl Rot2 {
    /// Creates a rotation from an angle in radians
    #[inline]
    pub fn new(angle: f32) -> Self {
        Self {
            s: angle.sin(),
            c: angle.cos(),
        }
    }

    /// The identity rotation (zero angle)
    #[inline]
    pub fn identity() -> Self {
        Self { s: 0.0, c: 1.0 }
    }

    /// Returns the rotation angle in radians
    #[inline]
    pub fn angle(&self) -> f32 {
        self.s.atan2(self.c)
    }

    /// Rotates a vector by this rotation
    #[inline]
    pub fn rotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Rotates a vector by the inverse of this rotation
    #[inline]
    pub fn unrotate(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }
}

impl Default for Rot2 {
    fn default() -> Self {
        Self::identity()
    }
}
