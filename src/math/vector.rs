use nalgebra as na;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// A 2D vector representation for physics calculations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    /// Creates a new 2D vector
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Creates a new 2D vector with all components set to zero
    #[inline]
    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Creates a unit vector pointing in the x direction
    #[inline]
    pub fn unit_x() -> Self {
        Self { x: 1.0, y: 0.0 }
    }

    /// Creates a unit vector pointing in the y direction
    #[inline]
    pub fn unit_y() -> Self {
        Self { x: 0.0, y: 1.0 }
    }

    /// Computes the dot product of two vectors
    #[inline]
    pub fn dot(&self, other: &Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Computes the scalar cross product of two 2D vectors
    #[inline]
    pub fn cross(&self, other: &Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Cross product of a scalar (angular velocity) with this vector: w x v
    #[inline]
    pub fn cross_scalar(w: f32, v: &Self) -> Self {
        Self::new(-w * v.y, w * v.x)
    }

    /// Returns the squared length of the vector
    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    /// Returns the length of the vector
    #[inline]
    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Returns a normalized version of the vector
    #[inline]
    pub fn normalize(&self) -> Self {
        let length = self.length();
        if length > crate::math::EPSILON {
            *self / length
        } else {
            *self
        }
    }

    /// Returns true if the vector is approximately zero
    #[inline]
    pub fn is_zero(&self) -> bool {
        crate::math::approx_zero(self.length_squared())
    }

    /// Distance between two vectors
    #[inline]
    pub fn distance(&self, other: &Self) -> f32 {
        (*self - *other).length()
    }

    /// Squared distance between two vectors
    #[inline]
    pub fn distance_squared(&self, other: &Self) -> f32 {
        (*self - *other).length_squared()
    }

    /// Linear interpolation between two vectors
    #[inline]
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        *self + (*other - *self) * t
    }

    /// Returns the angle in radians of this vector (in the range [-PI, PI])
    #[inline]
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Returns the counter-clockwise perpendicular of this vector
    #[inline]
    pub fn perpendicular(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Returns the clockwise perpendicular of this vector
    #[inline]
    pub fn right_perpendicular(&self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// Convert to nalgebra Vector2
    #[inline]
    pub fn to_nalgebra(&self) -> na::Vector2<f32> {
        na::Vector2::new(self.x, self.y)
    }

    /// Convert from nalgebra Vector2
    #[inline]
    pub fn from_nalgebra(v: &na::Vector2<f32>) -> Self {
        Self::new(v.x, v.y)
    }
}

impl From<[f32; 2]> for Vec2 {
    #[inline]
    fn from(array: [f32; 2]) -> Self {
        Self::new(array[0], array[1])
    }
}

impl From<Vec2> for [f32; 2] {
    #[inline]
    fn from(vector: Vec2) -> Self {
        [vector.x, vector.y]
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Vec2 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vec2 {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl SubAssign for Vec2 {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f32) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl MulAssign<f32> for Vec2 {
    #[inline]
    fn mul_assign(&mut self, scalar: f32) {
        self.x *= scalar;
        self.y *= scalar;
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    #[inline]
    fn div(self, scalar: f32) -> Self {
        Self::new(self.x / scalar, self.y / scalar)
    }
}

impl DivAssign<f32> for Vec2 {
    #[inline]
    fn div_assign(&mut self, scalar: f32) {
        self.x /= scalar;
        self.y /= scalar;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
