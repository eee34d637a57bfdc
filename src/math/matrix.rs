use crate::math::Vec2;
use nalgebra as na;
use serde::{Deserialize, Serialize};

/// A 2x2 matrix used for two-row constraint effective masses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat2 {
    pub data: [[f32; 2]; 2],
}

impl Mat2 {
    /// Creates a new 2x2 matrix from row-major entries
    #[inline]
    pub fn new(m11: f32, m12: f32, m21: f32, m22: f32) -> Self {
        Self {
            data: [[m11, m12], [m21, m22]],
        }
    }

    /// Creates a new 2x2 identity matrix
    #[inline]
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0)
    }

    /// Creates a new 2x2 zero matrix
    #[inline]
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }

    /// Returns the determinant of the matrix
    #[inline]
    pub fn determinant(&self) -> f32 {
        self.data[0][0] * self.data[1][1] - self.data[0][1] * self.data[1][0]
    }

    /// Multiplies the matrix with a vector
    #[inline]
    pub fn multiply_vector(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.data[0][0] * v.x + self.data[0][1] * v.y,
            self.data[1][0] * v.x + self.data[1][1] * v.y,
        )
    }

    /// Solves `A * x = b` for x. Returns zero when the matrix is singular,
    /// which the solvers treat as "apply no impulse".
    #[inline]
    pub fn solve(&self, b: Vec2) -> Vec2 {
        let det = self.determinant();
        if det.abs() < crate::math::EPSILON {
            return Vec2::zero();
        }
        let inv_det = 1.0 / det;
        Vec2::new(
            inv_det * (self.data[1][1] * b.x - self.data[0][1] * b.y),
            inv_det * (self.data[0][0] * b.y - self.data[1][0] * b.x),
        )
    }

    /// Convert to nalgebra Matrix2
    #[inline]
    pub fn to_nalgebra(&self) -> na::Matrix2<f32> {
        na::Matrix2::new(
            self.data[0][0],
            self.data[0][1],
            self.data[1][0],
            self.data[1][1],
        )
    }

    /// Convert from nalgebra Matrix2
    #[inline]
    pub fn from_nalgebra(m: &na::Matrix2<f32>) -> Self {
        Self::new(m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)])
    }
}

/// A 3x3 matrix used for three-row constraint effective masses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mat3 {
    pub data: [[f32; 3]; 3],
}

impl Mat3 {
    /// Creates a new 3x3 matrix from a 2D array
    #[inline]
    pub fn new(data: [[f32; 3]; 3]) -> Self {
        Self { data }
    }

    /// Creates a new 3x3 identity matrix
    #[inline]
    pub fn identity() -> Self {
        Self {
            data: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Creates a new 3x3 zero matrix
    #[inline]
    pub fn zero() -> Self {
        Self {
            data: [[0.0; 3]; 3],
        }
    }

    /// Returns the determinant of the matrix
    pub fn determinant(&self) -> f32 {
        let m = &self.data;
        m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
    }

    /// Solves `A * x = b` for x by Cramer's rule. Returns zeros when the
    /// matrix is singular, which the solvers treat as "apply no impulse".
    pub fn solve(&self, b: [f32; 3]) -> [f32; 3] {
        let det = self.determinant();
        if det.abs() < crate::math::EPSILON {
            return [0.0; 3];
        }
        let inv_det = 1.0 / det;
        let mut out = [0.0; 3];
        for (i, slot) in out.iter_mut().enumerate() {
            let mut m = self.data;
            for row in 0..3 {
                m[row][i] = b[row];
            }
            *slot = Self::new(m).determinant() * inv_det;
        }
        out
    }

    /// Convert to nalgebra Matrix3
    #[inline]
    pub fn to_nalgebra(&self) -> na::Matrix3<f32> {
        let m = &self.data;
        na::Matrix3::new(
            m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2],
        )
    }

    /// Convert from nalgebra Matrix3
    #[inline]
    pub fn from_nalgebra(m: &na::Matrix3<f32>) -> Self {
        Self::new([
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ])
    }
}
