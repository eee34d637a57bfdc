use crate::math::{Aabb, Rot2, Vec2};
use crate::shapes::MassData;

/// A circle with its center in the owning body's local frame
#[derive(Debug, Clone)]
pub struct Circle {
    /// Center in body-local coordinates
    pub center: Vec2,

    /// Radius
    pub radius: f32,

    /// Cached world-space center
    pub(crate) world_center: Vec2,
}

impl Circle {
    /// Creates a circle at a local-frame center
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            center,
            radius,
            world_center: center,
        }
    }

    /// Returns the cached world-space center
    #[inline]
    pub fn world_center(&self) -> Vec2 {
        self.world_center
    }

    pub(crate) fn cache_data(&mut self, origin: Vec2, rot: Rot2) -> Aabb {
        self.world_center = origin + rot.rotate(self.center);
        Aabb::from_center(self.world_center, Vec2::new(self.radius, self.radius))
    }

    pub(crate) fn mass_data(&self, density: f32) -> MassData {
        let mass = density * std::f32::consts::PI * self.radius * self.radius;
        MassData {
            mass,
            centroid: self.center,
            inertia: 0.5 * mass * self.radius * self.radius,
        }
    }

    pub(crate) fn contains_point(&self, p: Vec2) -> bool {
        self.world_center.distance_squared(&p) <= self.radius * self.radius
    }

    pub(crate) fn find_vertex(&self, p: Vec2, slop: f32) -> Option<usize> {
        (self.world_center.distance(&p) <= slop).then_some(0)
    }
}
