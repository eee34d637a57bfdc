use crate::math::{Aabb, Rot2, Vec2};
use crate::shapes::shape::segment_distance;
use crate::shapes::MassData;

/// A capsule: the set of points within `radius` of the line segment `a`-`b`,
/// authored in the owning body's local frame
#[derive(Debug, Clone)]
pub struct Segment {
    /// First endpoint in body-local coordinates
    pub a: Vec2,

    /// Second endpoint in body-local coordinates
    pub b: Vec2,

    /// Rounding radius
    pub radius: f32,

    /// Cached world-space endpoints
    pub(crate) world_a: Vec2,
    pub(crate) world_b: Vec2,
}

impl Segment {
    /// Creates a segment between two local-frame endpoints
    pub fn new(a: Vec2, b: Vec2, radius: f32) -> Self {
        Self {
            a,
            b,
            radius,
            world_a: a,
            world_b: b,
        }
    }

    /// Returns the cached world-space endpoints
    #[inline]
    pub fn world_endpoints(&self) -> (Vec2, Vec2) {
        (self.world_a, self.world_b)
    }

    pub(crate) fn cache_data(&mut self, origin: Vec2, rot: Rot2) -> Aabb {
        self.world_a = origin + rot.rotate(self.a);
        self.world_b = origin + rot.rotate(self.b);

        let r = Vec2::new(self.radius, self.radius);
        let mut aabb = Aabb::from_center(self.world_a, r);
        aabb.merge(&Aabb::from_center(self.world_b, r));
        aabb
    }

    pub(crate) fn mass_data(&self, density: f32) -> MassData {
        let length = self.a.distance(&self.b);
        let rect_mass = density * 2.0 * self.radius * length;
        let cap_mass = density * std::f32::consts::PI * self.radius * self.radius;

        // Rectangle core plus the two end caps; each half-disc's centroid
        // sits 4r/(3*pi) outboard of the flat edge, hence the cross term
        let rect_inertia = rect_mass * (length * length + 4.0 * self.radius * self.radius) / 12.0;
        let cap_inertia = cap_mass
            * (0.5 * self.radius * self.radius + 0.25 * length * length)
            + cap_mass * 4.0 * self.radius * length / (3.0 * std::f32::consts::PI);

        MassData {
            mass: rect_mass + cap_mass,
            centroid: (self.a + self.b) * 0.5,
            inertia: rect_inertia + cap_inertia,
        }
    }

    pub(crate) fn contains_point(&self, p: Vec2) -> bool {
        segment_distance(p, self.world_a, self.world_b) <= self.radius
    }

    pub(crate) fn find_vertex(&self, p: Vec2, slop: f32) -> Option<usize> {
        if self.world_a.distance(&p) <= slop {
            Some(0)
        } else if self.world_b.distance(&p) <= slop {
            Some(1)
        } else {
            None
        }
    }

    pub(crate) fn find_edge(&self, p: Vec2, slop: f32) -> Option<usize> {
        (segment_distance(p, self.world_a, self.world_b) <= self.radius + slop).then_some(0)
    }
}
