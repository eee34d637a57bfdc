use crate::bodies::Material;
use crate::math::{Aabb, Rot2, Vec2};
use crate::shapes::{Circle, Poly, Segment};

/// The shape kinds, ordered so that shape pairs canonicalize as
/// circle <= segment <= polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShapeKind {
    Circle,
    Segment,
    Poly,
}

/// Mass properties contributed by one shape, with inertia taken about the
/// shape's own centroid.
#[derive(Debug, Clone, Copy)]
pub struct MassData {
    pub mass: f32,
    pub centroid: Vec2,
    pub inertia: f32,
}

/// Geometry payload of a shape, in the owning body's local frame with a
/// cached world-space copy refreshed by `cache_data`.
#[derive(Debug, Clone)]
pub enum ShapeData {
    Circle(Circle),
    Segment(Segment),
    Poly(Poly),
}

/// A collision shape attached to a rigid body
#[derive(Debug, Clone)]
pub struct Shape {
    /// World-unique id, assigned when the owning body enters a space.
    /// Zero means unassigned.
    pub(crate) id: u32,

    /// Surface material (restitution, friction, density)
    pub material: Material,

    /// The shape geometry
    pub data: ShapeData,

    /// World bounds, refreshed by `cache_data`
    pub(crate) aabb: Aabb,
}

impl Shape {
    /// Creates a shape from geometry with the default material
    pub fn new(data: ShapeData) -> Self {
        Self {
            id: 0,
            material: Material::default(),
            data,
            aabb: Aabb::empty(),
        }
    }

    /// Creates a shape from geometry and a material
    pub fn with_material(data: ShapeData, material: Material) -> Self {
        Self {
            material,
            ..Self::new(data)
        }
    }

    /// Returns the world-unique shape id (zero until the body is added to a space)
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the kind tag of this shape
    #[inline]
    pub fn kind(&self) -> ShapeKind {
        match self.data {
            ShapeData::Circle(_) => ShapeKind::Circle,
            ShapeData::Segment(_) => ShapeKind::Segment,
            ShapeData::Poly(_) => ShapeKind::Poly,
        }
    }

    /// Returns the cached world bounds
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Recomputes the cached world geometry and bounds from the owning
    /// body's origin transform
    pub fn cache_data(&mut self, origin: Vec2, rot: Rot2) {
        self.aabb = match &mut self.data {
            ShapeData::Circle(c) => c.cache_data(origin, rot),
            ShapeData::Segment(s) => s.cache_data(origin, rot),
            ShapeData::Poly(p) => p.cache_data(origin, rot),
        };
    }

    /// Returns the mass properties for this shape at its material density
    pub fn mass_data(&self) -> MassData {
        match &self.data {
            ShapeData::Circle(c) => c.mass_data(self.material.density),
            ShapeData::Segment(s) => s.mass_data(self.material.density),
            ShapeData::Poly(p) => p.mass_data(self.material.density),
        }
    }

    /// Returns whether a world point lies inside the shape
    pub fn contains_point(&self, p: Vec2) -> bool {
        match &self.data {
            ShapeData::Circle(c) => c.contains_point(p),
            ShapeData::Segment(s) => s.contains_point(p),
            ShapeData::Poly(poly) => poly.contains_point(p),
        }
    }

    /// Finds the index of a shape vertex within `slop` of a world point
    pub fn find_vertex(&self, p: Vec2, slop: f32) -> Option<usize> {
        match &self.data {
            ShapeData::Circle(c) => c.find_vertex(p, slop),
            ShapeData::Segment(s) => s.find_vertex(p, slop),
            ShapeData::Poly(poly) => poly.find_vertex(p, slop),
        }
    }

    /// Finds the index of a shape edge within `slop` of a world point
    pub fn find_edge(&self, p: Vec2, slop: f32) -> Option<usize> {
        match &self.data {
            ShapeData::Circle(_) => None,
            ShapeData::Segment(s) => s.find_edge(p, slop),
            ShapeData::Poly(poly) => poly.find_edge(p, slop),
        }
    }
}

/// Distance from point `p` to the segment `a`-`b`
pub(crate) fn segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    closest_point_on_segment(p, a, b).distance(&p)
}

/// Closest point to `p` on the segment `a`-`b`
pub(crate) fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < crate::math::EPSILON {
        return a;
    }
    let t = crate::math::clamp((p - a).dot(&ab) / len_sq, 0.0, 1.0);
    a + ab * t
}
