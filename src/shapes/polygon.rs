use crate::math::{Aabb, Rot2, Vec2};
use crate::shapes::shape::segment_distance;
use crate::shapes::MassData;

/// An edge plane of a convex polygon: `dot(normal, p) <= dist` inside
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub normal: Vec2,
    pub dist: f32,
}

/// A convex polygon with counter-clockwise vertices in the owning body's
/// local frame
#[derive(Debug, Clone)]
pub struct Poly {
    /// Vertices in body-local coordinates, counter-clockwise
    pub verts: Vec<Vec2>,

    /// Outward edge planes, one per vertex (edge i runs vert i -> i+1)
    pub(crate) planes: Vec<Plane>,

    /// Cached world-space vertices and planes
    pub(crate) world_verts: Vec<Vec2>,
    pub(crate) world_planes: Vec<Plane>,
}

impl Poly {
    /// Creates a polygon from counter-clockwise local vertices
    pub fn new(verts: Vec<Vec2>) -> Self {
        let planes = verts
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let next = verts[(i + 1) % verts.len()];
                let normal = (next - *v).right_perpendicular().normalize();
                Plane {
                    normal,
                    dist: normal.dot(v),
                }
            })
            .collect::<Vec<_>>();
        let world_verts = verts.clone();
        let world_planes = planes.clone();
        Self {
            verts,
            planes,
            world_verts,
            world_planes,
        }
    }

    /// Creates an axis-aligned box with the given half extents, centered on
    /// a local-frame point
    pub fn new_box(center: Vec2, half_width: f32, half_height: f32) -> Self {
        Self::new(vec![
            center + Vec2::new(-half_width, -half_height),
            center + Vec2::new(half_width, -half_height),
            center + Vec2::new(half_width, half_height),
            center + Vec2::new(-half_width, half_height),
        ])
    }

    /// Number of vertices (and edges)
    #[inline]
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    /// Returns whether the polygon has no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// Returns the cached world-space vertices
    #[inline]
    pub fn world_verts(&self) -> &[Vec2] {
        &self.world_verts
    }

    /// Returns the cached world-space edge planes
    #[inline]
    pub fn world_planes(&self) -> &[Plane] {
        &self.world_planes
    }

    pub(crate) fn cache_data(&mut self, origin: Vec2, rot: Rot2) -> Aabb {
        let mut aabb = Aabb::empty();
        for (world, local) in self.world_verts.iter_mut().zip(&self.verts) {
            *world = origin + rot.rotate(*local);
            aabb.expand_to_point(*world);
        }
        for (world, local) in self.world_planes.iter_mut().zip(&self.planes) {
            world.normal = rot.rotate(local.normal);
            world.dist = local.dist + world.normal.dot(&origin);
        }
        aabb
    }

    pub(crate) fn mass_data(&self, density: f32) -> MassData {
        // Shoelace integrals over the triangle fan
        let mut area = 0.0;
        let mut centroid = Vec2::zero();
        let mut inertia = 0.0;

        for (i, v1) in self.verts.iter().enumerate() {
            let v2 = self.verts[(i + 1) % self.verts.len()];
            let cross = v1.cross(&v2);
            area += cross;
            centroid += (*v1 + v2) * cross;
            inertia += cross * (v1.dot(v1) + v1.dot(&v2) + v2.dot(&v2));
        }

        area *= 0.5;
        if area.abs() < crate::math::EPSILON {
            return MassData {
                mass: 0.0,
                centroid: Vec2::zero(),
                inertia: 0.0,
            };
        }

        centroid /= 6.0 * area;
        let mass = density * area;
        // Inertia about the local origin, shifted to the centroid
        let inertia_origin = density * inertia / 12.0;
        MassData {
            mass,
            centroid,
            inertia: inertia_origin - mass * centroid.length_squared(),
        }
    }

    pub(crate) fn contains_point(&self, p: Vec2) -> bool {
        self.world_planes
            .iter()
            .all(|plane| plane.normal.dot(&p) - plane.dist <= 0.0)
    }

    pub(crate) fn find_vertex(&self, p: Vec2, slop: f32) -> Option<usize> {
        self.world_verts.iter().position(|v| v.distance(&p) <= slop)
    }

    pub(crate) fn find_edge(&self, p: Vec2, slop: f32) -> Option<usize> {
        (0..self.world_verts.len()).find(|&i| {
            let a = self.world_verts[i];
            let b = self.world_verts[(i + 1) % self.world_verts.len()];
            segment_distance(p, a, b) <= slop
        })
    }
}
