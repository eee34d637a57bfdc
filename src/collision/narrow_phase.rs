//! Narrow-phase collision kernels.
//!
//! `collide` takes a shape pair in canonical kind order (circle <= segment
//! <= polygon) and produces contact points whose normals point from the
//! first shape toward the second. Feature ids are stable across steps so
//! the contact solver can persist impulse accumulators.

use crate::collision::{ContactPoint, FeatureId};
use crate::math::{clamp, Vec2, EPSILON};
use crate::shapes::shape::closest_point_on_segment;
use crate::shapes::{Circle, Poly, Segment, Shape, ShapeData};

/// Computes the contact manifold between two shapes in canonical order
pub fn collide(shape1: &Shape, shape2: &Shape) -> Vec<ContactPoint> {
    debug_assert!(shape1.kind() <= shape2.kind());

    match (&shape1.data, &shape2.data) {
        (ShapeData::Circle(a), ShapeData::Circle(b)) => circle_circle(a, b).into_iter().collect(),
        (ShapeData::Circle(a), ShapeData::Segment(b)) => {
            circle_segment(a, b).into_iter().collect()
        }
        (ShapeData::Circle(a), ShapeData::Poly(b)) => {
            circle_vs_poly(a.world_center(), a.radius, b, 0).into_iter().collect()
        }
        (ShapeData::Segment(a), ShapeData::Segment(b)) => {
            segment_segment(a, b).into_iter().collect()
        }
        (ShapeData::Segment(a), ShapeData::Poly(b)) => segment_poly(a, b),
        (ShapeData::Poly(a), ShapeData::Poly(b)) => poly_poly(a, b),
        _ => Vec::new(),
    }
}

/// Contact between two rounded points (circle centers, capsule cores)
fn round_contact(c1: Vec2, r1: f32, c2: Vec2, r2: f32, feature: FeatureId) -> Option<ContactPoint> {
    let d = c2 - c1;
    let dist_sq = d.length_squared();
    let rsum = r1 + r2;
    if dist_sq > rsum * rsum {
        return None;
    }

    let dist = dist_sq.sqrt();
    // Coincident centers have no direction; pick one rather than crash
    let normal = if dist > EPSILON { d / dist } else { Vec2::unit_y() };
    let depth = dist - rsum;
    let position = c1 + normal * (r1 + 0.5 * depth);
    Some(ContactPoint::new(position, normal, depth, feature))
}

fn circle_circle(a: &Circle, b: &Circle) -> Option<ContactPoint> {
    round_contact(
        a.world_center(),
        a.radius,
        b.world_center(),
        b.radius,
        FeatureId::pair(0, 0),
    )
}

fn circle_segment(circle: &Circle, segment: &Segment) -> Option<ContactPoint> {
    let c = circle.world_center();
    let (a, b) = segment.world_endpoints();

    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > EPSILON {
        clamp((c - a).dot(&ab) / len_sq, 0.0, 1.0)
    } else {
        0.0
    };
    let region = if t <= 0.0 {
        0
    } else if t >= 1.0 {
        1
    } else {
        2
    };

    round_contact(
        c,
        circle.radius,
        a + ab * t,
        segment.radius,
        FeatureId::pair(region, 0),
    )
}

/// A rounded point (circle or capsule endpoint) against a polygon.
///
/// `feature_base` distinguishes which endpoint the caller is testing.
fn circle_vs_poly(c: Vec2, radius: f32, poly: &Poly, feature_base: u32) -> Option<ContactPoint> {
    let planes = poly.world_planes();
    let verts = poly.world_verts();

    let mut best = 0;
    let mut sep = f32::MIN;
    for (i, plane) in planes.iter().enumerate() {
        let s = plane.normal.dot(&c) - plane.dist;
        if s > sep {
            sep = s;
            best = i;
        }
    }
    if sep > radius {
        return None;
    }

    let v1 = verts[best];
    let v2 = verts[(best + 1) % verts.len()];

    if sep < EPSILON {
        // Center is inside the polygon: push out along the shallowest face
        let n_face = planes[best].normal;
        let position = c - n_face * sep;
        return Some(ContactPoint::new(
            position,
            -n_face,
            sep - radius,
            FeatureId::pair(feature_base, best as u32),
        ));
    }

    let q = closest_point_on_segment(c, v1, v2);
    let d = q - c;
    let dist = d.length();
    if dist > radius {
        return None;
    }
    if dist < EPSILON {
        let n_face = planes[best].normal;
        return Some(ContactPoint::new(
            c,
            -n_face,
            -radius,
            FeatureId::pair(feature_base, best as u32),
        ));
    }

    Some(ContactPoint::new(
        q,
        d / dist,
        dist - radius,
        FeatureId::pair(feature_base, best as u32),
    ))
}

/// Closest points between segments `p1`-`q1` and `p2`-`q2`
fn closest_points_on_segments(p1: Vec2, q1: Vec2, p2: Vec2, q2: Vec2) -> (Vec2, Vec2) {
    let d1 = q1 - p1;
    let d2 = q2 - p2;
    let r = p1 - p2;
    let a = d1.length_squared();
    let e = d2.length_squared();
    let f = d2.dot(&r);

    if a <= EPSILON && e <= EPSILON {
        return (p1, p2);
    }

    let (s, t);
    if a <= EPSILON {
        s = 0.0;
        t = clamp(f / e, 0.0, 1.0);
    } else {
        let c = d1.dot(&r);
        if e <= EPSILON {
            t = 0.0;
            s = clamp(-c / a, 0.0, 1.0);
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s_tmp = if denom.abs() > EPSILON {
                clamp((b * f - c * e) / denom, 0.0, 1.0)
            } else {
                0.0
            };
            let mut t_tmp = (b * s_tmp + f) / e;
            if t_tmp < 0.0 {
                t_tmp = 0.0;
                s_tmp = clamp(-c / a, 0.0, 1.0);
            } else if t_tmp > 1.0 {
                t_tmp = 1.0;
                s_tmp = clamp((b - c) / a, 0.0, 1.0);
            }
            s = s_tmp;
            t = t_tmp;
        }
    }

    (p1 + d1 * s, p2 + d2 * t)
}

fn segment_segment(seg1: &Segment, seg2: &Segment) -> Option<ContactPoint> {
    let (a1, b1) = seg1.world_endpoints();
    let (a2, b2) = seg2.world_endpoints();
    let (c1, c2) = closest_points_on_segments(a1, b1, a2, b2);
    round_contact(c1, seg1.radius, c2, seg2.radius, FeatureId::pair(0, 0))
}

fn segment_poly(segment: &Segment, poly: &Poly) -> Vec<ContactPoint> {
    let mut contacts = Vec::new();
    let (a, b) = segment.world_endpoints();

    // Capsule endpoints against the polygon
    if let Some(c) = circle_vs_poly(a, segment.radius, poly, 0) {
        contacts.push(c);
    }
    if let Some(c) = circle_vs_poly(b, segment.radius, poly, 1) {
        contacts.push(c);
    }

    // Polygon vertices against the capsule core
    for (i, v) in poly.world_verts().iter().enumerate() {
        let q = closest_point_on_segment(*v, a, b);
        // Endpoint regions are covered above
        if q.distance_squared(&a) < EPSILON || q.distance_squared(&b) < EPSILON {
            continue;
        }
        let d = *v - q;
        let dist = d.length();
        if dist > segment.radius || dist < EPSILON {
            continue;
        }
        contacts.push(ContactPoint::new(
            *v,
            d / dist,
            dist - segment.radius,
            FeatureId::pair(2, i as u32),
        ));
    }

    // Keep the two deepest points
    contacts.sort_by(|p, q| p.depth.total_cmp(&q.depth));
    contacts.truncate(2);
    contacts
}

/// Deepest penetration of `b`'s vertices past each face of `a`
fn max_separation(a: &Poly, b: &Poly) -> (f32, usize) {
    let mut best_sep = f32::MIN;
    let mut best_edge = 0;
    for (i, plane) in a.world_planes().iter().enumerate() {
        let mut min_dot = f32::MAX;
        for v in b.world_verts() {
            min_dot = min_dot.min(plane.normal.dot(v) - plane.dist);
        }
        if min_dot > best_sep {
            best_sep = min_dot;
            best_edge = i;
        }
    }
    (best_sep, best_edge)
}

#[derive(Clone, Copy)]
struct ClipVertex {
    v: Vec2,
    id: u32,
}

/// Keeps the part of the edge on the negative side of the clip line
fn clip_edge(points: [ClipVertex; 2], normal: Vec2, offset: f32, clip_id: u32) -> Option<[ClipVertex; 2]> {
    let d0 = normal.dot(&points[0].v) - offset;
    let d1 = normal.dot(&points[1].v) - offset;

    let mut out = [points[0]; 2];
    let mut n = 0;
    if d0 <= 0.0 {
        out[n] = points[0];
        n += 1;
    }
    if d1 <= 0.0 {
        out[n] = points[1];
        n += 1;
    }
    if d0 * d1 < 0.0 {
        let t = d0 / (d0 - d1);
        out[n] = ClipVertex {
            v: points[0].v.lerp(&points[1].v, t),
            id: clip_id,
        };
        n += 1;
    }
    (n == 2).then_some(out)
}

fn poly_poly(poly1: &Poly, poly2: &Poly) -> Vec<ContactPoint> {
    let (sep1, edge1) = max_separation(poly1, poly2);
    if sep1 > 0.0 {
        return Vec::new();
    }
    let (sep2, edge2) = max_separation(poly2, poly1);
    if sep2 > 0.0 {
        return Vec::new();
    }

    // Prefer the first polygon's face unless the second is clearly better,
    // so the reference edge (and feature ids) stay stable between steps
    let (reference, incident, ref_edge, flip) = if sep2 > sep1 * 0.98 + 0.001 {
        (poly2, poly1, edge2, true)
    } else {
        (poly1, poly2, edge1, false)
    };

    let ref_normal = reference.world_planes()[ref_edge].normal;
    let ref_v1 = reference.world_verts()[ref_edge];
    let ref_v2 = reference.world_verts()[(ref_edge + 1) % reference.len()];

    // Incident edge: the most anti-parallel edge of the other polygon
    let mut inc_edge = 0;
    let mut min_dot = f32::MAX;
    for (i, plane) in incident.world_planes().iter().enumerate() {
        let dot = plane.normal.dot(&ref_normal);
        if dot < min_dot {
            min_dot = dot;
            inc_edge = i;
        }
    }
    let inc_next = (inc_edge + 1) % incident.len();
    let points = [
        ClipVertex {
            v: incident.world_verts()[inc_edge],
            id: inc_edge as u32,
        },
        ClipVertex {
            v: incident.world_verts()[inc_next],
            id: inc_next as u32,
        },
    ];

    // Clip the incident edge to the reference edge's side planes
    let tangent = (ref_v2 - ref_v1).normalize();
    let clipped = clip_edge(points, -tangent, -tangent.dot(&ref_v1), u32::MAX - 1)
        .and_then(|pts| clip_edge(pts, tangent, tangent.dot(&ref_v2), u32::MAX));
    let Some(clipped) = clipped else {
        return Vec::new();
    };

    let front = ref_normal.dot(&ref_v1);
    let normal = if flip { -ref_normal } else { ref_normal };
    let flip_bit = u32::from(flip);

    clipped
        .iter()
        .filter_map(|cv| {
            let separation = ref_normal.dot(&cv.v) - front;
            (separation <= 0.0).then(|| {
                ContactPoint::new(
                    cv.v,
                    normal,
                    separation,
                    FeatureId::pair((ref_edge as u32) << 1 | flip_bit, cv.id),
                )
            })
        })
        .collect()
}
