use impulse2d::math::{clamp, to_degrees, to_radians, Aabb, Mat2, Mat3, Rot2, Vec2};

#[test]
fn test_vector_arithmetic() {
    let a = Vec2::new(1.0, 2.0);
    let b = Vec2::new(3.0, -4.0);

    assert_eq!(a + b, Vec2::new(4.0, -2.0));
    assert_eq!(a - b, Vec2::new(-2.0, 6.0));
    assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
    assert_eq!(-a, Vec2::new(-1.0, -2.0));
    assert_eq!(a.dot(&b), -5.0);
}

#[test]
fn test_scalar_cross_products() {
    let a = Vec2::new(1.0, 0.0);
    let b = Vec2::new(0.0, 1.0);

    // Right-handed: x cross y is positive
    assert_eq!(a.cross(&b), 1.0);
    assert_eq!(b.cross(&a), -1.0);

    // w cross v rotates v by 90 degrees and scales by w
    let v = Vec2::new(2.0, 0.0);
    let rotated = Vec2::cross_scalar(3.0, &v);
    assert_eq!(rotated, Vec2::new(0.0, 6.0));
}

#[test]
fn test_vector_normalize_degenerate() {
    let tiny = Vec2::new(0.0, 0.0);
    // Normalizing a zero vector must not produce NaN
    let n = tiny.normalize();
    assert!(n.x.is_finite() && n.y.is_finite());

    let v = Vec2::new(3.0, 4.0);
    let n = v.normalize();
    assert!((n.length() - 1.0).abs() < 1e-6);
}

#[test]
fn test_rotation_round_trip() {
    let rot = Rot2::new(0.7);
    let v = Vec2::new(2.0, -1.5);

    let rotated = rot.rotate(v);
    let back = rot.unrotate(rotated);
    assert!((back.x - v.x).abs() < 1e-5);
    assert!((back.y - v.y).abs() < 1e-5);

    assert!((rot.angle() - 0.7).abs() < 1e-6);
    assert!((rot.rotate(v).length() - v.length()).abs() < 1e-5);
}

#[test]
fn test_mat2_solve() {
    let m = Mat2::new(2.0, 1.0, 1.0, 3.0);
    let b = Vec2::new(5.0, 10.0);
    let x = m.solve(b);

    let check = m.multiply_vector(x);
    assert!((check.x - b.x).abs() < 1e-4);
    assert!((check.y - b.y).abs() < 1e-4);
}

#[test]
fn test_mat2_singular_solve_is_zero() {
    let m = Mat2::new(1.0, 2.0, 2.0, 4.0);
    let x = m.solve(Vec2::new(1.0, 1.0));
    assert_eq!(x, Vec2::zero());
}

#[test]
fn test_mat3_solve() {
    let m = Mat3::new([[4.0, 1.0, 0.0], [1.0, 3.0, 1.0], [0.0, 1.0, 2.0]]);
    let b = [1.0, 2.0, 3.0];
    let x = m.solve(b);

    for row in 0..3 {
        let got: f32 = (0..3).map(|col| m.data[row][col] * x[col]).sum();
        assert!((got - b[row]).abs() < 1e-4);
    }
}

#[test]
fn test_aabb_overlap_and_union() {
    let a = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
    let b = Aabb::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0));
    let c = Aabb::new(Vec2::new(5.0, 5.0), Vec2::new(6.0, 6.0));

    assert!(a.overlaps(&b));
    assert!(!a.overlaps(&c));
    assert!(a.contains_point(Vec2::new(1.0, 1.0)));
    assert!(!a.contains_point(Vec2::new(2.5, 1.0)));

    let mut merged = a;
    merged.merge(&c);
    assert_eq!(merged.min, Vec2::new(0.0, 0.0));
    assert_eq!(merged.max, Vec2::new(6.0, 6.0));
}

#[test]
fn test_scalar_helpers() {
    assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
    assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
    assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);

    assert!((to_radians(180.0) - std::f32::consts::PI).abs() < 1e-6);
    assert!((to_degrees(std::f32::consts::PI) - 180.0).abs() < 1e-4);
}
