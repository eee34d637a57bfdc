use impulse2d::collision::collide;
use impulse2d::math::{Rot2, Vec2};
use impulse2d::shapes::{Circle, Poly, Segment, Shape, ShapeData};

fn cached(mut shape: Shape, origin: Vec2, angle: f32) -> Shape {
    shape.cache_data(origin, Rot2::new(angle));
    shape
}

fn circle(center: Vec2, radius: f32) -> Shape {
    cached(
        Shape::new(ShapeData::Circle(Circle::new(center, radius))),
        Vec2::zero(),
        0.0,
    )
}

fn boxed(origin: Vec2, half_w: f32, half_h: f32) -> Shape {
    cached(
        Shape::new(ShapeData::Poly(Poly::new_box(Vec2::zero(), half_w, half_h))),
        origin,
        0.0,
    )
}

#[test]
fn test_circle_circle_overlap() {
    let a = circle(Vec2::new(0.0, 0.0), 1.0);
    let b = circle(Vec2::new(1.5, 0.0), 1.0);

    let contacts = collide(&a, &b);
    assert_eq!(contacts.len(), 1);

    let c = &contacts[0];
    assert!((c.normal.x - 1.0).abs() < 1e-5);
    assert!(c.normal.y.abs() < 1e-5);
    assert!((c.depth + 0.5).abs() < 1e-5);
    // Contact point sits between the surfaces
    assert!((c.position.x - 0.75).abs() < 1e-4);
}

#[test]
fn test_circle_circle_separated() {
    let a = circle(Vec2::new(0.0, 0.0), 1.0);
    let b = circle(Vec2::new(3.0, 0.0), 1.0);
    assert!(collide(&a, &b).is_empty());
}

#[test]
fn test_box_resting_on_box_gives_two_points() {
    let floor = boxed(Vec2::new(0.0, -0.5), 10.0, 0.5);
    let block = boxed(Vec2::new(0.0, 0.49), 0.5, 0.5);

    let contacts = collide(&floor, &block);
    assert_eq!(contacts.len(), 2);

    for c in &contacts {
        // Normal from the floor toward the block
        assert!((c.normal.y - 1.0).abs() < 1e-4);
        assert!(c.depth <= 0.0);
        assert!(c.depth > -0.05);
    }

    // Two distinct corner features
    assert_ne!(contacts[0].feature, contacts[1].feature);
}

#[test]
fn test_feature_ids_stable_across_frames() {
    let floor = boxed(Vec2::new(0.0, -0.5), 10.0, 0.5);
    let block_a = boxed(Vec2::new(0.0, 0.49), 0.5, 0.5);
    // Same block a hair lower, as if one solver step had passed
    let block_b = boxed(Vec2::new(0.0, 0.488), 0.5, 0.5);

    let first = collide(&floor, &block_a);
    let second = collide(&floor, &block_b);
    assert_eq!(first.len(), second.len());

    let mut features: Vec<_> = first.iter().map(|c| c.feature).collect();
    let mut features_next: Vec<_> = second.iter().map(|c| c.feature).collect();
    features.sort_by_key(|f| f.0);
    features_next.sort_by_key(|f| f.0);
    assert_eq!(features, features_next);
}

#[test]
fn test_circle_on_box_face() {
    let floor = boxed(Vec2::new(0.0, -0.5), 10.0, 0.5);
    let ball = circle(Vec2::new(0.0, 0.4), 0.5);

    // Canonical order is circle before polygon
    let contacts = collide(&ball, &floor);
    assert_eq!(contacts.len(), 1);

    let c = &contacts[0];
    // Normal from the circle toward the floor
    assert!((c.normal.y + 1.0).abs() < 1e-4);
    assert!((c.depth + 0.1).abs() < 1e-3);
}

#[test]
fn test_circle_inside_box_is_pushed_out() {
    let block = boxed(Vec2::zero(), 1.0, 1.0);
    let ball = circle(Vec2::new(0.0, 0.5), 0.25);

    let contacts = collide(&ball, &block);
    assert_eq!(contacts.len(), 1);
    // Deep contact: depth well past the radius
    assert!(contacts[0].depth < -0.25);
}

#[test]
fn test_circle_on_segment() {
    let ground = cached(
        Shape::new(ShapeData::Segment(Segment::new(
            Vec2::new(-5.0, 0.0),
            Vec2::new(5.0, 0.0),
            0.2,
        ))),
        Vec2::zero(),
        0.0,
    );
    let ball = circle(Vec2::new(0.0, 0.6), 0.5);

    let contacts = collide(&ball, &ground);
    assert_eq!(contacts.len(), 1);

    let c = &contacts[0];
    // Ball sits 0.6 above the core; combined radius is 0.7
    assert!((c.depth + 0.1).abs() < 1e-4);
    assert!((c.normal.y + 1.0).abs() < 1e-4);
}

#[test]
fn test_segment_resting_on_box() {
    let block = boxed(Vec2::zero(), 1.0, 0.5);
    let beam = cached(
        Shape::new(ShapeData::Segment(Segment::new(
            Vec2::new(-0.8, 0.0),
            Vec2::new(0.8, 0.0),
            0.1,
        ))),
        Vec2::new(0.0, 0.55),
        0.0,
    );

    let contacts = collide(&beam, &block);
    assert!(!contacts.is_empty());
    for c in &contacts {
        assert!(c.depth <= 0.0);
        // Normal from the beam down into the block
        assert!(c.normal.y < -0.9);
    }
}

#[test]
fn test_separated_boxes_make_no_contacts() {
    let a = boxed(Vec2::new(0.0, 0.0), 0.5, 0.5);
    let b = boxed(Vec2::new(2.0, 0.0), 0.5, 0.5);
    assert!(collide(&a, &b).is_empty());
}

#[test]
fn test_rotated_box_corner_hit() {
    let floor = boxed(Vec2::new(0.0, -0.5), 10.0, 0.5);
    // Box tilted 45 degrees, corner just touching the floor
    let diamond = cached(
        Shape::new(ShapeData::Poly(Poly::new_box(Vec2::zero(), 0.5, 0.5))),
        Vec2::new(0.0, 0.68),
        std::f32::consts::FRAC_PI_4,
    );

    let contacts = collide(&floor, &diamond);
    assert!(!contacts.is_empty());
    for c in &contacts {
        assert!((c.normal.y - 1.0).abs() < 1e-3);
    }
}
