use impulse2d::error::PhysicsError;
use impulse2d::math::Vec2;
use impulse2d::shapes::{Circle, Poly, Segment, Shape, ShapeData};
use impulse2d::{RigidBody, Space};

use impulse2d::constraints::{
    AngleJoint, DistanceJoint, LineJoint, PrismaticJoint, RevoluteJoint, RopeJoint, WeldJoint,
};

/// One body of every shape kind, one joint of every kind
fn build_reference_space() -> Space {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let mut ground = RigidBody::new_static(Vec2::new(0.0, -1.0));
    ground.add_shape(Shape::new(ShapeData::Segment(Segment::new(
        Vec2::new(-10.0, 0.0),
        Vec2::new(10.0, 0.0),
        0.2,
    ))));
    let ground = space.add_body(ground);

    let mut ball = RigidBody::new_dynamic(Vec2::new(-2.0, 2.0));
    ball.add_shape(Shape::new(ShapeData::Circle(Circle::new(
        Vec2::zero(),
        0.5,
    ))));
    let ball = space.add_body(ball);

    let mut crate_box = RigidBody::new_dynamic(Vec2::new(2.0, 2.0));
    crate_box.add_shape(Shape::new(ShapeData::Poly(Poly::new_box(
        Vec2::zero(),
        0.5,
        0.5,
    ))));
    let crate_box = space.add_body(crate_box);

    space.add_joint(Box::new(RopeJoint::new(
        ground,
        ball,
        Vec2::zero(),
        Vec2::zero(),
        4.0,
    )));
    space.add_joint(Box::new(DistanceJoint::new(
        ball,
        crate_box,
        Vec2::zero(),
        Vec2::zero(),
        4.0,
    )));
    space.add_joint(Box::new(RevoluteJoint::new(
        ground,
        crate_box,
        Vec2::new(2.0, 3.0),
        Vec2::new(0.0, 0.5),
    )));
    space.add_joint(Box::new(WeldJoint::new(
        ground,
        ball,
        Vec2::new(-2.0, 3.0),
        Vec2::zero(),
    )));
    space.add_joint(Box::new(PrismaticJoint::new(
        ground,
        crate_box,
        Vec2::zero(),
        Vec2::zero(),
        Vec2::new(1.0, 0.0),
    )));
    space.add_joint(Box::new(LineJoint::new(
        ground,
        ball,
        Vec2::zero(),
        Vec2::zero(),
        Vec2::new(0.0, 1.0),
    )));
    space.add_joint(Box::new(AngleJoint::new(ball, crate_box, 0.0)));

    space
}

#[test]
fn test_scene_round_trip_is_stable() {
    let space = build_reference_space();
    let first = space.to_json().unwrap();

    let mut reloaded = Space::new();
    reloaded.load_json(&first).unwrap();
    assert_eq!(reloaded.body_count(), 3);
    assert_eq!(reloaded.joint_count(), 7);

    let second = reloaded.to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_loaded_scene_simulates() {
    let json = r#"{
        "bodies": [
            {
                "type": "static",
                "position": {"x": 0.0, "y": -0.5},
                "shapes": [{"type": "ShapePoly",
                            "verts": [{"x": -10.0, "y": -0.5}, {"x": 10.0, "y": -0.5},
                                      {"x": 10.0, "y": 0.5}, {"x": -10.0, "y": 0.5}],
                            "e": 0.1, "u": 0.5, "density": 1.0}]
            },
            {
                "type": "dynamic",
                "position": {"x": 0.0, "y": 3.0},
                "shapes": [{"type": "ShapeCircle", "center": {"x": 0.0, "y": 0.0},
                            "radius": 0.5, "e": 0.1, "u": 0.5, "density": 1.0}]
            }
        ]
    }"#;

    let mut world = Space::new();
    world.load_json(json).unwrap();
    for _ in 0..180 {
        world.step(1.0 / 60.0, 8, 3, true, true);
    }

    // The ball fell onto the floor and came to rest on top of it
    let (_, ball) = world.bodies().nth(1).expect("ball body");
    assert!(ball.position().y > 0.3 && ball.position().y < 1.2);
    assert!(ball.position().x.abs() < 0.5);
}

#[test]
fn test_unknown_shape_kind_is_rejected() {
    let json = r#"{
        "bodies": [
            {
                "type": "dynamic",
                "position": {"x": 0.0, "y": 0.0},
                "shapes": [{"type": "ShapeHexagon", "radius": 1.0, "e": 0.0, "u": 0.5, "density": 1.0}]
            }
        ]
    }"#;

    let mut space = Space::new();
    let err = space.load_json(json).unwrap_err();
    assert!(matches!(err, PhysicsError::UnknownShapeKind(kind) if kind == "ShapeHexagon"));
    assert_eq!(space.body_count(), 0);
}

#[test]
fn test_unknown_joint_kind_is_rejected() {
    let json = r#"{
        "bodies": [],
        "joints": [{"type": "MagnetJoint", "body1": 0, "body2": 1}]
    }"#;

    let mut space = Space::new();
    let err = space.load_json(json).unwrap_err();
    assert!(matches!(err, PhysicsError::UnknownJointKind(kind) if kind == "MagnetJoint"));
}

#[test]
fn test_dangling_body_reference_is_rejected() {
    let json = r#"{
        "bodies": [
            {"type": "static", "position": {"x": 0.0, "y": 0.0}, "shapes": []}
        ],
        "joints": [
            {
                "type": "RopeJoint",
                "body1": 0,
                "body2": 7,
                "anchor1": {"x": 0.0, "y": 0.0},
                "anchor2": {"x": 0.0, "y": 0.0},
                "max_length": 1.0
            }
        ]
    }"#;

    let mut space = Space::new();
    let err = space.load_json(json).unwrap_err();
    assert!(matches!(
        err,
        PhysicsError::BodyIndexOutOfRange { index: 7, len: 1 }
    ));
    // A failed load leaves the space cleared
    assert_eq!(space.body_count(), 0);
    assert_eq!(space.joint_count(), 0);
}

#[test]
fn test_malformed_json_is_rejected() {
    let mut space = Space::new();
    let err = space.load_json("this is not a scene").unwrap_err();
    assert!(matches!(err, PhysicsError::InvalidScene(_)));
}

#[test]
fn test_load_replaces_previous_world() {
    let mut space = build_reference_space();
    let json = space.to_json().unwrap();

    // Loading clears what was there, so ids restart from scratch
    space.load_json(&json).unwrap();
    space.load_json(&json).unwrap();
    assert_eq!(space.body_count(), 3);
    assert_eq!(space.joint_count(), 7);
}

#[test]
fn test_authoring_queries() {
    let space = build_reference_space();

    // The crate box spans [1.5, 2.5] x [1.5, 2.5]
    let (_, shape_id) = space
        .find_shape_by_point(Vec2::new(2.0, 2.0))
        .expect("point inside the box");
    assert!(shape_id > 0);

    assert!(space.find_shape_by_point(Vec2::new(50.0, 50.0)).is_none());

    let vertex = space.find_vertex_by_point(Vec2::new(1.5, 1.5), 0.05);
    assert!(vertex.is_some());

    let edge = space.find_edge_by_point(Vec2::new(2.0, 1.5), 0.05);
    assert!(edge.is_some());

    let joint = space.find_joint_by_point(Vec2::new(-2.0, 2.0), 0.1);
    assert!(joint.is_some());
}
