use impulse2d::constraints::{
    AngleJoint, DistanceJoint, LineJoint, PrismaticJoint, RevoluteJoint, RopeJoint, WeldJoint,
};
use impulse2d::core::WorldEvent;
use impulse2d::math::Vec2;
use impulse2d::shapes::{Circle, Poly, Shape, ShapeData};
use impulse2d::{RigidBody, Space};

const DT: f32 = 1.0 / 60.0;

fn small_box(half: f32) -> Shape {
    Shape::new(ShapeData::Poly(Poly::new_box(Vec2::zero(), half, half)))
}

fn anchor_body(space: &mut Space, position: Vec2) -> impulse2d::BodyHandle {
    space.add_body(RigidBody::new_static(position))
}

#[test]
fn test_rope_upper_bound_holds_through_swing() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let pivot = anchor_body(&mut space, Vec2::zero());

    let mut bob = RigidBody::new_dynamic(Vec2::new(2.0, 0.0));
    bob.add_shape(Shape::new(ShapeData::Circle(Circle::new(
        Vec2::zero(),
        0.1,
    ))));
    let bob = space.add_body(bob);

    space.add_joint(Box::new(RopeJoint::new(
        pivot,
        bob,
        Vec2::zero(),
        Vec2::zero(),
        2.0,
    )));

    // Ten seconds of swinging; the rope may stretch at most to its length
    // plus a little solver slack
    for _ in 0..600 {
        space.step(DT, 8, 3, true, false);
        let dist = space.get_body(bob).unwrap().position().length();
        assert!(dist <= 2.0 + 0.05, "rope overstretched: {}", dist);
    }
}

#[test]
fn test_rope_is_slack_below_max_length() {
    let mut space = Space::new();
    space.set_gravity(Vec2::zero());

    let a = anchor_body(&mut space, Vec2::zero());
    let mut body = RigidBody::new_dynamic(Vec2::new(1.0, 0.0));
    body.add_shape(small_box(0.1));
    let b = space.add_body(body);

    space.add_joint(Box::new(RopeJoint::new(
        a,
        b,
        Vec2::zero(),
        Vec2::zero(),
        2.0,
    )));

    for _ in 0..60 {
        space.step(DT, 8, 3, true, false);
    }

    // Well inside the limit: a slack rope applies no impulse
    let body = space.get_body(b).unwrap();
    assert!(body.linear_velocity().length() < 1e-4);
    assert!((body.position().x - 1.0).abs() < 1e-3);
}

#[test]
fn test_breakable_joint_snaps() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -100.0));

    let mut upper = RigidBody::new_dynamic(Vec2::zero());
    upper.add_shape(Shape::with_material(
        ShapeData::Poly(Poly::new_box(Vec2::zero(), 0.25, 0.25)),
        impulse2d::Material::new(4.0, 0.5, 0.1),
    ));
    upper.set_affected_by_gravity(false);
    let upper = space.add_body(upper);

    let mut lower = RigidBody::new_dynamic(Vec2::new(0.0, -1.0));
    lower.add_shape(Shape::with_material(
        ShapeData::Poly(Poly::new_box(Vec2::zero(), 0.25, 0.25)),
        impulse2d::Material::new(4.0, 0.5, 0.1),
    ));
    let lower = space.add_body(lower);

    let mut joint = DistanceJoint::new(upper, lower, Vec2::zero(), Vec2::zero(), 1.0);
    joint.set_breakable(1.0);
    let joint = space.add_joint(Box::new(joint));

    space.step(DT, 8, 3, true, false);
    space.step(DT, 8, 3, true, false);

    // Holding a unit mass against 100 m/s^2 needs ~100 N, far past max_force
    assert_eq!(space.joint_count(), 0);
    assert!(space.get_joint(joint).is_err());
    assert!(space
        .events()
        .iter()
        .any(|e| matches!(e, WorldEvent::JointBroken(_))));

    // With the joint gone the lower body falls freely
    for _ in 0..60 {
        space.step(DT, 8, 3, true, false);
    }
    let gap = space.get_body(upper).unwrap().position()
        - space.get_body(lower).unwrap().position();
    assert!(gap.length() > 2.0);
}

#[test]
fn test_revolute_pendulum_keeps_anchors_pinned() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let pivot = anchor_body(&mut space, Vec2::zero());

    // Rod hanging sideways from the pivot
    let mut rod = RigidBody::new_dynamic(Vec2::new(1.0, 0.0));
    rod.add_shape(small_box(0.5));
    let rod = space.add_body(rod);

    space.add_joint(Box::new(RevoluteJoint::new(
        pivot,
        rod,
        Vec2::zero(),
        Vec2::new(-1.0, 0.0),
    )));

    for _ in 0..300 {
        space.step(DT, 8, 3, true, false);
        // The rod anchor sits one unit from its centroid, so a pinned rod
        // keeps its centroid on the unit circle around the pivot
        let dist = space.get_body(rod).unwrap().position().length();
        assert!((dist - 1.0).abs() < 0.05, "anchors drifted: {}", dist);
    }
}

#[test]
fn test_revolute_motor_reaches_speed() {
    let mut space = Space::new();
    space.set_gravity(Vec2::zero());

    let pivot = anchor_body(&mut space, Vec2::zero());

    let mut wheel = RigidBody::new_dynamic(Vec2::zero());
    wheel.add_shape(Shape::new(ShapeData::Circle(Circle::new(
        Vec2::zero(),
        0.5,
    ))));
    let wheel = space.add_body(wheel);

    let mut joint = RevoluteJoint::new(pivot, wheel, Vec2::zero(), Vec2::zero());
    joint.enable_motor(2.0, 50.0);
    space.add_joint(Box::new(joint));

    for _ in 0..120 {
        space.step(DT, 8, 3, true, false);
    }

    let w = space.get_body(wheel).unwrap().angular_velocity();
    assert!((w - 2.0).abs() < 0.1, "motor speed not reached: {}", w);
}

#[test]
fn test_angle_joint_locks_rotation() {
    let mut space = Space::new();
    space.set_gravity(Vec2::zero());

    let frame = anchor_body(&mut space, Vec2::zero());

    let mut spinner = RigidBody::new_dynamic(Vec2::new(3.0, 0.0));
    spinner.add_shape(small_box(0.5));
    spinner.set_angular_velocity(5.0);
    let spinner = space.add_body(spinner);

    space.add_joint(Box::new(AngleJoint::new(frame, spinner, 0.0)));

    for _ in 0..60 {
        space.step(DT, 8, 3, true, false);
    }

    let body = space.get_body(spinner).unwrap();
    assert!(body.angular_velocity().abs() < 1e-3);
    assert!(body.angle().abs() < 0.2);
}

#[test]
fn test_angle_joint_limits_clamp() {
    let mut space = Space::new();
    space.set_gravity(Vec2::zero());

    let frame = anchor_body(&mut space, Vec2::zero());

    let mut spinner = RigidBody::new_dynamic(Vec2::new(3.0, 0.0));
    spinner.add_shape(small_box(0.5));
    spinner.set_angular_velocity(3.0);
    let spinner = space.add_body(spinner);

    let mut joint = AngleJoint::new(frame, spinner, 0.0);
    joint.set_limits(-0.5, 0.5);
    space.add_joint(Box::new(joint));

    for _ in 0..120 {
        space.step(DT, 8, 3, true, false);
        let angle = space.get_body(spinner).unwrap().angle();
        assert!(angle <= 0.5 + 0.1, "limit exceeded: {}", angle);
    }
}

#[test]
fn test_weld_joint_locks_bodies_together() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let mount = anchor_body(&mut space, Vec2::zero());

    let mut plate = RigidBody::new_dynamic(Vec2::new(1.0, 0.0));
    plate.add_shape(small_box(0.5));
    let plate = space.add_body(plate);

    space.add_joint(Box::new(WeldJoint::new(
        mount,
        plate,
        Vec2::new(1.0, 0.0),
        Vec2::zero(),
    )));

    for _ in 0..300 {
        space.step(DT, 8, 3, true, false);
    }

    // The weld must hold the plate in place against gravity
    let body = space.get_body(plate).unwrap();
    assert!((body.position().x - 1.0).abs() < 0.05);
    assert!(body.position().y.abs() < 0.05);
    assert!(body.angle().abs() < 0.05);
}

#[test]
fn test_prismatic_joint_slides_on_axis_only() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let rail = anchor_body(&mut space, Vec2::zero());

    let mut slider = RigidBody::new_dynamic(Vec2::new(1.0, 0.0));
    slider.add_shape(small_box(0.25));
    slider.set_linear_velocity(Vec2::new(2.0, 0.0));
    let slider = space.add_body(slider);

    space.add_joint(Box::new(PrismaticJoint::new(
        rail,
        slider,
        Vec2::zero(),
        Vec2::zero(),
        Vec2::new(1.0, 0.0),
    )));

    for _ in 0..120 {
        space.step(DT, 8, 3, true, false);
        let body = space.get_body(slider).unwrap();
        assert!(body.position().y.abs() < 0.05, "slider fell off its axis");
        assert!(body.angle().abs() < 0.05, "slider rotated");
    }

    // Translation along the axis stays free
    assert!(space.get_body(slider).unwrap().position().x > 2.0);
}

#[test]
fn test_line_joint_leaves_rotation_free() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let rail = anchor_body(&mut space, Vec2::zero());

    let mut roller = RigidBody::new_dynamic(Vec2::new(1.0, 0.0));
    roller.add_shape(small_box(0.25));
    roller.set_angular_velocity(3.0);
    let roller = space.add_body(roller);

    space.add_joint(Box::new(LineJoint::new(
        rail,
        roller,
        Vec2::zero(),
        Vec2::zero(),
        Vec2::new(1.0, 0.0),
    )));

    for _ in 0..60 {
        space.step(DT, 8, 3, true, false);
        assert!(space.get_body(roller).unwrap().position().y.abs() < 0.05);
    }

    // No angular row: the roller keeps spinning
    let w = space.get_body(roller).unwrap().angular_velocity();
    assert!((w - 3.0).abs() < 0.1);
}

#[test]
fn test_distance_spring_settles_at_rest_length() {
    let mut space = Space::new();
    space.set_gravity(Vec2::zero());

    let post = anchor_body(&mut space, Vec2::zero());

    let mut weight = RigidBody::new_dynamic(Vec2::new(2.0, 0.0));
    weight.add_shape(small_box(0.25));
    let weight = space.add_body(weight);

    let mut joint = DistanceJoint::new(post, weight, Vec2::zero(), Vec2::zero(), 1.0);
    joint.set_spring(2.0, 0.7);
    space.add_joint(Box::new(joint));

    for _ in 0..600 {
        space.step(DT, 8, 3, true, false);
    }

    let dist = space.get_body(weight).unwrap().position().length();
    assert!((dist - 1.0).abs() < 0.1, "spring did not settle: {}", dist);
}

#[test]
fn test_collide_connected_suppresses_contacts() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    // Two overlapping boxes held by a joint with collide_connected = false
    let mut a = RigidBody::new_dynamic(Vec2::zero());
    a.add_shape(small_box(0.5));
    let a = space.add_body(a);

    let mut b = RigidBody::new_dynamic(Vec2::new(0.25, 0.0));
    b.add_shape(small_box(0.5));
    let b = space.add_body(b);

    space.add_joint(Box::new(WeldJoint::new(
        a,
        b,
        Vec2::new(0.25, 0.0),
        Vec2::zero(),
    )));

    space.step(DT, 8, 3, true, false);
    assert_eq!(space.contact_solvers().count(), 0);
}

#[test]
fn test_adding_joint_wakes_sleepers() {
    let mut space = Space::new();
    space.set_gravity(Vec2::zero());

    let mut a = RigidBody::new_dynamic(Vec2::zero());
    a.add_shape(small_box(0.5));
    let a = space.add_body(a);

    let mut b = RigidBody::new_dynamic(Vec2::new(5.0, 0.0));
    b.add_shape(small_box(0.5));
    let b = space.add_body(b);

    // Nothing moves, so everything falls asleep
    for _ in 0..60 {
        space.step(DT, 8, 3, true, true);
    }
    assert!(!space.get_body(a).unwrap().is_awake());
    assert!(!space.get_body(b).unwrap().is_awake());

    space.add_joint(Box::new(RopeJoint::new(
        a,
        b,
        Vec2::zero(),
        Vec2::zero(),
        10.0,
    )));
    assert!(space.get_body(a).unwrap().is_awake());
    assert!(space.get_body(b).unwrap().is_awake());
}
