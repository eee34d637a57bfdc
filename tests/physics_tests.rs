use impulse2d::core::WorldEvent;
use impulse2d::math::Vec2;
use impulse2d::shapes::{Poly, Shape, ShapeData};
use impulse2d::{RigidBody, Space};

const DT: f32 = 1.0 / 60.0;

fn unit_box() -> Shape {
    Shape::new(ShapeData::Poly(Poly::new_box(Vec2::zero(), 0.5, 0.5)))
}

fn floor_body() -> RigidBody {
    let mut floor = RigidBody::new_static(Vec2::new(0.0, -0.5));
    floor.add_shape(Shape::new(ShapeData::Poly(Poly::new_box(
        Vec2::zero(),
        20.0,
        0.5,
    ))));
    floor
}

#[test]
fn test_free_fall() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 10.0));
    body.add_shape(unit_box());
    let handle = space.add_body(body);

    for _ in 0..120 {
        space.step(DT, 8, 3, true, false);
    }

    let body = space.get_body(handle).unwrap();
    // Semi-implicit Euler over 120 steps: v = -g*t, y = 10 - g*dt^2*sum(1..=120)
    assert!((body.linear_velocity().y + 20.0).abs() < 0.1);
    let expected_y = 10.0 - 10.0 * DT * DT * (120.0 * 121.0 / 2.0);
    assert!((body.position().y - expected_y).abs() < 0.1);
    assert!(body.linear_velocity().x.abs() < 1e-4);
}

#[test]
fn test_static_bodies_never_move() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let floor = space.add_body(floor_body());

    let mut falling = RigidBody::new_dynamic(Vec2::new(0.0, 3.0));
    falling.add_shape(unit_box());
    space.add_body(falling);

    let before_p = space.get_body(floor).unwrap().position();
    let before_a = space.get_body(floor).unwrap().angle();

    for _ in 0..240 {
        space.step(DT, 8, 3, true, true);
    }

    let body = space.get_body(floor).unwrap();
    assert_eq!(body.position(), before_p);
    assert_eq!(body.angle(), before_a);
    assert_eq!(body.linear_velocity(), Vec2::zero());
    assert_eq!(body.angular_velocity(), 0.0);
}

#[test]
fn test_damping_decay() {
    let mut space = Space::new();
    space.set_gravity(Vec2::zero());
    space.config_mut().damping = 0.5;

    let mut body = RigidBody::new_dynamic(Vec2::zero());
    body.add_shape(unit_box());
    body.set_linear_velocity(Vec2::new(3.0, 4.0));
    body.set_angular_velocity(2.0);
    let handle = space.add_body(body);

    space.step(DT, 8, 3, true, false);

    let factor = 0.5_f32.powf(DT);
    let body = space.get_body(handle).unwrap();
    assert!((body.linear_velocity().x - 3.0 * factor).abs() < 1e-4);
    assert!((body.linear_velocity().y - 4.0 * factor).abs() < 1e-4);
    assert!((body.angular_velocity() - 2.0 * factor).abs() < 1e-4);
}

#[test]
fn test_resting_stack_sleeps() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    space.add_body(floor_body());

    let mut bottom = RigidBody::new_dynamic(Vec2::new(0.0, 0.5));
    bottom.add_shape(unit_box());
    let bottom = space.add_body(bottom);

    let mut top = RigidBody::new_dynamic(Vec2::new(0.0, 1.5));
    top.add_shape(unit_box());
    let top = space.add_body(top);

    let mut slept_at = None;
    for step in 1..=300 {
        space.step(DT, 8, 3, true, true);
        let asleep = !space.get_body(bottom).unwrap().is_awake()
            && !space.get_body(top).unwrap().is_awake();
        if asleep && slept_at.is_none() {
            slept_at = Some(step);
        }
    }

    let slept_at = slept_at.expect("stack never fell asleep");
    assert!(slept_at <= 120, "slept too late: step {}", slept_at);

    let bottom_y = space.get_body(bottom).unwrap().position().y;
    let top_y = space.get_body(top).unwrap().position().y;
    assert!((top_y - bottom_y - 1.0).abs() < 0.05);
    assert!((bottom_y - 0.5).abs() < 0.05);

    // Sleep was reported through the event queue
    let slept_events = space
        .events()
        .iter()
        .filter(|e| matches!(e, WorldEvent::BodySlept(_)))
        .count();
    assert!(slept_events >= 2);
}

#[test]
fn test_waking_resets_sleep() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    space.add_body(floor_body());

    let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 0.5));
    body.add_shape(unit_box());
    let handle = space.add_body(body);

    for _ in 0..180 {
        space.step(DT, 8, 3, true, true);
    }
    assert!(!space.get_body(handle).unwrap().is_awake());

    space
        .get_body_mut(handle)
        .unwrap()
        .apply_impulse(Vec2::new(2.0, 0.0));
    assert!(space.get_body(handle).unwrap().is_awake());
}

#[test]
fn test_manifold_persistence_warm_starts() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    space.add_body(floor_body());

    let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 0.5));
    body.add_shape(unit_box());
    space.add_body(body);

    // Sleep disabled so the manifold stays live
    for _ in 0..100 {
        space.step(DT, 8, 3, true, false);
    }
    let impulse_a: f32 = space
        .contact_solvers()
        .flat_map(|s| s.contacts())
        .map(|c| c.normal_impulse())
        .sum();

    space.step(DT, 8, 3, true, false);
    let impulse_b: f32 = space
        .contact_solvers()
        .flat_map(|s| s.contacts())
        .map(|c| c.normal_impulse())
        .sum();

    // The resting box weighs m*g*dt per step; the carried-over accumulators
    // should be supporting it and barely change between steps
    assert!(impulse_a > 0.0);
    assert!((impulse_a - impulse_b).abs() < 0.5 * impulse_a.max(impulse_b));
}

#[test]
fn test_friction_cone_clamp() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    space.add_body(floor_body());

    let mut body = RigidBody::new_dynamic(Vec2::new(-5.0, 0.5));
    body.add_shape(unit_box());
    body.set_linear_velocity(Vec2::new(4.0, 0.0));
    let handle = space.add_body(body);

    for _ in 0..120 {
        space.step(DT, 8, 3, true, false);
        for solver in space.contact_solvers() {
            for contact in solver.contacts() {
                assert!(
                    contact.tangent_impulse().abs()
                        <= solver.friction() * contact.normal_impulse() + 1e-4
                );
            }
        }
    }

    // Friction must have slowed the slide
    let vx = space.get_body(handle).unwrap().linear_velocity().x;
    assert!(vx < 4.0);
}

#[test]
fn test_non_penetration_after_position_solve() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    space.add_body(floor_body());

    // Drop a box from above so it lands with some speed
    let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 2.0));
    body.add_shape(unit_box());
    space.add_body(body);

    // A manifold's depth is measured at the top of the step, so it reflects
    // the previous step's position solve
    let slop = space.config().linear_slop;
    let mut prev_settled = false;
    for _ in 0..240 {
        space.step(DT, 8, 3, true, false);
        if prev_settled {
            for solver in space.contact_solvers() {
                for contact in solver.contacts() {
                    assert!(contact.depth >= -3.0 * slop - 1e-3);
                }
            }
        }
        // Only steps whose manifolds were already solved bind the next
        // step's measured penetration
        prev_settled = space.stats().position_solved && space.stats().contacts > 0;
    }
}

#[test]
fn test_warm_start_advantage() {
    fn run_pyramid(warm_starting: bool) -> (u32, f32) {
        let mut space = Space::new();
        space.set_gravity(Vec2::new(0.0, -10.0));
        space.add_body(floor_body());

        // 4-3-2-1 pyramid
        let mut top_handle = None;
        for row in 0..4 {
            let count = 4 - row;
            let y = 0.5 + row as f32 * 1.0;
            for i in 0..count {
                let x = (i as f32 - (count - 1) as f32 / 2.0) * 1.05;
                let mut body = RigidBody::new_dynamic(Vec2::new(x, y));
                body.add_shape(unit_box());
                top_handle = Some(space.add_body(body));
            }
        }
        let top_handle = top_handle.unwrap();

        let mut iterations = 0;
        for step in 0..150 {
            space.step(DT, 8, 3, warm_starting, false);
            if step >= 50 {
                iterations += space.stats().position_iterations;
            }
        }
        (iterations, space.get_body(top_handle).unwrap().position().y)
    }

    let (warm_iterations, warm_top_y) = run_pyramid(true);
    let (cold_iterations, _) = run_pyramid(false);

    assert!(warm_iterations <= cold_iterations);
    // The pyramid must still be standing
    assert!(warm_top_y > 2.5);
}

#[test]
fn test_kinematic_body_ignores_gravity() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let mut body = RigidBody::new_kinematic(Vec2::zero());
    body.add_shape(unit_box());
    body.set_linear_velocity(Vec2::new(1.0, 0.0));
    let handle = space.add_body(body);

    for _ in 0..60 {
        space.step(DT, 8, 3, true, false);
    }

    let body = space.get_body(handle).unwrap();
    assert!((body.position().x - 1.0).abs() < 1e-3);
    assert!(body.position().y.abs() < 1e-4);
    assert_eq!(body.linear_velocity(), Vec2::new(1.0, 0.0));
}

#[test]
fn test_zero_dt_step_is_harmless() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 1.0));
    body.add_shape(unit_box());
    let handle = space.add_body(body);

    space.step(0.0, 8, 3, true, true);

    let body = space.get_body(handle).unwrap();
    assert!(body.position().x.is_finite());
    assert!(body.position().y.is_finite());
    assert!(body.linear_velocity().y.is_finite());
}

#[test]
fn test_post_solve_hook_sees_manifolds() {
    use std::cell::Cell;
    use std::rc::Rc;

    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    space.add_body(floor_body());

    let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 0.5));
    body.add_shape(unit_box());
    space.add_body(body);

    let seen = Rc::new(Cell::new(0usize));
    let seen_hook = Rc::clone(&seen);
    space.set_post_solve(move |solver| {
        assert!(!solver.contacts().is_empty());
        seen_hook.set(seen_hook.get() + 1);
    });

    for _ in 0..10 {
        space.step(DT, 8, 3, true, false);
    }
    assert!(seen.get() >= 10);
}

#[test]
fn test_step_stats_populated() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    space.add_body(floor_body());

    let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 0.5));
    body.add_shape(unit_box());
    space.add_body(body);

    space.step(DT, 8, 3, true, false);

    let stats = space.stats();
    assert_eq!(stats.bodies, 2);
    assert_eq!(stats.joints, 0);
    assert!(stats.contacts > 0);
    assert!(stats.position_iterations >= 1);
}

#[test]
fn test_remove_body_drops_manifolds() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));
    space.add_body(floor_body());

    let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 0.5));
    body.add_shape(unit_box());
    let handle = space.add_body(body);

    space.step(DT, 8, 3, true, false);
    assert!(space.contact_solvers().count() > 0);

    space.remove_body(handle).unwrap();
    assert_eq!(space.contact_solvers().count(), 0);
    assert_eq!(space.body_count(), 1);

    space.step(DT, 8, 3, true, false);
    assert_eq!(space.contact_solvers().count(), 0);
}
