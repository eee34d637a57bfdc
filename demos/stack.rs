//! Drops a small stack of boxes onto a floor and prints how it settles.
//!
//! Run with: cargo run --example stack

use impulse2d::math::Vec2;
use impulse2d::shapes::{Poly, Shape, ShapeData};
use impulse2d::{RigidBody, Space};

fn main() {
    let mut space = Space::new();
    space.set_gravity(Vec2::new(0.0, -10.0));

    let mut floor = RigidBody::new_static(Vec2::new(0.0, -0.5));
    floor.add_shape(Shape::new(ShapeData::Poly(Poly::new_box(
        Vec2::zero(),
        20.0,
        0.5,
    ))));
    space.add_body(floor);

    let mut boxes = Vec::new();
    for i in 0..5 {
        let mut body = RigidBody::new_dynamic(Vec2::new(0.0, 0.6 + i as f32 * 1.1));
        body.add_shape(Shape::new(ShapeData::Poly(Poly::new_box(
            Vec2::zero(),
            0.5,
            0.5,
        ))));
        boxes.push(space.add_body(body));
    }

    let dt = 1.0 / 60.0;
    for step in 1..=300 {
        space.step(dt, 8, 3, true, true);

        if step % 60 == 0 {
            let stats = space.stats();
            println!(
                "t = {:.1}s  contacts: {:2}  position iters: {}  solved: {}",
                step as f32 * dt,
                stats.contacts,
                stats.position_iterations,
                stats.position_solved,
            );
            for (i, handle) in boxes.iter().enumerate() {
                let body = space.get_body(*handle).unwrap();
                println!(
                    "  box {}: y = {:6.3}  awake = {}",
                    i,
                    body.position().y,
                    body.is_awake()
                );
            }
        }
    }
}
