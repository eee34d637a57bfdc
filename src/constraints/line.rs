use crate::bodies::RigidBody;
use crate::constraints::joint::{anchor_arm, fresh_arm, world_anchor};
use crate::constraints::{Joint, JointCore};
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::math::{clamp, Rot2, Vec2};
use crate::scene::JointDef;
use std::any::Any;

/// A line joint keeps body2's anchor on a line fixed in body1's frame while
/// leaving both translation along the line and rotation free. One row:
/// `C = dot(perp, p2 + r2 - p1 - r1)`.
pub struct LineJoint {
    core: JointCore,
    anchor1: Vec2,
    anchor2: Vec2,

    /// Line direction in body1's origin frame, unit length
    local_axis: Vec2,

    // Solver cache
    r1: Vec2,
    r2: Vec2,
    perp: Vec2,
    s1: f32,
    s2: f32,
    em: f32,
    lambda_acc: f32,
}

impl LineJoint {
    /// Creates a line joint along `local_axis` (body1 frame)
    pub fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        anchor1: Vec2,
        anchor2: Vec2,
        local_axis: Vec2,
    ) -> Self {
        Self {
            core: JointCore::new(body1, body2),
            anchor1,
            anchor2,
            local_axis: local_axis.normalize(),
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            perp: Vec2::zero(),
            s1: 0.0,
            s2: 0.0,
            em: 0.0,
            lambda_acc: 0.0,
        }
    }

    /// Marks the joint breakable above the given reaction force
    pub fn set_breakable(&mut self, max_force: f32) {
        self.core.breakable = true;
        self.core.max_force = max_force;
    }
}

impl Joint for LineJoint {
    fn joint_type(&self) -> &'static str {
        "LineJoint"
    }

    fn joint_core(&self) -> &JointCore {
        &self.core
    }

    fn joint_core_mut(&mut self) -> &mut JointCore {
        &mut self.core
    }

    fn init_solver(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        _config: &SimulationConfig,
        _dt: f32,
        warm_starting: bool,
    ) {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        self.r1 = anchor_arm(b1, self.anchor1);
        self.r2 = anchor_arm(b2, self.anchor2);
        let d = (b2.position + self.r2) - (b1.position + self.r1);

        self.perp = b1.rot.rotate(self.local_axis).perpendicular();
        self.s1 = (d + self.r1).cross(&self.perp);
        self.s2 = self.r2.cross(&self.perp);

        let em_inv = b1.inv_mass
            + b2.inv_mass
            + b1.inv_inertia * self.s1 * self.s1
            + b2.inv_inertia * self.s2 * self.s2;
        self.em = if em_inv > 0.0 { 1.0 / em_inv } else { 0.0 };

        if warm_starting {
            let impulse = self.perp * self.lambda_acc;
            b1.linear_velocity -= impulse * b1.inv_mass;
            b1.angular_velocity -= b1.inv_inertia * self.s1 * self.lambda_acc;
            b2.linear_velocity += impulse * b2.inv_mass;
            b2.angular_velocity += b2.inv_inertia * self.s2 * self.lambda_acc;
        } else {
            self.lambda_acc = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        let cdot = self.perp.dot(&(b2.linear_velocity - b1.linear_velocity))
            + self.s2 * b2.angular_velocity
            - self.s1 * b1.angular_velocity;
        let lambda = -self.em * cdot;
        self.lambda_acc += lambda;

        let impulse = self.perp * lambda;
        b1.linear_velocity -= impulse * b1.inv_mass;
        b1.angular_velocity -= b1.inv_inertia * self.s1 * lambda;
        b2.linear_velocity += impulse * b2.inv_mass;
        b2.angular_velocity += b2.inv_inertia * self.s2 * lambda;
    }

    fn solve_position(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        config: &SimulationConfig,
    ) -> bool {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return true;
        };

        let r1 = fresh_arm(b1, self.anchor1);
        let r2 = fresh_arm(b2, self.anchor2);
        let d = (b2.position + r2) - (b1.position + r1);

        let perp = Rot2::new(b1.angle).rotate(self.local_axis).perpendicular();
        let s1 = (d + r1).cross(&perp);
        let s2 = r2.cross(&perp);

        let c = perp.dot(&d);
        let correction = clamp(
            c,
            -config.max_linear_correction,
            config.max_linear_correction,
        );

        let em_inv = b1.inv_mass
            + b2.inv_mass
            + b1.inv_inertia * s1 * s1
            + b2.inv_inertia * s2 * s2;
        if em_inv > 0.0 && correction != 0.0 {
            let lambda = -correction / em_inv;
            let impulse = perp * lambda;
            b1.position -= impulse * b1.inv_mass;
            b1.angle -= s1 * lambda * b1.inv_inertia;
            b2.position += impulse * b2.inv_mass;
            b2.angle += s2 * lambda * b2.inv_inertia;
        }

        c.abs() <= 3.0 * config.linear_slop
    }

    fn anchor1(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body1, self.anchor1)
    }

    fn anchor2(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body2, self.anchor2)
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.perp * (self.lambda_acc * inv_dt)
    }

    fn reaction_torque(&self, _inv_dt: f32) -> f32 {
        0.0
    }

    fn to_def(&self, body1: usize, body2: usize) -> JointDef {
        JointDef::LineJoint {
            body1,
            body2,
            anchor1: self.anchor1,
            anchor2: self.anchor2,
            axis: self.local_axis,
            collide_connected: self.core.collide_connected,
            max_force: self.core.max_force,
            breakable: self.core.breakable,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
