use crate::bodies::RigidBody;
use crate::constraints::joint::{anchor_arm, fresh_arm, world_anchor};
use crate::constraints::{Joint, JointCore};
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::math::{Mat2, Rot2, Vec2};
use crate::scene::JointDef;
use std::any::Any;

/// A prismatic joint allows translation along one axis only: it constrains
/// motion perpendicular to the axis and locks the relative angle. Two rows
/// (perpendicular offset, relative angle) with a Mat2 effective mass.
pub struct PrismaticJoint {
    core: JointCore,
    anchor1: Vec2,
    anchor2: Vec2,

    /// Slide axis in body1's origin frame, unit length
    local_axis: Vec2,

    ref_angle: f32,

    // Solver cache
    r1: Vec2,
    r2: Vec2,
    perp: Vec2,
    s1: f32,
    s2: f32,
    k: Mat2,
    lambda_acc: Vec2,
}

impl PrismaticJoint {
    /// Creates a prismatic joint sliding along `local_axis` (body1 frame)
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
            ref_angle: 0.0,
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            perp: Vec2::zero(),
            s1: 0.0,
            s2: 0.0,
            k: Mat2::zero(),
            lambda_acc: Vec2::zero(),
        }
    }

    /// Sets the locked relative angle (b2.angle - b1.angle)
    pub fn set_ref_angle(&mut self, ref_angle: f32) {
        self.ref_angle = ref_angle;
    }

    /// Marks the joint breakable above the given reaction force
    pub fn set_breakable(&mut self, max_force: f32) {
        self.core.breakable = true;
        self.core.max_force = max_force;
    }
}

impl Joint for PrismaticJoint {
    fn joint_type(&self) -> &'static str {
        "PrismaticJoint"
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

        let m = b1.inv_mass + b2.inv_mass;
        let i1 = b1.inv_inertia;
        let i2 = b2.inv_inertia;
        self.k = Mat2::new(
            m + i1 * self.s1 * self.s1 + i2 * self.s2 * self.s2,
            i1 * self.s1 + i2 * self.s2,
            i1 * self.s1 + i2 * self.s2,
            i1 + i2,
        );

        if warm_starting {
            let impulse = self.perp * self.lambda_acc.x;
            let l1 = self.s1 * self.lambda_acc.x + self.lambda_acc.y;
            let l2 = self.s2 * self.lambda_acc.x + self.lambda_acc.y;
            b1.linear_velocity -= impulse * b1.inv_mass;
            b1.angular_velocity -= i1 * l1;
            b2.linear_velocity += impulse * b2.inv_mass;
            b2.angular_velocity += i2 * l2;
        } else {
            self.lambda_acc = Vec2::zero();
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        let cdot1 = self.perp.dot(&(b2.linear_velocity - b1.linear_velocity))
            + self.s2 * b2.angular_velocity
            - self.s1 * b1.angular_velocity;
        let cdot2 = b2.angular_velocity - b1.angular_velocity;

        let lambda = self.k.solve(Vec2::new(-cdot1, -cdot2));
        self.lambda_acc += lambda;

        let impulse = self.perp * lambda.x;
        let l1 = self.s1 * lambda.x + lambda.y;
        let l2 = self.s2 * lambda.x + lambda.y;
        b1.linear_velocity -= impulse * b1.inv_mass;
        b1.angular_velocity -= b1.inv_inertia * l1;
        b2.linear_velocity += impulse * b2.inv_mass;
        b2.angular_velocity += b2.inv_inertia * l2;
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

        let c1 = perp.dot(&d);
        let c2 = b2.angle - b1.angle - self.ref_angle;

        let m = b1.inv_mass + b2.inv_mass;
        let i1 = b1.inv_inertia;
        let i2 = b2.inv_inertia;
        let k = Mat2::new(
            m + i1 * s1 * s1 + i2 * s2 * s2,
            i1 * s1 + i2 * s2,
            i1 * s1 + i2 * s2,
            i1 + i2,
        );
        let lambda = k.solve(Vec2::new(-c1, -c2));

        let impulse = perp * lambda.x;
        let l1 = s1 * lambda.x + lambda.y;
        let l2 = s2 * lambda.x + lambda.y;
        b1.position -= impulse * b1.inv_mass;
        b1.angle -= i1 * l1;
        b2.position += impulse * b2.inv_mass;
        b2.angle += i2 * l2;

        c1.abs() <= 3.0 * config.linear_slop && c2.abs() <= config.angular_slop
    }

    fn anchor1(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body1, self.anchor1)
    }

    fn anchor2(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body2, self.anchor2)
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.perp * (self.lambda_acc.x * inv_dt)
    }

    fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.lambda_acc.y * inv_dt
    }

    fn to_def(&self, body1: usize, body2: usize) -> JointDef {
        JointDef::PrismaticJoint {
            body1,
            body2,
            anchor1: self.anchor1,
            anchor2: self.anchor2,
            axis: self.local_axis,
            ref_angle: self.ref_angle,
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
