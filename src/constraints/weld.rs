use crate::bodies::RigidBody;
use crate::constraints::joint::{anchor_arm, fresh_arm, world_anchor};
use crate::constraints::{Joint, JointCore};
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::math::{Mat3, Vec2};
use crate::scene::JointDef;
use std::any::Any;

/// A weld joint locks two bodies together: the anchor points coincide and
/// the relative angle is fixed. Three constraint rows solved as one block
/// with a Mat3 effective mass.
pub struct WeldJoint {
    core: JointCore,
    anchor1: Vec2,
    anchor2: Vec2,
    ref_angle: f32,

    // Solver cache
    r1: Vec2,
    r2: Vec2,
    k: Mat3,
    lambda_acc: [f32; 3],
}

impl WeldJoint {
    /// Creates a weld joint between two body-local anchor points
    pub fn new(body1: BodyHandle, body2: BodyHandle, anchor1: Vec2, anchor2: Vec2) -> Self {
        Self {
            core: JointCore::new(body1, body2),
            anchor1,
            anchor2,
            ref_angle: 0.0,
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            k: Mat3::zero(),
            lambda_acc: [0.0; 3],
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

fn weld_mass_matrix(b1: &RigidBody, b2: &RigidBody, r1: Vec2, r2: Vec2) -> Mat3 {
    let m = b1.inv_mass + b2.inv_mass;
    let i1 = b1.inv_inertia;
    let i2 = b2.inv_inertia;
    Mat3::new([
        [
            m + i1 * r1.y * r1.y + i2 * r2.y * r2.y,
            -i1 * r1.x * r1.y - i2 * r2.x * r2.y,
            -i1 * r1.y - i2 * r2.y,
        ],
        [
            -i1 * r1.x * r1.y - i2 * r2.x * r2.y,
            m + i1 * r1.x * r1.x + i2 * r2.x * r2.x,
            i1 * r1.x + i2 * r2.x,
        ],
        [
            -i1 * r1.y - i2 * r2.y,
            i1 * r1.x + i2 * r2.x,
            i1 + i2,
        ],
    ])
}

impl Joint for WeldJoint {
    fn joint_type(&self) -> &'static str {
        "WeldJoint"
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
        self.k = weld_mass_matrix(b1, b2, self.r1, self.r2);

        if warm_starting {
            let impulse = Vec2::new(self.lambda_acc[0], self.lambda_acc[1]);
            let angular = self.lambda_acc[2];
            b1.linear_velocity -= impulse * b1.inv_mass;
            b1.angular_velocity -= b1.inv_inertia * (self.r1.cross(&impulse) + angular);
            b2.linear_velocity += impulse * b2.inv_mass;
            b2.angular_velocity += b2.inv_inertia * (self.r2.cross(&impulse) + angular);
        } else {
            self.lambda_acc = [0.0; 3];
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        let cdot = b2.velocity_at(self.r2) - b1.velocity_at(self.r1);
        let cdot_angular = b2.angular_velocity - b1.angular_velocity;

        let lambda = self.k.solve([-cdot.x, -cdot.y, -cdot_angular]);
        self.lambda_acc[0] += lambda[0];
        self.lambda_acc[1] += lambda[1];
        self.lambda_acc[2] += lambda[2];

        let impulse = Vec2::new(lambda[0], lambda[1]);
        b1.linear_velocity -= impulse * b1.inv_mass;
        b1.angular_velocity -= b1.inv_inertia * (self.r1.cross(&impulse) + lambda[2]);
        b2.linear_velocity += impulse * b2.inv_mass;
        b2.angular_velocity += b2.inv_inertia * (self.r2.cross(&impulse) + lambda[2]);
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
        let c = (b2.position + r2) - (b1.position + r1);
        let c_angular = b2.angle - b1.angle - self.ref_angle;

        let k = weld_mass_matrix(b1, b2, r1, r2);
        let lambda = k.solve([-c.x, -c.y, -c_angular]);

        let impulse = Vec2::new(lambda[0], lambda[1]);
        b1.position -= impulse * b1.inv_mass;
        b1.angle -= b1.inv_inertia * (r1.cross(&impulse) + lambda[2]);
        b2.position += impulse * b2.inv_mass;
        b2.angle += b2.inv_inertia * (r2.cross(&impulse) + lambda[2]);

        c.length() <= 3.0 * config.linear_slop && c_angular.abs() <= config.angular_slop
    }

    fn anchor1(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body1, self.anchor1)
    }

    fn anchor2(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body2, self.anchor2)
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        Vec2::new(self.lambda_acc[0], self.lambda_acc[1]) * inv_dt
    }

    fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.lambda_acc[2] * inv_dt
    }

    fn to_def(&self, body1: usize, body2: usize) -> JointDef {
        JointDef::WeldJoint {
            body1,
            body2,
            anchor1: self.anchor1,
            anchor2: self.anchor2,
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
