use crate::bodies::RigidBody;
use crate::constraints::joint::{anchor_arm, fresh_arm, world_anchor};
use crate::constraints::{Joint, JointCore};
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::math::{clamp, Vec2};
use crate::scene::JointDef;
use std::any::Any;

/// A distance joint holds two anchor points at a rest length:
/// `C = |p2 + r2 - p1 - r1| - rest_length`.
///
/// With `frequency_hz > 0` the joint becomes a damped spring using the
/// soft-constraint gamma/beta formulation; soft springs skip the position
/// solver entirely.
pub struct DistanceJoint {
    core: JointCore,
    anchor1: Vec2,
    anchor2: Vec2,
    rest_length: f32,

    /// Spring frequency in hertz; zero means rigid
    frequency_hz: f32,

    /// Spring damping ratio (1 = critically damped)
    damping_ratio: f32,

    // Solver cache
    r1: Vec2,
    r2: Vec2,
    u: Vec2,
    s1: f32,
    s2: f32,
    em: f32,
    gamma: f32,
    cdt: f32,
    lambda_acc: f32,
}

impl DistanceJoint {
    /// Creates a rigid distance joint between two body-local anchor points
    pub fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        anchor1: Vec2,
        anchor2: Vec2,
        rest_length: f32,
    ) -> Self {
        Self {
            core: JointCore::new(body1, body2),
            anchor1,
            anchor2,
            rest_length: rest_length.max(0.0),
            frequency_hz: 0.0,
            damping_ratio: 0.0,
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            u: Vec2::zero(),
            s1: 0.0,
            s2: 0.0,
            em: 0.0,
            gamma: 0.0,
            cdt: 0.0,
            lambda_acc: 0.0,
        }
    }

    /// Turns the joint into a damped spring
    pub fn set_spring(&mut self, frequency_hz: f32, damping_ratio: f32) {
        self.frequency_hz = frequency_hz.max(0.0);
        self.damping_ratio = damping_ratio.max(0.0);
    }

    /// Returns the rest length
    pub fn rest_length(&self) -> f32 {
        self.rest_length
    }

    /// Sets the rest length
    pub fn set_rest_length(&mut self, rest_length: f32) {
        self.rest_length = rest_length.max(0.0);
    }

    /// Returns the spring frequency in hertz (zero when rigid)
    pub fn frequency(&self) -> f32 {
        self.frequency_hz
    }

    /// Marks the joint breakable above the given reaction force
    pub fn set_breakable(&mut self, max_force: f32) {
        self.core.breakable = true;
        self.core.max_force = max_force;
    }
}

impl Joint for DistanceJoint {
    fn joint_type(&self) -> &'static str {
        "DistanceJoint"
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
        config: &SimulationConfig,
        dt: f32,
        warm_starting: bool,
    ) {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        self.r1 = anchor_arm(b1, self.anchor1);
        self.r2 = anchor_arm(b2, self.anchor2);

        let d = (b2.position + self.r2) - (b1.position + self.r1);
        let dist = d.length();
        self.u = if dist > config.linear_slop {
            d / dist
        } else {
            Vec2::zero()
        };

        self.s1 = self.r1.cross(&self.u);
        self.s2 = self.r2.cross(&self.u);
        let em_inv = b1.inv_mass
            + b2.inv_mass
            + b1.inv_inertia * self.s1 * self.s1
            + b2.inv_inertia * self.s2 * self.s2;

        if self.frequency_hz > 0.0 && em_inv > 0.0 {
            let c = dist - self.rest_length;
            let em = 1.0 / em_inv;
            let omega = 2.0 * std::f32::consts::PI * self.frequency_hz;
            let stiffness = em * omega * omega;
            let damping = 2.0 * em * self.damping_ratio * omega;

            let gamma = dt * (damping + dt * stiffness);
            self.gamma = if gamma > 0.0 { 1.0 / gamma } else { 0.0 };
            self.cdt = c * dt * stiffness * self.gamma;

            let soft_inv = em_inv + self.gamma;
            self.em = if soft_inv > 0.0 { 1.0 / soft_inv } else { 0.0 };
        } else {
            self.gamma = 0.0;
            self.cdt = 0.0;
            self.em = if em_inv > 0.0 { 1.0 / em_inv } else { 0.0 };
        }

        if warm_starting {
            let impulse = self.u * self.lambda_acc;
            b1.apply_solver_impulse(-impulse, self.r1);
            b2.apply_solver_impulse(impulse, self.r2);
        } else {
            self.lambda_acc = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        let cdot = self
            .u
            .dot(&(b2.velocity_at(self.r2) - b1.velocity_at(self.r1)));
        let lambda = -self.em * (cdot + self.cdt + self.gamma * self.lambda_acc);
        self.lambda_acc += lambda;

        let impulse = self.u * lambda;
        b1.apply_solver_impulse(-impulse, self.r1);
        b2.apply_solver_impulse(impulse, self.r2);
    }

    fn solve_position(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        config: &SimulationConfig,
    ) -> bool {
        // Springs resolve at the velocity level only
        if self.frequency_hz > 0.0 {
            return true;
        }

        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return true;
        };

        let r1 = fresh_arm(b1, self.anchor1);
        let r2 = fresh_arm(b2, self.anchor2);
        let d = (b2.position + r2) - (b1.position + r1);
        let dist = d.length();
        let u = if dist > config.linear_slop {
            d / dist
        } else {
            Vec2::zero()
        };

        let c = dist - self.rest_length;
        let correction = clamp(
            c,
            -config.max_linear_correction,
            config.max_linear_correction,
        );

        let s1 = r1.cross(&u);
        let s2 = r2.cross(&u);
        let em_inv = b1.inv_mass
            + b2.inv_mass
            + b1.inv_inertia * s1 * s1
            + b2.inv_inertia * s2 * s2;
        if em_inv > 0.0 && correction != 0.0 {
            let lambda = -correction / em_inv;
            let impulse = u * lambda;
            b1.position -= impulse * b1.inv_mass;
            b1.angle -= s1 * lambda * b1.inv_inertia;
            b2.position += impulse * b2.inv_mass;
            b2.angle += s2 * lambda * b2.inv_inertia;
        }

        c.abs() <= config.linear_slop
    }

    fn anchor1(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body1, self.anchor1)
    }

    fn anchor2(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body2, self.anchor2)
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.u * (self.lambda_acc * inv_dt)
    }

    fn reaction_torque(&self, _inv_dt: f32) -> f32 {
        0.0
    }

    fn to_def(&self, body1: usize, body2: usize) -> JointDef {
        JointDef::DistanceJoint {
            body1,
            body2,
            anchor1: self.anchor1,
            anchor2: self.anchor2,
            rest_length: self.rest_length,
            frequency_hz: self.frequency_hz,
            damping_ratio: self.damping_ratio,
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
