use crate::bodies::RigidBody;
use crate::constraints::joint::{anchor_arm, fresh_arm, world_anchor};
use crate::constraints::{Joint, JointCore, LimitState};
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::math::{clamp, Vec2, EPSILON};
use crate::scene::JointDef;
use std::any::Any;

/// A rope joint caps the distance between two anchor points:
/// `C = |p2 + r2 - p1 - r1| - L <= 0`.
///
/// The impulse is one-sided (accumulator clamped at zero from above), so a
/// slack rope applies nothing; when slack, a soft velocity bias of `C / dt`
/// draws the solve toward the limit instead of snapping at it.
pub struct RopeJoint {
    core: JointCore,

    /// Anchor on body1, in its origin frame
    anchor1: Vec2,

    /// Anchor on body2, in its origin frame
    anchor2: Vec2,

    /// Maximum anchor separation
    max_length: f32,

    // Solver cache, valid between init and the end of the step
    r1: Vec2,
    r2: Vec2,
    u: Vec2,
    s1: f32,
    s2: f32,
    em: f32,
    cdt: f32,
    lambda_acc: f32,
    state: LimitState,
}

impl RopeJoint {
    /// Creates a rope joint between two body-local anchor points
    pub fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        anchor1: Vec2,
        anchor2: Vec2,
        max_length: f32,
    ) -> Self {
        Self {
            core: JointCore::new(body1, body2),
            anchor1,
            anchor2,
            max_length: max_length.max(0.0),
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            u: Vec2::zero(),
            s1: 0.0,
            s2: 0.0,
            em: 0.0,
            cdt: 0.0,
            lambda_acc: 0.0,
            state: LimitState::Inactive,
        }
    }

    /// Returns the maximum anchor separation
    pub fn max_length(&self) -> f32 {
        self.max_length
    }

    /// Sets the maximum anchor separation
    pub fn set_max_length(&mut self, max_length: f32) {
        self.max_length = max_length.max(0.0);
    }

    /// Returns the current limit state
    pub fn limit_state(&self) -> LimitState {
        self.state
    }

    /// Marks the joint breakable above the given reaction force
    pub fn set_breakable(&mut self, max_force: f32) {
        self.core.breakable = true;
        self.core.max_force = max_force;
    }
}

impl Joint for RopeJoint {
    fn joint_type(&self) -> &'static str {
        "RopeJoint"
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
        let c = dist - self.max_length;

        if c > 0.0 {
            self.state = LimitState::AtUpper;
            self.cdt = 0.0;
        } else {
            self.state = LimitState::Inactive;
            self.cdt = if dt > EPSILON { c / dt } else { 0.0 };
        }

        // Degenerate direction below the slop radius
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
        self.em = if em_inv > 0.0 { 1.0 / em_inv } else { 0.0 };

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
        let lambda = -self.em * (cdot + self.cdt);

        // The rope only ever pulls: accumulator clamped at zero from above
        let old = self.lambda_acc;
        self.lambda_acc = (old + lambda).min(0.0);
        let lambda = self.lambda_acc - old;

        let impulse = self.u * lambda;
        b1.apply_solver_impulse(-impulse, self.r1);
        b2.apply_solver_impulse(impulse, self.r2);
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
        let dist = d.length();
        let u = if dist > config.linear_slop {
            d / dist
        } else {
            Vec2::zero()
        };

        let c = dist - self.max_length;
        let correction = clamp(c, 0.0, config.max_linear_correction);
        if correction > 0.0 {
            let s1 = r1.cross(&u);
            let s2 = r2.cross(&u);
            let em_inv = b1.inv_mass
                + b2.inv_mass
                + b1.inv_inertia * s1 * s1
                + b2.inv_inertia * s2 * s2;
            if em_inv > 0.0 {
                let lambda = -correction / em_inv;
                let impulse = u * lambda;
                b1.position -= impulse * b1.inv_mass;
                b1.angle -= s1 * lambda * b1.inv_inertia;
                b2.position += impulse * b2.inv_mass;
                b2.angle += s2 * lambda * b2.inv_inertia;
            }
        }

        c <= config.linear_slop
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
        JointDef::RopeJoint {
            body1,
            body2,
            anchor1: self.anchor1,
            anchor2: self.anchor2,
            max_length: self.max_length,
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
