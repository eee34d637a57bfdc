use crate::bodies::RigidBody;
use crate::constraints::{Joint, JointCore, LimitState};
use crate::core::{BodyHandle, BodyStorage, SimulationConfig, Storage};
use crate::math::{clamp, Vec2};
use crate::scene::JointDef;
use std::any::Any;

/// An angle joint constrains the relative rotation of two bodies:
/// `C = a2 - a1 - ref_angle`.
///
/// Without limits it is a rigid angular lock. With limits the impulse is
/// clamped by the limit state (at the lower bound the accumulator stays
/// non-negative, at the upper bound non-positive; equal bounds solve as an
/// equality).
pub struct AngleJoint {
    core: JointCore,

    /// Target relative angle (b2.angle - b1.angle)
    ref_angle: f32,

    limit_enabled: bool,
    lower: f32,
    upper: f32,

    // Solver cache
    em: f32,
    lambda_acc: f32,
    state: LimitState,
}

impl AngleJoint {
    /// Creates a rigid angular lock at the given relative angle
    pub fn new(body1: BodyHandle, body2: BodyHandle, ref_angle: f32) -> Self {
        Self {
            core: JointCore::new(body1, body2),
            ref_angle,
            limit_enabled: false,
            lower: 0.0,
            upper: 0.0,
            em: 0.0,
            lambda_acc: 0.0,
            state: LimitState::Equal,
        }
    }

    /// Bounds the relative angle instead of locking it
    pub fn set_limits(&mut self, lower: f32, upper: f32) {
        self.limit_enabled = true;
        self.lower = lower.min(upper);
        self.upper = upper.max(lower);
    }

    /// Returns the current limit state
    pub fn limit_state(&self) -> LimitState {
        self.state
    }
}

impl Joint for AngleJoint {
    fn joint_type(&self) -> &'static str {
        "AngleJoint"
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
        _dt: f32,
        warm_starting: bool,
    ) {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        let em_inv = b1.inv_inertia + b2.inv_inertia;
        self.em = if em_inv > 0.0 { 1.0 / em_inv } else { 0.0 };

        if self.limit_enabled {
            let c = b2.angle - b1.angle - self.ref_angle;
            let new_state = if (self.upper - self.lower).abs() < 2.0 * config.angular_slop {
                LimitState::Equal
            } else if c <= self.lower {
                LimitState::AtLower
            } else if c >= self.upper {
                LimitState::AtUpper
            } else {
                LimitState::Inactive
            };
            if new_state != self.state {
                self.lambda_acc = 0.0;
            }
            self.state = new_state;
        } else {
            self.state = LimitState::Equal;
        }

        if warm_starting {
            b1.angular_velocity -= b1.inv_inertia * self.lambda_acc;
            b2.angular_velocity += b2.inv_inertia * self.lambda_acc;
        } else {
            self.lambda_acc = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        if self.state == LimitState::Inactive {
            return;
        }
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        let cdot = b2.angular_velocity - b1.angular_velocity;
        let lambda = -self.em * cdot;

        let old = self.lambda_acc;
        self.lambda_acc = match self.state {
            LimitState::AtLower => (old + lambda).max(0.0),
            LimitState::AtUpper => (old + lambda).min(0.0),
            _ => old + lambda,
        };
        let lambda = self.lambda_acc - old;

        b1.angular_velocity -= b1.inv_inertia * lambda;
        b2.angular_velocity += b2.inv_inertia * lambda;
    }

    fn solve_position(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        config: &SimulationConfig,
    ) -> bool {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return true;
        };

        let c = b2.angle - b1.angle - self.ref_angle;
        let correction = if !self.limit_enabled {
            clamp(
                c,
                -config.max_angular_correction,
                config.max_angular_correction,
            )
        } else if self.state == LimitState::Equal {
            clamp(
                c - self.lower,
                -config.max_angular_correction,
                config.max_angular_correction,
            )
        } else if c <= self.lower {
            clamp(c - self.lower, -config.max_angular_correction, 0.0)
        } else if c >= self.upper {
            clamp(c - self.upper, 0.0, config.max_angular_correction)
        } else {
            0.0
        };

        let em_inv = b1.inv_inertia + b2.inv_inertia;
        if em_inv > 0.0 && correction != 0.0 {
            let lambda = -correction / em_inv;
            b1.angle -= b1.inv_inertia * lambda;
            b2.angle += b2.inv_inertia * lambda;
        }

        correction.abs() <= config.angular_slop
    }

    fn anchor1(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        bodies
            .get(self.core.body1)
            .map_or(Vec2::zero(), |b| b.position())
    }

    fn anchor2(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        bodies
            .get(self.core.body2)
            .map_or(Vec2::zero(), |b| b.position())
    }

    fn reaction_force(&self, _inv_dt: f32) -> Vec2 {
        Vec2::zero()
    }

    fn reaction_torque(&self, inv_dt: f32) -> f32 {
        self.lambda_acc * inv_dt
    }

    fn to_def(&self, body1: usize, body2: usize) -> JointDef {
        JointDef::AngleJoint {
            body1,
            body2,
            ref_angle: self.ref_angle,
            enable_limit: self.limit_enabled,
            lower_angle: self.lower,
            upper_angle: self.upper,
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
