use crate::bodies::RigidBody;
use crate::constraints::joint::{anchor_arm, fresh_arm, world_anchor};
use crate::constraints::{Joint, JointCore, LimitState};
use crate::core::{BodyHandle, BodyStorage, SimulationConfig};
use crate::math::{clamp, Mat2, Vec2};
use crate::scene::JointDef;
use std::any::Any;

/// A revolute joint pins two anchor points together while leaving rotation
/// free: `C = p2 + r2 - p1 - r1 = 0` (two rows, Mat2 effective mass).
///
/// An optional motor drives the relative angular velocity with its impulse
/// clamped to `max_motor_torque * dt`, and optional limits bound the joint
/// angle with the usual limit-state clamping.
pub struct RevoluteJoint {
    core: JointCore,
    anchor1: Vec2,
    anchor2: Vec2,

    /// Joint angle is measured against this reference: a2 - a1 - ref_angle
    ref_angle: f32,

    motor_enabled: bool,
    motor_speed: f32,
    max_motor_torque: f32,

    limit_enabled: bool,
    lower: f32,
    upper: f32,

    // Solver cache
    r1: Vec2,
    r2: Vec2,
    k: Mat2,
    em_angular: f32,
    max_motor_impulse: f32,
    lambda_acc: Vec2,
    motor_acc: f32,
    limit_acc: f32,
    state: LimitState,
}

impl RevoluteJoint {
    /// Creates a revolute joint between two body-local anchor points
    pub fn new(body1: BodyHandle, body2: BodyHandle, anchor1: Vec2, anchor2: Vec2) -> Self {
        Self {
            core: JointCore::new(body1, body2),
            anchor1,
            anchor2,
            ref_angle: 0.0,
            motor_enabled: false,
            motor_speed: 0.0,
            max_motor_torque: 0.0,
            limit_enabled: false,
            lower: 0.0,
            upper: 0.0,
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            k: Mat2::zero(),
            em_angular: 0.0,
            max_motor_impulse: 0.0,
            lambda_acc: Vec2::zero(),
            motor_acc: 0.0,
            limit_acc: 0.0,
            state: LimitState::Inactive,
        }
    }

    /// Sets the reference relative angle the limits measure against
    pub fn set_ref_angle(&mut self, ref_angle: f32) {
        self.ref_angle = ref_angle;
    }

    /// Drives the relative angular velocity toward `speed`
    pub fn enable_motor(&mut self, speed: f32, max_torque: f32) {
        self.motor_enabled = true;
        self.motor_speed = speed;
        self.max_motor_torque = max_torque.max(0.0);
    }

    /// Stops driving the joint
    pub fn disable_motor(&mut self) {
        self.motor_enabled = false;
    }

    /// Bounds the joint angle
    pub fn set_limits(&mut self, lower: f32, upper: f32) {
        self.limit_enabled = true;
        self.lower = lower.min(upper);
        self.upper = upper.max(lower);
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

/// Effective mass matrix of the point-to-point rows
fn point_mass_matrix(b1: &RigidBody, b2: &RigidBody, r1: Vec2, r2: Vec2) -> Mat2 {
    let m = b1.inv_mass + b2.inv_mass;
    let i1 = b1.inv_inertia;
    let i2 = b2.inv_inertia;
    Mat2::new(
        m + i1 * r1.y * r1.y + i2 * r2.y * r2.y,
        -i1 * r1.x * r1.y - i2 * r2.x * r2.y,
        -i1 * r1.x * r1.y - i2 * r2.x * r2.y,
        m + i1 * r1.x * r1.x + i2 * r2.x * r2.x,
    )
}

impl Joint for RevoluteJoint {
    fn joint_type(&self) -> &'static str {
        "RevoluteJoint"
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
        self.k = point_mass_matrix(b1, b2, self.r1, self.r2);

        let em_inv = b1.inv_inertia + b2.inv_inertia;
        self.em_angular = if em_inv > 0.0 { 1.0 / em_inv } else { 0.0 };
        self.max_motor_impulse = self.max_motor_torque * dt;

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
                self.limit_acc = 0.0;
            }
            self.state = new_state;
        } else {
            self.state = LimitState::Inactive;
            self.limit_acc = 0.0;
        }

        if !self.motor_enabled {
            self.motor_acc = 0.0;
        }

        if warm_starting {
            b1.apply_solver_impulse(-self.lambda_acc, self.r1);
            b2.apply_solver_impulse(self.lambda_acc, self.r2);
            let angular = self.motor_acc + self.limit_acc;
            b1.angular_velocity -= b1.inv_inertia * angular;
            b2.angular_velocity += b2.inv_inertia * angular;
        } else {
            self.lambda_acc = Vec2::zero();
            self.motor_acc = 0.0;
            self.limit_acc = 0.0;
        }
    }

    fn solve_velocity(&mut self, bodies: &mut BodyStorage<RigidBody>) {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return;
        };

        // Motor row
        if self.motor_enabled && self.state != LimitState::Equal {
            let cdot = b2.angular_velocity - b1.angular_velocity - self.motor_speed;
            let lambda = -self.em_angular * cdot;
            let old = self.motor_acc;
            self.motor_acc = clamp(
                old + lambda,
                -self.max_motor_impulse,
                self.max_motor_impulse,
            );
            let lambda = self.motor_acc - old;
            b1.angular_velocity -= b1.inv_inertia * lambda;
            b2.angular_velocity += b2.inv_inertia * lambda;
        }

        // Limit row
        if self.limit_enabled && self.state != LimitState::Inactive {
            let cdot = b2.angular_velocity - b1.angular_velocity;
            let lambda = -self.em_angular * cdot;
            let old = self.limit_acc;
            self.limit_acc = match self.state {
                LimitState::AtLower => (old + lambda).max(0.0),
                LimitState::AtUpper => (old + lambda).min(0.0),
                _ => old + lambda,
            };
            let lambda = self.limit_acc - old;
            b1.angular_velocity -= b1.inv_inertia * lambda;
            b2.angular_velocity += b2.inv_inertia * lambda;
        }

        // Point rows
        let cdot = b2.velocity_at(self.r2) - b1.velocity_at(self.r1);
        let lambda = self.k.solve(-cdot);
        self.lambda_acc += lambda;
        b1.apply_solver_impulse(-lambda, self.r1);
        b2.apply_solver_impulse(lambda, self.r2);
    }

    fn solve_position(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        config: &SimulationConfig,
    ) -> bool {
        let Some((b1, b2)) = bodies.get_pair_mut(self.core.body1, self.core.body2) else {
            return true;
        };

        // Angular limit correction first
        let mut angular_error = 0.0;
        if self.limit_enabled && self.state != LimitState::Inactive {
            let c = b2.angle - b1.angle - self.ref_angle;
            let correction = match self.state {
                LimitState::Equal => clamp(
                    c - self.lower,
                    -config.max_angular_correction,
                    config.max_angular_correction,
                ),
                LimitState::AtLower => {
                    clamp(c - self.lower, -config.max_angular_correction, 0.0)
                }
                LimitState::AtUpper => clamp(c - self.upper, 0.0, config.max_angular_correction),
                LimitState::Inactive => 0.0,
            };
            angular_error = correction.abs();

            let em_inv = b1.inv_inertia + b2.inv_inertia;
            if em_inv > 0.0 && correction != 0.0 {
                let lambda = -correction / em_inv;
                b1.angle -= b1.inv_inertia * lambda;
                b2.angle += b2.inv_inertia * lambda;
            }
        }

        // Point correction
        let r1 = fresh_arm(b1, self.anchor1);
        let r2 = fresh_arm(b2, self.anchor2);
        let c = (b2.position + r2) - (b1.position + r1);
        let linear_error = c.length();

        let k = point_mass_matrix(b1, b2, r1, r2);
        let lambda = k.solve(-c);

        b1.position -= lambda * b1.inv_mass;
        b1.angle -= r1.cross(&lambda) * b1.inv_inertia;
        b2.position += lambda * b2.inv_mass;
        b2.angle += r2.cross(&lambda) * b2.inv_inertia;

        linear_error <= 3.0 * config.linear_slop && angular_error <= config.angular_slop
    }

    fn anchor1(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body1, self.anchor1)
    }

    fn anchor2(&self, bodies: &BodyStorage<RigidBody>) -> Vec2 {
        world_anchor(bodies, self.core.body2, self.anchor2)
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        self.lambda_acc * inv_dt
    }

    fn reaction_torque(&self, inv_dt: f32) -> f32 {
        (self.motor_acc + self.limit_acc) * inv_dt
    }

    fn to_def(&self, body1: usize, body2: usize) -> JointDef {
        JointDef::RevoluteJoint {
            body1,
            body2,
            anchor1: self.anchor1,
            anchor2: self.anchor2,
            ref_angle: self.ref_angle,
            enable_motor: self.motor_enabled,
            motor_speed: self.motor_speed,
            max_motor_torque: self.max_motor_torque,
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
