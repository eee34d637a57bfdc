use crate::bodies::RigidBody;
use crate::core::{BodyHandle, BodyStorage, SimulationConfig, Storage};
use crate::math::Vec2;
use crate::scene::JointDef;
use std::any::Any;

/// Classification of a joint's current relationship to its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitState {
    /// No limit engaged
    Inactive,

    /// Held at the lower bound
    AtLower,

    /// Held at the upper bound
    AtUpper,

    /// Both bounds coincide; the constraint is an equality
    Equal,
}

/// Fields shared by every joint kind
#[derive(Debug, Clone, Copy)]
pub struct JointCore {
    /// The first connected body
    pub body1: BodyHandle,

    /// The second connected body
    pub body2: BodyHandle,

    /// Whether the connected bodies may still collide with each other
    pub collide_connected: bool,

    /// Reaction force magnitude above which a breakable joint snaps
    pub max_force: f32,

    /// Whether the joint is removed when `max_force` is exceeded
    pub breakable: bool,
}

impl JointCore {
    pub fn new(body1: BodyHandle, body2: BodyHandle) -> Self {
        Self {
            body1,
            body2,
            collide_connected: false,
            max_force: f32::MAX,
            breakable: false,
        }
    }
}

/// Base trait for joints between two rigid bodies.
///
/// A joint is initialized once per step, participates in every velocity
/// iteration, and reports from its position solve whether its positional
/// error is below tolerance.
pub trait Joint: Send + Sync + 'static {
    /// Returns the type name of the joint
    fn joint_type(&self) -> &'static str;

    /// Returns the shared joint fields
    fn joint_core(&self) -> &JointCore;

    /// Returns mutable access to the shared joint fields
    fn joint_core_mut(&mut self) -> &mut JointCore;

    /// The first connected body
    fn body1(&self) -> BodyHandle {
        self.joint_core().body1
    }

    /// The second connected body
    fn body2(&self) -> BodyHandle {
        self.joint_core().body2
    }

    /// Checks if the joint involves a specific body
    fn involves_body(&self, body: BodyHandle) -> bool {
        self.body1() == body || self.body2() == body
    }

    /// Whether the connected bodies may collide with each other
    fn collide_connected(&self) -> bool {
        self.joint_core().collide_connected
    }

    /// Whether the joint breaks when its reaction exceeds `max_force`
    fn is_breakable(&self) -> bool {
        self.joint_core().breakable
    }

    /// The reaction force magnitude above which a breakable joint snaps
    fn max_force(&self) -> f32 {
        self.joint_core().max_force
    }

    /// Computes Jacobian arms and effective masses for this step, and
    /// applies (or clears) the accumulated impulses per the warm start flag
    fn init_solver(
        &mut self,
        bodies: &mut BodyStorage<RigidBody>,
        config: &SimulationConfig,
        dt: f32,
        warm_starting: bool,
    );

    /// One Gauss-Seidel velocity iteration
    fn solve_velocity(&mut self, bodies: &mut BodyStorage<RigidBody>);

    /// One position-correction iteration; true when below tolerance
    fn solve_position(&mut self, bodies: &mut BodyStorage<RigidBody>, config: &SimulationConfig)
        -> bool;

    /// World anchor on the first body
    fn anchor1(&self, bodies: &BodyStorage<RigidBody>) -> Vec2;

    /// World anchor on the second body
    fn anchor2(&self, bodies: &BodyStorage<RigidBody>) -> Vec2;

    /// Reaction force applied to the second body, in newtons
    fn reaction_force(&self, inv_dt: f32) -> Vec2;

    /// Reaction torque applied to the second body
    fn reaction_torque(&self, inv_dt: f32) -> f32;

    /// Serializes the joint with the scene indices of its bodies
    fn to_def(&self, body1: usize, body2: usize) -> JointDef;

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Returns a dynamic mutable reference to any for downcasting
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// World anchor for a body-local anchor point
pub(crate) fn world_anchor(bodies: &BodyStorage<RigidBody>, handle: BodyHandle, local: Vec2) -> Vec2 {
    bodies
        .get(handle)
        .map_or(Vec2::zero(), |b| b.origin() + b.rot.rotate(local))
}

/// Jacobian arm from a body's centroid to a body-local anchor point
#[inline]
pub(crate) fn anchor_arm(body: &RigidBody, local: Vec2) -> Vec2 {
    body.rot.rotate(local - body.centroid)
}

/// Same as `anchor_arm`, but from the live angle rather than the cached
/// rotation; position solving mutates angles between transform syncs
#[inline]
pub(crate) fn fresh_arm(body: &RigidBody, local: Vec2) -> Vec2 {
    crate::math::Rot2::new(body.angle).rotate(local - body.centroid)
}
