use crate::bodies::{body_flags::BodyFlags, RigidBodyType};
use crate::collision::FilterData;
use crate::core::JointHandle;
use crate::math::{Aabb, Rot2, Vec2};
use crate::shapes::Shape;

use std::collections::BTreeSet;

/// A rigid body for physics simulation.
///
/// `position` is the world position of the center of mass; shape geometry is
/// authored relative to the body origin, and the origin transform is
/// re-derived from the centroid by `sync_transform`.
pub struct RigidBody {
    /// The body's type (dynamic, kinematic, or static)
    body_type: RigidBodyType,

    /// World position of the center of mass
    pub(crate) position: Vec2,

    /// Rotation angle in radians
    pub(crate) angle: f32,

    /// Cached rotation of `angle`, refreshed by `sync_transform`
    pub(crate) rot: Rot2,

    /// Cached body-origin position, refreshed by `sync_transform`
    pub(crate) xf_origin: Vec2,

    /// Linear velocity of the center of mass
    pub(crate) linear_velocity: Vec2,

    /// Angular velocity in radians per second
    pub(crate) angular_velocity: f32,

    /// Force accumulator, cleared after each velocity integration
    force: Vec2,

    /// Torque accumulator, cleared after each velocity integration
    torque: f32,

    /// Mass and inverse mass (zero inverse means immovable)
    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,

    /// Moment of inertia about the centroid, and its inverse
    pub(crate) inertia: f32,
    pub(crate) inv_inertia: f32,

    /// Center of mass in the body-origin frame
    pub(crate) centroid: Vec2,

    /// Union of the world bounds of all shapes, refreshed by `cache_data`
    aabb: Aabb,

    /// Behavior flags
    flags: BodyFlags,

    /// How long the body has been below the sleep velocity tolerances
    pub(crate) sleeping_time: f32,

    /// Collision category and mask
    pub filter: FilterData,

    /// Attached shapes, in attachment order
    pub(crate) shapes: Vec<Shape>,

    /// Ids of joints attached to this body (owned by the space)
    pub(crate) joints: BTreeSet<JointHandle>,

    /// Broad-phase watermark: the last step this body opened a pair scan
    pub(crate) step_mark: u64,
}

impl RigidBody {
    /// Creates a new rigid body of the given type at a world position
    pub fn new(body_type: RigidBodyType, position: Vec2, angle: f32) -> Self {
        let mut flags = BodyFlags::default();
        if body_type == RigidBodyType::Static {
            flags.remove(BodyFlags::AWAKE);
        }

        Self {
            body_type,
            position,
            angle,
            rot: Rot2::new(angle),
            xf_origin: position,
            linear_velocity: Vec2::zero(),
            angular_velocity: 0.0,
            force: Vec2::zero(),
            torque: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
            centroid: Vec2::zero(),
            aabb: Aabb::empty(),
            flags,
            sleeping_time: 0.0,
            filter: FilterData::default(),
            shapes: Vec::new(),
            joints: BTreeSet::new(),
            step_mark: 0,
        }
    }

    /// Creates a new dynamic rigid body at a world position
    pub fn new_dynamic(position: Vec2) -> Self {
        Self::new(RigidBodyType::Dynamic, position, 0.0)
    }

    /// Creates a new static rigid body at a world position
    pub fn new_static(position: Vec2) -> Self {
        Self::new(RigidBodyType::Static, position, 0.0)
    }

    /// Creates a new kinematic rigid body at a world position
    pub fn new_kinematic(position: Vec2) -> Self {
        Self::new(RigidBodyType::Kinematic, position, 0.0)
    }

    /// Returns the body's type
    #[inline]
    pub fn body_type(&self) -> RigidBodyType {
        self.body_type
    }

    /// Returns whether the body is static
    #[inline]
    pub fn is_static(&self) -> bool {
        self.body_type == RigidBodyType::Static
    }

    /// Returns whether the body is dynamic
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.body_type == RigidBodyType::Dynamic
    }

    /// Returns whether the body is kinematic
    #[inline]
    pub fn is_kinematic(&self) -> bool {
        self.body_type == RigidBodyType::Kinematic
    }

    /// Returns the world position of the center of mass
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Returns the rotation angle in radians
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Returns the body-origin position (the frame shapes are authored in)
    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.xf_origin
    }

    /// Moves the body origin to a world position (authoring; wakes the body)
    pub fn set_position(&mut self, origin: Vec2) {
        self.position = origin + self.rot.rotate(self.centroid);
        self.sync_transform();
        self.cache_data();
        self.set_awake(true);
    }

    /// Sets the rotation angle (authoring; wakes the body)
    pub fn set_angle(&mut self, angle: f32) {
        let origin = self.xf_origin;
        self.angle = angle;
        self.rot = Rot2::new(angle);
        self.position = origin + self.rot.rotate(self.centroid);
        self.xf_origin = origin;
        self.cache_data();
        self.set_awake(true);
    }

    /// Returns the linear velocity of the center of mass
    #[inline]
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    /// Sets the linear velocity
    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        if !self.is_static() {
            self.linear_velocity = velocity;
        }
    }

    /// Returns the angular velocity in radians per second
    #[inline]
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    /// Sets the angular velocity
    pub fn set_angular_velocity(&mut self, velocity: f32) {
        if !self.is_static() {
            self.angular_velocity = velocity;
        }
    }

    /// Returns the body's mass (zero for static and kinematic bodies)
    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Returns the moment of inertia about the centroid
    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    /// Returns the cached world bounds
    #[inline]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Returns the attached shapes
    #[inline]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Returns the ids of joints attached to this body
    #[inline]
    pub fn joint_handles(&self) -> impl Iterator<Item = JointHandle> + '_ {
        self.joints.iter().copied()
    }

    /// Attaches a shape and recomputes mass properties
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
        self.reset_mass_data();
        self.cache_data();
    }

    /// Detaches the shape at `index` and recomputes mass properties
    pub fn remove_shape(&mut self, index: usize) -> Option<Shape> {
        if index >= self.shapes.len() {
            return None;
        }
        let shape = self.shapes.remove(index);
        self.reset_mass_data();
        self.cache_data();
        Some(shape)
    }

    /// Recomputes mass, centroid and inertia from the shape list and their
    /// material densities. Zero mass or inertia maps to a zero inverse.
    pub fn reset_mass_data(&mut self) {
        let origin = self.xf_origin;

        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;
        self.centroid = Vec2::zero();

        if self.body_type != RigidBodyType::Dynamic {
            self.position = origin;
            self.sync_transform();
            return;
        }

        let mass_data: Vec<_> = self.shapes.iter().map(|s| s.mass_data()).collect();
        for md in &mass_data {
            self.mass += md.mass;
            self.centroid += md.centroid * md.mass;
        }

        if self.mass > 0.0 {
            self.centroid /= self.mass;
            self.inv_mass = 1.0 / self.mass;
            for md in &mass_data {
                self.inertia +=
                    md.inertia + md.mass * md.centroid.distance_squared(&self.centroid);
            }
            if self.inertia > 0.0 {
                self.inv_inertia = 1.0 / self.inertia;
            }
        }

        // Keep the origin fixed; the world centroid moves with the new mass
        // distribution
        self.position = origin + self.rot.rotate(self.centroid);
        self.xf_origin = origin;
    }

    /// Integrates external forces into velocities.
    ///
    /// `damping` is the per-step retention factor, already raised to dt.
    pub fn update_velocity(&mut self, gravity: Vec2, damping: f32, dt: f32) {
        if self.body_type != RigidBodyType::Dynamic || !self.is_awake() {
            self.force = Vec2::zero();
            self.torque = 0.0;
            return;
        }

        let gravity = if self.flags.contains(BodyFlags::AFFECTED_BY_GRAVITY) {
            gravity
        } else {
            Vec2::zero()
        };

        self.linear_velocity =
            (self.linear_velocity + (gravity + self.force * self.inv_mass) * dt) * damping;
        self.angular_velocity =
            (self.angular_velocity + self.torque * self.inv_inertia * dt) * damping;

        self.force = Vec2::zero();
        self.torque = 0.0;
    }

    /// Integrates velocities into the pose (semi-implicit Euler)
    pub fn update_position(&mut self, dt: f32) {
        if self.body_type == RigidBodyType::Static || !self.is_awake() {
            return;
        }
        self.position += self.linear_velocity * dt;
        self.angle += self.angular_velocity * dt;
    }

    /// Re-derives the cached origin transform from the centroid pose
    pub fn sync_transform(&mut self) {
        self.rot = Rot2::new(self.angle);
        self.xf_origin = self.position - self.rot.rotate(self.centroid);
    }

    /// Recomputes world shape geometry and the body AABB
    pub fn cache_data(&mut self) {
        self.aabb = Aabb::empty();
        for shape in &mut self.shapes {
            shape.cache_data(self.xf_origin, self.rot);
            self.aabb.merge(shape.aabb());
        }
    }

    /// Returns whether the body is awake
    #[inline]
    pub fn is_awake(&self) -> bool {
        self.flags.contains(BodyFlags::AWAKE)
    }

    /// Returns whether the body is allowed to sleep
    #[inline]
    pub fn can_sleep(&self) -> bool {
        self.flags.contains(BodyFlags::CAN_SLEEP)
    }

    /// Allows or forbids sleeping; forbidding wakes the body
    pub fn set_can_sleep(&mut self, can_sleep: bool) {
        self.flags.set(BodyFlags::CAN_SLEEP, can_sleep);
        if !can_sleep {
            self.set_awake(true);
        }
    }

    /// Enables or disables gravity for this body
    pub fn set_affected_by_gravity(&mut self, affected: bool) {
        self.flags.set(BodyFlags::AFFECTED_BY_GRAVITY, affected);
    }

    /// Wakes the body or puts it to sleep. Waking resets the sleep clock;
    /// sleeping also zeroes velocities and pending forces.
    pub fn set_awake(&mut self, awake: bool) {
        self.sleeping_time = 0.0;
        if awake {
            if self.body_type != RigidBodyType::Static {
                self.flags.insert(BodyFlags::AWAKE);
            }
        } else {
            self.flags.remove(BodyFlags::AWAKE);
            self.linear_velocity = Vec2::zero();
            self.angular_velocity = 0.0;
            self.force = Vec2::zero();
            self.torque = 0.0;
        }
    }

    /// Accumulates a force through the center of mass
    pub fn apply_force(&mut self, force: Vec2) {
        if self.is_dynamic() {
            self.set_awake(true);
            self.force += force;
        }
    }

    /// Accumulates a force applied at a world point
    pub fn apply_force_at_point(&mut self, force: Vec2, point: Vec2) {
        if self.is_dynamic() {
            self.set_awake(true);
            self.force += force;
            self.torque += (point - self.position).cross(&force);
        }
    }

    /// Accumulates a torque
    pub fn apply_torque(&mut self, torque: f32) {
        if self.is_dynamic() {
            self.set_awake(true);
            self.torque += torque;
        }
    }

    /// Applies an instantaneous impulse through the center of mass
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        if self.is_dynamic() {
            self.set_awake(true);
            self.linear_velocity += impulse * self.inv_mass;
        }
    }

    /// Applies an instantaneous impulse at a world point
    pub fn apply_impulse_at_point(&mut self, impulse: Vec2, point: Vec2) {
        if self.is_dynamic() {
            self.set_awake(true);
            self.linear_velocity += impulse * self.inv_mass;
            self.angular_velocity += (point - self.position).cross(&impulse) * self.inv_inertia;
        }
    }

    /// Applies an instantaneous angular impulse
    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        if self.is_dynamic() {
            self.set_awake(true);
            self.angular_velocity += impulse * self.inv_inertia;
        }
    }

    /// Solver-internal impulse at arm `r` from the centroid; does not wake
    #[inline]
    pub(crate) fn apply_solver_impulse(&mut self, impulse: Vec2, r: Vec2) {
        self.linear_velocity += impulse * self.inv_mass;
        self.angular_velocity += r.cross(&impulse) * self.inv_inertia;
    }

    /// Velocity of a world point attached to the body
    #[inline]
    pub fn velocity_at(&self, r: Vec2) -> Vec2 {
        self.linear_velocity + Vec2::cross_scalar(self.angular_velocity, &r)
    }
}
