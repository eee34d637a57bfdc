use crate::bodies::RigidBody;
use crate::collision::ContactPoint;
use crate::core::{BodyHandle, SimulationConfig};
use crate::math::{clamp, Rot2, Vec2};

/// Sequential-impulse solver for one persistent shape pair.
///
/// Created by the space when a canonically-ordered shape pair first
/// collides, then reused every step the pair keeps colliding; contact
/// points whose feature ids match the previous manifold keep their
/// impulse accumulators for warm starting.
pub struct ContactSolver {
    pub(crate) body1: BodyHandle,
    pub(crate) body2: BodyHandle,
    pub(crate) shape1: u32,
    pub(crate) shape2: u32,

    /// Combined friction (geometric mean of the shape materials)
    friction: f32,

    /// Combined restitution (maximum of the shape materials)
    restitution: f32,

    /// Manifold separating normal, from shape1 toward shape2
    normal: Vec2,

    contacts: Vec<ContactPoint>,
}

impl ContactSolver {
    pub(crate) fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        shape1: u32,
        shape2: u32,
        friction: f32,
        restitution: f32,
        contacts: Vec<ContactPoint>,
    ) -> Self {
        let normal = contacts.first().map_or(Vec2::zero(), |c| c.normal);
        Self {
            body1,
            body2,
            shape1,
            shape2,
            friction,
            restitution,
            normal,
            contacts,
        }
    }

    /// Returns the handles of the two bodies in contact
    #[inline]
    pub fn bodies(&self) -> (BodyHandle, BodyHandle) {
        (self.body1, self.body2)
    }

    /// Returns the ids of the two shapes in contact
    #[inline]
    pub fn shape_ids(&self) -> (u32, u32) {
        (self.shape1, self.shape2)
    }

    /// Returns the manifold separating normal
    #[inline]
    pub fn normal(&self) -> Vec2 {
        self.normal
    }

    /// Returns the combined friction coefficient
    #[inline]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Returns the combined restitution coefficient
    #[inline]
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Returns the current contact points
    #[inline]
    pub fn contacts(&self) -> &[ContactPoint] {
        &self.contacts
    }

    /// Replaces the manifold with this step's contact points, carrying the
    /// impulse accumulators of points whose feature ids match
    pub(crate) fn update(&mut self, mut new_contacts: Vec<ContactPoint>) {
        for contact in &mut new_contacts {
            if let Some(old) = self.contacts.iter().find(|c| c.feature == contact.feature) {
                contact.jn_acc = old.jn_acc;
                contact.jt_acc = old.jt_acc;
            }
        }
        self.normal = new_contacts.first().map_or(self.normal, |c| c.normal);
        self.contacts = new_contacts;
    }

    /// Computes arms, effective masses and the restitution bias for this
    /// step. Clears the accumulators when warm starting is off.
    pub(crate) fn init(
        &mut self,
        b1: &RigidBody,
        b2: &RigidBody,
        config: &SimulationConfig,
        warm_starting: bool,
    ) {
        for c in &mut self.contacts {
            c.r1 = c.position - b1.position;
            c.r2 = c.position - b2.position;
            c.r1_local = b1.rot.unrotate(c.r1);
            c.r2_local = b2.rot.unrotate(c.r2);

            let n = c.normal;
            let t = n.perpendicular();

            let sn1 = c.r1.cross(&n);
            let sn2 = c.r2.cross(&n);
            let en_inv = b1.inv_mass
                + b2.inv_mass
                + b1.inv_inertia * sn1 * sn1
                + b2.inv_inertia * sn2 * sn2;
            c.en = if en_inv > 0.0 { 1.0 / en_inv } else { 0.0 };

            let st1 = c.r1.cross(&t);
            let st2 = c.r2.cross(&t);
            let et_inv = b1.inv_mass
                + b2.inv_mass
                + b1.inv_inertia * st1 * st1
                + b2.inv_inertia * st2 * st2;
            c.et = if et_inv > 0.0 { 1.0 / et_inv } else { 0.0 };

            // Restitution only above the bounce threshold
            let dv = b2.velocity_at(c.r2) - b1.velocity_at(c.r1);
            let vn = dv.dot(&n);
            c.bias = if vn < -config.velocity_threshold {
                -self.restitution * vn
            } else {
                0.0
            };

            if !warm_starting {
                c.jn_acc = 0.0;
                c.jt_acc = 0.0;
            }
        }
    }

    /// Applies the accumulated impulses carried over from the previous step
    pub(crate) fn warm_start(&mut self, b1: &mut RigidBody, b2: &mut RigidBody) {
        for c in &self.contacts {
            let t = c.normal.perpendicular();
            let impulse = c.normal * c.jn_acc + t * c.jt_acc;
            b1.apply_solver_impulse(-impulse, c.r1);
            b2.apply_solver_impulse(impulse, c.r2);
        }
    }

    /// One Gauss-Seidel velocity iteration over the manifold.
    ///
    /// Per point the tangent row is solved before the normal row; the
    /// friction cone clamp uses the current accumulated normal impulse.
    pub(crate) fn solve_velocity(&mut self, b1: &mut RigidBody, b2: &mut RigidBody) {
        for c in &mut self.contacts {
            let n = c.normal;
            let t = n.perpendicular();

            // Friction
            let dv = b2.velocity_at(c.r2) - b1.velocity_at(c.r1);
            let vt = dv.dot(&t);
            let lambda = -c.et * vt;
            let max_friction = self.friction * c.jn_acc;
            let old = c.jt_acc;
            c.jt_acc = clamp(old + lambda, -max_friction, max_friction);
            let impulse = t * (c.jt_acc - old);
            b1.apply_solver_impulse(-impulse, c.r1);
            b2.apply_solver_impulse(impulse, c.r2);

            // Non-penetration
            let dv = b2.velocity_at(c.r2) - b1.velocity_at(c.r1);
            let vn = dv.dot(&n);
            let lambda = -c.en * (vn - c.bias);
            let old = c.jn_acc;
            c.jn_acc = (old + lambda).max(0.0);
            let impulse = n * (c.jn_acc - old);
            b1.apply_solver_impulse(-impulse, c.r1);
            b2.apply_solver_impulse(impulse, c.r2);
        }
    }

    /// One position-correction iteration. Separation is re-derived from the
    /// current poses through the locally-stored anchors. Returns true when
    /// the worst penetration is within tolerance.
    pub(crate) fn solve_position(
        &mut self,
        b1: &mut RigidBody,
        b2: &mut RigidBody,
        config: &SimulationConfig,
    ) -> bool {
        let mut max_penetration = 0.0_f32;

        for c in &self.contacts {
            let rot1 = Rot2::new(b1.angle);
            let rot2 = Rot2::new(b2.angle);
            let r1 = rot1.rotate(c.r1_local);
            let r2 = rot2.rotate(c.r2_local);
            let p1 = b1.position + r1;
            let p2 = b2.position + r2;

            let n = c.normal;
            let separation = (p2 - p1).dot(&n) + c.depth;
            max_penetration = max_penetration.max(-separation);

            let correction = clamp(
                separation + config.linear_slop,
                -config.max_linear_correction,
                0.0,
            );
            if correction == 0.0 {
                continue;
            }

            let sn1 = r1.cross(&n);
            let sn2 = r2.cross(&n);
            let em_inv = b1.inv_mass
                + b2.inv_mass
                + b1.inv_inertia * sn1 * sn1
                + b2.inv_inertia * sn2 * sn2;
            if em_inv <= 0.0 {
                continue;
            }
            let lambda = -correction / em_inv;

            let impulse = n * lambda;
            b1.position -= impulse * b1.inv_mass;
            b1.angle -= sn1 * lambda * b1.inv_inertia;
            b2.position += impulse * b2.inv_mass;
            b2.angle += sn2 * lambda * b2.inv_inertia;
        }

        max_penetration <= 3.0 * config.linear_slop
    }
}
