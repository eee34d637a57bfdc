use crate::math::Vec2;

/// Identifies which features of the two shapes generated a contact point, so
/// the point can be matched against the previous step's manifold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureId(pub u32);

impl FeatureId {
    /// Packs a feature index pair into one id
    #[inline]
    pub fn pair(a: u32, b: u32) -> Self {
        Self((a << 16) | (b & 0xFFFF))
    }
}

/// A single contact point between two shapes.
///
/// The narrow phase fills in the geometric fields; the contact solver owns
/// the accumulators and effective masses, which persist across steps when
/// the feature id matches the previous manifold.
#[derive(Debug, Clone, Copy)]
pub struct ContactPoint {
    /// World position of the contact
    pub position: Vec2,

    /// Unit normal pointing from shape1 toward shape2
    pub normal: Vec2,

    /// Separation along the normal; negative when penetrating
    pub depth: f32,

    /// Feature pair that generated this point
    pub feature: FeatureId,

    /// Accumulated normal impulse (warm-started across steps)
    pub(crate) jn_acc: f32,

    /// Accumulated tangent impulse (warm-started across steps)
    pub(crate) jt_acc: f32,

    /// Restitution bias velocity
    pub(crate) bias: f32,

    /// Effective masses for the normal and tangent rows
    pub(crate) en: f32,
    pub(crate) et: f32,

    /// Arms from the body centroids, world frame at init time
    pub(crate) r1: Vec2,
    pub(crate) r2: Vec2,

    /// Arms in each body's local frame, for position re-derivation
    pub(crate) r1_local: Vec2,
    pub(crate) r2_local: Vec2,
}

impl ContactPoint {
    /// Creates a narrow-phase contact point with cleared solver state
    pub fn new(position: Vec2, normal: Vec2, depth: f32, feature: FeatureId) -> Self {
        Self {
            position,
            normal,
            depth,
            feature,
            jn_acc: 0.0,
            jt_acc: 0.0,
            bias: 0.0,
            en: 0.0,
            et: 0.0,
            r1: Vec2::zero(),
            r2: Vec2::zero(),
            r1_local: Vec2::zero(),
            r2_local: Vec2::zero(),
        }
    }

    /// Returns the accumulated normal impulse
    #[inline]
    pub fn normal_impulse(&self) -> f32 {
        self.jn_acc
    }

    /// Returns the accumulated tangent impulse
    #[inline]
    pub fn tangent_impulse(&self) -> f32 {
        self.jt_acc
    }
}
