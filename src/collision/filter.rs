use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// A bit mask representing collision categories.
    ///
    /// Serialize/Deserialize come from the bitflags serde feature.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CollisionGroup: u32 {
        /// Default group (collides with everything)
        const DEFAULT = 0x0001;

        /// Static world geometry
        const WORLD = 0x0002;

        /// Player-controlled objects
        const CHARACTER = 0x0004;

        /// Projectiles
        const PROJECTILE = 0x0008;

        /// Debris with simplified interactions
        const DEBRIS = 0x0010;

        /// All groups
        const ALL = 0xFFFF_FFFF;
    }
}

impl Default for CollisionGroup {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Collision category and mask carried by each body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FilterData {
    /// The categories this body belongs to
    pub category: CollisionGroup,

    /// The categories this body collides with
    pub mask: CollisionGroup,
}

impl FilterData {
    /// Returns whether two filters accept each other.
    ///
    /// Each body's category must intersect the other's mask.
    #[inline]
    pub fn accepts(&self, other: &FilterData) -> bool {
        self.category.intersects(other.mask) && other.category.intersects(self.mask)
    }
}

impl Default for FilterData {
    fn default() -> Self {
        Self {
            category: CollisionGroup::DEFAULT,
            mask: CollisionGroup::ALL,
        }
    }
}
