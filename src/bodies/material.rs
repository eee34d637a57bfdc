use serde::{Deserialize, Serialize};

/// Surface and mass properties of a shape
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Material {
    /// Coefficient of restitution (bounciness), 0-1
    pub restitution: f32,

    /// Coefficient of friction, 0-1
    pub friction: f32,

    /// Density of the material (mass per unit area)
    pub density: f32,
}

impl Material {
    /// Creates a new material with the specified properties
    pub fn new(density: f32, friction: f32, restitution: f32) -> Self {
        Self {
            density,
            friction,
            restitution,
        }
    }

    /// Creates a material for ice (low friction, some bounce)
    pub fn ice() -> Self {
        Self {
            density: 0.9,
            friction: 0.05,
            restitution: 0.4,
        }
    }

    /// Creates a material for rubber (high friction, bouncy)
    pub fn rubber() -> Self {
        Self {
            density: 1.2,
            friction: 0.8,
            restitution: 0.7,
        }
    }

    /// Creates a material for wood (medium friction, little bounce)
    pub fn wood() -> Self {
        Self {
            density: 0.7,
            friction: 0.6,
            restitution: 0.2,
        }
    }

    /// Creates a material for metal (medium friction, medium bounce)
    pub fn metal() -> Self {
        Self {
            density: 7.8,
            friction: 0.4,
            restitution: 0.5,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            density: 1.0,
            friction: 0.5,
            restitution: 0.1,
        }
    }
}
