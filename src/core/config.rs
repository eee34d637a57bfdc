use crate::math::Vec2;
use serde::{Deserialize, Serialize};

/// Configuration parameters for the physics simulation.
///
/// The solver tolerances form one tuning group; they interact, and changing
/// any of them changes simulation behavior measurably.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Gravity applied to every dynamic body
    pub gravity: Vec2,

    /// Fraction of velocity retained per second (1 = no damping), applied
    /// per step as `damping^dt`
    pub damping: f32,

    /// Closing speed below which restitution is ignored
    pub velocity_threshold: f32,

    /// Penetration tolerated before position correction kicks in
    pub linear_slop: f32,

    /// Angular error tolerated by joint position solvers, in radians
    pub angular_slop: f32,

    /// Largest positional correction applied in one iteration
    pub max_linear_correction: f32,

    /// Largest angular correction applied in one iteration, in radians
    pub max_angular_correction: f32,

    /// Time a body must stay below the sleep tolerances before sleeping
    pub time_to_sleep: f32,

    /// Linear speed below which a body accumulates sleep time
    pub sleep_linear_tolerance: f32,

    /// Angular speed below which a body accumulates sleep time, in radians
    /// per second
    pub sleep_angular_tolerance: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            damping: 1.0,
            velocity_threshold: 0.5,
            linear_slop: 0.005,
            angular_slop: crate::math::to_radians(2.0),
            max_linear_correction: 0.2,
            max_angular_correction: crate::math::to_radians(8.0),
            time_to_sleep: 0.5,
            sleep_linear_tolerance: 0.5,
            sleep_angular_tolerance: crate::math::to_radians(2.0),
        }
    }
}
