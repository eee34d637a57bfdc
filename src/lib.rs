pub mod bodies;
pub mod collision;
pub mod constraints;
pub mod core;
pub mod math;
pub mod scene;
pub mod shapes;

/// Re-export common types for easier usage
pub use crate::bodies::{Material, RigidBody, RigidBodyType};
pub use crate::constraints::Joint;
pub use crate::core::{BodyHandle, JointHandle, SimulationConfig, Space, StepStats};
pub use crate::math::Vec2;

/// Error types for the physics engine
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum PhysicsError {
        /// A scene shape definition carried a `type` tag this engine does
        /// not know
        #[error("unknown shape kind: {0}")]
        UnknownShapeKind(String),

        /// A scene joint definition carried a `type` tag this engine does
        /// not know
        #[error("unknown joint kind: {0}")]
        UnknownJointKind(String),

        /// A scene joint referenced a body index outside the body array
        #[error("joint references body {index} but the scene has {len} bodies")]
        BodyIndexOutOfRange { index: usize, len: usize },

        /// Structurally malformed scene JSON
        #[error("invalid scene: {0}")]
        InvalidScene(String),

        /// A handle lookup found nothing
        #[error("resource not found: {0}")]
        ResourceNotFound(String),
    }
}

/// Result type for physics engine operations
pub type Result<T> = std::result::Result<T, error::PhysicsError>;

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
