mod body_type;
mod material;
mod rigid_body;

pub use self::body_type::RigidBodyType;
pub use self::material::Material;
pub use self::rigid_body::RigidBody;

/// Flags for controlling body behavior
pub mod body_flags {
    use bitflags::bitflags;

    bitflags! {
        /// Flags for controlling the behavior of rigid bodies
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct BodyFlags: u32 {
            /// Body can go to sleep when inactive
            const CAN_SLEEP = 0x01;

            /// Body is currently awake
            const AWAKE = 0x02;

            /// Body is affected by gravity
            const AFFECTED_BY_GRAVITY = 0x04;
        }
    }

    impl Default for BodyFlags {
        fn default() -> Self {
            Self::CAN_SLEEP | Self::AWAKE | Self::AFFECTED_BY_GRAVITY
        }
    }
}
