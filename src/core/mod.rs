pub mod config;
pub mod events;
pub mod stats;
pub mod storage;
pub mod world;

pub use self::config::SimulationConfig;
pub use self::events::{EventQueue, WorldEvent};
pub use self::stats::StepStats;
pub use self::storage::{BodyStorage, JointStorage, Storage};
pub use self::world::Space;

/// A unique identifier for a body in the space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) u32);

/// A unique identifier for a joint in the space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointHandle(pub(crate) u32);
