mod angle;
mod distance;
mod joint;
mod line;
mod prismatic;
mod revolute;
mod rope;
mod weld;

pub use self::angle::AngleJoint;
pub use self::distance::DistanceJoint;
pub use self::joint::{Joint, JointCore, LimitState};
pub use self::line::LineJoint;
pub use self::prismatic::PrismaticJoint;
pub use self::revolute::RevoluteJoint;
pub use self::rope::RopeJoint;
pub use self::weld::WeldJoint;
