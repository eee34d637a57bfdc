pub mod contact;
pub mod contact_solver;
pub mod filter;
pub mod narrow_phase;

pub use contact::{ContactPoint, FeatureId};
pub use contact_solver::ContactSolver;
pub use filter::{CollisionGroup, FilterData};
pub use narrow_phase::collide;
