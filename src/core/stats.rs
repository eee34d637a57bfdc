use std::time::Duration;

/// Timings and counters for the most recent step
#[derive(Debug, Clone, Copy, Default)]
pub struct StepStats {
    /// Time spent in the broad and narrow collision phases
    pub collision_time: Duration,

    /// Time spent initializing contact solvers and joints
    pub init_time: Duration,

    /// Time spent in the velocity solver loop
    pub velocity_time: Duration,

    /// Time spent in the position solver loop
    pub position_time: Duration,

    /// Position iterations actually used (early exit on convergence)
    pub position_iterations: u32,

    /// Whether the position solver converged within its iteration cap
    pub position_solved: bool,

    /// Total contact points across all live manifolds
    pub contacts: usize,

    /// Bodies in the space at the end of the step
    pub bodies: usize,

    /// Joints in the space at the end of the step
    pub joints: usize,

    /// Breakable joints removed during this step
    pub joints_broken: usize,
}
