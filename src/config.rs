/// Which norm is used to decide convergence of the zero-reward inner
/// solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceNorm {
    /// `max_s |y'(s) - y(s)|`
    Absolute,
    /// `max_s |y'(s) - y(s)| / y'(s)`
    Relative,
}

/// Tunable parameters threaded through the solver. These are the ambient
/// knobs a probabilistic model checker typically exposes alongside the
/// quantile entry point: convergence tolerance, the inner solver's
/// iteration cap, the norm used to measure convergence, the outer
/// recurrence's iteration cap, and the status-log cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Convergence tolerance `ε` for the zero-reward inner solver.
    pub epsilon: f64,
    /// Maximum number of sweeps the inner solver will attempt (`K_max`)
    /// before failing with [`crate::error::QuantileError::NonConvergence`].
    pub max_inner_iterations: usize,
    /// Norm used to measure convergence between sweeps.
    pub norm: ConvergenceNorm,
    /// Maximum number of outer reward-level iterations the driver will
    /// run before failing with
    /// [`crate::error::QuantileError::OuterIterationLimitExceeded`].
    /// Independent of `max_inner_iterations`, which bounds the inner
    /// solver's own sweep count at each level.
    pub max_outer_iterations: usize,
    /// Minimum delay, in milliseconds, between periodic status log
    /// records emitted from inside the inner solver.
    pub update_delay_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            epsilon: 1e-6,
            max_inner_iterations: 10_000,
            norm: ConvergenceNorm::Absolute,
            max_outer_iterations: 1_000_000,
            update_delay_ms: 3_000,
        }
    }
}
