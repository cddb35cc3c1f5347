use thiserror::Error;

/// Error types produced while constructing a transition store or running
/// the quantile fixed-point solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QuantileError {
    /// An action-reward (or state-action-reward) projection yielded a
    /// value that is not an integer.
    #[error("reward value is not an integer: {0}")]
    NonIntegerReward(f64),

    /// A hybrid back-end's action-reward projection did not collapse to
    /// a constant over the choice cube.
    #[error(
        "action reward projection did not collapse to a constant for choice ({state}, {choice})"
    )]
    NonConstantActionReward { state: usize, choice: usize },

    /// An unrecognised threshold operator string was supplied.
    #[error("unknown threshold operator: {0:?}")]
    UnknownThresholdOperator(String),

    /// The zero-reward inner solver reached `max_inner_iterations`
    /// without satisfying the convergence criterion.
    #[error(
        "inner solver failed to converge after {iterations} iterations (delta={delta}); \
         try increasing max_inner_iterations or switching solution method"
    )]
    NonConvergence { iterations: usize, delta: f64 },

    /// The outer reward-level recurrence ran for `max_outer_iterations`
    /// levels without the driver reaching a decision for every state of
    /// interest. Distinct from [`Self::NonConvergence`], which is the
    /// zero-reward inner solver's own sweep-count limit.
    #[error(
        "outer iteration exceeded {iterations} reward levels without deciding all states of interest"
    )]
    OuterIterationLimitExceeded { iterations: usize },

    /// The supplied model data violates one of the data-model
    /// invariants (e.g. a choice's successor probabilities do not sum
    /// to 1, or the one/zero sets overlap).
    #[error("invalid model: {0}")]
    InvalidModel(String),
}
