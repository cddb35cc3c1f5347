//!
//! `quantile-reach` computes reward-bounded probabilistic reachability
//! quantiles over finite Markov Decision Processes: given an MDP with
//! integer rewards on states and transitions, a target, and one or more
//! probability thresholds, it finds the smallest cumulative reward
//! bound at which the optimal probability of reaching the target
//! satisfies the threshold.
//!
//! The public entry point is [`driver::solve_quantiles`] (or its
//! string-operator convenience wrapper, [`driver::solve_quantiles_str`]).
//! Transition data is supplied through one of two back-ends —
//! [`store::SparseMatrix`] or [`store::HybridMatrix`] — both
//! implementing [`store::TransitionMatrix`].

pub mod config;
pub mod driver;
pub mod error;
pub mod inner;
pub mod mode;
pub mod positive;
pub mod ring;
pub mod store;
pub mod threshold;
pub mod trace;
pub mod vectors;

pub use config::{ConvergenceNorm, SolverConfig};
pub use driver::{solve_quantiles, solve_quantiles_str, QuantileMatrices};
pub use error::QuantileError;
pub use mode::{BoundMode, OptimizationMode};
pub use threshold::{QuantileValue, ThresholdOp};
pub use vectors::{ModelVectors, OneZeroSets, StateSet};
