//! Quantile Driver: the public entry point tying the level ring, the
//! positive-reward step, and the zero-reward inner solver into the
//! full `i = 0, 1, 2, ...` outer recurrence.

use log::{debug, info};

use crate::config::SolverConfig;
use crate::error::QuantileError;
use crate::inner;
use crate::mode::{BoundMode, OptimizationMode};
use crate::positive;
use crate::ring::LevelRing;
use crate::store::TransitionMatrix;
use crate::threshold::{QuantileValue, ThresholdOp};
use crate::trace::{IterationSink, VectorKind};
use crate::vectors::ModelVectors;

/// The two transition matrices the driver alternates between: `T⁺`
/// (positive-reward choices) and `T⁰` (zero-reward choices). Either may
/// be backed by [`crate::store::SparseMatrix`] or
/// [`crate::store::HybridMatrix`] — the driver only sees the trait.
pub struct QuantileMatrices<'a> {
    pub plus: &'a dyn TransitionMatrix,
    pub zero: &'a dyn TransitionMatrix,
}

/// Runs the full quantile recurrence and returns, for every state in
/// `states_of_interest` (same order), the quantile value against the
/// numerically largest of `thresholds`.
///
/// Phases, in order:
/// 1. validate the model vectors;
/// 2. infinity check — a state whose `X_∞` already fails the threshold
///    can never be decided at any finite level;
/// 3. zero check — a state whose `X_0` already satisfies the threshold
///    is decided at level 0;
/// 4. outer iteration — advance the ring, compute `x⁺ᵢ` via
///    [`positive::step`], solve the zero-reward fixed point via
///    [`inner::solve`], and check the threshold against the result,
///    repeating until every state of interest is decided against every
///    threshold.
///
/// An optional [`IterationSink`] receives the converged vector at every
/// outer level, regardless of whether the `trace` feature is enabled —
/// callers not using `HtmlTraceWriter` may still pass their own sink.
#[allow(clippy::too_many_arguments)]
pub fn solve_quantiles(
    matrices: QuantileMatrices<'_>,
    vectors: &ModelVectors,
    states_of_interest: &[usize],
    operator: ThresholdOp,
    thresholds: &[f64],
    mode: OptimizationMode,
    bound: BoundMode,
    config: &SolverConfig,
    mut trace: Option<&mut dyn IterationSink>,
) -> Result<Vec<QuantileValue>, QuantileError> {
    vectors.validate()?;

    if thresholds.is_empty() {
        return Err(QuantileError::InvalidModel(
            "solve_quantiles requires at least one threshold".to_string(),
        ));
    }
    if states_of_interest.is_empty() {
        debug!("no states of interest, returning immediately");
        return Ok(Vec::new());
    }

    let (largest_idx, _) = thresholds
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).expect("threshold is NaN"))
        .expect("thresholds checked non-empty above");

    let n = vectors.num_states();
    let m = states_of_interest.len();
    let mut results: Vec<Vec<QuantileValue>> =
        vec![vec![QuantileValue::Undecided; m]; thresholds.len()];

    // Infinity check (property 3): X_infinity bounds every v_i from
    // above/below depending on mode, so a threshold the infinity value
    // itself cannot satisfy is never satisfied at any finite level.
    let complement = operator.complement();
    for (pos, &s) in states_of_interest.iter().enumerate() {
        for (t_idx, &p) in thresholds.iter().enumerate() {
            if complement.holds(vectors.infinity[s], p) {
                results[t_idx][pos] = QuantileValue::Infinite;
            }
        }
    }

    // Zero check (property 2): X_0 is level 0 of the recurrence.
    apply_threshold(&mut results, states_of_interest, thresholds, operator, 0, &vectors.base);

    if all_decided(&results) {
        info!("all states of interest decided before any outer iteration ran");
        return Ok(select_largest(results, largest_idx));
    }

    let window = vectors
        .window()
        .max(matrices.plus.max_window())
        .max(matrices.zero.max_window());
    let mut ring = LevelRing::new(window, n);
    ring.store_level_zero(&vectors.base);

    let mut level: i64 = 0;

    loop {
        level += 1;
        if level as usize > config.max_outer_iterations {
            return Err(QuantileError::OuterIterationLimitExceeded {
                iterations: level as usize,
            });
        }

        ring.advance();
        let x_plus = positive::step(
            matrices.plus,
            &vectors.state_rewards,
            &ring,
            level,
            mode,
            bound,
            &vectors.sets,
        );
        let y = inner::solve(matrices.zero, &x_plus, mode, &vectors.sets, config)?;
        ring.write_current(&y);

        if let Some(sink) = trace.as_deref_mut() {
            sink.record(level as u64, &y, VectorKind::from(bound));
        }

        apply_threshold(&mut results, states_of_interest, thresholds, operator, level, &y);

        if all_decided(&results) {
            info!("all states of interest decided at level {level}");
            return Ok(select_largest(results, largest_idx));
        }
    }
}

/// Convenience wrapper accepting the raw operator string used by the
/// external interface, parsing it once via
/// [`ThresholdOp::try_from`] before delegating.
#[allow(clippy::too_many_arguments)]
pub fn solve_quantiles_str(
    matrices: QuantileMatrices<'_>,
    vectors: &ModelVectors,
    states_of_interest: &[usize],
    operator: &str,
    thresholds: &[f64],
    mode: OptimizationMode,
    bound: BoundMode,
    config: &SolverConfig,
    trace: Option<&mut dyn IterationSink>,
) -> Result<Vec<QuantileValue>, QuantileError> {
    let operator = ThresholdOp::try_from(operator)?;
    solve_quantiles(
        matrices,
        vectors,
        states_of_interest,
        operator,
        thresholds,
        mode,
        bound,
        config,
        trace,
    )
}

fn all_decided(results: &[Vec<QuantileValue>]) -> bool {
    results.iter().all(|per_state| per_state.iter().all(QuantileValue::is_decided))
}

fn select_largest(results: Vec<Vec<QuantileValue>>, largest_idx: usize) -> Vec<QuantileValue> {
    results
        .into_iter()
        .nth(largest_idx)
        .expect("largest_idx is a valid index into thresholds")
}

/// Marks states of interest as decided at `level` wherever `values`
/// satisfies `operator` against the corresponding threshold and the
/// state was not already decided (by the infinity check or an earlier
/// level). Factored out so the multi-threshold decision logic can be
/// exercised independently of a full matrix-driven recurrence.
fn apply_threshold(
    results: &mut [Vec<QuantileValue>],
    states_of_interest: &[usize],
    thresholds: &[f64],
    operator: ThresholdOp,
    level: i64,
    values: &[f64],
) {
    for (pos, &s) in states_of_interest.iter().enumerate() {
        for (t_idx, &p) in thresholds.iter().enumerate() {
            if results[t_idx][pos].is_decided() {
                continue;
            }
            if operator.holds(values[s], p) {
                results[t_idx][pos] = QuantileValue::Decided(level as u64);
            }
        }
    }
}
