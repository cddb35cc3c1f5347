//! Zero-Reward Inner Solver: the standard Bellman least-fixed-point
//! over `T⁰`, with boundary values `x⁺ᵢ` and the `one`/`zero` pins
//! applied after every sweep.

use std::time::Instant;

use log::{debug, warn};

use crate::config::{ConvergenceNorm, SolverConfig};
use crate::error::QuantileError;
use crate::mode::OptimizationMode;
use crate::store::TransitionMatrix;
use crate::vectors::OneZeroSets;

/// Solves `y(s) = opt_c Σ p₀(s,c,s') y(s')` over the zero-reward
/// choices of `matrix`, with `y(s) = x_plus(s)` where `s` has none,
/// `one`/`zero` pins applied after every sweep, and `x_plus` used to
/// fill in states that also have zero-reward choices (combined via
/// `opt`).
///
/// Returns the converged vector, or
/// [`QuantileError::NonConvergence`] if `config.max_inner_iterations`
/// sweeps do not bring the chosen norm below `config.epsilon`.
pub fn solve(
    matrix: &dyn TransitionMatrix,
    x_plus: &[Option<f64>],
    mode: OptimizationMode,
    sets: &OneZeroSets,
    config: &SolverConfig,
) -> Result<Vec<f64>, QuantileError> {
    let n = matrix.num_states();

    if (0..n).all(|s| matrix.num_choices(s) == 0) {
        debug!("zero-reward matrix is empty, returning x_plus with undefined entries zeroed");
        return Ok((0..n)
            .map(|s| resolve_pin(s, x_plus[s].unwrap_or(0.0), sets))
            .collect());
    }

    let mut y: Vec<f64> = (0..n).map(|s| x_plus[s].unwrap_or(0.0)).collect();
    let mut y_next = vec![0.0; n];

    let start = Instant::now();
    let mut last_log = start;

    for iteration in 1..=config.max_inner_iterations {
        for state in 0..n {
            let choices = matrix.num_choices(state);
            let aggregated: Option<f64> = if choices == 0 {
                None
            } else {
                let mut best: Option<f64> = None;
                for choice in 0..choices {
                    let mut q = 0.0;
                    matrix.foreach_successor(state, choice, &mut |succ| {
                        q += succ.probability * y[succ.successor];
                    });
                    best = Some(match (best, mode) {
                        (None, _) => q,
                        (Some(b), OptimizationMode::Max) => b.max(q),
                        (Some(b), OptimizationMode::Min) => b.min(q),
                    });
                }
                best
            };

            let merged = match (aggregated, x_plus[state]) {
                (Some(v), None) => v,
                (None, Some(v)) => v,
                (Some(v), Some(x)) => match mode {
                    OptimizationMode::Max => v.max(x),
                    OptimizationMode::Min => v.min(x),
                },
                (None, None) => 0.0,
            };
            y_next[state] = resolve_pin(state, merged, sets);
        }

        let delta = convergence_measure(&y, &y_next, config.norm);

        if last_log.elapsed().as_millis() as u64 >= config.update_delay_ms {
            debug!(
                "inner solver: iteration={iteration} delta={delta:.3e} elapsed={:.3}s",
                start.elapsed().as_secs_f64()
            );
            last_log = Instant::now();
        }

        std::mem::swap(&mut y, &mut y_next);

        if delta < config.epsilon {
            debug!(
                "inner solver converged after {iteration} iterations (delta={delta:.3e})"
            );
            return Ok(y);
        }
    }

    let delta = convergence_measure(&y_next, &y, config.norm);
    warn!(
        "inner solver failed to converge after {} iterations (delta={delta:.3e})",
        config.max_inner_iterations
    );
    Err(QuantileError::NonConvergence {
        iterations: config.max_inner_iterations,
        delta,
    })
}

fn resolve_pin(state: usize, value: f64, sets: &OneZeroSets) -> f64 {
    if sets.one.contains(state) {
        1.0
    } else if sets.zero.contains(state) {
        0.0
    } else {
        value
    }
}

fn convergence_measure(prev: &[f64], next: &[f64], norm: ConvergenceNorm) -> f64 {
    prev.iter()
        .zip(next.iter())
        .map(|(&p, &n)| {
            let diff = (n - p).abs();
            match norm {
                ConvergenceNorm::Absolute => diff,
                ConvergenceNorm::Relative => {
                    if n.abs() > f64::EPSILON {
                        diff / n.abs()
                    } else {
                        diff
                    }
                }
            }
        })
        .fold(0.0, f64::max)
}
