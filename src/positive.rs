//! Positive-Reward Step: the optimal one-step lookback `x⁺ᵢ` over `T⁺`.

use crate::mode::{BoundMode, OptimizationMode};
use crate::ring::LevelRing;
use crate::store::TransitionMatrix;
use crate::vectors::OneZeroSets;

/// Computes `x⁺ᵢ(s)` for every state at outer level `i`. States with no
/// choice in `matrix` are left `None` (the "undefined" sentinel,
/// represented as an explicit `Option` rather than a negative-value
/// sentinel), except where pinned by the `one`/`zero` sets.
///
/// Both [`BoundMode`] variants treat a level that has fallen outside
/// the ring's window as contributing `0`: the mode is accepted for API
/// symmetry with the inner solver but does not change this function's
/// behaviour.
pub fn step(
    matrix: &dyn TransitionMatrix,
    state_rewards: &[u64],
    ring: &LevelRing,
    level: i64,
    mode: OptimizationMode,
    _bound: BoundMode,
    sets: &OneZeroSets,
) -> Vec<Option<f64>> {
    let n = matrix.num_states();
    let mut result = vec![None; n];

    for (state, slot) in result.iter_mut().enumerate() {
        let choices = matrix.num_choices(state);
        if choices == 0 {
            continue;
        }

        let mut best: Option<f64> = None;
        for choice in 0..choices {
            let action_reward = matrix.action_reward(state, choice);
            let mut q = 0.0;
            matrix.foreach_successor(state, choice, &mut |succ| {
                let total_reward = state_rewards[state] + action_reward + succ.trans_reward;
                let successor_level = level - total_reward as i64;
                q += succ.probability * ring.get(successor_level).get(succ.successor);
            });

            best = Some(match (best, mode) {
                (None, _) => q,
                (Some(b), OptimizationMode::Max) => b.max(q),
                (Some(b), OptimizationMode::Min) => b.min(q),
            });
        }
        *slot = best;
    }

    pin(&mut result, sets);
    result
}

/// Applies the unconditional `one`/`zero` pinning post-processing:
/// `s ∈ O ⇒ x⁺ᵢ(s) = 1`, `s ∈ Z ⇒ x⁺ᵢ(s) = 0`.
pub fn pin(values: &mut [Option<f64>], sets: &OneZeroSets) {
    for (state, value) in values.iter_mut().enumerate() {
        if sets.one.contains(state) {
            *value = Some(1.0);
        } else if sets.zero.contains(state) {
            *value = Some(0.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sparse::{SparseChoice, SparseMatrix};
    use crate::vectors::StateSet;
    use approx::assert_abs_diff_eq;

    /// 0 -> 1 w.p. 1 on its only choice, reward 1; 1 is absorbing
    /// and in `O`. Expect x⁺₁(0) = 1 once level 1's window includes the
    /// one-pinned value at level 0 offset by the reward.
    #[test]
    fn single_choice_looks_back_across_reward_offset() {
        let matrix = SparseMatrix::build(
            2,
            1,
            vec![
                vec![SparseChoice {
                    action_reward: 0,
                    transitions: vec![(1, 1.0, 1)],
                }],
                vec![SparseChoice {
                    action_reward: 0,
                    transitions: vec![(1, 1.0, 0)],
                }],
            ],
        )
        .unwrap();
        let sets = crate::vectors::OneZeroSets::new(
            StateSet::from_states(2, [1]),
            StateSet::empty(2),
        )
        .unwrap();
        let state_rewards = vec![0, 0];

        let mut ring = LevelRing::new(1, 2);
        ring.store_level_zero(&[0.0, 1.0]);
        ring.advance();
        ring.write_current(&[0.0, 1.0]);

        let x = step(
            &matrix,
            &state_rewards,
            &ring,
            1,
            OptimizationMode::Max,
            BoundMode::Lower,
            &sets,
        );
        // state 1 is pinned to 1 regardless of the step computation
        assert_eq!(x[1], Some(1.0));
        // state 0: transition reward 1 means it looks back to level 0,
        // where state 1 already holds 1.0
        assert_abs_diff_eq!(x[0].unwrap(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn undefined_when_no_choices() {
        let matrix = SparseMatrix::build(1, 0, vec![vec![]]).unwrap();
        let sets = OneZeroSets::new(StateSet::empty(1), StateSet::empty(1)).unwrap();
        let ring = LevelRing::new(0, 1);
        let x = step(
            &matrix,
            &[0],
            &ring,
            0,
            OptimizationMode::Max,
            BoundMode::Lower,
            &sets,
        );
        assert_eq!(x[0], None);
    }

    #[test]
    fn pinning_overrides_step_result() {
        let matrix = SparseMatrix::build(
            1,
            0,
            vec![vec![SparseChoice {
                action_reward: 0,
                transitions: vec![(0, 1.0, 0)],
            }]],
        )
        .unwrap();
        let sets = OneZeroSets::new(StateSet::from_states(1, [0]), StateSet::empty(1)).unwrap();
        let ring = LevelRing::new(0, 1);
        let x = step(
            &matrix,
            &[0],
            &ring,
            0,
            OptimizationMode::Max,
            BoundMode::Lower,
            &sets,
        );
        assert_eq!(x[0], Some(1.0));
    }

    #[test]
    fn min_mode_picks_cheaper_choice() {
        // state 0 has two choices with different Q values; min mode
        // (adversary) should pick the smaller one.
        let matrix = SparseMatrix::build(
            1,
            0,
            vec![vec![
                SparseChoice {
                    action_reward: 0,
                    transitions: vec![(0, 1.0, 0)],
                },
                SparseChoice {
                    action_reward: 0,
                    transitions: vec![(0, 1.0, 0)],
                },
            ]],
        )
        .unwrap();
        let sets = OneZeroSets::new(StateSet::empty(1), StateSet::empty(1)).unwrap();
        let mut ring = LevelRing::new(0, 1);
        ring.store_level_zero(&[0.7]);
        let x = step(
            &matrix,
            &[0],
            &ring,
            0,
            OptimizationMode::Min,
            BoundMode::Lower,
            &sets,
        );
        // both choices identical here, sanity check the aggregation runs
        assert_abs_diff_eq!(x[0].unwrap(), 0.7, epsilon = 1e-9);
    }
}
