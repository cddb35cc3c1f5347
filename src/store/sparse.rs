//! Sparse, row-grouped back-end for [`super::TransitionMatrix`]. Three
//! parallel arrays per matrix — `row_offsets`, `choice_offsets`,
//! `cols`/`probs` — plus a transition-reward array that may have
//! different non-zeros than `probs` and is merged by successor column
//! at read time.

use super::{Successor, TransitionMatrix};
use crate::error::QuantileError;

/// One nondeterministic choice as supplied to [`SparseMatrix::build`]:
/// its action reward and its outgoing transitions.
#[derive(Debug, Clone)]
pub struct SparseChoice {
    pub action_reward: u64,
    /// `(successor, probability, trans_reward)` triples. Transitions
    /// with `trans_reward == 0` may be omitted entirely — the reward
    /// array is a *compatible* sparse matrix, not required to share
    /// `probs`'s non-zero pattern.
    pub transitions: Vec<(usize, f64, u64)>,
}

/// Sparse row-grouped nondeterministic matrix: `row_offsets[n+1]`
/// indexes into `choice_offsets`, which in turn indexes into
/// `cols`/`probs`. The reward array is stored separately, aligned to
/// the same choice structure but with its own non-zero pattern.
#[derive(Debug, Clone)]
pub struct SparseMatrix {
    n: usize,
    window: u64,
    row_offsets: Vec<usize>,
    action_rewards: Vec<u64>,
    choice_offsets: Vec<usize>,
    cols: Vec<usize>,
    probs: Vec<f64>,
    reward_choice_offsets: Vec<usize>,
    reward_cols: Vec<usize>,
    reward_vals: Vec<u64>,
}

impl SparseMatrix {
    /// Builds a sparse matrix from one list of choices per state.
    /// Validates that each choice's successor probabilities sum to 1.
    pub fn build(
        n: usize,
        window: u64,
        per_state_choices: Vec<Vec<SparseChoice>>,
    ) -> Result<Self, QuantileError> {
        if per_state_choices.len() != n {
            return Err(QuantileError::InvalidModel(format!(
                "expected {n} states, got {} choice lists",
                per_state_choices.len()
            )));
        }

        let mut row_offsets = Vec::with_capacity(n + 1);
        let mut action_rewards = Vec::new();
        let mut choice_offsets = vec![0usize];
        let mut cols = Vec::new();
        let mut probs = Vec::new();
        let mut reward_choice_offsets = vec![0usize];
        let mut reward_cols = Vec::new();
        let mut reward_vals = Vec::new();

        row_offsets.push(0);
        for (state, choices) in per_state_choices.into_iter().enumerate() {
            for choice in choices {
                let sum: f64 = choice.transitions.iter().map(|(_, p, _)| p).sum();
                if (sum - 1.0).abs() > 1e-9 {
                    return Err(QuantileError::InvalidModel(format!(
                        "choice probabilities for state {state} sum to {sum}, expected 1"
                    )));
                }
                action_rewards.push(choice.action_reward);
                for (succ, prob, reward) in &choice.transitions {
                    if *prob <= 0.0 || *prob > 1.0 {
                        return Err(QuantileError::InvalidModel(format!(
                            "transition probability {prob} for state {state} out of (0, 1]"
                        )));
                    }
                    cols.push(*succ);
                    probs.push(*prob);
                    if *reward != 0 {
                        reward_cols.push(*succ);
                        reward_vals.push(*reward);
                    }
                }
                choice_offsets.push(cols.len());
                reward_choice_offsets.push(reward_cols.len());
            }
            row_offsets.push(choice_offsets.len() - 1);
        }

        Ok(SparseMatrix {
            n,
            window,
            row_offsets,
            action_rewards,
            choice_offsets,
            cols,
            probs,
            reward_choice_offsets,
            reward_cols,
            reward_vals,
        })
    }

    fn choice_index(&self, state: usize, choice: usize) -> usize {
        self.row_offsets[state] + choice
    }
}

impl TransitionMatrix for SparseMatrix {
    fn num_states(&self) -> usize {
        self.n
    }

    fn max_window(&self) -> u64 {
        self.window
    }

    fn num_choices(&self, state: usize) -> usize {
        self.row_offsets[state + 1] - self.row_offsets[state]
    }

    fn action_reward(&self, state: usize, choice: usize) -> u64 {
        self.action_rewards[self.choice_index(state, choice)]
    }

    fn foreach_successor(&self, state: usize, choice: usize, visit: &mut dyn FnMut(Successor)) {
        let idx = self.choice_index(state, choice);
        let prob_range = self.choice_offsets[idx]..self.choice_offsets[idx + 1];
        let reward_range = self.reward_choice_offsets[idx]..self.reward_choice_offsets[idx + 1];
        let reward_cols = &self.reward_cols[reward_range.clone()];
        let reward_vals = &self.reward_vals[reward_range];

        for i in prob_range {
            let successor = self.cols[i];
            // merge on successor column: a transition with no reward entry contributes 0
            let trans_reward = reward_cols
                .iter()
                .position(|&c| c == successor)
                .map(|pos| reward_vals[pos])
                .unwrap_or(0);
            visit(Successor {
                successor,
                probability: self.probs[i],
                trans_reward,
            });
        }
    }
}
