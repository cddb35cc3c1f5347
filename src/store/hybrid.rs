//! Hybrid symbolic/sparse back-end for [`super::TransitionMatrix`].
//! `T⁺`/`T⁰` are each a vector of per-action decision diagrams; rather
//! than the reference-counted node graph of a CUDD-style MTBDD library,
//! nodes live in an explicit arena and are addressed by [`NodeId`]
//! index — recursion walks indices, never pointers. The lower layers of
//! each diagram are materialised as one of two sparse block formats: an
//! explicit dense vector, or a dictionary of distinct values with
//! packed indices.

use super::{Successor, TransitionMatrix};
use crate::error::QuantileError;

pub type NodeId = usize;

/// A node in a reduced decision diagram over `T`-valued terminals.
/// Internal nodes branch on one boolean variable of the encoded path;
/// terminals hold the materialised value for every path reaching them.
#[derive(Debug, Clone)]
pub enum Node<T> {
    Internal {
        var: usize,
        low: NodeId,
        high: NodeId,
    },
    Terminal(T),
}

/// A materialised row of successor probabilities: the lower layer of a
/// probability diagram once descent has resolved the full `(state,
/// action)` row.
#[derive(Debug, Clone)]
pub enum SuccBlock {
    /// One probability entry per successor state, zero meaning "no
    /// transition".
    Dense(Vec<f64>),
    /// A dictionary of distinct probabilities plus one packed index per
    /// successor state (index `0` conventionally denotes "no
    /// transition", i.e. `distincts[0] == 0.0`).
    Compact {
        distincts: Vec<f64>,
        indices: Vec<u16>,
    },
}

impl SuccBlock {
    fn probability(&self, successor: usize) -> f64 {
        match self {
            SuccBlock::Dense(v) => v.get(successor).copied().unwrap_or(0.0),
            SuccBlock::Compact { distincts, indices } => indices
                .get(successor)
                .map(|&i| distincts[i as usize])
                .unwrap_or(0.0),
        }
    }

    fn num_successors(&self) -> usize {
        match self {
            SuccBlock::Dense(v) => v.len(),
            SuccBlock::Compact { indices, .. } => indices.len(),
        }
    }

    fn is_enabled(&self) -> bool {
        match self {
            SuccBlock::Dense(v) => v.iter().any(|&p| p > 0.0),
            SuccBlock::Compact { distincts, indices } => {
                indices.iter().any(|&i| distincts[i as usize] > 0.0)
            }
        }
    }
}

/// The materialised row of per-transition rewards aligned to a
/// [`SuccBlock`], analogous in shape but carrying integer rewards.
#[derive(Debug, Clone)]
pub enum RewardBlock {
    /// Every transition in this row has reward zero; avoids
    /// materialising a vector for the common case.
    Zero,
    Dense(Vec<u64>),
    Compact {
        distincts: Vec<u64>,
        indices: Vec<u16>,
    },
}

impl RewardBlock {
    fn reward(&self, successor: usize) -> u64 {
        match self {
            RewardBlock::Zero => 0,
            RewardBlock::Dense(v) => v.get(successor).copied().unwrap_or(0),
            RewardBlock::Compact { distincts, indices } => indices
                .get(successor)
                .map(|&i| distincts[i as usize])
                .unwrap_or(0),
        }
    }
}

type ProbNode = Node<SuccBlock>;
type RewardDdNode = Node<RewardBlock>;
type ScalarNode = Node<f64>;

/// Walks a decision diagram from `root`, following `bit_at(var)` at
/// every internal node, until it reaches a terminal.
fn descend<'a, T>(nodes: &'a [Node<T>], root: NodeId, bit_at: &dyn Fn(usize) -> bool) -> &'a T {
    match &nodes[root] {
        Node::Terminal(value) => value,
        Node::Internal { var, low, high } => {
            let next = if bit_at(*var) { *high } else { *low };
            descend(nodes, next, bit_at)
        }
    }
}

fn state_bit(state: usize, var: usize) -> bool {
    (state >> var) & 1 == 1
}

/// Per-syntactic-action decision diagram: one materialised successor
/// row per state for which the action is enabled, plus the two reward
/// sources needed to compute `r_ta` and `r_tsa`.
#[derive(Debug, Clone)]
pub struct ActionDiagram {
    prob_nodes: Vec<ProbNode>,
    prob_root: NodeId,
    reward_nodes: Vec<RewardDdNode>,
    reward_root: Option<NodeId>,
    /// The action-reward source, over row (state) variables plus
    /// `abstracted_vars` extra nondeterminism variables that must
    /// project to a single constant per state.
    action_reward_nodes: Vec<ScalarNode>,
    action_reward_root: Option<NodeId>,
    abstracted_vars: usize,
    row_vars: usize,
}

impl ActionDiagram {
    fn enabled_at(&self, state: usize) -> bool {
        let block = descend(&self.prob_nodes, self.prob_root, &|var| state_bit(state, var));
        block.is_enabled()
    }

    fn foreach_successor_at(&self, state: usize, visit: &mut dyn FnMut(Successor)) {
        let block = descend(&self.prob_nodes, self.prob_root, &|var| state_bit(state, var));
        let reward_block = self
            .reward_root
            .map(|root| descend(&self.reward_nodes, root, &|var| state_bit(state, var)));

        for succ in 0..block.num_successors() {
            let probability = block.probability(succ);
            if probability <= 0.0 {
                continue;
            }
            let trans_reward = reward_block.as_ref().map(|b| b.reward(succ)).unwrap_or(0);
            visit(Successor {
                successor: succ,
                probability,
                trans_reward,
            });
        }
    }

    /// Projects the action-reward source for `state`, abstracting out
    /// the extra nondeterminism variables. Fails if the projection does
    /// not collapse to a single constant, or if that constant is not an
    /// integer. `choice` is the caller's index of this diagram among the
    /// choices enabled at `state`, reported in the error on failure.
    fn action_reward_at(&self, state: usize, choice: usize) -> Result<u64, QuantileError> {
        let Some(root) = self.action_reward_root else {
            return Ok(0);
        };

        let mut seen: Option<f64> = None;
        for extra in 0..(1u64 << self.abstracted_vars) {
            let value = *descend(&self.action_reward_nodes, root, &|var| {
                if var < self.row_vars {
                    state_bit(state, var)
                } else {
                    (extra >> (var - self.row_vars)) & 1 == 1
                }
            });
            match seen {
                None => seen = Some(value),
                Some(prev) if (prev - value).abs() > 1e-9 => {
                    return Err(QuantileError::NonConstantActionReward { state, choice });
                }
                _ => {}
            }
        }

        let value = seen.unwrap_or(0.0);
        if value.fract() != 0.0 || value < 0.0 {
            return Err(QuantileError::NonIntegerReward(value));
        }
        Ok(value as u64)
    }
}

/// Hybrid back-end: `T⁺`/`T⁰` as a vector of per-action decision
/// diagrams whose lower layers are materialised sparse blocks.
#[derive(Debug, Clone)]
pub struct HybridMatrix {
    n: usize,
    window: u64,
    actions: Vec<ActionDiagram>,
    /// For each state, the ids (into `actions`) of the diagrams enabled
    /// there, computed once at construction — the hybrid back-end's
    /// analogue of the sparse back-end's `row_offsets`.
    enabled: Vec<Vec<usize>>,
    action_rewards: Vec<Vec<u64>>,
}

impl HybridMatrix {
    /// Builds a hybrid matrix from a set of per-action diagrams,
    /// deriving the per-(state, choice) action rewards once up front.
    pub fn build(n: usize, window: u64, actions: Vec<ActionDiagram>) -> Result<Self, QuantileError> {
        let mut enabled = vec![Vec::new(); n];
        let mut action_rewards = vec![Vec::new(); n];

        for (action_id, diagram) in actions.iter().enumerate() {
            for state in 0..n {
                if diagram.enabled_at(state) {
                    let choice = enabled[state].len();
                    enabled[state].push(action_id);
                    action_rewards[state].push(diagram.action_reward_at(state, choice)?);
                }
            }
        }

        Ok(HybridMatrix {
            n,
            window,
            actions,
            enabled,
            action_rewards,
        })
    }
}

impl TransitionMatrix for HybridMatrix {
    fn num_states(&self) -> usize {
        self.n
    }

    fn max_window(&self) -> u64 {
        self.window
    }

    fn num_choices(&self, state: usize) -> usize {
        self.enabled[state].len()
    }

    fn action_reward(&self, state: usize, choice: usize) -> u64 {
        self.action_rewards[state][choice]
    }

    fn foreach_successor(&self, state: usize, choice: usize, visit: &mut dyn FnMut(Successor)) {
        let action_id = self.enabled[state][choice];
        self.actions[action_id].foreach_successor_at(state, visit);
    }
}

/// Builder helpers for constructing small, fully materialised
/// [`ActionDiagram`]s without hand-indexing the node arena — mirrors
/// how a real symbolic engine would derive the diagram from an
/// underlying model encoding, collapsed here to explicit per-state
/// successor rows since that external encoding is out of scope.
pub struct ActionDiagramBuilder {
    row_vars: usize,
}

impl ActionDiagramBuilder {
    pub fn new(n_states: usize) -> Self {
        let row_vars = if n_states <= 1 {
            1
        } else {
            (usize::BITS - (n_states - 1).leading_zeros()) as usize
        };
        ActionDiagramBuilder { row_vars }
    }

    /// Builds a diagram from one explicit successor row per state (a
    /// row of all zero probabilities means the action is not enabled
    /// there), plus one reward row and one action-reward value per
    /// state. The action reward carries no abstracted nondeterminism
    /// variables, so it is always constant per state by construction.
    pub fn build(
        &self,
        rows: Vec<Vec<f64>>,
        reward_rows: Vec<Vec<u64>>,
        action_rewards: Vec<u64>,
    ) -> ActionDiagram {
        let mut prob_nodes = Vec::new();
        let prob_root = build_row_tree(&mut prob_nodes, self.row_vars, &rows, |row| {
            SuccBlock::Dense(row.clone())
        });

        let any_reward = reward_rows.iter().any(|r| r.iter().any(|&x| x != 0));
        let (reward_nodes, reward_root) = if any_reward {
            let mut nodes = Vec::new();
            let root = build_row_tree(&mut nodes, self.row_vars, &reward_rows, |row| {
                RewardBlock::Dense(row.clone())
            });
            (nodes, Some(root))
        } else {
            (Vec::new(), None)
        };

        let mut action_reward_nodes = Vec::new();
        let action_reward_root = if action_rewards.iter().any(|&r| r != 0) {
            Some(build_scalar_tree(
                &mut action_reward_nodes,
                self.row_vars,
                &action_rewards,
            ))
        } else {
            None
        };

        ActionDiagram {
            prob_nodes,
            prob_root,
            reward_nodes,
            reward_root,
            action_reward_nodes,
            action_reward_root,
            abstracted_vars: 0,
            row_vars: self.row_vars,
        }
    }

    /// Builds a diagram whose action reward is sourced over `row_vars`
    /// state bits plus `abstracted_vars` extra nondeterminism bits that
    /// [`ActionDiagram::action_reward_at`] must abstract out by
    /// projection. `action_reward_rows[state]` holds one entry per
    /// assignment of the abstracted bits (`2^abstracted_vars` of them,
    /// low bit first); entries that disagree across a state's row make
    /// the projection non-constant, and fractional entries make it
    /// non-integer — both genuinely reachable outcomes, unlike
    /// [`Self::build`]'s always-constant, always-integral rewards.
    pub fn build_with_abstracted_vars(
        &self,
        rows: Vec<Vec<f64>>,
        reward_rows: Vec<Vec<u64>>,
        abstracted_vars: usize,
        action_reward_rows: Vec<Vec<f64>>,
    ) -> ActionDiagram {
        let mut prob_nodes = Vec::new();
        let prob_root = build_row_tree(&mut prob_nodes, self.row_vars, &rows, |row| {
            SuccBlock::Dense(row.clone())
        });

        let any_reward = reward_rows.iter().any(|r| r.iter().any(|&x| x != 0));
        let (reward_nodes, reward_root) = if any_reward {
            let mut nodes = Vec::new();
            let root = build_row_tree(&mut nodes, self.row_vars, &reward_rows, |row| {
                RewardBlock::Dense(row.clone())
            });
            (nodes, Some(root))
        } else {
            (Vec::new(), None)
        };

        let mut action_reward_nodes = Vec::new();
        let action_reward_root = Some(build_action_reward_tree(
            &mut action_reward_nodes,
            self.row_vars,
            abstracted_vars,
            &action_reward_rows,
        ));

        ActionDiagram {
            prob_nodes,
            prob_root,
            reward_nodes,
            reward_root,
            action_reward_nodes,
            action_reward_root,
            abstracted_vars,
            row_vars: self.row_vars,
        }
    }
}

/// Builds a binary tree over `row_vars` state-index bits, one
/// terminal block per state, produced from a per-row value via `mk`.
fn build_row_tree<T, R: Clone>(
    nodes: &mut Vec<Node<T>>,
    row_vars: usize,
    rows: &[R],
    mk: impl Fn(&R) -> T + Copy,
) -> NodeId {
    build_subtree(nodes, 0, row_vars, &|state| mk(&rows[state]))
}

fn build_subtree<T>(
    nodes: &mut Vec<Node<T>>,
    prefix: usize,
    remaining_vars: usize,
    leaf_for: &dyn Fn(usize) -> T,
) -> NodeId {
    if remaining_vars == 0 {
        nodes.push(Node::Terminal(leaf_for(prefix)));
        return nodes.len() - 1;
    }
    let var = remaining_vars - 1;
    let low = build_subtree(nodes, prefix, var, leaf_for);
    let high = build_subtree(nodes, prefix | (1 << var), var, leaf_for);
    nodes.push(Node::Internal { var, low, high });
    nodes.len() - 1
}

fn build_scalar_tree(nodes: &mut Vec<ScalarNode>, row_vars: usize, values: &[u64]) -> NodeId {
    build_subtree(nodes, 0, row_vars, &|state| {
        values.get(state).copied().unwrap_or(0) as f64
    })
}

/// Builds a tree over `row_vars + abstracted_vars` bits: the low
/// `row_vars` select the state's row in `action_reward_rows`, the
/// remaining `abstracted_vars` select an entry within that row.
fn build_action_reward_tree(
    nodes: &mut Vec<ScalarNode>,
    row_vars: usize,
    abstracted_vars: usize,
    action_reward_rows: &[Vec<f64>],
) -> NodeId {
    build_subtree(nodes, 0, row_vars + abstracted_vars, &|path| {
        let state = path & ((1 << row_vars) - 1);
        let extra = path >> row_vars;
        action_reward_rows
            .get(state)
            .and_then(|row| row.get(extra))
            .copied()
            .unwrap_or(0.0)
    })
}
