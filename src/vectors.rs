//! Model Vectors: the dense, immutable inputs to the quantile solver —
//! base probabilities, per-state rewards, the `one`/`zero` qualitative
//! partition, and the infinity vector.

use bitset_fixed::BitSet;

use crate::error::QuantileError;

/// A compact set of state indices backed by a fixed-size bitset, used
/// for the `one` and `zero` qualitative partitions. States are drawn
/// from `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSet {
    bits: BitSet,
    len: usize,
}

impl StateSet {
    /// Creates an empty set over `n` states.
    pub fn empty(n: usize) -> Self {
        StateSet {
            bits: BitSet::new(n),
            len: n,
        }
    }

    /// Builds a set from an iterator of state indices.
    pub fn from_states(n: usize, states: impl IntoIterator<Item = usize>) -> Self {
        let mut set = StateSet::empty(n);
        for s in states {
            set.insert(s);
        }
        set
    }

    pub fn insert(&mut self, state: usize) {
        assert!(state < self.len, "state {state} out of range (n={})", self.len);
        self.bits.set(state, true);
    }

    pub fn contains(&self, state: usize) -> bool {
        state < self.len && self.bits[state]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty_set(&self) -> bool {
        self.bits.count_ones() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&s| self.contains(s))
    }
}

/// The `one`/`zero` qualitative partition, computed externally and
/// consumed as input. Disjoint by construction.
#[derive(Debug, Clone)]
pub struct OneZeroSets {
    pub one: StateSet,
    pub zero: StateSet,
}

impl OneZeroSets {
    pub fn new(one: StateSet, zero: StateSet) -> Result<Self, QuantileError> {
        if one.len() != zero.len() {
            return Err(QuantileError::InvalidModel(
                "one and zero sets must be defined over the same state space".to_string(),
            ));
        }
        for s in one.iter() {
            if zero.contains(s) {
                return Err(QuantileError::InvalidModel(format!(
                    "state {s} is in both the one set and the zero set"
                )));
            }
        }
        Ok(OneZeroSets { one, zero })
    }
}

/// The dense, immutable model vectors handed to the quantile driver.
#[derive(Debug, Clone)]
pub struct ModelVectors {
    /// Per-state reward `r_s`.
    pub state_rewards: Vec<u64>,
    /// Per-state maximum single-transition cumulative reward, used to
    /// derive the window `W`.
    pub max_reward: Vec<u64>,
    /// Base vector `X_0`: the zero-reward bounded probability, seeds
    /// level 0 of the level ring.
    pub base: Vec<f64>,
    /// Infinity vector `X_∞`: optimal probability of eventually
    /// reaching the target ignoring reward bounds.
    pub infinity: Vec<f64>,
    /// The qualitative `one`/`zero` partition.
    pub sets: OneZeroSets,
}

impl ModelVectors {
    pub fn num_states(&self) -> usize {
        self.base.len()
    }

    /// Validates internal consistency: all vectors share the same
    /// length, and the `one`/`zero` sets are defined over that length.
    pub fn validate(&self) -> Result<(), QuantileError> {
        let n = self.num_states();
        if self.state_rewards.len() != n
            || self.max_reward.len() != n
            || self.infinity.len() != n
            || self.sets.one.len() != n
            || self.sets.zero.len() != n
        {
            return Err(QuantileError::InvalidModel(
                "model vectors must all share the same length as the state space".to_string(),
            ));
        }
        Ok(())
    }

    /// The window `W = max_s max_reward(s)`.
    pub fn window(&self) -> u64 {
        self.max_reward.iter().copied().max().unwrap_or(0)
    }
}
