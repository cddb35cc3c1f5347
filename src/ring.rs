//! Level Ring: a rolling window of `W+1` dense vectors indexed by
//! cumulative reward level. Owned by the driver for the duration of one
//! solve call.

/// A read-only view of the vector at some level: either a materialised
/// slot, or the implicit zero vector used for levels below `0`
/// ("indexing with `ℓ < 0` returns the zero vector by convention").
pub enum LevelView<'a> {
    Zero,
    Occupied(&'a [f64]),
}

impl<'a> LevelView<'a> {
    #[inline]
    pub fn get(&self, state: usize) -> f64 {
        match self {
            LevelView::Zero => 0.0,
            LevelView::Occupied(v) => v[state],
        }
    }
}

/// Rolling window of `window + 1` dense vectors. Only levels
/// `max(0, i - window) ..= i` are ever materialised, where `i` is the
/// current logical level.
pub struct LevelRing {
    slots: Vec<Vec<f64>>,
    window: u64,
    /// Logical level of the most recently advanced slot; `-1` before
    /// any level has been stored.
    current: i64,
}

impl LevelRing {
    /// Allocates a ring over `n` states with room for `window + 1`
    /// levels.
    pub fn new(window: u64, n: usize) -> Self {
        LevelRing {
            slots: vec![vec![0.0; n]; (window + 1) as usize],
            window,
            current: -1,
        }
    }

    fn slot_index(&self, level: i64) -> usize {
        (level.rem_euclid(self.window as i64 + 1)) as usize
    }

    /// Copies `v` into level 0, the seed for the outer iteration.
    pub fn store_level_zero(&mut self, v: &[f64]) {
        let idx = self.slot_index(0);
        self.slots[idx].copy_from_slice(v);
        self.current = 0;
    }

    /// Advances the logical level by one, returning the new level `i`.
    /// The slot that now corresponds to level `i` still holds whatever
    /// was written `window + 1` levels ago (level `i - (window + 1)`,
    /// no longer reachable) until [`Self::write_current`] overwrites
    /// it. Split from the write so callers can read levels `< i` (via
    /// [`Self::get`]) while computing level `i`'s vector without
    /// holding a mutable borrow of the ring — the positive-reward step
    /// never needs to read level `i` itself, since `T⁺` choices carry
    /// strictly positive reward.
    pub fn advance(&mut self) -> i64 {
        self.current += 1;
        self.current
    }

    /// Overwrites the slot at the current level with `values`. Must be
    /// called once per [`Self::advance`] before that level is read.
    pub fn write_current(&mut self, values: &[f64]) {
        let idx = self.slot_index(self.current);
        self.slots[idx].copy_from_slice(values);
    }

    /// The current logical level `i`.
    pub fn level(&self) -> i64 {
        self.current
    }

    /// Returns a view of the vector at `level`. Levels below zero yield
    /// the implicit zero vector; levels older than `current - window`
    /// are undefined by the recurrence and must not be requested.
    pub fn get(&self, level: i64) -> LevelView<'_> {
        if level < 0 {
            return LevelView::Zero;
        }
        debug_assert!(
            level > self.current - self.window as i64 - 1,
            "level {level} has fallen out of the ring window (current={})",
            self.current
        );
        let idx = self.slot_index(level);
        LevelView::Occupied(&self.slots[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_levels_are_zero() {
        let ring = LevelRing::new(3, 2);
        let view = ring.get(-1);
        assert_eq!(view.get(0), 0.0);
        assert_eq!(view.get(1), 0.0);
    }

    #[test]
    fn store_level_zero_then_advance() {
        let mut ring = LevelRing::new(2, 2);
        ring.store_level_zero(&[0.1, 0.9]);
        assert_eq!(ring.get(0).get(0), 0.1);
        assert_eq!(ring.get(0).get(1), 0.9);

        let level = ring.advance();
        ring.write_current(&[0.2, 0.8]);
        assert_eq!(level, 1);
        assert_eq!(ring.level(), 1);
        assert_eq!(ring.get(1).get(0), 0.2);
        // level 0 is still within the window and remains readable
        assert_eq!(ring.get(0).get(0), 0.1);
    }

    #[test]
    fn wraps_around_window() {
        let mut ring = LevelRing::new(1, 1); // window=1, two slots
        ring.store_level_zero(&[1.0]);
        ring.advance();
        ring.write_current(&[2.0]); // level 1
        ring.advance();
        ring.write_current(&[3.0]); // level 2, overwrites level 0's slot
        assert_eq!(ring.get(2).get(0), 3.0);
        assert_eq!(ring.get(1).get(0), 2.0);
    }

    /// The driver sizes its ring from `max(vectors.window(),
    /// matrices.*.max_window())`, so a matrix that merely advertises a
    /// larger window than its transitions actually need must not change
    /// which level a decision lands on.
    #[test]
    fn window_independence_decisions_match_across_advertised_window() {
        use crate::config::SolverConfig;
        use crate::driver::{solve_quantiles, QuantileMatrices};
        use crate::mode::{BoundMode, OptimizationMode};
        use crate::store::sparse::{SparseChoice, SparseMatrix};
        use crate::threshold::{QuantileValue, ThresholdOp};
        use crate::vectors::{ModelVectors, OneZeroSets, StateSet};

        fn run(advertised_window: u64) -> Vec<QuantileValue> {
            let plus = SparseMatrix::build(
                2,
                advertised_window,
                vec![
                    vec![SparseChoice {
                        action_reward: 0,
                        transitions: vec![(1, 1.0, 3)],
                    }],
                    vec![],
                ],
            )
            .unwrap();
            let zero = SparseMatrix::build(2, advertised_window, vec![vec![], vec![]]).unwrap();
            let sets =
                OneZeroSets::new(StateSet::from_states(2, [1]), StateSet::empty(2)).unwrap();
            let vectors = ModelVectors {
                state_rewards: vec![0, 0],
                max_reward: vec![3, 0],
                base: vec![0.0, 1.0],
                infinity: vec![1.0, 1.0],
                sets,
            };
            let config = SolverConfig::default();

            solve_quantiles(
                QuantileMatrices { plus: &plus, zero: &zero },
                &vectors,
                &[0],
                ThresholdOp::Geq,
                &[1.0],
                OptimizationMode::Max,
                BoundMode::Lower,
                &config,
                None,
            )
            .unwrap()
        }

        // true window is 3 (the only transition reward); advertising 10
        // instead must not move the decided level.
        assert_eq!(run(3), run(10));
    }
}
