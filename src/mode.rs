/// Whether the solver computes the minimum or maximum probability over
/// schedulers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationMode {
    Min,
    Max,
}

/// Lower- and upper-bound quantile variants differ only in how the
/// excluded history outside the level ring's window would be
/// surfaced; both treat an out-of-window level as contributing 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundMode {
    Lower,
    Upper,
}
