use crate::error::QuantileError;

/// A threshold comparison operator, parsed once from its string form
/// and never re-parsed per state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdOp {
    Lt,
    Leq,
    Gt,
    Geq,
}

impl ThresholdOp {
    /// Evaluates `value ~ bound` for this operator.
    #[inline]
    pub fn holds(&self, value: f64, bound: f64) -> bool {
        match self {
            ThresholdOp::Lt => value < bound,
            ThresholdOp::Leq => value <= bound,
            ThresholdOp::Gt => value > bound,
            ThresholdOp::Geq => value >= bound,
        }
    }

    /// The complementary operator used by the infinity-check phase:
    /// the negation of `> p` is `≤ p`, and so on.
    #[inline]
    pub fn complement(&self) -> ThresholdOp {
        match self {
            ThresholdOp::Lt => ThresholdOp::Geq,
            ThresholdOp::Leq => ThresholdOp::Gt,
            ThresholdOp::Gt => ThresholdOp::Leq,
            ThresholdOp::Geq => ThresholdOp::Lt,
        }
    }
}

impl TryFrom<&str> for ThresholdOp {
    type Error = QuantileError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "<" => Ok(ThresholdOp::Lt),
            "<=" => Ok(ThresholdOp::Leq),
            ">" => Ok(ThresholdOp::Gt),
            ">=" => Ok(ThresholdOp::Geq),
            other => Err(QuantileError::UnknownThresholdOperator(other.to_string())),
        }
    }
}

/// The quantile result for a single state and threshold: the smallest
/// reward bound at which the threshold is satisfied, `+∞` if the
/// threshold is never satisfied, or not-yet-decided while the driver is
/// still iterating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QuantileValue {
    Decided(u64),
    Infinite,
    Undecided,
}

impl QuantileValue {
    pub fn is_decided(&self) -> bool {
        !matches!(self, QuantileValue::Undecided)
    }

    /// Renders the value in the legacy numeric format: finite bounds as
    /// `f64`, `+∞` as `f64::INFINITY`. Panics if the value is still
    /// undecided; callers must only call
    /// this after a successful `solve_quantiles` return, which never
    /// leaves a state-of-interest entry undecided.
    pub fn to_f64(self) -> f64 {
        match self {
            QuantileValue::Decided(i) => i as f64,
            QuantileValue::Infinite => f64::INFINITY,
            QuantileValue::Undecided => {
                unreachable!("undecided quantile value escaped the solver")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_operators() {
        assert_eq!(ThresholdOp::try_from("<").unwrap(), ThresholdOp::Lt);
        assert_eq!(ThresholdOp::try_from("<=").unwrap(), ThresholdOp::Leq);
        assert_eq!(ThresholdOp::try_from(">").unwrap(), ThresholdOp::Gt);
        assert_eq!(ThresholdOp::try_from(">=").unwrap(), ThresholdOp::Geq);
    }

    #[test]
    fn rejects_unknown_operator() {
        let err = ThresholdOp::try_from("!=").unwrap_err();
        assert_eq!(
            err,
            QuantileError::UnknownThresholdOperator("!=".to_string())
        );
    }

    #[test]
    fn complement_is_involution() {
        for op in [ThresholdOp::Lt, ThresholdOp::Leq, ThresholdOp::Gt, ThresholdOp::Geq] {
            assert_eq!(op.complement().complement(), op);
        }
    }

    #[test]
    fn holds_matches_semantics() {
        assert!(ThresholdOp::Geq.holds(0.5, 0.5));
        assert!(!ThresholdOp::Gt.holds(0.5, 0.5));
        assert!(ThresholdOp::Lt.holds(0.2, 0.5));
        assert!(ThresholdOp::Leq.holds(0.5, 0.5));
    }
}
