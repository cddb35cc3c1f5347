//! Iteration Exporter: an optional sink for recording each outer-level
//! vector as the quantile driver computes it, for offline inspection.
//! Gated behind the `trace` Cargo feature; the driver itself never
//! depends on this feature being enabled, it only accepts an
//! `Option<&mut dyn IterationSink>`.

use crate::mode::BoundMode;

/// Which of the two bound vectors a recorded vector represents. Fixed
/// two-valued discriminant consumed by the trace viewer as a render
/// mode — distinct from the unboundedly climbing outer level, which is
/// a separate argument to [`IterationSink::record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorKind {
    Lower = 0,
    Upper = 1,
}

impl From<BoundMode> for VectorKind {
    fn from(bound: BoundMode) -> Self {
        match bound {
            BoundMode::Lower => VectorKind::Lower,
            BoundMode::Upper => VectorKind::Upper,
        }
    }
}

/// Receives one vector per outer iteration level. Implementors decide
/// what to do with it — write it to a file, hold it in memory, drop it.
pub trait IterationSink {
    fn record(&mut self, level: u64, vector: &[f64], kind: VectorKind);
}

/// Accumulates recorded vectors as an HTML document embedding a small
/// JS trace viewer, in the `addVector([...], type)` / `init()` format
/// used by a probabilistic model checker's trace viewer.
#[cfg(feature = "trace")]
pub struct HtmlTraceWriter {
    body: String,
}

#[cfg(feature = "trace")]
impl HtmlTraceWriter {
    pub fn new() -> Self {
        HtmlTraceWriter {
            body: String::new(),
        }
    }

    /// Renders the accumulated trace as a standalone HTML document.
    pub fn finish(self) -> String {
        format!(
            "<html><head><script>\n{}\ninit();\n</script></head><body></body></html>\n",
            self.body
        )
    }
}

#[cfg(feature = "trace")]
impl Default for HtmlTraceWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "trace")]
impl IterationSink for HtmlTraceWriter {
    /// `level` selects ordering only; the viewer's `addVector` format
    /// carries no per-vector level field, so it is not written to the
    /// body here. The second argument is `kind as u8`, the fixed
    /// `{0, 1}` render-mode discriminant the viewer expects.
    fn record(&mut self, _level: u64, vector: &[f64], kind: VectorKind) {
        let values = vector
            .iter()
            .map(|v| format!("{v}"))
            .collect::<Vec<_>>()
            .join(",");
        self.body
            .push_str(&format!("addVector([{values}], {});\n", kind as u8));
    }
}

#[cfg(all(test, feature = "trace"))]
mod tests {
    use super::*;

    #[test]
    fn records_vectors_in_order() {
        let mut writer = HtmlTraceWriter::new();
        writer.record(0, &[0.0, 1.0], VectorKind::Lower);
        writer.record(1, &[0.2, 0.8], VectorKind::Lower);
        let html = writer.finish();
        assert!(html.contains("addVector([0,1], 0);"));
        assert!(html.contains("addVector([0.2,0.8], 0);"));
        assert!(html.trim_end().ends_with("</html>"));
        assert!(html.contains("init();"));
    }

    #[test]
    fn kind_discriminant_is_fixed_regardless_of_level() {
        let mut writer = HtmlTraceWriter::new();
        // level climbs unboundedly across many calls, but the type slot
        // must stay within {0, 1} throughout.
        for level in 0..5u64 {
            writer.record(level, &[0.5], VectorKind::Upper);
        }
        let html = writer.finish();
        assert!(!html.contains(", 2)"));
        assert_eq!(html.matches("addVector([0.5], 1);").count(), 5);
    }
}
