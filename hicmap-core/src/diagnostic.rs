//! Non-fatal conditions surfaced alongside a completed computation.

use core::fmt;

/// A condition worth reporting that did not abort the computation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Diagnostic {
    /// An iterative solver hit its iteration cap before meeting tolerance.
    /// The last iterate was used.
    NonConvergence {
        method: &'static str,
        iterations: usize,
        residual: f64,
    },
    /// A normalization method name was not recognized; the matrix was
    /// passed through unchanged.
    UnknownMethod { name: String },
}

impl Diagnostic {
    /// Emit this diagnostic through the `log` facade at warn level.
    pub fn log(&self) {
        log::warn!("{self}");
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonConvergence {
                method,
                iterations,
                residual,
            } => write!(
                f,
                "[{method}] max {iterations} iterations reached without convergence (residual {residual:e})"
            ),
            Self::UnknownMethod { name } => write!(
                f,
                "normalization method '{name}' not in [log, power, OE, VC, VC_SQRT, KR, IC]; normalization omitted"
            ),
        }
    }
}
