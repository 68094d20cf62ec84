//! Contact-matrix normalization.
//!
//! [`Normalization`] is a closed set of strategies, each carrying its own
//! typed options. [`normalize`] dispatches on it and returns the normalized
//! matrix in the input's layout together with any [`Diagnostic`]s raised on
//! the way. The input matrix is never modified.
//!
//! | Strategy | Transform |
//! |----------|-----------|
//! | `Log` | `log_b(M + 1)` |
//! | `Power` | `M^p` |
//! | `ObservedExpected` | `M[i,j] / mean(M[|i-j| = d])` |
//! | `Coverage` | `M[i,j] / (s_i s_j)` with row sums `s` |
//! | `CoverageSqrt` | `M[i,j] / (√s_i √s_j)` |
//! | `Kr` | Knight–Ruiz matrix balancing |
//! | `Ic` | iterative correction |

use core::fmt;
use core::str::FromStr;

use hicmap_core::{Diagnostic, HicError, Result};
use hicmap_matrix::{ContactMatrix, DenseMatrix};

use crate::balancing::{ic_balance, kr_balance};

/// Options for [`Normalization::Log`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogOptions {
    /// Logarithm base. Must be positive and not 1.
    pub base: f64,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            base: core::f64::consts::E,
        }
    }
}

/// Options for [`Normalization::Power`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PowerOptions {
    /// Exponent. Must be positive so that zeros stay zero.
    pub exponent: f64,
}

impl Default for PowerOptions {
    fn default() -> Self {
        Self { exponent: 0.5 }
    }
}

/// Options for [`Normalization::Kr`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KrOptions {
    /// Stop once every Newton step component is below this.
    pub tolerance: f64,
    pub max_iteration: usize,
    /// Seed for the random starting scaling vector.
    pub seed: u64,
}

impl Default for KrOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iteration: 50,
            seed: 42,
        }
    }
}

/// Options for [`Normalization::Ic`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IcOptions {
    /// Stop once every normalized row sum is within this of 1.
    pub tolerance: f64,
    pub max_iteration: usize,
}

impl Default for IcOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iteration: 50,
        }
    }
}

/// A normalization strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Normalization {
    Log(LogOptions),
    Power(PowerOptions),
    ObservedExpected,
    /// Vanilla coverage.
    Coverage,
    /// Square-root vanilla coverage.
    CoverageSqrt,
    Kr(KrOptions),
    Ic(IcOptions),
}

impl Normalization {
    /// Look up a strategy by name (case-insensitive) with default options.
    ///
    /// Accepted names are `log`, `power`, `oe`, `vc`, `vc_sqrt`, `kr` and `ic`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log(LogOptions::default())),
            "power" => Ok(Self::Power(PowerOptions::default())),
            "oe" => Ok(Self::ObservedExpected),
            "vc" => Ok(Self::Coverage),
            "vc_sqrt" => Ok(Self::CoverageSqrt),
            "kr" => Ok(Self::Kr(KrOptions::default())),
            "ic" => Ok(Self::Ic(IcOptions::default())),
            _ => Err(HicError::Config(format!(
                "unknown normalization method '{name}'"
            ))),
        }
    }

    /// Canonical upper-case name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Log(_) => "log",
            Self::Power(_) => "power",
            Self::ObservedExpected => "OE",
            Self::Coverage => "VC",
            Self::CoverageSqrt => "VC_SQRT",
            Self::Kr(_) => "KR",
            Self::Ic(_) => "IC",
        }
    }
}

impl FromStr for Normalization {
    type Err = HicError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A normalized matrix and the non-fatal conditions met producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub matrix: ContactMatrix,
    pub diagnostics: Vec<Diagnostic>,
}

impl Normalized {
    fn clean(matrix: ContactMatrix) -> Self {
        Self {
            matrix,
            diagnostics: Vec::new(),
        }
    }
}

/// Normalize `matrix` with `method`.
///
/// The result has the same layout as the input. Iteration caps reached by
/// the balancers are reported as [`Diagnostic::NonConvergence`], not errors.
pub fn normalize(matrix: &ContactMatrix, method: &Normalization) -> Result<Normalized> {
    log::debug!("normalizing {}\u{00d7}{} matrix with {method}", matrix.n(), matrix.n());
    match method {
        Normalization::Log(opts) => log_transform(matrix, opts).map(Normalized::clean),
        Normalization::Power(opts) => power_transform(matrix, opts).map(Normalized::clean),
        Normalization::ObservedExpected => Ok(Normalized::clean(observed_expected(matrix))),
        Normalization::Coverage => Ok(Normalized::clean(coverage(matrix, false))),
        Normalization::CoverageSqrt => Ok(Normalized::clean(coverage(matrix, true))),
        Normalization::Kr(opts) => {
            let balanced = kr_balance(matrix, opts)?;
            Ok(Normalized {
                matrix: balanced.matrix,
                diagnostics: balanced.warning.into_iter().collect(),
            })
        }
        Normalization::Ic(opts) => {
            let balanced = ic_balance(matrix, opts)?;
            Ok(Normalized {
                matrix: balanced.matrix,
                diagnostics: balanced.warning.into_iter().collect(),
            })
        }
    }
}

/// Normalize by method name.
///
/// An unrecognized name is not an error here: the matrix is returned
/// unchanged with a [`Diagnostic::UnknownMethod`].
pub fn normalize_named(matrix: &ContactMatrix, name: &str) -> Result<Normalized> {
    match Normalization::from_name(name) {
        Ok(method) => normalize(matrix, &method),
        Err(_) => {
            let diagnostic = Diagnostic::UnknownMethod {
                name: name.to_string(),
            };
            diagnostic.log();
            Ok(Normalized {
                matrix: matrix.clone(),
                diagnostics: vec![diagnostic],
            })
        }
    }
}

/// Apply `f(row, col, value)` to every entry, keeping the layout.
///
/// Sparse matrices only visit stored entries, so `f(r, c, 0.0)` must be 0.
pub(crate) fn map_entries(
    matrix: &ContactMatrix,
    f: impl Fn(usize, usize, f64) -> f64,
) -> ContactMatrix {
    match matrix {
        ContactMatrix::Dense(m) => {
            let n = m.n();
            let mut out = m.clone();
            for (idx, v) in out.as_mut_slice().iter_mut().enumerate() {
                *v = f(idx / n, idx % n, *v);
            }
            ContactMatrix::Dense(out)
        }
        ContactMatrix::Sparse(m) => ContactMatrix::Sparse(m.map_stored(f)),
    }
}

/// `log_base(M + 1)` elementwise.
pub fn log_transform(matrix: &ContactMatrix, opts: &LogOptions) -> Result<ContactMatrix> {
    let base = opts.base;
    if !(base > 0.0) || base == 1.0 || !base.is_finite() {
        return Err(HicError::Config(format!(
            "log base must be positive and not 1, got {base}"
        )));
    }
    let ln_base = base.ln();
    Ok(map_entries(matrix, |_, _, v| v.ln_1p() / ln_base))
}

/// `M^p` elementwise.
pub fn power_transform(matrix: &ContactMatrix, opts: &PowerOptions) -> Result<ContactMatrix> {
    let p = opts.exponent;
    if !(p > 0.0) || !p.is_finite() {
        return Err(HicError::Config(format!(
            "power exponent must be positive, got {p}"
        )));
    }
    Ok(map_entries(matrix, |_, _, v| v.powf(p)))
}

/// Mean contact at each genomic distance `d = |i - j|`, over all `N - d`
/// (diagonal) or `2 (N - d)` (off-diagonal) entries including zeros.
pub fn expected_by_distance(matrix: &ContactMatrix) -> Vec<f64> {
    let n = matrix.n();
    let mut sums = vec![0.0; n];
    match matrix {
        ContactMatrix::Dense(m) => {
            for r in 0..n {
                for (c, &v) in m.row(r).iter().enumerate() {
                    sums[r.abs_diff(c)] += v;
                }
            }
        }
        ContactMatrix::Sparse(m) => {
            for (r, c, v) in m.iter() {
                sums[r.abs_diff(c)] += v;
            }
        }
    }
    sums.iter()
        .enumerate()
        .map(|(d, s)| {
            let count = if d == 0 { n } else { 2 * (n - d) };
            s / count as f64
        })
        .collect()
}

/// Divide every entry by the expected contact at its distance. Distances
/// with zero expected contact are left unchanged.
pub fn observed_expected(matrix: &ContactMatrix) -> ContactMatrix {
    let expected: Vec<f64> = expected_by_distance(matrix)
        .into_iter()
        .map(|e| if e == 0.0 { 1.0 } else { e })
        .collect();
    map_entries(matrix, |r, c, v| v / expected[r.abs_diff(c)])
}

/// Vanilla coverage: divide `M[i, j]` by the product of row factors, where
/// the factor is the row sum (or its square root when `sqrt` is set). Empty
/// rows use factor 1.
pub fn coverage(matrix: &ContactMatrix, sqrt: bool) -> ContactMatrix {
    let factors: Vec<f64> = matrix
        .row_sums()
        .into_iter()
        .map(|s| match (s == 0.0, sqrt) {
            (true, _) => 1.0,
            (false, true) => s.sqrt(),
            (false, false) => s,
        })
        .collect();
    map_entries(matrix, |r, c, v| v / (factors[r] * factors[c]))
}

/// Dense observed/expected matrix, the input of the compartment analysis.
pub(crate) fn observed_expected_dense(matrix: &ContactMatrix) -> DenseMatrix {
    match observed_expected(matrix) {
        ContactMatrix::Dense(m) => m,
        sparse => sparse.into_dense(),
    }
}
