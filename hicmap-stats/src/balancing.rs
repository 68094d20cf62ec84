//! Matrix balancing: Knight–Ruiz and iterative correction.
//!
//! Both balancers find a bias vector `b` such that `diag(b) M diag(b)` has
//! (near-)equal row sums. Bins whose row sum is zero carry no information
//! and are excluded; their bias is reported as 0 and their rows stay zero.
//!
//! Reaching the iteration cap is not fatal. The last iterate is used and a
//! [`Diagnostic::NonConvergence`] is attached to the result.

use hicmap_core::{Diagnostic, HicError, Result};
use hicmap_matrix::linalg;
use hicmap_matrix::{ContactMatrix, DenseMatrix, SparseMatrix};

use crate::normalization::{IcOptions, KrOptions};

/// Largest entry a balanced matrix may hold before balancing is declared
/// divergent.
pub const DIVERGENCE_BOUND: f64 = 1e10;

/// Relative asymmetry above which iterative correction refuses a matrix.
pub const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Result of a balancing run.
#[derive(Debug, Clone, PartialEq)]
pub struct Balanced {
    /// Balanced matrix in the input's layout.
    pub matrix: ContactMatrix,
    /// Per-bin bias, 0 for excluded bins.
    pub bias: Vec<f64>,
    /// Passes performed.
    pub iterations: usize,
    pub converged: bool,
    /// Set when the iteration cap was reached.
    pub warning: Option<Diagnostic>,
}

impl Balanced {
    fn finish(
        method: &'static str,
        matrix: ContactMatrix,
        bias: Vec<f64>,
        iterations: usize,
        converged: bool,
        residual: f64,
    ) -> Self {
        let warning = if converged {
            log::info!("[{method}] converged after {iterations} iterations (residual {residual:e})");
            None
        } else {
            let diagnostic = Diagnostic::NonConvergence {
                method,
                iterations,
                residual,
            };
            diagnostic.log();
            Some(diagnostic)
        };
        Self {
            matrix,
            bias,
            iterations,
            converged,
            warning,
        }
    }
}

/// Seeded xorshift generator for the KR starting vector.
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in the open interval (0, 1).
    fn next_open01(&mut self) -> f64 {
        ((self.next_u64() >> 11) as f64 + 0.5) / (1u64 << 53) as f64
    }
}

/// Knight–Ruiz balancing by Newton iteration.
///
/// Starting from a random positive vector `x`, each pass solves
/// `(diag(x) M + diag(M x)) δ = x ∘ (M x) − 1` and sets `x ← x − δ`, until
/// `max |δ| < tolerance`. The balanced matrix is `diag(x) M diag(x)`.
///
/// A singular Newton system or a non-finite iterate is a
/// [`HicError::Divergence`].
pub fn kr_balance(matrix: &ContactMatrix, opts: &KrOptions) -> Result<Balanced> {
    let n = matrix.n();
    let dense = matrix.to_dense();
    let keep: Vec<usize> = dense
        .row_sums()
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s != 0.0)
        .map(|(i, _)| i)
        .collect();
    let m = dense.select(&keep);
    let k = keep.len();
    log::debug!("[KR] balancing {k} of {n} bins");

    let mut rng = Xorshift64::new(opts.seed);
    let mut x: Vec<f64> = (0..k).map(|_| rng.next_open01()).collect();

    let mut converged = k == 0;
    let mut iterations = 0;
    let mut residual = 0.0f64;
    while !converged && iterations < opts.max_iteration {
        iterations += 1;
        let mx = m.matvec(&x);

        let mut jacobian = DenseMatrix::zeros(k);
        for i in 0..k {
            for j in 0..k {
                jacobian[(i, j)] = x[i] * m[(i, j)];
            }
            jacobian[(i, i)] += mx[i];
        }
        let rhs: Vec<f64> = x.iter().zip(&mx).map(|(xi, mxi)| xi * mxi - 1.0).collect();

        let delta = linalg::solve(&jacobian, &rhs).ok_or_else(|| {
            HicError::Divergence(format!("KR Newton system is singular at iteration {iterations}"))
        })?;
        residual = delta.iter().fold(0.0f64, |acc, d| acc.max(d.abs()));
        for (xi, di) in x.iter_mut().zip(&delta) {
            *xi -= di;
        }
        if !residual.is_finite() || x.iter().any(|v| !v.is_finite()) {
            return Err(HicError::Divergence(format!(
                "KR produced a non-finite scaling vector at iteration {iterations}"
            )));
        }
        log::debug!("[KR] iteration {iterations}: max step {residual:e}");
        converged = residual < opts.tolerance;
    }

    let mut balanced = m;
    for i in 0..k {
        for j in 0..k {
            balanced[(i, j)] *= x[i] * x[j];
        }
    }
    let full = balanced.scatter(n, &keep);
    let mut bias = vec![0.0; n];
    for (&bin, &xi) in keep.iter().zip(&x) {
        bias[bin] = xi;
    }

    let matrix = match matrix {
        ContactMatrix::Dense(_) => ContactMatrix::Dense(full),
        ContactMatrix::Sparse(_) => ContactMatrix::Sparse(SparseMatrix::from_dense(&full, 0.0)),
    };
    Ok(Balanced::finish("KR", matrix, bias, iterations, converged, residual))
}

/// Iterative correction.
///
/// Each pass divides `M[i, j]` by `s_i s_j`, where `s` is the row-sum vector
/// scaled to unit mean over non-empty rows, and accumulates `s` into the
/// bias. Iteration stops once `max |s − 1| < tolerance`. The final bias is
/// rescaled to unit mean over non-empty bins, and the matrix by the square
/// of that factor.
///
/// NaN entries are treated as zero. The matrix must be symmetric to within
/// [`SYMMETRY_TOLERANCE`].
pub fn ic_balance(matrix: &ContactMatrix, opts: &IcOptions) -> Result<Balanced> {
    let n = matrix.n();
    let mut w = matrix.to_sparse();
    let (_, _, values) = w.parts_mut();
    let mut nan_count = 0usize;
    for v in values.iter_mut().filter(|v| v.is_nan()) {
        *v = 0.0;
        nan_count += 1;
    }
    if nan_count > 0 {
        log::warn!("[IC] {nan_count} NaN entries replaced by zero");
    }

    let w = ContactMatrix::Sparse(w);
    let asymmetry = w.asymmetry();
    if asymmetry > SYMMETRY_TOLERANCE {
        return Err(HicError::Symmetry { asymmetry });
    }
    let mut w = w.into_sparse();

    let mut bias = vec![1.0; n];
    let mut converged = false;
    let mut iterations = 0;
    let mut residual = 0.0f64;
    while iterations < opts.max_iteration {
        iterations += 1;
        let mut s = w.row_sums();
        let (total, count) = s
            .iter()
            .filter(|&&v| v != 0.0)
            .fold((0.0f64, 0usize), |(t, c), v| (t + v, c + 1));
        if count == 0 {
            bias.iter_mut().for_each(|b| *b = 0.0);
            converged = true;
            break;
        }
        let mean = total / count as f64;

        residual = 0.0;
        for (si, bi) in s.iter_mut().zip(bias.iter_mut()) {
            if *si == 0.0 {
                *bi = 0.0;
                *si = 1.0;
            } else {
                *si /= mean;
                *bi *= *si;
                residual = residual.max((*si - 1.0).abs());
            }
        }

        rescale(&mut w, &s);
        check_bound(&w, iterations)?;
        log::debug!("[IC] iteration {iterations}: max deviation {residual:e}");
        if residual < opts.tolerance {
            converged = true;
            break;
        }
    }

    let (total, count) = bias
        .iter()
        .filter(|&&b| b != 0.0)
        .fold((0.0f64, 0usize), |(t, c), b| (t + b, c + 1));
    if count > 0 {
        let corr = total / count as f64;
        bias.iter_mut().for_each(|b| *b /= corr);
        let (_, _, values) = w.parts_mut();
        values.iter_mut().for_each(|v| *v *= corr * corr);
        check_bound(&w, iterations)?;
    }

    let matrix = ContactMatrix::Sparse(w).into_layout(matrix.layout());
    Ok(Balanced::finish("IC", matrix, bias, iterations, converged, residual))
}

/// Divide every stored `W[r, c]` by `s_r s_c`.
fn rescale(w: &mut SparseMatrix, s: &[f64]) {
    let (rows, cols, values) = w.parts_mut();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        values
            .par_iter_mut()
            .zip(rows.par_iter().zip(cols.par_iter()))
            .for_each(|(v, (&r, &c))| *v /= s[r] * s[c]);
    }
    #[cfg(not(feature = "parallel"))]
    for (v, (&r, &c)) in values.iter_mut().zip(rows.iter().zip(cols)) {
        *v /= s[r] * s[c];
    }
}

fn check_bound(w: &SparseMatrix, iteration: usize) -> Result<()> {
    match w.iter().find(|&(_, _, v)| v > DIVERGENCE_BOUND) {
        Some((r, c, v)) => Err(HicError::Divergence(format!(
            "IC entry ({r}, {c}) reached {v:e} at iteration {iteration}"
        ))),
        None => Ok(()),
    }
}
