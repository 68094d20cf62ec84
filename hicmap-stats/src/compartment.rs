//! A/B compartment signal from the spectrum of a normalized Laplacian.
//!
//! The contact map is first normalized by observed/expected so that
//! distance decay does not dominate. Bins without contacts are removed, the
//! symmetric normalized Laplacian `L = I − D^{-1/2} M D^{-1/2}` is
//! diagonalized, and eigenvector `k` (ascending eigenvalue order) is
//! returned with zeros reinserted for removed bins. Eigenvector 0 is the
//! trivial mode proportional to `√degree` and is never returned.

use hicmap_core::{HicError, Result};
use hicmap_matrix::linalg::symmetric_eigen;
use hicmap_matrix::{ContactMatrix, DenseMatrix};

use crate::normalization::observed_expected_dense;

/// Eigenvector indices accepted by [`compartments`].
pub const EIGENVECTOR_INDICES: [usize; 2] = [1, 2];

/// Eigendecomposition details behind a compartment vector.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompartmentAnalysis {
    /// Compartment signal, one value per bin, 0 for removed bins.
    pub vector: Vec<f64>,
    /// Laplacian eigenvalues of the reduced matrix, ascending.
    pub eigenvalues: Vec<f64>,
    /// Bins kept after removing empty rows.
    pub kept: Vec<usize>,
}

/// Compartment signal from Laplacian eigenvector `k` (1 or 2).
pub fn compartments(matrix: &ContactMatrix, k: usize) -> Result<Vec<f64>> {
    compartment_analysis(matrix, k).map(|analysis| analysis.vector)
}

/// As [`compartments`], also returning the spectrum and kept bins.
///
/// The sign of the vector is fixed so that its largest-magnitude entry is
/// positive. The full spectrum is computed by
/// [`symmetric_eigen`], so runtime grows cubically with the number of kept
/// bins.
pub fn compartment_analysis(matrix: &ContactMatrix, k: usize) -> Result<CompartmentAnalysis> {
    if !EIGENVECTOR_INDICES.contains(&k) {
        return Err(HicError::Config(format!(
            "eigenvector index must be 1 or 2, got {k}"
        )));
    }

    let oe = observed_expected_dense(matrix);
    let n = oe.n();
    let sums = oe.row_sums();
    let kept: Vec<usize> = (0..n).filter(|&i| sums[i] != 0.0).collect();
    if kept.len() <= k {
        return Err(HicError::InvalidInput(format!(
            "{} bins with contacts; eigenvector {k} needs at least {}",
            kept.len(),
            k + 1
        )));
    }
    log::debug!("compartments: {} of {n} bins kept", kept.len());

    let reduced = oe.select(&kept);
    let inv_sqrt: Vec<f64> = kept.iter().map(|&i| 1.0 / sums[i].sqrt()).collect();
    let laplacian = normalized_laplacian(&reduced, &inv_sqrt);

    let eigen = symmetric_eigen(&laplacian);
    let mut signal = eigen.vector(k);
    orient(&mut signal);

    let mut vector = vec![0.0; n];
    for (&bin, &v) in kept.iter().zip(&signal) {
        vector[bin] = v;
    }
    Ok(CompartmentAnalysis {
        vector,
        eigenvalues: eigen.values,
        kept,
    })
}

/// `I − diag(d) M diag(d)`.
fn normalized_laplacian(m: &DenseMatrix, d: &[f64]) -> DenseMatrix {
    let size = m.n();
    let mut l = DenseMatrix::identity(size);
    for i in 0..size {
        for j in 0..size {
            l[(i, j)] -= d[i] * m[(i, j)] * d[j];
        }
    }
    l
}

/// Flip `v` so that its largest-magnitude entry is positive.
fn orient(v: &mut [f64]) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        v.iter_mut().for_each(|x| *x = -*x);
    }
}
