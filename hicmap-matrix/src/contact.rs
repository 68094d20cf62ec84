//! The contact matrix consumed by every pipeline stage.
//!
//! [`ContactMatrix`] is a tagged variant over the two storage layouts. Stages
//! that need a particular layout convert at their boundary with
//! [`to_dense`](ContactMatrix::to_dense) / [`to_sparse`](ContactMatrix::to_sparse);
//! both conversions are lossless.

use core::fmt;
use core::str::FromStr;

use hicmap_core::{HicError, Result, Summarizable};

use crate::dense::DenseMatrix;
use crate::sparse::SparseMatrix;

/// Storage layout of a [`ContactMatrix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Layout {
    Dense,
    #[default]
    Sparse,
}

impl FromStr for Layout {
    type Err = HicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dense" => Ok(Self::Dense),
            "sparse" => Ok(Self::Sparse),
            other => Err(HicError::Config(format!("unknown matrix layout '{other}'"))),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dense => f.write_str("dense"),
            Self::Sparse => f.write_str("sparse"),
        }
    }
}

/// A square, symmetric, non-negative matrix of contacts between genomic bins.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContactMatrix {
    Dense(DenseMatrix),
    Sparse(SparseMatrix),
}

impl ContactMatrix {
    /// Number of bins (side length).
    pub fn n(&self) -> usize {
        match self {
            Self::Dense(m) => m.n(),
            Self::Sparse(m) => m.n(),
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            Self::Dense(_) => Layout::Dense,
            Self::Sparse(_) => Layout::Sparse,
        }
    }

    /// Value at `(row, col)`, or `None` if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        match self {
            Self::Dense(m) => m.get(row, col),
            Self::Sparse(m) if row < m.n() && col < m.n() => Some(m.get(row, col)),
            Self::Sparse(_) => None,
        }
    }

    /// Dense copy of this matrix.
    pub fn to_dense(&self) -> DenseMatrix {
        match self {
            Self::Dense(m) => m.clone(),
            Self::Sparse(m) => m.to_dense(),
        }
    }

    /// Sparse copy of this matrix. Zero entries of a dense matrix are not
    /// stored; NaN and infinite entries are.
    pub fn to_sparse(&self) -> SparseMatrix {
        match self {
            Self::Dense(m) => SparseMatrix::from_dense(m, 0.0),
            Self::Sparse(m) => m.clone(),
        }
    }

    pub fn into_dense(self) -> DenseMatrix {
        match self {
            Self::Dense(m) => m,
            Self::Sparse(m) => m.to_dense(),
        }
    }

    pub fn into_sparse(self) -> SparseMatrix {
        match self {
            Self::Dense(m) => SparseMatrix::from_dense(&m, 0.0),
            Self::Sparse(m) => m,
        }
    }

    /// Convert to the requested layout (no-op if already there).
    pub fn into_layout(self, layout: Layout) -> Self {
        match layout {
            Layout::Dense => Self::Dense(self.into_dense()),
            Layout::Sparse => Self::Sparse(self.into_sparse()),
        }
    }

    pub fn row_sums(&self) -> Vec<f64> {
        match self {
            Self::Dense(m) => m.row_sums(),
            Self::Sparse(m) => m.row_sums(),
        }
    }

    /// Number of nonzero entries.
    pub fn nnz(&self) -> usize {
        match self {
            Self::Dense(m) => m.as_slice().iter().filter(|&&v| v != 0.0).count(),
            Self::Sparse(m) => m.nnz(),
        }
    }

    /// Fraction of nonzero entries, `nnz / n²`. 0 for an empty matrix.
    pub fn density(&self) -> f64 {
        let n = self.n();
        if n == 0 {
            return 0.0;
        }
        self.nnz() as f64 / (n * n) as f64
    }

    /// Relative asymmetry `mean(|M - Mᵀ|) / mean(|M|)`.
    ///
    /// Returns 0.0 for an all-zero or empty matrix.
    pub fn asymmetry(&self) -> f64 {
        let (diff, total) = match self {
            Self::Dense(m) => {
                let n = m.n();
                let mut diff = 0.0;
                let mut total = 0.0;
                for r in 0..n {
                    for c in 0..n {
                        diff += (m[(r, c)] - m[(c, r)]).abs();
                        total += m[(r, c)].abs();
                    }
                }
                (diff, total)
            }
            Self::Sparse(m) => {
                let mut diff = 0.0;
                let mut total = 0.0;
                for (r, c, v) in m.iter() {
                    total += v.abs();
                    diff += (v - m.get(c, r)).abs();
                    // |0 - v| at the unstored mirror position
                    if !m.contains(c, r) {
                        diff += v.abs();
                    }
                }
                (diff, total)
            }
        };
        // Both means share the n² denominator.
        if total == 0.0 {
            0.0
        } else {
            diff / total
        }
    }

    /// Whether [`asymmetry`](Self::asymmetry) is within `tolerance`.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        self.asymmetry() <= tolerance
    }

    /// The first `k` diagonal strata.
    ///
    /// Stratum `d` holds `M[r, r + d]` for `r = 0..n - d`, so it has `n - d`
    /// entries ordered by the smaller coordinate.
    pub fn strata(&self, k: usize) -> Result<Vec<Vec<f64>>> {
        let n = self.n();
        if k > n {
            return Err(HicError::InvalidInput(format!(
                "requested {k} strata from a {n}\u{00d7}{n} matrix"
            )));
        }
        match self {
            Self::Dense(m) => Ok((0..k).map(|d| m.diagonal(d)).collect()),
            Self::Sparse(m) => {
                let mut strata: Vec<Vec<f64>> = (0..k).map(|d| vec![0.0; n - d]).collect();
                for (r, c, v) in m.iter() {
                    if c >= r && c - r < k {
                        strata[c - r][r] = v;
                    }
                }
                Ok(strata)
            }
        }
    }
}

impl From<DenseMatrix> for ContactMatrix {
    fn from(m: DenseMatrix) -> Self {
        Self::Dense(m)
    }
}

impl From<SparseMatrix> for ContactMatrix {
    fn from(m: SparseMatrix) -> Self {
        Self::Sparse(m)
    }
}

impl Summarizable for ContactMatrix {
    fn summary(&self) -> String {
        let n = self.n();
        format!(
            "ContactMatrix ({}): {n}\u{00d7}{n} bins, {} nonzeros",
            self.layout(),
            self.nnz()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symmetric_dense() -> DenseMatrix {
        DenseMatrix::from_rows(vec![
            vec![1.0, 2.0, 0.0],
            vec![2.0, 1.0, 4.0],
            vec![0.0, 4.0, 3.0],
        ])
        .unwrap()
    }

    #[test]
    fn layout_parse() {
        assert_eq!("Dense".parse::<Layout>().unwrap(), Layout::Dense);
        assert_eq!("SPARSE".parse::<Layout>().unwrap(), Layout::Sparse);
        assert!(matches!("csr".parse::<Layout>(), Err(HicError::Config(_))));
    }

    #[test]
    fn conversions_are_lossless() {
        let dense = ContactMatrix::from(symmetric_dense());
        let sparse = dense.clone().into_layout(Layout::Sparse);
        assert_eq!(sparse.layout(), Layout::Sparse);
        assert_eq!(sparse.nnz(), 7);
        assert!((sparse.density() - 7.0 / 9.0).abs() < 1e-12);
        assert_eq!(sparse.get(1, 2), Some(4.0));
        assert_eq!(sparse.get(0, 2), Some(0.0));
        assert_eq!(sparse.get(3, 0), None);
        assert_eq!(sparse.into_layout(Layout::Dense), dense);
    }

    #[test]
    fn nan_survives_layout_round_trip() {
        let mut m = symmetric_dense();
        m[(0, 2)] = f64::NAN;
        let back = ContactMatrix::from(m).into_layout(Layout::Sparse).into_dense();
        assert!(back[(0, 2)].is_nan());
        assert_eq!(back[(1, 2)], 4.0);
    }

    #[test]
    fn row_sums_match_across_layouts() {
        let dense = ContactMatrix::from(symmetric_dense());
        let sparse = ContactMatrix::Sparse(dense.to_sparse());
        assert_eq!(dense.row_sums(), vec![3.0, 7.0, 7.0]);
        assert_eq!(sparse.row_sums(), dense.row_sums());
    }

    #[test]
    fn symmetric_matrix_has_zero_asymmetry() {
        let dense = ContactMatrix::from(symmetric_dense());
        assert_eq!(dense.asymmetry(), 0.0);
        assert!(ContactMatrix::Sparse(dense.to_sparse()).is_symmetric(1e-10));
    }

    #[test]
    fn asymmetry_agrees_across_layouts() {
        let m = DenseMatrix::from_rows(vec![vec![1.0, 0.0], vec![2.0, 1.0]]).unwrap();
        let dense = ContactMatrix::from(m);
        let sparse = ContactMatrix::Sparse(dense.to_sparse());
        // |M - Mᵀ| sums to 4, |M| sums to 4
        assert!((dense.asymmetry() - 1.0).abs() < 1e-12);
        assert!((sparse.asymmetry() - 1.0).abs() < 1e-12);
        assert!(!dense.is_symmetric(1e-10));
    }

    #[test]
    fn strata_dense_and_sparse_agree() {
        let dense = ContactMatrix::from(symmetric_dense());
        let sparse = ContactMatrix::Sparse(dense.to_sparse());
        let expected = vec![vec![1.0, 1.0, 3.0], vec![2.0, 4.0], vec![0.0]];
        assert_eq!(dense.strata(3).unwrap(), expected);
        assert_eq!(sparse.strata(3).unwrap(), expected);
        assert!(dense.strata(4).is_err());
    }

    #[test]
    fn summary() {
        let m = ContactMatrix::from(symmetric_dense());
        assert_eq!(m.summary(), "ContactMatrix (dense): 3\u{00d7}3 bins, 7 nonzeros");
    }
}
