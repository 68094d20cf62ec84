//! Coordinate-format (COO) sparse square matrix.
//!
//! [`SparseMatrix`] stores entries as `(row, col, value)` triplets, kept
//! sorted by `(row, col)` with duplicate coordinates summed. Both entries of
//! a symmetric off-diagonal pair are stored explicitly. Contact maps at fine
//! resolution are overwhelmingly zero away from the diagonal, so this is the
//! default output layout of the loader.

use hicmap_core::{HicError, Result, Summarizable};

use crate::dense::DenseMatrix;

/// A square sparse matrix in sorted COO form.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SparseMatrix {
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
    n: usize,
}

impl SparseMatrix {
    /// Create an empty `n × n` sparse matrix.
    pub fn new(n: usize) -> Self {
        Self {
            rows: Vec::new(),
            cols: Vec::new(),
            values: Vec::new(),
            n,
        }
    }

    /// Create a sparse matrix from triplet vectors.
    ///
    /// All three vectors must have the same length, and all indices must be
    /// within bounds. Triplets may arrive in any order; repeated coordinates
    /// are summed.
    pub fn from_triplets(
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
        n: usize,
    ) -> Result<Self> {
        if rows.len() != cols.len() || cols.len() != values.len() {
            return Err(HicError::InvalidInput(
                "rows, cols, and values must have the same length".into(),
            ));
        }
        for (i, (&r, &c)) in rows.iter().zip(cols.iter()).enumerate() {
            if r >= n || c >= n {
                return Err(HicError::InvalidInput(format!(
                    "triplet {i} index ({r}, {c}) out of bounds for ({n}, {n})"
                )));
            }
        }

        let mut order: Vec<usize> = (0..values.len()).collect();
        order.sort_by_key(|&i| (rows[i], cols[i]));

        let mut out = Self::new(n);
        for i in order {
            let (r, c, v) = (rows[i], cols[i], values[i]);
            match (out.rows.last(), out.cols.last()) {
                (Some(&lr), Some(&lc)) if lr == r && lc == c => {
                    if let Some(last) = out.values.last_mut() {
                        *last += v;
                    }
                }
                _ => {
                    out.rows.push(r);
                    out.cols.push(c);
                    out.values.push(v);
                }
            }
        }
        Ok(out)
    }

    /// Build from triplets already sorted by `(row, col)` without duplicates.
    pub(crate) fn from_sorted_unchecked(
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
        n: usize,
    ) -> Self {
        debug_assert!(rows
            .iter()
            .zip(&cols)
            .zip(rows.iter().zip(&cols).skip(1))
            .all(|(a, b)| a < b));
        Self {
            rows,
            cols,
            values,
            n,
        }
    }

    /// Position of `(row, col)` in the sorted storage.
    fn position(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.rows.partition_point(|&r| r < row);
        let end = self.rows.partition_point(|&r| r <= row);
        self.cols[start..end]
            .binary_search(&col)
            .ok()
            .map(|offset| start + offset)
    }

    /// Get the value at `(row, col)`. Returns 0.0 if no entry is stored.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.position(row, col).map_or(0.0, |i| self.values[i])
    }

    /// Whether an entry is stored at `(row, col)`.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.position(row, col).is_some()
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Fraction of entries that are stored: `nnz / n²`.
    pub fn density(&self) -> f64 {
        let total = self.n as f64 * self.n as f64;
        if total == 0.0 {
            return 0.0;
        }
        self.values.len() as f64 / total
    }

    /// Side length.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Convert to a dense matrix.
    pub fn to_dense(&self) -> DenseMatrix {
        let mut dense = DenseMatrix::zeros(self.n);
        for (r, c, v) in self.iter() {
            dense[(r, c)] = v;
        }
        dense
    }

    /// Create a sparse matrix from dense data, storing only values where
    /// `|value| > threshold`. Non-finite values are always stored.
    pub fn from_dense(dense: &DenseMatrix, threshold: f64) -> Self {
        let n = dense.n();
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut values = Vec::new();

        for r in 0..n {
            for (c, &val) in dense.row(r).iter().enumerate() {
                if val.abs() > threshold || !val.is_finite() {
                    rows.push(r);
                    cols.push(c);
                    values.push(val);
                }
            }
        }

        Self::from_sorted_unchecked(rows, cols, values, n)
    }

    /// Sum of each row over stored entries.
    pub fn row_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n];
        for (r, _, v) in self.iter() {
            sums[r] += v;
        }
        sums
    }

    /// Apply `f(row, col, value)` to every stored entry. Implicit zeros are
    /// left untouched.
    pub fn map_stored(&self, f: impl Fn(usize, usize, f64) -> f64) -> Self {
        let values = self.iter().map(|(r, c, v)| f(r, c, v)).collect();
        Self {
            rows: self.rows.clone(),
            cols: self.cols.clone(),
            values,
            n: self.n,
        }
    }

    /// Borrow the row indices and column indices alongside mutable values,
    /// all in `(row, col)` order. Coordinates cannot be changed.
    pub fn parts_mut(&mut self) -> (&[usize], &[usize], &mut [f64]) {
        (&self.rows, &self.cols, &mut self.values)
    }

    /// Iterate over stored triplets `(row, col, value)` in `(row, col)` order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(self.cols.iter())
            .zip(self.values.iter())
            .map(|((&r, &c), &v)| (r, c, v))
    }
}

impl Summarizable for SparseMatrix {
    fn summary(&self) -> String {
        format!(
            "SparseMatrix: {}\u{00d7}{}, {} nonzeros ({:.2}% density)",
            self.n,
            self.n,
            self.nnz(),
            self.density() * 100.0
        )
    }
}
