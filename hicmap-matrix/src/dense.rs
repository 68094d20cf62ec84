//! Dense square matrix.
//!
//! [`DenseMatrix`] stores an N×N matrix of `f64` values in row-major order.
//! It is the working representation for the iterative balancers and the
//! spectral analysis, which touch every entry on every pass.

use core::ops::{Index, IndexMut};

use hicmap_core::{HicError, Result, Summarizable};

/// A dense, row-major square matrix.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DenseMatrix {
    data: Vec<f64>,
    n: usize,
}

impl DenseMatrix {
    /// Create a zero-filled `n × n` matrix.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![0.0; n * n],
            n,
        }
    }

    /// Create the `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    pub(crate) fn from_vec_unchecked(n: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), n * n);
        Self { data, n }
    }

    /// Create a matrix from rows. Every row must have as many entries as
    /// there are rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        let mut data = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(HicError::InvalidInput(format!(
                    "row {i} has {} columns, expected {n} (matrix must be square)",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Ok(Self { data, n })
    }

    /// Side length.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Value at `(row, col)`, or `None` if out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.n && col < self.n {
            Some(self.data[row * self.n + col])
        } else {
            None
        }
    }

    /// Add `value` to the entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        self[(row, col)] += value;
    }

    /// Borrow one row.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.n..(row + 1) * self.n]
    }

    /// Borrow the flat row-major data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutably borrow the flat row-major data.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consume the matrix, returning the flat row-major data.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Copy into a vector of rows.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n).map(|r| self.row(r).to_vec()).collect()
    }

    /// Sum of each row.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n).map(|r| self.row(r).iter().sum()).collect()
    }

    /// Matrix-vector product `M·x`.
    pub fn matvec(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.n);
        (0..self.n)
            .map(|r| self.row(r).iter().zip(x).map(|(a, b)| a * b).sum())
            .collect()
    }

    /// Apply `f` to every entry, producing a new matrix.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            n: self.n,
        }
    }

    /// Entries on the upper diagonal at offset `d`: `M[r, r + d]` for
    /// `r = 0..n - d`. Empty if `d >= n`.
    pub fn diagonal(&self, d: usize) -> Vec<f64> {
        if d >= self.n {
            return Vec::new();
        }
        (0..self.n - d).map(|r| self.data[r * self.n + r + d]).collect()
    }

    /// Submatrix keeping only the listed rows and columns, in order.
    pub fn select(&self, keep: &[usize]) -> Self {
        let k = keep.len();
        let mut data = Vec::with_capacity(k * k);
        for &r in keep {
            let row = self.row(r);
            data.extend(keep.iter().map(|&c| row[c]));
        }
        Self { data, n: k }
    }

    /// Inverse of [`select`](Self::select): scatter this matrix into an
    /// `n_full × n_full` zero matrix at the positions in `keep`.
    pub fn scatter(&self, n_full: usize, keep: &[usize]) -> Self {
        debug_assert_eq!(keep.len(), self.n);
        let mut out = Self::zeros(n_full);
        for (i, &r) in keep.iter().enumerate() {
            for (j, &c) in keep.iter().enumerate() {
                out.data[r * n_full + c] = self.data[i * self.n + j];
            }
        }
        out
    }
}

impl Index<(usize, usize)> for DenseMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(row < self.n && col < self.n, "index ({row}, {col}) out of bounds for {}", self.n);
        &self.data[row * self.n + col]
    }
}

impl IndexMut<(usize, usize)> for DenseMatrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(row < self.n && col < self.n, "index ({row}, {col}) out of bounds for {}", self.n);
        &mut self.data[row * self.n + col]
    }
}

impl Summarizable for DenseMatrix {
    fn summary(&self) -> String {
        format!("DenseMatrix: {}\u{00d7}{}", self.n, self.n)
    }
}
