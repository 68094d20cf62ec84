//! Small dense linear algebra: symmetric eigendecomposition and linear solves.
//!
//! These are the only factorizations the pipeline needs. The spectral
//! compartment analysis diagonalizes a normalized Laplacian and the KR
//! balancer solves one Newton system per pass.

use crate::dense::DenseMatrix;

const MAX_SWEEPS: usize = 100;

/// Eigendecomposition of a real symmetric matrix.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Eigenvalues in ascending order.
    pub values: Vec<f64>,
    /// Eigenvectors as columns: `vectors[(i, k)]` is component `i` of the
    /// eigenvector paired with `values[k]`.
    pub vectors: DenseMatrix,
}

impl SymmetricEigen {
    /// Copy out the `k`-th eigenvector (ascending eigenvalue order).
    pub fn vector(&self, k: usize) -> Vec<f64> {
        let n = self.vectors.n();
        (0..n).map(|i| self.vectors[(i, k)]).collect()
    }
}

/// Cyclic Jacobi eigendecomposition of a real symmetric matrix.
///
/// Sweeps over every off-diagonal pair, annihilating each with a Givens
/// rotation, until the off-diagonal Frobenius norm is negligible relative
/// to the whole matrix.
///
/// Every sweep costs O(n³) and the full spectrum is computed, so this is
/// meant for maps of up to a few thousand bins.
pub fn symmetric_eigen(matrix: &DenseMatrix) -> SymmetricEigen {
    let n = matrix.n();
    let mut a = matrix.as_slice().to_vec();
    let mut v = DenseMatrix::identity(n).into_vec();

    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let threshold = scale * 1e-15;

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[p * n + q] * a[p * n + q];
            }
        }
        if off.sqrt() <= threshold || off == 0.0 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[p * n + q];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let app = a[p * n + p];
                let aqq = a[q * n + q];

                let theta = (aqq - app) / (2.0 * apq);
                let t = if theta.abs() > 1e150 {
                    0.5 / theta
                } else {
                    let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
                    sign / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                // A ← A·J
                for k in 0..n {
                    let akp = a[k * n + p];
                    let akq = a[k * n + q];
                    a[k * n + p] = c * akp - s * akq;
                    a[k * n + q] = s * akp + c * akq;
                }
                // A ← Jᵀ·A
                for k in 0..n {
                    let apk = a[p * n + k];
                    let aqk = a[q * n + k];
                    a[p * n + k] = c * apk - s * aqk;
                    a[q * n + k] = s * apk + c * aqk;
                }
                a[p * n + q] = 0.0;
                a[q * n + p] = 0.0;

                // V ← V·J
                for k in 0..n {
                    let vkp = v[k * n + p];
                    let vkq = v[k * n + q];
                    v[k * n + p] = c * vkp - s * vkq;
                    v[k * n + q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[i * n + i].total_cmp(&a[j * n + j]));

    let values = order.iter().map(|&k| a[k * n + k]).collect();
    let mut vectors = DenseMatrix::zeros(n);
    for (dst, &src) in order.iter().enumerate() {
        for i in 0..n {
            vectors[(i, dst)] = v[i * n + src];
        }
    }
    SymmetricEigen { values, vectors }
}

/// Solve `A·x = b` by LU decomposition with partial pivoting.
///
/// Returns `None` when elimination meets an exactly zero or non-finite
/// pivot. There is no relative threshold, so badly scaled systems are
/// still solved.
pub fn solve(a: &DenseMatrix, b: &[f64]) -> Option<Vec<f64>> {
    let n = a.n();
    debug_assert_eq!(b.len(), n);
    let mut lu = a.as_slice().to_vec();
    let mut x = b.to_vec();

    for col in 0..n {
        let (pivot_row, pivot) = (col..n)
            .map(|r| (r, lu[r * n + col].abs()))
            .fold((col, -1.0), |best, cur| if cur.1 > best.1 { cur } else { best });
        if pivot == 0.0 || !pivot.is_finite() {
            return None;
        }
        if pivot_row != col {
            for k in 0..n {
                lu.swap(col * n + k, pivot_row * n + k);
            }
            x.swap(col, pivot_row);
        }

        let diag = lu[col * n + col];
        for r in (col + 1)..n {
            let factor = lu[r * n + col] / diag;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                lu[r * n + k] -= factor * lu[col * n + k];
            }
            x[r] -= factor * x[col];
        }
    }

    for r in (0..n).rev() {
        let mut acc = x[r];
        for k in (r + 1)..n {
            acc -= lu[r * n + k] * x[k];
        }
        x[r] = acc / lu[r * n + r];
    }
    Some(x)
}
