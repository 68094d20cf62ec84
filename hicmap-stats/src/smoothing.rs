//! Uniform 2-D smoothing of contact maps.

use hicmap_matrix::{ContactMatrix, DenseMatrix, SparseMatrix};

/// Convolve `matrix` with a `(h + 1) × (h + 1)` averaging kernel.
///
/// The output has the input's size, with zero padding outside the matrix.
/// For even kernel sizes the window is shifted towards lower indices, so
/// entry `(i, j)` averages rows `i - ⌈h/2⌉ ..= i + ⌊h/2⌋` (likewise columns).
/// The result keeps the input layout, and `h = 0` returns a copy.
pub fn smooth(matrix: &ContactMatrix, h: usize) -> ContactMatrix {
    if h == 0 {
        return matrix.clone();
    }
    let smoothed = box_filter(&matrix.to_dense(), h);
    match matrix {
        ContactMatrix::Dense(_) => ContactMatrix::Dense(smoothed),
        ContactMatrix::Sparse(_) => ContactMatrix::Sparse(SparseMatrix::from_dense(&smoothed, 0.0)),
    }
}

fn box_filter(m: &DenseMatrix, h: usize) -> DenseMatrix {
    let n = m.n();
    let stride = n + 1;

    // sat[(i, j)] = sum of m over rows < i and columns < j
    let mut sat = vec![0.0; stride * stride];
    for i in 0..n {
        let mut row_acc = 0.0;
        for j in 0..n {
            row_acc += m[(i, j)];
            sat[(i + 1) * stride + j + 1] = sat[i * stride + j + 1] + row_acc;
        }
    }

    let before = h - h / 2;
    let after = h / 2;
    let weight = 1.0 / ((h + 1) * (h + 1)) as f64;
    let range = |i: usize| (i.saturating_sub(before), (i + after + 1).min(n));

    let mut out = DenseMatrix::zeros(n);
    for i in 0..n {
        let (r0, r1) = range(i);
        for j in 0..n {
            let (c0, c1) = range(j);
            let sum = sat[r1 * stride + c1] - sat[r0 * stride + c1] - sat[r1 * stride + c0]
                + sat[r0 * stride + c0];
            out[(i, j)] = sum * weight;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use hicmap_matrix::Layout;

    fn naive(m: &DenseMatrix, h: usize) -> DenseMatrix {
        let n = m.n() as isize;
        let before = (h - h / 2) as isize;
        let after = (h / 2) as isize;
        let mut out = DenseMatrix::zeros(m.n());
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for r in (i - before)..=(i + after) {
                    for c in (j - before)..=(j + after) {
                        if (0..n).contains(&r) && (0..n).contains(&c) {
                            sum += m[(r as usize, c as usize)];
                        }
                    }
                }
                out[(i as usize, j as usize)] = sum / ((h + 1) * (h + 1)) as f64;
            }
        }
        out
    }

    fn ramp(n: usize) -> DenseMatrix {
        let mut m = DenseMatrix::zeros(n);
        for i in 0..n {
            for j in 0..n {
                m[(i, j)] = (i * n + j) as f64 + if i == j { 10.0 } else { 0.0 };
            }
        }
        m
    }

    #[test]
    fn zero_window_is_identity() {
        let m = ContactMatrix::Dense(ramp(4));
        assert_eq!(smooth(&m, 0), m);
    }

    #[test]
    fn constant_interior_is_preserved() {
        let m = ContactMatrix::Dense(DenseMatrix::zeros(9).map(|_| 3.0));
        for h in 1..=4 {
            let s = smooth(&m, h).into_dense();
            for i in h..(9 - h) {
                for j in h..(9 - h) {
                    assert!((s[(i, j)] - 3.0).abs() < 1e-12, "h={h} ({i},{j})");
                }
            }
            // corners see zero padding
            assert!(s[(0, 0)] < 3.0);
        }
    }

    #[test]
    fn matches_direct_convolution() {
        let m = ramp(7);
        for h in 1..=5 {
            let fast = box_filter(&m, h);
            let slow = naive(&m, h);
            for (a, b) in fast.as_slice().iter().zip(slow.as_slice()) {
                assert!((a - b).abs() < 1e-9, "h={h}");
            }
        }
    }

    #[test]
    fn even_kernel_alignment() {
        // h = 1: 2×2 window covering rows i-1..=i
        let mut m = DenseMatrix::zeros(3);
        m[(1, 1)] = 4.0;
        let s = box_filter(&m, 1);
        assert_eq!(s[(1, 1)], 1.0);
        assert_eq!(s[(2, 2)], 1.0);
        assert_eq!(s[(0, 0)], 0.0);
    }

    #[test]
    fn keeps_sparse_layout() {
        let m = ContactMatrix::Dense(ramp(5)).into_layout(Layout::Sparse);
        assert_eq!(smooth(&m, 2).layout(), Layout::Sparse);
    }
}
