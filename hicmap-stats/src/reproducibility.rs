//! Stratum-adjusted correlation between two contact maps.
//!
//! Both maps are optionally smoothed, then split into diagonal strata. Each
//! stratum contributes its Pearson correlation, weighted by the product of
//! the two strata's standard deviations and the stratum length. Strata that
//! are constant in either map carry zero weight and are excluded.

use hicmap_core::{HicError, Result, Summarizable};
use hicmap_matrix::ContactMatrix;

use crate::correlation::pearson;
use crate::descriptive::population_std;
use crate::smoothing::smooth;

/// Contribution of a single diagonal stratum.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StratumScore {
    /// Diagonal offset `d`.
    pub distance: usize,
    pub std1: f64,
    pub std2: f64,
    /// Pearson correlation, 0 for zero-weight strata.
    pub correlation: f64,
    /// `std1 · std2 · (N − d)`.
    pub weight: f64,
}

/// Score with its per-stratum breakdown.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReproducibilityReport {
    pub score: f64,
    pub strata: Vec<StratumScore>,
}

impl Summarizable for ReproducibilityReport {
    fn summary(&self) -> String {
        let used = self.strata.iter().filter(|s| s.weight > 0.0).count();
        format!(
            "reproducibility {:.4} over {used} of {} strata",
            self.score,
            self.strata.len()
        )
    }
}

/// Stratum-adjusted correlation of `a` and `b` over the first `n_strata`
/// diagonals, after smoothing both with window `h` when `h > 0`.
pub fn reproducibility(
    a: &ContactMatrix,
    b: &ContactMatrix,
    n_strata: usize,
    h: usize,
) -> Result<f64> {
    reproducibility_report(a, b, n_strata, h).map(|report| report.score)
}

/// As [`reproducibility`], also returning every stratum's contribution.
pub fn reproducibility_report(
    a: &ContactMatrix,
    b: &ContactMatrix,
    n_strata: usize,
    h: usize,
) -> Result<ReproducibilityReport> {
    let n = a.n();
    if b.n() != n {
        return Err(HicError::InvalidInput(format!(
            "matrix shapes differ ({n}\u{00d7}{n} vs {}\u{00d7}{})",
            b.n(),
            b.n()
        )));
    }
    if n_strata == 0 || n_strata > n {
        return Err(HicError::InvalidInput(format!(
            "number of strata must be in 1..={n}, got {n_strata}"
        )));
    }

    let (strata_a, strata_b) = if h > 0 {
        (smooth(a, h).strata(n_strata)?, smooth(b, h).strata(n_strata)?)
    } else {
        (a.strata(n_strata)?, b.strata(n_strata)?)
    };

    let mut strata = Vec::with_capacity(n_strata);
    let (mut weighted, mut total_weight) = (0.0f64, 0.0f64);
    for (d, (sa, sb)) in strata_a.iter().zip(&strata_b).enumerate() {
        let std1 = population_std(sa);
        let std2 = population_std(sb);
        let weight = std1 * std2 * (n - d) as f64;
        let correlation = if weight > 0.0 { pearson(sa, sb)? } else { 0.0 };
        weighted += weight * correlation;
        total_weight += weight;
        strata.push(StratumScore {
            distance: d,
            std1,
            std2,
            correlation,
            weight,
        });
    }

    if total_weight == 0.0 {
        return Err(HicError::InvalidInput(
            "every stratum is constant in at least one matrix; correlation is undefined".into(),
        ));
    }
    let score = weighted / total_weight;
    log::debug!("reproducibility {score:.6} over {n_strata} strata (h = {h})");
    Ok(ReproducibilityReport { score, strata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hicmap_matrix::{DenseMatrix, Layout};

    fn map(n: usize, noise: f64) -> ContactMatrix {
        let mut m = DenseMatrix::zeros(n);
        for i in 0..n {
            for j in 0..n {
                let wiggle = (((i * i + 3 * j) % 5) as f64) * noise;
                m[(i, j)] = 20.0 / (1.0 + i.abs_diff(j) as f64) + ((i + j) % 3) as f64 + wiggle;
            }
        }
        ContactMatrix::Dense(m)
    }

    #[test]
    fn self_similarity_is_one() {
        let a = map(10, 0.0);
        for h in [0, 1, 2] {
            let score = reproducibility(&a, &a, 5, h).unwrap();
            assert!((score - 1.0).abs() < 1e-9, "h={h}: {score}");
        }
    }

    #[test]
    fn symmetric_in_arguments() {
        let a = map(10, 0.0);
        let b = map(10, 1.5);
        let ab = reproducibility(&a, &b, 6, 1).unwrap();
        let ba = reproducibility(&b, &a, 6, 1).unwrap();
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab < 1.0 && ab > -1.0);
    }

    #[test]
    fn layout_does_not_matter() {
        let a = map(8, 0.0);
        let b = map(8, 2.0);
        let dense = reproducibility(&a, &b, 4, 0).unwrap();
        let sparse = reproducibility(
            &a.clone().into_layout(Layout::Sparse),
            &b.clone().into_layout(Layout::Sparse),
            4,
            0,
        )
        .unwrap();
        assert!((dense - sparse).abs() < 1e-12);
    }

    #[test]
    fn constant_strata_get_zero_weight() {
        // constant main diagonal, varying first off-diagonal
        let rows = vec![
            vec![1.0, 2.0, 0.0],
            vec![2.0, 1.0, 5.0],
            vec![0.0, 5.0, 1.0],
        ];
        let a = ContactMatrix::Dense(DenseMatrix::from_rows(rows).unwrap());
        let report = reproducibility_report(&a, &a, 2, 0).unwrap();
        assert_eq!(report.strata[0].weight, 0.0);
        assert_eq!(report.strata[0].correlation, 0.0);
        assert!(report.strata[1].weight > 0.0);
        assert!((report.score - 1.0).abs() < 1e-12);
        assert_eq!(report.summary(), "reproducibility 1.0000 over 1 of 2 strata");
    }

    #[test]
    fn all_constant_strata_is_an_error() {
        let a = ContactMatrix::Dense(DenseMatrix::identity(4));
        assert!(matches!(
            reproducibility(&a, &a, 1, 0),
            Err(HicError::InvalidInput(_))
        ));
    }

    #[test]
    fn argument_checks() {
        let a = map(5, 0.0);
        let b = map(6, 0.0);
        assert!(matches!(reproducibility(&a, &b, 2, 0), Err(HicError::InvalidInput(_))));
        assert!(matches!(reproducibility(&a, &a, 0, 0), Err(HicError::InvalidInput(_))));
        assert!(matches!(reproducibility(&a, &a, 6, 0), Err(HicError::InvalidInput(_))));
        assert!(reproducibility(&a, &a, 5, 0).is_ok());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use hicmap_matrix::DenseMatrix;
    use proptest::prelude::*;

    fn pair() -> impl Strategy<Value = (ContactMatrix, ContactMatrix)> {
        (3usize..9).prop_flat_map(|n| {
            (
                proptest::collection::vec(0.0f64..100.0, n * n),
                proptest::collection::vec(0.0f64..100.0, n * n),
            )
                .prop_map(move |(x, y)| {
                    let build = |raw: Vec<f64>| {
                        let mut m = DenseMatrix::zeros(n);
                        for i in 0..n {
                            for j in i..n {
                                m[(i, j)] = raw[i * n + j];
                                m[(j, i)] = raw[i * n + j];
                            }
                        }
                        ContactMatrix::Dense(m)
                    };
                    (build(x), build(y))
                })
        })
    }

    proptest! {
        #[test]
        fn score_is_symmetric_and_bounded((a, b) in pair()) {
            let strata = (a.n() - 1).max(1);
            if let (Ok(ab), Ok(ba)) = (
                reproducibility(&a, &b, strata, 1),
                reproducibility(&b, &a, strata, 1),
            ) {
                prop_assert!((ab - ba).abs() < 1e-9);
                prop_assert!((-1.0 - 1e-9..=1.0 + 1e-9).contains(&ab));
            }
        }

        #[test]
        fn self_score_is_one((a, _) in pair()) {
            if let Ok(score) = reproducibility(&a, &a, a.n() - 1, 0) {
                prop_assert!((score - 1.0).abs() < 1e-9);
            }
        }
    }
}
