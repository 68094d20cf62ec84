//! Numerical analysis of Hi-C contact maps.
//!
//! - **Normalization**: [`normalize`] with log, power, observed/expected,
//!   vanilla coverage (plain and square-root) and the iterative KR and IC
//!   balancers
//! - **Compartments**: [`compartments`] extracts the A/B signal from a
//!   normalized Laplacian eigenvector
//! - **Reproducibility**: [`reproducibility`] computes the stratum-adjusted
//!   correlation between two maps after optional [`smooth`]ing
//!
//! # Quick start
//!
//! ```
//! use hicmap_matrix::{ContactMatrix, DenseMatrix};
//! use hicmap_stats::{normalize, Normalization};
//!
//! let raw = DenseMatrix::from_rows(vec![
//!     vec![1.0, 2.0, 0.0],
//!     vec![2.0, 1.0, 0.0],
//!     vec![0.0, 0.0, 0.0],
//! ]).unwrap();
//! let out = normalize(&ContactMatrix::Dense(raw), &Normalization::Coverage).unwrap();
//!
//! assert!(out.diagnostics.is_empty());
//! let v = out.matrix.get(0, 1).unwrap();
//! assert!((v - 2.0 / 9.0).abs() < 1e-12);
//! ```

pub mod balancing;
pub mod compartment;
pub mod correlation;
pub mod descriptive;
pub mod normalization;
pub mod reproducibility;
pub mod smoothing;

pub use balancing::{ic_balance, kr_balance, Balanced};
pub use compartment::{compartment_analysis, compartments, CompartmentAnalysis};
pub use normalization::{
    normalize, normalize_named, IcOptions, KrOptions, LogOptions, Normalization, Normalized,
    PowerOptions,
};
pub use reproducibility::{reproducibility, reproducibility_report, ReproducibilityReport, StratumScore};
pub use smoothing::smooth;
