//! Contact matrix data structures for the hicmap pipeline.
//!
//! - **Dense matrices**: [`DenseMatrix`], row-major N×N storage
//! - **Sparse matrices**: [`SparseMatrix`], sorted COO triplets
//! - **Contact matrices**: [`ContactMatrix`], the tagged dense/sparse variant
//!   every pipeline stage consumes
//! - **Binning**: [`ContactMapBuilder`] accumulates position pairs into bins
//! - **Linear algebra**: the few dense routines the pipeline needs
//!
//! # Quick start
//!
//! ```
//! use hicmap_matrix::{BinningConfig, ContactMapBuilder, Layout};
//!
//! let config = BinningConfig { resolution: 100, start: 0, end: Some(300) };
//! let mut builder = ContactMapBuilder::new(config, Layout::Dense).unwrap();
//! builder.push(10, 150, 2.0);
//! builder.push(250, 250, 1.0);
//! let matrix = builder.finish();
//!
//! assert_eq!(matrix.n(), 3);
//! assert_eq!(matrix.get(0, 1), Some(2.0));
//! assert_eq!(matrix.get(1, 0), Some(2.0));
//! ```

pub mod builder;
pub mod contact;
pub mod dense;
pub mod linalg;
pub mod sparse;

pub use builder::{BinningConfig, ContactMapBuilder};
pub use contact::{ContactMatrix, Layout};
pub use dense::DenseMatrix;
pub use sparse::SparseMatrix;
