//! Shared primitives for the hicmap Hi-C pipeline.
//!
//! `hicmap-core` provides the foundation the other hicmap crates build on:
//!
//! - **Error types**: [`HicError`] and [`Result`] for fatal failures
//! - **Diagnostics**: [`Diagnostic`] for non-fatal conditions reported alongside results
//! - **Traits**: [`Summarizable`] one-line descriptions of pipeline types
//! - **Compression**: gzip detection and transparent decoding (std feature only)

pub mod diagnostic;
pub mod error;
pub mod traits;

#[cfg(feature = "std")]
pub mod compress;

pub use diagnostic::Diagnostic;
pub use error::{HicError, Result};
pub use traits::*;
