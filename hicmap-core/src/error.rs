//! Structured error types for the hicmap pipeline.

use thiserror::Error;

/// Unified error type for all hicmap operations.
///
/// Every variant is fatal to the call that produced it. Non-fatal
/// conditions are reported through [`crate::Diagnostic`] instead.
#[derive(Debug, Error)]
pub enum HicError {
    /// I/O error (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed numeric field, bad matrix file)
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration error (unknown method or format, wrong column count,
    /// invalid eigenvector index)
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid input (shape mismatch, out-of-range arguments)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Iterative correction received a matrix that is not symmetric.
    #[error("matrix is not symmetric (relative asymmetry {asymmetry:e})")]
    Symmetry { asymmetry: f64 },

    /// Iterative balancing produced values beyond the sanity bound.
    #[error("balancing diverged: {0}")]
    Divergence(String),

    /// Compression or decompression failure
    #[error("compression error: {0}")]
    Compression(String),
}

/// Convenience alias used throughout the hicmap crates.
pub type Result<T> = std::result::Result<T, HicError>;
