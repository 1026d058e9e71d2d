//! Error types for voxshift-core.

use thiserror::Error;

/// Error type for voxshift-core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Pitch ratios must be finite and strictly positive.
    #[error("Invalid pitch ratio: {0}. Must be finite and > 0")]
    InvalidPitch(f32),
}

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;
