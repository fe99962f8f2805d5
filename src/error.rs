//! Build failures surfaced to callers of the structure builder.
use thiserror::Error;

use crate::loose::Loose;

/// Errors raised while building a [`crate::structure::Structure`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A value that had to be iterated is neither a native collection nor an
    /// ordered pair source.
    #[error("invalid structural type: expected a collection or ordered key/value source, got {type_info}")]
    InvalidStructuralType { type_info: String },

    #[error("nesting depth exceeds the configured limit of {limit}")]
    DepthLimitExceeded { limit: usize },
}

impl BuildError {
    pub fn with_type_info(rejected: &Loose) -> Self {
        BuildError::InvalidStructuralType { type_info: rejected.describe() }
    }
}
