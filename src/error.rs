//! Error types for bounding volume tree operations.

use thiserror::Error;

/// Errors that can occur when constructing volumes or accessing tree nodes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BvError {
    /// A sphere was given a negative radius.
    #[error("sphere radius must be non-negative, got {0}")]
    NegativeRadius(f64),

    /// A box was given a negative half-width.
    #[error("box half-width on axis {axis} must be non-negative, got {value}")]
    NegativeHalfWidth {
        /// Axis of the offending half-width.
        axis: usize,
        /// Value that was supplied.
        value: f64,
    },

    /// Margins must be finite and non-negative.
    #[error("margin must be finite and non-negative, got {0}")]
    InvalidMargin(f64),

    /// The supplied rotation is not an orthonormal basis.
    #[error("rotation is not orthonormal (deviation {deviation:e})")]
    DegenerateRotation {
        /// Largest deviation of `R^T R` from the identity.
        deviation: f64,
    },

    /// A coordinate was NaN or infinite.
    #[error("non-finite value in {0}")]
    NonFinite(&'static str),

    /// `node(i)` was called with an index past the end of the arena.
    #[error("node index {index} out of range for tree with {len} nodes")]
    NodeOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of nodes in the tree.
        len: usize,
    },

    /// `leaf(i)` was called with an index past the last leaf.
    #[error("leaf index {index} out of range for tree with {len} leaves")]
    LeafOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of leaves in the tree.
        len: usize,
    },

    /// An element index past the end of a leaf's element list.
    #[error("element index {index} out of range for leaf with {len} elements")]
    ElementOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of elements in the leaf.
        len: usize,
    },

    /// A dedicated worker pool could not be created.
    #[error("failed to create worker pool: {0}")]
    ThreadPool(String),

    /// A volume kind name could not be parsed.
    #[error("unknown volume kind '{0}', expected one of: sphere, aabb, obb")]
    UnknownVolumeKind(String),
}

impl From<rayon::ThreadPoolBuildError> for BvError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        BvError::ThreadPool(err.to_string())
    }
}

/// Result type alias for bounding volume tree operations.
pub type Result<T> = core::result::Result<T, BvError>;

pub(crate) fn check_margin(margin: f64) -> Result<f64> {
    if margin.is_finite() && margin >= 0.0 {
        Ok(margin)
    } else {
        Err(BvError::InvalidMargin(margin))
    }
}
