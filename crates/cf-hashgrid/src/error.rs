//! Error types for hash grid operations.

/// Errors that can occur while building or querying a [`HashGrid`](crate::HashGrid).
///
/// "Not found" outcomes (no qualifying nearest neighbor) are reported as `Ok(None)`,
/// never as an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum HashGridError {
    /// The cell size must be positive and finite.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f64),

    /// The number of buckets per axis must be at least one.
    #[error("hash size must be at least 1 and fit in i64, got {0}")]
    InvalidHashSize(usize),

    /// The table period `hash_size * cell_size` or the squared query radius is not finite.
    #[error("grid extent overflows f64 (cell size {cell_size}, hash size {hash_size})")]
    ExtentOverflow {
        /// Cell edge length.
        cell_size: f64,
        /// Buckets per axis.
        hash_size: usize,
    },

    /// The grid only supports 1, 2 or 3 dimensions.
    #[error("unsupported grid dimension {0} (expected 1, 2 or 3)")]
    UnsupportedDimension(usize),

    /// `hash_size^dimension` does not fit in `usize`.
    #[error("cell table for hash size {hash_size} in {dimension}D overflows usize")]
    CellTableOverflow {
        /// Buckets per axis.
        hash_size: usize,
        /// Grid dimension.
        dimension: usize,
    },

    /// The grid has never been built successfully.
    #[error("hash grid has not been built")]
    NotBuilt,

    /// Points were added or cleared since the last build.
    #[error("hash grid is stale: points changed since the last build")]
    Stale,

    /// A point id is outside the registered range.
    #[error("point id {0} is out of range")]
    UnknownPoint(usize),

    /// A handle is not registered in the grid.
    #[error("handle is not registered in the grid")]
    UnknownHandle,
}

/// Result type for hash grid operations.
pub type HashGridResult<T> = std::result::Result<T, HashGridError>;
