//! Error types for quantum-number tensor operations

use thiserror::Error;

/// Result type for quantum-number tensor operations
pub type Result<T> = std::result::Result<T, QnError>;

/// Errors that can occur during quantum-number tensor operations
#[derive(Error, Debug)]
pub enum QnError {
    /// Number of coordinates does not match the tensor rank
    #[error("Rank mismatch: tensor has rank {expected}, got {got} coordinates")]
    RankMismatch {
        /// The rank of the tensor
        expected: usize,
        /// The number of coordinates provided
        got: usize,
    },

    /// Coordinate outside the dimension of its index
    #[error("Coordinate {coord} out of range on axis {axis} (dim: {dim})")]
    CoordOutOfRange {
        /// The axis of the offending coordinate
        axis: usize,
        /// The coordinate value
        coord: usize,
        /// The dimension of the index on that axis
        dim: usize,
    },

    /// A block would break the divergence shared by the stored blocks
    #[error("Divergence mismatch: tensor has divergence {expected}, block has {got}")]
    DivergenceMismatch {
        /// Divergence of the already stored blocks
        expected: String,
        /// Divergence of the offending block
        got: String,
    },

    /// Two tensors do not share the same indices
    #[error("Index mismatch: {message}")]
    IndexMismatch {
        /// Description of the mismatch
        message: String,
    },

    /// Flat data length does not match the tensor shape
    #[error("Data length mismatch: expected {expected}, got {got}")]
    DataLengthMismatch {
        /// The number of elements implied by the shape
        expected: usize,
        /// The number of elements provided
        got: usize,
    },
}
