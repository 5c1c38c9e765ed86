//! Errors reported by tree construction and the batch driver.
//!
//! These are configuration or input problems detected before any query runs.
//! Misuse of the tree's navigation API (asking a leaf for its children, say)
//! is a programming error and panics instead.
use thiserror::Error;

/// Error type returned by [`Octree::build`](crate::octree::Octree::build),
/// [`KnnQuery::new`](crate::octree::query::KnnQuery::new) and
/// [`annotate_neighbours`](crate::annotate::annotate_neighbours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KnnError {
    /// more neighbours were requested than a vertex has result slots for
    #[error("k = {k} is larger than the neighbour capacity of {capacity}")]
    KTooLarge {
        /// requested neighbour count
        k: usize,
        /// number of neighbour slots available
        capacity: usize,
    },

    /// leaves must be allowed to hold at least one vertex
    #[error("leaf size must be at least 1")]
    InvalidLeafSize,

    /// the small-k / large-k cutoff must be positive
    #[error("queue cutoff must be at least 1")]
    InvalidQueueCutoff,

    /// a tree cannot be built over zero vertices
    #[error("cannot build a tree over an empty vertex set")]
    EmptyInput,

    /// a co-ordinate was NaN or infinite, so it has no place on the curve
    #[error("vertex {index} has a non-finite co-ordinate")]
    NonFiniteCoordinate {
        /// index of the offending vertex
        index: usize,
    },

    /// more dimensions than key bits
    #[error("{dims} dimensions leave no key bits per dimension")]
    DimensionTooLarge {
        /// dimension count of the points
        dims: usize,
    },
}
