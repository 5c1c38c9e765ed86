//! Definitions for the traits and aliases that are shared between the tree, the
//! accumulators and the batch driver.
use num_traits::Float;
use std::fmt::Debug;

/// Axis trait represents the traits that must be implemented
/// by the type that is used as the first generic parameter, `A`,
/// on the [`Octree`](crate::octree::Octree). This will be [`f64`] or [`f32`].
pub trait Axis: Float + Default + Debug + Copy + Sync + Send + std::ops::AddAssign {
    /// converts the value to an `f64`, used when quantising co-ordinates into keys.
    fn to_f64_lossy(self) -> f64;
}

impl<T: Float + Default + Debug + Copy + Sync + Send + std::ops::AddAssign> Axis for T {
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

/// Index of a node within the tree's node arena.
pub type NodeId = usize;

/// Index of a vertex within the vertex slice that a tree was built over.
pub type VertexId = usize;
