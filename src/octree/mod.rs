//! Z-order octree and its k-nearest-neighbour search.
//!
//! Despite the name the tree is binary: each stem splits on a single bit of
//! the interleaved key, so `K` consecutive levels together make one octree
//! level (for `K = 3`). Every node keeps its bounding box, its subtree size
//! and a link to its parent, which lets a search begin at any leaf and climb.
//!
//! ```rust
//! use octknn::octree::Octree;
//! use octknn::vertex::vertices_from_points;
//!
//! let points: Vec<[f64; 3]> = (0..64)
//!     .map(|i| [(i % 4) as f64, ((i / 4) % 4) as f64, (i / 16) as f64])
//!     .collect();
//! let vertices = vertices_from_points(&points, 6);
//! let tree = Octree::build(&vertices, 8).unwrap();
//!
//! let nearest = tree.nearest_n(&[0.1, 0.0, 0.0], 1);
//! assert_eq!(nearest[0].item, 0);
//! ```

pub mod construction;
pub mod iter;
pub mod key;
pub mod query;
mod tree;

pub use construction::{DEFAULT_LEAF_SIZE, PARALLEL_BUILD_CUTOFF};
pub use iter::{FlattenIter, LeafIter, PARALLEL_MAP_CUTOFF};
pub use tree::{Node, NodeKind, Octree, ROOT};
