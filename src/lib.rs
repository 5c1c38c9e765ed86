#![warn(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]

//! # octknn
//!
//! Exact all-points k-nearest-neighbour search over a Z-order octree.
//!
//! Given a set of vertices, octknn builds a tree by sorting them along a
//! space-filling curve and splitting on key bits, then finds the `k` nearest
//! other vertices of every vertex and writes them into the vertex's neighbour
//! slots. Tree construction, the batch of queries and (for large subtrees)
//! individual queries all run in parallel on rayon.
//!
//! Results are exact and deterministic: neighbours are ordered by squared
//! Euclidean distance with ties broken by vertex index, whichever search
//! strategy or degree of parallelism is used.
//!
//! ## Usage
//! ```rust
//! use octknn::annotate::annotate_neighbours;
//! use octknn::config::{KnnConfig, SearchStrategy};
//! use octknn::vertex::vertices_from_points;
//!
//! let points = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]];
//! let mut vertices = vertices_from_points(&points, 3);
//!
//! let config = KnnConfig::default()
//!     .with_k(1)
//!     .with_strategy(SearchStrategy::LeafByKey);
//! annotate_neighbours(&mut vertices, &config).unwrap();
//!
//! assert_eq!(vertices[0].neighbour(0), Some(1));
//! assert_eq!(vertices[3].neighbour(0), Some(1));
//! assert_eq!(vertices[3].neighbour(1), None);
//! ```
//!
//! Single queries go through the tree directly:
//! ```rust
//! use octknn::octree::Octree;
//! use octknn::vertex::vertices_from_points;
//!
//! let vertices = vertices_from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]], 0);
//! let tree = Octree::build(&vertices, 2).unwrap();
//!
//! let nearest = tree.nearest_n(&[5.0, 5.0], 2);
//! assert_eq!(nearest[0].item, 3);
//! assert_eq!(nearest[1].distance, 41.0);
//! ```

pub mod annotate;
pub mod bounding_box;
pub mod config;
pub mod distance;
pub mod error;
pub mod neighbour;
pub mod octree;
pub mod result_collection;
#[cfg(any(test, feature = "test_utils"))]
#[doc(hidden)]
pub mod test_utils;
pub mod types;
pub mod vertex;

pub use crate::annotate::{annotate_neighbours, AnnotateStats};
pub use crate::config::{KnnConfig, SearchStrategy};
pub use crate::error::KnnError;
pub use crate::octree::Octree;
pub use crate::vertex::Vertex;
