use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::{event, span, Level};

use crate::bounding_box::BoundingBox;
use crate::error::KnnError;
use crate::octree::key::{bits_per_dim, interleave_bits, used_key_bits};
use crate::octree::tree::{Node, NodeKind, Octree};
use crate::types::{Axis, NodeId, VertexId};
use crate::vertex::Vertex;

/// Subtrees with more vertices than this are built with `rayon::join`.
pub const PARALLEL_BUILD_CUTOFF: usize = 1000;

/// Default maximum number of vertices per leaf.
pub const DEFAULT_LEAF_SIZE: usize = 16;

type Keyed = (u64, VertexId);

impl<'v, A: Axis, const K: usize> Octree<'v, A, K> {
    /// Builds an octree over `vertices`.
    ///
    /// Vertices are sorted along the Z-order curve of the root box, then split
    /// recursively on key bits from the most significant down until at most
    /// `leaf_size` remain. Leaves only exceed `leaf_size` when every key in
    /// them is identical (coincident points, or points closer together than the
    /// key resolution).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use octknn::octree::Octree;
    /// use octknn::vertex::vertices_from_points;
    ///
    /// let vertices = vertices_from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]], 1);
    /// let tree = Octree::build(&vertices, 2).unwrap();
    ///
    /// assert_eq!(tree.len(), 4);
    /// assert!(!tree.is_leaf(tree.root()));
    /// ```
    pub fn build(vertices: &'v [Vertex<A, K>], leaf_size: usize) -> Result<Self, KnnError> {
        #[cfg(feature = "tracing")]
        let _span = span!(Level::TRACE, "build tree", n = vertices.len(), leaf_size).entered();

        if leaf_size == 0 {
            return Err(KnnError::InvalidLeafSize);
        }
        if bits_per_dim::<K>() == 0 {
            return Err(KnnError::DimensionTooLarge { dims: K });
        }
        if vertices.is_empty() {
            return Err(KnnError::EmptyInput);
        }
        if let Some(index) = vertices
            .par_iter()
            .position_first(|v| v.point.iter().any(|c| !c.is_finite()))
        {
            return Err(KnnError::NonFiniteCoordinate { index });
        }

        let root_box = vertices
            .par_iter()
            .fold(BoundingBox::empty, |mut bbox, v| {
                bbox.extend(&v.point);
                bbox
            })
            .reduce(BoundingBox::empty, |a, b| a.union(&b));
        let delta = root_box.max_extent();

        let mut keyed: Vec<Keyed> = vertices
            .par_iter()
            .enumerate()
            .map(|(idx, v)| (interleave_bits(&v.point, &root_box.min, delta), idx))
            .collect();
        keyed.par_sort_unstable();

        let nodes = Self::build_recursive(vertices, &keyed, 0, used_key_bits::<K>(), leaf_size);
        let order = keyed.into_par_iter().map(|(_, idx)| idx).collect();

        let tree = Self {
            vertices,
            nodes,
            order,
            leaf_size,
            delta,
        };

        #[cfg(feature = "tracing")]
        event!(
            Level::DEBUG,
            nodes = tree.node_count(),
            depth = tree.depth(),
            ?delta,
            "tree built"
        );

        Ok(tree)
    }

    /// Builds the subtree over `keyed`, whose first entry sits at `start` in the
    /// final order. Returns a local arena whose root is at index 0 with no parent.
    fn build_recursive(
        vertices: &[Vertex<A, K>],
        keyed: &[Keyed],
        start: usize,
        bit: u32,
        leaf_size: usize,
    ) -> Vec<Node<A, K>> {
        let n = keyed.len();

        if n <= leaf_size || bit == 0 {
            if n > leaf_size {
                #[cfg(feature = "tracing")]
                event!(
                    Level::WARN,
                    n,
                    leaf_size,
                    key = keyed[0].0,
                    "key bits exhausted, leaf exceeds leaf size"
                );
            }

            let bbox = BoundingBox::from_points(keyed.iter().map(|&(_, idx)| &vertices[idx].point));
            return vec![Node {
                bbox,
                parent: None,
                start,
                size: n,
                kind: NodeKind::Leaf,
            }];
        }

        let mask = 1u64 << (bit - 1);
        let pos = keyed.partition_point(|&(key, _)| key & mask == 0);

        // every vertex agrees on this bit, so it doesn't split anything
        if pos == 0 || pos == n {
            return Self::build_recursive(vertices, keyed, start, bit - 1, leaf_size);
        }

        let (lower, upper) = keyed.split_at(pos);
        let (left, right) = if n > PARALLEL_BUILD_CUTOFF {
            rayon::join(
                || Self::build_recursive(vertices, lower, start, bit - 1, leaf_size),
                || Self::build_recursive(vertices, upper, start + pos, bit - 1, leaf_size),
            )
        } else {
            (
                Self::build_recursive(vertices, lower, start, bit - 1, leaf_size),
                Self::build_recursive(vertices, upper, start + pos, bit - 1, leaf_size),
            )
        };

        let left_idx: NodeId = 1;
        let right_idx: NodeId = 1 + left.len();

        let mut nodes = Vec::with_capacity(1 + left.len() + right.len());
        nodes.push(Node {
            bbox: left[0].bbox.union(&right[0].bbox),
            parent: None,
            start,
            size: n,
            kind: NodeKind::Stem {
                bit,
                left: left_idx,
                right: right_idx,
            },
        });
        Self::append_shifted(&mut nodes, left, left_idx);
        Self::append_shifted(&mut nodes, right, right_idx);

        nodes
    }

    /// Appends a child's local arena at `offset`, re-basing its ids and
    /// linking its root to the node at index 0.
    fn append_shifted(nodes: &mut Vec<Node<A, K>>, child: Vec<Node<A, K>>, offset: NodeId) {
        nodes.extend(child.into_iter().map(|mut node| {
            node.parent = Some(node.parent.map_or(0, |p| p + offset));
            if let NodeKind::Stem { left, right, .. } = &mut node.kind {
                *left += offset;
                *right += offset;
            }
            node
        }));
    }

    /// Reorders `indices` along the Z-order curve of this tree's root box.
    /// Equal keys are ordered by vertex index.
    pub fn z_sort(&self, indices: &[VertexId]) -> Vec<VertexId> {
        let (root_box, delta) = self.box_delta();
        let mut keyed: Vec<Keyed> = indices
            .par_iter()
            .map(|&idx| (interleave_bits(self.point(idx), &root_box.min, delta), idx))
            .collect();
        keyed.par_sort_unstable();
        keyed.into_par_iter().map(|(_, idx)| idx).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::KnnError;
    use crate::octree::tree::NodeKind;
    use crate::octree::Octree;
    use crate::test_utils::random_vertices;
    use crate::vertex::{vertices_from_points, Vertex};
    use rstest::rstest;

    fn assert_well_formed<A: crate::types::Axis, const K: usize>(tree: &Octree<A, K>) {
        let mut seen = vec![0usize; tree.len()];

        for id in 0..tree.node_count() {
            let bbox = tree.bbox(id);
            match tree.kind(id) {
                NodeKind::Leaf => {
                    assert!(tree.size(id) > 0);
                    for &v in tree.vertices(id) {
                        seen[v] += 1;
                        assert!(bbox.contains(tree.point(v)));
                    }
                }
                NodeKind::Stem { bit, left, right } => {
                    assert!(bit >= 1);
                    assert_eq!(*bbox, tree.bbox(left).union(tree.bbox(right)));
                    for child in [left, right] {
                        assert_eq!(tree.parent(child), Some(id));
                        if let NodeKind::Stem { bit: child_bit, .. } = tree.kind(child) {
                            assert!(child_bit < bit, "split bits must decrease");
                        }
                    }
                }
            }
        }

        assert!(seen.iter().all(|&count| count == 1), "every vertex in exactly one leaf");
    }

    #[rstest]
    #[case(1, 1)]
    #[case(100, 1)]
    #[case(100, 16)]
    #[case(5_000, 16)]
    #[case(5_000, 64)]
    fn random_trees_are_well_formed(#[case] n: usize, #[case] leaf_size: usize) {
        let vertices: Vec<Vertex<f64, 3>> = random_vertices(n, 1, 17);
        let tree = Octree::build(&vertices, leaf_size).unwrap();

        assert_eq!(tree.len(), n);
        assert_well_formed(&tree);
        for id in 0..tree.node_count() {
            if tree.is_leaf(id) {
                assert!(tree.size(id) <= leaf_size);
            }
        }
    }

    #[test]
    fn root_box_contains_everything() {
        let vertices: Vec<Vertex<f32, 2>> = random_vertices(2_000, 1, 3);
        let tree = Octree::build(&vertices, 8).unwrap();
        let (root_box, delta) = tree.box_delta();

        assert!(vertices.iter().all(|v| root_box.contains(&v.point)));
        assert_eq!(delta, root_box.max_extent());
    }

    #[test]
    fn coincident_points_share_an_oversized_leaf() {
        let mut points = vec![[1.0f64, 1.0]; 10];
        points.push([2.0, 2.0]);
        let vertices = vertices_from_points(&points, 1);
        let tree = Octree::build(&vertices, 2).unwrap();

        assert_well_formed(&tree);
        let biggest = (0..tree.node_count())
            .filter(|&id| tree.is_leaf(id))
            .map(|id| tree.size(id))
            .max();
        assert_eq!(biggest, Some(10));
    }

    #[test]
    fn build_is_deterministic() {
        let vertices: Vec<Vertex<f64, 2>> = random_vertices(3_000, 1, 99);
        let a = Octree::build(&vertices, 10).unwrap();
        let b = Octree::build(&vertices, 10).unwrap();

        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.order, b.order);
    }

    #[test]
    fn z_sort_matches_flatten() {
        let vertices: Vec<Vertex<f64, 2>> = random_vertices(500, 1, 5);
        let tree = Octree::build(&vertices, 4).unwrap();
        let all: Vec<usize> = (0..vertices.len()).collect();

        assert_eq!(tree.z_sort(&all), tree.flatten().collect::<Vec<_>>());
    }

    #[test]
    fn rejects_zero_leaf_size() {
        let vertices = vertices_from_points(&[[0.0f64, 0.0]], 1);
        assert_eq!(
            Octree::build(&vertices, 0).unwrap_err(),
            KnnError::InvalidLeafSize
        );
    }

    #[test]
    fn rejects_empty_input() {
        let vertices: Vec<Vertex<f64, 2>> = vec![];
        assert_eq!(
            Octree::build(&vertices, 4).unwrap_err(),
            KnnError::EmptyInput
        );
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let vertices = vertices_from_points(&[[0.0f64, 0.0], [1.0, f64::NAN], [f64::INFINITY, 0.0]], 1);
        assert_eq!(
            Octree::build(&vertices, 4).unwrap_err(),
            KnnError::NonFiniteCoordinate { index: 1 }
        );
    }
}
