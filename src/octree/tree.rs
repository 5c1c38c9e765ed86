//! The octree itself: a node arena plus the Z-order permutation of the vertices.

use crate::bounding_box::BoundingBox;
use crate::types::{Axis, NodeId, VertexId};
use crate::vertex::Vertex;

/// Id of the root node in every tree.
pub const ROOT: NodeId = 0;

/// What a node is: a leaf holding vertices, or a stem splitting on a key bit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// holds the vertices `order[start..start + size]` of its node
    Leaf,
    /// splits its vertices on bit `bit - 1` of their keys: clear goes left, set goes right
    Stem {
        /// 1-based key bit position
        bit: u32,
        /// child holding the vertices whose split bit is clear
        left: NodeId,
        /// child holding the vertices whose split bit is set
        right: NodeId,
    },
}

#[doc(hidden)]
#[derive(Clone, Debug, PartialEq)]
pub struct Node<A: Axis, const K: usize> {
    pub(crate) bbox: BoundingBox<A, K>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) start: usize,
    pub(crate) size: usize,
    pub(crate) kind: NodeKind,
}

/// Octree over a borrowed slice of vertices.
///
/// Vertices are ordered along a Z-order curve and recursively split on key
/// bits into a binary tree of stems, with runs of at most `leaf_size`
/// vertices at the leaves. Every node knows its bounding box, its subtree
/// size and its parent, so a search can start at a leaf and climb.
///
/// Nodes live in an arena and are addressed by [`NodeId`]; the root is
/// [`ROOT`]. The navigation methods panic when used against the grain
/// (children of a leaf, vertices of a stem, unknown ids).
#[derive(Clone, Debug)]
pub struct Octree<'v, A: Axis, const K: usize> {
    pub(crate) vertices: &'v [Vertex<A, K>],
    pub(crate) nodes: Vec<Node<A, K>>,
    pub(crate) order: Vec<VertexId>,
    pub(crate) leaf_size: usize,
    pub(crate) delta: A,
}

impl<'v, A: Axis, const K: usize> Octree<'v, A, K> {
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &Node<A, K> {
        self.nodes
            .get(id)
            .unwrap_or_else(|| panic!("node {id} is not in a tree of {} nodes", self.nodes.len()))
    }

    /// Id of the root node.
    #[inline]
    pub fn root(&self) -> NodeId {
        ROOT
    }

    /// Number of vertices in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the tree holds no vertices. Never true for a successfully built tree.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of nodes, stems and leaves together.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The leaf size the tree was built with.
    #[inline]
    pub fn leaf_size(&self) -> usize {
        self.leaf_size
    }

    /// The vertex slice the tree was built over.
    #[inline]
    pub fn backing_vertices(&self) -> &'v [Vertex<A, K>] {
        self.vertices
    }

    /// Co-ordinates of vertex `idx`.
    #[inline]
    pub fn point(&self, idx: VertexId) -> &'v [A; K] {
        &self.vertices[idx].point
    }

    /// Bounding box of the vertices under `node`.
    #[inline]
    pub fn bbox(&self, node: NodeId) -> &BoundingBox<A, K> {
        &self.node(node).bbox
    }

    /// Midpoint of the bounding box of `node`.
    #[inline]
    pub fn center(&self, node: NodeId) -> [A; K] {
        self.node(node).bbox.center()
    }

    /// Whether `node` is a leaf.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        matches!(self.node(node).kind, NodeKind::Leaf)
    }

    /// The kind of `node`, with a stem's split bit and children.
    #[inline]
    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.node(node).kind
    }

    /// Number of vertices under `node`.
    #[inline]
    pub fn size(&self, node: NodeId) -> usize {
        self.node(node).size
    }

    /// Parent of `node`, or `None` for the root.
    #[inline]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    /// Left child of a stem.
    ///
    /// # Panics
    ///
    /// if `node` is a leaf
    #[inline]
    pub fn left(&self, node: NodeId) -> NodeId {
        match self.node(node).kind {
            NodeKind::Stem { left, .. } => left,
            NodeKind::Leaf => panic!("left() called on leaf node {node}"),
        }
    }

    /// Right child of a stem.
    ///
    /// # Panics
    ///
    /// if `node` is a leaf
    #[inline]
    pub fn right(&self, node: NodeId) -> NodeId {
        match self.node(node).kind {
            NodeKind::Stem { right, .. } => right,
            NodeKind::Leaf => panic!("right() called on leaf node {node}"),
        }
    }

    /// The 1-based key bit a stem splits on.
    ///
    /// # Panics
    ///
    /// if `node` is a leaf
    #[inline]
    pub fn split_bit(&self, node: NodeId) -> u32 {
        match self.node(node).kind {
            NodeKind::Stem { bit, .. } => bit,
            NodeKind::Leaf => panic!("split_bit() called on leaf node {node}"),
        }
    }

    /// The other child of `node`'s parent, or `None` for the root.
    pub fn sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let left = self.left(parent);
        Some(if left == node { self.right(parent) } else { left })
    }

    /// Indices of the vertices held by a leaf.
    ///
    /// # Panics
    ///
    /// if `node` is a stem
    #[inline]
    pub fn vertices(&self, node: NodeId) -> &[VertexId] {
        let n = self.node(node);
        match n.kind {
            NodeKind::Leaf => &self.order[n.start..n.start + n.size],
            NodeKind::Stem { .. } => panic!("vertices() called on stem node {node}"),
        }
    }

    /// Indices of every vertex under `node`, leaf or stem, in Z-order.
    #[inline]
    pub fn subtree_vertices(&self, node: NodeId) -> &[VertexId] {
        let n = self.node(node);
        &self.order[n.start..n.start + n.size]
    }

    /// The root box and its largest extent ("Delta"): the pair the keys were built with.
    pub fn box_delta(&self) -> (BoundingBox<A, K>, A) {
        (self.node(ROOT).bbox, self.delta)
    }

    /// Largest number of edges on any root-to-leaf path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use octknn::octree::Octree;
    /// use octknn::vertex::vertices_from_points;
    ///
    /// let vertices = vertices_from_points(&[[0.0, 0.0], [1.0, 1.0]], 1);
    /// let tree = Octree::build(&vertices, 1).unwrap();
    ///
    /// assert_eq!(tree.depth(), 1);
    /// ```
    pub fn depth(&self) -> usize {
        // the arena is in pre-order, so parents precede children
        let mut depths = vec![0usize; self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate().skip(1) {
            if let Some(parent) = node.parent {
                depths[id] = depths[parent] + 1;
            }
        }
        depths.into_iter().max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::octree::Octree;
    use crate::vertex::vertices_from_points;

    #[test]
    fn single_vertex_tree_is_a_root_leaf() {
        let vertices = vertices_from_points(&[[4.0f64, 2.0]], 1);
        let tree = Octree::build(&vertices, 8).unwrap();

        assert_eq!(tree.node_count(), 1);
        assert!(tree.is_leaf(tree.root()));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.sibling(tree.root()), None);
        assert_eq!(tree.vertices(tree.root()), &[0]);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.box_delta().1, 0.0);
    }

    #[test]
    fn children_link_back_to_parent() {
        let points: Vec<[f64; 2]> = (0..64)
            .map(|i| [(i % 8) as f64, (i / 8) as f64])
            .collect();
        let vertices = vertices_from_points(&points, 1);
        let tree = Octree::build(&vertices, 4).unwrap();

        for id in 0..tree.node_count() {
            if !tree.is_leaf(id) {
                let (l, r) = (tree.left(id), tree.right(id));
                assert_eq!(tree.parent(l), Some(id));
                assert_eq!(tree.parent(r), Some(id));
                assert_eq!(tree.sibling(l), Some(r));
                assert_eq!(tree.sibling(r), Some(l));
                assert_eq!(tree.size(id), tree.size(l) + tree.size(r));
            }
        }
    }

    #[test]
    #[should_panic(expected = "left() called on leaf")]
    fn left_of_leaf_panics() {
        let vertices = vertices_from_points(&[[0.0f32, 0.0]], 1);
        let tree = Octree::build(&vertices, 8).unwrap();
        tree.left(tree.root());
    }

    #[test]
    #[should_panic(expected = "vertices() called on stem")]
    fn vertices_of_stem_panics() {
        let vertices = vertices_from_points(&[[0.0f32, 0.0], [1.0, 1.0]], 1);
        let tree = Octree::build(&vertices, 1).unwrap();
        tree.vertices(tree.root());
    }

    #[test]
    #[should_panic(expected = "is not in a tree")]
    fn unknown_node_panics() {
        let vertices = vertices_from_points(&[[0.0f32, 0.0]], 1);
        let tree = Octree::build(&vertices, 8).unwrap();
        tree.bbox(7);
    }
}
