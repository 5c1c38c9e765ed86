use crate::octree::tree::{NodeKind, Octree, ROOT};
use crate::types::{Axis, NodeId, VertexId};

/// Subtrees with more vertices than this are traversed with `rayon::join` by [`Octree::map`].
pub const PARALLEL_MAP_CUTOFF: usize = 1000;

/// Lazy left-to-right walk over the leaves of an [`Octree`].
#[derive(Debug, Clone)]
pub struct LeafIter<'t, 'v, A: Axis, const K: usize> {
    tree: &'t Octree<'v, A, K>,
    stack: Vec<NodeId>,
}

impl<'t, 'v, A: Axis, const K: usize> LeafIter<'t, 'v, A, K> {
    pub(crate) fn new(tree: &'t Octree<'v, A, K>) -> Self {
        Self {
            tree,
            stack: vec![ROOT],
        }
    }
}

impl<'t, 'v, A: Axis, const K: usize> Iterator for LeafIter<'t, 'v, A, K> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match self.tree.kind(node) {
                NodeKind::Leaf => return Some(node),
                NodeKind::Stem { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
        None
    }
}

/// Lazy walk over every vertex index, leaf by leaf. Returned by [`Octree::flatten`].
#[derive(Debug, Clone)]
pub struct FlattenIter<'t, 'v, A: Axis, const K: usize> {
    leaves: LeafIter<'t, 'v, A, K>,
    current: std::slice::Iter<'t, VertexId>,
}

impl<'t, 'v, A: Axis, const K: usize> Iterator for FlattenIter<'t, 'v, A, K> {
    type Item = VertexId;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(&v) = self.current.next() {
                return Some(v);
            }
            let tree = self.leaves.tree;
            let leaf = self.leaves.next()?;
            self.current = tree.vertices(leaf).iter();
        }
    }
}

impl<'v, A: Axis, const K: usize> Octree<'v, A, K> {
    /// Iterates over leaf ids, left to right.
    pub fn leaves(&self) -> LeafIter<'_, 'v, A, K> {
        LeafIter::new(self)
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Leaf))
            .count()
    }

    /// Iterates over every vertex index, leaf by leaf from left to right.
    ///
    /// Consecutive vertices are close along the Z-order curve, so walking a
    /// vertex set in this order gives queries good cache locality. Each call
    /// starts a fresh iteration.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use octknn::octree::Octree;
    /// use octknn::vertex::vertices_from_points;
    ///
    /// let vertices = vertices_from_points(&[[9.0, 9.0], [0.0, 0.0], [8.0, 9.0], [1.0, 0.0]], 1);
    /// let tree = Octree::build(&vertices, 1).unwrap();
    ///
    /// assert_eq!(tree.flatten().collect::<Vec<_>>(), vec![1, 3, 2, 0]);
    /// ```
    pub fn flatten(&self) -> FlattenIter<'_, 'v, A, K> {
        FlattenIter {
            leaves: self.leaves(),
            current: [].iter(),
        }
    }

    /// Calls `f(vertex, leaf)` for every vertex and the leaf holding it, in
    /// parallel, writing each result into `out` at the vertex's position in
    /// [`flatten`](Self::flatten) order.
    ///
    /// # Panics
    ///
    /// if `out.len() != self.len()`
    pub fn map<R, F>(&self, out: &mut [R], f: &F)
    where
        R: Send,
        F: Fn(VertexId, NodeId) -> R + Sync,
    {
        assert_eq!(
            out.len(),
            self.len(),
            "map output must have one slot per vertex"
        );
        self.map_recurse(ROOT, out, f);
    }

    fn map_recurse<R, F>(&self, node: NodeId, out: &mut [R], f: &F)
    where
        R: Send,
        F: Fn(VertexId, NodeId) -> R + Sync,
    {
        match self.kind(node) {
            NodeKind::Leaf => self
                .vertices(node)
                .iter()
                .zip(out.iter_mut())
                .for_each(|(&v, slot)| *slot = f(v, node)),
            NodeKind::Stem { left, right, .. } => {
                let (left_out, right_out) = out.split_at_mut(self.size(left));
                if self.size(node) > PARALLEL_MAP_CUTOFF {
                    rayon::join(
                        || self.map_recurse(left, left_out, f),
                        || self.map_recurse(right, right_out, f),
                    );
                } else {
                    self.map_recurse(left, left_out, f);
                    self.map_recurse(right, right_out, f);
                }
            }
        }
    }
}
