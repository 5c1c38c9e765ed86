//! k-nearest-neighbour search over an [`Octree`].
//!
//! A [`KnnQuery`] is the per-query state: the query point, the vertex to
//! exclude (the query vertex itself, when querying a member of the set), the
//! top-k [`Candidates`] and some visit counters. One search routine serves
//! every strategy; it differs only in where it starts:
//!
//! * from the root, descending recursively into every child whose box,
//!   expanded by the current pruning radius, still holds the query point;
//! * from a leaf, scanning it and then climbing towards the root, searching
//!   each sibling subtree on the way, until the pruning ball fits strictly
//!   inside the current node's box.
//!
//! The climb can stop early because every node holds exactly the vertices
//! whose keys share its prefix, and those form an axis-aligned cell that
//! contains the node's box. A ball strictly inside the box is strictly
//! inside the cell, so no vertex outside the node can be within the
//! pruning radius.
//!
//! Large subtrees may be searched in parallel: the query forks into two
//! copies, each searches one child, and the copies are merged back.

mod find_leaf;
mod nearest_n;

use crate::distance::squared_euclidean;
use crate::error::KnnError;
use crate::neighbour::Neighbour;
use crate::octree::tree::{NodeKind, Octree};
use crate::result_collection::{Candidates, ResultCollection, DEFAULT_QUEUE_CUTOFF};
use crate::types::{Axis, NodeId, VertexId};

/// Default subtree size above which a forking query searches both children in parallel.
pub const DEFAULT_FAN_OUT_CUTOFF: usize = 10_000;

/// Where a search begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStart {
    /// descend from the root
    Root,
    /// scan this node (normally the leaf holding the query point), then climb
    Leaf(NodeId),
}

/// What happened when the search reached a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeVisit {
    /// the node's box is out of reach of the pruning radius; skipped
    Pruned,
    /// a leaf whose vertices were all offered to the accumulator
    ScannedLeaf,
    /// a stem whose children were searched
    Descended,
}

/// Diagnostic counters gathered by a query.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VisitStats {
    /// nodes reached, pruned or not
    pub nodes_visited: usize,
    /// leaves scanned
    pub leaves_visited: usize,
    /// vertex distances computed
    pub distance_evals: usize,
}

impl std::ops::AddAssign for VisitStats {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes_visited += rhs.nodes_visited;
        self.leaves_visited += rhs.leaves_visited;
        self.distance_evals += rhs.distance_evals;
    }
}

/// Outcome of one query: its neighbours, nearest first, and its counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KnnResult<A: Axis> {
    /// up to `k` neighbours, nearest first
    pub neighbours: Vec<Neighbour<A>>,
    /// visit counters
    pub stats: VisitStats,
}

impl<A: Axis> KnnResult<A> {
    /// Indices of the neighbours, nearest first.
    pub fn items(&self) -> Vec<VertexId> {
        self.neighbours.iter().map(|n| n.item).collect()
    }
}

/// Search state for a single k-nearest-neighbour query.
#[derive(Clone, Debug)]
pub struct KnnQuery<A: Axis, const K: usize> {
    point: [A; K],
    exclude: Option<VertexId>,
    candidates: Candidates<A>,
    fan_out_cutoff: Option<usize>,
    stats: VisitStats,
}

impl<A: Axis, const K: usize> KnnQuery<A, K> {
    /// Creates a query for the `k` nearest neighbours of `point`.
    ///
    /// `capacity` is the number of result slots the caller has room for;
    /// asking for more than that is a configuration error. `k` below
    /// `queue_cutoff` uses the sorted-array accumulator, otherwise the heap.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use octknn::error::KnnError;
    /// use octknn::octree::query::KnnQuery;
    ///
    /// assert!(KnnQuery::new([0.0, 0.0], 4, 4, 50).is_ok());
    /// assert_eq!(
    ///     KnnQuery::new([0.0, 0.0], 5, 4, 50).unwrap_err(),
    ///     KnnError::KTooLarge { k: 5, capacity: 4 }
    /// );
    /// ```
    pub fn new(
        point: [A; K],
        k: usize,
        capacity: usize,
        queue_cutoff: usize,
    ) -> Result<Self, KnnError> {
        if k > capacity {
            return Err(KnnError::KTooLarge { k, capacity });
        }
        if queue_cutoff == 0 {
            return Err(KnnError::InvalidQueueCutoff);
        }
        Ok(Self::unchecked(point, k, queue_cutoff))
    }

    /// Creates a query with no capacity limit and the default queue cutoff.
    pub fn unbounded(point: [A; K], k: usize) -> Self {
        Self::unchecked(point, k, DEFAULT_QUEUE_CUTOFF)
    }

    /// Caller has already checked `k` against the capacity and `queue_cutoff > 0`.
    pub(crate) fn unchecked(point: [A; K], k: usize, queue_cutoff: usize) -> Self {
        Self {
            point,
            exclude: None,
            candidates: Candidates::new(k, queue_cutoff),
            fan_out_cutoff: None,
            stats: VisitStats::default(),
        }
    }

    /// Skips `vertex` when scanning leaves; used when the query point is a member of the set.
    pub fn excluding(mut self, vertex: VertexId) -> Self {
        self.exclude = Some(vertex);
        self
    }

    /// Lets the search fork into parallel branches at stems above `cutoff` vertices.
    pub fn with_fan_out(mut self, cutoff: usize) -> Self {
        self.fan_out_cutoff = Some(cutoff);
        self
    }

    /// The current k-th best squared distance, or infinity while fewer than `k` are held.
    #[inline]
    pub fn pruning_distance(&self) -> A {
        self.candidates.pruning_distance()
    }

    /// Counters so far.
    pub fn stats(&self) -> VisitStats {
        self.stats
    }

    /// Offers vertex `item` of `tree` as a candidate.
    #[inline]
    pub fn update_nearest(&mut self, tree: &Octree<A, K>, item: VertexId) {
        let distance = squared_euclidean(&self.point, tree.point(item));
        self.stats.distance_evals += 1;
        self.candidates.update(Neighbour { distance, item });
    }

    /// Epsilon-box test. A positive `epsilon` expands `node`'s box and asks
    /// whether the query point is inside it; a negative `epsilon` (including
    /// `-0.0`) shrinks the box by `|epsilon|` and asks whether the ball of that
    /// radius fits strictly inside.
    pub fn within_epsilon_box(&self, tree: &Octree<A, K>, node: NodeId, epsilon: A) -> bool {
        let bbox = tree.bbox(node);
        if !epsilon.is_sign_negative() {
            bbox.within_expanded(&self.point, epsilon)
        } else {
            bbox.within_shrunk(&self.point, -epsilon)
        }
    }

    #[inline]
    fn radius(&self) -> A {
        self.pruning_distance().sqrt()
    }

    fn center_distance(&self, tree: &Octree<A, K>, node: NodeId) -> A {
        squared_euclidean(&tree.center(node), &self.point)
    }

    /// Runs the search from `start` to completion.
    pub fn search(&mut self, tree: &Octree<A, K>, start: SearchStart) {
        if self.candidates.k() == 0 {
            return;
        }
        match start {
            SearchStart::Root => {
                self.k_nearest_rec(tree, tree.root());
            }
            SearchStart::Leaf(node) => self.k_nearest_from_leaf(tree, node),
        }
    }

    /// Root-down search of the subtree at `node`.
    pub fn k_nearest_rec(&mut self, tree: &Octree<A, K>, node: NodeId) -> NodeVisit {
        self.stats.nodes_visited += 1;

        if !self.within_epsilon_box(tree, node, self.radius()) {
            return NodeVisit::Pruned;
        }

        match tree.kind(node) {
            NodeKind::Leaf => {
                self.scan_leaf(tree, node);
                NodeVisit::ScannedLeaf
            }
            NodeKind::Stem { left, right, .. } => {
                let fork = self
                    .fan_out_cutoff
                    .is_some_and(|cutoff| tree.size(node) > cutoff);

                if fork {
                    let mut l = self.fork();
                    let mut r = self.fork();
                    rayon::join(
                        || l.k_nearest_rec(tree, left),
                        || r.k_nearest_rec(tree, right),
                    );
                    self.join(l, r);
                } else if self.center_distance(tree, left) < self.center_distance(tree, right) {
                    self.k_nearest_rec(tree, left);
                    self.k_nearest_rec(tree, right);
                } else {
                    self.k_nearest_rec(tree, right);
                    self.k_nearest_rec(tree, left);
                }
                NodeVisit::Descended
            }
        }
    }

    /// Leaf-up search: scans `start`, then climbs while the pruning ball
    /// may still reach outside the current node, searching each sibling.
    pub fn k_nearest_from_leaf(&mut self, tree: &Octree<A, K>, start: NodeId) {
        if tree.is_leaf(start) {
            self.stats.nodes_visited += 1;
            self.scan_leaf(tree, start);
        } else {
            self.k_nearest_rec(tree, start);
        }

        let mut current = start;
        while !self.within_epsilon_box(tree, current, -self.radius()) {
            let Some(sibling) = tree.sibling(current) else {
                break;
            };
            self.k_nearest_rec(tree, sibling);
            // sibling() returned Some, so there is a parent
            current = tree.parent(current).unwrap_or(current);
        }
    }

    fn scan_leaf(&mut self, tree: &Octree<A, K>, leaf: NodeId) {
        self.stats.leaves_visited += 1;
        for &v in tree.vertices(leaf) {
            if Some(v) != self.exclude {
                self.update_nearest(tree, v);
            }
        }
    }

    /// A copy to hand to one branch of a parallel search. Counters start at zero.
    fn fork(&self) -> Self {
        Self {
            stats: VisitStats::default(),
            ..self.clone()
        }
    }

    /// Folds two forked branches back in.
    fn join(&mut self, left: Self, right: Self) {
        self.candidates = left.candidates.merge(&right.candidates);
        self.stats += left.stats;
        self.stats += right.stats;
    }

    /// Finishes the query.
    pub fn into_result(self) -> KnnResult<A> {
        KnnResult {
            neighbours: self.candidates.into_sorted_vec(),
            stats: self.stats,
        }
    }
}
