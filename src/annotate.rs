//! Batch all-points k-nearest-neighbour annotation.
//!
//! Every vertex is queried once against a tree built over the whole set, and
//! its neighbour slots are overwritten with the result. Queries are
//! independent and run in parallel; they are issued in the tree's Z-order so
//! that neighbouring queries touch neighbouring memory.

use rayon::prelude::*;

#[cfg(feature = "tracing")]
use tracing::{event, span, Level};

use crate::config::{KnnConfig, SearchStrategy};
use crate::error::KnnError;
use crate::octree::query::{KnnQuery, KnnResult, SearchStart};
use crate::octree::Octree;
use crate::types::{Axis, NodeId, VertexId};
use crate::vertex::Vertex;

/// Summary of one batch run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AnnotateStats {
    /// vertices queried
    pub queries: usize,
    /// depth of the tree that was built
    pub depth: usize,
    /// number of leaves in that tree
    pub leaf_count: usize,
    /// most nodes any single query visited
    pub max_nodes_visited: usize,
    /// mean nodes visited per query
    pub avg_nodes_visited: f64,
    /// leaves scanned by all queries together
    pub total_leaves_visited: usize,
    /// distances computed by all queries together
    pub total_distance_evals: usize,
}

impl AnnotateStats {
    fn gather<A: Axis>(depth: usize, leaf_count: usize, results: &[KnnResult<A>]) -> Self {
        let mut stats = Self {
            queries: results.len(),
            depth,
            leaf_count,
            ..Self::default()
        };

        let mut total_nodes = 0usize;
        for r in results {
            total_nodes += r.stats.nodes_visited;
            stats.max_nodes_visited = stats.max_nodes_visited.max(r.stats.nodes_visited);
            stats.total_leaves_visited += r.stats.leaves_visited;
            stats.total_distance_evals += r.stats.distance_evals;
        }
        if !results.is_empty() {
            stats.avg_nodes_visited = total_nodes as f64 / results.len() as f64;
        }
        stats
    }
}

impl<'v, A: Axis, const K: usize> Octree<'v, A, K> {
    /// Finds the `config.k` nearest neighbours of every vertex in the tree.
    ///
    /// The result is indexed by vertex: entry `i` belongs to vertex `i` of
    /// [`backing_vertices`](Self::backing_vertices). The tree's own leaf size
    /// is used; `config.leaf_size` only matters when building.
    ///
    /// # Errors
    ///
    /// [`KnnError::KTooLarge`] if some vertex has fewer slots than `config.k`,
    /// or the configuration's own validation error.
    pub fn annotate(&self, config: &KnnConfig) -> Result<Vec<KnnResult<A>>, KnnError> {
        config.validate()?;
        if let Some(short) = self
            .vertices
            .par_iter()
            .find_first(|v| v.capacity() < config.k)
        {
            return Err(KnnError::KTooLarge {
                k: config.k,
                capacity: short.capacity(),
            });
        }

        #[cfg(feature = "tracing")]
        let _span = span!(
            Level::TRACE,
            "search",
            n = self.len(),
            k = config.k,
            strategy = ?config.strategy
        )
        .entered();

        let in_order: Vec<KnnResult<A>> = match config.strategy {
            SearchStrategy::RootBased => self
                .order
                .par_iter()
                .map(|&v| self.search_vertex(v, SearchStart::Root, config))
                .collect(),
            SearchStrategy::LeafByKey => {
                let (bbox, delta) = self.box_delta();
                self.order
                    .par_iter()
                    .map(|&v| {
                        let leaf = self.find_leaf(self.point(v), &bbox, delta);
                        self.search_vertex(v, SearchStart::Leaf(leaf), config)
                    })
                    .collect()
            }
            SearchStrategy::LeafByTraversal => {
                let mut out = vec![KnnResult::default(); self.len()];
                self.map(&mut out, &|v: VertexId, leaf: NodeId| {
                    self.search_vertex(v, SearchStart::Leaf(leaf), config)
                });
                out
            }
        };

        let mut by_vertex = vec![KnnResult::default(); self.len()];
        for (&v, result) in self.order.iter().zip(in_order) {
            by_vertex[v] = result;
        }
        Ok(by_vertex)
    }

    fn search_vertex(&self, v: VertexId, start: SearchStart, config: &KnnConfig) -> KnnResult<A> {
        let mut query = KnnQuery::unchecked(*self.point(v), config.k, config.queue_cutoff).excluding(v);
        if let Some(cutoff) = config.fan_out() {
            query = query.with_fan_out(cutoff);
        }
        query.search(self, start);
        query.into_result()
    }
}

/// Builds a tree over `vertices` and writes each vertex's `config.k` nearest
/// neighbours into its slots, nearest first.
///
/// Slots beyond the number of neighbours found are set to `None`; a vertex is
/// never its own neighbour. With `config.report_stats` each vertex's `counter`
/// is set to the number of nodes its query visited and a summary is logged.
/// An empty slice is left alone.
///
/// # Examples
///
/// ```rust
/// use octknn::annotate::annotate_neighbours;
/// use octknn::config::KnnConfig;
/// use octknn::vertex::vertices_from_points;
///
/// let mut vertices = vertices_from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]], 2);
/// annotate_neighbours(&mut vertices, &KnnConfig::default().with_k(2)).unwrap();
///
/// assert_eq!(vertices[0].neighbours.as_ref(), &[Some(1), Some(2)]);
/// assert_eq!(vertices[3].neighbours.as_ref(), &[Some(1), Some(2)]);
/// ```
pub fn annotate_neighbours<A: Axis, const K: usize>(
    vertices: &mut [Vertex<A, K>],
    config: &KnnConfig,
) -> Result<AnnotateStats, KnnError> {
    config.validate()?;
    if vertices.is_empty() {
        return Ok(AnnotateStats::default());
    }

    let (results, stats) = {
        let tree = Octree::build(vertices, config.leaf_size)?;
        let results = tree.annotate(config)?;
        let stats = AnnotateStats::gather(tree.depth(), tree.leaf_count(), &results);
        (results, stats)
    };

    {
        #[cfg(feature = "tracing")]
        let _span = span!(Level::TRACE, "write back").entered();

        vertices
            .par_iter_mut()
            .zip(results.par_iter())
            .for_each(|(vertex, result)| {
                vertex.write_neighbours(result.neighbours.iter().map(|n| n.item));
                if config.report_stats {
                    vertex.counter = result.stats.nodes_visited;
                }
            });
    }

    if config.report_stats {
        #[cfg(feature = "tracing")]
        event!(
            Level::INFO,
            queries = stats.queries,
            depth = stats.depth,
            leaves = stats.leaf_count,
            max_nodes_visited = stats.max_nodes_visited,
            avg_nodes_visited = stats.avg_nodes_visited,
            leaves_visited = stats.total_leaves_visited,
            distance_evals = stats.total_distance_evals,
            "neighbours annotated"
        );
    }

    Ok(stats)
}
