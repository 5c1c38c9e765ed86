use crate::neighbour::Neighbour;
use crate::octree::query::{KnnQuery, KnnResult, SearchStart};
use crate::octree::tree::Octree;
use crate::types::{Axis, VertexId};

impl<'v, A: Axis, const K: usize> Octree<'v, A, K> {
    /// Finds the `qty` vertices nearest to `query`, searching from the root.
    ///
    /// Results are sorted nearest first, ties broken by vertex index; distances
    /// are squared Euclidean.
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
    /// let nearest = tree.nearest_n(&[4.0, 4.0], 2);
    ///
    /// assert_eq!(nearest[0].item, 3);
    /// assert_eq!(nearest[0].distance, 2.0);
    /// assert_eq!(nearest[1].item, 1);
    /// ```
    pub fn nearest_n(&self, query: &[A; K], qty: usize) -> Vec<Neighbour<A>> {
        let mut search = KnnQuery::unbounded(*query, qty);
        search.search(self, SearchStart::Root);
        search.into_result().neighbours
    }

    /// Same results as [`nearest_n`](Self::nearest_n), found by locating the
    /// leaf for `query` and climbing from there.
    pub fn nearest_n_from_leaf(&self, query: &[A; K], qty: usize) -> Vec<Neighbour<A>> {
        let mut search = KnnQuery::unbounded(*query, qty);
        search.search(self, SearchStart::Leaf(self.locate(query)));
        search.into_result().neighbours
    }

    /// Finds the `qty` nearest neighbours of member vertex `vertex`, which is
    /// never its own neighbour. Other vertices at the same position are.
    ///
    /// # Panics
    ///
    /// if `vertex` is not an index into the backing vertices
    pub fn nearest_n_vertex(
        &self,
        vertex: VertexId,
        qty: usize,
        start: SearchStart,
    ) -> KnnResult<A> {
        let mut search = KnnQuery::unbounded(*self.point(vertex), qty).excluding(vertex);
        search.search(self, start);
        search.into_result()
    }
}

#[cfg(test)]
mod tests {
    use crate::octree::query::SearchStart;
    use crate::octree::Octree;
    use crate::test_utils::{brute_force_knn, random_vertices};
    use crate::vertex::{vertices_from_points, Vertex};

    #[test]
    fn free_point_queries_match_brute_force() {
        let vertices: Vec<Vertex<f64, 2>> = random_vertices(2_500, 1, 61);
        let tree = Octree::build(&vertices, 10).unwrap();

        for query in [[0.5, 0.5], [0.0, 1.0], [-0.25, 0.3], [1.5, 1.5]] {
            let expected = brute_force_knn(&vertices, &query, 7, None);
            assert_eq!(tree.nearest_n(&query, 7), expected);
            assert_eq!(tree.nearest_n_from_leaf(&query, 7), expected);
        }
    }

    #[test]
    fn vertex_query_excludes_only_itself() {
        let vertices = vertices_from_points(&[[1.0f64, 1.0], [1.0, 1.0], [3.0, 1.0]], 2);
        let tree = Octree::build(&vertices, 1).unwrap();

        let found = tree.nearest_n_vertex(0, 2, SearchStart::Root);
        assert_eq!(found.items(), vec![1, 2]);
        assert_eq!(found.neighbours[0].distance, 0.0);
        assert_eq!(found.neighbours[1].distance, 4.0);
    }

    #[test]
    fn more_than_available_returns_everything_else() {
        let vertices = vertices_from_points(&[[0.0f32, 0.0], [2.0, 0.0], [0.0, 3.0]], 8);
        let tree = Octree::build(&vertices, 1).unwrap();

        let found = tree.nearest_n_vertex(0, 8, SearchStart::Leaf(tree.locate(&[0.0, 0.0])));
        assert_eq!(found.items(), vec![1, 2]);
    }

    #[test]
    fn zero_neighbours_visits_nothing() {
        let vertices: Vec<Vertex<f64, 2>> = random_vertices(100, 1, 1);
        let tree = Octree::build(&vertices, 4).unwrap();

        let found = tree.nearest_n_vertex(5, 0, SearchStart::Root);
        assert!(found.neighbours.is_empty());
        assert_eq!(found.stats.nodes_visited, 0);
    }
}
