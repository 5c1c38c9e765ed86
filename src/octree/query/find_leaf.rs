use crate::bounding_box::BoundingBox;
use crate::octree::key::{interleave_bits, lookup_bit};
use crate::octree::tree::{NodeKind, Octree, ROOT};
use crate::types::{Axis, NodeId};

impl<'v, A: Axis, const K: usize> Octree<'v, A, K> {
    /// Walks from the root to the leaf whose key range holds `point`, using the
    /// key built against `bbox.min` and `delta`.
    ///
    /// For a member of the tree, with the pair returned by
    /// [`box_delta`](Self::box_delta), this is the leaf whose
    /// [`vertices`](Self::vertices) contain it. Points outside the box are
    /// clamped onto it, so a leaf is always returned; it is merely the leaf
    /// nearest along the curve rather than a spatially enclosing one.
    pub fn find_leaf(&self, point: &[A; K], bbox: &BoundingBox<A, K>, delta: A) -> NodeId {
        let key = interleave_bits(point, &bbox.min, delta);

        let mut node = ROOT;
        while let NodeKind::Stem { bit, left, right } = self.kind(node) {
            node = if lookup_bit(key, bit) { right } else { left };
        }
        node
    }

    /// [`find_leaf`](Self::find_leaf) against this tree's own root box.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use octknn::octree::Octree;
    /// use octknn::vertex::vertices_from_points;
    ///
    /// let vertices = vertices_from_points(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0]], 1);
    /// let tree = Octree::build(&vertices, 1).unwrap();
    ///
    /// let leaf = tree.locate(&[5.0, 5.0]);
    /// assert_eq!(tree.vertices(leaf), &[3]);
    /// ```
    pub fn locate(&self, point: &[A; K]) -> NodeId {
        let (bbox, delta) = self.box_delta();
        self.find_leaf(point, &bbox, delta)
    }
}

#[cfg(test)]
mod tests {
    use crate::octree::Octree;
    use crate::test_utils::random_vertices;
    use crate::vertex::{vertices_from_points, Vertex};
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(4)]
    #[case(32)]
    fn members_are_found_in_their_leaf(#[case] leaf_size: usize) {
        let vertices: Vec<Vertex<f64, 3>> = random_vertices(3_000, 1, 21);
        let tree = Octree::build(&vertices, leaf_size).unwrap();
        let (bbox, delta) = tree.box_delta();

        for (idx, v) in vertices.iter().enumerate() {
            let leaf = tree.find_leaf(&v.point, &bbox, delta);
            assert!(tree.is_leaf(leaf));
            assert!(tree.vertices(leaf).contains(&idx), "vertex {idx}");
        }
    }

    #[test]
    fn outside_points_still_reach_a_leaf() {
        let vertices: Vec<Vertex<f32, 2>> = random_vertices(500, 1, 3);
        let tree = Octree::build(&vertices, 8).unwrap();

        for point in [[-10.0, -10.0], [10.0, 10.0], [-10.0, 0.5], [f32::MAX, 0.0]] {
            assert!(tree.is_leaf(tree.locate(&point)));
        }
    }

    #[test]
    fn low_corner_maps_to_first_leaf() {
        let vertices = vertices_from_points(&[[0.0f64, 0.0], [1.0, 1.0], [0.0, 1.0], [1.0, 0.0]], 1);
        let tree = Octree::build(&vertices, 1).unwrap();

        assert_eq!(tree.locate(&[-3.0, -3.0]), tree.leaves().next().unwrap());
        assert_eq!(tree.vertices(tree.locate(&[9.0, 9.0])), &[1]);
    }
}
