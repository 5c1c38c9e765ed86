//! The indexed vertex: a point plus the slots its nearest neighbours are written into.

use crate::types::{Axis, VertexId};

/// A point in the vertex set, together with a fixed number of neighbour slots.
///
/// Slots hold indices into the slice of vertices the tree was built over.
/// `None` marks a slot with no neighbour, which happens when fewer than `k`
/// other vertices exist.
#[derive(Clone, Debug, PartialEq)]
pub struct Vertex<A: Axis, const K: usize> {
    /// co-ordinates of this vertex
    pub point: [A; K],
    /// neighbour slots, nearest first
    pub neighbours: Box<[Option<VertexId>]>,
    /// diagnostic: number of tree nodes visited when this vertex was last queried
    pub counter: usize,
}

impl<A: Axis, const K: usize> Vertex<A, K> {
    /// Creates a vertex with room for `capacity` neighbours.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use octknn::vertex::Vertex;
    ///
    /// let v: Vertex<f64, 2> = Vertex::with_capacity([1.0, 2.0], 4);
    ///
    /// assert_eq!(v.capacity(), 4);
    /// assert!(v.neighbours.iter().all(Option::is_none));
    /// ```
    pub fn with_capacity(point: [A; K], capacity: usize) -> Self {
        Self {
            point,
            neighbours: vec![None; capacity].into_boxed_slice(),
            counter: 0,
        }
    }

    /// number of neighbour slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.neighbours.len()
    }

    /// Returns the `i`th nearest neighbour (0 is nearest), or `None`
    /// if that slot is empty or out of range.
    #[inline]
    pub fn neighbour(&self, i: usize) -> Option<VertexId> {
        self.neighbours.get(i).copied().flatten()
    }

    /// The filled neighbour slots, nearest first.
    pub fn found_neighbours(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.neighbours.iter().map_while(|slot| *slot)
    }

    pub(crate) fn write_neighbours(&mut self, found: impl IntoIterator<Item = VertexId>) {
        self.neighbours.iter_mut().for_each(|slot| *slot = None);
        self.neighbours
            .iter_mut()
            .zip(found)
            .for_each(|(slot, item)| *slot = Some(item));
    }
}

/// Wraps each point in a [`Vertex`] with `capacity` neighbour slots.
pub fn vertices_from_points<A: Axis, const K: usize>(
    points: &[[A; K]],
    capacity: usize,
) -> Vec<Vertex<A, K>> {
    points
        .iter()
        .map(|&p| Vertex::with_capacity(p, capacity))
        .collect()
}
