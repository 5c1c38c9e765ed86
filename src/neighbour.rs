//! A result item returned by a query
use crate::types::{Axis, VertexId};
use ordered_float::OrderedFloat;
use std::cmp::Ordering;

/// Represents an entry in the results of a nearest neighbour query, with `distance` being the
/// squared distance of this particular vertex from the query point, and `item` being the index
/// of the vertex that was found.
///
/// Entries are ordered by distance, then by vertex index. The index tie-break gives every
/// query a single well-defined top-k, whatever order the tree was searched in.
#[derive(Debug, Copy, Clone)]
pub struct Neighbour<A, T = VertexId> {
    /// the squared euclidean distance of the found vertex from the query point
    pub distance: A,
    /// the index of the vertex that was found
    pub item: T,
}

impl<A: Axis> Neighbour<A> {
    /// placeholder used to pad a partially filled accumulator; orders after every real entry
    pub(crate) fn vacant() -> Self {
        Neighbour {
            distance: A::infinity(),
            item: VertexId::MAX,
        }
    }

    #[inline]
    pub(crate) fn is_vacant(&self) -> bool {
        self.item == VertexId::MAX
    }
}

impl<A: Axis, T: Ord> Ord for Neighbour<A, T> {
    fn cmp(&self, other: &Self) -> Ordering {
        OrderedFloat(self.distance.to_f64_lossy())
            .cmp(&OrderedFloat(other.distance.to_f64_lossy()))
            .then_with(|| self.item.cmp(&other.item))
    }
}

impl<A: Axis, T: Ord> PartialOrd for Neighbour<A, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A: Axis, T: Ord> Eq for Neighbour<A, T> {}

impl<A: Axis, T: Ord> PartialEq for Neighbour<A, T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<A, T> From<Neighbour<A, T>> for (A, T) {
    fn from(elem: Neighbour<A, T>) -> Self {
        (elem.distance, elem.item)
    }
}

#[cfg(test)]
mod tests {
    use crate::neighbour::Neighbour;
    use std::cmp::Ordering;

    #[test]
    fn test_from_tuple() {
        let nn: (f32, usize) = Neighbour::<f32, usize> {
            distance: 1.0f32,
            item: 1usize,
        }
        .into();

        assert_eq!(nn.0, 1.0f32);
        assert_eq!(nn.1, 1usize);
    }

    #[test]
    fn test_cmp_by_distance() {
        let a = Neighbour {
            distance: 1.0f32,
            item: 10usize,
        };
        let b = Neighbour {
            distance: 2.0f32,
            item: 5usize,
        };

        assert_eq!(a.cmp(&b), Ordering::Less)
    }

    #[test]
    fn test_cmp_ties_broken_by_item() {
        let a = Neighbour {
            distance: 1.0f64,
            item: 4usize,
        };
        let b = Neighbour {
            distance: 1.0f64,
            item: 3usize,
        };

        assert_eq!(a.cmp(&b), Ordering::Greater);
        assert_ne!(a, b);
    }

    #[test]
    fn test_vacant_orders_last() {
        let real = Neighbour {
            distance: f64::MAX,
            item: 0usize,
        };
        assert!(real < Neighbour::vacant());
        assert!(Neighbour::<f64>::vacant().is_vacant());
    }
}
