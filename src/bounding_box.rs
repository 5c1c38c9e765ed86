//! Axis-aligned bounding boxes, and the epsilon-box test used to prune subtrees.

use crate::types::Axis;

/// A pair of corner points covering a region of space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox<A: Axis, const K: usize> {
    /// per-dimension minimum
    pub min: [A; K],
    /// per-dimension maximum
    pub max: [A; K],
}

impl<A: Axis, const K: usize> BoundingBox<A, K> {
    /// A box with inverted infinite bounds, which every `extend` shrinks to fit.
    pub fn empty() -> Self {
        Self {
            min: [A::infinity(); K],
            max: [A::neg_infinity(); K],
        }
    }

    /// Smallest box containing every point yielded by `points`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use octknn::bounding_box::BoundingBox;
    ///
    /// let b = BoundingBox::from_points([[0.0, 3.0], [2.0, -1.0]].iter());
    ///
    /// assert_eq!(b.min, [0.0, -1.0]);
    /// assert_eq!(b.max, [2.0, 3.0]);
    /// ```
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a [A; K]>,
        A: 'a,
    {
        let mut bbox = Self::empty();
        points.into_iter().for_each(|p| bbox.extend(p));
        bbox
    }

    /// Grows the box to include `point`.
    #[inline]
    pub fn extend(&mut self, point: &[A; K]) {
        for dim in 0..K {
            self.min[dim] = self.min[dim].min(point[dim]);
            self.max[dim] = self.max[dim].max(point[dim]);
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        let mut bbox = *self;
        for dim in 0..K {
            bbox.min[dim] = bbox.min[dim].min(other.min[dim]);
            bbox.max[dim] = bbox.max[dim].max(other.max[dim]);
        }
        bbox
    }

    /// Midpoint of the box.
    pub fn center(&self) -> [A; K] {
        let two = A::one() + A::one();
        std::array::from_fn(|dim| (self.min[dim] + self.max[dim]) / two)
    }

    /// Largest per-dimension extent ("Delta"). Zero for a box around a single point.
    pub fn max_extent(&self) -> A {
        (0..K).fold(A::zero(), |delta, dim| delta.max(self.max[dim] - self.min[dim]))
    }

    /// Whether `point` lies inside the box (boundary included).
    pub fn contains(&self, point: &[A; K]) -> bool {
        (0..K).all(|dim| self.min[dim] <= point[dim] && point[dim] <= self.max[dim])
    }

    /// Epsilon-box test with a non-negative `radius`: could a point of this box
    /// lie within `radius` of `point`?
    ///
    /// Returns false only if some dimension separates `point` from the box by
    /// more than `radius`. Comparisons are non-strict so that candidates at
    /// exactly `radius` stay reachable.
    #[inline]
    pub fn within_expanded(&self, point: &[A; K], radius: A) -> bool {
        (0..K).all(|dim| {
            self.min[dim] - radius <= point[dim] && self.max[dim] + radius >= point[dim]
        })
    }

    /// Epsilon-box test with the box shrunk by `radius`: is the closed ball of
    /// `radius` around `point` strictly inside the box?
    ///
    /// An infinite `radius` never fits.
    #[inline]
    pub fn within_shrunk(&self, point: &[A; K], radius: A) -> bool {
        (0..K).all(|dim| {
            self.min[dim] + radius < point[dim] && self.max[dim] - radius > point[dim]
        })
    }
}
