//! Squared euclidean distance, the only metric the octree's pruning test is sound for.

use crate::types::Axis;

/// Returns the squared euclidean distance between two points.
///
/// Faster than Euclidean distance due to not needing a square root, but still
/// preserves the same distance ordering as with Euclidean distance.
///
/// # Examples
///
/// ```rust
/// use octknn::distance::squared_euclidean;
///
/// assert_eq!(0f32, squared_euclidean(&[0f32, 0f32], &[0f32, 0f32]));
/// assert_eq!(1f32, squared_euclidean(&[0f32, 0f32], &[1f32, 0f32]));
/// assert_eq!(2f32, squared_euclidean(&[0f32, 0f32], &[1f32, 1f32]));
/// ```
#[inline]
pub fn squared_euclidean<A: Axis, const K: usize>(a: &[A; K], b: &[A; K]) -> A {
    a.iter()
        .zip(b.iter())
        .map(|(&a_val, &b_val)| (a_val - b_val) * (a_val - b_val))
        .fold(A::zero(), std::ops::Add::add)
}

#[cfg(test)]
mod tests {
    use super::squared_euclidean;
    use rstest::rstest;

    #[rstest]
    #[case([0.0, 0.0], [0.0, 0.0], 0.0)]
    #[case([0.0, 0.0], [1.0, 0.0], 1.0)]
    #[case([0.0, 0.0], [5.0, 5.0], 50.0)]
    #[case([1.0, 0.0], [5.0, 5.0], 41.0)]
    #[case([-1.0, -2.0], [2.0, 2.0], 25.0)]
    fn squared_euclidean_2d(#[case] a: [f64; 2], #[case] b: [f64; 2], #[case] expected: f64) {
        assert_eq!(squared_euclidean(&a, &b), expected);
        assert_eq!(squared_euclidean(&b, &a), expected);
    }

    #[test]
    fn squared_euclidean_3d_f32() {
        assert_eq!(
            squared_euclidean(&[1f32, 2f32, 3f32], &[4f32, 6f32, 3f32]),
            25f32
        );
    }
}
