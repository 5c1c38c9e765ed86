//! Bounded top-k accumulators.
//!
//! A query keeps its current best `k` candidates in one of these. Two
//! interchangeable strategies exist: [`SortedArray`] for small `k`, where an
//! O(k) insertion into a flat array beats any heap, and [`BoundedHeap`] for
//! large `k`, where O(log k) updates win. [`Candidates`] picks between them.

use crate::neighbour::Neighbour;
use crate::types::Axis;
use std::collections::BinaryHeap;

/// Default `k` at and above which [`Candidates`] switches to a [`BoundedHeap`].
pub const DEFAULT_QUEUE_CUTOFF: usize = 50;

/// The contract shared by every top-k accumulator.
pub trait ResultCollection<A: Axis>: Clone + Send {
    /// maximum number of candidates held
    fn k(&self) -> usize;

    /// number of candidates currently held
    fn len(&self) -> usize;

    /// whether no candidate is held
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offers a candidate. It is kept if fewer than `k` candidates are held
    /// or if it orders before the current worst, which is then evicted.
    /// Returns whether the candidate was kept.
    fn update(&mut self, entry: Neighbour<A>) -> bool;

    /// The squared distance of the current k-th best candidate, or infinity
    /// while fewer than `k` are held.
    fn pruning_distance(&self) -> A;

    /// Combines two accumulators for the same query into the top-k of their union.
    /// A vertex present in both is kept once.
    fn merge(&self, other: &Self) -> Self;

    /// Candidates, nearest first, without consuming the accumulator.
    fn sorted(&self) -> Vec<Neighbour<A>>;

    /// Candidates, nearest first.
    fn into_sorted_vec(self) -> Vec<Neighbour<A>>;
}

/// Two-pointer merge of two nearest-first lists, truncated to `k`.
///
/// Entries that compare equal are the same vertex at the same distance and are
/// consumed once.
pub fn merge_sorted<A: Axis>(
    left: &[Neighbour<A>],
    right: &[Neighbour<A>],
    k: usize,
) -> Vec<Neighbour<A>> {
    let mut merged = Vec::with_capacity(k.min(left.len() + right.len()));
    let (mut i, mut j) = (0, 0);

    while merged.len() < k && (i < left.len() || j < right.len()) {
        let next = match (left.get(i), right.get(j)) {
            (Some(l), Some(r)) if l < r => {
                i += 1;
                *l
            }
            (Some(l), Some(r)) if r < l => {
                j += 1;
                *r
            }
            (Some(l), Some(_)) => {
                i += 1;
                j += 1;
                *l
            }
            (Some(l), None) => {
                i += 1;
                *l
            }
            (None, Some(r)) => {
                j += 1;
                *r
            }
            (None, None) => break,
        };
        merged.push(next);
    }

    merged
}

/// Fixed-capacity array kept in worst-first order.
///
/// Unfilled slots hold a vacant placeholder that orders after every real
/// candidate, so insertion is the same replace-and-bubble whether or not the
/// array is full.
#[derive(Clone, Debug)]
pub struct SortedArray<A: Axis> {
    entries: Box<[Neighbour<A>]>,
}

impl<A: Axis> SortedArray<A> {
    /// Creates an empty accumulator for `k` candidates.
    pub fn new(k: usize) -> Self {
        Self {
            entries: vec![Neighbour::vacant(); k].into_boxed_slice(),
        }
    }

    fn from_sorted(k: usize, sorted: &[Neighbour<A>]) -> Self {
        let mut array = Self::new(k);
        sorted
            .iter()
            .take(k)
            .enumerate()
            .for_each(|(i, &n)| array.entries[k - 1 - i] = n);
        array
    }
}

impl<A: Axis> ResultCollection<A> for SortedArray<A> {
    #[inline]
    fn k(&self) -> usize {
        self.entries.len()
    }

    fn len(&self) -> usize {
        self.entries.iter().filter(|n| !n.is_vacant()).count()
    }

    #[inline]
    fn update(&mut self, entry: Neighbour<A>) -> bool {
        let k = self.entries.len();
        if k == 0 || entry >= self.entries[0] {
            return false;
        }

        self.entries[0] = entry;
        let mut i = 1;
        while i < k && self.entries[i - 1] < self.entries[i] {
            self.entries.swap(i - 1, i);
            i += 1;
        }
        true
    }

    #[inline]
    fn pruning_distance(&self) -> A {
        self.entries
            .first()
            .map_or(A::infinity(), |worst| worst.distance)
    }

    fn merge(&self, other: &Self) -> Self {
        let k = self.k();
        Self::from_sorted(k, &merge_sorted(&self.sorted(), &other.sorted(), k))
    }

    fn sorted(&self) -> Vec<Neighbour<A>> {
        self.entries
            .iter()
            .rev()
            .filter(|n| !n.is_vacant())
            .copied()
            .collect()
    }

    fn into_sorted_vec(self) -> Vec<Neighbour<A>> {
        self.sorted()
    }
}

/// Max-heap of at most `k` candidates; the root is the current worst.
#[derive(Clone, Debug)]
pub struct BoundedHeap<A: Axis> {
    heap: BinaryHeap<Neighbour<A>>,
    k: usize,
}

impl<A: Axis> BoundedHeap<A> {
    /// Creates an empty accumulator for `k` candidates.
    pub fn new(k: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(k),
            k,
        }
    }
}

impl<A: Axis> ResultCollection<A> for BoundedHeap<A> {
    #[inline]
    fn k(&self) -> usize {
        self.k
    }

    #[inline]
    fn len(&self) -> usize {
        self.heap.len()
    }

    fn update(&mut self, entry: Neighbour<A>) -> bool {
        if self.heap.len() < self.k {
            self.heap.push(entry);
            return true;
        }
        match self.heap.peek_mut() {
            Some(mut worst) if entry < *worst => {
                *worst = entry;
                true
            }
            _ => false,
        }
    }

    fn pruning_distance(&self) -> A {
        if self.heap.len() < self.k {
            A::infinity()
        } else {
            self.heap.peek().map_or(A::infinity(), |n| n.distance)
        }
    }

    fn merge(&self, other: &Self) -> Self {
        let merged = merge_sorted(&self.sorted(), &other.sorted(), self.k);
        Self {
            heap: BinaryHeap::from(merged),
            k: self.k,
        }
    }

    fn sorted(&self) -> Vec<Neighbour<A>> {
        self.heap.clone().into_sorted_vec()
    }

    fn into_sorted_vec(self) -> Vec<Neighbour<A>> {
        self.heap.into_sorted_vec()
    }
}

/// Accumulator chosen by comparing `k` against a queue cutoff.
#[derive(Clone, Debug)]
pub enum Candidates<A: Axis> {
    /// `k` below the cutoff
    Small(SortedArray<A>),
    /// `k` at or above the cutoff
    Large(BoundedHeap<A>),
}

impl<A: Axis> Candidates<A> {
    /// Picks [`SortedArray`] when `k < queue_cutoff`, otherwise [`BoundedHeap`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use octknn::result_collection::{Candidates, ResultCollection};
    ///
    /// let small: Candidates<f64> = Candidates::new(3, 50);
    /// let large: Candidates<f64> = Candidates::new(80, 50);
    ///
    /// assert!(matches!(small, Candidates::Small(_)));
    /// assert!(matches!(large, Candidates::Large(_)));
    /// assert_eq!(large.pruning_distance(), f64::INFINITY);
    /// ```
    pub fn new(k: usize, queue_cutoff: usize) -> Self {
        if k < queue_cutoff {
            Candidates::Small(SortedArray::new(k))
        } else {
            Candidates::Large(BoundedHeap::new(k))
        }
    }
}

impl<A: Axis> ResultCollection<A> for Candidates<A> {
    fn k(&self) -> usize {
        match self {
            Candidates::Small(c) => c.k(),
            Candidates::Large(c) => c.k(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Candidates::Small(c) => c.len(),
            Candidates::Large(c) => c.len(),
        }
    }

    #[inline]
    fn update(&mut self, entry: Neighbour<A>) -> bool {
        match self {
            Candidates::Small(c) => c.update(entry),
            Candidates::Large(c) => c.update(entry),
        }
    }

    #[inline]
    fn pruning_distance(&self) -> A {
        match self {
            Candidates::Small(c) => c.pruning_distance(),
            Candidates::Large(c) => c.pruning_distance(),
        }
    }

    fn merge(&self, other: &Self) -> Self {
        match (self, other) {
            (Candidates::Small(l), Candidates::Small(r)) => Candidates::Small(l.merge(r)),
            (Candidates::Large(l), Candidates::Large(r)) => Candidates::Large(l.merge(r)),
            (l, r) => {
                let k = l.k();
                let merged = merge_sorted(&l.sorted(), &r.sorted(), k);
                match l {
                    Candidates::Small(_) => {
                        Candidates::Small(SortedArray::from_sorted(k, &merged))
                    }
                    Candidates::Large(_) => Candidates::Large(BoundedHeap {
                        heap: BinaryHeap::from(merged),
                        k,
                    }),
                }
            }
        }
    }

    fn sorted(&self) -> Vec<Neighbour<A>> {
        match self {
            Candidates::Small(c) => c.sorted(),
            Candidates::Large(c) => c.sorted(),
        }
    }

    fn into_sorted_vec(self) -> Vec<Neighbour<A>> {
        match self {
            Candidates::Small(c) => c.into_sorted_vec(),
            Candidates::Large(c) => c.into_sorted_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    fn n(distance: f64, item: usize) -> Neighbour<f64> {
        Neighbour { distance, item }
    }

    fn fill<R: ResultCollection<f64>>(mut acc: R, entries: &[Neighbour<f64>]) -> R {
        entries.iter().for_each(|&e| {
            acc.update(e);
        });
        acc
    }

    fn items(list: &[Neighbour<f64>]) -> Vec<usize> {
        list.iter().map(|n| n.item).collect()
    }

    #[test]
    fn sorted_array_keeps_best_k_worst_first() {
        let acc = fill(
            SortedArray::new(3),
            &[n(5.0, 0), n(1.0, 1), n(3.0, 2), n(0.5, 3), n(9.0, 4)],
        );
        assert_eq!(acc.len(), 3);
        assert_eq!(acc.pruning_distance(), 3.0);
        assert_eq!(items(&acc.into_sorted_vec()), vec![3, 1, 2]);
    }

    #[test]
    fn bounded_heap_keeps_best_k() {
        let acc = fill(
            BoundedHeap::new(3),
            &[n(5.0, 0), n(1.0, 1), n(3.0, 2), n(0.5, 3), n(9.0, 4)],
        );
        assert_eq!(acc.len(), 3);
        assert_eq!(acc.pruning_distance(), 3.0);
        assert_eq!(items(&acc.into_sorted_vec()), vec![3, 1, 2]);
    }

    #[rstest]
    #[case(SortedArray::new(4))]
    #[case(BoundedHeap::new(4))]
    fn pruning_distance_infinite_until_full<R: ResultCollection<f64>>(#[case] acc: R) {
        let acc = fill(acc, &[n(1.0, 0), n(2.0, 1), n(3.0, 2)]);
        assert_eq!(acc.len(), 3);
        assert_eq!(acc.pruning_distance(), f64::INFINITY);

        let acc = fill(acc, &[n(7.0, 3)]);
        assert_eq!(acc.pruning_distance(), 7.0);
    }

    #[rstest]
    #[case(SortedArray::new(0))]
    #[case(BoundedHeap::new(0))]
    fn zero_k_accepts_nothing<R: ResultCollection<f64>>(#[case] mut acc: R) {
        assert!(!acc.update(n(1.0, 0)));
        assert!(acc.is_empty());
        assert!(acc.into_sorted_vec().is_empty());
    }

    #[test]
    fn equal_distance_ties_resolved_by_item() {
        let a = fill(SortedArray::new(1), &[n(1.0, 7), n(1.0, 2), n(1.0, 5)]);
        let b = fill(BoundedHeap::new(1), &[n(1.0, 5), n(1.0, 7), n(1.0, 2)]);
        assert_eq!(items(&a.into_sorted_vec()), vec![2]);
        assert_eq!(items(&b.into_sorted_vec()), vec![2]);
    }

    #[test]
    fn merge_sorted_consumes_shared_entries_once() {
        let shared = [n(0.5, 9), n(2.0, 4)];
        let left = [shared[0], n(1.0, 1), shared[1]];
        let right = [shared[0], n(1.5, 3), shared[1], n(4.0, 6)];

        let merged = merge_sorted(&left, &right, 4);
        assert_eq!(items(&merged), vec![9, 1, 3, 4]);

        let merged = merge_sorted(&left, &right, 10);
        assert_eq!(items(&merged), vec![9, 1, 3, 4, 6]);
    }

    #[test]
    fn merge_sorted_handles_empty_sides() {
        let left = [n(1.0, 1)];
        assert_eq!(items(&merge_sorted(&left, &[], 3)), vec![1]);
        assert_eq!(items(&merge_sorted(&[], &left, 3)), vec![1]);
        assert!(merge_sorted::<f64>(&[], &[], 3).is_empty());
    }

    #[rstest]
    #[case(1, 50)]
    #[case(5, 50)]
    #[case(60, 50)]
    #[case(8, 1)]
    fn merge_matches_sequential_updates(#[case] k: usize, #[case] cutoff: usize) {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(k as u64 * 31 + 7);

        for _ in 0..50 {
            let shared: Vec<_> = (0..rng.random_range(0..10))
                .map(|i| n(rng.random::<f64>(), i))
                .collect();
            let left_only: Vec<_> = (0..rng.random_range(0..100))
                .map(|i| n(rng.random::<f64>(), 100 + i))
                .collect();
            let right_only: Vec<_> = (0..rng.random_range(0..100))
                .map(|i| n(rng.random::<f64>(), 1000 + i))
                .collect();

            let base = fill(Candidates::new(k, cutoff), &shared);
            let left = fill(base.clone(), &left_only);
            let right = fill(base, &right_only);
            let merged = left.merge(&right);

            let all: Vec<_> = shared
                .iter()
                .chain(left_only.iter())
                .chain(right_only.iter())
                .copied()
                .collect();
            let expected = fill(Candidates::new(k, cutoff), &all);

            assert_eq!(merged.pruning_distance(), expected.pruning_distance());
            assert_eq!(merged.into_sorted_vec(), expected.into_sorted_vec());
        }
    }

    #[test]
    fn merge_is_symmetric() {
        let left = fill(SortedArray::new(3), &[n(1.0, 1), n(4.0, 4)]);
        let right = fill(SortedArray::new(3), &[n(2.0, 2), n(3.0, 3)]);
        assert_eq!(
            left.merge(&right).into_sorted_vec(),
            right.merge(&left).into_sorted_vec()
        );
    }

    #[test]
    fn mixed_strategies_merge_into_left_kind() {
        let left = Candidates::Small(fill(SortedArray::new(2), &[n(3.0, 3)]));
        let right = Candidates::Large(fill(BoundedHeap::new(2), &[n(1.0, 1), n(2.0, 2)]));
        let merged = left.merge(&right);
        assert!(matches!(merged, Candidates::Small(_)));
        assert_eq!(items(&merged.into_sorted_vec()), vec![1, 2]);
    }
}
