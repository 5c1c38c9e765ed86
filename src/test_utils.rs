//! Helpers shared by the unit tests, integration tests and benchmarks.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::distance::squared_euclidean;
use crate::neighbour::Neighbour;
use crate::types::{Axis, VertexId};
use crate::vertex::Vertex;

/// Uniform random point in the unit cube.
pub fn random_point<A: Axis, const K: usize, R: Rng>(rng: &mut R) -> [A; K] {
    std::array::from_fn(|_| A::from(rng.random::<f64>()).unwrap_or_else(A::zero))
}

/// `n` vertices spread uniformly over the unit cube, each with `capacity` neighbour slots.
/// The same seed always gives the same vertices.
pub fn random_vertices<A: Axis, const K: usize>(
    n: usize,
    capacity: usize,
    seed: u64,
) -> Vec<Vertex<A, K>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| Vertex::with_capacity(random_point(&mut rng), capacity))
        .collect()
}

/// `n` vertices in `clusters` tight clumps, with many exact duplicates.
pub fn clustered_vertices<A: Axis, const K: usize>(
    n: usize,
    clusters: usize,
    capacity: usize,
    seed: u64,
) -> Vec<Vertex<A, K>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let centres: Vec<[A; K]> = (0..clusters.max(1))
        .map(|_| random_point(&mut rng))
        .collect();
    let spread = A::from(1e-3).unwrap_or_else(A::epsilon);

    (0..n)
        .map(|i| {
            let centre = centres[i % centres.len()];
            let point = if rng.random_bool(0.25) {
                centre
            } else {
                let offset: [A; K] = random_point(&mut rng);
                std::array::from_fn(|d| centre[d] + offset[d] * spread)
            };
            Vertex::with_capacity(point, capacity)
        })
        .collect()
}

/// Exhaustive k-nearest search, ordered the same way the tree orders its
/// results: by squared distance, then by vertex index.
pub fn brute_force_knn<A: Axis, const K: usize>(
    vertices: &[Vertex<A, K>],
    query: &[A; K],
    k: usize,
    exclude: Option<VertexId>,
) -> Vec<Neighbour<A>> {
    let mut all: Vec<Neighbour<A>> = vertices
        .iter()
        .enumerate()
        .filter(|&(idx, _)| Some(idx) != exclude)
        .map(|(item, v)| Neighbour {
            distance: squared_euclidean(query, &v.point),
            item,
        })
        .collect();
    all.sort_unstable();
    all.truncate(k);
    all
}
