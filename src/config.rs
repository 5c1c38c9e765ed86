//! Tuning knobs for [`annotate_neighbours`](crate::annotate::annotate_neighbours).

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::KnnError;
use crate::octree::query::DEFAULT_FAN_OUT_CUTOFF;
use crate::octree::DEFAULT_LEAF_SIZE;
use crate::result_collection::DEFAULT_QUEUE_CUTOFF;

/// How each vertex's search begins.
///
/// All three give identical neighbour lists; they differ in how much of the
/// tree each query touches and in how queries are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SearchStrategy {
    /// every query descends from the root
    #[default]
    RootBased,
    /// every query finds its leaf by key lookup, scans it, then climbs
    LeafByKey,
    /// the tree is traversed leaf by leaf, handing each query the leaf it was
    /// reached through, then each climbs
    LeafByTraversal,
}

impl From<u32> for SearchStrategy {
    /// Numeric selector: `0` is root-based, `1` leaf-by-key, anything higher leaf-by-traversal.
    fn from(version: u32) -> Self {
        match version {
            0 => SearchStrategy::RootBased,
            1 => SearchStrategy::LeafByKey,
            _ => SearchStrategy::LeafByTraversal,
        }
    }
}

/// Parameters for building the tree and running a batch of queries.
///
/// # Examples
///
/// ```rust
/// use octknn::config::{KnnConfig, SearchStrategy};
///
/// let config = KnnConfig::default()
///     .with_k(6)
///     .with_strategy(SearchStrategy::LeafByKey)
///     .with_report_stats(true);
///
/// assert_eq!(config.k, 6);
/// assert_eq!(config.leaf_size, 16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KnnConfig {
    /// neighbours found per vertex
    pub k: usize,
    /// most vertices a leaf holds, unless its keys are exhausted
    pub leaf_size: usize,
    /// `k` at and above which the heap accumulator replaces the sorted array
    pub queue_cutoff: usize,
    /// subtree size above which a root-based query forks its search
    pub fan_out_cutoff: usize,
    /// whether single queries may fork; the batch runs in parallel regardless
    pub parallel_search: bool,
    /// where each query starts
    pub strategy: SearchStrategy,
    /// store the visited-node count in each vertex and log a summary
    pub report_stats: bool,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            k: 10,
            leaf_size: DEFAULT_LEAF_SIZE,
            queue_cutoff: DEFAULT_QUEUE_CUTOFF,
            fan_out_cutoff: DEFAULT_FAN_OUT_CUTOFF,
            parallel_search: true,
            strategy: SearchStrategy::default(),
            report_stats: false,
        }
    }
}

impl KnnConfig {
    /// Sets the neighbour count.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Sets the leaf size.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size;
        self
    }

    /// Sets the accumulator cutoff.
    pub fn with_queue_cutoff(mut self, queue_cutoff: usize) -> Self {
        self.queue_cutoff = queue_cutoff;
        self
    }

    /// Sets the fork threshold.
    pub fn with_fan_out_cutoff(mut self, fan_out_cutoff: usize) -> Self {
        self.fan_out_cutoff = fan_out_cutoff;
        self
    }

    /// Enables or disables forking within a single query.
    pub fn with_parallel_search(mut self, parallel_search: bool) -> Self {
        self.parallel_search = parallel_search;
        self
    }

    /// Sets the search strategy.
    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Enables or disables diagnostics.
    pub fn with_report_stats(mut self, report_stats: bool) -> Self {
        self.report_stats = report_stats;
        self
    }

    /// Checks the values that have no meaningful interpretation.
    pub fn validate(&self) -> Result<(), KnnError> {
        if self.leaf_size == 0 {
            return Err(KnnError::InvalidLeafSize);
        }
        if self.queue_cutoff == 0 {
            return Err(KnnError::InvalidQueueCutoff);
        }
        Ok(())
    }

    /// The fork threshold a query should use, if forking is enabled.
    pub(crate) fn fan_out(&self) -> Option<usize> {
        self.parallel_search.then_some(self.fan_out_cutoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let config = KnnConfig::default();
        assert_eq!(config.k, 10);
        assert_eq!(config.leaf_size, 16);
        assert_eq!(config.queue_cutoff, 50);
        assert_eq!(config.fan_out_cutoff, 10_000);
        assert!(config.parallel_search);
        assert_eq!(config.strategy, SearchStrategy::RootBased);
        assert!(!config.report_stats);
        assert_eq!(config.fan_out(), Some(10_000));
    }

    #[rstest]
    #[case(0, SearchStrategy::RootBased)]
    #[case(1, SearchStrategy::LeafByKey)]
    #[case(2, SearchStrategy::LeafByTraversal)]
    #[case(17, SearchStrategy::LeafByTraversal)]
    fn strategy_from_version(#[case] version: u32, #[case] expected: SearchStrategy) {
        assert_eq!(SearchStrategy::from(version), expected);
    }

    #[rstest]
    #[case(KnnConfig::default().with_leaf_size(0), KnnError::InvalidLeafSize)]
    #[case(KnnConfig::default().with_queue_cutoff(0), KnnError::InvalidQueueCutoff)]
    fn validate_rejects(#[case] config: KnnConfig, #[case] expected: KnnError) {
        assert_eq!(config.validate(), Err(expected));
    }

    #[test]
    fn sequential_search_has_no_fan_out() {
        let config = KnnConfig::default().with_parallel_search(false);
        assert_eq!(config.fan_out(), None);
    }
}
