// Memoization seam for dashboard computations
use crate::domain::filter::FilterSpec;
use crate::domain::widgets::{ChartDataset, ChartKind, KpiSet, RankMetric};

/// Identity of the function whose result is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Computation {
    Kpis,
    Chart {
        kind: ChartKind,
        top_n: usize,
        metric: RankMetric,
    },
}

/// Immutable cache key. The session id keeps sessions sharing a process
/// from ever seeing each other's entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub session: String,
    pub dataset_version: u64,
    pub filter: FilterSpec,
    pub computation: Computation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    Kpis(KpiSet),
    Chart(ChartDataset),
}

pub trait Memoizer: Send + Sync {
    /// Return the cached value for `key`, or run `compute` and remember it.
    fn get_or_compute(&self, key: CacheKey, compute: &mut dyn FnMut() -> CachedValue) -> CachedValue;
}

/// Memoizer that never caches.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThrough;

impl Memoizer for PassThrough {
    fn get_or_compute(&self, _key: CacheKey, compute: &mut dyn FnMut() -> CachedValue) -> CachedValue {
        compute()
    }
}
