// Bounded LRU memoizer
use crate::application::memoizer::{CacheKey, CachedValue, Memoizer};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
pub struct LruMemoizer {
    cache: Mutex<LruCache<CacheKey, CachedValue>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl LruMemoizer {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

#[cfg(test)]
impl LruMemoizer {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Memoizer for LruMemoizer {
    fn get_or_compute(&self, key: CacheKey, compute: &mut dyn FnMut() -> CachedValue) -> CachedValue {
        if let Some(value) = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Cache hit for {:?} (session {})", key.computation, key.session);
            return value.clone();
        }

        // The lock is not held while computing
        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Cache miss for {:?} (session {})", key.computation, key.session);
        let value = compute();

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .put(key, value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::memoizer::Computation;
    use crate::domain::filter::FilterSpec;
    use crate::domain::widgets::KpiSet;
    use chrono::NaiveDate;

    fn key(session: &str, end_day: u32) -> CacheKey {
        CacheKey {
            session: session.to_string(),
            dataset_version: 7,
            filter: FilterSpec::date_range(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, end_day).unwrap(),
            )
            .unwrap(),
            computation: Computation::Kpis,
        }
    }

    fn kpis(total_sales: f64) -> CachedValue {
        CachedValue::Kpis(KpiSet {
            total_sales,
            order_count: 1,
            avg_order_value: total_sales,
            mom_growth: None,
            total_profit: 0.0,
            avg_discount: 0.0,
            negative_profit_orders: 0,
        })
    }

    #[test]
    fn test_second_lookup_is_a_hit() {
        let memo = LruMemoizer::new(NonZeroUsize::new(8).unwrap());
        let mut calls = 0;

        let first = memo.get_or_compute(key("s1", 31), &mut || {
            calls += 1;
            kpis(100.0)
        });
        let second = memo.get_or_compute(key("s1", 31), &mut || {
            calls += 1;
            kpis(999.0)
        });

        assert_eq!(first, second);
        assert_eq!(calls, 1);
        assert_eq!((memo.hits(), memo.misses()), (1, 1));
    }

    #[test]
    fn test_changed_filter_is_never_stale() {
        let memo = LruMemoizer::new(NonZeroUsize::new(8).unwrap());
        memo.get_or_compute(key("s1", 31), &mut || kpis(100.0));
        let changed = memo.get_or_compute(key("s1", 15), &mut || kpis(50.0));
        assert_eq!(changed, kpis(50.0));
    }

    #[test]
    fn test_new_dataset_version_misses() {
        let memo = LruMemoizer::new(NonZeroUsize::new(8).unwrap());
        memo.get_or_compute(key("s1", 31), &mut || kpis(100.0));

        let reloaded = CacheKey {
            dataset_version: 8,
            ..key("s1", 31)
        };
        let value = memo.get_or_compute(reloaded, &mut || kpis(300.0));

        assert_eq!(value, kpis(300.0));
        assert_eq!((memo.hits(), memo.misses()), (0, 2));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let memo = LruMemoizer::new(NonZeroUsize::new(8).unwrap());
        memo.get_or_compute(key("s1", 31), &mut || kpis(100.0));
        let other = memo.get_or_compute(key("s2", 31), &mut || kpis(200.0));
        assert_eq!(other, kpis(200.0));
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn test_capacity_bounds_entries() {
        let memo = LruMemoizer::new(NonZeroUsize::new(2).unwrap());
        for day in 1..=5 {
            memo.get_or_compute(key("s1", day), &mut || kpis(day as f64));
        }
        assert_eq!(memo.len(), 2);
    }
}
