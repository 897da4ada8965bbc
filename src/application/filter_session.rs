// Filter resolution - turns raw UI selections into a valid FilterSpec
use crate::domain::dashboard::DashboardWarning;
use crate::domain::dataset::Dataset;
use crate::domain::filter::FilterSpec;
use chrono::NaiveDate;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};

/// Selections as they arrive from the UI; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterRequest {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub regions: Vec<String>,
    pub segments: Vec<String>,
}

/// Remembers the last valid filter of recent sessions so an invalid change can
/// be rejected without losing the user's current view. Least recently seen
/// sessions are forgotten once `capacity` is reached.
#[derive(Debug)]
pub struct FilterResolver {
    last_valid: Mutex<LruCache<String, FilterSpec>>,
}

impl FilterResolver {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            last_valid: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn resolve(
        &self,
        session: &str,
        request: &FilterRequest,
        dataset: &Dataset,
    ) -> (FilterSpec, Option<DashboardWarning>) {
        // A half-open selection (single date picked) falls back to the full range
        let (start, end) = match (request.start, request.end) {
            (Some(start), Some(end)) => dataset.clamp_range(start, end),
            _ => (dataset.min_date(), dataset.max_date()),
        };

        let mut last_valid = self.last_valid.lock().unwrap_or_else(PoisonError::into_inner);

        match FilterSpec::new(start, end, request.regions.iter().cloned(), request.segments.iter().cloned()) {
            Ok(spec) => {
                tracing::debug!("Session {} filter resolved: {:?}", session, spec);
                last_valid.put(session.to_string(), spec.clone());
                (spec, None)
            }
            Err(err) => {
                tracing::warn!("Session {} sent an invalid filter: {}", session, err);
                let fallback = last_valid
                    .get(session)
                    .cloned()
                    .unwrap_or_else(|| dataset.full_range_filter());
                (fallback, Some(DashboardWarning::FilterRejected(err)))
            }
        }
    }
}
