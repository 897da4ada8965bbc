// Filter specification domain model
use chrono::NaiveDate;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidFilterError {
    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: NaiveDate, end: NaiveDate },
}

/// User-selected constraints narrowing the working dataset.
///
/// Empty region or segment selections mean "no restriction", never
/// "exclude everything". The type is a plain value so it can be used
/// directly inside cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterSpec {
    start: NaiveDate,
    end: NaiveDate,
    regions: BTreeSet<String>,
    segments: BTreeSet<String>,
}

impl FilterSpec {
    pub fn new<R, S>(
        start: NaiveDate,
        end: NaiveDate,
        regions: R,
        segments: S,
    ) -> Result<Self, InvalidFilterError>
    where
        R: IntoIterator,
        R::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        if start > end {
            return Err(InvalidFilterError::StartAfterEnd { start, end });
        }

        Ok(Self {
            start,
            end,
            regions: regions.into_iter().map(Into::into).collect(),
            segments: segments.into_iter().map(Into::into).collect(),
        })
    }

    /// Date range only, every region and segment allowed.
    pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidFilterError> {
        Self::new(start, end, Vec::<String>::new(), Vec::<String>::new())
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    pub fn segments(&self) -> &BTreeSet<String> {
        &self.segments
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn allows_region(&self, region: &str) -> bool {
        self.regions.is_empty() || self.regions.contains(region)
    }

    pub fn allows_segment(&self, segment: &str) -> bool {
        self.segments.is_empty() || self.segments.contains(segment)
    }
}
