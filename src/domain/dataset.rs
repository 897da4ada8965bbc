// Loaded dataset - read-only for the lifetime of the process
use super::filter::FilterSpec;
use super::transaction::Transaction;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Failures at the data-loading boundary. All of these are fatal at startup.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("failed to read data source {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}, column '{column}': invalid value '{value}' ({reason})")]
    InvalidField {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    #[error("synthetic generator misconfigured: {0}")]
    Generator(String),

    #[error("data source contains no rows")]
    Empty,
}

#[derive(Debug, Clone)]
pub struct Dataset {
    transactions: Vec<Transaction>,
    version: u64,
    min_date: NaiveDate,
    max_date: NaiveDate,
    regions: Vec<String>,
    segments: Vec<String>,
}

impl Dataset {
    pub fn new(transactions: Vec<Transaction>) -> Result<Self, DataLoadError> {
        let first = transactions.first().ok_or(DataLoadError::Empty)?;
        let (mut min_date, mut max_date) = (first.order_date, first.order_date);
        let mut regions = BTreeSet::new();
        let mut segments = BTreeSet::new();

        for t in &transactions {
            min_date = min_date.min(t.order_date);
            max_date = max_date.max(t.order_date);
            regions.insert(t.region.clone());
            segments.insert(t.segment.clone());
        }

        let version = fingerprint(&transactions);

        Ok(Self {
            transactions,
            version,
            min_date,
            max_date,
            regions: regions.into_iter().collect(),
            segments: segments.into_iter().collect(),
        })
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Content fingerprint; two datasets with identical rows share a version.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn min_date(&self) -> NaiveDate {
        self.min_date
    }

    pub fn max_date(&self) -> NaiveDate {
        self.max_date
    }

    /// Distinct regions, sorted.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Distinct segments, sorted.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn has_funnel_stages(&self) -> bool {
        self.transactions.iter().any(|t| t.funnel_stage.is_some())
    }

    /// The filter that keeps every row.
    pub fn full_range_filter(&self) -> FilterSpec {
        FilterSpec::date_range(self.min_date, self.max_date)
            .unwrap_or_else(|_| unreachable!("min_date <= max_date by construction"))
    }

    /// Clamps an ordered range that overlaps the data into the dataset bounds.
    /// Inverted ranges and ranges entirely outside the data come back as given.
    pub fn clamp_range(&self, start: NaiveDate, end: NaiveDate) -> (NaiveDate, NaiveDate) {
        if start > end || start > self.max_date || end < self.min_date {
            return (start, end);
        }
        (start.max(self.min_date), end.min(self.max_date))
    }
}

fn fingerprint(transactions: &[Transaction]) -> u64 {
    let mut hasher = DefaultHasher::new();
    transactions.len().hash(&mut hasher);
    for t in transactions {
        t.order_id.hash(&mut hasher);
        t.order_date.hash(&mut hasher);
        t.region.hash(&mut hasher);
        t.segment.hash(&mut hasher);
        t.category.hash(&mut hasher);
        t.product.hash(&mut hasher);
        t.quantity.hash(&mut hasher);
        t.sales.to_bits().hash(&mut hasher);
        t.discount.to_bits().hash(&mut hasher);
        t.profit.to_bits().hash(&mut hasher);
        t.funnel_stage.hash(&mut hasher);
    }
    hasher.finish()
}
