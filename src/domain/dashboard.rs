// Dashboard domain model
use super::filter::{FilterSpec, InvalidFilterError};
use super::widgets::{ChartData, ChartKind, TileData};
use std::fmt;

/// Non-fatal conditions reported alongside a dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardWarning {
    /// The requested filter was invalid; the previous valid one was kept.
    FilterRejected(InvalidFilterError),
    /// The filter matched no rows.
    EmptyResult,
}

impl fmt::Display for DashboardWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardWarning::FilterRejected(err) => {
                write!(f, "Filter rejected ({}); showing the previous selection.", err)
            }
            DashboardWarning::EmptyResult => f.write_str(
                "No data for the selected filters. Try expanding your date range or selections.",
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    pub filter: FilterSpec,
    pub tiles: Vec<TileData>,
    pub charts: Vec<ChartData>,
    pub warnings: Vec<DashboardWarning>,
}

impl Dashboard {
    pub fn new(
        title: String,
        filter: FilterSpec,
        tiles: Vec<TileData>,
        charts: Vec<ChartData>,
        warnings: Vec<DashboardWarning>,
    ) -> Self {
        Self {
            title,
            filter,
            tiles,
            charts,
            warnings,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileSkeleton {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub precision: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSkeleton {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub unit: Option<String>,
}

/// Layout sent ahead of any values so the UI can draw placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSkeleton {
    pub title: String,
    pub filter: FilterSpec,
    pub tiles: Vec<TileSkeleton>,
    pub charts: Vec<ChartSkeleton>,
}

/// One message of a progressively loaded dashboard.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    Skeleton(DashboardSkeleton),
    Warning(DashboardWarning),
    TileUpdate(TileData),
    ChartUpdate(ChartData),
    Complete { widgets: usize, duration_ms: u64 },
}
