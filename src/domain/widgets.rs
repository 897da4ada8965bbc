// Dashboard widget domain models - KPI tiles and chart datasets
use super::transaction::FunnelStage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiKind {
    TotalSales,
    OrderCount,
    AvgOrderValue,
    MomGrowth,
    TotalProfit,
    AvgDiscount,
    NegativeProfitOrders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    SalesTrend,
    SegmentShare,
    RegionTotals,
    TopProducts,
    ProfitDiscountScatter,
    RegionCategoryHeatmap,
    ConversionFunnel,
}

/// What `top_products` ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    #[default]
    Sales,
    Profit,
}

/// Every KPI for one filtered set. `mom_growth` is `None` when it is
/// undefined (fewer than two months, or a zero previous month).
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSet {
    pub total_sales: f64,
    pub order_count: usize,
    pub avg_order_value: f64,
    pub mom_growth: Option<f64>,
    pub total_profit: f64,
    pub avg_discount: f64,
    pub negative_profit_orders: usize,
}

impl KpiSet {
    pub fn value(&self, kind: KpiKind) -> Option<f64> {
        match kind {
            KpiKind::TotalSales => Some(self.total_sales),
            KpiKind::OrderCount => Some(self.order_count as f64),
            KpiKind::AvgOrderValue => Some(self.avg_order_value),
            KpiKind::MomGrowth => self.mom_growth,
            KpiKind::TotalProfit => Some(self.total_profit),
            KpiKind::AvgDiscount => Some(self.avg_discount),
            KpiKind::NegativeProfitOrders => Some(self.negative_profit_orders as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub month: NaiveDate,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupTotal {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupShare {
    pub key: String,
    pub sales: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPoint {
    pub discount: f64,
    pub profit: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCount {
    pub stage: FunnelStage,
    pub count: u64,
}

/// Dense region x category matrix; `values[row][column]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Heatmap {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl Heatmap {
    #[cfg(test)]
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|k| k == row)?;
        let c = self.columns.iter().position(|k| k == column)?;
        Some(self.values[r][c])
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartDataset {
    Trend(Vec<TrendPoint>),
    Totals(Vec<GroupTotal>),
    Shares(Vec<GroupShare>),
    Scatter(Vec<ScatterPoint>),
    Heatmap(Heatmap),
    Funnel(Vec<StageCount>),
}

impl ChartDataset {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartDataset::Trend(points) => points.is_empty(),
            ChartDataset::Totals(rows) => rows.is_empty(),
            ChartDataset::Shares(rows) => rows.is_empty(),
            ChartDataset::Scatter(points) => points.is_empty(),
            ChartDataset::Heatmap(matrix) => matrix.is_empty(),
            ChartDataset::Funnel(stages) => stages.iter().all(|s| s.count == 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileData {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub value: Option<f64>,
    pub precision: i32,
}

impl TileData {
    pub fn new(id: String, title: String, unit: String, value: Option<f64>, precision: i32) -> Self {
        Self {
            id,
            title,
            unit,
            value,
            precision,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub unit: Option<String>,
    pub dataset: ChartDataset,
}

impl ChartData {
    pub fn new(
        id: String,
        title: String,
        kind: ChartKind,
        unit: Option<String>,
        dataset: ChartDataset,
    ) -> Self {
        Self {
            id,
            title,
            kind,
            unit,
            dataset,
        }
    }
}
