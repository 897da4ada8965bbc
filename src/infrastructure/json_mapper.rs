// Mapper to convert domain models to JSON transfer objects
use crate::domain::dashboard::{Dashboard, DashboardSkeleton, DashboardWarning, StreamMessage};
use crate::domain::dataset::Dataset;
use crate::domain::filter::FilterSpec;
use crate::domain::widgets::{ChartData, ChartDataset, ChartKind, TileData};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub title: String,
    pub filter: FilterDto,
    pub tiles: Vec<TileDto>,
    pub charts: Vec<ChartDto>,
    pub warnings: Vec<WarningDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDto {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub regions: Vec<String>,
    pub segments: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptionsDto {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub regions: Vec<String>,
    pub segments: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningDto {
    pub kind: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileDto {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub value: Option<f64>,
    pub precision: i32,
    /// Preformatted value, "—" when undefined
    pub display: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDto {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub unit: Option<String>,
    /// Nothing to plot; the client shows a placeholder
    pub empty: bool,
    pub data: ChartDataDto,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChartDataDto {
    Trend { points: Vec<TrendPointDto> },
    Totals { rows: Vec<TotalDto> },
    Shares { rows: Vec<ShareDto> },
    Scatter { points: Vec<ScatterPointDto> },
    Heatmap { rows: Vec<String>, columns: Vec<String>, values: Vec<Vec<f64>> },
    Funnel { stages: Vec<StageDto> },
}

#[derive(Debug, Serialize)]
pub struct TrendPointDto {
    pub month: NaiveDate,
    pub sales: f64,
}

#[derive(Debug, Serialize)]
pub struct TotalDto {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Serialize)]
pub struct ShareDto {
    pub key: String,
    pub sales: f64,
    pub percent: f64,
}

#[derive(Debug, Serialize)]
pub struct ScatterPointDto {
    pub discount: f64,
    pub profit: f64,
}

#[derive(Debug, Serialize)]
pub struct StageDto {
    pub stage: &'static str,
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileSkeletonDto {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub precision: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSkeletonDto {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub unit: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamMessageDto {
    #[serde(rename_all = "camelCase")]
    Skeleton {
        title: String,
        filter: FilterDto,
        tiles: Vec<TileSkeletonDto>,
        charts: Vec<ChartSkeletonDto>,
    },
    Warning { warning: WarningDto },
    TileUpdate { tile: TileDto },
    ChartUpdate { chart: ChartDto },
    #[serde(rename_all = "camelCase")]
    Complete { widgets: usize, duration_ms: u64 },
}

pub fn dashboard_to_dto(dashboard: Dashboard) -> DashboardDto {
    DashboardDto {
        title: dashboard.title,
        filter: filter_to_dto(&dashboard.filter),
        tiles: dashboard.tiles.into_iter().map(tile_to_dto).collect(),
        charts: dashboard.charts.into_iter().map(chart_to_dto).collect(),
        warnings: dashboard.warnings.iter().map(warning_to_dto).collect(),
    }
}

pub fn filter_options_to_dto(dataset: &Dataset) -> FilterOptionsDto {
    FilterOptionsDto {
        min_date: dataset.min_date(),
        max_date: dataset.max_date(),
        regions: dataset.regions().to_vec(),
        segments: dataset.segments().to_vec(),
    }
}

pub fn stream_message_to_dto(message: StreamMessage) -> StreamMessageDto {
    match message {
        StreamMessage::Skeleton(skeleton) => skeleton_to_dto(skeleton),
        StreamMessage::Warning(warning) => StreamMessageDto::Warning {
            warning: warning_to_dto(&warning),
        },
        StreamMessage::TileUpdate(tile) => StreamMessageDto::TileUpdate { tile: tile_to_dto(tile) },
        StreamMessage::ChartUpdate(chart) => StreamMessageDto::ChartUpdate {
            chart: chart_to_dto(chart),
        },
        StreamMessage::Complete { widgets, duration_ms } => {
            StreamMessageDto::Complete { widgets, duration_ms }
        }
    }
}

fn skeleton_to_dto(skeleton: DashboardSkeleton) -> StreamMessageDto {
    StreamMessageDto::Skeleton {
        title: skeleton.title,
        filter: filter_to_dto(&skeleton.filter),
        tiles: skeleton
            .tiles
            .into_iter()
            .map(|t| TileSkeletonDto {
                id: t.id,
                title: t.title,
                unit: t.unit,
                precision: t.precision,
            })
            .collect(),
        charts: skeleton
            .charts
            .into_iter()
            .map(|c| ChartSkeletonDto {
                id: c.id,
                title: c.title,
                kind: c.kind,
                unit: c.unit,
            })
            .collect(),
    }
}

fn filter_to_dto(filter: &FilterSpec) -> FilterDto {
    FilterDto {
        start: filter.start(),
        end: filter.end(),
        regions: filter.regions().iter().cloned().collect(),
        segments: filter.segments().iter().cloned().collect(),
    }
}

fn warning_to_dto(warning: &DashboardWarning) -> WarningDto {
    let kind = match warning {
        DashboardWarning::FilterRejected(_) => "filterRejected",
        DashboardWarning::EmptyResult => "emptyResult",
    };
    WarningDto {
        kind,
        message: warning.to_string(),
    }
}

fn tile_to_dto(tile: TileData) -> TileDto {
    let display = format_tile_value(tile.value, &tile.unit, tile.precision);
    TileDto {
        id: tile.id,
        title: tile.title,
        unit: tile.unit,
        value: tile.value,
        precision: tile.precision,
        display,
    }
}

fn chart_to_dto(chart: ChartData) -> ChartDto {
    let empty = chart.dataset.is_empty();
    let data = match chart.dataset {
        ChartDataset::Trend(points) => ChartDataDto::Trend {
            points: points
                .into_iter()
                .map(|p| TrendPointDto { month: p.month, sales: p.sales })
                .collect(),
        },
        ChartDataset::Totals(rows) => ChartDataDto::Totals {
            rows: rows
                .into_iter()
                .map(|g| TotalDto { key: g.key, value: g.value })
                .collect(),
        },
        ChartDataset::Shares(rows) => ChartDataDto::Shares {
            rows: rows
                .into_iter()
                .map(|s| ShareDto { key: s.key, sales: s.sales, percent: s.percent })
                .collect(),
        },
        ChartDataset::Scatter(points) => ChartDataDto::Scatter {
            points: points
                .into_iter()
                .map(|p| ScatterPointDto { discount: p.discount, profit: p.profit })
                .collect(),
        },
        ChartDataset::Heatmap(matrix) => ChartDataDto::Heatmap {
            rows: matrix.rows,
            columns: matrix.columns,
            values: matrix.values,
        },
        ChartDataset::Funnel(stages) => ChartDataDto::Funnel {
            stages: stages
                .into_iter()
                .map(|s| StageDto { stage: s.stage.label(), count: s.count })
                .collect(),
        },
    };

    ChartDto {
        id: chart.id,
        title: chart.title,
        kind: chart.kind,
        unit: chart.unit,
        empty,
        data,
    }
}

/// Render a KPI the way the tile shows it: "₹12,345", "12.5%", or "—".
pub fn format_tile_value(value: Option<f64>, unit: &str, precision: i32) -> String {
    let Some(value) = value else {
        return "—".to_string();
    };
    let digits = precision.max(0) as usize;
    let number = group_thousands(&format!("{:.*}", digits, value.abs()));
    let sign = if value < 0.0 && number.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };

    match unit {
        "%" => format!("{}{}%", sign, number),
        "" => format!("{}{}", sign, number),
        prefix => format!("{}{}{}", sign, prefix, number),
    }
}

fn group_thousands(formatted: &str) -> String {
    let (integer, fraction) = match formatted.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (formatted, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match fraction {
        Some(fraction) => format!("{}.{}", grouped, fraction),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transaction::FunnelStage;
    use crate::domain::widgets::StageCount;
    use serde_json::json;

    #[test]
    fn test_format_tile_value() {
        assert_eq!(format_tile_value(Some(1234567.4), "₹", 0), "₹1,234,567");
        assert_eq!(format_tile_value(Some(12.345), "%", 1), "12.3%");
        assert_eq!(format_tile_value(Some(-2500.0), "", 0), "-2,500");
        assert_eq!(format_tile_value(Some(-0.001), "", 0), "0");
        assert_eq!(format_tile_value(Some(999.0), "", 0), "999");
        assert_eq!(format_tile_value(None, "%", 1), "—");
    }

    #[test]
    fn test_chart_json_shape() {
        let chart = ChartData::new(
            "conversion_funnel".to_string(),
            "Conversion Funnel".to_string(),
            ChartKind::ConversionFunnel,
            None,
            ChartDataset::Funnel(vec![
                StageCount { stage: FunnelStage::Visitors, count: 30 },
                StageCount { stage: FunnelStage::Leads, count: 10 },
                StageCount { stage: FunnelStage::Purchases, count: 3 },
            ]),
        );

        let value = serde_json::to_value(chart_to_dto(chart)).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "conversion_funnel",
                "title": "Conversion Funnel",
                "kind": "conversion_funnel",
                "unit": null,
                "empty": false,
                "data": {
                    "type": "funnel",
                    "stages": [
                        { "stage": "Visitors", "count": 30 },
                        { "stage": "Leads", "count": 10 },
                        { "stage": "Purchases", "count": 3 }
                    ]
                }
            })
        );
    }

    #[test]
    fn test_empty_chart_flagged() {
        let chart = ChartData::new(
            "sales_trend".to_string(),
            "Sales Trend".to_string(),
            ChartKind::SalesTrend,
            None,
            ChartDataset::Trend(Vec::new()),
        );
        assert!(chart_to_dto(chart).empty);
    }

    #[test]
    fn test_complete_message_json() {
        let dto = stream_message_to_dto(StreamMessage::Complete { widgets: 14, duration_ms: 3 });
        assert_eq!(
            serde_json::to_value(dto).unwrap(),
            json!({ "type": "complete", "widgets": 14, "durationMs": 3 })
        );
    }
}
