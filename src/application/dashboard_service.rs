// Dashboard service - Use case for building dashboards
use crate::application::aggregation;
use crate::application::filter_engine::apply_filters;
use crate::application::filter_session::{FilterRequest, FilterResolver};
use crate::application::memoizer::{CacheKey, CachedValue, Computation, Memoizer};
use crate::domain::dashboard::{
    ChartSkeleton, Dashboard, DashboardSkeleton, DashboardWarning, TileSkeleton,
};
use crate::domain::dataset::Dataset;
use crate::domain::filter::FilterSpec;
use crate::domain::transaction::{FunnelStage, Transaction};
use crate::domain::widgets::{ChartData, ChartDataset, ChartKind, KpiSet, StageCount, TileData};
use crate::infrastructure::config::{render_template, ChartConfig, DashboardSettings, WidgetsConfig};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// The resolved filter of one request, with its rows filtered on first use.
/// Fully cached requests never run the filter at all.
pub struct FilteredView {
    session: String,
    filter: FilterSpec,
    rows: Option<Vec<Transaction>>,
}

impl FilteredView {
    fn rows(&mut self, dataset: &Dataset) -> &[Transaction] {
        self.rows
            .get_or_insert_with(|| apply_filters(dataset.transactions(), &self.filter))
    }

    fn key(&self, dataset: &Dataset, computation: Computation) -> CacheKey {
        CacheKey {
            session: self.session.clone(),
            dataset_version: dataset.version(),
            filter: self.filter.clone(),
            computation,
        }
    }
}

#[derive(Clone)]
pub struct DashboardService {
    dataset: Arc<Dataset>,
    memoizer: Arc<dyn Memoizer>,
    filters: Arc<FilterResolver>,
    widgets_config: WidgetsConfig,
    settings: DashboardSettings,
    has_funnel_stages: bool,
}

impl DashboardService {
    pub fn new(
        dataset: Arc<Dataset>,
        memoizer: Arc<dyn Memoizer>,
        widgets_config: WidgetsConfig,
        settings: DashboardSettings,
    ) -> Self {
        let has_funnel_stages = dataset.has_funnel_stages();
        let max_sessions = NonZeroUsize::new(settings.max_sessions).unwrap_or(NonZeroUsize::MIN);
        Self {
            dataset,
            memoizer,
            filters: Arc::new(FilterResolver::new(max_sessions)),
            widgets_config,
            settings,
            has_funnel_stages,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn widgets(&self) -> &WidgetsConfig {
        &self.widgets_config
    }

    pub fn get_dashboard(&self, session: &str, request: &FilterRequest) -> Dashboard {
        let (mut view, mut warnings) = self.open_view(session, request);

        let kpis = self.kpis(&mut view);
        if kpis.order_count == 0 {
            warnings.push(DashboardWarning::EmptyResult);
        }

        let tiles = self.tiles(&kpis);
        let charts = self
            .widgets_config
            .charts
            .iter()
            .map(|chart_config| self.chart(&mut view, chart_config))
            .collect();

        Dashboard::new(self.settings.title.clone(), view.filter, tiles, charts, warnings)
    }

    /// Resolve the request into a valid filter for `session`.
    pub fn open_view(&self, session: &str, request: &FilterRequest) -> (FilteredView, Vec<DashboardWarning>) {
        let (filter, rejected) = self.filters.resolve(session, request, &self.dataset);
        let view = FilteredView {
            session: session.to_string(),
            filter,
            rows: None,
        };
        (view, rejected.into_iter().collect())
    }

    pub fn skeleton(&self, view: &FilteredView) -> DashboardSkeleton {
        let vars = self.template_vars();
        let tiles = self
            .widgets_config
            .tiles
            .iter()
            .map(|t| TileSkeleton {
                id: t.id.clone(),
                title: render_template(&t.title, &vars),
                unit: render_template(&t.unit, &vars),
                precision: t.precision,
            })
            .collect();
        let charts = self
            .widgets_config
            .charts
            .iter()
            .map(|c| ChartSkeleton {
                id: c.id.clone(),
                title: render_template(&c.title, &vars),
                kind: c.kind,
                unit: c.unit.as_ref().map(|unit| render_template(unit, &vars)),
            })
            .collect();

        DashboardSkeleton {
            title: self.settings.title.clone(),
            filter: view.filter.clone(),
            tiles,
            charts,
        }
    }

    pub fn kpis(&self, view: &mut FilteredView) -> KpiSet {
        let key = view.key(&self.dataset, Computation::Kpis);
        let value = self.memoizer.get_or_compute(key, &mut || {
            CachedValue::Kpis(aggregation::compute_kpis(view.rows(&self.dataset)))
        });

        match value {
            CachedValue::Kpis(kpis) => kpis,
            CachedValue::Chart(_) => {
                tracing::warn!("Memoizer returned a chart for a KPI key, recomputing");
                aggregation::compute_kpis(view.rows(&self.dataset))
            }
        }
    }

    pub fn tiles(&self, kpis: &KpiSet) -> Vec<TileData> {
        let vars = self.template_vars();
        self.widgets_config
            .tiles
            .iter()
            .map(|tile_config| {
                TileData::new(
                    tile_config.id.clone(),
                    render_template(&tile_config.title, &vars),
                    render_template(&tile_config.unit, &vars),
                    kpis.value(tile_config.kpi),
                    tile_config.precision,
                )
            })
            .collect()
    }

    pub fn chart(&self, view: &mut FilteredView, chart_config: &ChartConfig) -> ChartData {
        let computation = Computation::Chart {
            kind: chart_config.kind,
            top_n: chart_config.top_n,
            metric: chart_config.metric,
        };
        let key = view.key(&self.dataset, computation);
        let value = self.memoizer.get_or_compute(key, &mut || {
            CachedValue::Chart(self.chart_dataset(chart_config, view.rows(&self.dataset)))
        });

        let dataset = match value {
            CachedValue::Chart(dataset) => dataset,
            CachedValue::Kpis(_) => {
                tracing::warn!("Memoizer returned KPIs for chart {}, recomputing", chart_config.id);
                self.chart_dataset(chart_config, view.rows(&self.dataset))
            }
        };

        let vars = self.template_vars();
        ChartData::new(
            chart_config.id.clone(),
            render_template(&chart_config.title, &vars),
            chart_config.kind,
            chart_config.unit.as_ref().map(|unit| render_template(unit, &vars)),
            dataset,
        )
    }

    fn chart_dataset(&self, chart_config: &ChartConfig, rows: &[Transaction]) -> ChartDataset {
        match chart_config.kind {
            ChartKind::SalesTrend => ChartDataset::Trend(aggregation::sales_trend(rows)),
            ChartKind::SegmentShare => ChartDataset::Shares(aggregation::segment_shares(rows)),
            ChartKind::RegionTotals => ChartDataset::Totals(aggregation::region_totals(rows)),
            ChartKind::TopProducts => ChartDataset::Totals(aggregation::top_products(
                rows,
                chart_config.top_n,
                chart_config.metric,
            )),
            ChartKind::ProfitDiscountScatter => {
                ChartDataset::Scatter(aggregation::profit_discount_scatter(rows))
            }
            ChartKind::RegionCategoryHeatmap => {
                ChartDataset::Heatmap(aggregation::region_category_heatmap(rows))
            }
            ChartKind::ConversionFunnel => ChartDataset::Funnel(self.funnel(rows)),
        }
    }

    fn funnel(&self, rows: &[Transaction]) -> Vec<StageCount> {
        if rows.is_empty() {
            return zero_funnel();
        }
        if self.has_funnel_stages {
            return aggregation::funnel_stage_counts(rows).unwrap_or_else(zero_funnel);
        }
        aggregation::estimated_funnel(aggregation::order_count(rows))
    }

    fn template_vars(&self) -> HashMap<String, String> {
        let mut vars = HashMap::new();
        vars.insert("currency".to_string(), self.settings.currency.clone());
        vars
    }
}

fn zero_funnel() -> Vec<StageCount> {
    FunnelStage::CANONICAL_ORDER
        .iter()
        .map(|&stage| StageCount { stage, count: 0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::memoizer::PassThrough;
    use crate::domain::transaction::fixtures::txn;
    use crate::infrastructure::memo_cache::LruMemoizer;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dataset() -> Arc<Dataset> {
        let mut west = txn("3", "2024-02-01", "West", 300.0);
        west.profit = -10.0;
        Arc::new(
            Dataset::new(vec![
                txn("1", "2024-01-01", "East", 100.0),
                txn("2", "2024-02-01", "East", 150.0),
                west,
            ])
            .unwrap(),
        )
    }

    fn service(memoizer: Arc<dyn Memoizer>) -> DashboardService {
        DashboardService::new(
            dataset(),
            memoizer,
            WidgetsConfig::builtin().unwrap(),
            DashboardSettings::default(),
        )
    }

    fn tile<'a>(dashboard: &'a Dashboard, id: &str) -> &'a TileData {
        dashboard.tiles.iter().find(|t| t.id == id).unwrap()
    }

    fn chart<'a>(dashboard: &'a Dashboard, kind: ChartKind) -> &'a ChartData {
        dashboard.charts.iter().find(|c| c.kind == kind).unwrap()
    }

    #[test]
    fn test_full_range_dashboard() {
        let dashboard = service(Arc::new(PassThrough)).get_dashboard("s1", &FilterRequest::default());

        assert_eq!(dashboard.title, "Retail Sales Dashboard");
        assert!(dashboard.warnings.is_empty());
        assert_eq!(tile(&dashboard, "total_sales").value, Some(550.0));
        assert_eq!(tile(&dashboard, "total_sales").unit, "₹");
        assert_eq!(tile(&dashboard, "orders").value, Some(3.0));
        assert_eq!(tile(&dashboard, "mom_growth").value, Some(350.0));
        assert_eq!(tile(&dashboard, "loss_orders").value, Some(1.0));
        assert_eq!(dashboard.charts.len(), 7);
    }

    #[test]
    fn test_region_filter_scenario() {
        let request = FilterRequest {
            start: Some(date("2024-01-01")),
            end: Some(date("2024-01-31")),
            regions: vec!["East".to_string()],
            segments: Vec::new(),
        };
        let dashboard = service(Arc::new(PassThrough)).get_dashboard("s1", &request);

        assert_eq!(tile(&dashboard, "total_sales").value, Some(100.0));
        assert_eq!(tile(&dashboard, "mom_growth").value, None);
        match &chart(&dashboard, ChartKind::RegionTotals).dataset {
            ChartDataset::Totals(totals) => {
                assert_eq!(totals.len(), 1);
                assert_eq!(totals[0].key, "East");
            }
            other => panic!("unexpected dataset {:?}", other),
        }
    }

    #[test]
    fn test_empty_result_warns_and_renders_empty() {
        let request = FilterRequest {
            regions: vec!["South".to_string()],
            ..Default::default()
        };
        let dashboard = service(Arc::new(PassThrough)).get_dashboard("s1", &request);

        assert_eq!(dashboard.warnings, vec![DashboardWarning::EmptyResult]);
        assert_eq!(tile(&dashboard, "total_sales").value, Some(0.0));
        assert_eq!(tile(&dashboard, "aov").value, Some(0.0));
        assert!(dashboard.charts.iter().all(|c| c.dataset.is_empty()));
    }

    #[test]
    fn test_invalid_filter_is_recovered() {
        let request = FilterRequest {
            start: Some(date("2024-02-01")),
            end: Some(date("2024-01-01")),
            ..Default::default()
        };
        let service = service(Arc::new(PassThrough));
        let dashboard = service.get_dashboard("s1", &request);

        assert!(matches!(dashboard.warnings.as_slice(), [DashboardWarning::FilterRejected(_)]));
        assert_eq!(dashboard.filter, service.dataset().full_range_filter());
        assert_eq!(tile(&dashboard, "total_sales").value, Some(550.0));
    }

    #[test]
    fn test_window_outside_data_is_empty_result() {
        let request = FilterRequest {
            start: Some(date("2023-01-01")),
            end: Some(date("2023-06-01")),
            ..Default::default()
        };
        let dashboard = service(Arc::new(PassThrough)).get_dashboard("s1", &request);

        assert_eq!(dashboard.warnings, vec![DashboardWarning::EmptyResult]);
        assert_eq!(tile(&dashboard, "orders").value, Some(0.0));
    }

    #[test]
    fn test_estimated_funnel_without_stage_data() {
        let dashboard = service(Arc::new(PassThrough)).get_dashboard("s1", &FilterRequest::default());
        match &chart(&dashboard, ChartKind::ConversionFunnel).dataset {
            ChartDataset::Funnel(stages) => {
                let counts: Vec<u64> = stages.iter().map(|s| s.count).collect();
                assert_eq!(counts, vec![30, 10, 3]);
            }
            other => panic!("unexpected dataset {:?}", other),
        }
    }

    #[test]
    fn test_cache_serves_repeat_requests() {
        let memo = Arc::new(LruMemoizer::new(NonZeroUsize::new(64).unwrap()));
        let service = service(memo.clone());

        let first = service.get_dashboard("s1", &FilterRequest::default());
        let misses = memo.misses();
        let second = service.get_dashboard("s1", &FilterRequest::default());

        assert_eq!(memo.misses(), misses);
        assert_eq!(memo.hits(), misses);
        assert_eq!(first.tiles, second.tiles);
        assert_eq!(first.charts, second.charts);
    }

    #[test]
    fn test_cached_and_uncached_agree() {
        let request = FilterRequest {
            segments: vec!["Consumer".to_string()],
            ..Default::default()
        };
        let cached = service(Arc::new(LruMemoizer::new(NonZeroUsize::new(64).unwrap())));
        let uncached = service(Arc::new(PassThrough));

        cached.get_dashboard("s1", &request);
        let a = cached.get_dashboard("s1", &request);
        let b = uncached.get_dashboard("s1", &request);
        assert_eq!(a.tiles, b.tiles);
        assert_eq!(a.charts, b.charts);
    }
}
