// Streaming dashboard service - Progressive loading, one message per widget
use crate::application::dashboard_service::DashboardService;
use crate::application::filter_session::FilterRequest;
use crate::domain::dashboard::{DashboardWarning, StreamMessage};
use futures::stream::Stream;
use std::time::Instant;

#[derive(Clone)]
pub struct StreamingDashboardService {
    dashboard: DashboardService,
}

impl StreamingDashboardService {
    pub fn new(dashboard: DashboardService) -> Self {
        Self { dashboard }
    }

    /// Skeleton first, then warnings, then each tile and chart as it is
    /// computed, then a completion message. Widgets are computed in order on
    /// the polling task; nothing is spawned.
    pub fn stream_dashboard(
        &self,
        session: String,
        request: FilterRequest,
    ) -> impl Stream<Item = StreamMessage> + Send + use<> {
        let service = self.dashboard.clone();

        async_stream::stream! {
            let start_time = Instant::now();
            let (mut view, warnings) = service.open_view(&session, &request);

            let skeleton = service.skeleton(&view);
            let total_widgets = skeleton.tiles.len() + skeleton.charts.len();
            yield StreamMessage::Skeleton(skeleton);

            for warning in warnings {
                yield StreamMessage::Warning(warning);
            }

            let kpis = service.kpis(&mut view);
            if kpis.order_count == 0 {
                tracing::warn!("Session {} filter matched no rows", session);
                yield StreamMessage::Warning(DashboardWarning::EmptyResult);
            }

            for tile in service.tiles(&kpis) {
                yield StreamMessage::TileUpdate(tile);
            }

            for chart_config in &service.widgets().charts {
                let chart = service.chart(&mut view, chart_config);
                tracing::debug!("Streaming chart {} for session {}", chart.id, session);
                yield StreamMessage::ChartUpdate(chart);
            }

            let duration_ms = start_time.elapsed().as_millis() as u64;
            yield StreamMessage::Complete { widgets: total_widgets, duration_ms };
        }
    }
}
