// HTTP request handlers
use crate::application::filter_session::FilterRequest;
use crate::infrastructure::chunked_json::stream_response;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::infrastructure::json_mapper::{dashboard_to_dto, filter_options_to_dto};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

const SESSION_HEADER: &str = "x-session-id";
const DEFAULT_SESSION: &str = "anonymous";

/// Filter selections as query parameters; `region` and `segment` are
/// comma-separated lists.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub region: Option<String>,
    pub segment: Option<String>,
    pub session: Option<String>,
}

impl DashboardQuery {
    pub fn filter_request(&self) -> FilterRequest {
        FilterRequest {
            start: self.start,
            end: self.end,
            regions: split_list(self.region.as_deref()),
            segments: split_list(self.segment.as_deref()),
        }
    }

    /// Session from the query, then the `x-session-id` header
    pub fn session_id(&self, headers: &HeaderMap) -> String {
        self.session
            .as_deref()
            .or_else(|| headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SESSION)
            .to_string()
    }
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Date bounds and selectable regions/segments
pub async fn get_filters(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let options = filter_options_to_dto(state.dashboard_service.dataset());
    match json_response(&options, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Full dashboard for the requested filter
pub async fn get_dashboard(
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = query.session_id(&headers);
    let request = query.filter_request();

    let dashboard = state.dashboard_service.get_dashboard(&session, &request);
    for warning in &dashboard.warnings {
        tracing::info!("Session {}: {}", session, warning);
    }

    match json_response(&dashboard_to_dto(dashboard), accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream dashboard widgets as they are computed (progressive loading)
pub async fn stream_dashboard(
    Query(query): Query<DashboardQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session = query.session_id(&headers);
    let request = query.filter_request();

    let stream = state.streaming_service.stream_dashboard(session, request);
    stream_response(stream, accepts_brotli(&headers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_filter_request_from_query() {
        let query = DashboardQuery {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 6, 30),
            region: Some("East, West,,".to_string()),
            segment: None,
            session: None,
        };
        let request = query.filter_request();

        assert_eq!(request.regions, vec!["East", "West"]);
        assert!(request.segments.is_empty());
        assert_eq!(request.end, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn test_session_resolution() {
        let mut headers = HeaderMap::new();
        let query = DashboardQuery::default();
        assert_eq!(query.session_id(&headers), "anonymous");

        headers.insert(SESSION_HEADER, HeaderValue::from_static("tab-7"));
        assert_eq!(query.session_id(&headers), "tab-7");

        let query = DashboardQuery {
            session: Some("tab-9".to_string()),
            ..Default::default()
        };
        assert_eq!(query.session_id(&headers), "tab-9");
    }
}
