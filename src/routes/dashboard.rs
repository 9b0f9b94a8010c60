use crate::{model_service::Classifier, server::SharedState, store::StoreError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub scheme_count: usize,
    pub report_count: usize,
    pub article_count: usize,
}

pub async fn stats<C: Classifier>(State(state): State<SharedState<C>>) -> Response {
    state.metrics.record_request("/dashboard/stats/");

    let counts = || -> Result<DashboardStats, StoreError> {
        Ok(DashboardStats {
            scheme_count: state.schemes.count_schemes()?,
            report_count: state.reports.count_reports()?,
            article_count: state.articles.count_articles()?,
        })
    };

    match counts() {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => {
            tracing::error!("Failed to compute dashboard stats: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
