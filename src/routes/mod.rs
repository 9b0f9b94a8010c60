mod articles;
mod dashboard;
mod health;
mod metrics;
mod plant_health;
mod schemes;

use crate::{model_service::Classifier, server::SharedState};
use axum::{routing::get, Router};

pub fn api_routes<C: Classifier>() -> Router<SharedState<C>> {
    Router::new()
        .route(
            "/plant-health/",
            get(plant_health::list_reports::<C>).post(plant_health::create_report::<C>),
        )
        .route(
            "/scheme/",
            get(schemes::list_schemes::<C>).post(schemes::create_scheme::<C>),
        )
        .route("/scheme/{id}/", get(schemes::get_scheme::<C>))
        .route("/articles/", get(articles::list_articles::<C>))
        .route("/articles/{id}/", get(articles::get_article::<C>))
        .route("/dashboard/stats/", get(dashboard::stats::<C>))
        .route("/metrics", get(metrics::metrics_handler::<C>))
        .route("/health", get(health::healthcheck))
}
