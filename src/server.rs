use crate::{
    config::ServerConfig,
    model_service::Classifier,
    prediction::PredictionService,
    routes::api_routes,
    storage::MediaStorage,
    store::{ArticleStore, ReportStore, SchemeStore},
    telemetry::Metrics,
};
use axum::{extract::DefaultBodyLimit, http::Method, Router};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Process-wide state handed to every handler.
pub struct SharedState<C: Classifier> {
    pub prediction_service: PredictionService<C>,
    pub reports: Arc<dyn ReportStore>,
    pub schemes: Arc<dyn SchemeStore>,
    pub articles: Arc<dyn ArticleStore>,
    pub media: Arc<MediaStorage>,
    pub metrics: Arc<Metrics>,
}

impl<C: Classifier> Clone for SharedState<C> {
    fn clone(&self) -> Self {
        Self {
            prediction_service: self.prediction_service.clone(),
            reports: self.reports.clone(),
            schemes: self.schemes.clone(),
            articles: self.articles.clone(),
            media: self.media.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

pub fn build_router<C: Classifier>(state: SharedState<C>, server_config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));

    let mut router: Router<SharedState<C>> = api_routes::<C>();

    // Only a path-style base URL is served locally; an absolute URL points elsewhere.
    let media_mount = state.media.base_url().trim_end_matches('/').to_string();
    if media_mount.starts_with('/') && !media_mount.is_empty() {
        router = router.nest_service(&media_mount, ServeDir::new(state.media.root()));
    }

    router
        .with_state(state)
        .layer(DefaultBodyLimit::max(server_config.body_limit_bytes()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new<C: Classifier>(
        state: SharedState<C>,
        server_config: &ServerConfig,
    ) -> anyhow::Result<Self> {
        let router = build_router(state, server_config);
        let listener = TcpListener::bind(server_config.get_address()).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}
