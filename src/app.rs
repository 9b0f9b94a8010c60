use crate::{
    article::load_articles,
    config::{validate_artifacts, Config, Validatable},
    labels::LabelMap,
    ort_service::OrtClassifier,
    prediction::PredictionService,
    server::{HttpServer, SharedState},
    storage::MediaStorage,
    store::{ArticleStore, MemoryStore},
    telemetry::Metrics,
};
use anyhow::Context;
use std::sync::Arc;
use tokio::signal;

/// Loads every startup artifact, then serves until a shutdown signal arrives.
/// Missing or invalid model and label files stop the process here.
pub async fn start_app(config: Config) -> anyhow::Result<()> {
    validate_artifacts(&config).context("startup artifacts are missing")?;

    let labels = LabelMap::load(&config.labels.get_path())
        .context("failed to load class labels")?;
    let classifier =
        OrtClassifier::new(&config.model).context("failed to load classifier")?;
    let prediction_service = PredictionService::new(classifier, labels);

    let media =
        MediaStorage::new(&config.media).context("failed to prepare media storage")?;
    let metrics = Metrics::new().context("failed to register metrics")?;
    let store = Arc::new(MemoryStore::new());
    if let Some(seed_file) = &config.articles.seed_file {
        for article in load_articles(seed_file).context("failed to load articles")? {
            store.insert_article(article)?;
        }
    }

    let state = SharedState {
        prediction_service,
        reports: store.clone(),
        schemes: store.clone(),
        articles: store,
        media: Arc::new(media),
        metrics: Arc::new(metrics),
    };

    let server = HttpServer::new(state, &config.server).await?;
    server
        .run(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown.");
        })
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
