use crate::{article::Article, model_service::Classifier, server::SharedState, store::StoreError};
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum ArticleError {
    #[error("Not found.")]
    NotFound,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ArticleError {
    fn into_response(self) -> Response {
        match self {
            ArticleError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            ArticleError::Store(e) => {
                tracing::error!("Article store failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

#[instrument(skip(state))]
pub async fn list_articles<C: Classifier>(
    State(state): State<SharedState<C>>,
) -> Result<Json<Vec<Article>>, ArticleError> {
    state.metrics.record_request("/articles/");
    Ok(Json(state.articles.list_articles()?))
}

#[instrument(skip(state, id))]
pub async fn get_article<C: Classifier>(
    State(state): State<SharedState<C>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Article>, ArticleError> {
    state.metrics.record_request("/articles/{id}/");

    let Path(id) = id.map_err(|_| ArticleError::NotFound)?;
    state
        .articles
        .get_article(id)?
        .map(Json)
        .ok_or(ArticleError::NotFound)
}
