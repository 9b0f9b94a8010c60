use crate::{
    model_service::Classifier,
    report::FieldErrors,
    scheme::{Scheme, SchemeInput},
    server::SharedState,
    store::StoreError,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;

const ROUTE: &str = "/scheme/";

#[derive(Error, Debug)]
pub enum SchemeError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    #[error("Scheme validation failed: {0:?}")]
    Validation(FieldErrors),
    #[error("Not found.")]
    NotFound,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for SchemeError {
    fn into_response(self) -> Response {
        match self {
            SchemeError::MalformedPayload(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "detail": format!("JSON parse error - {}", details) })),
            )
                .into_response(),
            SchemeError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            SchemeError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            SchemeError::Store(e) => {
                tracing::error!("Scheme store failed: {}", e);
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
pub async fn list_schemes<C: Classifier>(
    State(state): State<SharedState<C>>,
) -> Result<Json<Vec<Scheme>>, SchemeError> {
    state.metrics.record_request(ROUTE);
    Ok(Json(state.schemes.list_schemes()?))
}

#[instrument(skip(state, payload))]
pub async fn create_scheme<C: Classifier>(
    State(state): State<SharedState<C>>,
    payload: Result<Json<SchemeInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Scheme>), SchemeError> {
    state.metrics.record_request(ROUTE);

    let Json(input) = payload.map_err(|e| SchemeError::MalformedPayload(e.body_text()))?;
    let details = input.validate().map_err(SchemeError::Validation)?;
    let scheme = state.schemes.insert_scheme(details)?;
    tracing::info!("Created scheme {} ({})", scheme.id, scheme.details.title);

    Ok((StatusCode::CREATED, Json(scheme)))
}

#[instrument(skip(state, id))]
pub async fn get_scheme<C: Classifier>(
    State(state): State<SharedState<C>>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<Scheme>, SchemeError> {
    state.metrics.record_request("/scheme/{id}/");

    let Path(id) = id.map_err(|_| SchemeError::NotFound)?;
    state
        .schemes
        .get_scheme(id)?
        .map(Json)
        .ok_or(SchemeError::NotFound)
}
