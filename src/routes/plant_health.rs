use crate::{
    model_service::Classifier,
    prediction::PredictionError,
    report::{FieldErrors, NewReport, PlantHealthReport, UploadedImage},
    server::SharedState,
    storage::StorageError,
    store::StoreError,
};
use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Instant;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::instrument;

const ROUTE: &str = "/plant-health/";
const IMAGE_FIELD: &str = "image";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No image file provided.")]
    MissingImage,
    #[error("Malformed upload: {0}")]
    MalformedUpload(#[from] MultipartError),
    #[error("Prediction failed: {0}")]
    Prediction(PredictionError),
    #[error("Report validation failed: {0:?}")]
    Validation(FieldErrors),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Background task failed: {0}")]
    Task(#[from] JoinError),
}

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        match self {
            ReportError::MissingImage => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "No image file provided." })),
            )
                .into_response(),
            ReportError::MalformedUpload(e) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Malformed upload.", "details": e.body_text() })),
            )
                .into_response(),
            ReportError::Prediction(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(e)).into_response()
            }
            ReportError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            unexpected => {
                tracing::error!("Unexpected error while creating report: {}", unexpected);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "An unexpected error occurred.",
                        "details": unexpected.to_string(),
                    })),
                )
                    .into_response()
            }
        }
    }
}

#[instrument(skip(state))]
pub async fn list_reports<C: Classifier>(
    State(state): State<SharedState<C>>,
) -> Result<Json<Vec<PlantHealthReport>>, ReportError> {
    state.metrics.record_request(ROUTE);

    let reports = state.reports.list_reports()?;
    tracing::debug!("Returning {} reports", reports.len());

    Ok(Json(reports))
}

#[instrument(skip(state, multipart))]
pub async fn create_report<C: Classifier>(
    State(state): State<SharedState<C>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<PlantHealthReport>), ReportError> {
    state.metrics.record_request(ROUTE);

    // A body that is not multipart cannot carry the image either.
    let mut multipart = multipart.map_err(|_| ReportError::MissingImage)?;
    let upload = read_image_field(&mut multipart)
        .await?
        .ok_or(ReportError::MissingImage)?;
    tracing::info!(
        "Received {:?} ({} bytes)",
        upload.file_name,
        upload.content.len()
    );

    let started = Instant::now();
    let media = state.media.clone();
    let service = state.prediction_service.clone();
    let (upload, prediction) = tokio::task::spawn_blocking(move || {
        // The staged copy is removed when the guard drops, whatever the outcome.
        let staged = media.stage_upload(&upload)?;
        let prediction = service.predict_plant_disease(staged.path());
        Ok::<_, StorageError>((upload, prediction))
    })
    .await??;
    state
        .metrics
        .record_prediction_duration(started.elapsed().as_millis() as u64, ROUTE);

    let prediction = prediction.map_err(|e| {
        state.metrics.record_prediction_outcome("error");
        ReportError::Prediction(e)
    })?;
    state
        .metrics
        .record_prediction_outcome(prediction.health.as_str());
    tracing::info!(
        plant = %prediction.plant,
        health = prediction.health.as_str(),
        confidence = prediction.confidence,
        "Prediction result"
    );

    let new_report = NewReport {
        image: upload,
        health: prediction.health,
        confidence: prediction.confidence,
        issue: Some(prediction.issue),
        recommendation: Some(prediction.recommendation),
    };
    if let Err(errors) = new_report.validate() {
        tracing::warn!("Report validation failed: {:?}", errors);
        return Err(ReportError::Validation(errors));
    }

    let media = state.media.clone();
    let (new_report, stored) = tokio::task::spawn_blocking(move || {
        let stored = media.save_image(&new_report.image);
        (new_report, stored)
    })
    .await?;
    let stored = stored?;

    let report = match state.reports.insert_report(&new_report, &stored) {
        Ok(report) => report,
        Err(e) => {
            state.media.discard(&stored);
            return Err(e.into());
        }
    };
    tracing::info!("Created report {}", report.id);

    Ok((StatusCode::CREATED, Json(report)))
}

/// Reads the first `image` file part. Parts without a file name or content do
/// not count as an upload.
async fn read_image_field(
    multipart: &mut Multipart,
) -> Result<Option<UploadedImage>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let content = field.bytes().await?;
        if content.is_empty() {
            continue;
        }

        return Ok(Some(UploadedImage {
            file_name,
            content: content.to_vec(),
        }));
    }

    Ok(None)
}
