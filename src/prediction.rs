use crate::{
    labels::LabelMap, model_service::Classifier, recommendation::recommendation_for,
    report::HealthStatus,
};
use anyhow::{anyhow, Context};
use image::{imageops::FilterType, ImageReader};
use ndarray::{Array, Array4};
use serde::Serialize;
use std::{path::Path, sync::Arc};
use thiserror::Error;
use tracing::instrument;

pub const IMAGE_SIZE: u32 = 128;
pub const NO_DISEASE_DETECTED: &str = "No disease detected";
pub const PREDICTION_FAILED: &str = "Failed to analyze image.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub health: HealthStatus,
    pub confidence: f64,
    pub plant: String,
    pub issue: String,
    pub recommendation: String,
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{error} {details}")]
pub struct PredictionError {
    pub error: String,
    pub details: String,
}

impl PredictionError {
    fn new(details: impl Into<String>) -> Self {
        Self {
            error: PREDICTION_FAILED.to_string(),
            details: details.into(),
        }
    }
}

/// Turns an image on disk into a classified, annotated prediction.
pub struct PredictionService<C: Classifier> {
    classifier: Arc<C>,
    labels: Arc<LabelMap>,
}

impl<C: Classifier> Clone for PredictionService<C> {
    fn clone(&self) -> Self {
        Self {
            classifier: self.classifier.clone(),
            labels: self.labels.clone(),
        }
    }
}

impl<C: Classifier> PredictionService<C> {
    pub fn new(classifier: C, labels: LabelMap) -> Self {
        Self {
            classifier: Arc::new(classifier),
            labels: Arc::new(labels),
        }
    }

    #[instrument(skip(self))]
    pub fn predict_plant_disease(
        &self,
        image_path: &Path,
    ) -> Result<PredictionResult, PredictionError> {
        self.try_predict(image_path).map_err(|e| {
            tracing::warn!("An error occurred during prediction: {:#}", e);
            PredictionError::new(format!("{:#}", e))
        })
    }

    fn try_predict(&self, image_path: &Path) -> anyhow::Result<PredictionResult> {
        let input = load_input_tensor(image_path)?;
        let probabilities = self.classifier.predict(input.view())?;

        let (class_index, probability) = argmax(&probabilities)
            .ok_or_else(|| anyhow!("classifier returned no class probabilities"))?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(anyhow!(
                "classifier output {} is not a probability",
                probability
            ));
        }
        let confidence = round_to_hundredths(f64::from(probability) * 100.0);

        let class_name = self.labels.get(class_index).ok_or_else(|| {
            anyhow!(
                "predicted index {} has no label ({} labels loaded)",
                class_index,
                self.labels.len()
            )
        })?;

        let (plant, issue) = split_class_name(class_name);
        let (health, issue) = if issue.to_lowercase().contains("healthy") {
            (HealthStatus::Healthy, NO_DISEASE_DETECTED.to_string())
        } else {
            (HealthStatus::Disease, issue)
        };

        tracing::debug!(
            class_name,
            confidence,
            health = health.as_str(),
            "Classified image"
        );

        Ok(PredictionResult {
            health,
            confidence,
            plant,
            issue,
            recommendation: recommendation_for(class_name).to_string(),
        })
    }
}

/// Decodes the file, resizes it to the model frame and scales channels to [0, 1].
/// The returned tensor is NHWC with a batch of one.
pub fn load_input_tensor(image_path: &Path) -> anyhow::Result<Array4<f32>> {
    let img = ImageReader::open(image_path)
        .with_context(|| format!("cannot open {:?}", image_path))?
        .with_guessed_format()
        .context("cannot detect image format")?
        .decode()
        .context("cannot decode image")?;

    let img = img
        .resize_exact(IMAGE_SIZE, IMAGE_SIZE, FilterType::Nearest)
        .to_rgb8();

    let size = IMAGE_SIZE as usize;
    let mut input = Array::zeros((1, size, size, 3));
    for (x, y, pixel) in img.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let (x, y) = (x as usize, y as usize);
        input[[0, y, x, 0]] = (r as f32) / 255.;
        input[[0, y, x, 1]] = (g as f32) / 255.;
        input[[0, y, x, 2]] = (b as f32) / 255.;
    }

    Ok(input)
}

// First index wins on ties; NaN scores never win.
fn argmax(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| !score.is_nan())
        .reduce(|best, next| if next.1 > best.1 { next } else { best })
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `"Tomato_Early_blight"` becomes `("Tomato", "Early blight")`.
fn split_class_name(class_name: &str) -> (String, String) {
    let mut parts = class_name.split('_');
    let plant = parts.next().unwrap_or_default().to_string();
    let issue = parts.collect::<Vec<_>>().join(" ");
    (plant, issue)
}
