use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Disease,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Disease => "disease",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantHealthReport {
    pub id: u64,
    pub image_url: String,
    pub health: HealthStatus,
    pub confidence: f64,
    pub issue: String,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

/// An uploaded image as received, before it is persisted.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Everything needed to persist a report. Built once per request, never mutated.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub image: UploadedImage,
    pub health: HealthStatus,
    pub confidence: f64,
    pub issue: Option<String>,
    pub recommendation: Option<String>,
}

/// Field name to validation messages, serialized as the 400 response body.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

impl NewReport {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut push = |field: &str, message: &str| {
            errors
                .entry(field.to_string())
                .or_default()
                .push(message.to_string());
        };

        if self.image.file_name.trim().is_empty() {
            push("image", "No filename could be determined.");
        }
        if self.image.content.is_empty() {
            push("image", "The submitted file is empty.");
        } else if image::guess_format(&self.image.content).is_err() {
            push(
                "image",
                "Upload a valid image. The file you uploaded was either not an image or a corrupted image.",
            );
        }
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            push("confidence", "Ensure this value is between 0 and 100.");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
