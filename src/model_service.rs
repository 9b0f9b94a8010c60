use ndarray::ArrayView4;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to load model: {0}")]
    Load(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Unexpected model output: {0}")]
    Output(String),
}

/// A loaded image classifier: one preprocessed batch in, class probabilities out.
pub trait Classifier: Send + Sync + 'static {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError>;
}
