use crate::{
    config::{ModelConfig, Validatable},
    model_service::{Classifier, ClassifierError},
};
use ndarray::ArrayView4;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// ONNX Runtime classifier backed by a round-robin pool of sessions.
#[derive(Clone)]
pub struct OrtClassifier {
    sessions: Arc<Vec<Mutex<Session>>>,
    counter: Arc<AtomicUsize>,
}

impl OrtClassifier {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ClassifierError> {
        model_config.validate().map_err(ClassifierError::Load)?;

        let num_instances = model_config.num_instances.max(1);
        let model_path = model_config.get_path();
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(&model_path)?;
                Ok(Mutex::new(session))
            })
            .collect::<Result<Vec<_>, ort::Error>>()
            .map_err(|e| ClassifierError::Load(e.to_string()))?;

        tracing::info!(
            "Created {} ONNX sessions from {:?}",
            num_instances,
            model_path
        );

        Ok(Self {
            sessions: Arc::new(sessions),
            counter: Arc::new(AtomicUsize::new(0)),
        })
    }
}

impl Classifier for OrtClassifier {
    fn predict(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>, ClassifierError> {
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.sessions.len();
        let mut session = self.sessions[index].lock();
        tracing::debug!("Handling prediction with session {}", index);

        let owned_buffer;
        let input_view = if input.is_standard_layout() {
            input.view()
        } else {
            owned_buffer = input.as_standard_layout().into_owned();
            owned_buffer.view()
        };

        let tensor_ref = TensorRef::from_array_view(input_view)
            .map_err(|e| ClassifierError::Inference(format!("failed to build tensor: {}", e)))?;

        let outputs = session
            .run(ort::inputs![tensor_ref])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Output(format!("failed to extract tensor: {}", e)))?;

        // Batch of one: the first row holds every class probability.
        let num_classes = shape.last().copied().unwrap_or(0).max(0) as usize;
        if num_classes == 0 || data.len() < num_classes {
            return Err(ClassifierError::Output(format!(
                "output shape {:?} holds no class scores",
                shape
            )));
        }

        Ok(data[..num_classes].to_vec())
    }
}
