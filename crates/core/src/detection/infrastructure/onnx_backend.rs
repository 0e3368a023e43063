use std::path::Path;

use ndarray::Array4;
use thiserror::Error;

use crate::detection::domain::inference_backend::InferenceBackend;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("inference session error: {0}")]
    Session(#[from] ort::Error),
    #[error("model expects {model}x{model} input but {configured}x{configured} is configured")]
    InputSizeMismatch { model: u32, configured: u32 },
    #[error("model produced no outputs")]
    NoOutputs,
}

/// ONNX Runtime inference backend via `ort`.
///
/// Construction is the one-time load step: it builds the session, probes
/// the model's NCHW input shape, and rejects a static shape that
/// disagrees with the configured input size — catching the shape
/// mismatch at load time instead of as garbled detections later.
pub struct OnnxBackend {
    session: ort::session::Session,
}

impl OnnxBackend {
    pub fn load(model_path: &Path, input_size: u32) -> Result<Self, BackendError> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        // Input shape is [N, C, H, W]; H <= 0 means dynamic, nothing to check
        let model_size = session.inputs().first().and_then(|input| {
            if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                if shape.len() >= 4 && shape[2] > 0 {
                    Some(shape[2] as u32)
                } else {
                    None
                }
            } else {
                None
            }
        });

        if let Some(model) = model_size {
            if model != input_size {
                return Err(BackendError::InputSizeMismatch {
                    model,
                    configured: input_size,
                });
            }
        }

        Ok(Self { session })
    }
}

impl InferenceBackend for OnnxBackend {
    fn infer(&mut self, input: Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let value = ort::value::Tensor::from_array(input).map_err(BackendError::Session)?;
        let outputs = self
            .session
            .run(ort::inputs![value])
            .map_err(BackendError::Session)?;
        if outputs.len() == 0 {
            return Err(BackendError::NoOutputs.into());
        }

        let tensor = outputs[0]
            .try_extract_array::<f32>()
            .map_err(BackendError::Session)?;
        Ok(tensor.iter().copied().collect())
    }
}
