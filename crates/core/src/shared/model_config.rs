use thiserror::Error;

/// Default confidence threshold for keeping a candidate detection.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Fallback model input resolution when nothing better is known.
pub const DEFAULT_INPUT_SIZE: u32 = 640;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelConfigError {
    #[error("model input size must be positive")]
    ZeroInputSize,
    #[error("candidate count must be positive")]
    ZeroCandidates,
    #[error("class count must be positive")]
    ZeroClasses,
}

/// Shape constants and class-name table for one specific detection model.
///
/// The decoder layout (`[1, 4+C, N]`) only makes sense for the exact
/// `N`/`C` the model was exported with, so these are configuration, never
/// literals in decode logic. A mismatch shows up as a malformed-output
/// error instead of silently garbled boxes. Construction rejects zero
/// dimensions; downstream index arithmetic relies on them being positive.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Model input side length `S` (the input tensor is `[1, 3, S, S]`).
    pub input_size: u32,
    /// Candidates `N` the model emits per frame.
    pub num_candidates: usize,
    /// Class count `C`.
    pub num_classes: usize,
    class_names: Vec<String>,
}

impl ModelConfig {
    pub fn new(
        input_size: u32,
        num_candidates: usize,
        num_classes: usize,
        class_names: Vec<String>,
    ) -> Result<Self, ModelConfigError> {
        if input_size == 0 {
            return Err(ModelConfigError::ZeroInputSize);
        }
        if num_candidates == 0 {
            return Err(ModelConfigError::ZeroCandidates);
        }
        if num_classes == 0 {
            return Err(ModelConfigError::ZeroClasses);
        }
        Ok(Self {
            input_size,
            num_candidates,
            num_classes,
            class_names,
        })
    }

    /// Total element count of a well-formed raw output: `(4 + C) * N`.
    pub fn raw_output_len(&self) -> usize {
        (4 + self.num_classes) * self.num_candidates
    }

    /// Class name for `id`, synthesizing `"Class {id}"` when the table is
    /// shorter than the configured class count.
    pub fn class_name(&self, id: usize) -> String {
        self.class_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| format!("Class {id}"))
    }

    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }
}
