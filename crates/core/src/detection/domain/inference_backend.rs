use ndarray::Array4;

/// Domain interface for the opaque inference engine.
///
/// Loading happens exactly once, in the implementation's constructor,
/// before the backend is handed to a session. `infer` takes the
/// `[1, 3, S, S]` input tensor and returns the model's flat raw output
/// (logical shape `[1, 4+C, N]`); interpreting that buffer is the
/// decoder's job. `&mut self` because engine sessions are stateful.
pub trait InferenceBackend: Send {
    fn infer(&mut self, input: Array4<f32>) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
