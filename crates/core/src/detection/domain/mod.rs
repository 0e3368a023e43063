pub mod inference_backend;
