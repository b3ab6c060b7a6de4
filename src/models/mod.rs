//! Model-facing layer
//!
//! - Typed tensors and the input binder
//! - The inference engine seam (backend + session traits)
//! - The per-stage runner used for both the acoustic model and the vocoder
//! - ONNX Runtime backend (feature `onnx`)

pub mod backend;
pub mod stage;
pub mod tensor;

#[cfg(feature = "onnx")]
pub mod onnx;

// Re-exports
pub use backend::{ExecutionOptions, InferenceBackend, PerformanceMode, StageSession};
pub use stage::ModelStage;
pub use tensor::{ElementType, FloatTensor, InputBinding, Tensor, TensorData};

#[cfg(feature = "onnx")]
pub use onnx::OnnxBackend;
