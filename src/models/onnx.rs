//! ONNX Runtime backend
//!
//! The runtime library is loaded dynamically (`ORT_DYLIB_PATH`), so building
//! the crate does not download or link onnxruntime.

use std::borrow::Cow;
use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionInputValue, SessionInputs};
use ort::value::{DynValue, Tensor as OrtTensor};
use tracing::debug;

use super::backend::{ExecutionOptions, InferenceBackend, PerformanceMode, StageSession};
use super::tensor::{FloatTensor, Tensor, TensorData};

/// Backend that runs `.onnx` models through ONNX Runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxBackend;

impl InferenceBackend for OnnxBackend {
    fn load(
        &self,
        path: &Path,
        options: &ExecutionOptions,
    ) -> Result<Box<dyn StageSession>, String> {
        let session = OnnxSession::open(path, options).map_err(|e| e.to_string())?;
        Ok(Box::new(session))
    }

    fn name(&self) -> &'static str {
        "onnxruntime"
    }
}

/// One ONNX Runtime session with its slot names
pub struct OnnxSession {
    session: Session,
    input_names: Vec<String>,
    output_names: Vec<String>,
}

impl OnnxSession {
    /// Build a session for the model at `path`
    pub fn open(path: &Path, options: &ExecutionOptions) -> ort::Result<Self> {
        let (level, parallel) = session_tuning(options.performance_mode);

        let session = Session::builder()?
            .with_optimization_level(level)?
            .with_intra_threads(options.threads.max(1))?
            .with_parallel_execution(parallel)?
            .commit_from_file(path)?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        debug!("ONNX inputs {:?}, outputs {:?}", input_names, output_names);

        Ok(Self {
            session,
            input_names,
            output_names,
        })
    }
}

/// Graph optimization level and inter-op parallelism for a performance mode
fn session_tuning(mode: PerformanceMode) -> (GraphOptimizationLevel, bool) {
    match mode {
        PerformanceMode::Low | PerformanceMode::RandLow => (GraphOptimizationLevel::Level1, false),
        PerformanceMode::Full => (GraphOptimizationLevel::Level3, true),
        PerformanceMode::High | PerformanceMode::NoBind | PerformanceMode::RandHigh => {
            (GraphOptimizationLevel::Level3, false)
        }
    }
}

fn to_value(tensor: &Tensor) -> ort::Result<DynValue> {
    let shape = tensor.shape.clone();
    Ok(match &tensor.data {
        TensorData::Int32(v) => OrtTensor::from_array((shape, v.clone()))?.into_dyn(),
        TensorData::Int64(v) => OrtTensor::from_array((shape, v.clone()))?.into_dyn(),
        TensorData::Float32(v) => OrtTensor::from_array((shape, v.clone()))?.into_dyn(),
    })
}

impl StageSession for OnnxSession {
    fn input_count(&self) -> usize {
        self.input_names.len()
    }

    fn output_count(&self) -> usize {
        self.output_names.len()
    }

    fn run(&mut self, inputs: &[(usize, &Tensor)]) -> Result<Vec<FloatTensor>, String> {
        let mut values: Vec<(Cow<'_, str>, SessionInputValue<'_>)> =
            Vec::with_capacity(inputs.len());
        for &(slot, tensor) in inputs {
            let name = self.input_names.get(slot).ok_or_else(|| {
                format!(
                    "input slot {} out of range ({} inputs)",
                    slot,
                    self.input_names.len()
                )
            })?;
            let value = to_value(tensor).map_err(|e| format!("input slot {}: {}", slot, e))?;
            values.push((Cow::Owned(name.clone()), SessionInputValue::Owned(value)));
        }

        let outputs = self
            .session
            .run(SessionInputs::from(values))
            .map_err(|e| e.to_string())?;

        let mut tensors = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let (shape, data) = outputs[name.as_str()]
                .try_extract_tensor::<f32>()
                .map_err(|e| format!("output '{}': {}", name, e))?;
            let shape: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
            tensors.push(FloatTensor::new(shape, data.to_vec()));
        }
        Ok(tensors)
    }
}
