//! Model stage runner: bind input slots, run, read outputs

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use super::backend::{ExecutionOptions, InferenceBackend, StageSession};
use super::tensor::{FloatTensor, Tensor};
use crate::error::{Result, Stage, TtsError};

/// Input/output slot counts a stage accepts from a loaded model
fn slot_requirements(stage: Stage) -> (usize, Option<usize>) {
    match stage {
        // phone ids, plus optional speaker id and any extras the export adds
        Stage::AcousticModel => (1, None),
        // the acoustic features are the vocoder's sole input
        Stage::Vocoder => (1, Some(1)),
    }
}

/// One loaded model and its per-run state
pub struct ModelStage {
    stage: Stage,
    session: Box<dyn StageSession>,
    inputs: BTreeMap<usize, Tensor>,
    outputs: Option<Vec<FloatTensor>>,
}

impl ModelStage {
    /// Load the model for `stage` and check its slot layout.
    ///
    /// Any failure here is a [`TtsError::ModelLoad`].
    pub fn initialize(
        stage: Stage,
        backend: &dyn InferenceBackend,
        model_path: &Path,
        options: &ExecutionOptions,
    ) -> Result<Self> {
        if model_path.as_os_str().is_empty() {
            return Err(TtsError::model_load(stage, model_path, "model path is empty"));
        }

        let session = backend
            .load(model_path, options)
            .map_err(|e| TtsError::model_load(stage, model_path, e))?;

        let (min_inputs, max_inputs) = slot_requirements(stage);
        let inputs = session.input_count();
        if inputs < min_inputs || max_inputs.is_some_and(|max| inputs > max) {
            return Err(TtsError::model_load(
                stage,
                model_path,
                format!(
                    "model declares {} inputs, {} expects {}",
                    inputs,
                    stage,
                    describe(min_inputs, max_inputs)
                ),
            ));
        }
        if session.output_count() == 0 {
            return Err(TtsError::model_load(stage, model_path, "model declares no outputs"));
        }

        info!(
            "Loaded {} from {:?} via {} ({} inputs, {} outputs, {} threads, {} mode)",
            stage,
            model_path,
            backend.name(),
            inputs,
            session.output_count(),
            options.threads,
            options.performance_mode
        );

        Ok(Self {
            stage,
            session,
            inputs: BTreeMap::new(),
            outputs: None,
        })
    }

    /// Bind a tensor to an input slot, replacing any earlier binding there
    pub fn bind(&mut self, slot: usize, tensor: Tensor) -> Result<()> {
        if slot >= self.session.input_count() {
            return Err(TtsError::config(format!(
                "{} has {} input slots, cannot bind slot {}",
                self.stage,
                self.session.input_count(),
                slot
            )));
        }
        debug!(
            "{} input {} bound: {} {:?}",
            self.stage,
            slot,
            tensor.element_type(),
            tensor.shape
        );
        self.inputs.insert(slot, tensor);
        Ok(())
    }

    /// Drop every pending binding
    pub fn clear_inputs(&mut self) {
        self.inputs.clear();
    }

    /// Run one forward pass over the bound inputs.
    ///
    /// Bindings are consumed by the call whether it succeeds or not.
    pub fn run(&mut self) -> Result<()> {
        self.outputs = None;
        let inputs = std::mem::take(&mut self.inputs);
        let slots: Vec<(usize, &Tensor)> =
            inputs.iter().map(|(slot, tensor)| (*slot, tensor)).collect();

        let outputs = self
            .session
            .run(&slots)
            .map_err(|e| TtsError::inference(self.stage, e))?;
        if outputs.is_empty() {
            return Err(TtsError::inference(self.stage, "model produced no outputs"));
        }

        for (slot, output) in outputs.iter().enumerate() {
            info!("{} output {} shape: {:?}", self.stage, slot, output.shape);
        }
        self.outputs = Some(outputs);
        Ok(())
    }

    /// Output tensor of the last successful run
    pub fn read_output(&self, slot: usize) -> Result<&FloatTensor> {
        self.outputs
            .as_ref()
            .ok_or_else(|| TtsError::inference(self.stage, "no output before a successful run"))?
            .get(slot)
            .ok_or_else(|| {
                TtsError::inference(self.stage, format!("output slot {} out of range", slot))
            })
    }

    /// Move an output tensor out of the runner, clearing the run's outputs
    pub fn take_output(&mut self, slot: usize) -> Result<FloatTensor> {
        let mut outputs = self
            .outputs
            .take()
            .ok_or_else(|| TtsError::inference(self.stage, "no output before a successful run"))?;
        if slot >= outputs.len() {
            return Err(TtsError::inference(
                self.stage,
                format!("output slot {} out of range", slot),
            ));
        }
        Ok(outputs.swap_remove(slot))
    }
}

fn describe(min: usize, max: Option<usize>) -> String {
    match max {
        Some(max) if max == min => format!("exactly {}", min),
        Some(max) => format!("{} to {}", min, max),
        None => format!("at least {}", min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tensor::TensorData;

    /// Session that echoes its slot 0 input as a float tensor
    struct EchoSession {
        inputs: usize,
        outputs: usize,
    }

    impl StageSession for EchoSession {
        fn input_count(&self) -> usize {
            self.inputs
        }

        fn output_count(&self) -> usize {
            self.outputs
        }

        fn run(
            &mut self,
            inputs: &[(usize, &Tensor)],
        ) -> std::result::Result<Vec<FloatTensor>, String> {
            let (_, first) = inputs.first().ok_or("slot 0 not bound")?;
            let data = match &first.data {
                TensorData::Int32(v) => v.iter().map(|&x| x as f32).collect(),
                TensorData::Int64(v) => v.iter().map(|&x| x as f32).collect(),
                TensorData::Float32(v) => v.clone(),
            };
            Ok(vec![FloatTensor::new(first.shape.clone(), data)])
        }
    }

    struct EchoBackend {
        inputs: usize,
        outputs: usize,
    }

    impl InferenceBackend for EchoBackend {
        fn load(
            &self,
            path: &Path,
            _options: &ExecutionOptions,
        ) -> std::result::Result<Box<dyn StageSession>, String> {
            if path.to_string_lossy().contains("missing") {
                return Err(format!("cannot open {:?}", path));
            }
            Ok(Box::new(EchoSession {
                inputs: self.inputs,
                outputs: self.outputs,
            }))
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    fn load(stage: Stage, inputs: usize, outputs: usize, path: &str) -> Result<ModelStage> {
        ModelStage::initialize(
            stage,
            &EchoBackend { inputs, outputs },
            Path::new(path),
            &ExecutionOptions::default(),
        )
    }

    #[test]
    fn test_run_and_take_output() {
        let mut runner = load(Stage::AcousticModel, 2, 1, "am.onnx").unwrap();
        runner.bind(0, Tensor::vector(TensorData::Int64(vec![1, 2, 3]))).unwrap();
        runner.run().unwrap();
        assert_eq!(runner.read_output(0).unwrap().data, vec![1.0, 2.0, 3.0]);
        assert!(runner.read_output(1).is_err());

        let output = runner.take_output(0).unwrap();
        assert_eq!(output.shape, vec![3]);
        // outputs are cleared once taken
        assert!(runner.read_output(0).is_err());
    }

    #[test]
    fn test_read_output_before_run_fails() {
        let runner = load(Stage::Vocoder, 1, 1, "voc.onnx").unwrap();
        let err = runner.read_output(0).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Vocoder));
    }

    #[test]
    fn test_bindings_do_not_survive_a_run() {
        let mut runner = load(Stage::AcousticModel, 1, 1, "am.onnx").unwrap();
        runner.bind(0, Tensor::vector(TensorData::Int32(vec![4]))).unwrap();
        runner.run().unwrap();
        let err = runner.run().unwrap_err();
        assert!(matches!(err, TtsError::Inference { stage: Stage::AcousticModel, .. }));
        assert!(runner.take_output(0).is_err());
    }

    #[test]
    fn test_rebinding_overwrites_slot() {
        let mut runner = load(Stage::AcousticModel, 1, 1, "am.onnx").unwrap();
        runner.bind(0, Tensor::vector(TensorData::Int32(vec![1]))).unwrap();
        runner.bind(0, Tensor::vector(TensorData::Int32(vec![7, 8]))).unwrap();
        runner.run().unwrap();
        assert_eq!(runner.take_output(0).unwrap().data, vec![7.0, 8.0]);
    }

    #[test]
    fn test_bind_out_of_range_slot() {
        let mut runner = load(Stage::AcousticModel, 1, 1, "am.onnx").unwrap();
        let err = runner.bind(3, Tensor::vector(TensorData::Int32(vec![1]))).unwrap_err();
        assert!(matches!(err, TtsError::Config { .. }));
    }

    #[test]
    fn test_vocoder_rejects_extra_inputs() {
        let err = load(Stage::Vocoder, 2, 1, "voc.onnx").err().unwrap();
        assert!(matches!(err, TtsError::ModelLoad { stage: Stage::Vocoder, .. }));
        assert!(err.to_string().contains("exactly 1"));
    }

    #[test]
    fn test_load_failures() {
        for (outputs, path) in [(1, ""), (1, "missing.onnx"), (0, "am.onnx")] {
            let result = load(Stage::AcousticModel, 1, outputs, path);
            assert!(matches!(result, Err(TtsError::ModelLoad { .. })), "{:?}", path);
        }
    }
}
