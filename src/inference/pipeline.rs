//! Two-stage synthesis pipeline
//!
//! Orchestrates one synthesis run:
//! 1. Resolve the typed input bindings for the acoustic model
//! 2. Run the acoustic model, hand its first output to the vocoder
//! 3. Run the vocoder and read the waveform
//! 4. Encode the waveform and stamp metrics
//!
//! The pipeline is an explicit state machine (see [`PipelineState`]). A
//! failed run leaves it in [`PipelineState::InputsBound`] with the bindings
//! intact, so the caller can fix them and try again without reloading the
//! models.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::audio::{EncodedAudio, SampleEncoding, WavWriter};
use crate::error::{Result, Stage, TtsError};
use crate::inference::metrics::SynthesisMetrics;
use crate::models::{
    ExecutionOptions, InferenceBackend, InputBinding, ModelStage, PerformanceMode, Tensor,
};
use crate::text::SynthesisRequest;

/// Acoustic model input slot carrying the phoneme ids
pub const PHONE_ID_SLOT: usize = 0;
/// Acoustic model input slot carrying the speaker id
pub const SPEAKER_ID_SLOT: usize = 1;

/// Lifecycle of a [`SynthesisPipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Models not loaded yet
    Uninitialized,
    /// Both models loaded, nothing bound
    Initialized,
    /// At least one input bound for the next run
    InputsBound,
    /// Last run succeeded, encoded audio available
    Synthesized,
    /// Encoded audio written to disk at least once
    WavWritten,
}

/// Everything `initialize` needs
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Acoustic model file
    pub acoustic_model: PathBuf,
    /// Vocoder model file
    pub vocoder: PathBuf,
    /// CPU scheduling hint
    pub performance_mode: PerformanceMode,
    /// Engine worker threads
    pub threads: usize,
    /// Output sample rate; must match what the vocoder produces
    pub sample_rate: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            acoustic_model: PathBuf::from(crate::DEFAULT_ACOUSTIC_MODEL),
            vocoder: PathBuf::from(crate::DEFAULT_VOCODER),
            performance_mode: PerformanceMode::High,
            threads: 1,
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
        }
    }
}

impl PipelineConfig {
    /// Execution options shared by both stages
    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            threads: self.threads.max(1),
            performance_mode: self.performance_mode,
        }
    }
}

/// Acoustic model + vocoder pipeline producing encoded audio
///
/// One run at a time: every mutating call takes `&mut self`. Use one
/// pipeline per concurrent caller.
pub struct SynthesisPipeline {
    backend: Box<dyn InferenceBackend>,
    encoding: SampleEncoding,
    normalize_peak: bool,
    state: PipelineState,
    sample_rate: u32,
    acoustic: Option<ModelStage>,
    vocoder: Option<ModelStage>,
    bindings: BTreeMap<usize, InputBinding>,
    audio: Option<EncodedAudio>,
    metrics: Option<SynthesisMetrics>,
}

impl SynthesisPipeline {
    /// Pipeline backed by ONNX Runtime
    #[cfg(feature = "onnx")]
    pub fn new(encoding: SampleEncoding) -> Self {
        Self::with_backend(encoding, Box::new(crate::models::OnnxBackend))
    }

    /// Pipeline backed by a custom inference engine
    pub fn with_backend(encoding: SampleEncoding, backend: Box<dyn InferenceBackend>) -> Self {
        Self {
            backend,
            encoding,
            normalize_peak: false,
            state: PipelineState::Uninitialized,
            sample_rate: 0,
            acoustic: None,
            vocoder: None,
            bindings: BTreeMap::new(),
            audio: None,
            metrics: None,
        }
    }

    /// Scale 16-bit output so the waveform peak hits full scale
    pub fn with_peak_normalization(mut self, enabled: bool) -> Self {
        self.normalize_peak = enabled;
        self
    }

    /// Load both models. Failure leaves the pipeline uninitialized and
    /// should abort the caller.
    pub fn initialize(&mut self, config: &PipelineConfig) -> Result<()> {
        if self.state != PipelineState::Uninitialized {
            return Err(TtsError::config("pipeline is already initialized"));
        }
        if config.sample_rate == 0 {
            return Err(TtsError::config("sample rate must be greater than zero"));
        }

        let options = config.execution_options();
        let backend = self.backend.as_ref();
        let acoustic = ModelStage::initialize(
            Stage::AcousticModel,
            backend,
            &config.acoustic_model,
            &options,
        )?;
        let vocoder = ModelStage::initialize(Stage::Vocoder, backend, &config.vocoder, &options)?;

        self.acoustic = Some(acoustic);
        self.vocoder = Some(vocoder);
        self.sample_rate = config.sample_rate;
        self.state = if self.bindings.is_empty() {
            PipelineState::Initialized
        } else {
            PipelineState::InputsBound
        };
        info!(
            "Pipeline initialized: {} Hz, {}, {} threads",
            self.sample_rate, self.encoding, options.threads
        );
        Ok(())
    }

    /// Bind ids to an acoustic model input slot.
    ///
    /// `tag` names the element type the model declares for the slot
    /// (`int32`, `int64` or `float32`). Nothing is checked here: a bad tag
    /// or slot fails the next [`synthesize`](Self::synthesize).
    pub fn bind_input(&mut self, slot: usize, tag: &str, values: &[i32]) {
        self.bindings.insert(slot, InputBinding::new(slot, tag, values.to_vec()));
        if self.state != PipelineState::Uninitialized {
            self.state = PipelineState::InputsBound;
        }
    }

    /// Bind a front-end request: phone ids to slot 0, and the speaker id
    /// to slot 1 when the request carries one.
    ///
    /// Tone ids are validated but not bound; the acoustic models this
    /// pipeline drives take only phone and speaker ids.
    pub fn bind_request(
        &mut self,
        request: &SynthesisRequest,
        phone_tag: &str,
        speaker_tag: &str,
    ) -> Result<()> {
        request.validate()?;
        self.bind_input(PHONE_ID_SLOT, phone_tag, &request.phone_ids);
        if let Some(speaker) = request.speaker_id {
            self.bind_input(SPEAKER_ID_SLOT, speaker_tag, &[speaker]);
        }
        Ok(())
    }

    /// Run both stages over the bound inputs and encode the result
    pub fn synthesize(&mut self) -> Result<()> {
        match self.state {
            PipelineState::Uninitialized => {
                return Err(TtsError::config("pipeline is not initialized"));
            }
            PipelineState::Initialized | PipelineState::Synthesized | PipelineState::WavWritten => {
                return Err(TtsError::config(format!(
                    "no inputs bound: slot {} (phone ids) is required",
                    PHONE_ID_SLOT
                )));
            }
            PipelineState::InputsBound => {}
        }

        // Resolve every binding before any stage runs
        if !self.bindings.contains_key(&PHONE_ID_SLOT) {
            return Err(TtsError::config(format!(
                "required input slot {} (phone ids) is not bound",
                PHONE_ID_SLOT
            )));
        }
        let inputs = self
            .bindings
            .values()
            .map(|binding| binding.resolve().map(|tensor| (binding.slot, tensor)))
            .collect::<Result<Vec<(usize, Tensor)>>>()?;

        let (acoustic, vocoder) = match (self.acoustic.as_mut(), self.vocoder.as_mut()) {
            (Some(a), Some(v)) => (a, v),
            _ => return Err(TtsError::config("pipeline is not initialized")),
        };

        let start = Instant::now();
        if let Err(e) = Self::run_stages(acoustic, vocoder, inputs) {
            warn!("Synthesis failed, inputs kept for retry: {}", e);
            return Err(e);
        }
        let elapsed = start.elapsed();

        let waveform = &vocoder.read_output(0)?.data;
        let audio = if self.normalize_peak {
            self.encoding.encode_normalized(waveform)
        } else {
            self.encoding.encode(waveform)
        };
        let metrics = SynthesisMetrics::new(
            elapsed,
            audio.size_bytes(),
            audio.sample_count(),
            self.sample_rate,
        );
        info!("{}", metrics);

        self.audio = Some(audio);
        self.metrics = Some(metrics);
        self.bindings.clear();
        self.state = PipelineState::Synthesized;
        Ok(())
    }

    fn run_stages(
        acoustic: &mut ModelStage,
        vocoder: &mut ModelStage,
        inputs: Vec<(usize, Tensor)>,
    ) -> Result<()> {
        acoustic.clear_inputs();
        for (slot, tensor) in inputs {
            acoustic.bind(slot, tensor)?;
        }
        acoustic.run()?;
        let features = acoustic.take_output(0)?;
        debug!("Acoustic features: {} values {:?}", features.len(), features.shape);

        vocoder.clear_inputs();
        vocoder.bind(0, features.into_input())?;
        vocoder.run()
    }

    /// Write the encoded audio as a WAV file. May be retried after an
    /// I/O failure; the encoded audio is left untouched.
    pub fn write_wav<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        if !matches!(self.state, PipelineState::Synthesized | PipelineState::WavWritten) {
            return Err(TtsError::config(format!(
                "nothing to write: pipeline is {:?}, not synthesized",
                self.state
            )));
        }
        let audio = self
            .audio
            .as_ref()
            .ok_or_else(|| TtsError::config("no encoded audio available"))?;

        WavWriter::new(self.sample_rate).save(path.as_ref(), audio)?;
        info!("Wrote {} ({} bytes of audio)", path.as_ref().display(), audio.size_bytes());
        self.state = PipelineState::WavWritten;
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Output sample encoding
    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    /// Configured sample rate (0 before initialization)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Encoded audio of the last successful run
    pub fn audio(&self) -> Option<&EncodedAudio> {
        self.audio.as_ref()
    }

    /// Inference time of the last run in ms (0 before any run)
    pub fn inference_duration_ms(&self) -> f64 {
        self.metrics.map_or(0.0, |m| m.inference_ms)
    }

    /// Encoded payload size in bytes (0 before any run)
    pub fn encoded_size_bytes(&self) -> usize {
        self.metrics.map_or(0, |m| m.encoded_bytes)
    }

    /// Duration of the encoded audio in ms (0 before any run)
    pub fn audio_duration_ms(&self) -> f64 {
        self.metrics.map_or(0.0, |m| m.audio_duration_ms())
    }

    /// Real-time factor of the last run (NaN before any run or for empty audio)
    pub fn real_time_factor(&self) -> f64 {
        self.metrics.map_or(f64::NAN, |m| m.real_time_factor())
    }
}
