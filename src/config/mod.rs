//! Synthesis configuration matching the `tts-lite` YAML file
//!
//! ```yaml
//! acoustic_model: models/fastspeech2.onnx
//! vocoder: models/mb_melgan.onnx
//! phone_id_type: int64
//! speaker_id: 0
//! speaker_id_type: int64
//! output: output/tts.wav
//! bit_depth: 16
//! sample_rate: 24000
//! threads: 1
//! performance_mode: high
//! normalize_peak: false
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::audio::SampleEncoding;
use crate::inference::PipelineConfig;
use crate::models::{ElementType, PerformanceMode};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Acoustic model file
    pub acoustic_model: PathBuf,

    /// Vocoder model file
    pub vocoder: PathBuf,

    /// Element type of acoustic model input 0: int32, int64 or float32
    pub phone_id_type: String,

    /// Speaker id; leave unset for single-speaker models
    pub speaker_id: Option<i32>,

    /// Element type of acoustic model input 1
    pub speaker_id_type: String,

    /// Output WAV path
    pub output: PathBuf,

    /// WAV bit depth: 16 (PCM) or 32 (IEEE float)
    pub bit_depth: u16,

    /// WAV sample rate; must match the vocoder output
    pub sample_rate: u32,

    /// Engine worker threads
    pub threads: usize,

    /// CPU scheduling hint
    pub performance_mode: PerformanceMode,

    /// Scale 16-bit output to the waveform peak
    pub normalize_peak: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            acoustic_model: PathBuf::from(crate::DEFAULT_ACOUSTIC_MODEL),
            vocoder: PathBuf::from(crate::DEFAULT_VOCODER),
            phone_id_type: ElementType::Int64.to_string(),
            speaker_id: None,
            speaker_id_type: ElementType::Int64.to_string(),
            output: PathBuf::from("output/tts.wav"),
            bit_depth: 16,
            sample_rate: crate::DEFAULT_SAMPLE_RATE,
            threads: 1,
            performance_mode: PerformanceMode::High,
            normalize_peak: false,
        }
    }
}

impl SynthesisConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).with_context(|| "Failed to parse config YAML")
    }

    /// Check values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        self.encoding()?;
        if self.sample_rate == 0 {
            anyhow::bail!("sample_rate must be greater than zero");
        }
        Ok(())
    }

    /// Sample encoding for the configured bit depth
    pub fn encoding(&self) -> Result<SampleEncoding> {
        Ok(SampleEncoding::from_bit_depth(self.bit_depth)?)
    }

    /// The part of the configuration `SynthesisPipeline::initialize` takes
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            acoustic_model: self.acoustic_model.clone(),
            vocoder: self.vocoder.clone(),
            performance_mode: self.performance_mode,
            threads: self.threads,
            sample_rate: self.sample_rate,
        }
    }
}
