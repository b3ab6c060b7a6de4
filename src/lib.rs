//! # tts-lite
//!
//! Phoneme ids in, WAV file out. A text front end produces phoneme, tone
//! and speaker ids; this crate binds them to an acoustic model, feeds the
//! acoustic features to a vocoder, encodes the waveform as 16-bit PCM or
//! 32-bit float, and writes a RIFF/WAVE file while tracking inference time
//! and real-time factor.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tts_lite::{PipelineConfig, SampleEncoding, SynthesisPipeline};
//!
//! let mut pipeline = SynthesisPipeline::new(SampleEncoding::Pcm16);
//! pipeline.initialize(&PipelineConfig::default())?;
//! pipeline.bind_input(0, "int64", &[1, 2, 3]);
//! pipeline.synthesize()?;
//! println!("RTF: {}", pipeline.real_time_factor());
//! pipeline.write_wav("output.wav")?;
//! ```

#![warn(missing_docs)]
#![allow(rustdoc::missing_crate_level_docs)]

pub mod audio;
pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod text;

// Re-exports for convenience
pub use audio::{EncodedAudio, SampleEncoding, WavInfo, WavWriter, WAV_HEADER_LEN};
pub use config::SynthesisConfig;
pub use error::{Result, Stage, TtsError};
pub use inference::{PipelineConfig, PipelineState, SynthesisMetrics, SynthesisPipeline};
pub use models::{ElementType, InferenceBackend, PerformanceMode, StageSession};
pub use text::{SynthesisRequest, TextFrontend};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default output sample rate (24000 Hz)
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Default acoustic model path
pub const DEFAULT_ACOUSTIC_MODEL: &str = "models/fastspeech2.onnx";

/// Default vocoder path
pub const DEFAULT_VOCODER: &str = "models/mb_melgan.onnx";
