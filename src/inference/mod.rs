//! Inference module for phoneme-id to waveform synthesis
//!
//! - SynthesisPipeline: acoustic model + vocoder state machine
//! - PipelineConfig: model paths and execution parameters
//! - SynthesisMetrics: timing and real-time factor of a run

mod metrics;
mod pipeline;

pub use metrics::SynthesisMetrics;
pub use pipeline::{
    PipelineConfig, PipelineState, SynthesisPipeline, PHONE_ID_SLOT, SPEAKER_ID_SLOT,
};
