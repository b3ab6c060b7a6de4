//! Structured error handling for the synthesis core
//!
//! Every failure surfaces to the immediate caller as a [`TtsError`]. Only
//! [`TtsError::ModelLoad`] is unrecoverable for a pipeline instance; the
//! other kinds leave in-memory state intact so the caller can retry.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias with TtsError
pub type Result<T> = std::result::Result<T, TtsError>;

/// Main error type for the synthesis core
#[derive(Error, Debug)]
pub enum TtsError {
    /// Configuration errors (bad bit depth, element type, missing slot, wrong state)
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// An input binding names an element type outside {int32, int64, float32}
    #[error("Configuration error: unsupported element type '{tag}' for input slot {slot}")]
    UnsupportedType {
        /// The tag as given
        tag: String,
        /// Input slot the binding targeted
        slot: usize,
    },

    /// Model loading errors, fatal for the pipeline being constructed
    #[error("Model loading error in {stage}: {message} ({path:?})")]
    ModelLoad {
        /// Stage that failed
        stage: Stage,
        /// What went wrong
        message: String,
        /// Path involved
        path: PathBuf,
    },

    /// A forward pass failed in the named stage
    #[error("Inference error in {stage}: {message}")]
    Inference {
        /// Stage that failed
        stage: Stage,
        /// What went wrong
        message: String,
    },

    /// Container write failures
    #[error("I/O error writing {path:?}: {source}")]
    Io {
        /// Path involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl TtsError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create a model loading error
    pub fn model_load(stage: Stage, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            stage,
            message: message.into(),
            path: path.into(),
        }
    }

    /// Create an inference error
    pub fn inference(stage: Stage, message: impl Into<String>) -> Self {
        Self::Inference { stage, message: message.into() }
    }

    /// Create an I/O error for a destination path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Whether the pipeline stays usable after this error
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::ModelLoad { .. })
    }

    /// The stage that failed, if the error came from a model
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::ModelLoad { stage, .. } | Self::Inference { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Short name of the error kind, for log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } | Self::UnsupportedType { .. } => "configuration",
            Self::ModelLoad { .. } => "model load",
            Self::Inference { .. } => "inference",
            Self::Io { .. } => "io",
        }
    }
}

/// Pipeline stages that own a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Stage 1: phoneme/tone/speaker ids to acoustic features
    AcousticModel,
    /// Stage 2: acoustic features to waveform
    Vocoder,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::AcousticModel => write!(f, "acoustic model"),
            Stage::Vocoder => write!(f, "vocoder"),
        }
    }
}
