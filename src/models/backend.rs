//! Inference engine seam
//!
//! The engine itself (graph loading, kernels, hardware selection) lives
//! outside this crate. A backend loads one model file per stage and hands
//! back a [`StageSession`] that runs forward passes on positional slots.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::tensor::{FloatTensor, Tensor};

/// CPU scheduling hint passed to the engine
///
/// Mirrors the power modes of mobile inference runtimes. Backends map the
/// mode onto whatever knobs they have; a backend without such knobs may
/// ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PerformanceMode {
    /// Prefer big cores
    #[default]
    High,
    /// Prefer little cores
    Low,
    /// Use every core
    Full,
    /// Let the OS schedule threads
    NoBind,
    /// Big cores, randomly assigned
    RandHigh,
    /// Little cores, randomly assigned
    RandLow,
}

impl PerformanceMode {
    /// Canonical name
    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceMode::High => "high",
            PerformanceMode::Low => "low",
            PerformanceMode::Full => "full",
            PerformanceMode::NoBind => "no-bind",
            PerformanceMode::RandHigh => "rand-high",
            PerformanceMode::RandLow => "rand-low",
        }
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "high" => Ok(PerformanceMode::High),
            "low" => Ok(PerformanceMode::Low),
            "full" => Ok(PerformanceMode::Full),
            "no-bind" | "nobind" => Ok(PerformanceMode::NoBind),
            "rand-high" => Ok(PerformanceMode::RandHigh),
            "rand-low" => Ok(PerformanceMode::RandLow),
            other => Err(format!("unknown performance mode: {}", other)),
        }
    }
}

/// Execution options shared by both stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Engine worker threads
    pub threads: usize,
    /// Scheduling hint
    pub performance_mode: PerformanceMode,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            performance_mode: PerformanceMode::High,
        }
    }
}

/// A loaded model, ready to run
pub trait StageSession {
    /// Number of declared inputs
    fn input_count(&self) -> usize;

    /// Number of declared outputs
    fn output_count(&self) -> usize;

    /// Run one forward pass.
    ///
    /// `inputs` holds (slot, tensor) pairs sorted by slot. Returns every
    /// output of the model as a float tensor, in slot order.
    fn run(&mut self, inputs: &[(usize, &Tensor)]) -> Result<Vec<FloatTensor>, String>;
}

/// Loads model files into sessions
pub trait InferenceBackend {
    /// Load the model at `path` with the given execution options
    fn load(
        &self,
        path: &Path,
        options: &ExecutionOptions,
    ) -> Result<Box<dyn StageSession>, String>;

    /// Backend name for log lines
    fn name(&self) -> &'static str;
}
