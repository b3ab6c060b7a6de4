//! Per-run timing and throughput metrics

use std::fmt;
use std::time::Duration;

/// Metrics of the last successful synthesis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SynthesisMetrics {
    /// Wall-clock time spanning both stage runs, in milliseconds
    pub inference_ms: f64,
    /// Encoded payload size in bytes, container header excluded
    pub encoded_bytes: usize,
    /// Number of encoded samples
    pub sample_count: usize,
    /// Sample rate the audio duration is derived from
    pub sample_rate: u32,
}

impl SynthesisMetrics {
    /// Stamp metrics for a finished run
    pub fn new(
        inference: Duration,
        encoded_bytes: usize,
        sample_count: usize,
        sample_rate: u32,
    ) -> Self {
        Self {
            inference_ms: inference.as_secs_f64() * 1000.0,
            encoded_bytes,
            sample_count,
            sample_rate,
        }
    }

    /// Audio duration in milliseconds: `1000 * samples / rate`
    pub fn audio_duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        1000.0 * self.sample_count as f64 / self.sample_rate as f64
    }

    /// Real-time factor: inference time over audio duration.
    ///
    /// NaN when there is no audio to divide by.
    pub fn real_time_factor(&self) -> f64 {
        let audio_ms = self.audio_duration_ms();
        if audio_ms == 0.0 {
            return f64::NAN;
        }
        self.inference_ms / audio_ms
    }
}

impl fmt::Display for SynthesisMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inference time: {:.2} ms, WAV size (without header): {} bytes, \
             WAV duration: {:.2} ms, RTF: {:.4}",
            self.inference_ms,
            self.encoded_bytes,
            self.audio_duration_ms(),
            self.real_time_factor()
        )
    }
}
