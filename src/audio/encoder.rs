//! Float waveform to PCM sample encoding

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, TtsError};

/// Floor for the peak used by [`SampleEncoding::Pcm16`] peak normalization
const MIN_PEAK: f32 = 0.01;

/// Target sample representation, fixed for the lifetime of a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleEncoding {
    /// 16-bit signed integer PCM (WAV format code 1)
    Pcm16,
    /// 32-bit IEEE float PCM (WAV format code 3)
    Float32,
}

impl SampleEncoding {
    /// Pick the encoding for a WAV bit depth (16 or 32)
    pub fn from_bit_depth(bits: u16) -> Result<Self> {
        match bits {
            16 => Ok(SampleEncoding::Pcm16),
            32 => Ok(SampleEncoding::Float32),
            other => Err(TtsError::config(format!(
                "unsupported WAV bit depth: {} (expected 16 or 32)",
                other
            ))),
        }
    }

    /// Bits per sample
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            SampleEncoding::Pcm16 => 16,
            SampleEncoding::Float32 => 32,
        }
    }

    /// Bytes per sample
    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample() as usize / 8
    }

    /// WAV `fmt ` chunk format code
    pub fn format_code(&self) -> u16 {
        match self {
            SampleEncoding::Pcm16 => 1,
            SampleEncoding::Float32 => 3,
        }
    }

    /// Encode a waveform.
    ///
    /// Pcm16 scales positive samples by 32767 and negative ones by 32768,
    /// rounds, and clamps, so the nominal [-1.0, 1.0] range maps onto the
    /// full i16 range and louder samples saturate. Float32 copies samples
    /// unchanged.
    pub fn encode(&self, waveform: &[f32]) -> EncodedAudio {
        match self {
            SampleEncoding::Pcm16 => {
                EncodedAudio::Pcm16(waveform.iter().map(|&s| pcm16(s)).collect())
            }
            SampleEncoding::Float32 => EncodedAudio::Float32(waveform.to_vec()),
        }
    }

    /// Encode after scaling the waveform so its peak sits at full scale.
    ///
    /// Peaks below 0.01 are treated as 0.01 so near-silence is not blown up
    /// into noise. Each sample becomes `s * 32767 / peak` truncated toward
    /// zero, the conversion embedded 16-bit TTS front ends use; unlike
    /// [`encode`](Self::encode) this path does not round and never reaches
    /// -32768. Float32 output is never rescaled.
    pub fn encode_normalized(&self, waveform: &[f32]) -> EncodedAudio {
        match self {
            SampleEncoding::Pcm16 => {
                let peak = waveform
                    .iter()
                    .map(|s| s.abs())
                    .filter(|s| !s.is_nan())
                    .fold(MIN_PEAK, f32::max);
                // `as` truncates toward zero, saturates and maps NaN to 0
                EncodedAudio::Pcm16(waveform.iter().map(|&s| (s * 32767.0 / peak) as i16).collect())
            }
            SampleEncoding::Float32 => self.encode(waveform),
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleEncoding::Pcm16 => write!(f, "16-bit PCM"),
            SampleEncoding::Float32 => write!(f, "32-bit IEEE float"),
        }
    }
}

impl FromStr for SampleEncoding {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        let bits = s
            .trim()
            .parse::<u16>()
            .map_err(|_| TtsError::config(format!("unsupported WAV bit depth: {}", s)))?;
        Self::from_bit_depth(bits)
    }
}

fn pcm16(sample: f32) -> i16 {
    let scaled = if sample < 0.0 { sample * 32768.0 } else { sample * 32767.0 };
    // `as` saturates and maps NaN to 0
    scaled.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Encoded samples, immutable once produced
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedAudio {
    /// 16-bit PCM samples
    Pcm16(Vec<i16>),
    /// 32-bit float samples
    Float32(Vec<f32>),
}

impl EncodedAudio {
    /// Encoding of the samples
    pub fn encoding(&self) -> SampleEncoding {
        match self {
            EncodedAudio::Pcm16(_) => SampleEncoding::Pcm16,
            EncodedAudio::Float32(_) => SampleEncoding::Float32,
        }
    }

    /// Number of samples
    pub fn sample_count(&self) -> usize {
        match self {
            EncodedAudio::Pcm16(s) => s.len(),
            EncodedAudio::Float32(s) => s.len(),
        }
    }

    /// Payload size in bytes, container header excluded
    pub fn size_bytes(&self) -> usize {
        self.sample_count() * self.encoding().bytes_per_sample()
    }

    /// Whether there are no samples
    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }

    /// Little-endian payload bytes
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size_bytes());
        match self {
            EncodedAudio::Pcm16(samples) => {
                for s in samples {
                    bytes.extend_from_slice(&s.to_le_bytes());
                }
            }
            EncodedAudio::Float32(samples) => {
                for s in samples {
                    bytes.extend_from_slice(&s.to_le_bytes());
                }
            }
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_full_scale() {
        let encoded = SampleEncoding::Pcm16.encode(&[1.0, -1.0, 0.0]);
        assert_eq!(encoded, EncodedAudio::Pcm16(vec![32767, -32768, 0]));
    }

    #[test]
    fn test_pcm16_rounds_to_nearest() {
        // 0.5 * 32767 = 16383.5
        let encoded = SampleEncoding::Pcm16.encode(&[0.5, -0.5, 0.25]);
        assert_eq!(encoded, EncodedAudio::Pcm16(vec![16384, -16384, 8192]));
    }

    #[test]
    fn test_pcm16_clamps_out_of_range() {
        let encoded = SampleEncoding::Pcm16.encode(&[1.5, -3.0, f32::INFINITY, f32::NAN]);
        assert_eq!(encoded, EncodedAudio::Pcm16(vec![32767, -32768, 32767, 0]));
    }

    #[test]
    fn test_float32_is_identity() {
        let input = [0.123_456_79_f32, -1.5, f32::MIN_POSITIVE, -0.0];
        match SampleEncoding::Float32.encode(&input) {
            EncodedAudio::Float32(out) => {
                let bits_in: Vec<u32> = input.iter().map(|s| s.to_bits()).collect();
                let bits_out: Vec<u32> = out.iter().map(|s| s.to_bits()).collect();
                assert_eq!(bits_in, bits_out);
            }
            other => panic!("unexpected encoding: {:?}", other),
        }
    }

    #[test]
    fn test_normalized_pcm16_scales_to_peak() {
        let encoded = SampleEncoding::Pcm16.encode_normalized(&[0.25, -0.5, 0.0]);
        assert_eq!(encoded, EncodedAudio::Pcm16(vec![16383, -32767, 0]));
    }

    #[test]
    fn test_normalized_pcm16_truncates() {
        // 16383.5 and -16383.5: `encode` rounds away from zero, normalization truncates
        let waveform = [0.5, -0.5, 1.0];
        assert_eq!(
            SampleEncoding::Pcm16.encode(&waveform),
            EncodedAudio::Pcm16(vec![16384, -16384, 32767])
        );
        assert_eq!(
            SampleEncoding::Pcm16.encode_normalized(&waveform),
            EncodedAudio::Pcm16(vec![16383, -16383, 32767])
        );
    }

    #[test]
    fn test_normalized_pcm16_floors_quiet_peak() {
        // peak 0.001 is floored at 0.01, so 0.001 maps to a tenth of full scale
        let encoded = SampleEncoding::Pcm16.encode_normalized(&[0.001]);
        assert_eq!(encoded, EncodedAudio::Pcm16(vec![3276]));
    }

    #[test]
    fn test_sizes() {
        let pcm = SampleEncoding::Pcm16.encode(&[0.0; 10]);
        assert_eq!(pcm.sample_count(), 10);
        assert_eq!(pcm.size_bytes(), 20);
        assert_eq!(pcm.to_le_bytes().len(), 20);

        let float = SampleEncoding::Float32.encode(&[0.0; 10]);
        assert_eq!(float.size_bytes(), 40);
    }

    #[test]
    fn test_le_bytes() {
        let bytes = EncodedAudio::Pcm16(vec![1, -2]).to_le_bytes();
        assert_eq!(bytes, vec![0x01, 0x00, 0xFE, 0xFF]);
        let bytes = EncodedAudio::Float32(vec![1.0]).to_le_bytes();
        assert_eq!(bytes, 1.0f32.to_le_bytes().to_vec());
    }

    #[test]
    fn test_bit_depths() {
        assert_eq!(SampleEncoding::from_bit_depth(16).unwrap(), SampleEncoding::Pcm16);
        assert_eq!("32".parse::<SampleEncoding>().unwrap(), SampleEncoding::Float32);
        assert!(SampleEncoding::from_bit_depth(24).is_err());
        assert!("eight".parse::<SampleEncoding>().is_err());
        assert_eq!(SampleEncoding::Float32.format_code(), 3);
    }
}
