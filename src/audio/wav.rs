//! Canonical RIFF/WAVE container writing and read-back

use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};

use super::encoder::{EncodedAudio, SampleEncoding};
use crate::error::{Result, TtsError};

/// Size of the canonical header: RIFF + fmt (16-byte body) + data chunk headers
pub const WAV_HEADER_LEN: usize = 44;

/// Writes mono RIFF/WAVE files with a canonical 44-byte header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavWriter {
    sample_rate: u32,
    channels: u16,
}

impl WavWriter {
    /// Writer for mono audio at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: 1,
        }
    }

    /// Serialize header and payload into one buffer
    ///
    /// Fails with a Config error when the payload does not fit the 32-bit
    /// RIFF chunk sizes.
    pub fn to_bytes(&self, audio: &EncodedAudio) -> Result<Vec<u8>> {
        let data_size = chunk_size(audio.size_bytes())?;
        let mut buf = Vec::with_capacity(WAV_HEADER_LEN + audio.size_bytes());
        self.write_header(&mut buf, audio.encoding(), data_size)
            .map_err(|e| TtsError::config(format!("failed to serialize WAV header: {}", e)))?;
        buf.extend_from_slice(&audio.to_le_bytes());
        Ok(buf)
    }

    /// Write a WAV file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P, audio: &EncodedAudio) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes(audio)?;
        std::fs::write(path, bytes).map_err(|e| TtsError::io(path, e))
    }

    fn write_header<W: Write>(
        &self,
        mut w: W,
        encoding: SampleEncoding,
        data_size: u32,
    ) -> std::io::Result<()> {
        let bits = encoding.bits_per_sample();
        let block_align = self.channels * bits / 8;
        let byte_rate = self.sample_rate * block_align as u32;

        // RIFF
        w.write_all(b"RIFF")?;
        w.write_u32::<LittleEndian>(36 + data_size)?;
        w.write_all(b"WAVE")?;

        // fmt
        w.write_all(b"fmt ")?;
        w.write_u32::<LittleEndian>(16)?;
        w.write_u16::<LittleEndian>(encoding.format_code())?;
        w.write_u16::<LittleEndian>(self.channels)?;
        w.write_u32::<LittleEndian>(self.sample_rate)?;
        w.write_u32::<LittleEndian>(byte_rate)?;
        w.write_u16::<LittleEndian>(block_align)?;
        w.write_u16::<LittleEndian>(bits)?;

        // data
        w.write_all(b"data")?;
        w.write_u32::<LittleEndian>(data_size)
    }
}

/// Data chunk size for a payload; the RIFF size `36 + data` must fit in u32 too
fn chunk_size(payload_bytes: usize) -> Result<u32> {
    u32::try_from(payload_bytes)
        .ok()
        .filter(|&size| size <= u32::MAX - 36)
        .ok_or_else(|| {
            TtsError::config(format!(
                "{} bytes of audio do not fit in a RIFF/WAVE file",
                payload_bytes
            ))
        })
}

/// Header facts of a WAV file, as parsed back by `hound`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavInfo {
    /// Channel count
    pub channels: u16,
    /// Samples per second
    pub sample_rate: u32,
    /// Bits per sample
    pub bits_per_sample: u16,
    /// Whether samples are IEEE floats
    pub is_float: bool,
    /// Samples per channel
    pub frames: u32,
}

impl WavInfo {
    /// Read the header of the WAV file at `path`
    pub fn read<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let reader = hound::WavReader::open(path.as_ref())?;
        let spec = reader.spec();
        Ok(Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            is_float: spec.sample_format == hound::SampleFormat::Float,
            frames: reader.duration(),
        })
    }

    /// Duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 * 1000.0 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        let mut word = [0u8; 4];
        word.copy_from_slice(&bytes[offset..offset + 4]);
        u32::from_le_bytes(word)
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    #[test]
    fn test_pcm16_header_layout() {
        let audio = SampleEncoding::Pcm16.encode(&[0.0, 0.5, -0.5]);
        let bytes = WavWriter::new(24000).to_bytes(&audio).unwrap();

        assert_eq!(bytes.len(), WAV_HEADER_LEN + 6);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 36 + 6);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1);
        assert_eq!(u16_at(&bytes, 22), 1);
        assert_eq!(u32_at(&bytes, 24), 24000);
        assert_eq!(u32_at(&bytes, 28), 48000);
        assert_eq!(u16_at(&bytes, 32), 2);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 6);
        assert_eq!(&bytes[44..], &audio.to_le_bytes()[..]);
    }

    #[test]
    fn test_float_header_layout() {
        let audio = SampleEncoding::Float32.encode(&[0.25; 4]);
        let bytes = WavWriter::new(16000).to_bytes(&audio).unwrap();

        assert_eq!(u32_at(&bytes, 4), 36 + 16);
        assert_eq!(u16_at(&bytes, 20), 3);
        assert_eq!(u32_at(&bytes, 28), 64000);
        assert_eq!(u16_at(&bytes, 32), 4);
        assert_eq!(u16_at(&bytes, 34), 32);
        assert_eq!(u32_at(&bytes, 40), 16);
    }

    #[test]
    fn test_empty_payload() {
        let audio = SampleEncoding::Pcm16.encode(&[]);
        let bytes = WavWriter::new(22050).to_bytes(&audio).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&bytes, 4), 36);
        assert_eq!(u32_at(&bytes, 40), 0);
    }

    #[test]
    fn test_chunk_size_limits() {
        assert_eq!(chunk_size(6).unwrap(), 6);
        let largest = u32::MAX as usize - 36;
        assert_eq!(chunk_size(largest).unwrap(), u32::MAX - 36);
        assert!(matches!(chunk_size(largest + 1), Err(TtsError::Config { .. })));
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_chunk_size_rejects_4gib_payload() {
        // would wrap to a tiny size with a plain `as u32`
        let err = chunk_size((1usize << 32) + 6).unwrap_err();
        assert!(err.to_string().contains("do not fit"));
    }

    #[test]
    fn test_save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let audio = SampleEncoding::Pcm16.encode(&[0.1; 480]);
        WavWriter::new(24000).save(&path, &audio).unwrap();

        let info = WavInfo::read(&path).unwrap();
        assert_eq!(info.channels, 1);
        assert_eq!(info.sample_rate, 24000);
        assert_eq!(info.bits_per_sample, 16);
        assert!(!info.is_float);
        assert_eq!(info.frames, 480);
        assert!((info.duration_ms() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_save_to_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no/such/dir/out.wav");
        let audio = SampleEncoding::Pcm16.encode(&[0.0]);
        let err = WavWriter::new(24000).save(&path, &audio).unwrap_err();
        assert!(matches!(err, TtsError::Io { .. }));
    }
}
