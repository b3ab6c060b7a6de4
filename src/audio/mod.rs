//! Audio output
//!
//! - Sample encoding (16-bit PCM, 32-bit IEEE float)
//! - RIFF/WAVE container writing and header read-back

mod encoder;
mod wav;

pub use encoder::{EncodedAudio, SampleEncoding};
pub use wav::{WavInfo, WavWriter, WAV_HEADER_LEN};
