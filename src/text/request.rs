//! Synthesis requests produced by a text front end

use serde::{Deserialize, Serialize};

use crate::error::{Result, TtsError};

/// Phoneme ids, parallel tone ids and an optional speaker id
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SynthesisRequest {
    /// Phoneme ids, in utterance order
    pub phone_ids: Vec<i32>,
    /// Tone ids, one per phoneme
    #[serde(default)]
    pub tone_ids: Vec<i32>,
    /// Speaker id for multi-speaker acoustic models
    #[serde(default)]
    pub speaker_id: Option<i32>,
}

impl SynthesisRequest {
    /// Create a request
    pub fn new(phone_ids: Vec<i32>, tone_ids: Vec<i32>, speaker_id: Option<i32>) -> Self {
        Self {
            phone_ids,
            tone_ids,
            speaker_id,
        }
    }

    /// Check the request invariants: at least one phoneme, and exactly one
    /// tone id per phoneme id
    pub fn validate(&self) -> Result<()> {
        if self.phone_ids.is_empty() {
            return Err(TtsError::config("request has no phoneme ids"));
        }
        if self.tone_ids.len() != self.phone_ids.len() {
            return Err(TtsError::config(format!(
                "request has {} phoneme ids but {} tone ids",
                self.phone_ids.len(),
                self.tone_ids.len()
            )));
        }
        Ok(())
    }

    /// Append another sentence's ids; the speaker id is kept
    pub fn extend(&mut self, other: &SynthesisRequest) {
        self.phone_ids.extend_from_slice(&other.phone_ids);
        self.tone_ids.extend_from_slice(&other.tone_ids);
    }
}

/// A text front end: normalized text in, phoneme and tone ids out
pub trait TextFrontend {
    /// Ids for one normalized sentence
    fn sentence_ids(&self, sentence: &str) -> anyhow::Result<(Vec<i32>, Vec<i32>)>;

    /// Ids for several sentences, concatenated into one request
    fn request(
        &self,
        sentences: &[&str],
        speaker_id: Option<i32>,
    ) -> anyhow::Result<SynthesisRequest> {
        let mut request = SynthesisRequest::new(Vec::new(), Vec::new(), speaker_id);
        for sentence in sentences {
            let (phone_ids, tone_ids) = self.sentence_ids(sentence)?;
            request.extend(&SynthesisRequest::new(phone_ids, tone_ids, None));
        }
        Ok(request)
    }
}

/// Parse a comma- or whitespace-separated id list, e.g. `"1, 2 3"`
pub fn parse_ids(s: &str) -> std::result::Result<Vec<i32>, String> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i32>().map_err(|e| format!("invalid id '{}': {}", part, e)))
        .collect()
}
