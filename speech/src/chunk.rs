//! Synthesizer output items.

use narrator_audio::Samples;

/// One unit of synthesized audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// The samples, or `None` when the synthesizer emitted no payload.
    pub samples: Option<Samples>,
    /// Sample rate in Hz; 0 means unknown.
    pub sampling_rate: u32,
}

impl AudioChunk {
    /// Creates a chunk carrying samples.
    pub fn new(samples: Samples, sampling_rate: u32) -> Self {
        Self {
            samples: Some(samples),
            sampling_rate,
        }
    }

    /// Creates a chunk without a payload.
    pub fn empty(sampling_rate: u32) -> Self {
        Self {
            samples: None,
            sampling_rate,
        }
    }

    /// Returns the number of samples, 0 when there is no payload.
    pub fn len(&self) -> usize {
        self.samples.as_ref().map_or(0, Samples::len)
    }

    /// Returns true if the chunk has no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One item of a synthesis stream: a span of text, its phonemes and the
/// audio rendered for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisItem {
    pub text: String,
    pub phonemes: String,
    pub audio: Option<AudioChunk>,
}

impl SynthesisItem {
    /// Creates an item carrying audio.
    pub fn new(text: impl Into<String>, phonemes: impl Into<String>, audio: AudioChunk) -> Self {
        Self {
            text: text.into(),
            phonemes: phonemes.into(),
            audio: Some(audio),
        }
    }
}
