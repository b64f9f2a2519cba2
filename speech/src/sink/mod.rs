//! Audio sinks.
//!
//! A sink consumes the chunks of one pipeline run through a fixed lifecycle:
//! `start` once with the stream format, `handle` for every chunk in order,
//! then `finish`. When a run fails the driver calls `abort` instead of
//! `finish`.

mod file;
mod generator;
mod playback;

pub use file::FileSink;
pub use generator::{AudioStream, GeneratorSink};
pub use playback::{PlaybackSink, DEFAULT_PLAYBACK_PAUSE};

use crate::{AudioChunk, PipelineError};
use async_trait::async_trait;
use narrator_audio::{AudioFormat, Samples};
use std::path::PathBuf;

/// Consumer of a synthesized audio stream.
#[async_trait]
pub trait AudioSink: Send {
    /// Prepares the sink for a stream of the given format.
    async fn start(&mut self, format: &AudioFormat) -> Result<(), PipelineError>;

    /// Consumes one chunk.
    async fn handle(&mut self, chunk: AudioChunk) -> Result<(), PipelineError>;

    /// Completes the stream and releases the session.
    async fn finish(&mut self) -> Result<(), PipelineError>;

    /// Releases the session after a failed or interrupted run. Best effort.
    async fn abort(&mut self) {}
}

/// The sink mode requested by a caller.
///
/// Exactly one of `output`, `play` and `stream` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkSelection {
    /// Write a WAV file to this path.
    pub output: Option<PathBuf>,
    /// Play through the output device.
    pub play: bool,
    /// Hand the audio back to the caller as a stream.
    pub stream: bool,
}

impl SinkSelection {
    /// Selects file output.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            output: Some(path.into()),
            ..Default::default()
        }
    }

    /// Selects live playback.
    pub fn playback() -> Self {
        Self {
            play: true,
            ..Default::default()
        }
    }

    /// Selects the lazy audio stream.
    pub fn stream() -> Self {
        Self {
            stream: true,
            ..Default::default()
        }
    }

    /// Checks that exactly one mode was requested.
    pub fn resolve(&self) -> Result<SinkMode, PipelineError> {
        match (&self.output, self.play, self.stream) {
            (Some(path), false, false) => Ok(SinkMode::File(path.clone())),
            (None, true, false) => Ok(SinkMode::Playback),
            (None, false, true) => Ok(SinkMode::Stream),
            (None, false, false) => Err(PipelineError::InvalidConfiguration(
                "no sink selected: set an output file, playback or stream".to_string(),
            )),
            _ => Err(PipelineError::InvalidConfiguration(
                "output file, playback and stream are mutually exclusive".to_string(),
            )),
        }
    }
}

/// A validated sink mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkMode {
    File(PathBuf),
    Playback,
    Stream,
}

/// Takes the payload out of a chunk, rejecting absent payloads and unknown
/// element types.
pub(crate) fn payload(chunk: AudioChunk) -> Result<Samples, PipelineError> {
    match chunk.samples {
        None => Err(PipelineError::UnsupportedSampleFormat(
            "chunk has no sample payload".to_string(),
        )),
        Some(Samples::Other { kind, .. }) => Err(PipelineError::UnsupportedSampleFormat(kind)),
        Some(samples) => Ok(samples),
    }
}

#[cfg(test)]
mod sink_tests {
    use super::*;

    #[test]
    fn test_resolve_single_mode() {
        assert_eq!(
            SinkSelection::file("out.wav").resolve().unwrap(),
            SinkMode::File(PathBuf::from("out.wav"))
        );
        assert_eq!(SinkSelection::playback().resolve().unwrap(), SinkMode::Playback);
        assert_eq!(SinkSelection::stream().resolve().unwrap(), SinkMode::Stream);
    }

    #[test]
    fn test_resolve_rejects_none_or_many() {
        let none = SinkSelection::default();
        assert!(matches!(none.resolve(), Err(PipelineError::InvalidConfiguration(_))));

        let both = SinkSelection {
            output: Some(PathBuf::from("out.wav")),
            play: true,
            stream: false,
        };
        assert!(matches!(both.resolve(), Err(PipelineError::InvalidConfiguration(_))));

        let play_and_stream = SinkSelection {
            output: None,
            play: true,
            stream: true,
        };
        assert!(matches!(
            play_and_stream.resolve(),
            Err(PipelineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_payload() {
        let ok = payload(AudioChunk::new(Samples::F32(vec![0.5]), 24000)).unwrap();
        assert_eq!(ok, Samples::F32(vec![0.5]));

        assert!(matches!(
            payload(AudioChunk::empty(24000)),
            Err(PipelineError::UnsupportedSampleFormat(_))
        ));

        let other = AudioChunk::new(
            Samples::Other {
                kind: "u8".to_string(),
                data: vec![1],
            },
            24000,
        );
        match payload(other) {
            Err(PipelineError::UnsupportedSampleFormat(kind)) => assert_eq!(kind, "u8"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
