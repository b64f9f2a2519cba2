//! WAV file sink.

use super::{payload, AudioSink};
use crate::{AudioChunk, PipelineError};
use async_trait::async_trait;
use narrator_audio::pcm::ChunkAccumulator;
use narrator_audio::{wav, AudioFormat, Samples};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Collects the whole stream and writes it as one WAV file on `finish`.
///
/// Samples are stored as float on disk. 16-bit chunks are widened to float
/// when they arrive; the header still advertises the bit depth of the
/// detected stream format.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    format: Option<AudioFormat>,
    chunks: ChunkAccumulator,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            format: None,
            chunks: ChunkAccumulator::new(),
        }
    }

    /// Returns the output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl AudioSink for FileSink {
    async fn start(&mut self, format: &AudioFormat) -> Result<(), PipelineError> {
        debug!(path = %self.path.display(), ?format, "file sink: started");
        self.format = Some(*format);
        self.chunks.clear();
        Ok(())
    }

    async fn handle(&mut self, chunk: AudioChunk) -> Result<(), PipelineError> {
        let samples = match payload(chunk)? {
            ints @ Samples::I16(_) => Samples::F32(ints.to_f32().unwrap_or_default()),
            samples => samples,
        };
        self.chunks.push(samples);
        Ok(())
    }

    async fn finish(&mut self) -> Result<(), PipelineError> {
        let format = self.format.ok_or_else(|| {
            PipelineError::write_failure(self.target(), io::Error::other("sink was never started"))
        })?;

        let samples = self.chunks.flatten();
        let bytes = wav::encode(&samples, format.sample_rate, format.channels, format.bit_depth);
        tokio::fs::write(&self.path, &bytes)
            .await
            .map_err(|e| PipelineError::write_failure(self.target(), e))?;

        info!(
            path = %self.path.display(),
            samples = samples.len(),
            bytes = bytes.len(),
            "file sink: wav written"
        );
        self.chunks.clear();
        Ok(())
    }

    async fn abort(&mut self) {
        self.chunks.clear();
    }
}

#[cfg(test)]
mod file_tests {
    use super::*;
    use narrator_audio::SampleFormat;

    #[tokio::test]
    async fn test_file_sink_writes_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let mut sink = FileSink::new(&path);
        sink.start(&AudioFormat::mono(SampleFormat::Float, 24000)).await.unwrap();
        sink.handle(AudioChunk::new(Samples::F32(vec![0.1, 0.2]), 24000)).await.unwrap();
        sink.handle(AudioChunk::new(Samples::F32(vec![0.3]), 24000)).await.unwrap();
        sink.finish().await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let (header, samples) = wav::decode(&bytes).unwrap();
        assert_eq!(header.sample_rate, 24000);
        assert_eq!(header.bits_per_sample, 32);
        assert_eq!(samples, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn test_file_sink_widens_int_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ints.wav");

        let mut sink = FileSink::new(&path);
        sink.start(&AudioFormat::mono(SampleFormat::PcmInt, 16000)).await.unwrap();
        sink.handle(AudioChunk::new(Samples::I16(vec![16384, -32768]), 16000)).await.unwrap();
        sink.finish().await.unwrap();

        let (header, samples) = wav::decode(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(header.audio_format, wav::FORMAT_IEEE_FLOAT);
        assert_eq!(header.bits_per_sample, 16);
        assert_eq!(header.data_size, 8);
        assert_eq!(samples, vec![0.5, -1.0]);
    }

    #[tokio::test]
    async fn test_file_sink_rejects_bad_payloads() {
        let mut sink = FileSink::new("unused.wav");
        sink.start(&AudioFormat::mono(SampleFormat::Float, 24000)).await.unwrap();

        let err = sink.handle(AudioChunk::empty(24000)).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedSampleFormat(_)));

        let other = AudioChunk::new(
            Samples::Other {
                kind: "f64".to_string(),
                data: vec![0; 8],
            },
            24000,
        );
        let err = sink.handle(other).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedSampleFormat(_)));
    }

    #[tokio::test]
    async fn test_file_sink_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.wav");

        let mut sink = FileSink::new(&path);
        sink.start(&AudioFormat::mono(SampleFormat::Float, 24000)).await.unwrap();
        sink.handle(AudioChunk::new(Samples::F32(vec![0.0]), 24000)).await.unwrap();

        let err = sink.finish().await.unwrap_err();
        assert!(matches!(err, PipelineError::WriteFailure { .. }));
    }

    #[tokio::test]
    async fn test_finish_without_start() {
        let mut sink = FileSink::new("never.wav");
        assert!(matches!(
            sink.finish().await,
            Err(PipelineError::WriteFailure { .. })
        ));
    }
}
