//! Pipeline driver.
//!
//! A run moves through `Init → FormatDetection → Streaming → Finalizing →
//! Done`; any error moves it to `Failed`, after which the sink is aborted so
//! that an open device session is released before the error surfaces.
//!
//! The text producer runs as its own task and is never throttled by the
//! consuming side: chunks are pulled from the synthesizer and dispatched to
//! the sink in the order they were emitted.

use crate::{
    AudioSink, AudioStream, FileSink, GeneratorSink, PipelineError, PlaybackSink, SinkMode,
    SinkSelection, SynthesisStream, Synthesizer, TokenProducer, DEFAULT_PLAYBACK_PAUSE,
    DEFAULT_TOKEN_DELAY,
};
use narrator_audio::playback::OutputDevice;
use narrator_audio::AudioFormat;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default voice identifier.
pub const DEFAULT_VOICE: &str = "af_heart";

/// Tunables of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Voice passed to the synthesizer.
    pub voice: String,
    /// Pause between two tokens pushed into the synthesizer.
    pub token_delay: Duration,
    /// Pause after each device write in playback mode.
    pub playback_pause: Duration,
    /// Buffers held between the pipeline and an [`AudioStream`] reader.
    pub stream_capacity: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            token_delay: DEFAULT_TOKEN_DELAY,
            playback_pause: DEFAULT_PLAYBACK_PAUSE,
            stream_capacity: 32,
        }
    }
}

/// Stage of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    FormatDetection,
    Streaming,
    Finalizing,
    Done,
    Failed,
}

impl RunState {
    fn enter(&mut self, next: RunState) {
        debug!(from = %self, to = %next, "pipeline: state");
        *self = next;
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::FormatDetection => "format_detection",
            RunState::Streaming => "streaming",
            RunState::Finalizing => "finalizing",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub voice: String,
    /// Format detected from the first chunk.
    pub format: AudioFormat,
    /// Chunks dispatched to the sink.
    pub chunks: usize,
    /// Chunks dropped because they carried no audio.
    pub skipped: usize,
    /// Samples dispatched to the sink.
    pub samples: usize,
    pub audio_secs: f64,
    pub elapsed_ms: u64,
}

impl RunReport {
    fn new(format: AudioFormat) -> Self {
        Self {
            voice: String::new(),
            format,
            chunks: 0,
            skipped: 0,
            samples: 0,
            audio_secs: 0.0,
            elapsed_ms: 0,
        }
    }
}

/// Outcome of [`Pipeline::synthesize_file`].
#[derive(Debug)]
pub enum Completion {
    /// File or playback run finished.
    Finished(RunReport),
    /// Stream mode: the run continues in the background, feeding the stream.
    Streaming(AudioStream),
}

/// Drives a synthesizer into an audio sink.
#[derive(Clone)]
pub struct Pipeline {
    synthesizer: Arc<dyn Synthesizer>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, options: PipelineOptions) -> Self {
        Self {
            synthesizer,
            options,
        }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Reads a UTF-8 text file, which must be a regular file.
    pub async fn load_source(path: impl AsRef<Path>) -> Result<String, PipelineError> {
        let path = path.as_ref();
        let not_found = |source: io::Error| PipelineError::SourceNotFound {
            path: path.to_path_buf(),
            source,
        };

        let meta = tokio::fs::metadata(path).await.map_err(not_found)?;
        if !meta.is_file() {
            return Err(not_found(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        tokio::fs::read_to_string(path).await.map_err(not_found)
    }

    /// Converts a text file to audio using the selected sink.
    ///
    /// The selection and the input file are validated before any synthesis
    /// starts. In playback mode `device` must be provided. In stream mode the
    /// returned [`AudioStream`] is fed by a background task.
    pub async fn synthesize_file(
        &self,
        input: impl AsRef<Path>,
        selection: &SinkSelection,
        device: Option<Box<dyn OutputDevice>>,
        cancel: &CancellationToken,
    ) -> Result<Completion, PipelineError> {
        let mode = selection.resolve()?;
        let text = Self::load_source(input).await?;

        match mode {
            SinkMode::File(path) => {
                let mut sink = FileSink::new(path);
                self.run_text(text, &mut sink, cancel)
                    .await
                    .map(Completion::Finished)
            }
            SinkMode::Playback => {
                let device = device.ok_or_else(|| {
                    PipelineError::DeviceUnavailable(io::Error::new(
                        io::ErrorKind::NotFound,
                        "no output device configured",
                    ))
                })?;
                let mut sink = PlaybackSink::new(device, cancel.clone())
                    .with_pause(self.options.playback_pause);
                self.run_text(text, &mut sink, cancel)
                    .await
                    .map(Completion::Finished)
            }
            SinkMode::Stream => {
                let (mut sink, stream) = GeneratorSink::channel(self.options.stream_capacity);
                let pipeline = self.clone();
                let cancel = cancel.clone();
                let task =
                    tokio::spawn(async move { pipeline.run_text(text, &mut sink, &cancel).await });
                Ok(Completion::Streaming(stream.with_task(task)))
            }
        }
    }

    /// Converts a text file to audio into a caller-provided sink.
    pub async fn run(
        &self,
        input: impl AsRef<Path>,
        sink: &mut dyn AudioSink,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let text = Self::load_source(input).await?;
        self.run_text(text, sink, cancel).await
    }

    /// Converts text to audio into a sink.
    pub async fn run_text(
        &self,
        text: String,
        sink: &mut dyn AudioSink,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let mut state = RunState::Init;
        info!(voice = %self.options.voice, chars = text.len(), "pipeline: run started");

        let (input, mut output) = match self.synthesizer.open_stream(&self.options.voice).await {
            Ok(pair) => pair,
            Err(e) => {
                state.enter(RunState::Failed);
                return Err(e);
            }
        };
        let producer = TokenProducer::new(self.options.token_delay).spawn(text, input);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Interrupted),
            result = drive(&mut state, &mut output, &mut *sink) => result,
        };

        producer.abort();
        output.close();

        match outcome {
            Ok(mut report) => {
                state.enter(RunState::Done);
                report.voice = self.options.voice.clone();
                report.elapsed_ms = started.elapsed().as_millis() as u64;
                info!(
                    chunks = report.chunks,
                    skipped = report.skipped,
                    samples = report.samples,
                    elapsed_ms = report.elapsed_ms,
                    "pipeline: run finished"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, state = %state, "pipeline: run failed");
                state.enter(RunState::Failed);
                sink.abort().await;
                Err(e)
            }
        }
    }
}

async fn drive(
    state: &mut RunState,
    output: &mut SynthesisStream,
    sink: &mut dyn AudioSink,
) -> Result<RunReport, PipelineError> {
    state.enter(RunState::FormatDetection);

    let first = output
        .next()
        .await
        .ok_or_else(|| PipelineError::InvalidFirstChunk("synthesizer produced no chunks".to_string()))?;
    let chunk = first
        .audio
        .ok_or_else(|| PipelineError::InvalidFirstChunk("first chunk has no audio".to_string()))?;
    let samples = chunk
        .samples
        .as_ref()
        .ok_or_else(|| PipelineError::InvalidFirstChunk("first chunk has no samples".to_string()))?;
    if chunk.sampling_rate == 0 {
        return Err(PipelineError::InvalidFirstChunk(
            "first chunk has no sampling rate".to_string(),
        ));
    }

    // Detected once; later chunks are trusted to match.
    let format = AudioFormat::from_samples(samples, chunk.sampling_rate)
        .ok_or_else(|| PipelineError::UnsupportedSampleFormat(samples.kind().to_string()))?;
    info!(
        sample_rate = format.sample_rate,
        bit_depth = format.bit_depth,
        "pipeline: format detected"
    );

    sink.start(&format).await?;
    state.enter(RunState::Streaming);

    let mut report = RunReport::new(format);
    report.chunks += 1;
    report.samples += chunk.len();
    sink.handle(chunk).await?;

    while let Some(item) = output.next().await {
        match item.audio {
            Some(chunk) if chunk.samples.is_some() => {
                report.chunks += 1;
                report.samples += chunk.len();
                sink.handle(chunk).await?;
            }
            _ => {
                report.skipped += 1;
                debug!(text = %item.text, "pipeline: skipping chunk without audio");
            }
        }
    }

    state.enter(RunState::Finalizing);
    sink.finish().await?;

    report.audio_secs = format.duration(report.samples).as_secs_f64();
    Ok(report)
}
