//! Lazy audio stream sink.

use super::{payload, AudioSink};
use crate::{AudioChunk, PipelineError, RunReport};
use async_trait::async_trait;
use futures::Stream;
use narrator_audio::{AudioFormat, Samples};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Forwards each chunk's samples to an [`AudioStream`] held by the caller.
///
/// The channel is bounded, so a slow reader holds back the pipeline.
#[derive(Debug)]
pub struct GeneratorSink {
    tx: Option<mpsc::Sender<Samples>>,
    format: watch::Sender<Option<AudioFormat>>,
}

impl GeneratorSink {
    /// Creates a sink and the stream it feeds.
    pub fn channel(capacity: usize) -> (GeneratorSink, AudioStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (format_tx, format_rx) = watch::channel(None);
        (
            GeneratorSink {
                tx: Some(tx),
                format: format_tx,
            },
            AudioStream {
                rx,
                format: format_rx,
                task: None,
            },
        )
    }
}

#[async_trait]
impl AudioSink for GeneratorSink {
    async fn start(&mut self, format: &AudioFormat) -> Result<(), PipelineError> {
        self.format.send_replace(Some(*format));
        Ok(())
    }

    async fn handle(&mut self, chunk: AudioChunk) -> Result<(), PipelineError> {
        let samples = payload(chunk)?;
        let Some(tx) = self.tx.as_ref() else {
            return Ok(());
        };
        tx.send(samples).await.map_err(|_| {
            PipelineError::write_failure(
                "audio stream",
                io::Error::new(io::ErrorKind::BrokenPipe, "stream receiver dropped"),
            )
        })
    }

    async fn finish(&mut self) -> Result<(), PipelineError> {
        self.tx = None;
        Ok(())
    }

    async fn abort(&mut self) {
        self.tx = None;
    }
}

/// The caller's end of a [`GeneratorSink`]: sample buffers in synthesis order.
///
/// The stream ends when the run finishes or fails; [`AudioStream::join`]
/// tells which.
#[derive(Debug)]
pub struct AudioStream {
    rx: mpsc::Receiver<Samples>,
    format: watch::Receiver<Option<AudioFormat>>,
    task: Option<JoinHandle<Result<RunReport, PipelineError>>>,
}

impl AudioStream {
    pub(crate) fn with_task(mut self, task: JoinHandle<Result<RunReport, PipelineError>>) -> Self {
        self.task = Some(task);
        self
    }

    /// Returns the next buffer, or `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Samples> {
        self.rx.recv().await
    }

    /// Returns the stream format once it has been detected.
    pub fn format(&self) -> Option<AudioFormat> {
        *self.format.borrow()
    }

    /// Waits for the run driving this stream and returns its outcome.
    ///
    /// Buffers not yet read are drained and discarded.
    pub async fn join(mut self) -> Result<RunReport, PipelineError> {
        while self.rx.recv().await.is_some() {}
        match self.task.take() {
            Some(task) => task.await?,
            None => Err(PipelineError::Synthesis(
                "audio stream is not attached to a pipeline run".to_string(),
            )),
        }
    }
}

impl Stream for AudioStream {
    type Item = Samples;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod generator_tests {
    use super::*;
    use narrator_audio::SampleFormat;

    #[tokio::test]
    async fn test_forwards_in_order() {
        let (mut sink, mut stream) = GeneratorSink::channel(4);
        assert_eq!(stream.format(), None);

        let format = AudioFormat::mono(SampleFormat::Float, 24000);
        sink.start(&format).await.unwrap();
        sink.handle(AudioChunk::new(Samples::F32(vec![1.0]), 24000)).await.unwrap();
        sink.handle(AudioChunk::new(Samples::F32(vec![2.0]), 24000)).await.unwrap();
        sink.finish().await.unwrap();

        assert_eq!(stream.format(), Some(format));
        assert_eq!(stream.next().await, Some(Samples::F32(vec![1.0])));
        assert_eq!(stream.next().await, Some(Samples::F32(vec![2.0])));
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn test_dropped_receiver_fails_handle() {
        let (mut sink, stream) = GeneratorSink::channel(1);
        drop(stream);

        let err = sink
            .handle(AudioChunk::new(Samples::F32(vec![1.0]), 24000))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::WriteFailure { .. }));
    }

    #[tokio::test]
    async fn test_join_without_task() {
        let (sink, stream) = GeneratorSink::channel(1);
        drop(sink);
        assert!(matches!(stream.join().await, Err(PipelineError::Synthesis(_))));
    }
}
