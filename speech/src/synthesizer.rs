//! Streaming synthesizer boundary.

use crate::{PipelineError, SynthesisItem};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

/// Interface for a streaming text-to-speech engine.
///
/// `open_stream` returns the two ends of one synthesis session: text tokens
/// pushed into the [`TextInput`] come out as audio through the
/// [`SynthesisStream`], in order. The stream ends once the input has been
/// closed and everything pushed before has been synthesized.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn open_stream(
        &self,
        voice: &str,
    ) -> Result<(TextInput, SynthesisStream), PipelineError>;
}

/// The writing end of a synthesizer's text input.
///
/// Unbounded: pushing never waits for the synthesizer. Dropping the input or
/// calling [`TextInput::close`] signals end of text.
#[derive(Debug)]
pub struct TextInput {
    tx: mpsc::UnboundedSender<String>,
}

/// The reading end of a text input, held by the synthesizer.
#[derive(Debug)]
pub struct TextReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl TextInput {
    /// Creates a connected input/receiver pair.
    pub fn channel() -> (TextInput, TextReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (TextInput { tx }, TextReceiver { rx })
    }

    /// Pushes one token.
    pub fn push(&self, token: impl Into<String>) -> Result<(), PipelineError> {
        self.tx
            .send(token.into())
            .map_err(|_| PipelineError::Synthesis("synthesizer input closed".to_string()))
    }

    /// Signals that no more text follows.
    pub fn close(self) {
        drop(self);
    }
}

impl TextReceiver {
    /// Returns the next token, or `None` once the input is closed and drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

/// The reading end of a synthesizer's output.
#[derive(Debug)]
pub struct SynthesisStream {
    rx: mpsc::Receiver<SynthesisItem>,
}

impl SynthesisStream {
    /// Creates a bounded item channel. The synthesizer keeps the sender and
    /// drops it to end the stream.
    pub fn channel(capacity: usize) -> (mpsc::Sender<SynthesisItem>, SynthesisStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, SynthesisStream { rx })
    }

    /// Returns the next item, or `None` when the stream has ended.
    pub async fn next(&mut self) -> Option<SynthesisItem> {
        self.rx.recv().await
    }

    /// Stops accepting items. Items already queued can still be read.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for SynthesisStream {
    type Item = SynthesisItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
