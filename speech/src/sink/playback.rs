//! Live playback sink.

use super::{payload, AudioSink};
use crate::{AudioChunk, PipelineError};
use async_trait::async_trait;
use narrator_audio::playback::{OutputDevice, OutputSession};
use narrator_audio::AudioFormat;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default pause after each device write.
pub const DEFAULT_PLAYBACK_PAUSE: Duration = Duration::from_millis(10);

/// Writes chunks to an output device as they arrive.
///
/// Device writes block until the samples are queued, so each one runs on the
/// blocking pool while the sink watches the cancellation token. Cancellation
/// aborts the session at once instead of waiting for the write to drain.
/// `finish` closes the session after queued audio has played.
pub struct PlaybackSink {
    device: Box<dyn OutputDevice>,
    session: Option<Arc<dyn OutputSession>>,
    pause: Duration,
    cancel: CancellationToken,
}

impl PlaybackSink {
    pub fn new(device: Box<dyn OutputDevice>, cancel: CancellationToken) -> Self {
        Self {
            device,
            session: None,
            pause: DEFAULT_PLAYBACK_PAUSE,
            cancel,
        }
    }

    /// Sets the pause after each write.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Returns true while a device session is open.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    fn close_session(&mut self) -> io::Result<()> {
        match self.session.take() {
            Some(session) => {
                debug!("playback sink: closing session");
                session.close()
            }
            None => Ok(()),
        }
    }

    fn abort_session(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("playback sink: aborting session");
            if let Err(e) = session.abort() {
                warn!(error = %e, "playback sink: failed to abort session");
            }
        }
    }

    fn interrupted(&mut self) -> PipelineError {
        self.abort_session();
        PipelineError::Interrupted
    }
}

#[async_trait]
impl AudioSink for PlaybackSink {
    async fn start(&mut self, format: &AudioFormat) -> Result<(), PipelineError> {
        let session = self
            .device
            .open(format)
            .map_err(PipelineError::DeviceUnavailable)?;
        info!(
            sample_rate = format.sample_rate,
            bit_depth = format.bit_depth,
            "playback sink: session opened"
        );
        self.session = Some(Arc::from(session));
        Ok(())
    }

    async fn handle(&mut self, chunk: AudioChunk) -> Result<(), PipelineError> {
        let samples = payload(chunk)?;

        if self.cancel.is_cancelled() {
            return Err(self.interrupted());
        }

        let Some(session) = self.session.clone() else {
            return Ok(());
        };
        let write = tokio::task::spawn_blocking(move || session.write(&samples));

        let written = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(self.interrupted()),
            joined = write => joined.unwrap_or_else(|e| Err(io::Error::other(e))),
        };
        written.map_err(|e| PipelineError::write_failure("playback device", e))?;

        tokio::select! {
            _ = self.cancel.cancelled() => Err(self.interrupted()),
            _ = tokio::time::sleep(self.pause) => Ok(()),
        }
    }

    async fn finish(&mut self) -> Result<(), PipelineError> {
        self.close_session()
            .map_err(|e| PipelineError::write_failure("playback device", e))
    }

    async fn abort(&mut self) {
        self.abort_session();
    }
}

#[cfg(test)]
mod playback_tests {
    use super::*;
    use narrator_audio::playback::Unavailable;
    use narrator_audio::{SampleFormat, Samples};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log {
        writes: Vec<Samples>,
        closes: usize,
        aborts: usize,
    }

    struct LogDevice(Arc<Mutex<Log>>);

    struct LogSession(Arc<Mutex<Log>>);

    impl OutputDevice for LogDevice {
        fn open(&mut self, _format: &AudioFormat) -> io::Result<Box<dyn OutputSession>> {
            Ok(Box::new(LogSession(Arc::clone(&self.0))))
        }
    }

    impl OutputSession for LogSession {
        fn write(&self, samples: &Samples) -> io::Result<()> {
            self.0.lock().unwrap().writes.push(samples.clone());
            Ok(())
        }

        fn close(&self) -> io::Result<()> {
            self.0.lock().unwrap().closes += 1;
            Ok(())
        }

        fn abort(&self) -> io::Result<()> {
            self.0.lock().unwrap().aborts += 1;
            Ok(())
        }
    }

    fn format() -> AudioFormat {
        AudioFormat::mono(SampleFormat::Float, 24000)
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_then_closes_once() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut sink = PlaybackSink::new(Box::new(LogDevice(Arc::clone(&log))), CancellationToken::new());

        sink.start(&format()).await.unwrap();
        assert!(sink.is_active());
        sink.handle(AudioChunk::new(Samples::F32(vec![0.1]), 24000)).await.unwrap();
        sink.handle(AudioChunk::new(Samples::F32(vec![0.2]), 24000)).await.unwrap();
        sink.finish().await.unwrap();
        sink.abort().await;

        let log = log.lock().unwrap();
        assert_eq!(log.writes, vec![Samples::F32(vec![0.1]), Samples::F32(vec![0.2])]);
        assert_eq!(log.closes, 1);
        assert_eq!(log.aborts, 0);
    }

    #[tokio::test]
    async fn test_handle_without_session_is_dropped() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut sink = PlaybackSink::new(Box::new(LogDevice(Arc::clone(&log))), CancellationToken::new());

        sink.handle(AudioChunk::new(Samples::F32(vec![0.1]), 24000)).await.unwrap();
        assert!(log.lock().unwrap().writes.is_empty());
    }

    #[tokio::test]
    async fn test_start_fails_when_device_unavailable() {
        let mut sink = PlaybackSink::new(Box::new(Unavailable::new("no device")), CancellationToken::new());
        let err = sink.start(&format()).await.unwrap_err();
        assert!(matches!(err, PipelineError::DeviceUnavailable(_)));
        assert!(!sink.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_aborts_session() {
        let log = Arc::new(Mutex::new(Log::default()));
        let cancel = CancellationToken::new();
        let mut sink = PlaybackSink::new(Box::new(LogDevice(Arc::clone(&log))), cancel.clone())
            .with_pause(Duration::from_secs(60));

        sink.start(&format()).await.unwrap();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            canceller.cancel();
        });

        let err = sink
            .handle(AudioChunk::new(Samples::F32(vec![0.1]), 24000))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Interrupted));
        assert!(!sink.is_active());
        let log = log.lock().unwrap();
        assert_eq!(log.aborts, 1);
        assert_eq!(log.closes, 0);
    }
}
