//! Output device boundary.
//!
//! A device opens one session per stream. The session receives sample buffers
//! in order and is released by `close` (drain) or `abort` (drop queued audio).
//! Only the first of the two takes effect.
//!
//! Sessions are shared: `write` blocks on a worker thread while the owner may
//! call `abort` from another thread to cut playback short.

use crate::pcm::{AudioFormat, Samples};
use std::io;

/// An audio output device able to open playback sessions.
pub trait OutputDevice: Send {
    /// Opens a playback session for the given format.
    fn open(&mut self, format: &AudioFormat) -> io::Result<Box<dyn OutputSession>>;
}

/// An open playback session.
pub trait OutputSession: Send + Sync {
    /// Writes samples to the device, blocking until they are queued.
    fn write(&self, samples: &Samples) -> io::Result<()>;

    /// Plays out queued samples, then releases the session.
    fn close(&self) -> io::Result<()>;

    /// Stops playback immediately, discarding queued samples.
    ///
    /// Must unblock a `write` in progress on another thread.
    fn abort(&self) -> io::Result<()> {
        self.close()
    }
}

/// A device that cannot be opened.
///
/// Used when the binary is built without a playback backend.
#[derive(Debug, Clone)]
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl OutputDevice for Unavailable {
    fn open(&mut self, _format: &AudioFormat) -> io::Result<Box<dyn OutputSession>> {
        Err(io::Error::new(io::ErrorKind::Unsupported, self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcm::SampleFormat;

    #[test]
    fn test_unavailable_device() {
        let mut device = Unavailable::new("no backend");
        let err = device
            .open(&AudioFormat::mono(SampleFormat::Float, 24000))
            .err()
            .unwrap();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert!(err.to_string().contains("no backend"));
    }

    struct CountingSession(std::sync::atomic::AtomicUsize);

    impl OutputSession for CountingSession {
        fn write(&self, _samples: &Samples) -> io::Result<()> {
            Ok(())
        }

        fn close(&self) -> io::Result<()> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_abort_defaults_to_close() {
        let session = CountingSession(Default::default());
        session.abort().unwrap();
        assert_eq!(session.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
