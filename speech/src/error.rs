//! Pipeline errors.

use std::io;
use std::path::PathBuf;

/// Error type for pipeline runs. Every variant is fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("source not found: {}: {source}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid first chunk: {0}")]
    InvalidFirstChunk(String),
    #[error("unsupported sample format: {0}")]
    UnsupportedSampleFormat(String),
    #[error("device unavailable: {0}")]
    DeviceUnavailable(#[source] io::Error),
    #[error("write failed: {target}: {source}")]
    WriteFailure {
        target: String,
        #[source]
        source: io::Error,
    },
    #[error("synthesis failed: {0}")]
    Synthesis(String),
    #[error("interrupted")]
    Interrupted,
    #[error("pipeline task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PipelineError {
    pub(crate) fn write_failure(target: impl Into<String>, source: io::Error) -> Self {
        PipelineError::WriteFailure {
            target: target.into(),
            source,
        }
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn test_pipeline_error_display() {
        let err = PipelineError::SourceNotFound {
            path: PathBuf::from("missing.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.to_string().contains("missing.txt"));

        let err = PipelineError::UnsupportedSampleFormat("f64".to_string());
        assert_eq!(err.to_string(), "unsupported sample format: f64");

        let err = PipelineError::write_failure("out.wav", io::Error::other("disk full"));
        assert_eq!(err.to_string(), "write failed: out.wav: disk full");
    }
}
