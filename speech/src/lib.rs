//! Streaming text-to-speech pipeline.
//!
//! This crate provides:
//! - [`Synthesizer`]: the boundary to a streaming TTS engine, fed by a
//!   [`TextInput`] and drained through a [`SynthesisStream`]
//! - [`TokenProducer`]: paces the words of a text into a synthesizer
//! - [`AudioSink`] and its [`FileSink`], [`PlaybackSink`] and
//!   [`GeneratorSink`] variants
//! - [`Pipeline`]: drives a synthesizer into a sink
//! - [`ToneSynthesizer`]: a deterministic synthesizer for dry runs and tests
//!
//! # Example
//!
//! ```rust,ignore
//! use narrator_speech::{Pipeline, PipelineOptions, SinkSelection, ToneSynthesizer};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let pipeline = Pipeline::new(Arc::new(ToneSynthesizer::default()), PipelineOptions::default());
//! let selection = SinkSelection::file("out.wav");
//! let done = pipeline
//!     .synthesize_file("input.txt", &selection, None, &CancellationToken::new())
//!     .await?;
//! ```

mod chunk;
mod error;
mod pipeline;
mod producer;
mod sink;
mod synthesizer;
mod tone;

pub use chunk::*;
pub use error::*;
pub use pipeline::*;
pub use producer::*;
pub use sink::*;
pub use synthesizer::*;
pub use tone::*;
