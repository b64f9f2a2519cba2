//! PCM sample handling.
//!
//! # Key Types
//!
//! - [`Samples`]: one buffer of mono samples as produced by a synthesizer
//! - [`SampleFormat`]: the two element types the pipeline understands
//! - [`AudioFormat`]: sample rate, bit depth and channel count of a stream
//! - [`ChunkAccumulator`]: collects float buffers for later flattening

mod accumulator;
mod format;
mod samples;

pub use accumulator::ChunkAccumulator;
pub use format::{AudioFormat, SampleFormat};
pub use samples::Samples;
