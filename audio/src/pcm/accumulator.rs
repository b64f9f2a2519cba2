//! Chunk accumulation.

use super::Samples;
use tracing::warn;

/// Collects sample buffers in arrival order and flattens them into one
/// contiguous float buffer.
///
/// Only float buffers contribute to the flattened output. Buffers of any other
/// element type are kept in order but skipped, with a warning, when flattening.
#[derive(Debug, Default, Clone)]
pub struct ChunkAccumulator {
    chunks: Vec<Samples>,
}

impl ChunkAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a buffer.
    pub fn push(&mut self, samples: Samples) {
        self.chunks.push(samples);
    }

    /// Returns the number of buffers collected.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns true if no buffers were collected.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Concatenates all float buffers in order.
    pub fn flatten(&self) -> Vec<f32> {
        let mut total = 0;
        for (index, chunk) in self.chunks.iter().enumerate() {
            match chunk {
                Samples::F32(s) => total += s.len(),
                other => warn!(index, kind = other.kind(), "pcm: skipping non-f32 buffer"),
            }
        }

        let mut flat = Vec::with_capacity(total);
        for chunk in &self.chunks {
            if let Samples::F32(s) = chunk {
                flat.extend_from_slice(s);
            }
        }
        flat
    }

    /// Drops all collected buffers.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}
