//! Audio utilities for narrator.
//!
//! This crate provides:
//!
//! - `pcm`: sample buffers, the format descriptor and the chunk accumulator
//! - `wav`: the float32 WAV container encoder and header decoder
//! - `playback`: the output device boundary used for live playback
//! - `portaudio`: a PortAudio backed output device (feature `portaudio`)
//!
//! # Example
//!
//! ```rust
//! use narrator_audio::pcm::{ChunkAccumulator, Samples};
//! use narrator_audio::wav;
//!
//! let mut acc = ChunkAccumulator::new();
//! acc.push(Samples::F32(vec![0.0, 0.25]));
//! acc.push(Samples::F32(vec![-0.25]));
//!
//! let bytes = wav::encode(&acc.flatten(), 24000, 1, 32);
//! assert_eq!(bytes.len(), wav::HEADER_LEN + 3 * 4);
//! ```

pub mod pcm;
pub mod playback;
pub mod wav;

#[cfg(feature = "portaudio")]
pub mod portaudio;

pub use pcm::{AudioFormat, SampleFormat, Samples};
