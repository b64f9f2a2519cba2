//! Audio format descriptor.

use serde::Serialize;
use std::time::Duration;

use super::Samples;

/// Element type of a sample stream, tagged with its WAV format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum SampleFormat {
    /// Signed 16-bit integer PCM.
    PcmInt = 1,
    /// 32-bit IEEE float.
    Float = 3,
}

impl SampleFormat {
    /// Returns the WAV `audioFormat` code.
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Returns the bit depth of one sample.
    pub const fn bit_depth(self) -> u16 {
        match self {
            SampleFormat::PcmInt => 16,
            SampleFormat::Float => 32,
        }
    }
}

/// Describes a mono audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioFormat {
    pub sample_format: SampleFormat,
    pub bit_depth: u16,
    pub channels: u16,
    pub sample_rate: u32,
}

impl AudioFormat {
    /// Creates a mono format.
    pub const fn mono(sample_format: SampleFormat, sample_rate: u32) -> Self {
        Self {
            sample_format,
            bit_depth: sample_format.bit_depth(),
            channels: 1,
            sample_rate,
        }
    }

    /// Derives the format of a stream from one of its buffers.
    ///
    /// Returns `None` when the element type is unknown.
    pub fn from_samples(samples: &Samples, sample_rate: u32) -> Option<Self> {
        samples
            .sample_format()
            .map(|sample_format| Self::mono(sample_format, sample_rate))
    }

    /// Returns the number of bytes per sample.
    pub fn bytes_per_sample(&self) -> usize {
        self.bit_depth as usize / 8
    }

    /// Returns the playback duration of `samples` samples.
    pub fn duration(&self, samples: usize) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        let frames = samples as u64 / self.channels.max(1) as u64;
        Duration::from_nanos(frames * 1_000_000_000 / self.sample_rate as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_codes() {
        assert_eq!(SampleFormat::Float.code(), 3);
        assert_eq!(SampleFormat::PcmInt.code(), 1);
        assert_eq!(SampleFormat::Float.bit_depth(), 32);
        assert_eq!(SampleFormat::PcmInt.bit_depth(), 16);
    }

    #[test]
    fn test_from_samples() {
        let format = AudioFormat::from_samples(&Samples::F32(vec![0.0]), 24000).unwrap();
        assert_eq!(format, AudioFormat::mono(SampleFormat::Float, 24000));
        assert_eq!(format.channels, 1);
        assert_eq!(format.bytes_per_sample(), 4);

        let format = AudioFormat::from_samples(&Samples::I16(vec![]), 16000).unwrap();
        assert_eq!(format.bit_depth, 16);
        assert_eq!(format.sample_format, SampleFormat::PcmInt);

        let other = Samples::Other {
            kind: "f64".to_string(),
            data: vec![],
        };
        assert!(AudioFormat::from_samples(&other, 24000).is_none());
    }

    #[test]
    fn test_duration() {
        let format = AudioFormat::mono(SampleFormat::Float, 24000);
        assert_eq!(format.duration(24000), Duration::from_secs(1));
        assert_eq!(format.duration(2400), Duration::from_millis(100));
        assert_eq!(AudioFormat::mono(SampleFormat::Float, 0).duration(10), Duration::ZERO);
    }
}
