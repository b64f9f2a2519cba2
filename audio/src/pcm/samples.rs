//! Sample buffers.

use super::SampleFormat;

/// One buffer of mono samples.
///
/// Synthesizers hand out either float or 16-bit integer samples. Payloads of
/// any other element type are carried as [`Samples::Other`] so that callers
/// can report them instead of silently reinterpreting bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    F32(Vec<f32>),
    I16(Vec<i16>),
    /// A payload of an element type this crate does not decode.
    Other { kind: String, data: Vec<u8> },
}

impl Samples {
    /// Returns the number of elements in the buffer.
    ///
    /// For [`Samples::Other`] the element width is unknown, so this is the
    /// byte length of the payload.
    pub fn len(&self) -> usize {
        match self {
            Samples::F32(s) => s.len(),
            Samples::I16(s) => s.len(),
            Samples::Other { data, .. } => data.len(),
        }
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element type name, e.g. `"f32"`.
    pub fn kind(&self) -> &str {
        match self {
            Samples::F32(_) => "f32",
            Samples::I16(_) => "i16",
            Samples::Other { kind, .. } => kind,
        }
    }

    /// Returns the sample format, or `None` for unknown element types.
    pub fn sample_format(&self) -> Option<SampleFormat> {
        match self {
            Samples::F32(_) => Some(SampleFormat::Float),
            Samples::I16(_) => Some(SampleFormat::PcmInt),
            Samples::Other { .. } => None,
        }
    }

    /// Converts the buffer to float samples in `[-1.0, 1.0)`.
    pub fn to_f32(&self) -> Option<Vec<f32>> {
        match self {
            Samples::F32(s) => Some(s.clone()),
            Samples::I16(s) => Some(s.iter().map(|&v| v as f32 / 32768.0).collect()),
            Samples::Other { .. } => None,
        }
    }

    /// Converts the buffer to 16-bit samples, clamping out-of-range floats.
    pub fn to_i16(&self) -> Option<Vec<i16>> {
        match self {
            Samples::F32(s) => Some(
                s.iter()
                    .map(|&v| (v.clamp(-1.0, 1.0) * 32767.0).round() as i16)
                    .collect(),
            ),
            Samples::I16(s) => Some(s.clone()),
            Samples::Other { .. } => None,
        }
    }

    /// Encodes the samples as little-endian bytes in their own element type.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            Samples::F32(s) => s.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Samples::I16(s) => s.iter().flat_map(|v| v.to_le_bytes()).collect(),
            Samples::Other { data, .. } => data.clone(),
        }
    }
}
