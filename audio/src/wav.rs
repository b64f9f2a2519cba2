//! WAV container encoding.
//!
//! The encoder always writes 32-bit IEEE float samples. The `bits_per_sample`
//! header field is written as given and does not change the on-disk sample
//! width, so a 16-bit descriptor still yields 4 bytes per sample.
//!
//! Layout (all integers little-endian):
//!
//! | offset | field           | value                     |
//! |--------|-----------------|---------------------------|
//! | 0      | chunk id        | `RIFF`                    |
//! | 4      | chunk size      | 36 + data size            |
//! | 8      | format          | `WAVE`                    |
//! | 12     | sub-chunk id    | `fmt `                    |
//! | 16     | sub-chunk size  | 16                        |
//! | 20     | audio format    | 3 (IEEE float)            |
//! | 22     | channels        |                           |
//! | 24     | sample rate     |                           |
//! | 28     | byte rate       | sample rate × 4           |
//! | 32     | block align     | channels × 4              |
//! | 34     | bits per sample |                           |
//! | 36     | sub-chunk id    | `data`                    |
//! | 40     | data size       | sample count × 4          |
//! | 44     | samples         | f32 little-endian         |

/// Size of the WAV header in bytes.
pub const HEADER_LEN: usize = 44;

/// WAV `audioFormat` code for IEEE float samples.
pub const FORMAT_IEEE_FLOAT: u16 = 3;

const BYTES_PER_SAMPLE: u32 = 4;

/// Error type for WAV decoding.
#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("wav: header needs {HEADER_LEN} bytes, got {0}")]
    Truncated(usize),
    #[error("wav: expected chunk id {expected:?} at offset {offset}")]
    BadChunkId { expected: &'static str, offset: usize },
    #[error("wav: data size {declared} exceeds payload of {actual} bytes")]
    ShortData { declared: u32, actual: usize },
}

/// Encodes mono or interleaved float samples into a WAV container.
///
/// Never fails: an empty sample slice or a zero rate produce a structurally
/// valid container with a zero-length data chunk or zero rates.
pub fn encode(samples: &[f32], rate: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let data_size = (samples.len() as u32).wrapping_mul(BYTES_PER_SAMPLE);

    let mut buf = Vec::with_capacity(HEADER_LEN + samples.len() * BYTES_PER_SAMPLE as usize);
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&36u32.wrapping_add(data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&FORMAT_IEEE_FLOAT.to_le_bytes());
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&rate.to_le_bytes());
    buf.extend_from_slice(&rate.wrapping_mul(BYTES_PER_SAMPLE).to_le_bytes());
    buf.extend_from_slice(&channels.wrapping_mul(BYTES_PER_SAMPLE as u16).to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());

    for sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }
    buf
}

/// Decoded WAV header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Parses the 44-byte header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, WavError> {
        if bytes.len() < HEADER_LEN {
            return Err(WavError::Truncated(bytes.len()));
        }
        expect_id(bytes, 0, "RIFF")?;
        expect_id(bytes, 8, "WAVE")?;
        expect_id(bytes, 12, "fmt ")?;
        expect_id(bytes, 36, "data")?;

        Ok(Self {
            chunk_size: read_u32(bytes, 4),
            audio_format: read_u16(bytes, 20),
            channels: read_u16(bytes, 22),
            sample_rate: read_u32(bytes, 24),
            byte_rate: read_u32(bytes, 28),
            block_align: read_u16(bytes, 32),
            bits_per_sample: read_u16(bytes, 34),
            data_size: read_u32(bytes, 40),
        })
    }

    /// Returns the number of float samples in the data chunk.
    pub fn sample_count(&self) -> usize {
        (self.data_size / BYTES_PER_SAMPLE) as usize
    }
}

/// Decodes the float samples of a container produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<(WavHeader, Vec<f32>), WavError> {
    let header = WavHeader::parse(bytes)?;
    let payload = &bytes[HEADER_LEN..];
    if payload.len() < header.data_size as usize {
        return Err(WavError::ShortData {
            declared: header.data_size,
            actual: payload.len(),
        });
    }

    let samples = payload[..header.data_size as usize]
        .chunks_exact(BYTES_PER_SAMPLE as usize)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    Ok((header, samples))
}

fn expect_id(bytes: &[u8], offset: usize, expected: &'static str) -> Result<(), WavError> {
    if &bytes[offset..offset + 4] == expected.as_bytes() {
        Ok(())
    } else {
        Err(WavError::BadChunkId { expected, offset })
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
