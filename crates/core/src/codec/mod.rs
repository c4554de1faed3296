//! Conversion between raw PCM bytes and logical sample values.
//!
//! Two layouts are supported: 8-bit unsigned samples (one byte each) and
//! 16-bit signed little-endian two's complement samples. Both match the
//! on-disk layout of PCM WAV data, so buffers can be written out verbatim.
//!
//! The free functions assume the caller has already validated the index.
//! An out-of-range index panics on the slice access.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MediaError, Result};

/// Bits per sample of a PCM buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    /// Unsigned, 0..=255.
    Eight,
    /// Signed little-endian, -32768..=32767.
    Sixteen,
}

impl BitDepth {
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        }
    }

    pub fn min_value(self) -> i32 {
        match self {
            BitDepth::Eight => u8::MIN as i32,
            BitDepth::Sixteen => i16::MIN as i32,
        }
    }

    pub fn max_value(self) -> i32 {
        match self {
            BitDepth::Eight => u8::MAX as i32,
            BitDepth::Sixteen => i16::MAX as i32,
        }
    }

    /// Sample value of silence: the midpoint 128 for unsigned 8-bit, 0 for
    /// signed 16-bit.
    pub fn silence(self) -> i32 {
        match self {
            BitDepth::Eight => 0x80,
            BitDepth::Sixteen => 0,
        }
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = MediaError;

    fn try_from(bits: u16) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            other => Err(MediaError::UnsupportedBitDepth(other)),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Saturates `value` into the domain of `bit_depth`.
#[inline]
pub fn clamp(bit_depth: BitDepth, value: i32) -> i32 {
    value.clamp(bit_depth.min_value(), bit_depth.max_value())
}

/// Number of whole samples held by `buffer`.
///
/// Fails with [`MediaError::MalformedBuffer`] when the buffer ends part-way
/// through a sample.
pub fn sample_count(buffer: &[u8], bit_depth: BitDepth) -> Result<usize> {
    let width = bit_depth.bytes_per_sample();
    if buffer.len() % width != 0 {
        return Err(MediaError::MalformedBuffer {
            len: buffer.len(),
            bit_depth: bit_depth.bits(),
        });
    }
    Ok(buffer.len() / width)
}

/// Reads the sample at `index`.
#[inline]
pub fn decode(buffer: &[u8], bit_depth: BitDepth, index: usize) -> i32 {
    match bit_depth {
        BitDepth::Eight => buffer[index] as i32,
        BitDepth::Sixteen => {
            let offset = 2 * index;
            i16::from_le_bytes([buffer[offset], buffer[offset + 1]]) as i32
        }
    }
}

/// Clamps `value` and stores it at `index`. Only that sample's bytes change.
#[inline]
pub fn encode(buffer: &mut [u8], bit_depth: BitDepth, index: usize, value: i32) {
    let value = clamp(bit_depth, value);
    match bit_depth {
        BitDepth::Eight => buffer[index] = value as u8,
        BitDepth::Sixteen => {
            let offset = 2 * index;
            buffer[offset..offset + 2].copy_from_slice(&(value as i16).to_le_bytes());
        }
    }
}

/// Owned PCM byte buffer that is known to hold whole samples only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    data: Vec<u8>,
    bit_depth: BitDepth,
    len: usize,
}

impl SampleBuffer {
    /// Wraps `data`, rejecting a trailing partial sample.
    pub fn new(data: Vec<u8>, bit_depth: BitDepth) -> Result<Self> {
        let len = sample_count(&data, bit_depth)?;
        Ok(Self {
            data,
            bit_depth,
            len,
        })
    }

    /// Buffer of `count` samples at the silent level of `bit_depth`.
    pub fn silent(count: usize, bit_depth: BitDepth) -> Self {
        let byte = match bit_depth {
            BitDepth::Eight => 0x80,
            BitDepth::Sixteen => 0,
        };
        Self {
            data: vec![byte; count * bit_depth.bytes_per_sample()],
            bit_depth,
            len: count,
        }
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> i32 {
        decode(&self.data, self.bit_depth, index)
    }

    pub fn set(&mut self, index: usize, value: i32) {
        encode(&mut self.data, self.bit_depth, index, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        (0..self.len).map(move |index| self.get(index))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_and_clamps_eight_bit_samples() {
        let mut buffer = vec![0u8, 255, 10, 250];
        let decoded: Vec<i32> = (0..4).map(|i| decode(&buffer, BitDepth::Eight, i)).collect();
        assert_eq!(decoded, vec![0, 255, 10, 250]);

        encode(&mut buffer, BitDepth::Eight, 2, 300);
        assert_eq!(decode(&buffer, BitDepth::Eight, 2), 255);
        encode(&mut buffer, BitDepth::Eight, 1, -4);
        assert_eq!(decode(&buffer, BitDepth::Eight, 1), 0);
    }

    #[test]
    fn sixteen_bit_is_little_endian_twos_complement() {
        let mut buffer = vec![0u8; 8];
        encode(&mut buffer, BitDepth::Sixteen, 3, -12345);
        assert_eq!(decode(&buffer, BitDepth::Sixteen, 3), -12345);
        assert_eq!(&buffer[6..8], &(-12345i16).to_le_bytes());
        assert_eq!(&buffer[..6], &[0; 6]);

        let raw = [0x01, 0x80];
        assert_eq!(decode(&raw, BitDepth::Sixteen, 0), -32767);
    }

    #[test]
    fn clamping_saturates_and_is_idempotent() {
        let mut buffer = vec![0u8; 4];
        encode(&mut buffer, BitDepth::Sixteen, 0, 40_000);
        encode(&mut buffer, BitDepth::Sixteen, 1, -40_000);
        assert_eq!(decode(&buffer, BitDepth::Sixteen, 0), 32767);
        assert_eq!(decode(&buffer, BitDepth::Sixteen, 1), -32768);

        let before = buffer.clone();
        let clamped = decode(&buffer, BitDepth::Sixteen, 0);
        encode(&mut buffer, BitDepth::Sixteen, 0, clamped);
        assert_eq!(buffer, before);
    }

    #[test]
    fn every_sixteen_bit_value_survives_a_store() {
        let mut buffer = vec![0u8; 2];
        for value in i16::MIN as i32..=i16::MAX as i32 {
            encode(&mut buffer, BitDepth::Sixteen, 0, value);
            assert_eq!(decode(&buffer, BitDepth::Sixteen, 0), value);
        }
    }

    #[test]
    fn rejects_partial_samples() {
        for len in [1usize, 3, 5, 101] {
            let err = SampleBuffer::new(vec![0; len], BitDepth::Sixteen).unwrap_err();
            match err {
                MediaError::MalformedBuffer { len: got, bit_depth } => {
                    assert_eq!(got, len);
                    assert_eq!(bit_depth, 16);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }

        assert_eq!(sample_count(&[0; 7], BitDepth::Eight).unwrap(), 7);
        assert_eq!(sample_count(&[0; 6], BitDepth::Sixteen).unwrap(), 3);
    }

    #[test]
    fn buffer_writes_touch_only_the_addressed_sample() {
        let mut buffer = SampleBuffer::silent(4, BitDepth::Sixteen);
        buffer.set(1, 1000);
        assert_eq!(buffer.iter().collect::<Vec<_>>(), vec![0, 1000, 0, 0]);
        assert_eq!(buffer.as_bytes().len(), 8);
    }

    #[test]
    fn eight_bit_silence_sits_at_the_midpoint() {
        let buffer = SampleBuffer::silent(3, BitDepth::Eight);
        assert_eq!(buffer.as_bytes(), &[0x80, 0x80, 0x80]);
        assert!(buffer.iter().all(|value| value == BitDepth::Eight.silence()));

        let buffer = SampleBuffer::silent(2, BitDepth::Sixteen);
        assert_eq!(buffer.as_bytes(), &[0; 4]);
    }

    #[test]
    fn parses_bit_depth_from_bits() {
        assert_eq!(BitDepth::try_from(8).unwrap(), BitDepth::Eight);
        assert_eq!(BitDepth::try_from(16).unwrap(), BitDepth::Sixteen);
        assert!(matches!(
            BitDepth::try_from(24),
            Err(MediaError::UnsupportedBitDepth(24))
        ));
    }
}
