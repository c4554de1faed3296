//! Minimal RIFF/WAVE reader and writer for 8-bit and 16-bit PCM.
//!
//! Sample bytes are moved in and out verbatim: the `data` chunk of a PCM WAV
//! file already uses the layout expected by [`crate::codec`].

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{codec::BitDepth, MediaError, Result};

const WAVE_FORMAT_PCM: u16 = 0x0001;
const WAVE_FORMAT_EXTENSIBLE: u16 = 0xfffe;
const HEADER_LEN: u32 = 44;

/// Stream parameters stored in the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavSpec {
    pub channels: u16,
    pub sample_rate: u32,
    pub bit_depth: BitDepth,
}

impl WavSpec {
    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth.bytes_per_sample() as u16
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// A decoded WAV file: its format and the raw interleaved sample bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavData {
    pub spec: WavSpec,
    pub data: Vec<u8>,
}

fn wav_error<T>(msg: impl Into<String>) -> Result<T> {
    Err(MediaError::Wav(msg.into()))
}

fn read_tag<R: Read>(reader: &mut R) -> io::Result<[u8; 4]> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    Ok(tag)
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    Ok(u32::from_le_bytes(read_tag(reader)?))
}

fn le_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn le_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn skip<R: Read>(reader: &mut R, len: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.by_ref().take(len), &mut io::sink())?;
    if skipped < len {
        return Err(io::ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

// A plain WaveFormat is 16 bytes; WaveFormatEx adds a 2 byte extension
// length, and WaveFormatExtensible a further 22 bytes of extension.
const FMT_CHUNK_LENS: [u32; 3] = [16, 18, 40];

fn parse_fmt(chunk: &[u8]) -> Result<WavSpec> {
    let mut format = le_u16(chunk, 0);
    let channels = le_u16(chunk, 2);
    let sample_rate = le_u32(chunk, 4);
    let block_align = le_u16(chunk, 12);
    let bits_per_sample = le_u16(chunk, 14);

    if format == WAVE_FORMAT_EXTENSIBLE {
        if chunk.len() != 40 {
            return wav_error("extensible fmt chunk is missing its extension");
        }
        // The first two bytes of the sub-format GUID carry the format code.
        format = le_u16(chunk, 24);
    }

    if format != WAVE_FORMAT_PCM {
        return wav_error(format!("unsupported format tag {format:#06x}, only PCM is supported"));
    }
    if channels == 0 {
        return wav_error("channel count must be greater than 0");
    }
    if sample_rate == 0 {
        return wav_error("sample rate must be greater than 0");
    }

    let bit_depth = BitDepth::try_from(bits_per_sample)?;
    let spec = WavSpec {
        channels,
        sample_rate,
        bit_depth,
    };

    if block_align != spec.block_align() {
        return wav_error(format!(
            "block align {block_align} does not match {channels} channel(s) of {bit_depth} samples"
        ));
    }

    Ok(spec)
}

/// Reads a complete WAV stream.
pub fn read_wav<R: Read>(mut reader: R) -> Result<WavData> {
    if &read_tag(&mut reader)? != b"RIFF" {
        return wav_error("missing RIFF header");
    }
    let _riff_len = read_u32(&mut reader)?;
    if &read_tag(&mut reader)? != b"WAVE" {
        return wav_error("RIFF form is not WAVE");
    }

    let mut spec = None;

    loop {
        let tag = match read_tag(&mut reader) {
            Ok(tag) => tag,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                return wav_error("no data chunk found");
            }
            Err(err) => return Err(err.into()),
        };
        let len = read_u32(&mut reader)?;

        match &tag {
            b"fmt " => {
                // Checked before reading so a bogus length never sizes a buffer.
                if !FMT_CHUNK_LENS.contains(&len) {
                    return wav_error(format!("malformed fmt chunk of {len} bytes"));
                }
                let mut chunk = [0u8; 40];
                let chunk = &mut chunk[..len as usize];
                reader.read_exact(chunk)?;
                spec = Some(parse_fmt(chunk)?);
            }
            b"data" => {
                let Some(spec) = spec else {
                    return wav_error("data chunk precedes fmt chunk");
                };

                let mut data = Vec::new();
                reader.by_ref().take(len as u64).read_to_end(&mut data)?;

                let frame = spec.block_align() as usize;
                if data.len() < len as usize {
                    warn!(declared = len, actual = data.len(), "wav data chunk is truncated");
                }
                let whole = data.len() - data.len() % frame;
                if whole != data.len() {
                    warn!(dropped = data.len() - whole, "dropping trailing partial frame");
                    data.truncate(whole);
                }

                debug!(?spec, bytes = data.len(), "read wav data chunk");
                return Ok(WavData { spec, data });
            }
            other => {
                debug!(tag = %String::from_utf8_lossy(other), len, "skipping wav chunk");
                skip(&mut reader, len as u64 + (len % 2) as u64)?;
            }
        }
    }
}

/// Writes a canonical 44 byte header followed by `data`.
pub fn write_wav<W: Write>(mut writer: W, spec: &WavSpec, data: &[u8]) -> Result<()> {
    let data_len = u32::try_from(data.len())
        .ok()
        .filter(|len| len.checked_add(HEADER_LEN).is_some())
        .ok_or_else(|| MediaError::Wav("sample data too large for a wav file".into()))?;
    let pad = data_len % 2;

    writer.write_all(b"RIFF")?;
    writer.write_all(&(HEADER_LEN - 8 + data_len + pad).to_le_bytes())?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_all(&16u32.to_le_bytes())?;
    writer.write_all(&WAVE_FORMAT_PCM.to_le_bytes())?;
    writer.write_all(&spec.channels.to_le_bytes())?;
    writer.write_all(&spec.sample_rate.to_le_bytes())?;
    writer.write_all(&spec.byte_rate().to_le_bytes())?;
    writer.write_all(&spec.block_align().to_le_bytes())?;
    writer.write_all(&spec.bit_depth.bits().to_le_bytes())?;

    writer.write_all(b"data")?;
    writer.write_all(&data_len.to_le_bytes())?;
    writer.write_all(data)?;
    if pad == 1 {
        writer.write_all(&[0])?;
    }
    writer.flush()?;
    Ok(())
}
