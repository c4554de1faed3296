use std::{
    f64::consts::PI,
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    codec::{BitDepth, SampleBuffer},
    config::SoundConfig,
    wav::{self, WavSpec},
    MediaError, Result,
};

/// Loudest amplitude accepted by [`Sound::pure_tone`].
pub const MAX_TONE_AMPLITUDE: f64 = i16::MAX as f64;

/// A PCM sound held entirely in memory.
///
/// Samples are addressed by their position in the interleaved buffer, so a
/// stereo sound of `n` frames has `2 * n` samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    file_name: Option<PathBuf>,
    sample_rate: u32,
    channels: u16,
    buffer: SampleBuffer,
}

/// Snapshot of one sample: where it is and what it held when read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub index: usize,
    pub value: i32,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sample at {} with value {}", self.index, self.value)
    }
}

/// Write handle for a single sample of a [`Sound`].
#[derive(Debug)]
pub struct SampleMut<'a> {
    sound: &'a mut Sound,
    index: usize,
}

impl SampleMut<'_> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn value(&self) -> i32 {
        self.sound.buffer.get(self.index)
    }

    /// Stores `value`, clamped to the sound's sample range.
    pub fn set_value(&mut self, value: i32) {
        self.sound.buffer.set(self.index, value);
    }
}

/// Serialisable description of a sound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundMetadata {
    pub file_name: Option<String>,
    pub num_samples: usize,
    pub samples_per_channel: usize,
    pub sample_rate: u32,
    pub sample_size: u16,
    pub channels: u16,
    pub duration_seconds: f64,
}

impl Sound {
    /// Silent 16-bit mono sound of `num_samples` samples.
    pub fn empty(num_samples: usize, sample_rate: u32) -> Result<Self> {
        Self::empty_with_config(num_samples, sample_rate, &SoundConfig::default())
    }

    pub fn empty_with_config(
        num_samples: usize,
        sample_rate: u32,
        config: &SoundConfig,
    ) -> Result<Self> {
        if num_samples == 0 || sample_rate == 0 {
            return Err(MediaError::invalid(
                "empty sound: number of samples and sampling rate must each be greater than 0",
            ));
        }
        if num_samples as f64 / sample_rate as f64 > config.max_seconds {
            return Err(MediaError::invalid(format!(
                "empty sound: created sound must be less than {} seconds",
                config.max_seconds
            )));
        }
        Self::silent(num_samples, sample_rate, config)
    }

    /// Silent sound lasting `seconds`; the sample count is rounded down.
    pub fn empty_by_seconds(seconds: f64, sample_rate: u32) -> Result<Self> {
        Self::empty_by_seconds_with_config(seconds, sample_rate, &SoundConfig::default())
    }

    pub fn empty_by_seconds_with_config(
        seconds: f64,
        sample_rate: u32,
        config: &SoundConfig,
    ) -> Result<Self> {
        if !(seconds > 0.0) || sample_rate == 0 {
            return Err(MediaError::invalid(
                "empty sound: duration and sampling rate must each be greater than 0",
            ));
        }
        if seconds > config.max_seconds {
            return Err(MediaError::invalid(format!(
                "empty sound: created sound must be less than {} seconds",
                config.max_seconds
            )));
        }
        Self::silent((seconds * sample_rate as f64) as usize, sample_rate, config)
    }

    fn silent(num_samples: usize, sample_rate: u32, config: &SoundConfig) -> Result<Self> {
        let bit_depth = BitDepth::try_from(config.sample_size)?;
        Ok(Self {
            file_name: None,
            sample_rate,
            channels: config.channels.max(1),
            buffer: SampleBuffer::silent(num_samples, bit_depth),
        })
    }

    /// Sine wave `amplitude * sin(2π·freq·i / rate)`, truncated toward zero.
    pub fn pure_tone(frequency: f64, amplitude: f64, seconds: f64, sample_rate: u32) -> Result<Self> {
        Self::pure_tone_with_config(frequency, amplitude, seconds, sample_rate, &SoundConfig::default())
    }

    /// Like [`Sound::pure_tone`], with the sample size, channel count and
    /// duration limit taken from `config`. 8-bit tones oscillate around the
    /// unsigned silence level.
    pub fn pure_tone_with_config(
        frequency: f64,
        amplitude: f64,
        seconds: f64,
        sample_rate: u32,
        config: &SoundConfig,
    ) -> Result<Self> {
        if !(frequency >= 0.0) {
            return Err(MediaError::invalid("pure tone: frequency must be nonnegative"));
        }
        if !(0.0..=MAX_TONE_AMPLITUDE).contains(&amplitude) {
            return Err(MediaError::invalid(
                "pure tone: amplitude must be between 0 and 32767 (inclusive)",
            ));
        }
        if !(seconds >= 0.0) {
            return Err(MediaError::invalid("pure tone: duration must be nonnegative"));
        }

        let mut sound = Self::empty_by_seconds_with_config(seconds, sample_rate, config)?;
        let silence = sound.bit_depth().silence();
        let step = frequency * 2.0 * PI / sample_rate as f64;
        for index in 0..sound.len() {
            let value = amplitude * (step * index as f64).sin();
            sound.buffer.set(index, silence + value as i32);
        }
        Ok(sound)
    }

    /// Builds a sound from a raw interleaved PCM buffer.
    pub fn from_pcm(data: Vec<u8>, spec: WavSpec) -> Result<Self> {
        if spec.sample_rate == 0 || spec.channels == 0 {
            return Err(MediaError::invalid(
                "sound: channel count and sampling rate must each be greater than 0",
            ));
        }
        Ok(Self {
            file_name: None,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            buffer: SampleBuffer::new(data, spec.bit_depth)?,
        })
    }

    /// Decodes a WAV stream.
    pub fn from_wav<R: Read>(reader: R) -> Result<Self> {
        let wav = wav::read_wav(reader)?;
        let sound = Self::from_pcm(wav.data, wav.spec)?;
        sound.warn_on_unusual_format(&SoundConfig::default());
        Ok(sound)
    }

    pub fn from_wav_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut sound = Self::from_wav(BufReader::new(file))?;
        sound.file_name = Some(path.to_path_buf());
        info!(path = %path.display(), samples = sound.len(), "loaded sound");
        Ok(sound)
    }

    pub fn write_wav<W: Write>(&self, writer: W) -> Result<()> {
        wav::write_wav(writer, &self.spec(), self.buffer.as_bytes())
    }

    pub fn write_wav_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.write_wav(BufWriter::new(file))?;
        info!(path = %path.display(), samples = self.len(), "wrote sound");
        Ok(())
    }

    fn warn_on_unusual_format(&self, expected: &SoundConfig) {
        if self.channels == 2 {
            warn!("sound is stereo");
        }
        if self.sample_rate != expected.sample_rate {
            warn!(
                expected = expected.sample_rate,
                actual = self.sample_rate,
                "sound does not have the default sample rate"
            );
        }
        if self.sample_size() != expected.sample_size {
            warn!(
                expected = expected.sample_size,
                actual = self.sample_size(),
                "sound does not have the default sample size"
            );
        }
    }

    /// Copy of this sound that is not associated with any file.
    pub fn duplicate(&self) -> Self {
        Self {
            file_name: None,
            ..self.clone()
        }
    }

    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    pub fn spec(&self) -> WavSpec {
        WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bit_depth: self.buffer.bit_depth(),
        }
    }

    /// Number of samples across all channels.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Sample size in bits.
    pub fn sample_size(&self) -> u16 {
        self.buffer.bit_depth().bits()
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.buffer.bit_depth()
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    /// Multiplies the sampling rate by `factor`, as done before playing a
    /// sound faster or slower.
    pub fn set_sampling_rate_factor(&mut self, factor: f64) -> Result<()> {
        let rate = self.sample_rate as f64 * factor;
        if !(rate >= 1.0) || rate > u32::MAX as f64 {
            return Err(MediaError::invalid(format!(
                "sampling rate factor {factor} gives an invalid rate of {rate}"
            )));
        }
        self.sample_rate = rate as u32;
        Ok(())
    }

    /// Multiplies each sample's offset from silence by `factor`, clamping at
    /// the sample range. Returns the number of samples that clipped.
    pub fn scale_volume(&mut self, factor: f64) -> Result<usize> {
        if !factor.is_finite() {
            return Err(MediaError::invalid("volume factor must be a finite number"));
        }
        let silence = self.bit_depth().silence();
        let mut clipped = 0;
        for index in 0..self.len() {
            let offset = (self.buffer.get(index) - silence) as f64 * factor;
            let scaled = silence.saturating_add(offset as i32);
            self.buffer.set(index, scaled);
            if self.buffer.get(index) != scaled {
                clipped += 1;
            }
        }
        Ok(clipped)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if self.is_empty() {
            return Err(MediaError::invalid("sound has no samples"));
        }
        if index >= self.len() {
            return Err(MediaError::SampleIndexOutOfRange {
                index,
                last: self.len() - 1,
            });
        }
        Ok(())
    }

    pub fn sample_value_at(&self, index: usize) -> Result<i32> {
        self.check_index(index)?;
        Ok(self.buffer.get(index))
    }

    /// Stores `value` at `index`, clamped to the sample range.
    pub fn set_sample_value_at(&mut self, index: usize, value: i32) -> Result<()> {
        self.check_index(index)?;
        self.buffer.set(index, value);
        Ok(())
    }

    pub fn sample(&self, index: usize) -> Result<Sample> {
        let value = self.sample_value_at(index)?;
        Ok(Sample { index, value })
    }

    pub fn sample_mut(&mut self, index: usize) -> Result<SampleMut<'_>> {
        self.check_index(index)?;
        Ok(SampleMut { sound: self, index })
    }

    /// All samples in buffer order.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.buffer
            .iter()
            .enumerate()
            .map(|(index, value)| Sample { index, value })
    }

    pub fn metadata(&self) -> SoundMetadata {
        SoundMetadata {
            file_name: self
                .file_name
                .as_ref()
                .map(|path| path.display().to_string()),
            num_samples: self.len(),
            samples_per_channel: self.len() / self.channels as usize,
            sample_rate: self.sample_rate,
            sample_size: self.sample_size(),
            channels: self.channels,
            duration_seconds: self.duration(),
        }
    }
}

impl fmt::Display for Sound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sound")?;
        if let Some(path) = &self.file_name {
            write!(f, " file: {}", path.display())?;
        }
        write!(f, " number of samples: {}", self.len())
    }
}
