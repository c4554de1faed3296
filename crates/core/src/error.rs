use std::path::PathBuf;

/// Result alias that carries the custom [`MediaError`] type.
pub type Result<T> = std::result::Result<T, MediaError>;

/// Which coordinate of a pixel access was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// Free-form message for failures that have no dedicated variant.
    #[error("{0}")]
    Message(String),
    /// A caller supplied an argument outside the documented domain.
    #[error("{0}")]
    InvalidInput(String),
    /// A PCM buffer does not hold a whole number of samples.
    #[error("malformed sample buffer: {len} bytes is not a whole number of {bit_depth}-bit samples")]
    MalformedBuffer { len: usize, bit_depth: u16 },
    /// Only 8-bit and 16-bit PCM is supported.
    #[error("unsupported sample size: {0} bits (expected 8 or 16)")]
    UnsupportedBitDepth(u16),
    #[error("you are trying to access the sample at index {index}, but the last valid index is {last}")]
    SampleIndexOutOfRange { index: usize, last: usize },
    #[error("{axis} (= {value}) is less than 0 or bigger than the {extent} (= {max})")]
    PixelOutOfRange {
        axis: Axis,
        value: usize,
        extent: &'static str,
        max: usize,
    },
    /// The RIFF/WAVE container could not be parsed or written.
    #[error("wav: {0}")]
    Wav(String),
    #[error("there is no file at {}", .0.display())]
    MissingFile(PathBuf),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn invalid<T: Into<String>>(msg: T) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub(crate) fn pixel_out_of_range(axis: Axis, value: usize, limit: usize) -> Self {
        let extent = match axis {
            Axis::X => "width",
            Axis::Y => "height",
        };
        Self::PixelOutOfRange {
            axis,
            value,
            extent,
            max: limit.saturating_sub(1),
        }
    }
}
