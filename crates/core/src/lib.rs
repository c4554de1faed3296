//! Core library for the Media Lab toolkit.
//!
//! The crate exposes small, validated building blocks for introductory media
//! computation: pictures made of pixels, sounds made of samples, and the
//! colour and file plumbing around them. Each module owns one concern; the
//! two low-level ones, [`codec`] and [`pixels`], do no validation of their
//! own and rely on [`Sound`] and [`Picture`] to check indices first.

pub mod codec;
pub mod color;
pub mod config;
pub mod error;
pub mod picture;
pub mod pixels;
pub mod session;
pub mod sound;
pub mod wav;

pub use codec::{BitDepth, SampleBuffer};
pub use color::Color;
pub use config::{MediaConfig, PictureConfig, SoundConfig};
pub use error::{MediaError, Result};
pub use picture::{Picture, Pixel, PixelMut};
pub use pixels::{PixelBufferCache, Rgb32Buffer};
pub use session::MediaSession;
pub use sound::{Sample, SampleMut, Sound, SoundMetadata};
pub use wav::{WavData, WavSpec};
