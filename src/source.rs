//! The boundary between the radar pipeline and whatever is actually
//! capturing audio.
//!
//! A source is a blocking iterator of [`SourceEvent`]s: it yields whole
//! captured blocks at its own cadence, a [`SourceEvent::Lost`] when the
//! device drops out, and `None` when the stream is finished for good.
//! Designed to be maximally flexible to allow various implementations;
//! the crate ships a synthetic generator ([`crate::dummy_source`]) and a
//! WAV playback source ([`crate::wav_source`]).

use crate::channel::SampleBlock;
use std::{borrow::Cow, fmt};

/// One occurrence on an audio stream.
#[derive(Debug, Clone)]
pub enum SourceEvent {
    /// A whole captured block. Sources never deliver partial frames,
    /// though the final block of a draining stream may be short.
    Block(SampleBlock),

    /// The device dropped out. The stream may resume with later blocks;
    /// downstream smoothing and blip state must start over when it does.
    Lost,
}

/// A blocking producer of [`SourceEvent`]s with declared stream
/// properties. `next()` returning `None` means the stream is over.
pub trait AudioSource: Iterator<Item = SourceEvent> {
    /// Channel count of every block this source yields.
    fn channels(&self) -> usize;

    /// Sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Frames per block the source aims to deliver.
    fn block_size(&self) -> usize;
}

/// Things that can go wrong opening a source, before any block flows.
#[derive(Debug)]
pub enum SourceError {
    /// The backing file or device could not be read.
    IoError(std::io::Error),

    /// A WAV file was not the 16-bit integer PCM this pipeline consumes.
    UnsupportedFormat(String),

    /// Returned when the hound reader fails.
    HoundError(hound::Error),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use SourceError as SE;
        let msg = match self {
            SE::IoError(error) => Cow::from(format!("io error: {}", error)),
            SE::UnsupportedFormat(detail) => Cow::from(format!("unsupported format: {}", detail)),
            SE::HoundError(error) => Cow::from(format!("wav error: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for SourceError {}

impl From<std::io::Error> for SourceError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}

impl From<hound::Error> for SourceError {
    fn from(value: hound::Error) -> Self {
        Self::HoundError(value)
    }
}
