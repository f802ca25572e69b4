//! Loading, validating, and persisting radar tunables.
//!
//! On disk the configuration is a single RON document, serialized with
//! [serde] and [ron]:
//!
//! ```text
//! (
//!     sample_rate: 44100,
//!     block_size: 1024,
//!     smoothing_alpha: 0.2,
//!     ...
//!     geometry: (fl: 315.0, fr: 45.0, c: 0.0, rl: 225.0, rr: 135.0, sl: 270.0, sr: 90.0),
//! )
//! ```
//!
//! A [`RadarConfig`] is the raw file form; [`Params`] is the validated
//! runtime form the pipeline stages actually read. Validation happens on
//! the way from one to the other, so an out-of-range file can never reach
//! a running pipeline: the swap is rejected and the previous parameters
//! stay in force.

use crate::channel::{Channel, CHANNEL_COUNT};
use crate::geometry::ChannelGeometry;
use serde::{Deserialize, Serialize};
use std::{
    borrow::Cow,
    fmt,
    fs::File,
    io::{Read, Write},
    path::Path,
    time::Duration,
};

/// Per-channel compass bearings in degrees. The LFE channel has no
/// bearing; it never contributes direction.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct GeometryConfig {
    /// Front left bearing.
    pub fl: f32,
    /// Front right bearing.
    pub fr: f32,
    /// Center bearing.
    pub c: f32,
    /// Rear left bearing.
    pub rl: f32,
    /// Rear right bearing.
    pub rr: f32,
    /// Side left bearing.
    pub sl: f32,
    /// Side right bearing.
    pub sr: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            fl: 315.0,
            fr: 45.0,
            c: 0.0,
            rl: 225.0,
            rr: 135.0,
            sl: 270.0,
            sr: 90.0,
        }
    }
}

impl GeometryConfig {
    fn bearings(&self) -> [f32; CHANNEL_COUNT] {
        let mut bearings = [0.0; CHANNEL_COUNT];
        bearings[Channel::FrontLeft.index()] = self.fl;
        bearings[Channel::FrontRight.index()] = self.fr;
        bearings[Channel::Center.index()] = self.c;
        bearings[Channel::RearLeft.index()] = self.rl;
        bearings[Channel::RearRight.index()] = self.rr;
        bearings[Channel::SideLeft.index()] = self.sl;
        bearings[Channel::SideRight.index()] = self.sr;
        bearings
    }
}

/// The full set of radar tunables as stored on disk.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RadarConfig {
    /// Expected capture sample rate in Hz.
    pub sample_rate: u32,
    /// Expected frames per captured block.
    pub block_size: usize,
    /// Weight given to each new block's raw level; the previous smoothed
    /// level keeps the rest. Smaller is steadier but slower to react.
    pub smoothing_alpha: f32,
    /// Multiplier applied to channel levels before blending.
    pub sensitivity: f32,
    /// Multiplier applied to the LFE level's contribution to intensity.
    pub lfe_gain: f32,
    /// Minimum blended intensity for a direction sample to spawn or
    /// reinforce a blip.
    pub activation_threshold: f32,
    /// A new sample within this many degrees of a live blip reinforces it
    /// instead of spawning a second one.
    pub merge_angle_tolerance: f32,
    /// Seconds a fresh blip takes to grow to full presentation.
    pub rise_duration: f32,
    /// Seconds a blip stays at full strength after its last
    /// reinforcement before it starts fading.
    pub hold_duration: f32,
    /// Seconds a fading blip takes to disappear entirely.
    pub fade_duration: f32,
    /// Speaker layout bearings.
    pub geometry: GeometryConfig,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 1024,
            smoothing_alpha: 0.2,
            sensitivity: 1.0,
            lfe_gain: 1.0,
            activation_threshold: 0.05,
            merge_angle_tolerance: 30.0,
            rise_duration: 0.08,
            hold_duration: 0.25,
            fade_duration: 0.5,
            geometry: GeometryConfig::default(),
        }
    }
}

/// Things that can go wrong loading or validating configuration, plus
/// the one structural error the pipeline itself reports through this
/// type: a source declaring the wrong channel count.
#[derive(Debug)]
pub enum ConfigError {
    /// An audio source declared a channel count other than eight.
    ChannelCount {
        /// Channels the pipeline requires.
        expected: usize,
        /// Channels the source declared.
        actual: usize,
    },

    /// A numeric tunable fell outside its allowed range.
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// Returned when io fails while reading or writing the config file.
    IoError(std::io::Error),

    /// Returned when serialization of the config fails.
    RonError(ron::Error),

    /// Returned when deserialization of the config fails.
    RonSpannedError(ron::de::SpannedError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ConfigError as CE;
        let msg = match self {
            CE::ChannelCount { expected, actual } => Cow::from(format!(
                "source declares {} channels, pipeline requires {}",
                actual, expected
            )),
            CE::OutOfRange { field, value } => {
                Cow::from(format!("{} is out of range: {}", field, value))
            }
            CE::IoError(error) => Cow::from(format!("io error: {}", error)),
            CE::RonError(error) => Cow::from(format!("ron error: {}", error)),
            CE::RonSpannedError(error) => Cow::from(format!("ron spanning error: {}", error)),
        };

        write!(f, "{}", msg)
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::IoError(value)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(value: ron::Error) -> Self {
        Self::RonError(value)
    }
}

impl From<ron::de::SpannedError> for ConfigError {
    fn from(value: ron::de::SpannedError) -> Self {
        Self::RonSpannedError(value)
    }
}

impl RadarConfig {
    /// Reads a config from the path provided.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut handle = File::open(path)?;
        let mut raw = String::new();
        handle.read_to_string(&mut raw)?;
        Ok(ron::de::from_str(&raw)?)
    }

    /// Reads a config from the path, writing out (and returning) the
    /// defaults if no file exists yet.
    pub fn from_path_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_path(path)
        } else {
            let config = Self::default();
            config.to_path(path)?;
            Ok(config)
        }
    }

    /// Writes the config to the path provided, pretty-printed.
    pub fn to_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        let mut handle = File::create(path)?;
        handle.write_all(text.as_bytes())?;
        Ok(())
    }

    /// Checks every tunable against its allowed range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(field: &'static str, value: f32, lo: f32, hi: f32) -> Result<(), ConfigError> {
            if !value.is_finite() || value < lo || value > hi {
                return Err(ConfigError::OutOfRange { field, value });
            }
            Ok(())
        }

        if self.sample_rate == 0 {
            return Err(ConfigError::OutOfRange {
                field: "sample_rate",
                value: 0.0,
            });
        }
        if self.block_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "block_size",
                value: 0.0,
            });
        }
        check("smoothing_alpha", self.smoothing_alpha, 0.01, 1.0)?;
        check("sensitivity", self.sensitivity, 0.1, 5.0)?;
        check("lfe_gain", self.lfe_gain, 0.0, 4.0)?;
        check("activation_threshold", self.activation_threshold, 0.001, 1.0)?;
        check("merge_angle_tolerance", self.merge_angle_tolerance, 0.0, 180.0)?;
        check("rise_duration", self.rise_duration, 0.0, 2.0)?;
        check("hold_duration", self.hold_duration, 0.0, 10.0)?;
        check("fade_duration", self.fade_duration, 0.1, 10.0)?;

        let b = self.geometry.bearings();
        for ch in Channel::ALL.iter().filter(|c| c.is_directional()) {
            if !b[ch.index()].is_finite() {
                return Err(ConfigError::OutOfRange {
                    field: "geometry",
                    value: b[ch.index()],
                });
            }
        }
        Ok(())
    }

    /// Validates and converts into the runtime parameter form.
    pub fn to_params(&self) -> Result<Params, ConfigError> {
        self.validate()?;
        Ok(Params {
            smoothing_alpha: self.smoothing_alpha,
            sensitivity: self.sensitivity,
            lfe_gain: self.lfe_gain,
            activation_threshold: self.activation_threshold,
            merge_angle_tolerance: self.merge_angle_tolerance,
            rise: Duration::from_secs_f32(self.rise_duration),
            hold: Duration::from_secs_f32(self.hold_duration),
            fade: Duration::from_secs_f32(self.fade_duration),
            geometry: ChannelGeometry::from_bearings(self.geometry.bearings()),
            sample_rate: self.sample_rate,
            block_size: self.block_size,
        })
    }
}

/// Validated runtime parameters. Pipeline stages take one consistent
/// snapshot of these per block or frame; a hot-reload swaps the whole set
/// between ticks, never partway through one.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// Exponential smoothing weight for new raw levels.
    pub smoothing_alpha: f32,
    /// Level multiplier applied before blending.
    pub sensitivity: f32,
    /// LFE contribution multiplier for intensity.
    pub lfe_gain: f32,
    /// Minimum intensity that spawns or reinforces a blip.
    pub activation_threshold: f32,
    /// Merge window in degrees around a live blip.
    pub merge_angle_tolerance: f32,
    /// Grow-in time for a fresh blip.
    pub rise: Duration,
    /// Time at full strength after the last reinforcement.
    pub hold: Duration,
    /// Fade-out time once the hold expires.
    pub fade: Duration,
    /// Speaker layout as unit vectors.
    pub geometry: ChannelGeometry,
    /// Expected capture sample rate in Hz.
    pub sample_rate: u32,
    /// Expected frames per block.
    pub block_size: usize,
}

impl Default for Params {
    fn default() -> Self {
        RadarConfig::default()
            .to_params()
            .expect("default config must validate")
    }
}
