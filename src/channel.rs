//! Core data model for 7.1 capture: the eight fixed channel identifiers,
//! interleaved sample blocks as delivered by an audio source, and the
//! per-channel level sets produced from them.

use std::fmt;
use std::time::Instant;

/// Number of channels in a 7.1 layout. Everything in the pipeline assumes
/// exactly this many; a source declaring anything else is a configuration
/// error, not something to truncate or pad around.
pub const CHANNEL_COUNT: usize = 8;

/// One of the eight speaker positions in a 7.1 layout, in capture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Front left speaker, ahead and to the left of the listener.
    FrontLeft,
    /// Front right speaker.
    FrontRight,
    /// Center speaker, directly ahead.
    Center,
    /// Low-frequency effects channel. Carries no directional cue.
    Lfe,
    /// Rear left speaker.
    RearLeft,
    /// Rear right speaker.
    RearRight,
    /// Side left speaker, directly to the left.
    SideLeft,
    /// Side right speaker, directly to the right.
    SideRight,
}

impl Channel {
    /// All channels in interleave order: FL, FR, C, LFE, RL, RR, SL, SR.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::FrontLeft,
        Channel::FrontRight,
        Channel::Center,
        Channel::Lfe,
        Channel::RearLeft,
        Channel::RearRight,
        Channel::SideLeft,
        Channel::SideRight,
    ];

    /// Position of this channel within an interleaved frame.
    pub fn index(self) -> usize {
        match self {
            Channel::FrontLeft => 0,
            Channel::FrontRight => 1,
            Channel::Center => 2,
            Channel::Lfe => 3,
            Channel::RearLeft => 4,
            Channel::RearRight => 5,
            Channel::SideLeft => 6,
            Channel::SideRight => 7,
        }
    }

    /// Short display name, matching the usual 7.1 channel abbreviations.
    pub fn abbreviation(self) -> &'static str {
        match self {
            Channel::FrontLeft => "FL",
            Channel::FrontRight => "FR",
            Channel::Center => "C",
            Channel::Lfe => "LFE",
            Channel::RearLeft => "RL",
            Channel::RearRight => "RR",
            Channel::SideLeft => "SL",
            Channel::SideRight => "SR",
        }
    }

    /// Whether this channel carries a stable spatial cue. The LFE channel
    /// does not; it contributes to overall intensity only.
    pub fn is_directional(self) -> bool {
        !matches!(self, Channel::Lfe)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

impl std::str::FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Channel::ALL
            .iter()
            .find(|ch| ch.abbreviation() == upper)
            .copied()
            .ok_or_else(|| format!("unknown channel '{}', expected one of FL FR C LFE RL RR SL SR", s))
    }
}

/// A fixed-size block of interleaved signed 16-bit samples as captured
/// from an audio source. Immutable once built; consumed exactly once by
/// the level extractor.
#[derive(Debug, Clone)]
pub struct SampleBlock {
    samples: Vec<i16>,
    channels: usize,
    sample_rate: u32,
    captured_at: Instant,
}

impl SampleBlock {
    /// Wraps a buffer of interleaved samples. `samples.len()` need not be
    /// a full block; a short final block from a draining source is valid.
    pub fn new(samples: Vec<i16>, channels: usize, sample_rate: u32, captured_at: Instant) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
            captured_at,
        }
    }

    /// The interleaved sample data.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of channels the source declared for this block.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Sample rate the block was captured at, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// When the block was captured.
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Number of whole frames in the block.
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Iterates over the samples belonging to one channel, de-interleaved.
    pub fn channel_samples(&self, channel: Channel) -> impl Iterator<Item = i16> + '_ {
        self.samples
            .iter()
            .skip(channel.index())
            .step_by(self.channels.max(1))
            .copied()
    }
}

/// Smoothed magnitudes in `[0, 1]` for all eight channels, derived from
/// one [`SampleBlock`]. Each instance is superseded by the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelLevels {
    levels: [f32; CHANNEL_COUNT],
    captured_at: Instant,
}

impl ChannelLevels {
    /// Builds a level set from an array indexed in interleave order.
    pub fn new(levels: [f32; CHANNEL_COUNT], captured_at: Instant) -> Self {
        Self {
            levels,
            captured_at,
        }
    }

    /// The smoothed magnitude of one channel.
    pub fn level(&self, channel: Channel) -> f32 {
        self.levels[channel.index()]
    }

    /// Capture timestamp of the block these levels were derived from.
    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    /// Iterates over `(channel, level)` pairs in interleave order.
    pub fn iter(&self) -> impl Iterator<Item = (Channel, f32)> + '_ {
        Channel::ALL.iter().map(move |&ch| (ch, self.level(ch)))
    }

    /// The loudest level among the directional channels.
    pub fn peak_directional(&self) -> f32 {
        Channel::ALL
            .iter()
            .filter(|ch| ch.is_directional())
            .map(|&ch| self.level(ch))
            .fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_indices_match_interleave_order() {
        for (i, ch) in Channel::ALL.iter().enumerate() {
            assert_eq!(ch.index(), i);
        }
    }

    #[test]
    fn channel_parses_from_abbreviation() {
        assert_eq!("fl".parse::<Channel>(), Ok(Channel::FrontLeft));
        assert_eq!("LFE".parse::<Channel>(), Ok(Channel::Lfe));
        assert!("XX".parse::<Channel>().is_err());
    }

    #[test]
    fn deinterleaves_channel_samples() {
        // Two frames of an 8 channel block, each sample tagged with its
        // channel index in the tens digit and frame in the ones digit.
        let samples: Vec<i16> = (0..16).map(|i| (i % 8) * 10 + (i / 8)).collect();
        let block = SampleBlock::new(samples, CHANNEL_COUNT, 44100, Instant::now());

        assert_eq!(block.frames(), 2);
        let center: Vec<i16> = block.channel_samples(Channel::Center).collect();
        assert_eq!(center, vec![20, 21]);
        let sr: Vec<i16> = block.channel_samples(Channel::SideRight).collect();
        assert_eq!(sr, vec![70, 71]);
    }

    #[test]
    fn partial_block_keeps_whole_frames() {
        // 12 samples at 8 channels is one whole frame and a remainder.
        let block = SampleBlock::new(vec![0; 12], CHANNEL_COUNT, 44100, Instant::now());
        assert_eq!(block.frames(), 1);
    }

    #[test]
    fn peak_directional_ignores_lfe() {
        let mut levels = [0.0; CHANNEL_COUNT];
        levels[Channel::Lfe.index()] = 0.9;
        levels[Channel::RearLeft.index()] = 0.3;
        let levels = ChannelLevels::new(levels, Instant::now());
        assert_eq!(levels.peak_directional(), 0.3);
    }
}
