//! Turns captured sample blocks into smoothed per-channel magnitudes.
//!
//! Each channel's raw level is the RMS of its samples within the block,
//! normalized to 16-bit full scale. Raw levels then pass through a
//! per-channel exponential filter, `smoothed = alpha * raw + (1 - alpha)
//! * previous`, so one loud block does not spike the radar and one quiet
//! block does not blank it. The filter state lives in the extractor
//! value and starts over whenever the stream does.

use crate::channel::{Channel, ChannelLevels, SampleBlock, CHANNEL_COUNT};
use crate::component::{Component, ComponentError};
use crate::config::ConfigError;
use crate::pipeline::ParamCell;
use crate::source::SourceEvent;
use log::warn;
use std::fmt;
use std::sync::Arc;

/// What the extractor stage hands downstream.
#[derive(Debug, Clone)]
pub enum LevelsEvent {
    /// Smoothed levels for one captured block.
    Levels(ChannelLevels),

    /// The stream restarted; downstream state derived from earlier
    /// blocks is stale and must be discarded.
    Reset,
}

/// Per-channel RMS extraction with exponential smoothing across blocks.
pub struct LevelExtractor {
    params: Arc<ParamCell>,
    smoothed: [f32; CHANNEL_COUNT],
}

impl LevelExtractor {
    /// A fresh extractor with all-zero smoothing state.
    pub fn new(params: Arc<ParamCell>) -> Self {
        Self {
            params,
            smoothed: [0.0; CHANNEL_COUNT],
        }
    }

    /// Drops all smoothing state, as after a device change.
    pub fn reset(&mut self) {
        self.smoothed = [0.0; CHANNEL_COUNT];
    }

    /// RMS of one channel's samples, normalized to full scale.
    fn channel_rms(block: &SampleBlock, channel: Channel) -> f32 {
        let mut sum_squares = 0.0f64;
        let mut count = 0usize;
        for sample in block.channel_samples(channel) {
            let normalized = f64::from(sample) / f64::from(i16::MAX);
            sum_squares += normalized * normalized;
            count += 1;
        }
        if count == 0 {
            0.0
        } else {
            (sum_squares / count as f64).sqrt() as f32
        }
    }

    /// Produces one smoothed level set from a block.
    ///
    /// A short block is measured over whatever frames it has. An empty
    /// block skips measurement entirely and decays the held levels
    /// toward zero at the same filter rate. A block with the wrong
    /// channel count is a configuration error, reported upward rather
    /// than truncated or padded into something plausible.
    pub fn extract(&mut self, block: &SampleBlock) -> Result<ChannelLevels, ConfigError> {
        if block.channels() != CHANNEL_COUNT {
            return Err(ConfigError::ChannelCount {
                expected: CHANNEL_COUNT,
                actual: block.channels(),
            });
        }

        // One parameter snapshot for the whole block.
        let alpha = self.params.load().smoothing_alpha;

        if block.frames() == 0 {
            for level in self.smoothed.iter_mut() {
                *level *= 1.0 - alpha;
            }
        } else {
            for channel in Channel::ALL {
                let raw = Self::channel_rms(block, channel).clamp(0.0, 1.0);
                let prev = self.smoothed[channel.index()];
                self.smoothed[channel.index()] = alpha * raw + (1.0 - alpha) * prev;
            }
        }

        Ok(ChannelLevels::new(self.smoothed, block.captured_at()))
    }
}

impl Component for LevelExtractor {
    type InData = SourceEvent;
    type OutData = LevelsEvent;

    fn convert(&mut self, input: SourceEvent) -> Result<Option<LevelsEvent>, ComponentError> {
        match input {
            SourceEvent::Block(block) => Ok(Some(LevelsEvent::Levels(self.extract(&block)?))),
            SourceEvent::Lost => {
                warn!("audio stream lost, resetting channel smoothing");
                self.reset();
                Ok(Some(LevelsEvent::Reset))
            }
        }
    }
}

impl fmt::Display for LevelExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LevelExtractor")
    }
}
