//! Collapses a set of per-channel levels into one directional estimate.
//!
//! Every directional channel pushes on a composite vector along its
//! configured bearing, weighted by its level; the LFE channel sits the
//! blend out because a subwoofer's placement says nothing about where a
//! sound came from. The blend is a pure function of its inputs: all
//! temporal stability comes from the smoothing upstream and the blip
//! hysteresis downstream.

use crate::channel::{Channel, ChannelLevels};
use crate::component::{Component, ComponentError};
use crate::config::Params;
use crate::extractor::LevelsEvent;
use crate::geometry::Point;
use crate::pipeline::ParamCell;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Channels at or below this level are treated as noise floor and
/// contribute nothing to the directional sum.
const SIGNIFICANCE_FLOOR: f32 = 0.01;

/// The blended instantaneous direction estimate for one block: a 2D
/// vector whose bearing is the perceived direction and whose length is
/// the directional confidence, plus an overall intensity that registers
/// loudness even when opposing channels cancel the vector out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionSample {
    /// Rightward component of the blended vector.
    pub x: f32,
    /// Forward component of the blended vector.
    pub y: f32,
    /// Overall loudness in `[0, 1]`, independent of directional
    /// agreement between channels.
    pub intensity: f32,
    /// Capture time of the block this sample was derived from.
    pub at: Instant,
}

impl DirectionSample {
    /// The blended vector as a [`Point`].
    pub fn vector(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    /// Compass bearing of the estimate in `[0, 360)` degrees. A
    /// cancelled-out (near-zero) vector reads as 0: loud but ambiguous
    /// events sit at dead ahead rather than vanishing.
    pub fn bearing(&self) -> f32 {
        self.vector().bearing()
    }
}

/// What the blender stage hands downstream: either a sample paired with
/// the levels it came from (kept for debug overlays), or a pass-through
/// stream reset.
#[derive(Debug, Clone)]
pub enum DirectionEvent {
    /// One blended estimate and its source levels.
    Sample {
        /// The blended direction estimate.
        sample: DirectionSample,
        /// The channel levels it was derived from.
        levels: ChannelLevels,
    },

    /// The stream restarted upstream; blip state must be discarded.
    Reset,
}

/// The direction blending stage. Holds no state of its own beyond the
/// shared parameter handle.
pub struct DirectionBlender {
    params: Arc<ParamCell>,
}

impl DirectionBlender {
    /// A blender reading parameters from the given cell.
    pub fn new(params: Arc<ParamCell>) -> Self {
        Self { params }
    }

    /// Blends one level set into a direction sample using one consistent
    /// parameter snapshot.
    pub fn blend(levels: &ChannelLevels, params: &Params) -> DirectionSample {
        let mut vector = Point::default();
        let mut lfe = 0.0f32;
        let mut peak = 0.0f32;

        for (channel, level) in levels.iter() {
            let scaled = (level * params.sensitivity).clamp(0.0, 1.0);

            if channel == Channel::Lfe {
                lfe = scaled;
                continue;
            }

            peak = peak.max(scaled);
            if scaled <= SIGNIFICANCE_FLOOR {
                continue;
            }
            if let Some(direction) = params.geometry.direction(channel) {
                vector.x += direction.x * scaled;
                vector.y += direction.y * scaled;
            }
        }

        // Vector length alone would suppress loud-but-cancelling input
        // (equal side left and side right); the peak and LFE terms keep
        // such events registering as ambiguous instead of absent.
        let intensity = vector
            .magnitude()
            .max(lfe * params.lfe_gain)
            .max(peak)
            .clamp(0.0, 1.0);

        DirectionSample {
            x: vector.x,
            y: vector.y,
            intensity,
            at: levels.captured_at(),
        }
    }
}

impl Component for DirectionBlender {
    type InData = LevelsEvent;
    type OutData = DirectionEvent;

    fn convert(&mut self, input: LevelsEvent) -> Result<Option<DirectionEvent>, ComponentError> {
        match input {
            LevelsEvent::Levels(levels) => {
                let params = self.params.load();
                let sample = Self::blend(&levels, &params);
                Ok(Some(DirectionEvent::Sample { sample, levels }))
            }
            LevelsEvent::Reset => Ok(Some(DirectionEvent::Reset)),
        }
    }
}

impl fmt::Display for DirectionBlender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DirectionBlender")
    }
}
