//! The time-driven lifecycle of radar blips.
//!
//! Direction samples arrive at audio-block rate; the radar draws at
//! frame rate. This module owns the state machine between the two: a
//! sample above the activation threshold either spawns a new blip or
//! reinforces a live one close enough in bearing, and every frame tick
//! ages the live set against the wall clock. A blip grows in over a
//! short rise, holds at full strength while reinforcements keep coming,
//! then fades linearly to nothing and is dropped.
//!
//! Lifecycle per blip:
//!
//! ```text
//! SPAWNING --rise elapsed--> ACTIVE --hold expired--> FADING --fade elapsed--> (removed)
//!                               ^                        |
//!                               +------reinforced--------+
//! ```
//!
//! Removal is permanent; a later event in the same direction is a new
//! blip with a new identity.

use crate::blender::DirectionSample;
use crate::channel::ChannelLevels;
use crate::config::Params;
use crate::geometry::{angular_delta, angular_distance};
use std::fmt;
use std::time::Instant;

/// Where a blip sits in its lifecycle. Removal is not a state: a blip
/// that finishes fading is dropped from the live set the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlipState {
    /// Growing in; presentation ramps from nothing to full.
    Spawning,
    /// At full strength, recently reinforced.
    Active,
    /// Unreinforced past the hold window; presentation is ramping out.
    Fading,
}

/// Intensity band of a blip, judged on the unfaded intensity so a
/// fading loud event still reads as a loud event, only dimmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BlipCategory {
    /// Barely above threshold.
    Low,
    /// Clearly audible.
    Medium,
    /// Loud.
    High,
    /// Dominating the mix.
    Critical,
}

impl BlipCategory {
    /// Fixed bands over intensity in `[0, 1]`.
    pub fn from_intensity(intensity: f32) -> Self {
        if intensity < 0.2 {
            BlipCategory::Low
        } else if intensity < 0.4 {
            BlipCategory::Medium
        } else if intensity < 0.6 {
            BlipCategory::High
        } else {
            BlipCategory::Critical
        }
    }
}

impl fmt::Display for BlipCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlipCategory::Low => "low",
            BlipCategory::Medium => "medium",
            BlipCategory::High => "high",
            BlipCategory::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// One renderable directional event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blip {
    id: u64,
    bearing: f32,
    intensity: f32,
    created_at: Instant,
    reinforced_at: Instant,
    state: BlipState,
    fade: f32,
}

impl Blip {
    /// Stable identity, unique for the lifetime of the manager.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Compass bearing in `[0, 360)` degrees.
    pub fn bearing(&self) -> f32 {
        self.bearing
    }

    /// Unfaded intensity in `[0, 1]`.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// When the blip first spawned.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the blip was last reinforced.
    pub fn reinforced_at(&self) -> Instant {
        self.reinforced_at
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BlipState {
        self.state
    }

    /// Age-based presentation factor in `[0, 1]`.
    pub fn fade(&self) -> f32 {
        self.fade
    }

    /// What to actually draw: intensity dimmed by the fade factor.
    pub fn scaled_intensity(&self) -> f32 {
        self.intensity * self.fade
    }

    /// Intensity band, judged unfaded.
    pub fn category(&self) -> BlipCategory {
        BlipCategory::from_intensity(self.intensity)
    }
}

/// A point-in-time view of the radar for one render frame. Never
/// mutated; each frame replaces the previous snapshot wholesale.
#[derive(Debug, Clone)]
pub struct BlipSnapshot {
    /// Live blips in spawn order.
    pub blips: Vec<Blip>,
    /// The most recent direction estimate, for debug overlays.
    pub direction: Option<DirectionSample>,
    /// The most recent channel levels, for debug overlays.
    pub levels: Option<ChannelLevels>,
    /// When the snapshot was taken.
    pub taken_at: Instant,
}

impl BlipSnapshot {
    /// True when nothing is live.
    pub fn is_empty(&self) -> bool {
        self.blips.is_empty()
    }
}

/// Owns the live blip set. The set is an append-order list pruned each
/// tick, so merge lookups are O(live blips) and snapshot order is
/// deterministic.
#[derive(Debug, Default)]
pub struct BlipManager {
    blips: Vec<Blip>,
    next_id: u64,
}

impl BlipManager {
    /// An empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// The live set, in spawn order.
    pub fn blips(&self) -> &[Blip] {
        &self.blips
    }

    /// Number of live blips.
    pub fn len(&self) -> usize {
        self.blips.len()
    }

    /// True when nothing is live.
    pub fn is_empty(&self) -> bool {
        self.blips.is_empty()
    }

    /// Drops every live blip, as after a device reset.
    pub fn clear(&mut self) {
        self.blips.clear();
    }

    /// Feeds one direction sample into the live set: below the
    /// activation threshold it is ignored; otherwise it reinforces the
    /// nearest live blip within the merge tolerance, or spawns a new one
    /// if none is close enough.
    pub fn observe(&mut self, sample: &DirectionSample, params: &Params) {
        if sample.intensity <= params.activation_threshold {
            return;
        }

        let bearing = sample.bearing();
        let mut nearest: Option<(f32, usize)> = None;
        for (idx, blip) in self.blips.iter().enumerate() {
            let dist = angular_distance(blip.bearing, bearing);
            if dist <= params.merge_angle_tolerance
                && nearest.map_or(true, |(best, _)| dist < best)
            {
                nearest = Some((dist, idx));
            }
        }

        match nearest {
            Some((_, idx)) => {
                let blip = &mut self.blips[idx];
                // Same exponential policy as the channel smoothing, for
                // both loudness and bearing.
                let alpha = params.smoothing_alpha;
                blip.intensity = alpha * sample.intensity + (1.0 - alpha) * blip.intensity;
                blip.bearing = (blip.bearing + alpha * angular_delta(blip.bearing, bearing))
                    .rem_euclid(360.0);
                blip.reinforced_at = sample.at;
                if blip.state == BlipState::Fading {
                    blip.state = BlipState::Active;
                    blip.fade = 1.0;
                }
            }
            None => {
                let state = if params.rise.is_zero() {
                    BlipState::Active
                } else {
                    BlipState::Spawning
                };
                self.blips.push(Blip {
                    id: self.next_id,
                    bearing,
                    intensity: sample.intensity,
                    created_at: sample.at,
                    reinforced_at: sample.at,
                    state,
                    fade: if params.rise.is_zero() { 1.0 } else { 0.0 },
                });
                self.next_id += 1;
            }
        }
    }

    /// Ages the live set against the wall clock and prunes anything that
    /// finished fading. Fade progress is recomputed from timestamps
    /// every tick rather than accumulated, so a stalled-then-resumed
    /// caller neither freezes blips nor replays a backlog.
    pub fn tick(&mut self, now: Instant, params: &Params) {
        for blip in self.blips.iter_mut() {
            if blip.state == BlipState::Spawning {
                let since_spawn = now.saturating_duration_since(blip.created_at);
                if since_spawn < params.rise {
                    blip.fade =
                        (since_spawn.as_secs_f32() / params.rise.as_secs_f32()).clamp(0.0, 1.0);
                    continue;
                }
                blip.state = BlipState::Active;
            }

            let hold_expiry = blip.reinforced_at + params.hold;
            if now > hold_expiry {
                blip.state = BlipState::Fading;
                let fading_for = now.duration_since(hold_expiry).as_secs_f32();
                blip.fade = (1.0 - fading_for / params.fade.as_secs_f32()).clamp(0.0, 1.0);
            } else {
                blip.state = BlipState::Active;
                blip.fade = 1.0;
            }
        }

        // Only a finished fade removes a blip; a rising blip sits at low
        // fade legitimately.
        self.blips
            .retain(|blip| blip.state != BlipState::Fading || blip.fade > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use std::time::Duration;

    fn sample(bearing: f32, intensity: f32, at: Instant) -> DirectionSample {
        let dir = Point::from_bearing(bearing);
        DirectionSample {
            x: dir.x * intensity,
            y: dir.y * intensity,
            intensity,
            at,
        }
    }

    fn ambiguous_sample(intensity: f32, at: Instant) -> DirectionSample {
        DirectionSample {
            x: 0.0,
            y: 0.0,
            intensity,
            at,
        }
    }

    #[test]
    fn below_threshold_never_spawns() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(90.0, params.activation_threshold / 2.0, t0), &params);
        manager.tick(t0, &params);
        assert!(manager.is_empty());
    }

    #[test]
    fn above_threshold_spawns_at_sample_bearing() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(315.0, 0.5, t0), &params);
        assert_eq!(manager.len(), 1);
        assert!(angular_distance(manager.blips()[0].bearing(), 315.0) < 0.5);
        assert_eq!(manager.blips()[0].state(), BlipState::Spawning);
    }

    #[test]
    fn sustained_direction_keeps_a_single_blip() {
        // 50 same-direction samples spaced 10ms apart, ticked every 10ms.
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        for i in 0..50u32 {
            let at = t0 + Duration::from_millis(10 * u64::from(i));
            manager.observe(&sample(135.0, 0.6, at), &params);
            manager.tick(at, &params);
            assert_eq!(manager.len(), 1, "duplicate spawn at step {}", i);
        }
        assert_eq!(manager.blips()[0].state(), BlipState::Active);
        assert_eq!(manager.blips()[0].fade(), 1.0);
    }

    #[test]
    fn unreinforced_blip_is_gone_after_hold_plus_fade() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(45.0, 0.7, t0), &params);
        manager.tick(t0 + params.hold + params.fade, &params);
        assert!(manager.is_empty());
    }

    #[test]
    fn fade_is_linear_between_hold_and_removal() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(45.0, 0.7, t0), &params);
        let halfway = t0 + params.hold + params.fade / 2;
        manager.tick(halfway, &params);

        assert_eq!(manager.len(), 1);
        let blip = manager.blips()[0];
        assert_eq!(blip.state(), BlipState::Fading);
        assert!((blip.fade() - 0.5).abs() < 0.01, "fade was {}", blip.fade());
    }

    #[test]
    fn ambiguous_direction_spawns_at_center() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&ambiguous_sample(0.5, t0), &params);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.blips()[0].bearing(), 0.0);
    }

    #[test]
    fn frozen_clock_changes_nothing() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();
        let s = sample(200.0, 0.5, t0);

        manager.observe(&s, &params);
        manager.tick(t0, &params);
        let first: Vec<Blip> = manager.blips().to_vec();

        for _ in 0..5 {
            manager.observe(&s, &params);
            manager.tick(t0, &params);
        }
        let after: Vec<Blip> = manager.blips().to_vec();

        assert_eq!(first.len(), after.len());
        assert_eq!(first[0].id(), after[0].id());
        assert_eq!(first[0].state(), after[0].state());
        assert_eq!(first[0].fade(), after[0].fade());
    }

    #[test]
    fn merge_tolerance_wraps_around_north() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(350.0, 0.5, t0), &params);
        manager.observe(&sample(5.0, 0.5, t0 + Duration::from_millis(10)), &params);
        assert_eq!(manager.len(), 1, "15 degrees apart across north must merge");

        let bearing = manager.blips()[0].bearing();
        // Nudged clockwise from 350 toward 5, staying normalized.
        assert!(bearing >= 350.0 || bearing < 10.0, "bearing was {}", bearing);
    }

    #[test]
    fn distant_directions_get_their_own_blips() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(90.0, 0.5, t0), &params);
        manager.observe(&sample(270.0, 0.5, t0), &params);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn lifecycles_are_independent() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(90.0, 0.5, t0), &params);
        manager.observe(&sample(270.0, 0.5, t0), &params);

        // Keep reinforcing the first; let the second die of old age.
        let mut at = t0;
        while at < t0 + params.hold + params.fade + Duration::from_millis(50) {
            at += Duration::from_millis(50);
            manager.observe(&sample(90.0, 0.5, at), &params);
            manager.tick(at, &params);
        }

        assert_eq!(manager.len(), 1);
        assert!(angular_distance(manager.blips()[0].bearing(), 90.0) < 5.0);
    }

    #[test]
    fn reinforcement_revives_a_fading_blip() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(180.0, 0.5, t0), &params);
        let mid_fade = t0 + params.hold + params.fade / 2;
        manager.tick(mid_fade, &params);
        assert_eq!(manager.blips()[0].state(), BlipState::Fading);

        manager.observe(&sample(180.0, 0.5, mid_fade), &params);
        assert_eq!(manager.blips()[0].state(), BlipState::Active);
        assert_eq!(manager.blips()[0].fade(), 1.0);
    }

    #[test]
    fn category_judges_unfaded_intensity() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(0.0, 0.7, t0), &params);
        let mid_fade = t0 + params.hold + params.fade / 2;
        manager.tick(mid_fade, &params);

        let blip = manager.blips()[0];
        assert_eq!(blip.category(), BlipCategory::Critical);
        assert!(blip.scaled_intensity() < blip.intensity());
    }

    #[test]
    fn removal_is_permanent_and_new_events_get_new_ids() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(30.0, 0.5, t0), &params);
        let first_id = manager.blips()[0].id();

        let later = t0 + params.hold + params.fade + Duration::from_millis(1);
        manager.tick(later, &params);
        assert!(manager.is_empty());

        manager.observe(&sample(30.0, 0.5, later), &params);
        assert_ne!(manager.blips()[0].id(), first_id);
    }

    #[test]
    fn snapshot_order_is_spawn_order() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        for bearing in [0.0f32, 90.0, 180.0, 270.0] {
            manager.observe(&sample(bearing, 0.5, t0), &params);
        }
        let ids: Vec<u64> = manager.blips().iter().map(Blip::id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn category_bands() {
        assert_eq!(BlipCategory::from_intensity(0.1), BlipCategory::Low);
        assert_eq!(BlipCategory::from_intensity(0.25), BlipCategory::Medium);
        assert_eq!(BlipCategory::from_intensity(0.5), BlipCategory::High);
        assert_eq!(BlipCategory::from_intensity(0.9), BlipCategory::Critical);
    }

    #[test]
    fn clear_empties_the_live_set() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(10.0, 0.5, t0), &params);
        manager.clear();
        assert!(manager.is_empty());
    }

    #[test]
    fn rise_ramps_presentation_in() {
        let params = Params::default();
        let mut manager = BlipManager::new();
        let t0 = Instant::now();

        manager.observe(&sample(60.0, 0.5, t0), &params);
        manager.tick(t0 + params.rise / 2, &params);

        let blip = manager.blips()[0];
        assert_eq!(blip.state(), BlipState::Spawning);
        assert!((blip.fade() - 0.5).abs() < 0.01);

        manager.tick(t0 + params.rise, &params);
        assert_eq!(manager.blips()[0].state(), BlipState::Active);
        assert_eq!(manager.blips()[0].fade(), 1.0);
    }
}
