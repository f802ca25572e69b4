//! Planar geometry for the radar: 2D points and the fixed mapping from
//! each speaker channel to a unit direction vector around the listener.
//!
//! Bearings are compass-style degrees: 0 is directly ahead of the
//! listener, increasing clockwise, so front-right sits at 45 and side
//! left at 270.

use crate::channel::{Channel, CHANNEL_COUNT};
use std::fmt::Display;

/// A point (or vector) in the listener's horizontal plane. `x` grows to
/// the listener's right, `y` grows straight ahead.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct Point {
    /// Rightward component.
    pub x: f32,
    /// Forward component.
    pub y: f32,
}

impl Point {
    /// The unit vector pointing along a compass bearing in degrees.
    pub fn from_bearing(degrees: f32) -> Self {
        let rad = degrees.to_radians();
        Point {
            x: rad.sin(),
            y: rad.cos(),
        }
    }

    /// Euclidean length of the vector.
    pub fn magnitude(&self) -> f32 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

    /// The compass bearing of this vector, normalized to `[0, 360)`.
    /// The zero vector maps to bearing 0, straight ahead.
    pub fn bearing(&self) -> f32 {
        let deg = self.x.atan2(self.y).to_degrees();
        deg.rem_euclid(360.0)
    }

    /// Distance between two points.
    pub fn abs_dist(&self, other: &Self) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// Shortest angular distance between two bearings in degrees, in
/// `[0, 180]`. Wraparound-correct: 350 and 10 are 20 degrees apart.
pub fn angular_distance(a: f32, b: f32) -> f32 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Signed shortest rotation from bearing `from` to bearing `to`, in
/// `(-180, 180]` degrees. Positive is clockwise.
pub fn angular_delta(from: f32, to: f32) -> f32 {
    let diff = (to - from).rem_euclid(360.0);
    if diff > 180.0 {
        diff - 360.0
    } else {
        diff
    }
}

/// The fixed mapping from each channel to its unit direction vector
/// around the listener. Exactly one entry per channel; the LFE entry is
/// `None` since a subwoofer has no usable spatial cue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelGeometry {
    directions: [Option<Point>; CHANNEL_COUNT],
}

impl ChannelGeometry {
    /// Builds a geometry from per-channel bearings in degrees. The LFE
    /// bearing is ignored and stored as non-directional.
    pub fn from_bearings(bearings: [f32; CHANNEL_COUNT]) -> Self {
        let mut directions = [None; CHANNEL_COUNT];
        for ch in Channel::ALL {
            if ch.is_directional() {
                directions[ch.index()] = Some(Point::from_bearing(bearings[ch.index()]));
            }
        }
        Self { directions }
    }

    /// The unit direction of a channel, or `None` for the LFE channel.
    pub fn direction(&self, channel: Channel) -> Option<Point> {
        self.directions[channel.index()]
    }
}

impl Default for ChannelGeometry {
    /// The standard 7.1 arrangement: center dead ahead, fronts at 45
    /// degrees off axis, sides square to the listener, rears behind.
    fn default() -> Self {
        let mut bearings = [0.0; CHANNEL_COUNT];
        bearings[Channel::Center.index()] = 0.0;
        bearings[Channel::FrontRight.index()] = 45.0;
        bearings[Channel::SideRight.index()] = 90.0;
        bearings[Channel::RearRight.index()] = 135.0;
        bearings[Channel::RearLeft.index()] = 225.0;
        bearings[Channel::SideLeft.index()] = 270.0;
        bearings[Channel::FrontLeft.index()] = 315.0;
        Self::from_bearings(bearings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearing_round_trips_through_unit_vector() {
        for deg in [0.0, 45.0, 90.0, 135.0, 225.0, 270.0, 315.0] {
            let p = Point::from_bearing(deg);
            assert!((p.magnitude() - 1.0).abs() < 1e-5);
            assert!(
                angular_distance(p.bearing(), deg) < 1e-3,
                "bearing {} came back as {}",
                deg,
                p.bearing()
            );
        }
    }

    #[test]
    fn angular_distance_wraps() {
        assert!((angular_distance(350.0, 10.0) - 20.0).abs() < 1e-5);
        assert!((angular_distance(10.0, 350.0) - 20.0).abs() < 1e-5);
        assert!((angular_distance(0.0, 180.0) - 180.0).abs() < 1e-5);
    }

    #[test]
    fn angular_delta_is_signed() {
        assert!((angular_delta(350.0, 10.0) - 20.0).abs() < 1e-5);
        assert!((angular_delta(10.0, 350.0) + 20.0).abs() < 1e-5);
    }

    #[test]
    fn default_geometry_places_lfe_nowhere() {
        let geom = ChannelGeometry::default();
        assert!(geom.direction(Channel::Lfe).is_none());
        for ch in Channel::ALL.iter().filter(|c| c.is_directional()) {
            let dir = geom.direction(*ch).unwrap();
            assert!((dir.magnitude() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn default_geometry_front_left_bearing() {
        let geom = ChannelGeometry::default();
        let fl = geom.direction(Channel::FrontLeft).unwrap();
        assert!(angular_distance(fl.bearing(), 315.0) < 1e-3);
    }
}
