//! 8-way compass directions and direction state tracking
//!
//! Angles are in degrees, counter-clockwise from +X (East), with y pointing
//! up. Directions are indexed by octant in the same order, so the angular
//! distance between two directions is `45° × octant_distance`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Compass direction, or none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dir {
    #[default]
    Neutral,
    E,
    NE,
    N,
    NW,
    W,
    SW,
    S,
    SE,
}

impl Dir {
    /// All non-neutral directions in octant order
    pub const ALL: [Dir; 8] = [
        Dir::E,
        Dir::NE,
        Dir::N,
        Dir::NW,
        Dir::W,
        Dir::SW,
        Dir::S,
        Dir::SE,
    ];

    /// Octant index (E = 0, counter-clockwise), `None` for neutral
    pub fn octant(self) -> Option<usize> {
        match self {
            Dir::Neutral => None,
            Dir::E => Some(0),
            Dir::NE => Some(1),
            Dir::N => Some(2),
            Dir::NW => Some(3),
            Dir::W => Some(4),
            Dir::SW => Some(5),
            Dir::S => Some(6),
            Dir::SE => Some(7),
        }
    }

    pub fn from_octant(index: usize) -> Dir {
        Self::ALL[index % 8]
    }

    /// Nearest of the 8 directions to `angle` degrees
    pub fn from_angle(angle: f32) -> Dir {
        let octant = (normalize_angle(angle) / 45.0).round() as usize;
        Self::from_octant(octant)
    }

    /// Nearest of the 4 cardinal directions to `angle` degrees
    pub fn from_angle_four_way(angle: f32) -> Dir {
        let quadrant = (normalize_angle(angle) / 90.0).round() as usize;
        Self::from_octant((quadrant % 4) * 2)
    }

    /// Nearest direction to `v`, neutral for a zero vector
    pub fn from_vector(v: Vec2) -> Dir {
        if v.length_squared() <= f32::EPSILON {
            return Dir::Neutral;
        }
        Self::from_angle(vector_angle(v))
    }

    /// Centre angle of the direction's sector
    pub fn angle(self) -> Option<f32> {
        self.octant().map(|o| o as f32 * 45.0)
    }

    /// Unit vector towards the direction, zero for neutral
    pub fn vector(self) -> Vec2 {
        match self.angle() {
            Some(deg) => {
                let rad = deg.to_radians();
                Vec2::new(rad.cos(), rad.sin())
            }
            None => Vec2::ZERO,
        }
    }

    pub fn opposite(self) -> Dir {
        match self.octant() {
            Some(o) => Self::from_octant(o + 4),
            None => Dir::Neutral,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(self, Dir::NE | Dir::NW | Dir::SW | Dir::SE)
    }

    /// Snap a diagonal to the cardinal nearest to `v`
    pub fn to_four_way(self, v: Vec2) -> Dir {
        if !self.is_diagonal() {
            return self;
        }
        if v.x.abs() >= v.y.abs() {
            if v.x >= 0.0 { Dir::E } else { Dir::W }
        } else if v.y >= 0.0 {
            Dir::N
        } else {
            Dir::S
        }
    }

    /// Number of 45° steps between two directions (0..=4)
    ///
    /// Neutral is treated as infinitely far from everything, including itself.
    pub fn octant_distance(self, other: Dir) -> Option<usize> {
        let (a, b) = (self.octant()?, other.octant()?);
        let diff = a.abs_diff(b);
        Some(diff.min(8 - diff))
    }
}

/// Normalise degrees into `[0, 360)`
pub fn normalize_angle(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 { 0.0 } else { a }
}

/// Smallest absolute difference between two angles, in `[0, 180]`
pub fn angle_delta(a: f32, b: f32) -> f32 {
    let d = normalize_angle(a - b);
    if d > 180.0 { 360.0 - d } else { d }
}

/// Angle of `v` in degrees, `[0, 360)`
pub fn vector_angle(v: Vec2) -> f32 {
    normalize_angle(v.y.atan2(v.x).to_degrees())
}

/// When the "original" direction is allowed to follow the current one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Only after passing through neutral
    #[default]
    OnNeutral,
    #[serde(rename = "on180")]
    On180,
    #[serde(rename = "on135")]
    On135,
    #[serde(rename = "on90")]
    On90,
}

impl ResetPolicy {
    /// Minimum octant distance that resets the original direction
    fn min_octants(self) -> Option<usize> {
        match self {
            ResetPolicy::OnNeutral => None,
            ResetPolicy::On180 => Some(4),
            ResetPolicy::On135 => Some(3),
            ResetPolicy::On90 => Some(2),
        }
    }
}

/// Current/previous direction plus the "original" direction of a hold
///
/// `original` is the direction a hold started in. It stays put while the
/// current direction wanders, unless the reset policy allows it to follow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionState {
    current: Dir,
    previous: Dir,
    original: Dir,
    original_previous: Dir,
}

impl DirectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance one tick
    pub fn set_dir(&mut self, dir: Dir, policy: ResetPolicy) {
        self.previous = self.current;
        self.original_previous = self.original;
        self.current = dir;

        if dir == Dir::Neutral || self.previous == Dir::Neutral {
            self.original = dir;
            return;
        }

        if let (Some(min), Some(dist)) = (policy.min_octants(), self.original.octant_distance(dir)) {
            if dist >= min {
                self.original = dir;
            }
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn current(&self) -> Dir {
        self.current
    }

    pub fn previous(&self) -> Dir {
        self.previous
    }

    pub fn original(&self) -> Dir {
        self.original
    }

    pub fn original_previous(&self) -> Dir {
        self.original_previous
    }

    pub fn is_neutral(&self) -> bool {
        self.current == Dir::Neutral
    }

    pub fn just_changed(&self) -> bool {
        self.current != self.previous
    }

    pub fn just_pressed(&self, dir: Dir) -> bool {
        self.current == dir && self.previous != dir
    }

    pub fn just_released(&self, dir: Dir) -> bool {
        self.previous == dir && self.current != dir
    }

    pub fn just_pressed_original(&self, dir: Dir) -> bool {
        self.original == dir && self.original_previous != dir
    }

    pub fn just_released_original(&self, dir: Dir) -> bool {
        self.original_previous == dir && self.original != dir
    }
}
