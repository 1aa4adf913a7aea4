//! 2D joystick state machine
//!
//! A [`StickState`] collects any number of vector or digital-direction inputs
//! during a tick, then [`StickState::update`] merges them, clamps them to the
//! configured shape, shapes the magnitude through the deadzone, and digitizes
//! the result into 4-way and 8-way directions.
//!
//! Digitization uses two thresholds. From neutral a direction engages above
//! the midpoint of the enter and leave thresholds. Once engaged it holds
//! until the distance drops to the leave threshold, and only re-aims when the
//! distance reaches the full enter threshold. On top of that an angular magnet
//! keeps the previous direction while the vector stays inside a cone around
//! it, so a thumb resting on a diagonal boundary doesn't flicker.

pub mod normalize;

use glam::Vec2;

use crate::config::{StickConfig, StickMode};
use crate::input::analog::ThresholdShaper;
use crate::input::direction::{angle_delta, vector_angle, Dir, DirectionState};
use normalize::{clamp_to_shape, digital_distance, DeltaAccumulator};

/// Sector half-width of an 8-way direction
const EIGHT_WAY_HALF_SECTOR: f32 = 22.5;
/// Sector half-width of a 4-way direction
const FOUR_WAY_HALF_SECTOR: f32 = 45.0;

/// Runtime state of one joystick control
#[derive(Debug, Clone, Default)]
pub struct StickState {
    pending: DeltaAccumulator,
    raw_vec: Vec2,
    clamped_vec: Vec2,
    analog_vec: Vec2,
    vec: Vec2,
    angle: f32,
    safe_angle: f32,
    tilt: f32,
    dir4: DirectionState,
    dir8: DirectionState,
    dir: DirectionState,
}

impl StickState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a raw analog vector for this tick
    pub fn apply_vec(&mut self, v: Vec2) {
        self.pending.apply(v);
    }

    /// Stage a digital direction request for this tick
    pub fn apply_dir(&mut self, dir: Dir) {
        if dir != Dir::Neutral {
            self.pending.apply(dir.vector());
        }
    }

    /// Stage four digital keys (d-pad, WASD)
    pub fn apply_digital(&mut self, up: bool, down: bool, left: bool, right: bool) {
        if up {
            self.pending.apply(Vec2::Y);
        }
        if down {
            self.pending.apply(Vec2::NEG_Y);
        }
        if left {
            self.pending.apply(Vec2::NEG_X);
        }
        if right {
            self.pending.apply(Vec2::X);
        }
    }

    /// Commit everything staged since the last update
    pub fn update(&mut self, config: &StickConfig) {
        let raw = self.pending.take();
        self.raw_vec = raw;

        let clamped = clamp_to_shape(raw, config.clamp_shape);
        self.clamped_vec = clamped;
        self.analog_vec = clamp_to_shape(Self::shape(clamped, config), config.clamp_shape);

        if clamped.length_squared() > f32::EPSILON {
            self.safe_angle = vector_angle(clamped);
        }

        let dir4 = Self::digitize(clamped, self.dir4.current(), config, false);
        let dir8 = Self::digitize(clamped, self.dir8.current(), config, true);
        let policy = config.original_dir_reset;
        self.dir4.set_dir(dir4, policy);
        self.dir8.set_dir(dir8, policy);

        match config.mode {
            StickMode::Analog => {
                self.vec = self.analog_vec;
                self.tilt = self.analog_vec.length().min(1.0);
                self.angle = self.safe_angle;
                self.dir.set_dir(dir8, policy);
            }
            StickMode::Digital4 | StickMode::Digital8 => {
                let dir = if config.mode == StickMode::Digital4 { dir4 } else { dir8 };
                self.vec = dir.vector();
                self.tilt = if dir == Dir::Neutral { 0.0 } else { 1.0 };
                if let Some(angle) = dir.angle() {
                    self.safe_angle = angle;
                }
                self.angle = self.safe_angle;
                self.dir.set_dir(dir, policy);
            }
        }
    }

    /// Clear all state, including anything staged (used on (re)connection)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn shape(clamped: Vec2, config: &StickConfig) -> Vec2 {
        let shaper = ThresholdShaper::new(&config.analog);
        if config.per_axis_deadzone {
            return Vec2::new(shaper.analog(clamped.x), shaper.analog(clamped.y));
        }
        let magnitude = clamped.length();
        if magnitude <= f32::EPSILON {
            return Vec2::ZERO;
        }
        clamped * (shaper.analog(magnitude) / magnitude)
    }

    fn digitize(v: Vec2, current: Dir, config: &StickConfig, eight_way: bool) -> Dir {
        let analog = &config.analog;
        let distance = digital_distance(v, config.detection, eight_way);

        if current == Dir::Neutral {
            let engage = (analog.digital_enter_thresh + analog.digital_leave_thresh) * 0.5;
            if distance <= engage {
                return Dir::Neutral;
            }
        } else {
            if distance <= analog.digital_leave_thresh {
                return Dir::Neutral;
            }
            if distance < analog.digital_enter_thresh {
                return current;
            }
        }

        let angle = vector_angle(v);
        let (candidate, half_sector) = if eight_way {
            (Dir::from_angle(angle), EIGHT_WAY_HALF_SECTOR)
        } else {
            (Dir::from_angle_four_way(angle), FOUR_WAY_HALF_SECTOR)
        };

        if let Some(current_angle) = current.angle() {
            if candidate != current {
                let cone = half_sector * (1.0 + 0.5 * config.angular_magnet_strength);
                if angle_delta(angle, current_angle) < cone {
                    return current;
                }
            }
        }
        candidate
    }

    /// Published vector (shaped analog or digital unit vector)
    pub fn vector(&self) -> Vec2 {
        self.vec
    }

    /// Published angle in degrees; frozen while the stick is centred
    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    /// Merged input before clamping
    pub fn raw_vec(&self) -> Vec2 {
        self.raw_vec
    }

    pub fn clamped_vec(&self) -> Vec2 {
        self.clamped_vec
    }

    /// Deadzone-shaped vector regardless of mode
    pub fn analog_vec(&self) -> Vec2 {
        self.analog_vec
    }

    pub fn digital4(&self) -> Dir {
        self.dir4.current()
    }

    pub fn digital8(&self) -> Dir {
        self.dir8.current()
    }

    /// Direction selected by the stick mode
    pub fn dir(&self) -> Dir {
        self.dir.current()
    }

    pub fn dir_state(&self) -> &DirectionState {
        &self.dir
    }

    pub fn dir4_state(&self) -> &DirectionState {
        &self.dir4
    }

    pub fn dir8_state(&self) -> &DirectionState {
        &self.dir8
    }

    pub fn just_pressed_dir(&self, dir: Dir) -> bool {
        self.dir.just_pressed(dir)
    }

    pub fn just_released_dir(&self, dir: Dir) -> bool {
        self.dir.just_released(dir)
    }

    pub fn is_neutral(&self) -> bool {
        self.dir.is_neutral() && self.vec == Vec2::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalogConfig, ClampShape, DigitalDetection};

    fn test_config() -> StickConfig {
        StickConfig {
            analog: AnalogConfig {
                dead_zone: 0.1,
                end_zone: 0.9,
                digital_enter_thresh: 0.5,
                digital_leave_thresh: 0.3,
                ..AnalogConfig::default()
            },
            ..StickConfig::default()
        }
    }

    fn feed(stick: &mut StickState, config: &StickConfig, v: Vec2) {
        stick.apply_vec(v);
        stick.update(config);
    }

    fn polar(deg: f32, len: f32) -> Vec2 {
        let r = deg.to_radians();
        Vec2::new(r.cos(), r.sin()) * len
    }

    #[test]
    fn test_circle_clamp_and_shaping() {
        let config = test_config();
        let mut stick = StickState::new();
        feed(&mut stick, &config, Vec2::new(1.0, 1.0));

        assert!((stick.clamped_vec().length() - 1.0).abs() < 1e-5);
        assert!((stick.tilt() - 1.0).abs() < 1e-5);
        assert!((stick.angle() - 45.0).abs() < 1e-3);
        assert_eq!(stick.digital8(), Dir::NE);
    }

    #[test]
    fn test_square_clamp_keeps_corners() {
        let mut config = test_config();
        config.clamp_shape = ClampShape::Square;
        let mut stick = StickState::new();
        feed(&mut stick, &config, Vec2::new(2.0, 2.0));
        assert_eq!(stick.clamped_vec(), Vec2::new(1.0, 1.0));
        assert!(stick.vector().length() <= 1.0 + 1e-5);
    }

    #[test]
    fn test_per_axis_deadzone() {
        let mut config = test_config();
        config.per_axis_deadzone = true;
        let mut stick = StickState::new();
        feed(&mut stick, &config, Vec2::new(0.05, 0.8));
        assert_eq!(stick.analog_vec().x, 0.0);
        assert!(stick.analog_vec().y > 0.8);
    }

    #[test]
    fn test_double_threshold_hysteresis() {
        let config = test_config();
        let mut stick = StickState::new();

        // Engage threshold from neutral is (0.5 + 0.3) / 2 = 0.4
        feed(&mut stick, &config, Vec2::new(0.38, 0.0));
        assert_eq!(stick.digital8(), Dir::Neutral);

        feed(&mut stick, &config, Vec2::new(0.42, 0.0));
        assert_eq!(stick.digital8(), Dir::E);
        assert!(stick.just_pressed_dir(Dir::E));

        // Between leave and enter: stays engaged, does not re-aim
        feed(&mut stick, &config, polar(90.0, 0.45));
        assert_eq!(stick.digital8(), Dir::E);

        // Down to the leave threshold: released
        feed(&mut stick, &config, Vec2::new(0.29, 0.0));
        assert_eq!(stick.digital8(), Dir::Neutral);
        assert!(stick.just_released_dir(Dir::E));
    }

    #[test]
    fn test_angular_magnet_holds_previous_direction() {
        let mut config = test_config();
        config.angular_magnet_strength = 0.5;
        let mut stick = StickState::new();

        feed(&mut stick, &config, polar(0.0, 1.0));
        assert_eq!(stick.digital8(), Dir::E);

        // 26° is past the 22.5° sector edge but inside the 28.125° cone
        feed(&mut stick, &config, polar(26.0, 1.0));
        assert_eq!(stick.digital8(), Dir::E);

        feed(&mut stick, &config, polar(30.0, 1.0));
        assert_eq!(stick.digital8(), Dir::NE);
    }

    #[test]
    fn test_no_magnet_with_zero_strength() {
        let mut config = test_config();
        config.angular_magnet_strength = 0.0;
        let mut stick = StickState::new();

        feed(&mut stick, &config, polar(0.0, 1.0));
        feed(&mut stick, &config, polar(26.0, 1.0));
        assert_eq!(stick.digital8(), Dir::NE);
        assert_eq!(stick.digital4(), Dir::E);
    }

    #[test]
    fn test_digital_mode_publishes_unit_vector() {
        let mut config = test_config();
        config.mode = StickMode::Digital4;
        let mut stick = StickState::new();

        feed(&mut stick, &config, polar(80.0, 0.7));
        assert_eq!(stick.dir(), Dir::N);
        assert!((stick.vector() - Vec2::Y).length() < 1e-5);
        assert_eq!(stick.tilt(), 1.0);
        assert!((stick.angle() - 90.0).abs() < 1e-5);

        feed(&mut stick, &config, Vec2::ZERO);
        assert_eq!(stick.vector(), Vec2::ZERO);
        assert_eq!(stick.tilt(), 0.0);
    }

    #[test]
    fn test_zero_vector_freezes_angle() {
        let config = test_config();
        let mut stick = StickState::new();
        feed(&mut stick, &config, polar(135.0, 0.8));
        feed(&mut stick, &config, Vec2::ZERO);
        assert!((stick.angle() - 135.0).abs() < 1e-3);
        assert_eq!(stick.tilt(), 0.0);
    }

    #[test]
    fn test_digital_sources_do_not_average() {
        let config = test_config();
        let mut stick = StickState::new();
        stick.apply_dir(Dir::E);
        stick.apply_digital(false, false, false, true);
        stick.apply_vec(Vec2::new(0.2, 0.0));
        stick.update(&config);
        assert_eq!(stick.raw_vec(), Vec2::new(1.0, 0.0));

        // Nothing staged next tick: back to rest
        stick.update(&config);
        assert_eq!(stick.raw_vec(), Vec2::ZERO);
        assert!(stick.is_neutral());
    }

    #[test]
    fn test_touch_detection_uses_chebyshev() {
        let mut config = test_config();
        config.detection = DigitalDetection::Touch;
        let mut stick = StickState::new();

        // Length 0.42 but Chebyshev 0.3: below the 0.4 engage threshold
        feed(&mut stick, &config, Vec2::new(0.3, 0.29));
        assert_eq!(stick.digital4(), Dir::Neutral);
        // Diagonal projection 0.417 engages 8-way
        assert_eq!(stick.digital8(), Dir::NE);
    }

    #[test]
    fn test_reset_clears_staged_input() {
        let config = test_config();
        let mut stick = StickState::new();
        feed(&mut stick, &config, Vec2::X);
        stick.apply_vec(Vec2::Y);
        stick.reset();
        stick.update(&config);
        assert_eq!(stick.digital8(), Dir::Neutral);
        assert!(!stick.just_released_dir(Dir::E));
    }
}
