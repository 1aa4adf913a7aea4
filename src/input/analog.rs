//! Analog signal shaping (deadzone, endzone, response curve, hysteresis)
//!
//! [`ThresholdShaper`] is a pure view over an [`AnalogConfig`]: the same raw
//! input always produces the same output. [`AxisState`] and [`KeyState`] are
//! the per-tick runtime wrappers that remember the previous digital state the
//! hysteresis needs.

use crate::config::AnalogConfig;

/// Stateless deadzone/endzone/hysteresis transform
#[derive(Debug, Clone, Copy)]
pub struct ThresholdShaper<'a> {
    config: &'a AnalogConfig,
}

impl<'a> ThresholdShaper<'a> {
    pub fn new(config: &'a AnalogConfig) -> Self {
        Self { config }
    }

    /// Shape a raw value into `[-1, 1]`
    ///
    /// `|raw| <= dead_zone` gives 0 and `|raw| >= end_zone` gives `±1`. In
    /// between the magnitude is remapped linearly (or through the response
    /// curve) onto `[range_start, 1]`, keeping the sign.
    pub fn analog(&self, raw: f32) -> f32 {
        let cfg = self.config;
        let magnitude = raw.abs();
        if magnitude <= cfg.dead_zone {
            return 0.0;
        }
        let sign = raw.signum();
        if magnitude >= cfg.end_zone {
            return sign;
        }

        let t = (magnitude - cfg.dead_zone) / (cfg.end_zone - cfg.dead_zone);
        let curved = match &cfg.curve {
            Some(curve) => curve.eval(t),
            None => t,
        };
        sign * (cfg.range_start + curved * (1.0 - cfg.range_start))
    }

    /// Schmitt trigger on `|raw|`
    ///
    /// An "off" signal turns on above `digital_enter_thresh`; an "on" signal
    /// stays on until it drops to `digital_leave_thresh` or below.
    pub fn digital(&self, raw: f32, prev: bool) -> bool {
        let threshold = if prev {
            self.config.digital_leave_thresh
        } else {
            self.config.digital_enter_thresh
        };
        raw.abs() > threshold
    }

    /// Move `current` towards `target` at the configured press/release speed
    pub fn ramp(&self, current: f32, target: f32, dt: f32) -> f32 {
        let speed = if target.abs() > current.abs() {
            self.config.press_speed
        } else {
            self.config.release_speed
        };
        if speed <= 0.0 || dt <= 0.0 {
            return target;
        }
        let step = speed * dt;
        let diff = target - current;
        if diff.abs() <= step {
            target
        } else {
            current + step * diff.signum()
        }
    }
}

/// Runtime state of a single shaped axis
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisState {
    raw: f32,
    analog: f32,
    digital: bool,
    prev_digital: bool,
    /// Sign of the axis while digital is on (+1 / -1), 0 otherwise
    digital_sign: i8,
    prev_digital_sign: i8,
}

impl AxisState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit this tick's raw reading
    pub fn update(&mut self, raw: f32, config: &AnalogConfig) {
        let shaper = ThresholdShaper::new(config);
        self.prev_digital = self.digital;
        self.prev_digital_sign = self.digital_sign;
        self.raw = raw;
        self.analog = shaper.analog(raw);

        // A sign flip passes through "off" first so the enter threshold applies again
        let same_side = self.digital_sign == 0 || raw.signum() as i8 == self.digital_sign;
        self.digital = shaper.digital(raw, self.digital && same_side);
        self.digital_sign = if self.digital { raw.signum() as i8 } else { 0 };
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn raw(&self) -> f32 {
        self.raw
    }

    pub fn analog(&self) -> f32 {
        self.analog
    }

    pub fn digital(&self) -> bool {
        self.digital
    }

    pub fn digital_positive(&self) -> bool {
        self.digital_sign > 0
    }

    pub fn digital_negative(&self) -> bool {
        self.digital_sign < 0
    }

    pub fn just_pressed(&self) -> bool {
        self.digital && !self.prev_digital
    }

    pub fn just_released(&self) -> bool {
        !self.digital && self.prev_digital
    }

    pub fn just_pressed_positive(&self) -> bool {
        self.digital_sign > 0 && self.prev_digital_sign <= 0
    }

    pub fn just_pressed_negative(&self) -> bool {
        self.digital_sign < 0 && self.prev_digital_sign >= 0
    }
}

/// Runtime state of a key with an analog companion value
///
/// Digital sources ramp their analog value using the press/release speeds.
/// Analog sources (triggers) shape their value and digitize it with
/// hysteresis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KeyState {
    pressed: bool,
    prev_pressed: bool,
    analog: f32,
}

impl KeyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit a digital reading
    pub fn update_digital(&mut self, pressed: bool, dt: f32, config: &AnalogConfig) {
        let shaper = ThresholdShaper::new(config);
        self.prev_pressed = self.pressed;
        self.pressed = pressed;
        let target = if pressed { 1.0 } else { 0.0 };
        self.analog = shaper.ramp(self.analog, target, dt);
    }

    /// Commit an analog reading in `[0, 1]`
    pub fn update_analog(&mut self, raw: f32, config: &AnalogConfig) {
        let shaper = ThresholdShaper::new(config);
        self.prev_pressed = self.pressed;
        self.analog = shaper.analog(raw).max(0.0);
        self.pressed = shaper.digital(raw.max(0.0), self.pressed);
    }

    /// Commit an already-merged state (combined pad)
    pub(crate) fn set_merged(&mut self, pressed: bool, analog: f32) {
        self.prev_pressed = self.pressed;
        self.pressed = pressed;
        self.analog = analog;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn pressed(&self) -> bool {
        self.pressed
    }

    pub fn just_pressed(&self) -> bool {
        self.pressed && !self.prev_pressed
    }

    pub fn just_released(&self) -> bool {
        !self.pressed && self.prev_pressed
    }

    pub fn analog(&self) -> f32 {
        self.analog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponseCurve;
    use proptest::prelude::*;

    fn test_config() -> AnalogConfig {
        AnalogConfig {
            dead_zone: 0.1,
            end_zone: 0.9,
            digital_enter_thresh: 0.5,
            digital_leave_thresh: 0.3,
            ..AnalogConfig::default()
        }
    }

    #[test]
    fn test_axis_sequence_scenario() {
        let config = test_config();
        let shaper = ThresholdShaper::new(&config);
        let out: Vec<f32> = [0.0, 0.05, 0.4, 0.95, 0.95]
            .iter()
            .map(|&r| shaper.analog(r))
            .collect();

        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        assert!((out[2] - 0.375).abs() < 1e-5, "got {}", out[2]);
        assert_eq!(out[3], 1.0);
        assert_eq!(out[4], 1.0);
    }

    #[test]
    fn test_sign_preserved_and_range_start() {
        let mut config = test_config();
        config.range_start = 0.2;
        let shaper = ThresholdShaper::new(&config);

        // Just past the deadzone jumps to range_start
        let v = shaper.analog(-0.1001);
        assert!(v < -0.19 && v > -0.21, "got {}", v);
        assert!((shaper.analog(-0.5) + 0.6).abs() < 1e-5);
    }

    #[test]
    fn test_curve_applied_between_zones() {
        let mut config = test_config();
        config.curve = Some(ResponseCurve::power(2.0, 8));
        let shaper = ThresholdShaper::new(&config);
        // t = 0.5 -> 0.25 on a quadratic
        assert!((shaper.analog(0.5) - 0.25).abs() < 1e-3);
    }

    #[test]
    fn test_schmitt_trigger() {
        let config = test_config();
        let shaper = ThresholdShaper::new(&config);

        assert!(!shaper.digital(0.45, false));
        assert!(shaper.digital(0.55, false));
        // Once on, stays on between leave and enter
        assert!(shaper.digital(0.4, true));
        assert!(!shaper.digital(0.3, true));
    }

    #[test]
    fn test_ramp_speeds() {
        let mut config = test_config();
        config.press_speed = 10.0;
        config.release_speed = 5.0;
        let shaper = ThresholdShaper::new(&config);

        assert!((shaper.ramp(0.0, 1.0, 0.05) - 0.5).abs() < 1e-6);
        assert_eq!(shaper.ramp(0.5, 1.0, 0.1), 1.0);
        assert!((shaper.ramp(1.0, 0.0, 0.1) - 0.5).abs() < 1e-6);

        config.press_speed = 0.0;
        let instant = ThresholdShaper::new(&config);
        assert_eq!(instant.ramp(0.0, 1.0, 0.016), 1.0);
    }

    #[test]
    fn test_axis_state_edges_and_sign_flip() {
        let config = test_config();
        let mut axis = AxisState::new();

        axis.update(0.6, &config);
        assert!(axis.just_pressed_positive());
        assert!(axis.digital_positive());

        axis.update(0.35, &config);
        assert!(axis.digital());
        assert!(!axis.just_pressed());

        // Flipping sign must clear the leave-threshold latch
        axis.update(-0.4, &config);
        assert!(!axis.digital());
        assert!(axis.just_released());

        axis.update(-0.6, &config);
        assert!(axis.just_pressed_negative());
    }

    #[test]
    fn test_key_state_digital_ramp() {
        let mut config = test_config();
        config.press_speed = 4.0;
        let mut key = KeyState::new();

        key.update_digital(true, 0.1, &config);
        assert!(key.just_pressed());
        assert!((key.analog() - 0.4).abs() < 1e-6);

        key.update_digital(true, 0.1, &config);
        assert!(!key.just_pressed());
        assert!((key.analog() - 0.8).abs() < 1e-6);

        key.update_digital(false, 0.1, &config);
        assert!(key.just_released());
        assert_eq!(key.analog(), 0.0);
    }

    #[test]
    fn test_key_state_trigger() {
        let config = test_config();
        let mut key = KeyState::new();
        key.update_analog(0.95, &config);
        assert!(key.pressed());
        assert_eq!(key.analog(), 1.0);

        key.update_analog(0.4, &config);
        assert!(key.pressed());

        key.update_analog(-0.8, &config);
        assert!(!key.pressed());
        assert_eq!(key.analog(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_inside_deadzone_is_zero(r in -0.1f32..=0.1f32) {
            let config = test_config();
            prop_assert_eq!(ThresholdShaper::new(&config).analog(r), 0.0);
        }

        #[test]
        fn prop_past_endzone_is_sign(r in 0.9f32..=4.0f32, negative in any::<bool>()) {
            let config = test_config();
            let raw = if negative { -r } else { r };
            prop_assert_eq!(ThresholdShaper::new(&config).analog(raw), raw.signum());
        }

        #[test]
        fn prop_analog_is_bounded_and_monotonic(a in -1.5f32..1.5f32, b in -1.5f32..1.5f32) {
            let config = test_config();
            let shaper = ThresholdShaper::new(&config);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(shaper.analog(lo) <= shaper.analog(hi));
            prop_assert!(shaper.analog(a).abs() <= 1.0);
        }

        #[test]
        fn prop_hysteresis(raws in prop::collection::vec(0.0f32..1.0f32, 1..50)) {
            let config = test_config();
            let shaper = ThresholdShaper::new(&config);
            let mut on = false;
            for r in raws {
                let next = shaper.digital(r, on);
                if on && r > config.digital_leave_thresh {
                    prop_assert!(next);
                }
                if !on && next {
                    prop_assert!(r > config.digital_enter_thresh);
                }
                on = next;
            }
        }
    }
}
