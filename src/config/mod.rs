//! Configuration management for vcontrol
//!
//! Handles loading, parsing and validating YAML configuration files. Every
//! field carries a serde default, so an empty document is a valid config.
//!
//! Threshold ordering is only checked here, at load time. The shaping code
//! assumes a validated configuration and never re-checks it per tick.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::input::direction::ResetPolicy;
use crate::input::gamepad::{GamepadKey, StickId};

/// Current version of the profile table format
pub const PROFILE_TABLE_VERSION: u32 = 1;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ShaperConfig {
    #[serde(default)]
    pub gamepad: GamepadManagerConfig,
    #[serde(default)]
    pub gestures: GestureConfig,
    /// Named stick configurations for host-driven (non-gamepad) controls
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sticks: HashMap<String, StickConfig>,
    /// Custom gamepad profiles, tried before the built-in table
    #[serde(default)]
    pub profiles: ProfileTable,
}

/// Deadzone, endzone and hysteresis thresholds for one analog signal
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AnalogConfig {
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f32,
    #[serde(default = "default_end_zone")]
    pub end_zone: f32,
    /// Output value just past the deadzone
    #[serde(default)]
    pub range_start: f32,
    #[serde(default = "default_enter_thresh")]
    pub digital_enter_thresh: f32,
    #[serde(default = "default_leave_thresh")]
    pub digital_leave_thresh: f32,
    /// Units per second; `<= 0` means instantaneous
    #[serde(default)]
    pub press_speed: f32,
    /// Units per second; `<= 0` means instantaneous
    #[serde(default)]
    pub release_speed: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<ResponseCurve>,
}

impl Default for AnalogConfig {
    fn default() -> Self {
        Self {
            dead_zone: default_dead_zone(),
            end_zone: default_end_zone(),
            range_start: 0.0,
            digital_enter_thresh: default_enter_thresh(),
            digital_leave_thresh: default_leave_thresh(),
            press_speed: 0.0,
            release_speed: 0.0,
            curve: None,
        }
    }
}

impl AnalogConfig {
    /// Config with the given dead and end zones and default thresholds
    pub fn with_zones(dead_zone: f32, end_zone: f32) -> Self {
        Self {
            dead_zone,
            end_zone,
            ..Self::default()
        }
    }

    /// Check threshold ordering
    pub fn validate(&self, ctx: &str) -> Result<()> {
        if !(0.0..1.0).contains(&self.dead_zone) {
            return Err(ConfigError::invalid(format!(
                "{}: dead_zone {} must be in [0, 1)",
                ctx, self.dead_zone
            )));
        }
        if self.end_zone <= self.dead_zone || self.end_zone > 1.0 {
            return Err(ConfigError::invalid(format!(
                "{}: end_zone {} must be in (dead_zone, 1]",
                ctx, self.end_zone
            )));
        }
        if !(0.0..=1.0).contains(&self.range_start) {
            return Err(ConfigError::invalid(format!(
                "{}: range_start {} must be in [0, 1]",
                ctx, self.range_start
            )));
        }
        if self.digital_leave_thresh >= self.digital_enter_thresh {
            return Err(ConfigError::invalid(format!(
                "{}: digital_leave_thresh {} must be below digital_enter_thresh {}",
                ctx, self.digital_leave_thresh, self.digital_enter_thresh
            )));
        }
        if let Some(curve) = &self.curve {
            curve.validate(ctx)?;
        }
        Ok(())
    }
}

/// Monotonic piecewise-linear response curve over `[0, 1]`
///
/// Points are `(input, output)` pairs sorted by input. The curve is implicitly
/// anchored at `(0, 0)` and `(1, 1)` when those ends are missing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ResponseCurve {
    pub points: Vec<(f32, f32)>,
}

impl ResponseCurve {
    /// Power curve sampled into `segments` linear pieces
    pub fn power(exponent: f32, segments: usize) -> Self {
        let segments = segments.max(1);
        let points = (0..=segments)
            .map(|i| {
                let x = i as f32 / segments as f32;
                (x, x.powf(exponent))
            })
            .collect();
        Self { points }
    }

    /// Evaluate at `t` in `[0, 1]`
    pub fn eval(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        let mut prev = (0.0_f32, 0.0_f32);
        for &(x, y) in &self.points {
            if t <= x {
                let span = x - prev.0;
                if span <= f32::EPSILON {
                    return y;
                }
                return prev.1 + (y - prev.1) * (t - prev.0) / span;
            }
            prev = (x, y);
        }
        let span = 1.0 - prev.0;
        if span <= f32::EPSILON {
            return prev.1;
        }
        prev.1 + (1.0 - prev.1) * (t - prev.0) / span
    }

    fn validate(&self, ctx: &str) -> Result<()> {
        let mut prev = (0.0_f32, 0.0_f32);
        for &(x, y) in &self.points {
            if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
                return Err(ConfigError::invalid(format!(
                    "{}: curve point ({}, {}) outside the unit square",
                    ctx, x, y
                )));
            }
            if x < prev.0 || y < prev.1 {
                return Err(ConfigError::invalid(format!(
                    "{}: curve is not monotonic at ({}, {})",
                    ctx, x, y
                )));
            }
            prev = (x, y);
        }
        Ok(())
    }
}

/// Shape the raw stick vector is clamped to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClampShape {
    #[default]
    Circle,
    Square,
}

/// What a stick publishes as its vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StickMode {
    #[default]
    Analog,
    #[serde(rename = "digital4")]
    Digital4,
    #[serde(rename = "digital8")]
    Digital8,
}

/// Distance metric used when digitizing a stick vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitalDetection {
    /// Plain vector magnitude
    #[default]
    Joystick,
    /// Chebyshev and diagonal projections, for on-screen sticks
    Touch,
}

/// Joystick configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StickConfig {
    #[serde(flatten)]
    pub analog: AnalogConfig,
    #[serde(default)]
    pub clamp_shape: ClampShape,
    /// Apply the deadzone per axis instead of radially
    #[serde(default)]
    pub per_axis_deadzone: bool,
    #[serde(default)]
    pub mode: StickMode,
    /// `0` keeps the natural sector width, `1` widens the cone by half
    #[serde(default = "default_magnet_strength")]
    pub angular_magnet_strength: f32,
    #[serde(default)]
    pub original_dir_reset: ResetPolicy,
    #[serde(default)]
    pub detection: DigitalDetection,
}

impl Default for StickConfig {
    fn default() -> Self {
        Self {
            analog: AnalogConfig::default(),
            clamp_shape: ClampShape::default(),
            per_axis_deadzone: false,
            mode: StickMode::default(),
            angular_magnet_strength: default_magnet_strength(),
            original_dir_reset: ResetPolicy::default(),
            detection: DigitalDetection::default(),
        }
    }
}

impl StickConfig {
    pub fn validate(&self, ctx: &str) -> Result<()> {
        self.analog.validate(ctx)?;
        if !(0.0..=1.0).contains(&self.angular_magnet_strength) {
            return Err(ConfigError::invalid(format!(
                "{}: angular_magnet_strength {} must be in [0, 1]",
                ctx, self.angular_magnet_strength
            )));
        }
        Ok(())
    }
}

/// Axis a scroll or swipe vector is constrained to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollConstraint {
    #[default]
    Free,
    Horizontal,
    Vertical,
    /// Lock to the dominant axis once the drag starts
    Auto,
}

/// Touch gesture thresholds (pixels and seconds)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GestureConfig {
    #[serde(default = "default_tap_max_duration")]
    pub tap_max_duration: f32,
    #[serde(default = "default_tap_move_threshold")]
    pub tap_move_threshold: f32,
    #[serde(default = "default_long_press_min_time")]
    pub long_press_min_time: f32,
    /// Max distance from the press origin that still counts as static
    #[serde(default = "default_tap_move_threshold")]
    pub long_press_move_threshold: f32,
    #[serde(default = "default_multi_tap_gap")]
    pub multi_tap_max_time_gap: f32,
    #[serde(default = "default_tap_pos_threshold")]
    pub tap_pos_threshold: f32,
    #[serde(default = "default_max_tap_count")]
    pub max_tap_count: u32,
    #[serde(default = "default_swipe_seg_len")]
    pub swipe_seg_len: f32,
    #[serde(default = "default_scroll_step_len")]
    pub scroll_step_len: f32,
    #[serde(default)]
    pub scroll_constraint: ScrollConstraint,
    /// Seconds; `0` disables smoothing
    #[serde(default)]
    pub smoothing_time: f32,
    #[serde(default = "default_true")]
    pub clean_taps_only: bool,
    #[serde(default = "default_true")]
    pub end_long_press_when_moved: bool,
    #[serde(default)]
    pub end_long_press_when_swiped: bool,
    #[serde(default)]
    pub swipe_dir_reset: ResetPolicy,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_max_duration: default_tap_max_duration(),
            tap_move_threshold: default_tap_move_threshold(),
            long_press_min_time: default_long_press_min_time(),
            long_press_move_threshold: default_tap_move_threshold(),
            multi_tap_max_time_gap: default_multi_tap_gap(),
            tap_pos_threshold: default_tap_pos_threshold(),
            max_tap_count: default_max_tap_count(),
            swipe_seg_len: default_swipe_seg_len(),
            scroll_step_len: default_scroll_step_len(),
            scroll_constraint: ScrollConstraint::default(),
            smoothing_time: 0.0,
            clean_taps_only: true,
            end_long_press_when_moved: true,
            end_long_press_when_swiped: false,
            swipe_dir_reset: ResetPolicy::default(),
        }
    }
}

impl GestureConfig {
    pub fn validate(&self) -> Result<()> {
        let timings = [
            ("tap_max_duration", self.tap_max_duration),
            ("long_press_min_time", self.long_press_min_time),
            ("multi_tap_max_time_gap", self.multi_tap_max_time_gap),
            ("smoothing_time", self.smoothing_time),
        ];
        for (name, value) in timings {
            if value < 0.0 {
                return Err(ConfigError::invalid(format!(
                    "gestures.{} must not be negative (got {})",
                    name, value
                )));
            }
        }
        let lengths = [
            ("tap_move_threshold", self.tap_move_threshold),
            ("long_press_move_threshold", self.long_press_move_threshold),
            ("tap_pos_threshold", self.tap_pos_threshold),
            ("swipe_seg_len", self.swipe_seg_len),
            ("scroll_step_len", self.scroll_step_len),
        ];
        for (name, value) in lengths {
            if value <= 0.0 {
                return Err(ConfigError::invalid(format!(
                    "gestures.{} must be positive (got {})",
                    name, value
                )));
            }
        }
        if self.max_tap_count == 0 {
            return Err(ConfigError::invalid("gestures.max_tap_count must be at least 1"));
        }
        Ok(())
    }
}

/// Gamepad connection manager configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GamepadManagerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_slots")]
    pub max_slots: usize,
    /// Seconds between device list polls
    #[serde(default = "default_connection_check_interval")]
    pub connection_check_interval: f32,
    /// Activate a pad the first time any of its raw inputs leaves rest
    #[serde(default = "default_true")]
    pub auto_activate: bool,
    /// Raw axis magnitude that counts as "touched" for auto-activation
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f32,
    /// Raw axis magnitude below which a source is considered at rest
    #[serde(default = "default_rest_threshold")]
    pub rest_threshold: f32,
    /// Number of internal axes read per device
    #[serde(default = "default_axis_count")]
    pub axis_count: usize,
    /// Number of internal keys read per device
    #[serde(default = "default_key_count")]
    pub key_count: usize,
    #[serde(default)]
    pub stick: StickConfig,
    #[serde(default = "default_dpad_config")]
    pub dpad: StickConfig,
    #[serde(default)]
    pub keys: AnalogConfig,
}

impl Default for GamepadManagerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_slots: default_max_slots(),
            connection_check_interval: default_connection_check_interval(),
            auto_activate: true,
            activation_threshold: default_activation_threshold(),
            rest_threshold: default_rest_threshold(),
            axis_count: default_axis_count(),
            key_count: default_key_count(),
            stick: StickConfig::default(),
            dpad: default_dpad_config(),
            keys: AnalogConfig::default(),
        }
    }
}

impl GamepadManagerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_slots == 0 {
            return Err(ConfigError::invalid("gamepad.max_slots must be at least 1"));
        }
        if self.connection_check_interval < 0.0 {
            return Err(ConfigError::invalid(
                "gamepad.connection_check_interval must not be negative",
            ));
        }
        if self.rest_threshold >= self.activation_threshold {
            return Err(ConfigError::invalid(format!(
                "gamepad.rest_threshold {} must be below activation_threshold {}",
                self.rest_threshold, self.activation_threshold
            )));
        }
        self.stick.validate("gamepad.stick")?;
        self.dpad.validate("gamepad.dpad")?;
        self.keys.validate("gamepad.keys")?;
        Ok(())
    }
}

/// Versioned table of gamepad profiles
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProfileTable {
    #[serde(default = "default_profile_version")]
    pub version: u32,
    #[serde(default)]
    pub profiles: Vec<ProfileDef>,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            version: PROFILE_TABLE_VERSION,
            profiles: Vec::new(),
        }
    }
}

impl ProfileTable {
    /// Parse a standalone profile table document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let table: ProfileTable = serde_yaml::from_str(yaml)?;
        table.validate()?;
        Ok(table)
    }

    /// Load a standalone profile table file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version != PROFILE_TABLE_VERSION {
            return Err(ConfigError::invalid(format!(
                "unsupported profile table version {} (expected {})",
                self.version, PROFILE_TABLE_VERSION
            )));
        }
        for profile in &self.profiles {
            profile.validate()?;
        }
        Ok(())
    }
}

/// How a profile recognises a device name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceMatchDef {
    /// Case-insensitive substring
    Substring { pattern: String },
    Regex { pattern: String },
}

/// Where a logical stick axis reads from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AxisSource {
    Axis {
        index: usize,
        #[serde(default)]
        invert: bool,
    },
    /// Two digital keys forming a -1/0/+1 axis
    Keys { negative: usize, positive: usize },
    #[default]
    None,
}

/// Where a logical key reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeySource {
    Key { index: usize },
    /// Positive half of an axis (triggers)
    Axis {
        index: usize,
        #[serde(default)]
        invert: bool,
    },
}

/// X/Y sources of one logical stick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StickMapping {
    #[serde(default)]
    pub x: AxisSource,
    #[serde(default)]
    pub y: AxisSource,
}

/// Serialized gamepad profile
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProfileDef {
    pub name: String,
    pub device_match: DeviceMatchDef,
    #[serde(default)]
    pub sticks: BTreeMap<StickId, StickMapping>,
    #[serde(default)]
    pub keys: BTreeMap<GamepadKey, KeySource>,
}

impl ProfileDef {
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::invalid("profile name cannot be empty"));
        }
        match &self.device_match {
            DeviceMatchDef::Substring { pattern } => {
                if pattern.is_empty() {
                    return Err(ConfigError::invalid(format!(
                        "profile '{}' has an empty substring pattern",
                        self.name
                    )));
                }
            }
            DeviceMatchDef::Regex { pattern } => {
                regex::Regex::new(pattern).map_err(|source| ConfigError::Regex {
                    pattern: pattern.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}

impl ShaperConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ShaperConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file with validation
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&contents)?;
        debug!(
            "Loaded config from {} ({} custom profile(s), {} stick(s))",
            path.display(),
            config.profiles.profiles.len(),
            config.sticks.len()
        );
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        self.gamepad.validate()?;
        self.gestures.validate()?;
        for (name, stick) in &self.sticks {
            stick.validate(&format!("sticks.{}", name))?;
        }
        self.profiles.validate()?;
        Ok(())
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_dead_zone() -> f32 { 0.2 }
fn default_end_zone() -> f32 { 0.9 }
fn default_enter_thresh() -> f32 { 0.5 }
fn default_leave_thresh() -> f32 { 0.3 }
fn default_magnet_strength() -> f32 { 0.5 }
fn default_tap_max_duration() -> f32 { 0.3 }
fn default_tap_move_threshold() -> f32 { 16.0 }
fn default_long_press_min_time() -> f32 { 0.5 }
fn default_multi_tap_gap() -> f32 { 0.3 }
fn default_tap_pos_threshold() -> f32 { 32.0 }
fn default_max_tap_count() -> u32 { 2 }
fn default_swipe_seg_len() -> f32 { 20.0 }
fn default_scroll_step_len() -> f32 { 20.0 }
fn default_max_slots() -> usize { 4 }
fn default_connection_check_interval() -> f32 { 1.0 }
fn default_activation_threshold() -> f32 { 0.5 }
fn default_rest_threshold() -> f32 { 0.2 }
fn default_axis_count() -> usize { 8 }
fn default_key_count() -> usize { 20 }
fn default_profile_version() -> u32 { PROFILE_TABLE_VERSION }
fn default_dpad_config() -> StickConfig {
    StickConfig {
        mode: StickMode::Digital8,
        ..StickConfig::default()
    }
}
