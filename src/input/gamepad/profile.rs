//! Gamepad profiles and device-name matching
//!
//! Resolution order for a device name is: custom profiles from the
//! configuration (first match wins), then the built-in table, then the
//! generic fallback. Resolution never fails.

use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use super::{GamepadKey, StickId};
use crate::config::{AxisSource, DeviceMatchDef, KeySource, ProfileDef, ProfileTable, StickMapping};
use crate::error::{ConfigError, Result};

/// Internal (pre-profile) source indices used by the built-in profiles
///
/// Backends report readings in this order; the `gilrs` host maps its
/// buttons and axes onto it.
pub mod layout {
    pub const AXIS_LEFT_X: usize = 0;
    pub const AXIS_LEFT_Y: usize = 1;
    pub const AXIS_RIGHT_X: usize = 2;
    pub const AXIS_RIGHT_Y: usize = 3;
    pub const AXIS_LEFT_Z: usize = 4;
    pub const AXIS_RIGHT_Z: usize = 5;
    pub const AXIS_DPAD_X: usize = 6;
    pub const AXIS_DPAD_Y: usize = 7;

    pub const KEY_SOUTH: usize = 0;
    pub const KEY_EAST: usize = 1;
    pub const KEY_WEST: usize = 2;
    pub const KEY_NORTH: usize = 3;
    pub const KEY_LEFT_SHOULDER: usize = 4;
    pub const KEY_RIGHT_SHOULDER: usize = 5;
    pub const KEY_LEFT_TRIGGER: usize = 6;
    pub const KEY_RIGHT_TRIGGER: usize = 7;
    pub const KEY_SELECT: usize = 8;
    pub const KEY_START: usize = 9;
    pub const KEY_MODE: usize = 10;
    pub const KEY_LEFT_THUMB: usize = 11;
    pub const KEY_RIGHT_THUMB: usize = 12;
    pub const KEY_DPAD_UP: usize = 13;
    pub const KEY_DPAD_DOWN: usize = 14;
    pub const KEY_DPAD_LEFT: usize = 15;
    pub const KEY_DPAD_RIGHT: usize = 16;
}

/// Compiled device-name matcher
#[derive(Debug, Clone)]
pub enum DeviceMatch {
    /// Lowercased substring, compared case-insensitively
    Substring(String),
    Regex(Regex),
    /// Matches every device (generic fallback)
    Any,
}

impl DeviceMatch {
    pub fn from_def(def: &DeviceMatchDef) -> Result<Self> {
        match def {
            DeviceMatchDef::Substring { pattern } => Ok(DeviceMatch::Substring(pattern.to_lowercase())),
            DeviceMatchDef::Regex { pattern } => Regex::new(pattern)
                .map(DeviceMatch::Regex)
                .map_err(|source| ConfigError::Regex {
                    pattern: pattern.clone(),
                    source,
                }),
        }
    }

    pub fn matches(&self, device_name: &str) -> bool {
        match self {
            DeviceMatch::Substring(pattern) => device_name.to_lowercase().contains(pattern.as_str()),
            DeviceMatch::Regex(re) => re.is_match(device_name),
            DeviceMatch::Any => true,
        }
    }
}

/// Where a resolved profile came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileSource {
    Custom,
    BuiltIn,
    Generic,
}

/// Read-only mapping from logical controls to internal source indices
#[derive(Debug, Clone)]
pub struct GamepadProfile {
    pub name: String,
    pub matcher: DeviceMatch,
    pub sticks: BTreeMap<StickId, StickMapping>,
    pub keys: BTreeMap<GamepadKey, KeySource>,
}

impl GamepadProfile {
    pub fn from_def(def: &ProfileDef) -> Result<Self> {
        def.validate()?;
        Ok(Self {
            name: def.name.clone(),
            matcher: DeviceMatch::from_def(&def.device_match)?,
            sticks: def.sticks.clone(),
            keys: def.keys.clone(),
        })
    }

    pub fn matches(&self, device_name: &str) -> bool {
        self.matcher.matches(device_name)
    }

    pub fn stick(&self, id: StickId) -> Option<&StickMapping> {
        self.sticks.get(&id)
    }

    pub fn key(&self, key: GamepadKey) -> Option<&KeySource> {
        self.keys.get(&key)
    }

    /// XInput-style pad: analog triggers on the Z axes, d-pad as keys
    pub fn xinput() -> Self {
        let mut profile = Self::standard("xinput", substrings(&["xbox", "xinput", "x-box"]));
        profile.keys.insert(GamepadKey::L2, axis_key(layout::AXIS_LEFT_Z));
        profile.keys.insert(GamepadKey::R2, axis_key(layout::AXIS_RIGHT_Z));
        profile
    }

    /// DualShock-style pad: digital triggers, d-pad on a hat axis pair
    pub fn dualshock() -> Self {
        let pattern = "(?i)(dualshock|dualsense|playstation|sony|wireless controller)";
        let matcher = Regex::new(pattern).map(DeviceMatch::Regex).unwrap_or(DeviceMatch::Substring("dualshock".into()));
        let mut profile = Self::standard("dualshock", matcher);
        profile.sticks.insert(
            StickId::DPad,
            StickMapping {
                x: AxisSource::Axis { index: layout::AXIS_DPAD_X, invert: false },
                y: AxisSource::Axis { index: layout::AXIS_DPAD_Y, invert: false },
            },
        );
        profile
    }

    /// Fallback for unknown devices
    pub fn generic() -> Self {
        Self::standard("generic", DeviceMatch::Any)
    }

    fn standard(name: &str, matcher: DeviceMatch) -> Self {
        let mut sticks = BTreeMap::new();
        sticks.insert(
            StickId::LeftStick,
            StickMapping {
                x: AxisSource::Axis { index: layout::AXIS_LEFT_X, invert: false },
                y: AxisSource::Axis { index: layout::AXIS_LEFT_Y, invert: false },
            },
        );
        sticks.insert(
            StickId::RightStick,
            StickMapping {
                x: AxisSource::Axis { index: layout::AXIS_RIGHT_X, invert: false },
                y: AxisSource::Axis { index: layout::AXIS_RIGHT_Y, invert: false },
            },
        );
        sticks.insert(
            StickId::DPad,
            StickMapping {
                x: AxisSource::Keys {
                    negative: layout::KEY_DPAD_LEFT,
                    positive: layout::KEY_DPAD_RIGHT,
                },
                y: AxisSource::Keys {
                    negative: layout::KEY_DPAD_DOWN,
                    positive: layout::KEY_DPAD_UP,
                },
            },
        );

        let keys = [
            (GamepadKey::Action1, layout::KEY_SOUTH),
            (GamepadKey::Action2, layout::KEY_EAST),
            (GamepadKey::Action3, layout::KEY_WEST),
            (GamepadKey::Action4, layout::KEY_NORTH),
            (GamepadKey::L1, layout::KEY_LEFT_SHOULDER),
            (GamepadKey::R1, layout::KEY_RIGHT_SHOULDER),
            (GamepadKey::L2, layout::KEY_LEFT_TRIGGER),
            (GamepadKey::R2, layout::KEY_RIGHT_TRIGGER),
            (GamepadKey::L3, layout::KEY_LEFT_THUMB),
            (GamepadKey::R3, layout::KEY_RIGHT_THUMB),
            (GamepadKey::Select, layout::KEY_SELECT),
            (GamepadKey::Start, layout::KEY_START),
        ]
        .into_iter()
        .map(|(key, index)| (key, KeySource::Key { index }))
        .collect();

        Self {
            name: name.to_string(),
            matcher,
            sticks,
            keys,
        }
    }
}

fn substrings(patterns: &[&str]) -> DeviceMatch {
    let alternatives: Vec<String> = patterns.iter().map(|p| regex::escape(p)).collect();
    Regex::new(&format!("(?i){}", alternatives.join("|")))
        .map(DeviceMatch::Regex)
        .unwrap_or_else(|_| DeviceMatch::Substring(patterns.first().copied().unwrap_or_default().to_string()))
}

fn axis_key(index: usize) -> KeySource {
    KeySource::Axis { index, invert: false }
}

/// Custom, built-in and generic profiles in resolution order
#[derive(Debug, Clone)]
pub struct ProfileDatabase {
    custom: Vec<Arc<GamepadProfile>>,
    builtin: Vec<Arc<GamepadProfile>>,
    generic: Arc<GamepadProfile>,
}

impl Default for ProfileDatabase {
    fn default() -> Self {
        Self {
            custom: Vec::new(),
            builtin: vec![Arc::new(GamepadProfile::xinput()), Arc::new(GamepadProfile::dualshock())],
            generic: Arc::new(GamepadProfile::generic()),
        }
    }
}

impl ProfileDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table plus the custom profiles of a validated table
    pub fn from_table(table: &ProfileTable) -> Result<Self> {
        table.validate()?;
        let mut db = Self::default();
        for def in &table.profiles {
            db.add_custom(GamepadProfile::from_def(def)?);
        }
        Ok(db)
    }

    pub fn add_custom(&mut self, profile: GamepadProfile) {
        debug!("Registered custom gamepad profile '{}'", profile.name);
        self.custom.push(Arc::new(profile));
    }

    pub fn resolve(&self, device_name: &str) -> (Arc<GamepadProfile>, ProfileSource) {
        if let Some(p) = self.custom.iter().find(|p| p.matches(device_name)) {
            return (Arc::clone(p), ProfileSource::Custom);
        }
        if let Some(p) = self.builtin.iter().find(|p| p.matches(device_name)) {
            return (Arc::clone(p), ProfileSource::BuiltIn);
        }
        debug!("No profile for \"{}\", using generic layout", device_name);
        (Arc::clone(&self.generic), ProfileSource::Generic)
    }

    pub fn custom_count(&self) -> usize {
        self.custom.len()
    }
}
