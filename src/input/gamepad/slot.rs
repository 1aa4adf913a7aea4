//! Gamepad slots
//!
//! A slot is a fixed logical pad position (gamepad1, gamepad2, ...) that a
//! physical device gets bound to. It remembers the last device it held so
//! the same pad lands in the same slot when it comes back.

use std::sync::Arc;

use glam::Vec2;

use super::host::GamepadHost;
use super::profile::{GamepadProfile, ProfileSource};
use super::{GamepadKey, StickId};
use crate::config::{AxisSource, GamepadManagerConfig, KeySource, StickConfig};
use crate::input::analog::KeyState;
use crate::input::direction::Dir;
use crate::input::stick::StickState;

/// Raw axis with a ready latch
///
/// Readings are ignored until the source has been seen at rest once, which
/// filters out power-on and driver garbage.
#[derive(Debug, Clone, Copy, Default)]
struct AxisReader {
    ready: bool,
    value: f32,
}

impl AxisReader {
    fn read(&mut self, raw: f32, rest_threshold: f32) -> f32 {
        if !self.ready && raw.abs() <= rest_threshold {
            self.ready = true;
        }
        self.value = if self.ready { raw } else { 0.0 };
        self.value
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct KeyReader {
    ready: bool,
    pressed: bool,
}

impl KeyReader {
    fn read(&mut self, raw: bool) -> bool {
        if !self.ready && !raw {
            self.ready = true;
        }
        self.pressed = self.ready && raw;
        self.pressed
    }
}

/// Shaped logical controls of a pad
#[derive(Debug, Clone, Default)]
pub struct PadState {
    sticks: [StickState; StickId::COUNT],
    keys: [KeyState; GamepadKey::COUNT],
}

impl PadState {
    pub fn stick(&self, id: StickId) -> &StickState {
        &self.sticks[id.index()]
    }

    pub(crate) fn stick_mut(&mut self, id: StickId) -> &mut StickState {
        &mut self.sticks[id.index()]
    }

    pub fn key_state(&self, key: GamepadKey) -> &KeyState {
        &self.keys[key.index()]
    }

    pub(crate) fn key_state_mut(&mut self, key: GamepadKey) -> &mut KeyState {
        &mut self.keys[key.index()]
    }

    pub fn key(&self, key: GamepadKey) -> bool {
        self.key_state(key).pressed()
    }

    pub fn key_down(&self, key: GamepadKey) -> bool {
        self.key_state(key).just_pressed()
    }

    pub fn key_up(&self, key: GamepadKey) -> bool {
        self.key_state(key).just_released()
    }

    pub fn key_analog(&self, key: GamepadKey) -> f32 {
        self.key_state(key).analog()
    }

    pub fn stick_vec(&self, id: StickId) -> Vec2 {
        self.stick(id).vector()
    }

    pub fn stick_dir(&self, id: StickId) -> Dir {
        self.stick(id).dir()
    }

    /// Release everything (publishes release edges on the next update)
    pub(crate) fn update_released(&mut self, config: &GamepadManagerConfig) {
        for id in StickId::ALL {
            self.sticks[id.index()].update(stick_config(config, id));
        }
        for key in &mut self.keys {
            key.set_merged(false, 0.0);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub(crate) fn stick_config(config: &GamepadManagerConfig, id: StickId) -> &StickConfig {
    match id {
        StickId::DPad => &config.dpad,
        StickId::LeftStick | StickId::RightStick => &config.stick,
    }
}

/// One position in the gamepad pool
#[derive(Debug, Clone)]
pub struct GamepadSlot {
    index: usize,
    profile: Option<Arc<GamepadProfile>>,
    profile_source: ProfileSource,
    hardware_id: Option<usize>,
    device_name: String,
    ever_used: bool,
    connected: bool,
    activated: bool,
    blocked: bool,
    axes: Vec<AxisReader>,
    keys: Vec<KeyReader>,
    pad: PadState,
}

impl GamepadSlot {
    pub fn new(index: usize, config: &GamepadManagerConfig) -> Self {
        Self {
            index,
            profile: None,
            profile_source: ProfileSource::Generic,
            hardware_id: None,
            device_name: String::new(),
            ever_used: false,
            connected: false,
            activated: false,
            blocked: false,
            axes: vec![AxisReader::default(); config.axis_count],
            keys: vec![KeyReader::default(); config.key_count],
            pad: PadState::default(),
        }
    }

    /// Control ID prefix (gamepad1, gamepad2, ...)
    pub fn control_id_prefix(&self) -> String {
        format!("gamepad{}", self.index + 1)
    }

    pub(crate) fn connect(
        &mut self,
        hardware_id: usize,
        device_name: &str,
        profile: Arc<GamepadProfile>,
        source: ProfileSource,
    ) {
        self.hardware_id = Some(hardware_id);
        self.device_name = device_name.to_string();
        self.profile = Some(profile);
        self.profile_source = source;
        self.ever_used = true;
        self.connected = true;
        self.activated = false;
        self.reset_inputs();
    }

    /// Keep the identity so the device can come back to this slot
    pub(crate) fn disconnect(&mut self) {
        self.connected = false;
        self.activated = false;
        self.reset_inputs();
    }

    pub(crate) fn set_activated(&mut self, activated: bool) {
        self.activated = activated;
        if !activated {
            // Require a return to rest before auto-activating again
            for axis in &mut self.axes {
                axis.ready = false;
            }
            for key in &mut self.keys {
                key.ready = false;
            }
        }
    }

    pub(crate) fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    fn reset_inputs(&mut self) {
        self.axes.iter_mut().for_each(|a| *a = AxisReader::default());
        self.keys.iter_mut().for_each(|k| *k = KeyReader::default());
        self.pad.reset();
    }

    /// Read raw sources; true when a trusted source is clearly in use
    pub(crate) fn sample(&mut self, host: &dyn GamepadHost, config: &GamepadManagerConfig) -> bool {
        let Some(hw) = self.hardware_id.filter(|_| self.connected) else {
            return false;
        };
        let mut touched = false;
        for (i, axis) in self.axes.iter_mut().enumerate() {
            let v = axis.read(host.axis(hw, i), config.rest_threshold);
            touched |= v.abs() >= config.activation_threshold;
        }
        for (i, key) in self.keys.iter_mut().enumerate() {
            touched |= key.read(host.key(hw, i));
        }
        touched
    }

    /// Map sampled sources through the profile into the logical controls
    pub(crate) fn shape(&mut self, dt: f32, config: &GamepadManagerConfig) {
        let profile = match (&self.profile, self.connected && !self.blocked) {
            (Some(p), true) => Arc::clone(p),
            _ => {
                self.pad.update_released(config);
                return;
            }
        };

        for id in StickId::ALL {
            let v = profile
                .stick(id)
                .map(|m| Vec2::new(self.read_axis(m.x), self.read_axis(m.y)))
                .unwrap_or(Vec2::ZERO);
            let stick = self.pad.stick_mut(id);
            stick.apply_vec(v);
            stick.update(stick_config(config, id));
        }

        for key in GamepadKey::ALL {
            match profile.key(key).copied() {
                Some(KeySource::Key { index }) => {
                    let pressed = self.read_key(index);
                    self.pad.key_state_mut(key).update_digital(pressed, dt, &config.keys);
                }
                Some(KeySource::Axis { index, invert }) => {
                    let raw = self.read_raw_axis(index) * if invert { -1.0 } else { 1.0 };
                    self.pad.key_state_mut(key).update_analog(raw, &config.keys);
                }
                None => self.pad.key_state_mut(key).set_merged(false, 0.0),
            }
        }
    }

    fn read_raw_axis(&self, index: usize) -> f32 {
        self.axes.get(index).map(|a| a.value).unwrap_or(0.0)
    }

    fn read_key(&self, index: usize) -> bool {
        self.keys.get(index).map(|k| k.pressed).unwrap_or(false)
    }

    fn read_axis(&self, source: AxisSource) -> f32 {
        match source {
            AxisSource::Axis { index, invert } => {
                let v = self.read_raw_axis(index);
                if invert { -v } else { v }
            }
            AxisSource::Keys { negative, positive } => {
                let mut v = 0.0;
                if self.read_key(positive) {
                    v += 1.0;
                }
                if self.read_key(negative) {
                    v -= 1.0;
                }
                v
            }
            AxisSource::None => 0.0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Connected with a known (non-generic) profile
    pub fn is_supported(&self) -> bool {
        self.connected && self.profile.is_some() && self.profile_source != ProfileSource::Generic
    }

    /// Every raw source has been seen at rest at least once
    pub fn is_ready(&self) -> bool {
        self.connected && self.axes.iter().all(|a| a.ready) && self.keys.iter().all(|k| k.ready)
    }

    pub fn hardware_id(&self) -> Option<usize> {
        self.hardware_id
    }

    /// Name of the device this slot holds, or last held
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub(crate) fn was_used(&self) -> bool {
        self.ever_used
    }

    pub fn profile(&self) -> Option<&GamepadProfile> {
        self.profile.as_deref()
    }

    pub fn profile_name(&self) -> Option<&str> {
        self.profile.as_ref().map(|p| p.name.as_str())
    }

    pub fn profile_source(&self) -> ProfileSource {
        self.profile_source
    }

    /// Shaped controls; neutral while disconnected or blocked
    pub fn pad(&self) -> &PadState {
        &self.pad
    }

    pub fn key(&self, key: GamepadKey) -> bool {
        self.pad.key(key)
    }

    pub fn key_down(&self, key: GamepadKey) -> bool {
        self.pad.key_down(key)
    }

    pub fn key_up(&self, key: GamepadKey) -> bool {
        self.pad.key_up(key)
    }

    pub fn key_analog(&self, key: GamepadKey) -> f32 {
        self.pad.key_analog(key)
    }

    pub fn stick_vec(&self, id: StickId) -> Vec2 {
        self.pad.stick_vec(id)
    }

    pub fn stick_dir(&self, id: StickId) -> Dir {
        self.pad.stick_dir(id)
    }
}
