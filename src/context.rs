//! Runtime owner for one input pipeline
//!
//! Everything that changes per tick lives here and is passed around
//! explicitly. Several contexts can coexist in one process.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::binding::{BindingOutput, HostSnapshot, InputBinding, SyncView};
use crate::config::{GestureConfig, ShaperConfig, StickConfig};
use crate::error::Result;
use crate::input::gamepad::{GamepadHost, GamepadManager, ProfileDatabase};
use crate::input::stick::StickState;
use crate::input::touch::{Rect, TouchEvent, TouchSurface};
use crate::pool::Handle;

/// Zones a surface can hold unless configured otherwise
pub const DEFAULT_MAX_ZONES: usize = 16;

#[derive(Debug)]
pub struct InputContext {
    gamepads: GamepadManager,
    touch: TouchSurface,
    host: HostSnapshot,
    bindings: Vec<InputBinding>,
    output: BindingOutput,
    gestures: GestureConfig,
    sticks: HashMap<String, StickConfig>,
    tick: u64,
}

impl InputContext {
    /// Build from a validated configuration; custom profiles are compiled here
    pub fn new(config: &ShaperConfig) -> Result<Self> {
        let profiles = ProfileDatabase::from_table(&config.profiles)?;
        Ok(Self::with_profiles(config, profiles))
    }

    pub fn with_profiles(config: &ShaperConfig, profiles: ProfileDatabase) -> Self {
        debug!(
            "Input context: {} gamepad slot(s), {} custom profile(s)",
            config.gamepad.max_slots,
            profiles.custom_count()
        );
        Self {
            gamepads: GamepadManager::new(config.gamepad.clone(), profiles),
            touch: TouchSurface::new(DEFAULT_MAX_ZONES),
            host: HostSnapshot::default(),
            bindings: Vec::new(),
            output: BindingOutput::default(),
            gestures: config.gestures.clone(),
            sticks: config.sticks.clone(),
            tick: 0,
        }
    }

    /// Add a gesture zone; `None` config uses the configured gestures
    pub fn add_zone(&mut self, name: impl Into<String>, rect: Option<Rect>, config: Option<GestureConfig>) -> Option<Handle> {
        let config = config.unwrap_or_else(|| self.gestures.clone());
        self.touch.add_zone(name, rect, config)
    }

    pub fn add_binding(&mut self, mut binding: InputBinding) {
        binding.resolve_presets(&self.sticks);
        self.bindings.push(binding);
    }

    pub fn clear_bindings(&mut self) {
        self.bindings.clear();
        self.output.clear();
    }

    /// Stage a raw touch event for the next update
    pub fn handle_touch(&mut self, event: TouchEvent) -> Option<Handle> {
        let zone = self.touch.handle_event(event);
        if zone.is_none() {
            trace!("Touch event {:?} not routed", event);
        }
        zone
    }

    pub fn set_host_snapshot(&mut self, snapshot: HostSnapshot) {
        self.host = snapshot;
    }

    pub fn host_snapshot_mut(&mut self) -> &mut HostSnapshot {
        &mut self.host
    }

    /// Advance one tick: gamepads, then touch, then bindings
    pub fn update(&mut self, dt: f32, host: &mut dyn GamepadHost) {
        self.gamepads.update(dt, host);

        for binding in &mut self.bindings {
            binding.stage_touch(&self.host, &mut self.touch);
        }
        self.touch.update(dt);

        self.output.clear();
        let view = SyncView {
            gamepads: &self.gamepads,
            touch: &self.touch,
            host: &self.host,
        };
        for binding in &mut self.bindings {
            binding.sync(&view, &mut self.output);
        }
        self.tick += 1;
    }

    /// Drop all transient state; connections and bindings stay
    pub fn reset(&mut self) {
        self.touch.reset();
        self.host = HostSnapshot::default();
        self.output.clear();
    }

    pub fn gamepads(&self) -> &GamepadManager {
        &self.gamepads
    }

    pub fn gamepads_mut(&mut self) -> &mut GamepadManager {
        &mut self.gamepads
    }

    pub fn touch(&self) -> &TouchSurface {
        &self.touch
    }

    pub fn touch_mut(&mut self) -> &mut TouchSurface {
        &mut self.touch
    }

    pub fn output(&self) -> &BindingOutput {
        &self.output
    }

    pub fn bindings(&self) -> &[InputBinding] {
        &self.bindings
    }

    pub fn stick(&self, name: &str) -> Option<&StickState> {
        self.bindings.iter().find_map(|b| b.stick(name))
    }

    /// Number of completed updates
    pub fn tick(&self) -> u64 {
        self.tick
    }
}
