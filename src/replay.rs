//! Scripted scenario runner
//!
//! A scenario is a YAML file describing touch zones, bindings and a list of
//! ticks. Each tick may change the device list, raw axes and keys (which
//! persist until changed), stage touch events and replace the host snapshot.
//! The runner drives an [`InputContext`] through a [`ScriptedHost`] and
//! reports the committed state after every tick.
//!
//! ```yaml
//! zones:
//!   - name: screen
//! ticks:
//!   - devices: [PadA]
//!     touch:
//!       - { kind: start, id: 1, pos: [0, 0] }
//!   - dt: 0.05
//!     axes:
//!       - { device: 0, index: 0, value: 1.0 }
//!     repeat: 3
//! ```

use std::fmt::Write as _;
use std::path::Path;

use colored::*;
use glam::{IVec2, Vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::binding::{BindingOutput, HostSnapshot, InputBinding};
use crate::config::{GestureConfig, ShaperConfig};
use crate::context::InputContext;
use crate::error::{ConfigError, Result};
use crate::input::direction::Dir;
use crate::input::gamepad::{ConnectionEvent, GamepadKey, PadState, ScriptedHost, StickId};
use crate::input::touch::{GestureRecognizer, Rect, TouchEvent};

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneDef {
    pub name: String,
    #[serde(default)]
    pub rect: Option<Rect>,
    /// Overrides the configured gestures for this zone
    #[serde(default)]
    pub gestures: Option<GestureConfig>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AxisInput {
    pub device: usize,
    pub index: usize,
    pub value: f32,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct KeyInput {
    pub device: usize,
    pub index: usize,
    pub pressed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickDef {
    #[serde(default = "default_dt")]
    pub dt: f32,
    /// Run this tick several times; touch events are staged on the first only
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// Full device list by hardware id (empty string = free id)
    #[serde(default)]
    pub devices: Option<Vec<String>>,
    #[serde(default)]
    pub axes: Vec<AxisInput>,
    #[serde(default)]
    pub keys: Vec<KeyInput>,
    #[serde(default)]
    pub touch: Vec<TouchEvent>,
    #[serde(default)]
    pub host: Option<HostSnapshot>,
}

fn default_dt() -> f32 {
    1.0 / 60.0
}

fn default_repeat() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
    #[serde(default)]
    pub bindings: Vec<InputBinding>,
    pub ticks: Vec<TickDef>,
}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(yaml)?;
        if let Some(tick) = scenario.ticks.iter().find(|t| t.dt < 0.0) {
            return Err(ConfigError::invalid(format!("tick dt must be >= 0 (got {})", tick.dt)));
        }
        Ok(scenario)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scenario = Self::from_yaml(&contents)?;
        debug!(
            "Loaded scenario {} ({} zone(s), {} binding(s), {} tick(s))",
            path.display(),
            scenario.zones.len(),
            scenario.bindings.len(),
            scenario.ticks.len()
        );
        Ok(scenario)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PadReport {
    /// Slot index, `None` for the combined pad
    pub slot: Option<usize>,
    pub device: String,
    pub profile: String,
    pub active: bool,
    pub left: Vec2,
    pub right: Vec2,
    pub dpad: Dir,
    pub keys: Vec<&'static str>,
}

impl PadReport {
    fn new(slot: Option<usize>, device: &str, profile: &str, active: bool, pad: &PadState) -> Self {
        Self {
            slot,
            device: device.to_string(),
            profile: profile.to_string(),
            active,
            left: pad.stick_vec(StickId::LeftStick),
            right: pad.stick_vec(StickId::RightStick),
            dpad: pad.stick_dir(StickId::DPad),
            keys: GamepadKey::ALL.iter().filter(|k| pad.key(**k)).map(|k| k.name()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneReport {
    pub name: String,
    pub position: Vec2,
    /// Press edges and levels seen this tick (`pressed_raw`, `released_normal`, ...)
    pub edges: Vec<&'static str>,
    pub tapped: u32,
    pub long_tapped: bool,
    pub swipe: Dir,
    pub scroll: IVec2,
}

impl ZoneReport {
    fn new(name: &str, r: &GestureRecognizer) -> Self {
        let flags = [
            (r.just_pressed_raw(), "pressed_raw"),
            (r.just_released_raw(), "released_raw"),
            (r.just_pressed_normal(), "pressed_normal"),
            (r.just_released_normal(), "released_normal"),
            (r.just_pressed_long(), "pressed_long"),
            (r.just_released_long(), "released_long"),
        ];
        Self {
            name: name.to_string(),
            position: r.position(),
            edges: flags.iter().filter(|(on, _)| *on).map(|(_, name)| *name).collect(),
            tapped: r.tapped_count(),
            long_tapped: r.just_long_tapped(),
            swipe: r.swipe_dir8().current(),
            scroll: r.scroll_steps(),
        }
    }
}

/// Committed state after one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    pub tick: u64,
    pub time: f32,
    pub events: Vec<ConnectionEvent>,
    pub pads: Vec<PadReport>,
    pub zones: Vec<ZoneReport>,
    pub outputs: BindingOutput,
}

impl TickReport {
    /// Human readable, colored multi-line rendering
    pub fn render(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "{} {:.3}s", format!("#{}", self.tick).bold().cyan(), self.time);
        for event in &self.events {
            let _ = writeln!(s, "  {} {}", "event".yellow(), event);
        }
        for pad in &self.pads {
            let label = match pad.slot {
                Some(i) => format!("gamepad{}", i + 1),
                None => "combined".to_string(),
            };
            let state = if pad.active { "active".green() } else { "idle".dimmed() };
            let _ = writeln!(
                s,
                "  {} [{}] {} L({:+.2},{:+.2}) R({:+.2},{:+.2}) dpad={:?} keys={:?}",
                label.bold(),
                state,
                pad.device,
                pad.left.x,
                pad.left.y,
                pad.right.x,
                pad.right.y,
                pad.dpad,
                pad.keys
            );
        }
        for zone in &self.zones {
            let _ = writeln!(
                s,
                "  {} ({:.1},{:.1}) {:?} taps={} long_tap={} swipe={:?} scroll=({},{})",
                zone.name.bold(),
                zone.position.x,
                zone.position.y,
                zone.edges,
                zone.tapped,
                zone.long_tapped,
                zone.swipe,
                zone.scroll.x,
                zone.scroll.y
            );
        }
        for (name, value) in &self.outputs.axes {
            let _ = writeln!(s, "  {} {} = {:+.3}", "axis".magenta(), name, value);
        }
        for (name, pressed) in self.outputs.buttons.iter().filter(|(_, p)| **p) {
            let _ = writeln!(s, "  {} {} = {}", "button".magenta(), name, pressed);
        }
        s
    }
}

pub struct Replay {
    ctx: InputContext,
    host: ScriptedHost,
    time: f32,
}

impl Replay {
    pub fn new(config: &ShaperConfig, scenario: &Scenario) -> Result<Self> {
        let mut ctx = InputContext::new(config)?;
        for zone in &scenario.zones {
            if ctx.add_zone(zone.name.clone(), zone.rect, zone.gestures.clone()).is_none() {
                return Err(ConfigError::invalid(format!("too many zones, '{}' does not fit", zone.name)));
            }
        }
        for binding in &scenario.bindings {
            ctx.add_binding(binding.clone());
        }
        Ok(Self {
            ctx,
            host: ScriptedHost::new(),
            time: 0.0,
        })
    }

    pub fn context(&self) -> &InputContext {
        &self.ctx
    }

    /// Run one tick definition, one report per repetition
    pub fn step(&mut self, tick: &TickDef) -> Vec<TickReport> {
        if let Some(devices) = &tick.devices {
            self.host.set_devices(devices.iter().cloned());
            self.ctx.gamepads_mut().force_connection_check();
        }
        for a in &tick.axes {
            self.host.set_axis(a.device, a.index, a.value);
        }
        for k in &tick.keys {
            self.host.set_key(k.device, k.index, k.pressed);
        }
        if let Some(snapshot) = &tick.host {
            self.ctx.set_host_snapshot(snapshot.clone());
        }

        let mut reports = Vec::with_capacity(tick.repeat.max(1) as usize);
        for i in 0..tick.repeat.max(1) {
            if i == 0 {
                for event in &tick.touch {
                    self.ctx.handle_touch(*event);
                }
            }
            self.ctx.update(tick.dt, &mut self.host);
            self.time += tick.dt;
            reports.push(self.report());
        }
        reports
    }

    pub fn run(&mut self, scenario: &Scenario) -> Vec<TickReport> {
        let reports: Vec<TickReport> = scenario.ticks.iter().flat_map(|t| self.step(t)).collect();
        info!("Replayed {} tick(s) over {:.3}s", reports.len(), self.time);
        reports
    }

    fn report(&mut self) -> TickReport {
        let gamepads = self.ctx.gamepads_mut();
        let events = gamepads.take_events();
        let gamepads = self.ctx.gamepads();

        let mut pads: Vec<PadReport> = gamepads
            .slots()
            .iter()
            .filter(|s| s.is_connected())
            .map(|s| PadReport::new(Some(s.index()), s.device_name(), s.profile_name().unwrap_or(""), s.is_activated(), s.pad()))
            .collect();
        if gamepads.active_count() > 0 {
            pads.push(PadReport::new(None, "", "", true, gamepads.combined()));
        }

        TickReport {
            tick: self.ctx.tick(),
            time: self.time,
            events,
            pads,
            zones: self
                .ctx
                .touch()
                .zones()
                .map(|(_, z)| ZoneReport::new(&z.name, &z.recognizer))
                .collect(),
            outputs: self.ctx.output().clone(),
        }
    }
}
