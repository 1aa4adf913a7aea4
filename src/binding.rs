//! Binding layer: wiring recognised signals onto named outputs
//!
//! Bindings are a closed set of variants, synced once per tick after the
//! gamepads and touch zones have been updated. A source that points at
//! nothing (unknown zone, empty slot, unset host key) reads neutral.

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::StickConfig;
use crate::input::direction::Dir;
use crate::input::gamepad::{GamepadKey, GamepadManager, PadState, StickId};
use crate::input::stick::StickState;
use crate::input::touch::{TouchEvent, TouchSurface};

/// Contact id used for mouse-driven touch emulation
pub const MOUSE_CONTACT_ID: u64 = u64::MAX;

/// Host keyboard/mouse snapshot for the current tick
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct HostSnapshot {
    #[serde(default)]
    pub keys: HashMap<String, bool>,
    #[serde(default)]
    pub axes: HashMap<String, f32>,
    #[serde(default)]
    pub pointer: Option<Vec2>,
    #[serde(default)]
    pub mouse_down: bool,
}

impl HostSnapshot {
    pub fn key(&self, name: &str) -> bool {
        self.keys.get(name).copied().unwrap_or(false)
    }

    pub fn axis(&self, name: &str) -> f32 {
        self.axes.get(name).copied().unwrap_or(0.0)
    }
}

/// Read-only view handed to sources during sync
pub struct SyncView<'a> {
    pub gamepads: &'a GamepadManager,
    pub touch: &'a TouchSurface,
    pub host: &'a HostSnapshot,
}

impl SyncView<'_> {
    /// Slot `n`, or the combined pad when `None`
    fn pad(&self, slot: Option<usize>) -> Option<&PadState> {
        match slot {
            None => Some(self.gamepads.combined()),
            Some(i) => self.gamepads.slot(i).filter(|s| s.is_connected()).map(|s| s.pad()),
        }
    }
}

/// Where a binding reads its signal from
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalSource {
    /// Gamepad key of a slot, or of the combined pad when `slot` is unset
    PadKey {
        #[serde(default)]
        slot: Option<usize>,
        key: GamepadKey,
    },
    PadStick {
        #[serde(default)]
        slot: Option<usize>,
        stick: StickId,
    },
    HostKey {
        name: String,
    },
    HostAxis {
        name: String,
    },
    /// Touch zone used as an on-screen stick of the given radius (pixels)
    Zone {
        zone: String,
        #[serde(default = "default_zone_radius")]
        radius: f32,
    },
    /// Confirmed taps of a given count on a touch zone
    ZoneTap {
        zone: String,
        #[serde(default = "default_tap_count")]
        count: u32,
    },
}

fn default_zone_radius() -> f32 {
    64.0
}

fn default_tap_count() -> u32 {
    1
}

impl SignalSource {
    pub fn digital(&self, view: &SyncView<'_>) -> bool {
        match self {
            SignalSource::PadKey { slot, key } => view.pad(*slot).is_some_and(|p| p.key(*key)),
            SignalSource::PadStick { slot, stick } => {
                view.pad(*slot).is_some_and(|p| p.stick_dir(*stick) != Dir::Neutral)
            }
            SignalSource::HostKey { name } => view.host.key(name),
            SignalSource::HostAxis { name } => view.host.axis(name).abs() > 0.5,
            SignalSource::Zone { zone, .. } => view.touch.recognizer(zone).is_some_and(|r| r.pressed_raw()),
            SignalSource::ZoneTap { zone, count } => {
                view.touch.recognizer(zone).is_some_and(|r| r.just_tapped(*count))
            }
        }
    }

    pub fn analog(&self, view: &SyncView<'_>) -> f32 {
        match self {
            SignalSource::PadKey { slot, key } => view.pad(*slot).map_or(0.0, |p| p.key_analog(*key)),
            SignalSource::PadStick { slot, stick } => view.pad(*slot).map_or(0.0, |p| p.stick(*stick).tilt()),
            SignalSource::HostAxis { name } => view.host.axis(name),
            SignalSource::Zone { .. } => self.vector(view).length().min(1.0),
            SignalSource::HostKey { .. } | SignalSource::ZoneTap { .. } => {
                if self.digital(view) { 1.0 } else { 0.0 }
            }
        }
    }

    pub fn vector(&self, view: &SyncView<'_>) -> Vec2 {
        match self {
            SignalSource::PadStick { slot, stick } => view.pad(*slot).map_or(Vec2::ZERO, |p| p.stick_vec(*stick)),
            SignalSource::Zone { zone, radius } => view
                .touch
                .zone_by_name(zone)
                .filter(|_| *radius > 0.0)
                .map_or(Vec2::ZERO, |z| z.recognizer.swipe_vec(&z.config) / *radius),
            other => Vec2::new(other.analog(view), 0.0),
        }
    }

    pub fn direction(&self, view: &SyncView<'_>) -> Dir {
        match self {
            SignalSource::PadStick { slot, stick } => view.pad(*slot).map_or(Dir::Neutral, |p| p.stick_dir(*stick)),
            SignalSource::Zone { zone, .. } => view
                .touch
                .recognizer(zone)
                .map_or(Dir::Neutral, |r| r.swipe_dir8().current()),
            other => Dir::from_vector(other.vector(view)),
        }
    }
}

/// Named outputs written by the bindings this tick
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BindingOutput {
    pub axes: BTreeMap<String, f32>,
    pub buttons: BTreeMap<String, bool>,
}

impl BindingOutput {
    /// Several bindings on one axis keep the strongest value
    pub fn set_axis(&mut self, name: &str, value: f32) {
        let slot = self.axes.entry(name.to_string()).or_insert(0.0);
        if value.abs() > slot.abs() {
            *slot = value;
        }
    }

    /// Several bindings on one button are OR-ed
    pub fn set_button(&mut self, name: &str, pressed: bool) {
        *self.buttons.entry(name.to_string()).or_insert(false) |= pressed;
    }

    pub fn axis(&self, name: &str) -> f32 {
        self.axes.get(name).copied().unwrap_or(0.0)
    }

    pub fn button(&self, name: &str) -> bool {
        self.buttons.get(name).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.axes.clear();
        self.buttons.clear();
    }
}

/// Joystick input: an analog source, or a digital one pushing `dir`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StickInput {
    pub source: SignalSource,
    #[serde(default)]
    pub dir: Option<Dir>,
}

/// One wiring from sources to named outputs
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputBinding {
    Axis {
        source: SignalSource,
        output: String,
        #[serde(default)]
        invert: bool,
    },
    Digital {
        source: SignalSource,
        output: String,
    },
    /// Button that is down while the source points in `dir`
    Direction {
        source: SignalSource,
        dir: Dir,
        output: String,
    },
    /// Host pointer position into two axes
    MousePosition {
        output_x: String,
        output_y: String,
    },
    /// Host mouse button and pointer drive a touch zone as one contact
    TouchEmulation {
        zone: String,
        #[serde(skip)]
        pressed: bool,
    },
    /// Virtual joystick merged from several sources; publishes `<name>.x`,
    /// `<name>.y` and one button per 8-way direction (`<name>.ne`, ...).
    /// `preset` names an entry of the `sticks` config table.
    JoystickState {
        name: String,
        sources: Vec<StickInput>,
        #[serde(default)]
        preset: Option<String>,
        #[serde(default)]
        config: StickConfig,
        #[serde(skip)]
        state: StickState,
    },
    Composite {
        bindings: Vec<InputBinding>,
    },
}

impl InputBinding {
    /// Touch emulation stages contacts for the next touch commit; everything
    /// else only reads
    pub fn stage_touch(&mut self, host: &HostSnapshot, touch: &mut TouchSurface) {
        match self {
            InputBinding::TouchEmulation { zone, pressed } => {
                let Some(z) = touch.zone_by_name_mut(zone) else {
                    return;
                };
                let event = match (host.mouse_down, *pressed, host.pointer) {
                    (true, false, Some(pos)) => TouchEvent::Start {
                        id: MOUSE_CONTACT_ID,
                        pos,
                        pressure: 1.0,
                        mouse: true,
                    },
                    (true, true, Some(pos)) => TouchEvent::Move { id: MOUSE_CONTACT_ID, pos },
                    (false, true, _) | (true, true, None) => TouchEvent::End {
                        id: MOUSE_CONTACT_ID,
                        cancel: false,
                    },
                    _ => return,
                };
                let accepted = z.recognizer.stage(event);
                *pressed = match event {
                    TouchEvent::Start { .. } => accepted,
                    TouchEvent::End { .. } => false,
                    _ => *pressed,
                };
            }
            InputBinding::Composite { bindings } => {
                for binding in bindings {
                    binding.stage_touch(host, touch);
                }
            }
            _ => {}
        }
    }

    /// Write this tick's values into `out`
    pub fn sync(&mut self, view: &SyncView<'_>, out: &mut BindingOutput) {
        match self {
            InputBinding::Axis { source, output, invert } => {
                let v = source.analog(view);
                out.set_axis(output, if *invert { -v } else { v });
            }
            InputBinding::Digital { source, output } => out.set_button(output, source.digital(view)),
            InputBinding::Direction { source, dir, output } => {
                let current = source.direction(view);
                out.set_button(output, current != Dir::Neutral && current == *dir);
            }
            InputBinding::MousePosition { output_x, output_y } => {
                let p = view.host.pointer.unwrap_or(Vec2::ZERO);
                out.set_axis(output_x, p.x);
                out.set_axis(output_y, p.y);
            }
            InputBinding::TouchEmulation { .. } => {}
            InputBinding::JoystickState { name, sources, config, state, .. } => {
                for input in sources.iter() {
                    match input.dir {
                        Some(dir) if input.source.digital(view) => state.apply_dir(dir),
                        Some(_) => {}
                        None => state.apply_vec(input.source.vector(view)),
                    }
                }
                state.update(config);
                let v = state.vector();
                out.set_axis(&format!("{}.x", name), v.x);
                out.set_axis(&format!("{}.y", name), v.y);
                for dir in Dir::ALL {
                    out.set_button(&format!("{}.{}", name, dir_name(dir)), state.dir() == dir);
                }
            }
            InputBinding::Composite { bindings } => {
                for binding in bindings {
                    binding.sync(view, out);
                }
            }
        }
    }

    /// Replace joystick configs that name a preset found in `sticks`
    pub fn resolve_presets(&mut self, sticks: &HashMap<String, StickConfig>) {
        match self {
            InputBinding::JoystickState { name, preset: Some(preset), config, .. } => match sticks.get(preset.as_str()) {
                Some(found) => *config = found.clone(),
                None => warn!("Joystick '{}' names unknown stick preset '{}', using its own config", name, preset),
            },
            InputBinding::Composite { bindings } => {
                for binding in bindings {
                    binding.resolve_presets(sticks);
                }
            }
            _ => {}
        }
    }

    /// Virtual stick state, for joystick bindings
    pub fn stick(&self, stick_name: &str) -> Option<&StickState> {
        match self {
            InputBinding::JoystickState { name, state, .. } if name == stick_name => Some(state),
            InputBinding::Composite { bindings } => bindings.iter().find_map(|b| b.stick(stick_name)),
            _ => None,
        }
    }
}

fn dir_name(dir: Dir) -> &'static str {
    match dir {
        Dir::Neutral => "none",
        Dir::E => "e",
        Dir::NE => "ne",
        Dir::N => "n",
        Dir::NW => "nw",
        Dir::W => "w",
        Dir::SW => "sw",
        Dir::S => "s",
        Dir::SE => "se",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GamepadManagerConfig, GestureConfig};
    use crate::input::gamepad::profile::layout;
    use crate::input::gamepad::{ProfileDatabase, ScriptedHost};
    use crate::input::touch::Rect;

    struct Rig {
        gamepads: GamepadManager,
        touch: TouchSurface,
        host: HostSnapshot,
        out: BindingOutput,
    }

    impl Rig {
        fn new() -> Self {
            let config = GamepadManagerConfig {
                connection_check_interval: 0.0,
                ..GamepadManagerConfig::default()
            };
            let mut touch = TouchSurface::new(4);
            touch.add_zone("pad", Some(Rect::new(Vec2::ZERO, Vec2::splat(100.0))), GestureConfig::default());
            Self {
                gamepads: GamepadManager::new(config, ProfileDatabase::new()),
                touch,
                host: HostSnapshot::default(),
                out: BindingOutput::default(),
            }
        }

        fn sync(&mut self, bindings: &mut [InputBinding]) {
            for binding in bindings.iter_mut() {
                binding.stage_touch(&self.host, &mut self.touch);
            }
            self.touch.update(0.016);
            self.out.clear();
            let view = SyncView {
                gamepads: &self.gamepads,
                touch: &self.touch,
                host: &self.host,
            };
            for binding in bindings.iter_mut() {
                binding.sync(&view, &mut self.out);
            }
        }
    }

    fn host_key(name: &str) -> SignalSource {
        SignalSource::HostKey { name: name.into() }
    }

    #[test]
    fn test_missing_sources_read_neutral() {
        let mut rig = Rig::new();
        let mut bindings = vec![
            InputBinding::Digital {
                source: SignalSource::PadKey { slot: Some(3), key: GamepadKey::Action1 },
                output: "jump".into(),
            },
            InputBinding::Axis {
                source: SignalSource::HostAxis { name: "wheel".into() },
                output: "zoom".into(),
                invert: false,
            },
            InputBinding::Axis {
                source: SignalSource::Zone { zone: "nowhere".into(), radius: 64.0 },
                output: "steer".into(),
                invert: false,
            },
            InputBinding::Direction {
                source: SignalSource::PadStick { slot: Some(9), stick: StickId::LeftStick },
                dir: Dir::Neutral,
                output: "idle".into(),
            },
        ];
        rig.sync(&mut bindings);

        assert!(!rig.out.button("jump"));
        assert_eq!(rig.out.axis("zoom"), 0.0);
        assert_eq!(rig.out.axis("steer"), 0.0);
        assert!(!rig.out.button("idle"));
        assert!(!rig.out.button("unbound"));
    }

    #[test]
    fn test_shared_outputs_merge() {
        let mut rig = Rig::new();
        rig.host.axes.insert("left".into(), 0.4);
        rig.host.axes.insert("right".into(), 0.7);
        rig.host.keys.insert("space".into(), true);
        let mut bindings = vec![
            InputBinding::Axis { source: SignalSource::HostAxis { name: "left".into() }, output: "turn".into(), invert: false },
            InputBinding::Axis { source: SignalSource::HostAxis { name: "right".into() }, output: "turn".into(), invert: true },
            InputBinding::Digital { source: host_key("enter"), output: "ok".into() },
            InputBinding::Digital { source: host_key("space"), output: "ok".into() },
        ];
        rig.sync(&mut bindings);

        assert!((rig.out.axis("turn") + 0.7).abs() < 1e-6);
        assert!(rig.out.button("ok"));
    }

    #[test]
    fn test_joystick_from_keys() {
        let mut rig = Rig::new();
        let mut bindings = vec![InputBinding::JoystickState {
            name: "move".into(),
            sources: vec![
                StickInput { source: host_key("w"), dir: Some(Dir::N) },
                StickInput { source: host_key("d"), dir: Some(Dir::E) },
                StickInput { source: SignalSource::HostAxis { name: "unused".into() }, dir: None },
            ],
            preset: None,
            config: StickConfig::default(),
            state: StickState::default(),
        }];

        rig.host.keys.insert("w".into(), true);
        rig.host.keys.insert("d".into(), true);
        rig.sync(&mut bindings);
        assert!(rig.out.axis("move.x") > 0.5);
        assert!(rig.out.axis("move.y") > 0.5);
        assert!(rig.out.button("move.ne"));
        assert!(!rig.out.button("move.n"));
        assert_eq!(bindings[0].stick("move").map(|s| s.dir()), Some(Dir::NE));

        rig.host.keys.clear();
        rig.sync(&mut bindings);
        assert_eq!(rig.out.axis("move.x"), 0.0);
        assert!(!rig.out.button("move.ne"));
        assert_eq!(bindings[0].stick("move").map(|s| s.dir()), Some(Dir::Neutral));
    }

    #[test]
    fn test_touch_emulation_drives_zone() {
        let mut rig = Rig::new();
        let mut bindings = vec![
            InputBinding::TouchEmulation { zone: "pad".into(), pressed: false },
            InputBinding::Digital {
                source: SignalSource::Zone { zone: "pad".into(), radius: 64.0 },
                output: "held".into(),
            },
            InputBinding::Digital {
                source: SignalSource::ZoneTap { zone: "pad".into(), count: 1 },
                output: "tap".into(),
            },
        ];

        rig.host.pointer = Some(Vec2::new(10.0, 10.0));
        rig.host.mouse_down = true;
        rig.sync(&mut bindings);
        assert!(rig.out.button("held"));
        assert!(rig.touch.recognizer("pad").is_some_and(|r| r.tracker().is_mouse()));

        rig.host.mouse_down = false;
        rig.sync(&mut bindings);
        assert!(!rig.out.button("held"));

        // Single tap confirms once the multi-tap gap has passed
        let mut tapped = false;
        for _ in 0..30 {
            rig.sync(&mut bindings);
            tapped |= rig.out.button("tap");
        }
        assert!(tapped);
    }

    #[test]
    fn test_mouse_position_and_pad_direction() {
        let mut rig = Rig::new();
        let mut host = ScriptedHost::with_devices(["PadA"]);
        rig.gamepads.update(0.016, &mut host);
        assert!(rig.gamepads.activate(0));
        host.set_axis(0, layout::AXIS_LEFT_X, 1.0);
        rig.gamepads.update(0.016, &mut host);

        rig.host.pointer = Some(Vec2::new(320.0, 240.0));
        let mut bindings = vec![InputBinding::Composite {
            bindings: vec![
                InputBinding::MousePosition { output_x: "cursor.x".into(), output_y: "cursor.y".into() },
                InputBinding::Direction {
                    source: SignalSource::PadStick { slot: None, stick: StickId::LeftStick },
                    dir: Dir::E,
                    output: "right".into(),
                },
                InputBinding::Direction {
                    source: SignalSource::PadStick { slot: Some(0), stick: StickId::LeftStick },
                    dir: Dir::W,
                    output: "left".into(),
                },
            ],
        }];
        rig.sync(&mut bindings);

        assert_eq!(rig.out.axis("cursor.x"), 320.0);
        assert_eq!(rig.out.axis("cursor.y"), 240.0);
        assert!(rig.out.button("right"));
        assert!(!rig.out.button("left"));
    }

    #[test]
    fn test_bindings_from_yaml() {
        let yaml = r#"
- kind: axis
  source: { kind: pad_key, key: r2 }
  output: throttle
- kind: composite
  bindings:
    - kind: joystick_state
      name: aim
      preset: precise
      sources:
        - source: { kind: pad_stick, slot: 1, stick: right_stick }
        - source: { kind: host_key, name: up }
          dir: n
    - kind: touch_emulation
      zone: pad
"#;
        let mut bindings: Vec<InputBinding> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(bindings.len(), 2);
        let InputBinding::Composite { bindings: inner } = &bindings[1] else {
            panic!("expected composite");
        };
        assert!(bindings[1].stick("aim").is_some());
        assert!(matches!(&inner[1], InputBinding::TouchEmulation { zone, pressed: false } if zone == "pad"));

        let mut presets = HashMap::new();
        presets.insert("precise".to_string(), StickConfig { angular_magnet_strength: 1.0, ..StickConfig::default() });
        for binding in &mut bindings {
            binding.resolve_presets(&presets);
        }
        let InputBinding::Composite { bindings: inner } = &bindings[1] else {
            panic!("expected composite");
        };
        assert!(matches!(&inner[0], InputBinding::JoystickState { config, .. } if config.angular_magnet_strength == 1.0));
    }
}
