//! Hardware boundary for gamepads
//!
//! The host exposes connected devices as a list of names where the position
//! is the hardware id and an empty name marks a vacant id. Raw readings are
//! addressed by (hardware id, internal index).

use std::collections::{HashMap, HashSet};

/// Platform gamepad backend
pub trait GamepadHost {
    /// Pump pending hardware events; called once per tick
    fn poll(&mut self) {}

    /// Connected device names by hardware id; polled at the check interval
    fn device_names(&mut self) -> Vec<String>;

    /// Raw axis reading, `0.0` for unknown sources
    fn axis(&self, device: usize, index: usize) -> f32;

    /// Raw key reading, `false` for unknown sources
    fn key(&self, device: usize, index: usize) -> bool;
}

/// In-memory host driven by tests and scripted replays
#[derive(Debug, Clone, Default)]
pub struct ScriptedHost {
    devices: Vec<String>,
    axes: HashMap<(usize, usize), f32>,
    keys: HashSet<(usize, usize)>,
    name_queries: usize,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices<S: Into<String>>(devices: impl IntoIterator<Item = S>) -> Self {
        let mut host = Self::new();
        host.set_devices(devices);
        host
    }

    pub fn set_devices<S: Into<String>>(&mut self, devices: impl IntoIterator<Item = S>) {
        self.devices = devices.into_iter().map(Into::into).collect();
    }

    pub fn set_axis(&mut self, device: usize, index: usize, value: f32) {
        if value == 0.0 {
            self.axes.remove(&(device, index));
        } else {
            self.axes.insert((device, index), value);
        }
    }

    pub fn set_key(&mut self, device: usize, index: usize, pressed: bool) {
        if pressed {
            self.keys.insert((device, index));
        } else {
            self.keys.remove(&(device, index));
        }
    }

    /// Release every axis and key of every device
    pub fn clear_inputs(&mut self) {
        self.axes.clear();
        self.keys.clear();
    }

    /// How many times the device list has been queried
    pub fn name_queries(&self) -> usize {
        self.name_queries
    }
}

impl GamepadHost for ScriptedHost {
    fn device_names(&mut self) -> Vec<String> {
        self.name_queries += 1;
        self.devices.clone()
    }

    fn axis(&self, device: usize, index: usize) -> f32 {
        self.axes.get(&(device, index)).copied().unwrap_or(0.0)
    }

    fn key(&self, device: usize, index: usize) -> bool {
        self.keys.contains(&(device, index))
    }
}
