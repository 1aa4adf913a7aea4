//! Gamepad connection manager
//!
//! Once per connection check interval the device list is reconciled against
//! the slot pool. Every tick each connected slot samples its raw sources,
//! auto-activates on first real input, and shapes its logical controls. The
//! combined pad merges every active, unblocked slot.

use std::collections::BTreeSet;
use std::sync::Arc;

use glam::Vec2;
use tracing::{debug, info, trace, warn};

use super::events::{ConnectionEvent, DisconnectionReason, EventCallback, SubscriptionId, Subscribers};
use super::host::GamepadHost;
use super::profile::{ProfileDatabase, ProfileSource};
use super::slot::{stick_config, GamepadSlot, PadState};
use super::{GamepadKey, StickId};
use crate::config::GamepadManagerConfig;

pub struct GamepadManager {
    config: GamepadManagerConfig,
    profiles: ProfileDatabase,
    slots: Vec<GamepadSlot>,
    combined: PadState,
    device_names: Vec<String>,
    /// Devices already reported as having no free slot
    unplaced: BTreeSet<String>,
    check_timer: f32,
    force_check: bool,
    enabled: bool,
    events: Vec<ConnectionEvent>,
    subscribers: Subscribers,
}

impl GamepadManager {
    pub fn new(config: GamepadManagerConfig, profiles: ProfileDatabase) -> Self {
        let slots = (0..config.max_slots).map(|i| GamepadSlot::new(i, &config)).collect();
        let enabled = config.enabled;
        Self {
            config,
            profiles,
            slots,
            combined: PadState::default(),
            device_names: Vec::new(),
            unplaced: BTreeSet::new(),
            check_timer: 0.0,
            force_check: true,
            enabled,
            events: Vec::new(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn config(&self) -> &GamepadManagerConfig {
        &self.config
    }

    pub fn profiles(&self) -> &ProfileDatabase {
        &self.profiles
    }

    /// Advance one tick
    pub fn update(&mut self, dt: f32, host: &mut dyn GamepadHost) {
        if !self.enabled {
            self.combined.update_released(&self.config);
            return;
        }

        host.poll();

        self.check_timer -= dt;
        if self.force_check || self.check_timer <= 0.0 {
            self.device_names = host.device_names();
            self.check_timer = self.config.connection_check_interval;
            self.force_check = false;
            self.reconcile();
        }

        for i in 0..self.slots.len() {
            let touched = self.slots[i].sample(host, &self.config);
            let slot = &self.slots[i];
            if touched && self.config.auto_activate && !slot.is_activated() && !slot.is_blocked() {
                self.activate(i);
            }
            self.slots[i].shape(dt, &self.config);
        }

        self.merge_combined();
    }

    /// Match the current device list against the slot pool
    fn reconcile(&mut self) {
        let names = std::mem::take(&mut self.device_names);
        let mut claimed = vec![false; names.len()];

        for i in 0..self.slots.len() {
            let slot = &self.slots[i];
            if !slot.is_connected() {
                continue;
            }
            let still_there = slot
                .hardware_id()
                .and_then(|hw| names.get(hw).map(|name| (hw, name)))
                .filter(|(_, name)| !name.is_empty() && name.as_str() == slot.device_name());
            match still_there {
                Some((hw, _)) => claimed[hw] = true,
                None => self.disconnect_slot(i, DisconnectionReason::HardwareDisconnection),
            }
        }

        for (hw, name) in names.iter().enumerate() {
            if name.is_empty() || claimed[hw] {
                continue;
            }
            match self.pick_slot(hw, name) {
                Some(i) => {
                    claimed[hw] = true;
                    self.unplaced.remove(name);
                    self.connect_slot(i, hw, name);
                }
                None => {
                    if self.unplaced.insert(name.clone()) {
                        warn!("No free gamepad slot for \"{}\" (hardware id {}), ignoring", name, hw);
                    } else {
                        debug!("Still no free gamepad slot for \"{}\" (hardware id {})", name, hw);
                    }
                }
            }
        }

        // Unplugged devices warn again if they come back without a slot
        self.unplaced.retain(|name| names.contains(name));
        self.device_names = names;
    }

    /// Preference: same device and id, same device name, never used, any free
    fn pick_slot(&self, hw: usize, name: &str) -> Option<usize> {
        let free = || self.slots.iter().filter(|s| !s.is_connected());
        free()
            .find(|s| s.was_used() && s.hardware_id() == Some(hw) && s.device_name() == name)
            .or_else(|| free().find(|s| s.was_used() && s.device_name() == name))
            .or_else(|| free().find(|s| !s.was_used()))
            .or_else(|| free().next())
            .map(|s| s.index())
    }

    fn connect_slot(&mut self, index: usize, hw: usize, name: &str) {
        let (profile, source) = self.profiles.resolve(name);
        let reconnect = self.slots[index].was_used() && self.slots[index].device_name() == name;
        info!(
            "Gamepad {} {}connected: {} (id {}, profile '{}'{})",
            self.slots[index].control_id_prefix(),
            if reconnect { "re" } else { "" },
            name,
            hw,
            profile.name,
            if source == ProfileSource::Generic { ", unsupported" } else { "" }
        );
        self.slots[index].connect(hw, name, profile, source);
        self.emit(ConnectionEvent::Connected {
            slot: index,
            device: name.to_string(),
        });
        if !self.config.auto_activate {
            trace!("Auto-activation off, gamepad{} waits for activate()", index + 1);
        }
    }

    fn disconnect_slot(&mut self, index: usize, reason: DisconnectionReason) {
        if self.slots[index].is_activated() {
            self.slots[index].set_activated(false);
            self.emit(ConnectionEvent::Disactivated { slot: index, reason });
        }
        let slot = &mut self.slots[index];
        warn!("Gamepad {} disconnected ({}): {}", slot.control_id_prefix(), reason, slot.device_name());
        let device = slot.device_name().to_string();
        slot.disconnect();
        self.emit(ConnectionEvent::Disconnected { slot: index, device, reason });
    }

    fn emit(&mut self, event: ConnectionEvent) {
        self.subscribers.notify(&event);
        self.events.push(event);
    }

    fn merge_combined(&mut self) {
        let active: Vec<&GamepadSlot> = self
            .slots
            .iter()
            .filter(|s| s.is_activated() && !s.is_blocked())
            .collect();

        for id in StickId::ALL {
            let stick = self.combined.stick_mut(id);
            for slot in &active {
                stick.apply_vec(slot.pad().stick(id).raw_vec());
            }
            stick.update(stick_config(&self.config, id));
        }

        for key in GamepadKey::ALL {
            let pressed = active.iter().any(|s| s.key(key));
            let analog = active.iter().map(|s| s.key_analog(key)).fold(0.0f32, f32::max);
            self.combined.key_state_mut(key).set_merged(pressed, analog);
        }
    }

    /// Make a connected slot contribute to the combined pad
    pub fn activate(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_connected() && !slot.is_activated() => {
                slot.set_activated(true);
                debug!("Gamepad {} activated", slot.control_id_prefix());
                self.emit(ConnectionEvent::Activated { slot: index });
                true
            }
            _ => false,
        }
    }

    pub fn disactivate(&mut self, index: usize) -> bool {
        self.disactivate_with(index, DisconnectionReason::Disactivation)
    }

    /// Disactivate every active slot; returns how many were active
    pub fn disactivate_all(&mut self) -> usize {
        (0..self.slots.len())
            .filter(|&i| self.disactivate_with(i, DisconnectionReason::MassDisactivation))
            .count()
    }

    fn disactivate_with(&mut self, index: usize, reason: DisconnectionReason) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) if slot.is_activated() => {
                slot.set_activated(false);
                debug!("Gamepad {} disactivated ({})", slot.control_id_prefix(), reason);
                self.emit(ConnectionEvent::Disactivated { slot: index, reason });
                true
            }
            _ => false,
        }
    }

    /// A blocked slot reads neutral and never auto-activates
    pub fn set_blocked(&mut self, index: usize, blocked: bool) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.set_blocked(blocked);
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            info!("Gamepad manager enabled");
            self.force_check = true;
        } else {
            info!("Gamepad manager disabled");
            self.unplaced.clear();
            for i in 0..self.slots.len() {
                if self.slots[i].is_connected() {
                    self.disconnect_slot(i, DisconnectionReason::ManagerDisabled);
                }
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Re-read the device list on the next update
    pub fn force_connection_check(&mut self) {
        self.force_check = true;
    }

    pub fn subscribe(&mut self, callback: impl Fn(&ConnectionEvent) + Send + Sync + 'static) -> SubscriptionId {
        let callback: EventCallback = Arc::new(callback);
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Drain events emitted since the last call
    pub fn take_events(&mut self) -> Vec<ConnectionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn slot(&self, index: usize) -> Option<&GamepadSlot> {
        self.slots.get(index)
    }

    pub fn slots(&self) -> &[GamepadSlot] {
        &self.slots
    }

    /// Merged state of every active, unblocked slot
    pub fn combined(&self) -> &PadState {
        &self.combined
    }

    pub fn connected_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_connected()).count()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_activated()).count()
    }

    pub fn is_connected(&self, index: usize) -> bool {
        self.slot(index).is_some_and(|s| s.is_connected())
    }

    pub fn is_supported(&self, index: usize) -> bool {
        self.slot(index).is_some_and(|s| s.is_supported())
    }

    pub fn device_name(&self, index: usize) -> Option<&str> {
        self.slot(index).filter(|s| s.is_connected()).map(|s| s.device_name())
    }

    pub fn profile_name(&self, index: usize) -> Option<&str> {
        self.slot(index).filter(|s| s.is_connected()).and_then(|s| s.profile_name())
    }

    /// Last device list read from the host
    pub fn device_names(&self) -> &[String] {
        &self.device_names
    }

    /// Devices present but waiting for a free slot
    pub fn unplaced_devices(&self) -> impl Iterator<Item = &str> {
        self.unplaced.iter().map(String::as_str)
    }

    pub fn combined_stick_vec(&self, id: StickId) -> Vec2 {
        self.combined.stick_vec(id)
    }
}

impl std::fmt::Debug for GamepadManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GamepadManager")
            .field("enabled", &self.enabled)
            .field("slots", &self.slots.len())
            .field("connected", &self.connected_count())
            .field("active", &self.active_count())
            .field("unplaced", &self.unplaced.len())
            .finish()
    }
}
