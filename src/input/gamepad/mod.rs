//! Gamepad support: profiles, slots and the connection manager
//!
//! Physical pads are read through a [`GamepadHost`] by internal axis/key
//! index. A [`GamepadProfile`] maps those indices onto the logical layout
//! below, and the [`GamepadManager`] binds devices to a fixed pool of slots.

pub mod events;
#[cfg(feature = "gilrs")]
pub mod gilrs_host;
pub mod host;
pub mod manager;
pub mod profile;
pub mod slot;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

pub use events::{ConnectionEvent, DisconnectionReason, SubscriptionId};
pub use host::{GamepadHost, ScriptedHost};
pub use manager::GamepadManager;
pub use profile::{DeviceMatch, GamepadProfile, ProfileDatabase, ProfileSource};
pub use slot::{GamepadSlot, PadState};

/// Logical gamepad button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamepadKey {
    /// Bottom face button
    Action1,
    /// Right face button
    Action2,
    /// Left face button
    Action3,
    /// Top face button
    Action4,
    L1,
    R1,
    L2,
    R2,
    L3,
    R3,
    Select,
    Start,
}

impl GamepadKey {
    pub const COUNT: usize = 12;

    pub const ALL: [GamepadKey; Self::COUNT] = [
        GamepadKey::Action1,
        GamepadKey::Action2,
        GamepadKey::Action3,
        GamepadKey::Action4,
        GamepadKey::L1,
        GamepadKey::R1,
        GamepadKey::L2,
        GamepadKey::R2,
        GamepadKey::L3,
        GamepadKey::R3,
        GamepadKey::Select,
        GamepadKey::Start,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            GamepadKey::Action1 => "action1",
            GamepadKey::Action2 => "action2",
            GamepadKey::Action3 => "action3",
            GamepadKey::Action4 => "action4",
            GamepadKey::L1 => "l1",
            GamepadKey::R1 => "r1",
            GamepadKey::L2 => "l2",
            GamepadKey::R2 => "r2",
            GamepadKey::L3 => "l3",
            GamepadKey::R3 => "r3",
            GamepadKey::Select => "select",
            GamepadKey::Start => "start",
        }
    }
}

/// Logical 2D control on a gamepad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StickId {
    LeftStick,
    RightStick,
    #[serde(rename = "dpad")]
    DPad,
}

impl StickId {
    pub const COUNT: usize = 3;

    pub const ALL: [StickId; Self::COUNT] = [StickId::LeftStick, StickId::RightStick, StickId::DPad];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            StickId::LeftStick => "left_stick",
            StickId::RightStick => "right_stick",
            StickId::DPad => "dpad",
        }
    }
}
