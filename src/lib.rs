//! VControl - input normalization
//!
//! Turns raw touch points, gamepad axes/buttons and keys into stable per-tick
//! virtual controls: shaped axes with hysteresis, joystick vectors and
//! directions, touch gestures, and hot-plugged gamepads bound to fixed slots.
//!
//! Everything is driven by one `update(dt, ..)` per frame on an
//! [`InputContext`]; nothing runs in the background.

pub mod binding;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod paths;
pub mod pool;
pub mod replay;

pub use binding::{BindingOutput, HostSnapshot, InputBinding, SignalSource, StickInput};
pub use config::ShaperConfig;
pub use context::InputContext;
pub use error::{ConfigError, Result};
pub use input::gamepad::{ConnectionEvent, DisconnectionReason, GamepadHost, GamepadManager, ScriptedHost};
pub use input::{Dir, DirectionState, GestureRecognizer, StickState, ThresholdShaper, TouchEvent, TouchSurface};
