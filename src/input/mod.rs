//! Device input: signal shaping, sticks, touch gestures and gamepads

pub mod analog;
pub mod direction;
pub mod gamepad;
pub mod stick;
pub mod touch;

pub use analog::{AxisState, KeyState, ThresholdShaper};
pub use direction::{Dir, DirectionState, ResetPolicy};
pub use stick::StickState;
pub use touch::{GestureRecognizer, TouchEvent, TouchSurface};
