//! gilrs-backed gamepad host
//!
//! gilrs reports buttons by physical position (South, East, North, West) and
//! named axes. Both are mapped onto the internal index layout the built-in
//! profiles read from. Hardware ids are gilrs' own gamepad ids, which stay
//! stable for the lifetime of the process.

use gilrs::{Axis, Button, Event, GamepadId, Gilrs};
use tracing::{debug, info, trace};

use super::host::GamepadHost;
use super::profile::layout;

/// Internal axis index for a gilrs axis
pub fn gilrs_axis_index(axis: Axis) -> Option<usize> {
    match axis {
        Axis::LeftStickX => Some(layout::AXIS_LEFT_X),
        Axis::LeftStickY => Some(layout::AXIS_LEFT_Y),
        Axis::RightStickX => Some(layout::AXIS_RIGHT_X),
        Axis::RightStickY => Some(layout::AXIS_RIGHT_Y),
        Axis::LeftZ => Some(layout::AXIS_LEFT_Z),
        Axis::RightZ => Some(layout::AXIS_RIGHT_Z),
        Axis::DPadX => Some(layout::AXIS_DPAD_X),
        Axis::DPadY => Some(layout::AXIS_DPAD_Y),
        _ => None,
    }
}

/// Internal key index for a gilrs button position
pub fn gilrs_key_index(button: Button) -> Option<usize> {
    match button {
        Button::South => Some(layout::KEY_SOUTH),
        Button::East => Some(layout::KEY_EAST),
        Button::West => Some(layout::KEY_WEST),
        Button::North => Some(layout::KEY_NORTH),
        Button::LeftTrigger => Some(layout::KEY_LEFT_SHOULDER),
        Button::RightTrigger => Some(layout::KEY_RIGHT_SHOULDER),
        Button::LeftTrigger2 => Some(layout::KEY_LEFT_TRIGGER),
        Button::RightTrigger2 => Some(layout::KEY_RIGHT_TRIGGER),
        Button::Select => Some(layout::KEY_SELECT),
        Button::Start => Some(layout::KEY_START),
        Button::Mode => Some(layout::KEY_MODE),
        Button::LeftThumb => Some(layout::KEY_LEFT_THUMB),
        Button::RightThumb => Some(layout::KEY_RIGHT_THUMB),
        Button::DPadUp => Some(layout::KEY_DPAD_UP),
        Button::DPadDown => Some(layout::KEY_DPAD_DOWN),
        Button::DPadLeft => Some(layout::KEY_DPAD_LEFT),
        Button::DPadRight => Some(layout::KEY_DPAD_RIGHT),
        _ => None,
    }
}

const AXES: [Axis; 8] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::LeftZ,
    Axis::RightZ,
    Axis::DPadX,
    Axis::DPadY,
];

const BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::Mode,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
];

pub struct GilrsHost {
    gilrs: Gilrs,
    /// Gamepad id per hardware slot of the last device list
    ids: Vec<Option<GamepadId>>,
}

impl GilrsHost {
    pub fn new() -> Result<Self, gilrs::Error> {
        let gilrs = Gilrs::new()?;
        info!("GilRs initialized");
        Ok(Self { gilrs, ids: Vec::new() })
    }

    fn gamepad_id(&self, device: usize) -> Option<GamepadId> {
        self.ids.get(device).copied().flatten()
    }
}

impl GamepadHost for GilrsHost {
    fn poll(&mut self) {
        // Drain events so gilrs updates its cached state
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            trace!("gilrs event {:?} from {}", event, id);
        }
    }

    fn device_names(&mut self) -> Vec<String> {
        let mut names = Vec::new();
        let mut ids = Vec::new();
        for (id, gamepad) in self.gilrs.gamepads().filter(|(_, gp)| gp.is_connected()) {
            let hw = usize::from(id);
            if names.len() <= hw {
                names.resize(hw + 1, String::new());
                ids.resize(hw + 1, None);
            }
            names[hw] = gamepad.name().to_string();
            ids[hw] = Some(id);
        }
        if ids != self.ids {
            debug!("gilrs devices: {:?}", names);
        }
        self.ids = ids;
        names
    }

    fn axis(&self, device: usize, index: usize) -> f32 {
        let (Some(id), Some(axis)) = (self.gamepad_id(device), AXES.get(index)) else {
            return 0.0;
        };
        self.gilrs
            .connected_gamepad(id)
            .map(|gp| gp.value(*axis))
            .unwrap_or(0.0)
    }

    fn key(&self, device: usize, index: usize) -> bool {
        let (Some(id), Some(button)) = (self.gamepad_id(device), BUTTONS.get(index)) else {
            return false;
        };
        self.gilrs
            .connected_gamepad(id)
            .map(|gp| gp.is_pressed(*button))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_agree_with_index_mapping() {
        for (i, axis) in AXES.iter().enumerate() {
            assert_eq!(gilrs_axis_index(*axis), Some(i));
        }
        for (i, button) in BUTTONS.iter().enumerate() {
            assert_eq!(gilrs_key_index(*button), Some(i));
        }
    }

    #[test]
    fn test_face_buttons_by_position() {
        assert_eq!(gilrs_key_index(Button::South), Some(layout::KEY_SOUTH));
        assert_eq!(gilrs_key_index(Button::North), Some(layout::KEY_NORTH));
        assert_eq!(gilrs_key_index(Button::C), None);
    }
}
