//! XInput state to GamepadState conversion
//!
//! The conversion works on a plain copy of the XInput report so it can be
//! exercised on any platform; only the `From<&XInputState>` bridge is
//! Windows-specific.

use super::normalize::{apply_stick_deadzone, pov_four_way};
use super::state::GamepadState;

/// XInput button bit flags
///
/// rusty_xinput doesn't export individual button constants,
/// so we define them here based on the XInput API spec.
pub mod button_flags {
    pub const DPAD_UP: u16 = 0x0001;
    pub const DPAD_DOWN: u16 = 0x0002;
    pub const DPAD_LEFT: u16 = 0x0004;
    pub const DPAD_RIGHT: u16 = 0x0008;
    pub const START: u16 = 0x0010;
    pub const BACK: u16 = 0x0020;
    pub const LEFT_THUMB: u16 = 0x0040;
    pub const RIGHT_THUMB: u16 = 0x0080;
    pub const LEFT_SHOULDER: u16 = 0x0100;
    pub const RIGHT_SHOULDER: u16 = 0x0200;
    pub const A: u16 = 0x1000;
    pub const B: u16 = 0x2000;
    pub const X: u16 = 0x4000;
    pub const Y: u16 = 0x8000;
}

/// Button index order of the fixed XInput layout
const BUTTON_ORDER: [u16; 10] = [
    button_flags::A,
    button_flags::B,
    button_flags::X,
    button_flags::Y,
    button_flags::LEFT_SHOULDER,
    button_flags::RIGHT_SHOULDER,
    button_flags::BACK,
    button_flags::START,
    button_flags::LEFT_THUMB,
    button_flags::RIGHT_THUMB,
];

/// Raw XInput gamepad report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XInputPad {
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

#[cfg(windows)]
impl From<&rusty_xinput::XInputState> for XInputPad {
    fn from(state: &rusty_xinput::XInputState) -> Self {
        Self {
            buttons: state.raw.Gamepad.wButtons,
            left_trigger: state.left_trigger(),
            right_trigger: state.right_trigger(),
            thumb_lx: state.raw.Gamepad.sThumbLX,
            thumb_ly: state.raw.Gamepad.sThumbLY,
            thumb_rx: state.raw.Gamepad.sThumbRX,
            thumb_ry: state.raw.Gamepad.sThumbRY,
        }
    }
}

/// Convert an XInput report to the shared snapshot shape
///
/// Layout: buttons 0-9 = A, B, X, Y, LB, RB, Back, Start, L3, R3; X/Y left
/// stick, Z/Rx right stick (deadzoned), Ry/Rz left/right trigger (0-255);
/// D-Pad folded into a four-way POV.
pub fn convert_xinput_pad(pad: &XInputPad, deadzone: i32) -> GamepadState {
    let mut state = GamepadState::default();

    for (index, flag) in BUTTON_ORDER.iter().enumerate() {
        state.buttons[index] = pad.buttons & flag != 0;
    }

    state.x = apply_stick_deadzone(pad.thumb_lx, deadzone);
    state.y = apply_stick_deadzone(pad.thumb_ly, deadzone);
    state.z = apply_stick_deadzone(pad.thumb_rx, deadzone);
    state.rx = apply_stick_deadzone(pad.thumb_ry, deadzone);
    state.ry = i32::from(pad.left_trigger);
    state.rz = i32::from(pad.right_trigger);

    state.pov = pov_four_way(
        pad.buttons & button_flags::DPAD_UP != 0,
        pad.buttons & button_flags::DPAD_RIGHT != 0,
        pad.buttons & button_flags::DPAD_DOWN != 0,
        pad.buttons & button_flags::DPAD_LEFT != 0,
    );

    state
}
