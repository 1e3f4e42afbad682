//! Shared normalization functions for raw stick, trigger and hat values.
//!
//! Both backends funnel their raw readings through these helpers so that a
//! single rule set works with either protocol.
//!
//! # Ranges
//!
//! - XInput sticks stay in their native signed 16-bit range, with a per-axis
//!   deadzone applied ([`apply_stick_deadzone`]).
//! - XInput triggers stay in 0..=255 and are never deadzoned.
//! - gilrs values (-1.0..=1.0) are rescaled to the unsigned 0..=65535 range
//!   classic joystick drivers report ([`joystick_axis`], [`joystick_trigger`]).

use super::state::POV_CENTERED;

/// Absolute stick value below which XInput axes are treated as centered.
pub const XINPUT_STICK_DEADZONE: i32 = 8000;

/// Full scale of a joystick-protocol axis.
pub const JOYSTICK_AXIS_MAX: i32 = 65535;

/// POV angles in hundredths of a degree
pub mod pov {
    pub const UP: i32 = 0;
    pub const UP_RIGHT: i32 = 4500;
    pub const RIGHT: i32 = 9000;
    pub const DOWN_RIGHT: i32 = 13500;
    pub const DOWN: i32 = 18000;
    pub const DOWN_LEFT: i32 = 22500;
    pub const LEFT: i32 = 27000;
    pub const UP_LEFT: i32 = 31500;
}

/// Zero an XInput stick axis whose magnitude is inside the deadzone.
///
/// # Example
/// ```
/// use pad_remote::input::gamepad::normalize::{apply_stick_deadzone, XINPUT_STICK_DEADZONE};
///
/// assert_eq!(apply_stick_deadzone(-7999, XINPUT_STICK_DEADZONE), 0);
/// assert_eq!(apply_stick_deadzone(8000, XINPUT_STICK_DEADZONE), 8000);
/// assert_eq!(apply_stick_deadzone(i16::MIN, XINPUT_STICK_DEADZONE), -32768);
/// ```
pub fn apply_stick_deadzone(raw: i16, deadzone: i32) -> i32 {
    let value = i32::from(raw);
    if value.abs() < deadzone {
        0
    } else {
        value
    }
}

/// Map a gilrs stick value (-1.0..=1.0) to 0..=65535, centered at 32768.
pub fn joystick_axis(value: f32) -> i32 {
    let clamped = value.clamp(-1.0, 1.0);
    (((clamped + 1.0) / 2.0) * JOYSTICK_AXIS_MAX as f32).round() as i32
}

/// Map a gilrs trigger value (0.0..=1.0) to 0..=65535.
pub fn joystick_trigger(value: f32) -> i32 {
    (value.clamp(0.0, 1.0) * JOYSTICK_AXIS_MAX as f32).round() as i32
}

/// Four-way hat as XInput reports it: the first pressed direction wins in
/// up, right, down, left order. No diagonals.
pub fn pov_four_way(up: bool, right: bool, down: bool, left: bool) -> i32 {
    if up {
        pov::UP
    } else if right {
        pov::RIGHT
    } else if down {
        pov::DOWN
    } else if left {
        pov::LEFT
    } else {
        POV_CENTERED
    }
}

/// Eight-way hat as joystick drivers report it.
///
/// Opposing directions cancel out.
pub fn pov_eight_way(up: bool, right: bool, down: bool, left: bool) -> i32 {
    let vertical = i8::from(up) - i8::from(down);
    let horizontal = i8::from(right) - i8::from(left);

    match (vertical, horizontal) {
        (1, 0) => pov::UP,
        (1, 1) => pov::UP_RIGHT,
        (0, 1) => pov::RIGHT,
        (-1, 1) => pov::DOWN_RIGHT,
        (-1, 0) => pov::DOWN,
        (-1, -1) => pov::DOWN_LEFT,
        (0, -1) => pov::LEFT,
        (1, -1) => pov::UP_LEFT,
        _ => POV_CENTERED,
    }
}
