//! Gesture detectors used while learning a binding
//!
//! Each detector compares two consecutive snapshots and reports the first
//! gesture of its kind, if any.

use crate::input::gamepad::{AxisChannel, GamepadState, MAX_BUTTONS, POV_CENTERED};

/// Movement between two ticks that counts as deliberate on any channel
pub const STICK_MOVEMENT_THRESHOLD: i32 = 2000;

/// Smaller movement accepted on trigger channels (0..=255 scale)
pub const TRIGGER_MOVEMENT_THRESHOLD: i32 = 10;

/// Lowest button index that went from released to pressed
pub fn detect_rising_button(current: &GamepadState, previous: &GamepadState) -> Option<usize> {
    (0..MAX_BUTTONS).find(|&i| current.button(i) && !previous.button(i))
}

/// First channel that moved enough
///
/// All six channels are checked against the stick threshold first, in
/// X, Y, Z, Rx, Ry, Rz order; only then are the trigger channels checked
/// against the smaller trigger threshold.
pub fn detect_axis_movement(current: &GamepadState, previous: &GamepadState) -> Option<AxisChannel> {
    let moved = |channel: AxisChannel, threshold: i32| {
        (current.axis(channel) - previous.axis(channel)).abs() > threshold
    };

    AxisChannel::ALL
        .into_iter()
        .find(|&c| moved(c, STICK_MOVEMENT_THRESHOLD))
        .or_else(|| {
            AxisChannel::ALL
                .into_iter()
                .filter(|c| c.is_trigger_capable())
                .find(|&c| moved(c, TRIGGER_MOVEMENT_THRESHOLD))
        })
}

/// Angle the hat moved to from centered
pub fn detect_pov_press(current: &GamepadState, previous: &GamepadState) -> Option<i32> {
    (previous.pov == POV_CENTERED && current.pov != POV_CENTERED).then_some(current.pov)
}
