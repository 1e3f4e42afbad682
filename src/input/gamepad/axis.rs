//! Axis channel mapping for gilrs controllers
//!
//! Generic joysticks expose their sticks as X/Y (left) and Z/Rz (right),
//! with analog triggers on Rx/Ry. gilrs reports Y axes pointing up, the
//! joystick protocol reports them pointing down, so Y-type axes are flipped.

use gilrs::{Axis, Button};

use super::state::AxisChannel;

/// How a gilrs axis lands in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisSlot {
    pub channel: AxisChannel,
    pub inverted: bool,
}

/// Map a gilrs stick axis to its snapshot channel
///
/// Trigger axes (`LeftZ`, `RightZ`) return `None`; they are read through
/// [`TRIGGER_SOURCES`] because many drivers report them as buttons.
pub fn gilrs_axis_to_slot(axis: Axis) -> Option<AxisSlot> {
    let (channel, inverted) = match axis {
        Axis::LeftStickX => (AxisChannel::X, false),
        Axis::LeftStickY => (AxisChannel::Y, true),
        Axis::RightStickX => (AxisChannel::Z, false),
        Axis::RightStickY => (AxisChannel::Rz, true),
        _ => return None,
    };
    Some(AxisSlot { channel, inverted })
}

/// Stick axes read on every poll
pub const STICK_AXES: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

/// Trigger sources: (analog button, fallback axis, channel)
pub const TRIGGER_SOURCES: [(Button, Axis, AxisChannel); 2] = [
    (Button::LeftTrigger2, Axis::LeftZ, AxisChannel::Rx),
    (Button::RightTrigger2, Axis::RightZ, AxisChannel::Ry),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stick_slots() {
        assert_eq!(
            gilrs_axis_to_slot(Axis::LeftStickX),
            Some(AxisSlot {
                channel: AxisChannel::X,
                inverted: false
            })
        );
        assert_eq!(
            gilrs_axis_to_slot(Axis::RightStickY),
            Some(AxisSlot {
                channel: AxisChannel::Rz,
                inverted: true
            })
        );
        assert_eq!(gilrs_axis_to_slot(Axis::LeftZ), None);
    }

    #[test]
    fn test_every_stick_axis_has_a_slot() {
        for axis in STICK_AXES {
            assert!(gilrs_axis_to_slot(axis).is_some(), "{:?}", axis);
        }
    }

    #[test]
    fn test_triggers_use_rx_ry() {
        let channels: Vec<_> = TRIGGER_SOURCES.iter().map(|(_, _, c)| *c).collect();
        assert_eq!(channels, vec![AxisChannel::Rx, AxisChannel::Ry]);
    }
}
