//! Normalized controller snapshot shared by every backend
//!
//! Both protocols produce the same [`GamepadState`] shape. Axis ranges still
//! differ per backend (see [`AxisChannel`]), which is why axis rules carry an
//! auto-threshold policy instead of assuming one scale.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of index-addressed buttons in a snapshot
pub const MAX_BUTTONS: usize = 32;

/// POV value meaning "centered / no direction"
pub const POV_CENTERED: i32 = -1;

/// One of the six analog channels of a snapshot
///
/// XInput fills them as: X/Y left stick, Z/Rx right stick (-32768..=32767),
/// Ry/Rz left/right trigger (0..=255). The joystick backend reports every
/// channel in 0..=65535.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisChannel {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
}

impl AxisChannel {
    pub const ALL: [AxisChannel; 6] = [
        AxisChannel::X,
        AxisChannel::Y,
        AxisChannel::Z,
        AxisChannel::Rx,
        AxisChannel::Ry,
        AxisChannel::Rz,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AxisChannel::X => "X",
            AxisChannel::Y => "Y",
            AxisChannel::Z => "Z",
            AxisChannel::Rx => "Rx",
            AxisChannel::Ry => "Ry",
            AxisChannel::Rz => "Rz",
        }
    }

    /// Channels that carry XInput triggers (small 0..=255 range)
    pub fn is_trigger_capable(self) -> bool {
        matches!(self, AxisChannel::Ry | AxisChannel::Rz)
    }

    fn index(self) -> usize {
        match self {
            AxisChannel::X => 0,
            AxisChannel::Y => 1,
            AxisChannel::Z => 2,
            AxisChannel::Rx => 3,
            AxisChannel::Ry => 4,
            AxisChannel::Rz => 5,
        }
    }
}

impl fmt::Display for AxisChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AxisChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown axis channel '{}'", s))
    }
}

/// Immutable controller snapshot produced once per poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GamepadState {
    pub buttons: [bool; MAX_BUTTONS],
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub rx: i32,
    pub ry: i32,
    pub rz: i32,
    /// Hundredths of a degree clockwise from up, or [`POV_CENTERED`]
    pub pov: i32,
}

impl Default for GamepadState {
    fn default() -> Self {
        Self {
            buttons: [false; MAX_BUTTONS],
            x: 0,
            y: 0,
            z: 0,
            rx: 0,
            ry: 0,
            rz: 0,
            pov: POV_CENTERED,
        }
    }
}

impl GamepadState {
    /// Button state, `false` for indices outside the snapshot
    pub fn button(&self, index: usize) -> bool {
        self.buttons.get(index).copied().unwrap_or(false)
    }

    pub fn axis(&self, channel: AxisChannel) -> i32 {
        self.axes()[channel.index()]
    }

    /// Axis values in [`AxisChannel::ALL`] order
    pub fn axes(&self) -> [i32; 6] {
        [self.x, self.y, self.z, self.rx, self.ry, self.rz]
    }

    pub fn pressed_buttons(&self) -> impl Iterator<Item = usize> + '_ {
        self.buttons
            .iter()
            .enumerate()
            .filter(|(_, &down)| down)
            .map(|(i, _)| i)
    }

    /// Copy with one button changed (test and conversion helper)
    pub fn with_button(mut self, index: usize, pressed: bool) -> Self {
        if let Some(slot) = self.buttons.get_mut(index) {
            *slot = pressed;
        }
        self
    }

    /// Copy with one axis changed
    pub fn with_axis(mut self, channel: AxisChannel, value: i32) -> Self {
        match channel {
            AxisChannel::X => self.x = value,
            AxisChannel::Y => self.y = value,
            AxisChannel::Z => self.z = value,
            AxisChannel::Rx => self.rx = value,
            AxisChannel::Ry => self.ry = value,
            AxisChannel::Rz => self.rz = value,
        }
        self
    }

    pub fn with_pov(mut self, pov: i32) -> Self {
        self.pov = pov;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_centered() {
        let s = GamepadState::default();
        assert_eq!(s.pov, POV_CENTERED);
        assert_eq!(s.pressed_buttons().count(), 0);
        assert_eq!(s.axes(), [0; 6]);
    }

    #[test]
    fn test_out_of_range_button_is_released() {
        let s = GamepadState::default().with_button(MAX_BUTTONS + 4, true);
        assert!(!s.button(MAX_BUTTONS + 4));
        assert_eq!(s.pressed_buttons().count(), 0);
    }

    #[test]
    fn test_axis_accessors() {
        let s = GamepadState::default()
            .with_axis(AxisChannel::Rx, -1200)
            .with_axis(AxisChannel::Rz, 255);
        assert_eq!(s.axis(AxisChannel::Rx), -1200);
        assert_eq!(s.axis(AxisChannel::Rz), 255);
        assert_eq!(s.axis(AxisChannel::X), 0);
    }

    #[test]
    fn test_axis_channel_parse() {
        assert_eq!("rx".parse::<AxisChannel>(), Ok(AxisChannel::Rx));
        assert_eq!(" Z ".parse::<AxisChannel>(), Ok(AxisChannel::Z));
        assert!("W".parse::<AxisChannel>().is_err());
        assert!(AxisChannel::Ry.is_trigger_capable());
        assert!(!AxisChannel::X.is_trigger_capable());
    }
}
