//! Device identification across backends
//!
//! A single identifier type for whichever protocol currently owns the
//! controller, used in status lines and logs.

use std::fmt;

/// Identifier of the opened controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceId {
    /// XInput user index (0-3)
    XInput(u32),

    /// gilrs gamepad id, as `usize`
    Joystick(usize),
}

impl DeviceId {
    pub fn from_gilrs(id: gilrs::GamepadId) -> Self {
        Self::Joystick(usize::from(id))
    }

    pub fn is_xinput(&self) -> bool {
        matches!(self, Self::XInput(_))
    }
}

/// Stable string identifier for logging
///
/// # Examples
/// - XInput: "xinput:0"
/// - gilrs: "gilrs:3"
impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XInput(idx) => write!(f, "xinput:{}", idx),
            Self::Joystick(idx) => write!(f, "gilrs:{}", idx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(DeviceId::XInput(0).to_string(), "xinput:0");
        assert_eq!(DeviceId::Joystick(2).to_string(), "gilrs:2");
    }

    #[test]
    fn test_equality() {
        assert_eq!(DeviceId::XInput(0), DeviceId::XInput(0));
        assert_ne!(DeviceId::XInput(0), DeviceId::XInput(1));
        assert_ne!(DeviceId::XInput(0), DeviceId::Joystick(0));
        assert!(DeviceId::XInput(1).is_xinput());
    }
}
