//! XInput backend (Windows only)
//!
//! XInput is polled directly by user index and needs no focused window.
//! Only user index 0 is used.

use rusty_xinput::{XInputHandle, XInputState, XInputUsageError};
use std::rc::Rc;

use super::backend::GamepadBackend;
use super::device_id::DeviceId;
use super::state::GamepadState;
use super::xinput_convert::{convert_xinput_pad, XInputPad};
use crate::error::BackendError;

/// User index the primary backend reads
pub const PRIMARY_USER_INDEX: u32 = 0;

/// Poll XInput controller state
///
/// Returns `Ok(None)` when the slot is empty.
pub fn poll_xinput_controller(
    handle: &XInputHandle,
    user_index: u32,
) -> Result<Option<XInputState>, XInputUsageError> {
    match handle.get_state(user_index) {
        Ok(state) => Ok(Some(state)),
        Err(XInputUsageError::DeviceNotConnected) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Controller on one XInput user index
pub struct XInputBackend {
    handle: Rc<XInputHandle>,
    user_index: u32,
    deadzone: i32,
}

impl XInputBackend {
    /// Open the slot if a controller is connected to it
    pub fn open(handle: &Rc<XInputHandle>, user_index: u32, deadzone: i32) -> Option<Self> {
        match poll_xinput_controller(handle, user_index) {
            Ok(Some(_)) => Some(Self {
                handle: Rc::clone(handle),
                user_index,
                deadzone,
            }),
            _ => None,
        }
    }
}

impl GamepadBackend for XInputBackend {
    fn id(&self) -> DeviceId {
        DeviceId::XInput(self.user_index)
    }

    fn describe(&self) -> String {
        format!("XInput Controller {}", self.user_index + 1)
    }

    fn poll(&mut self) -> Result<GamepadState, BackendError> {
        match poll_xinput_controller(&self.handle, self.user_index) {
            Ok(Some(raw)) => Ok(convert_xinput_pad(&XInputPad::from(&raw), self.deadzone)),
            Ok(None) => Err(BackendError::DeviceAbsent),
            Err(e) => Err(BackendError::TransientPollFailure(format!("{:?}", e))),
        }
    }
}
