//! Native backend probe
//!
//! Loads XInput (Windows) and gilrs once and opens controllers from them on
//! demand. Either library may be missing; the probe then simply finds
//! nothing through it.

use gilrs::Gilrs;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};

use super::backend::{BackendProbe, GamepadBackend};
use super::joystick::JoystickBackend;

/// Probe over the real controller libraries
pub struct NativeProbe {
    gilrs: Option<Rc<RefCell<Gilrs>>>,
    #[cfg(windows)]
    xinput: Option<Rc<rusty_xinput::XInputHandle>>,
    #[cfg(windows)]
    deadzone: i32,
}

impl NativeProbe {
    pub fn new(deadzone: i32) -> Self {
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                debug!("gilrs initialized");
                Some(Rc::new(RefCell::new(g)))
            },
            Err(e) => {
                warn!("Failed to initialize gilrs: {:?}", e);
                None
            },
        };

        #[cfg(windows)]
        let xinput = match rusty_xinput::XInputHandle::load_default() {
            Ok(handle) => {
                debug!("XInput initialized successfully");
                Some(Rc::new(handle))
            },
            Err(e) => {
                warn!("XInput library not available (falling back to gilrs only): {:?}", e);
                None
            },
        };

        #[cfg(not(windows))]
        let _ = deadzone;

        Self {
            gilrs,
            #[cfg(windows)]
            xinput,
            #[cfg(windows)]
            deadzone,
        }
    }
}

impl BackendProbe for NativeProbe {
    #[cfg(windows)]
    fn open_primary(&mut self) -> Option<Box<dyn GamepadBackend>> {
        use super::xinput::{XInputBackend, PRIMARY_USER_INDEX};

        let handle = self.xinput.as_ref()?;
        XInputBackend::open(handle, PRIMARY_USER_INDEX, self.deadzone)
            .map(|b| Box::new(b) as Box<dyn GamepadBackend>)
    }

    #[cfg(not(windows))]
    fn open_primary(&mut self) -> Option<Box<dyn GamepadBackend>> {
        None
    }

    fn open_fallback(&mut self) -> Option<Box<dyn GamepadBackend>> {
        let gilrs = self.gilrs.as_ref()?;
        JoystickBackend::open_first(gilrs).map(|b| Box::new(b) as Box<dyn GamepadBackend>)
    }
}
