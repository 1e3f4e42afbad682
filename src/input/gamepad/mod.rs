//! Gamepad input: two native protocols behind one snapshot shape
//!
//! XInput (Windows) is the primary protocol and gilrs the fallback for
//! everything else. Both produce a [`GamepadState`]; the
//! [`DeviceManager`] picks a backend and handles reconnection.

pub mod axis;
pub mod backend;
pub mod buttons;
pub mod device_id;
pub mod diagnostics;
pub mod joystick;
pub mod normalize;
pub mod probe;
pub mod state;
#[cfg(windows)]
pub mod xinput;
pub mod xinput_convert;

pub use backend::{BackendProbe, DeviceManager, GamepadBackend, DEFAULT_RECONNECT_INTERVAL};
pub use device_id::DeviceId;
pub use diagnostics::print_gamepad_diagnostics;
pub use probe::NativeProbe;
pub use state::{AxisChannel, GamepadState, MAX_BUTTONS, POV_CENTERED};
