//! Joystick-protocol backend on top of gilrs
//!
//! gilrs keeps a cached state per gamepad that is refreshed as events are
//! pumped, so a poll drains the event queue first and then reads the cache.
//! The context is shared with the probe because gilrs must be a singleton
//! per process.

use gilrs::{Gamepad, GamepadId, Gilrs, MappingSource};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

use super::axis::{gilrs_axis_to_slot, STICK_AXES, TRIGGER_SOURCES};
use super::backend::GamepadBackend;
use super::buttons::{gilrs_button_to_index, INDEXED_BUTTONS};
use super::device_id::DeviceId;
use super::normalize::{joystick_axis, joystick_trigger, pov_eight_way};
use super::state::GamepadState;
use crate::error::BackendError;

/// Enumeration class, in selection priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeviceClass {
    /// Driver-provided gamepad layout
    GameController,
    /// Generic joystick with a community (SDL) mapping
    Joystick,
    /// Anything else gilrs exposes
    Miscellaneous,
}

impl DeviceClass {
    pub fn from_mapping_source(source: MappingSource) -> Self {
        match source {
            MappingSource::Driver => Self::GameController,
            MappingSource::SdlMappings => Self::Joystick,
            MappingSource::None => Self::Miscellaneous,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::GameController => "game controller",
            Self::Joystick => "joystick",
            Self::Miscellaneous => "control device",
        }
    }
}

/// Open the first candidate that can be opened, walking classes in
/// priority order and keeping enumeration order within a class.
pub fn select_first_openable<T, B>(
    mut candidates: Vec<(DeviceClass, T)>,
    mut open: impl FnMut(&T) -> Option<B>,
) -> Option<B> {
    candidates.sort_by_key(|(class, _)| *class);
    candidates.iter().find_map(|(_, candidate)| open(candidate))
}

/// Drain pending gilrs events so cached gamepad state is current
pub(crate) fn pump_events(gilrs: &mut Gilrs) {
    while let Some(event) = gilrs.next_event() {
        trace!("gilrs event: {:?}", event);
    }
}

/// One opened gilrs gamepad
pub struct JoystickBackend {
    gilrs: Rc<RefCell<Gilrs>>,
    id: GamepadId,
    name: String,
    class: DeviceClass,
}

impl JoystickBackend {
    /// Enumerate connected gamepads and open the best one
    pub fn open_first(gilrs: &Rc<RefCell<Gilrs>>) -> Option<Self> {
        let candidates: Vec<(DeviceClass, GamepadId)> = {
            let mut ctx = gilrs.borrow_mut();
            pump_events(&mut ctx);
            ctx.gamepads()
                .map(|(id, gp)| (DeviceClass::from_mapping_source(gp.mapping_source()), id))
                .collect()
        };

        select_first_openable(candidates, |id| Self::open(gilrs, *id))
    }

    fn open(gilrs: &Rc<RefCell<Gilrs>>, id: GamepadId) -> Option<Self> {
        let ctx = gilrs.borrow();
        let gamepad = ctx.connected_gamepad(id)?;
        let backend = Self {
            gilrs: Rc::clone(gilrs),
            id,
            name: gamepad.name().to_string(),
            class: DeviceClass::from_mapping_source(gamepad.mapping_source()),
        };
        debug!("Opened gilrs gamepad {:?} \"{}\" as {}", id, backend.name, backend.class.label());
        Some(backend)
    }

    pub fn class(&self) -> DeviceClass {
        self.class
    }
}

/// Read a gilrs gamepad into the joystick-protocol snapshot
fn read_gamepad(gamepad: &Gamepad<'_>) -> GamepadState {
    let mut state = GamepadState::default();

    for button in INDEXED_BUTTONS {
        if let Some(index) = gilrs_button_to_index(button) {
            state.buttons[index] = gamepad.is_pressed(button);
        }
    }

    // Unmapped channels rest at center like a real joystick driver
    state.x = joystick_axis(0.0);
    state.y = joystick_axis(0.0);
    state.z = joystick_axis(0.0);
    state.rz = joystick_axis(0.0);

    for axis in STICK_AXES {
        if let Some(slot) = gilrs_axis_to_slot(axis) {
            let raw = gamepad.value(axis);
            let value = if slot.inverted { -raw } else { raw };
            state = state.with_axis(slot.channel, joystick_axis(value));
        }
    }

    for (button, fallback_axis, channel) in TRIGGER_SOURCES {
        let raw = gamepad
            .button_data(button)
            .map(|data| data.value())
            .unwrap_or_else(|| gamepad.value(fallback_axis));
        state = state.with_axis(channel, joystick_trigger(raw));
    }

    state.pov = pov_eight_way(
        gamepad.is_pressed(gilrs::Button::DPadUp),
        gamepad.is_pressed(gilrs::Button::DPadRight),
        gamepad.is_pressed(gilrs::Button::DPadDown),
        gamepad.is_pressed(gilrs::Button::DPadLeft),
    );

    state
}

impl GamepadBackend for JoystickBackend {
    fn id(&self) -> DeviceId {
        DeviceId::from_gilrs(self.id)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }

    fn poll(&mut self) -> Result<GamepadState, BackendError> {
        let mut ctx = self.gilrs.borrow_mut();
        pump_events(&mut ctx);
        let gamepad = ctx
            .connected_gamepad(self.id)
            .ok_or_else(|| BackendError::TransientPollFailure("gamepad not connected".to_string()))?;
        Ok(read_gamepad(&gamepad))
    }

    fn reacquire(&mut self) -> Result<(), BackendError> {
        let mut ctx = self.gilrs.borrow_mut();
        pump_events(&mut ctx);
        if ctx.connected_gamepad(self.id).is_some() {
            Ok(())
        } else {
            Err(BackendError::DeviceAbsent)
        }
    }
}
