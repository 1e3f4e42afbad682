//! Button index mapping for gilrs controllers
//!
//! The joystick protocol addresses buttons by index. gilrs reports them by
//! physical position, so this module pins every position to a stable index
//! in the order generic HID pads usually enumerate them:
//!
//! ```text
//!       [3/North]
//!   [0/West] [2/East]
//!       [1/South]
//! ```
//!
//! D-Pad buttons have no index; they are folded into the POV hat.

use gilrs::Button;
use tracing::warn;

/// Buttons the joystick backend reads on every poll, in index order
pub const INDEXED_BUTTONS: [Button; 15] = [
    Button::West,
    Button::South,
    Button::East,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::Mode,
    Button::C,
    Button::Z,
];

/// Map a gilrs button to its snapshot index
///
/// Returns `None` for D-Pad buttons and unknown buttons.
pub fn gilrs_button_to_index(button: Button) -> Option<usize> {
    match button {
        Button::DPadUp | Button::DPadDown | Button::DPadLeft | Button::DPadRight => None,
        Button::Unknown => {
            warn!("Unknown gilrs button: {:?}", button);
            None
        },
        other => INDEXED_BUTTONS.iter().position(|b| *b == other),
    }
}
