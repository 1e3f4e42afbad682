//! Controller diagnostics for `--list-devices`

use gilrs::{Event, EventType, Gilrs};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

use super::axis::STICK_AXES;
use super::buttons::{gilrs_button_to_index, INDEXED_BUTTONS};
use super::joystick::DeviceClass;

/// Print every controller both backends can see
///
/// Bluetooth controllers can take a moment to show up, so gilrs events are
/// pumped for a few seconds before enumerating.
pub fn print_gamepad_diagnostics() {
    info!("=== Controller Diagnostics ===");
    info!("Platform: {}", std::env::consts::OS);

    print_xinput_slots();

    let mut gilrs = match Gilrs::new() {
        Ok(g) => g,
        Err(e) => {
            info!("❌ Failed to initialize gilrs: {:?}", e);
            return;
        },
    };

    info!("⏳ Waiting for controllers to connect (3 seconds)...");
    let start = Instant::now();
    while start.elapsed() < Duration::from_secs(3) {
        while let Some(Event { event, .. }) = gilrs.next_event() {
            if event == EventType::Connected {
                info!("   📶 Controller connection detected...");
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    let gamepads: Vec<_> = gilrs.gamepads().collect();
    if gamepads.is_empty() {
        info!("⚠️  No joystick-protocol devices detected");
        return;
    }

    info!("✅ Found {} joystick-protocol device(s):", gamepads.len());
    for (id, gamepad) in gamepads {
        let class = DeviceClass::from_mapping_source(gamepad.mapping_source());
        info!("📋 gilrs:{} \"{}\"", usize::from(id), gamepad.name());
        info!("   Class: {}", class.label());
        info!("   Power Info: {:?}", gamepad.power_info());

        let pressed: Vec<usize> = INDEXED_BUTTONS
            .iter()
            .filter(|b| gamepad.is_pressed(**b))
            .filter_map(|b| gilrs_button_to_index(*b))
            .collect();
        if pressed.is_empty() {
            info!("   Buttons: (none pressed)");
        } else {
            info!("   Buttons pressed: {:?}", pressed);
        }

        for axis in STICK_AXES {
            let value = gamepad.value(axis);
            if value.abs() > 0.01 {
                info!("   {:?}: {:.3}", axis, value);
            }
        }
    }
    info!("=== End Diagnostics ===");
}

#[cfg(windows)]
fn print_xinput_slots() {
    use super::xinput::poll_xinput_controller;

    let handle = match rusty_xinput::XInputHandle::load_default() {
        Ok(h) => h,
        Err(e) => {
            info!("❌ XInput not available: {:?}", e);
            return;
        },
    };

    for user_index in 0..4u32 {
        match poll_xinput_controller(&handle, user_index) {
            Ok(Some(_)) => info!("🎮 XInput slot {}: connected", user_index),
            Ok(None) => info!("   XInput slot {}: empty", user_index),
            Err(e) => info!("   XInput slot {}: error {:?}", user_index, e),
        }
    }
}

#[cfg(not(windows))]
fn print_xinput_slots() {
    info!("XInput: not available on this platform");
}
