//! Window-system seam used by the player controllers
//!
//! Everything the controllers need from the desktop goes through
//! [`WindowSystem`], so the command tables can be tested without a desktop.

/// Opaque native window handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

/// Virtual key codes used by the key-injection sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum VirtualKey {
    Shift = 0x10,
    Control = 0x11,
    Space = 0x20,
    Left = 0x25,
    Up = 0x26,
    Right = 0x27,
    Down = 0x28,
    F = 0x46,
    N = 0x4E,
    P = 0x50,
    S = 0x53,
}

impl VirtualKey {
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Desktop operations needed to drive a player window
pub trait WindowSystem: Send + Sync {
    /// Top-level window with this class name
    fn find_by_class(&self, class: &str) -> Option<WindowHandle>;

    /// Top-level window with exactly this title
    fn find_by_title(&self, title: &str) -> Option<WindowHandle>;

    /// Whether the window finished starting (non-zero style)
    fn is_ready(&self, window: WindowHandle) -> bool;

    /// Post a menu command (`WM_COMMAND`) to the window
    fn send_command(&self, window: WindowHandle, command_id: u16);

    fn key_down(&self, window: WindowHandle, key: VirtualKey);

    fn key_up(&self, window: WindowHandle, key: VirtualKey);

    fn minimize(&self, window: WindowHandle);

    /// Raise the window and make it the foreground window
    fn bring_to_front(&self, window: WindowHandle);

    /// Left-click the center of the window
    fn click_center(&self, window: WindowHandle);
}

/// Window system for platforms without a player to drive
///
/// Never finds a window, so every action is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullWindowSystem;

impl WindowSystem for NullWindowSystem {
    fn find_by_class(&self, _class: &str) -> Option<WindowHandle> {
        None
    }

    fn find_by_title(&self, _title: &str) -> Option<WindowHandle> {
        None
    }

    fn is_ready(&self, _window: WindowHandle) -> bool {
        false
    }

    fn send_command(&self, _window: WindowHandle, _command_id: u16) {}

    fn key_down(&self, _window: WindowHandle, _key: VirtualKey) {}

    fn key_up(&self, _window: WindowHandle, _key: VirtualKey) {}

    fn minimize(&self, _window: WindowHandle) {}

    fn bring_to_front(&self, _window: WindowHandle) {}

    fn click_center(&self, _window: WindowHandle) {}
}
