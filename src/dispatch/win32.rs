//! Win32 implementation of [`WindowSystem`]

use windows::core::PCWSTR;
use windows::Win32::Foundation::{HWND, LPARAM, RECT, WPARAM};
use windows::Win32::UI::Input::KeyboardAndMouse::{
    mouse_event, MOUSEEVENTF_LEFTDOWN, MOUSEEVENTF_LEFTUP,
};
use windows::Win32::UI::WindowsAndMessaging::{
    BringWindowToTop, FindWindowW, GetWindowLongW, GetWindowRect, SendMessageW, SetCursorPos,
    SetForegroundWindow, ShowWindow, GWL_STYLE, SW_MINIMIZE, WM_COMMAND, WM_KEYDOWN, WM_KEYUP,
};

use super::window::{VirtualKey, WindowHandle, WindowSystem};

/// Null-terminated UTF-16 copy of `s`
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0)
}

fn find(class: Option<&str>, title: Option<&str>) -> Option<WindowHandle> {
    let class = class.map(wide);
    let title = title.map(wide);
    let class_ptr = class
        .as_ref()
        .map_or(PCWSTR::null(), |c| PCWSTR::from_raw(c.as_ptr()));
    let title_ptr = title
        .as_ref()
        .map_or(PCWSTR::null(), |t| PCWSTR::from_raw(t.as_ptr()));

    let found = unsafe { FindWindowW(class_ptr, title_ptr) };
    (found.0 != 0).then_some(WindowHandle(found.0))
}

/// Desktop access through user32
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32WindowSystem;

impl WindowSystem for Win32WindowSystem {
    fn find_by_class(&self, class: &str) -> Option<WindowHandle> {
        find(Some(class), None)
    }

    fn find_by_title(&self, title: &str) -> Option<WindowHandle> {
        find(None, Some(title))
    }

    fn is_ready(&self, window: WindowHandle) -> bool {
        unsafe { GetWindowLongW(hwnd(window), GWL_STYLE) != 0 }
    }

    fn send_command(&self, window: WindowHandle, command_id: u16) {
        unsafe {
            SendMessageW(
                hwnd(window),
                WM_COMMAND,
                WPARAM(usize::from(command_id)),
                LPARAM(0),
            );
        }
    }

    fn key_down(&self, window: WindowHandle, key: VirtualKey) {
        unsafe {
            SendMessageW(hwnd(window), WM_KEYDOWN, WPARAM(usize::from(key.code())), LPARAM(0));
        }
    }

    fn key_up(&self, window: WindowHandle, key: VirtualKey) {
        unsafe {
            SendMessageW(hwnd(window), WM_KEYUP, WPARAM(usize::from(key.code())), LPARAM(0));
        }
    }

    fn minimize(&self, window: WindowHandle) {
        unsafe {
            let _ = ShowWindow(hwnd(window), SW_MINIMIZE);
        }
    }

    fn bring_to_front(&self, window: WindowHandle) {
        unsafe {
            let _ = BringWindowToTop(hwnd(window));
            let _ = SetForegroundWindow(hwnd(window));
        }
    }

    fn click_center(&self, window: WindowHandle) {
        let mut rect = RECT::default();
        unsafe {
            if GetWindowRect(hwnd(window), &mut rect).is_err() {
                return;
            }
            let x = rect.left + (rect.right - rect.left) / 2;
            let y = rect.top + (rect.bottom - rect.top) / 2;
            let _ = SetCursorPos(x, y);
            mouse_event(MOUSEEVENTF_LEFTDOWN, 0, 0, 0, 0);
            mouse_event(MOUSEEVENTF_LEFTUP, 0, 0, 0, 0);
        }
    }
}
