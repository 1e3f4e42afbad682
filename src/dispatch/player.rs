//! Player control over MPC-HC/MPC-BE (menu commands) and VLC (key injection)

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::debug;

use super::window::{VirtualKey, WindowHandle, WindowSystem};
use super::PlayerControl;

/// How a player window is located
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    pub classes: Vec<&'static str>,
    pub titles: Vec<&'static str>,
}

impl TargetSpec {
    /// Media Player Classic (HC, legacy, BE)
    pub fn mpc() -> Self {
        Self {
            classes: vec![
                "MediaPlayerClassicW64",
                "MediaPlayerClassicW",
                "MediaPlayerClassic",
                "Media Player Classic",
                "MPC-BE",
                "MPC-BE x64",
            ],
            titles: vec!["Media Player Classic", "MPC-BE"],
        }
    }

    pub fn vlc() -> Self {
        Self {
            classes: vec!["Qt5QWindowIcon", "QWidget", "vlc", "VLC media player"],
            titles: vec!["VLC media player"],
        }
    }

    /// Classes first, then titles
    pub fn locate(&self, windows: &dyn WindowSystem) -> Option<WindowHandle> {
        self.classes
            .iter()
            .find_map(|class| windows.find_by_class(class))
            .or_else(|| self.titles.iter().find_map(|title| windows.find_by_title(title)))
    }
}

/// MPC `WM_COMMAND` identifiers
pub mod mpc_command {
    pub const PLAY_PAUSE: u16 = 889;
    pub const STOP: u16 = 890;
    pub const SEEK_BACKWARD: u16 = 899;
    pub const SEEK_FORWARD: u16 = 900;
    pub const VOLUME_UP: u16 = 907;
    pub const VOLUME_DOWN: u16 = 908;
    pub const PREVIOUS: u16 = 921;
    pub const NEXT: u16 = 922;
    pub const FULLSCREEN: u16 = 830;
}

/// Delays inside the key-injection sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTiming {
    /// Before every single-key press
    pub key_settle: Duration,
    /// Between the three steps of "previous"
    pub sequence_gap: Duration,
    /// Between stop and minimize
    pub minimize_delay: Duration,
    /// After raising the window and after clicking it
    pub focus_settle: Duration,
}

impl Default for KeyTiming {
    fn default() -> Self {
        Self {
            key_settle: Duration::from_millis(50),
            sequence_gap: Duration::from_millis(30),
            minimize_delay: Duration::from_millis(40),
            focus_settle: Duration::from_millis(80),
        }
    }
}

impl KeyTiming {
    /// No delays at all
    pub fn immediate() -> Self {
        Self {
            key_settle: Duration::ZERO,
            sequence_gap: Duration::ZERO,
            minimize_delay: Duration::ZERO,
            focus_settle: Duration::ZERO,
        }
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// Resolved target for one action
enum Target {
    Mpc(WindowHandle),
    Vlc(WindowHandle),
}

/// [`PlayerControl`] driving whichever supported player is running
///
/// MPC is always preferred when both are open.
pub struct MediaPlayerControl<W: WindowSystem> {
    windows: W,
    mpc: TargetSpec,
    vlc: TargetSpec,
    timing: KeyTiming,
    /// VLC ignores keys on first launch until it has been clicked once
    focused_once: AtomicBool,
}

impl<W: WindowSystem> MediaPlayerControl<W> {
    pub fn new(windows: W) -> Self {
        Self::with_timing(windows, KeyTiming::default())
    }

    pub fn with_timing(windows: W, timing: KeyTiming) -> Self {
        Self {
            windows,
            mpc: TargetSpec::mpc(),
            vlc: TargetSpec::vlc(),
            timing,
            focused_once: AtomicBool::new(false),
        }
    }

    pub fn window_system(&self) -> &W {
        &self.windows
    }

    fn target(&self) -> Option<Target> {
        if let Some(window) = self.mpc.locate(&self.windows) {
            return Some(Target::Mpc(window));
        }
        if let Some(window) = self.vlc.locate(&self.windows) {
            return Some(Target::Vlc(window));
        }
        debug!("No player window found");
        None
    }

    /// MPC ignores commands until its window is fully created
    fn send_mpc(&self, window: WindowHandle, command_id: u16) {
        if !self.windows.is_ready(window) {
            debug!("MPC window not ready, dropping command {}", command_id);
            return;
        }
        self.windows.send_command(window, command_id);
    }

    fn send_key(&self, window: WindowHandle, key: VirtualKey) {
        pause(self.timing.key_settle);
        self.windows.key_down(window, key);
        self.windows.key_up(window, key);
    }

    fn send_combo(&self, window: WindowHandle, modifier: VirtualKey, key: VirtualKey) {
        self.windows.key_down(window, modifier);
        self.windows.key_down(window, key);
        self.windows.key_up(window, key);
        self.windows.key_up(window, modifier);
    }

    fn focus(&self, window: WindowHandle) {
        self.windows.bring_to_front(window);
        pause(self.timing.focus_settle);
        self.windows.click_center(window);
        pause(self.timing.focus_settle);
    }

    /// MPC command, or the VLC sequence when only VLC runs
    fn run(&self, command_id: u16, vlc: impl FnOnce(WindowHandle)) {
        match self.target() {
            Some(Target::Mpc(window)) => self.send_mpc(window, command_id),
            Some(Target::Vlc(window)) => vlc(window),
            None => {},
        }
    }
}

impl<W: WindowSystem> PlayerControl for MediaPlayerControl<W> {
    fn play_pause(&self) {
        self.run(mpc_command::PLAY_PAUSE, |window| {
            if !self.focused_once.swap(true, Ordering::SeqCst) {
                self.focus(window);
            }
            self.send_key(window, VirtualKey::Space);
        });
    }

    fn seek_forward(&self) {
        self.run(mpc_command::SEEK_FORWARD, |window| {
            self.send_combo(window, VirtualKey::Control, VirtualKey::Right)
        });
    }

    fn seek_backward(&self) {
        self.run(mpc_command::SEEK_BACKWARD, |window| {
            self.send_combo(window, VirtualKey::Control, VirtualKey::Left)
        });
    }

    fn next(&self) {
        self.run(mpc_command::NEXT, |window| self.send_key(window, VirtualKey::N));
    }

    /// VLC builds disagree on the shortcut, so all three are sent
    fn previous(&self) {
        self.run(mpc_command::PREVIOUS, |window| {
            self.send_key(window, VirtualKey::P);
            pause(self.timing.sequence_gap);
            self.send_combo(window, VirtualKey::Control, VirtualKey::P);
            pause(self.timing.sequence_gap);
            self.send_combo(window, VirtualKey::Shift, VirtualKey::P);
        });
    }

    fn volume_up(&self) {
        self.run(mpc_command::VOLUME_UP, |window| self.send_key(window, VirtualKey::Up));
    }

    fn volume_down(&self) {
        self.run(mpc_command::VOLUME_DOWN, |window| self.send_key(window, VirtualKey::Down));
    }

    fn fullscreen(&self) {
        self.run(mpc_command::FULLSCREEN, |window| self.send_key(window, VirtualKey::F));
    }

    fn stop(&self) {
        self.run(mpc_command::STOP, |window| self.send_key(window, VirtualKey::S));
    }

    fn stop_and_minimize(&self) {
        match self.target() {
            Some(Target::Mpc(window)) => {
                self.send_mpc(window, mpc_command::STOP);
                self.windows.minimize(window);
            },
            Some(Target::Vlc(window)) => {
                self.send_key(window, VirtualKey::S);
                pause(self.timing.minimize_delay);
                self.windows.minimize(window);
            },
            None => {},
        }
    }
}
