//! Action dispatch to the media player
//!
//! The dispatcher drains the shared action channel one event at a time and
//! runs each player call on the blocking pool, since key sequences sleep
//! between steps.

pub mod player;
#[cfg(windows)]
pub mod win32;
pub mod window;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::action::{Action, ActionReceiver, ActionSource};

pub use player::{KeyTiming, MediaPlayerControl, TargetSpec};
pub use window::{NullWindowSystem, VirtualKey, WindowHandle, WindowSystem};

/// One operation per action; each is a no-op when no player is running
pub trait PlayerControl: Send + Sync {
    fn play_pause(&self);
    fn seek_forward(&self);
    fn seek_backward(&self);
    fn next(&self);
    fn previous(&self);
    fn volume_up(&self);
    fn volume_down(&self);
    fn fullscreen(&self);
    fn stop(&self);
    fn stop_and_minimize(&self);
}

/// Player control for the current platform
pub fn native_player() -> Arc<dyn PlayerControl> {
    #[cfg(windows)]
    {
        Arc::new(MediaPlayerControl::new(win32::Win32WindowSystem))
    }
    #[cfg(not(windows))]
    {
        Arc::new(MediaPlayerControl::new(NullWindowSystem))
    }
}

/// Routes actions to a [`PlayerControl`]
#[derive(Clone)]
pub struct ActionDispatcher {
    player: Arc<dyn PlayerControl>,
}

impl ActionDispatcher {
    pub fn new(player: Arc<dyn PlayerControl>) -> Self {
        Self { player }
    }

    /// Invoke the player operation for `action` on the current thread
    pub fn dispatch(&self, action: Action) {
        let player = self.player.as_ref();
        match action {
            Action::PlayPause => player.play_pause(),
            Action::SeekForward => player.seek_forward(),
            Action::SeekBackward => player.seek_backward(),
            Action::Next => player.next(),
            Action::Previous => player.previous(),
            Action::VolumeUp => player.volume_up(),
            Action::VolumeDown => player.volume_down(),
            Action::Fullscreen => player.fullscreen(),
            Action::Stop => player.stop(),
            Action::StopAndMinimize => player.stop_and_minimize(),
        }
    }

    /// Drain the action channel until every sender is dropped
    pub fn spawn(self, mut rx: ActionReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match &event.source {
                    ActionSource::Gamepad { entry } => {
                        info!("▶ {} (gamepad: {})", event.action, entry)
                    },
                    ActionSource::Remote { peer } => match peer {
                        Some(addr) => info!("▶ {} (remote: {})", event.action, addr),
                        None => info!("▶ {} (remote)", event.action),
                    },
                }

                let dispatcher = self.clone();
                let action = event.action;
                if let Err(e) = tokio::task::spawn_blocking(move || dispatcher.dispatch(action)).await {
                    warn!("Player call for {} failed: {}", action, e);
                }
            }
            debug!("Action channel closed, dispatcher stopping");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionEvent;
    use parking_lot::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct RecordingPlayer {
        calls: Mutex<Vec<&'static str>>,
    }

    impl RecordingPlayer {
        fn record(&self, name: &'static str) {
            self.calls.lock().push(name);
        }
    }

    impl PlayerControl for RecordingPlayer {
        fn play_pause(&self) {
            self.record("play_pause")
        }
        fn seek_forward(&self) {
            self.record("seek_forward")
        }
        fn seek_backward(&self) {
            self.record("seek_backward")
        }
        fn next(&self) {
            self.record("next")
        }
        fn previous(&self) {
            self.record("previous")
        }
        fn volume_up(&self) {
            self.record("volume_up")
        }
        fn volume_down(&self) {
            self.record("volume_down")
        }
        fn fullscreen(&self) {
            self.record("fullscreen")
        }
        fn stop(&self) {
            self.record("stop")
        }
        fn stop_and_minimize(&self) {
            self.record("stop_and_minimize")
        }
    }

    #[test]
    fn test_every_action_reaches_player() {
        let player = Arc::new(RecordingPlayer::default());
        let dispatcher = ActionDispatcher::new(player.clone());
        for action in Action::ALL {
            dispatcher.dispatch(action);
        }
        assert_eq!(player.calls.lock().len(), Action::ALL.len());
        assert_eq!(player.calls.lock()[9], "stop_and_minimize");
    }

    #[tokio::test]
    async fn test_channel_drained_in_order() {
        let player = Arc::new(RecordingPlayer::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ActionDispatcher::new(player.clone()).spawn(rx);

        tx.send(ActionEvent::from_gamepad(Action::PlayPause, "Play Pause")).unwrap();
        tx.send(ActionEvent::from_remote(Action::VolumeUp, None)).unwrap();
        tx.send(ActionEvent::from_gamepad(Action::Next, "Next")).unwrap();
        drop(tx);

        handle.await.unwrap();
        assert_eq!(*player.calls.lock(), vec!["play_pause", "volume_up", "next"]);
    }

    #[test]
    fn test_native_player_without_target_is_noop() {
        let dispatcher = ActionDispatcher::new(Arc::new(MediaPlayerControl::with_timing(
            NullWindowSystem,
            KeyTiming::immediate(),
        )));
        for action in Action::ALL {
            dispatcher.dispatch(action);
        }
    }
}
