//! Discrete player actions and the event type carried on the action channel
//!
//! Both the mapping engine and the remote listener produce [`ActionEvent`]s
//! into one unbounded channel drained by the dispatcher.

use std::fmt;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// A command understood by the player-control collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    PlayPause,
    SeekForward,
    SeekBackward,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
    Fullscreen,
    Stop,
    StopAndMinimize,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::PlayPause,
        Action::SeekForward,
        Action::SeekBackward,
        Action::Next,
        Action::Previous,
        Action::VolumeUp,
        Action::VolumeDown,
        Action::Fullscreen,
        Action::Stop,
        Action::StopAndMinimize,
    ];

    /// Stable identifier used in logs and status lines
    pub fn name(self) -> &'static str {
        match self {
            Action::PlayPause => "PlayPause",
            Action::SeekForward => "SeekForward",
            Action::SeekBackward => "SeekBackward",
            Action::Next => "Next",
            Action::Previous => "Previous",
            Action::VolumeUp => "VolumeUp",
            Action::VolumeDown => "VolumeDown",
            Action::Fullscreen => "Fullscreen",
            Action::Stop => "Stop",
            Action::StopAndMinimize => "StopAndMinimize",
        }
    }

    /// Path segment after `/api/` for actions reachable from the remote page
    pub fn remote_command(self) -> Option<&'static str> {
        match self {
            Action::PlayPause => Some("playpause"),
            Action::SeekForward => Some("seekforward"),
            Action::SeekBackward => Some("seekbackward"),
            Action::Next => Some("next"),
            Action::Previous => Some("previous"),
            Action::VolumeUp => Some("volup"),
            Action::VolumeDown => Some("voldown"),
            Action::Fullscreen => Some("fullscreen"),
            Action::Stop => Some("stop"),
            Action::StopAndMinimize => None,
        }
    }

    /// Inverse of [`Action::remote_command`]
    pub fn from_remote_command(command: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.remote_command() == Some(command))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where an action came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSource {
    /// Fired by a mapping entry on a poll tick
    Gamepad { entry: String },
    /// Requested over the remote HTTP interface
    Remote { peer: Option<SocketAddr> },
}

/// One dispatch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEvent {
    pub action: Action,
    pub source: ActionSource,
}

impl ActionEvent {
    pub fn from_gamepad(action: Action, entry: impl Into<String>) -> Self {
        Self {
            action,
            source: ActionSource::Gamepad {
                entry: entry.into(),
            },
        }
    }

    pub fn from_remote(action: Action, peer: Option<SocketAddr>) -> Self {
        Self {
            action,
            source: ActionSource::Remote { peer },
        }
    }
}

pub type ActionSender = mpsc::UnboundedSender<ActionEvent>;
pub type ActionReceiver = mpsc::UnboundedReceiver<ActionEvent>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_vocabulary() {
        assert_eq!(Action::from_remote_command("playpause"), Some(Action::PlayPause));
        assert_eq!(Action::from_remote_command("volup"), Some(Action::VolumeUp));
        assert_eq!(Action::from_remote_command("voldown"), Some(Action::VolumeDown));
        assert_eq!(Action::from_remote_command("seekbackward"), Some(Action::SeekBackward));
        assert_eq!(Action::from_remote_command("stop"), Some(Action::Stop));
        assert_eq!(Action::from_remote_command("PlayPause"), None);
        assert_eq!(Action::from_remote_command("stopandminimize"), None);
    }

    #[test]
    fn test_nine_actions_reachable_remotely() {
        let reachable: Vec<_> = Action::ALL
            .into_iter()
            .filter(|a| a.remote_command().is_some())
            .collect();
        assert_eq!(reachable.len(), 9);
        assert!(!reachable.contains(&Action::StopAndMinimize));
    }
}
