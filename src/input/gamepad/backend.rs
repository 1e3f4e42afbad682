//! Backend abstraction and the device manager
//!
//! A [`GamepadBackend`] wraps one opened controller of one protocol. A
//! [`BackendProbe`] knows how to open one, primary protocol first. The
//! [`DeviceManager`] owns at most one backend, re-runs selection when the
//! device goes away, and never lets a fault escape: every failure becomes
//! an absent tick.

use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::device_id::DeviceId;
use super::state::GamepadState;
use crate::error::BackendError;

/// Default delay between two selection attempts while no device is open
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(2);

/// One opened controller
pub trait GamepadBackend {
    fn id(&self) -> DeviceId;

    /// Human readable device name for status lines
    fn describe(&self) -> String;

    /// Read the current state
    fn poll(&mut self) -> Result<GamepadState, BackendError>;

    /// Try to regain access after a failed read
    ///
    /// Backends that cannot recover leave the default, which makes the
    /// manager drop the device immediately.
    fn reacquire(&mut self) -> Result<(), BackendError> {
        Err(BackendError::Unavailable(
            "backend does not support reacquire".to_string(),
        ))
    }
}

/// Opens controllers, one protocol at a time
pub trait BackendProbe {
    /// XInput user index 0, if connected
    fn open_primary(&mut self) -> Option<Box<dyn GamepadBackend>>;

    /// First openable joystick-protocol device in class priority order
    fn open_fallback(&mut self) -> Option<Box<dyn GamepadBackend>>;
}

/// Owns the active backend and its reconnection policy
pub struct DeviceManager<P: BackendProbe> {
    probe: P,
    device: Option<Box<dyn GamepadBackend>>,
    reconnect_interval: Duration,
    last_reconnect_attempt: Option<Instant>,
    selection_runs: u64,
}

impl<P: BackendProbe> DeviceManager<P> {
    /// Create the manager and run the first selection
    pub fn new(probe: P, reconnect_interval: Duration) -> Self {
        let mut manager = Self {
            probe,
            device: None,
            reconnect_interval,
            last_reconnect_attempt: None,
            selection_runs: 0,
        };
        manager.select();
        if manager.device.is_none() {
            warn!("⚠️  No controller detected");
        }
        manager
    }

    /// Poll once, `None` when no device is available this tick
    pub fn poll(&mut self) -> Option<GamepadState> {
        self.poll_at(Instant::now())
    }

    /// [`DeviceManager::poll`] with an explicit clock
    pub fn poll_at(&mut self, now: Instant) -> Option<GamepadState> {
        let Some(device) = self.device.as_mut() else {
            // The tick that reconnects still reports absent
            self.try_reconnect(now);
            return None;
        };

        match device.poll() {
            Ok(state) => Some(state),
            Err(first) => {
                debug!("Poll failed on {}: {}", device.id(), first);
                let retried = device.reacquire().and_then(|_| device.poll());
                match retried {
                    Ok(state) => {
                        debug!("Reacquired {}", device.id());
                        Some(state)
                    },
                    Err(e) => {
                        warn!("Controller lost ({}): {}", device.describe(), e);
                        self.device = None;
                        None
                    },
                }
            },
        }
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    pub fn device_name(&self) -> Option<String> {
        self.device.as_ref().map(|d| d.describe())
    }

    pub fn device_id(&self) -> Option<DeviceId> {
        self.device.as_ref().map(|d| d.id())
    }

    /// How many times the full selection procedure ran
    pub fn selection_runs(&self) -> u64 {
        self.selection_runs
    }

    pub fn set_reconnect_interval(&mut self, interval: Duration) {
        self.reconnect_interval = interval;
    }

    fn try_reconnect(&mut self, now: Instant) {
        if let Some(last) = self.last_reconnect_attempt {
            if now.saturating_duration_since(last) < self.reconnect_interval {
                return;
            }
        }
        self.last_reconnect_attempt = Some(now);
        self.select();
    }

    fn select(&mut self) {
        self.selection_runs += 1;

        let device = self.probe.open_primary().or_else(|| self.probe.open_fallback());
        if let Some(ref device) = device {
            info!("🎮 Controller selected: {} ({})", device.describe(), device.id());
        }
        self.device = device;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Scripted backend: pops one result per poll, then repeats the last
    struct ScriptedBackend {
        id: DeviceId,
        polls: VecDeque<Result<GamepadState, BackendError>>,
        reacquire_ok: bool,
        reacquires: Arc<Mutex<u32>>,
    }

    impl GamepadBackend for ScriptedBackend {
        fn id(&self) -> DeviceId {
            self.id
        }

        fn describe(&self) -> String {
            format!("scripted {}", self.id)
        }

        fn poll(&mut self) -> Result<GamepadState, BackendError> {
            if self.polls.len() > 1 {
                self.polls.pop_front().unwrap()
            } else {
                self.polls.front().cloned().unwrap()
            }
        }

        fn reacquire(&mut self) -> Result<(), BackendError> {
            *self.reacquires.lock() += 1;
            if self.reacquire_ok {
                Ok(())
            } else {
                Err(BackendError::DeviceAbsent)
            }
        }
    }

    #[derive(Default)]
    struct MockProbe {
        primary: VecDeque<Option<ScriptedBackend>>,
        fallback: VecDeque<Option<ScriptedBackend>>,
    }

    impl BackendProbe for MockProbe {
        fn open_primary(&mut self) -> Option<Box<dyn GamepadBackend>> {
            self.primary
                .pop_front()
                .flatten()
                .map(|b| Box::new(b) as Box<dyn GamepadBackend>)
        }

        fn open_fallback(&mut self) -> Option<Box<dyn GamepadBackend>> {
            self.fallback
                .pop_front()
                .flatten()
                .map(|b| Box::new(b) as Box<dyn GamepadBackend>)
        }
    }

    fn healthy(id: DeviceId) -> ScriptedBackend {
        ScriptedBackend {
            id,
            polls: VecDeque::from([Ok(GamepadState::default())]),
            reacquire_ok: false,
            reacquires: Arc::new(Mutex::new(0)),
        }
    }

    #[test]
    fn test_primary_preferred_over_fallback() {
        let probe = MockProbe {
            primary: VecDeque::from([Some(healthy(DeviceId::XInput(0)))]),
            fallback: VecDeque::from([Some(healthy(DeviceId::Joystick(0)))]),
        };
        let manager = DeviceManager::new(probe, DEFAULT_RECONNECT_INTERVAL);
        assert_eq!(manager.device_id(), Some(DeviceId::XInput(0)));
        assert_eq!(manager.selection_runs(), 1);
    }

    #[test]
    fn test_fallback_used_when_primary_absent() {
        let probe = MockProbe {
            primary: VecDeque::from([None]),
            fallback: VecDeque::from([Some(healthy(DeviceId::Joystick(3)))]),
        };
        let mut manager = DeviceManager::new(probe, DEFAULT_RECONNECT_INTERVAL);
        assert_eq!(manager.device_id(), Some(DeviceId::Joystick(3)));
        assert!(manager.poll().is_some());
    }

    #[test]
    fn test_reconnect_rate_limited() {
        let mut manager = DeviceManager::new(MockProbe::default(), DEFAULT_RECONNECT_INTERVAL);
        assert_eq!(manager.selection_runs(), 1);

        let t0 = Instant::now();
        // First attempt after construction is immediate
        assert!(manager.poll_at(t0).is_none());
        assert_eq!(manager.selection_runs(), 2);

        assert!(manager.poll_at(t0 + Duration::from_millis(500)).is_none());
        assert!(manager.poll_at(t0 + Duration::from_millis(1999)).is_none());
        assert_eq!(manager.selection_runs(), 2);

        assert!(manager.poll_at(t0 + Duration::from_millis(2000)).is_none());
        assert_eq!(manager.selection_runs(), 3);
    }

    #[test]
    fn test_reconnect_tick_reports_absent() {
        let probe = MockProbe {
            primary: VecDeque::from([None, Some(healthy(DeviceId::XInput(0)))]),
            fallback: VecDeque::from([None]),
        };
        let mut manager = DeviceManager::new(probe, DEFAULT_RECONNECT_INTERVAL);
        assert!(!manager.is_connected());

        let t0 = Instant::now();
        assert!(manager.poll_at(t0).is_none());
        assert!(manager.is_connected());
        assert!(manager.poll_at(t0 + Duration::from_millis(20)).is_some());
    }

    #[test]
    fn test_failure_without_reacquire_drops_device() {
        let mut backend = healthy(DeviceId::XInput(0));
        backend.polls = VecDeque::from([Err(BackendError::DeviceAbsent)]);
        let probe = MockProbe {
            primary: VecDeque::from([Some(backend)]),
            fallback: VecDeque::new(),
        };
        let mut manager = DeviceManager::new(probe, DEFAULT_RECONNECT_INTERVAL);
        assert!(manager.poll().is_none());
        assert!(!manager.is_connected());
    }

    #[test]
    fn test_reacquire_then_retry_once() {
        let reacquires = Arc::new(Mutex::new(0));
        let backend = ScriptedBackend {
            id: DeviceId::Joystick(1),
            polls: VecDeque::from([
                Err(BackendError::TransientPollFailure("input lost".into())),
                Ok(GamepadState::default().with_button(2, true)),
            ]),
            reacquire_ok: true,
            reacquires: reacquires.clone(),
        };
        let probe = MockProbe {
            primary: VecDeque::from([None]),
            fallback: VecDeque::from([Some(backend)]),
        };
        let mut manager = DeviceManager::new(probe, DEFAULT_RECONNECT_INTERVAL);

        let state = manager.poll().expect("retry should succeed");
        assert!(state.button(2));
        assert_eq!(*reacquires.lock(), 1);
        assert!(manager.is_connected());
    }

    #[test]
    fn test_failed_reacquire_drops_device() {
        let reacquires = Arc::new(Mutex::new(0));
        let backend = ScriptedBackend {
            id: DeviceId::Joystick(1),
            polls: VecDeque::from([Err(BackendError::TransientPollFailure("gone".into()))]),
            reacquire_ok: false,
            reacquires: reacquires.clone(),
        };
        let probe = MockProbe {
            primary: VecDeque::from([None]),
            fallback: VecDeque::from([Some(backend)]),
        };
        let mut manager = DeviceManager::new(probe, DEFAULT_RECONNECT_INTERVAL);

        assert!(manager.poll().is_none());
        assert_eq!(*reacquires.lock(), 1);
        assert!(!manager.is_connected());
    }
}
