//! Poll loop
//!
//! Runs on a dedicated OS thread (gilrs handles are not `Send`) and owns the
//! device manager and the mapping engine outright. The host talks to it
//! through a command channel drained once per tick and reads its state from
//! a `watch` channel.

use chrono::{DateTime, Local};
use std::ops::ControlFlow;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::action::ActionSender;
use crate::input::gamepad::{BackendProbe, DeviceManager, DEFAULT_RECONNECT_INTERVAL};
use crate::mapping::{EngineMode, MappingEngine, RuleSet};

/// Default poll period
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);

const NO_CONTROLLER: &str = "No controller detected";

/// Requests from the host to the poll thread
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Start learning for the entry at this index
    Learn(usize),
    Cancel,
    /// Unbind the entry at this index
    Clear(usize),
    /// Swap in a new rule set (config reload)
    ReplaceRules(RuleSet),
    SetReconnectInterval(Duration),
    Shutdown,
}

/// Snapshot published after every change
#[derive(Debug, Clone, Default)]
pub struct EngineStatus {
    /// Name of the open controller
    pub device: Option<String>,
    /// Entry currently being learned
    pub learning: Option<String>,
    /// Last user-facing message
    pub message: String,
    pub rules: RuleSet,
    /// Entry name and time of the last gamepad action
    pub last_action: Option<(String, DateTime<Local>)>,
}

#[derive(Debug, Clone, Copy)]
pub struct PollerSettings {
    pub poll_interval: Duration,
    pub reconnect_interval: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }
}

/// Device manager + mapping engine, stepped once per tick
pub struct Poller<P: BackendProbe> {
    devices: DeviceManager<P>,
    engine: MappingEngine,
    actions: ActionSender,
    commands: mpsc::UnboundedReceiver<EngineCommand>,
    status: watch::Sender<EngineStatus>,
}

impl<P: BackendProbe> Poller<P> {
    pub fn new(
        probe: P,
        rules: RuleSet,
        settings: PollerSettings,
        actions: ActionSender,
        commands: mpsc::UnboundedReceiver<EngineCommand>,
        status: watch::Sender<EngineStatus>,
    ) -> Self {
        let devices = DeviceManager::new(probe, settings.reconnect_interval);
        let poller = Self {
            devices,
            engine: MappingEngine::new(rules),
            actions,
            commands,
            status,
        };
        let device = poller.devices.device_name();
        let rules = poller.engine.rules().clone();
        poller.status.send_modify(|s| {
            s.message = match &device {
                Some(name) => format!("Controller: {}", name),
                None => NO_CONTROLLER.to_string(),
            };
            s.device = device;
            s.rules = rules;
        });
        poller
    }

    /// Run one tick; `Break` once shutdown was requested
    pub fn step(&mut self, now: Instant) -> ControlFlow<()> {
        if self.drain_commands().is_break() {
            return ControlFlow::Break(());
        }

        let state = self.devices.poll_at(now);
        let outcome = self.engine.tick(state);

        let device = self.devices.device_name();
        let mut message = None;
        if device != self.status.borrow().device {
            message = Some(match &device {
                Some(name) => format!("Controller: {}", name),
                None => NO_CONTROLLER.to_string(),
            });
        }

        let mut last_action = None;
        for activation in outcome.activations {
            message = Some(format!("Action: {}", activation.entry));
            last_action = Some((activation.entry.clone(), Local::now()));
            if self.actions.send(activation.into_event()).is_err() {
                warn!("Action channel closed, dropping gamepad action");
            }
        }

        let learned = outcome.learned.is_some();
        if let Some(learned) = outcome.learned {
            message = Some(learned.message());
        }

        let rules = learned.then(|| self.engine.rules().clone());
        let learning = self.learning_entry();
        self.status.send_if_modified(|s| {
            let mut changed = false;
            if s.device != device {
                s.device = device;
                changed = true;
            }
            if s.learning != learning {
                s.learning = learning;
                changed = true;
            }
            if let Some(message) = message {
                s.message = message;
                changed = true;
            }
            if let Some(rules) = rules {
                s.rules = rules;
                changed = true;
            }
            if last_action.is_some() {
                s.last_action = last_action;
                changed = true;
            }
            changed
        });

        ControlFlow::Continue(())
    }

    pub fn engine(&self) -> &MappingEngine {
        &self.engine
    }

    fn drain_commands(&mut self) -> ControlFlow<()> {
        loop {
            match self.commands.try_recv() {
                Ok(EngineCommand::Shutdown) => return ControlFlow::Break(()),
                Ok(command) => self.handle(command),
                Err(mpsc::error::TryRecvError::Empty) => return ControlFlow::Continue(()),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    debug!("Command channel closed, stopping poll loop");
                    return ControlFlow::Break(());
                },
            }
        }
    }

    fn handle(&mut self, command: EngineCommand) {
        let message = match command {
            EngineCommand::Learn(index) => match self.engine.start_learning(index) {
                Ok(outcome) => outcome.message(),
                Err(e) => e.to_string(),
            },
            EngineCommand::Cancel => match self.engine.cancel_learning() {
                Some(outcome) => outcome.message(),
                None => "Not learning".to_string(),
            },
            EngineCommand::Clear(index) => match self.engine.clear_binding(index) {
                Ok(()) => {
                    let name = self
                        .engine
                        .rules()
                        .entry(index)
                        .map(|e| e.name.clone())
                        .unwrap_or_default();
                    info!("Binding cleared for '{}'", name);
                    format!("Cleared: {}", name)
                },
                Err(e) => e.to_string(),
            },
            EngineCommand::ReplaceRules(rules) => {
                self.engine.replace_rules(rules);
                "Bindings reloaded".to_string()
            },
            EngineCommand::SetReconnectInterval(interval) => {
                self.devices.set_reconnect_interval(interval);
                debug!("Reconnect interval set to {:?}", interval);
                return;
            },
            EngineCommand::Shutdown => return,
        };

        let learning = self.learning_entry();
        let rules = self.engine.rules().clone();
        self.status.send_modify(|s| {
            s.message = message;
            s.learning = learning;
            s.rules = rules;
        });
    }

    fn learning_entry(&self) -> Option<String> {
        match self.engine.mode() {
            EngineMode::Learning(index) => self.engine.rules().entry(index).map(|e| e.name.clone()),
            EngineMode::Idle => None,
        }
    }
}

/// Host side of a running poll thread
pub struct PollerHandle {
    commands: mpsc::UnboundedSender<EngineCommand>,
    status: watch::Receiver<EngineStatus>,
    thread: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Queue a command; ignored once the thread has stopped
    pub fn send(&self, command: EngineCommand) {
        if self.commands.send(command).is_err() {
            debug!("Poll thread already stopped");
        }
    }

    pub fn commands(&self) -> mpsc::UnboundedSender<EngineCommand> {
        self.commands.clone()
    }

    pub fn status(&self) -> watch::Receiver<EngineStatus> {
        self.status.clone()
    }

    /// Current status snapshot
    pub fn snapshot(&self) -> EngineStatus {
        self.status.borrow().clone()
    }

    /// Stop the thread and wait for it
    pub fn shutdown(mut self) {
        self.send(EngineCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Poll thread panicked");
            }
        }
    }
}

/// Start the poll loop on its own thread
///
/// The probe is built on that thread, so backends never cross threads.
pub fn spawn_poller<P, F>(
    make_probe: F,
    rules: RuleSet,
    settings: PollerSettings,
    actions: ActionSender,
) -> anyhow::Result<PollerHandle>
where
    P: BackendProbe + 'static,
    F: FnOnce() -> P + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(EngineStatus::default());

    let thread = std::thread::Builder::new()
        .name("gamepad-poll".to_string())
        .spawn(move || {
            let mut poller = Poller::new(
                make_probe(),
                rules,
                settings,
                actions,
                command_rx,
                status_tx,
            );
            info!("🔄 Poll loop running every {:?}", settings.poll_interval);

            loop {
                let started = Instant::now();
                if poller.step(started).is_break() {
                    break;
                }
                std::thread::sleep(settings.poll_interval.saturating_sub(started.elapsed()));
            }
            info!("Poll loop stopped");
        })?;

    Ok(PollerHandle {
        commands: command_tx,
        status: status_rx,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionEvent, ActionReceiver};
    use crate::error::BackendError;
    use crate::input::gamepad::{AxisChannel, DeviceId, GamepadBackend, GamepadState};
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    /// Replays queued states; absent once the queue runs dry
    struct FeedBackend {
        feed: Arc<Mutex<VecDeque<GamepadState>>>,
    }

    impl GamepadBackend for FeedBackend {
        fn id(&self) -> DeviceId {
            DeviceId::XInput(0)
        }

        fn describe(&self) -> String {
            "Test Pad".to_string()
        }

        fn poll(&mut self) -> Result<GamepadState, BackendError> {
            self.feed.lock().pop_front().ok_or(BackendError::DeviceAbsent)
        }
    }

    struct FeedProbe {
        feed: Option<Arc<Mutex<VecDeque<GamepadState>>>>,
    }

    impl BackendProbe for FeedProbe {
        fn open_primary(&mut self) -> Option<Box<dyn GamepadBackend>> {
            self.feed
                .take()
                .map(|feed| Box::new(FeedBackend { feed }) as Box<dyn GamepadBackend>)
        }

        fn open_fallback(&mut self) -> Option<Box<dyn GamepadBackend>> {
            None
        }
    }

    struct Harness {
        poller: Poller<FeedProbe>,
        feed: Arc<Mutex<VecDeque<GamepadState>>>,
        actions: ActionReceiver,
        commands: mpsc::UnboundedSender<EngineCommand>,
        status: watch::Receiver<EngineStatus>,
    }

    impl Harness {
        fn new(connected: bool) -> Self {
            let feed = Arc::new(Mutex::new(VecDeque::new()));
            let probe = FeedProbe {
                feed: connected.then(|| feed.clone()),
            };
            let (action_tx, actions) = mpsc::unbounded_channel();
            let (commands, command_rx) = mpsc::unbounded_channel();
            let (status_tx, status) = watch::channel(EngineStatus::default());
            let poller = Poller::new(
                probe,
                RuleSet::default(),
                PollerSettings::default(),
                action_tx,
                command_rx,
                status_tx,
            );
            Self {
                poller,
                feed,
                actions,
                commands,
                status,
            }
        }

        fn feed(&mut self, states: &[GamepadState]) -> Vec<ActionEvent> {
            let now = Instant::now();
            for state in states {
                self.feed.lock().push_back(*state);
                assert!(self.poller.step(now).is_continue());
            }
            let mut events = Vec::new();
            while let Ok(event) = self.actions.try_recv() {
                events.push(event);
            }
            events
        }
    }

    #[test]
    fn test_press_dispatches_exactly_one_action() {
        let mut h = Harness::new(true);
        let idle = GamepadState::default();
        let pressed = idle.with_button(0, true);

        let events = h.feed(&[idle, pressed, pressed, idle]);
        assert_eq!(events, vec![ActionEvent::from_gamepad(Action::PlayPause, "Play Pause")]);

        let status = h.status.borrow();
        assert_eq!(status.message, "Action: Play Pause");
        assert_eq!(status.device.as_deref(), Some("Test Pad"));
        assert_eq!(status.last_action.as_ref().map(|(e, _)| e.as_str()), Some("Play Pause"));
    }

    #[test]
    fn test_learn_command_binds_next_press() {
        let mut h = Harness::new(true);
        let index = h.poller.engine().rules().find("Stop").unwrap();
        h.commands.send(EngineCommand::Learn(index)).unwrap();

        let idle = GamepadState::default();
        let events = h.feed(&[idle]);
        assert!(events.is_empty());
        assert_eq!(h.status.borrow().learning.as_deref(), Some("Stop"));

        let events = h.feed(&[idle.with_button(9, true)]);
        assert!(events.is_empty());

        let status = h.status.borrow().clone();
        assert_eq!(status.learning, None);
        assert_eq!(status.message, "Button mapped: index 9");
        assert_eq!(status.rules.entry(index).unwrap().binding_label(), "button 9");
    }

    #[test]
    fn test_learn_axis_then_fire() {
        let mut h = Harness::new(true);
        let index = h.poller.engine().rules().find("SeekForward Axis").unwrap();
        h.commands.send(EngineCommand::Learn(index)).unwrap();

        let idle = GamepadState::default();
        h.feed(&[idle, idle.with_axis(AxisChannel::Rz, 5000)]);
        assert_eq!(h.status.borrow().message, "Rz axis assigned");

        let events = h.feed(&[idle, idle.with_axis(AxisChannel::Rz, 50000)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, Action::SeekForward);
    }

    #[test]
    fn test_clear_and_cancel_report_status() {
        let mut h = Harness::new(true);
        h.commands.send(EngineCommand::Clear(0)).unwrap();
        h.feed(&[GamepadState::default()]);
        assert_eq!(h.status.borrow().message, "Cleared: Play Pause");

        let events = h.feed(&[GamepadState::default().with_button(0, true)]);
        assert!(events.is_empty());

        h.commands.send(EngineCommand::Cancel).unwrap();
        h.feed(&[GamepadState::default()]);
        assert_eq!(h.status.borrow().message, "Not learning");
    }

    #[test]
    fn test_unknown_entry_reported_not_fatal() {
        let mut h = Harness::new(true);
        h.commands.send(EngineCommand::Learn(99)).unwrap();
        h.feed(&[GamepadState::default()]);
        assert!(h.status.borrow().message.contains("unknown mapping entry"));
    }

    #[test]
    fn test_no_controller_status() {
        let mut h = Harness::new(false);
        assert_eq!(h.status.borrow().message, NO_CONTROLLER);
        assert!(h.poller.step(Instant::now()).is_continue());
        assert_eq!(h.status.borrow().device, None);
    }

    #[test]
    fn test_replace_rules_applies_new_bindings() {
        let mut h = Harness::new(true);
        let mut rules = RuleSet::default();
        let next = rules.find("Next").unwrap();
        rules.bind_button(next, 0).unwrap();
        h.commands.send(EngineCommand::ReplaceRules(rules)).unwrap();

        let idle = GamepadState::default();
        let events = h.feed(&[idle, idle.with_button(0, true)]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, Action::Next);
        assert_eq!(h.status.borrow().message, "Action: Next");
    }

    #[test]
    fn test_shutdown_breaks_loop() {
        let mut h = Harness::new(true);
        h.commands.send(EngineCommand::Shutdown).unwrap();
        assert!(h.poller.step(Instant::now()).is_break());
    }

    #[test]
    fn test_spawned_thread_stops_on_shutdown() {
        let (action_tx, _actions) = mpsc::unbounded_channel();
        let handle = spawn_poller(
            || FeedProbe { feed: None },
            RuleSet::default(),
            PollerSettings {
                poll_interval: Duration::from_millis(1),
                ..Default::default()
            },
            action_tx,
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(handle.snapshot().rules.len(), RuleSet::default().len());
        handle.shutdown();
    }
}
