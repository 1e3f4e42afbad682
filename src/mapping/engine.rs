//! Mapping engine: edge detection, rule evaluation and learning
//!
//! The engine is fed one optional snapshot per poll tick. It keeps the
//! previous snapshot for edge comparison and a small mode machine:
//!
//! ```text
//!   Idle ──learn(entry)──▶ Learning(entry)
//!    ▲                        │
//!    └──cancel / gesture bound┘
//! ```
//!
//! While learning, no rules are evaluated.

use tracing::{debug, info};

use super::learning::{detect_axis_movement, detect_pov_press, detect_rising_button};
use super::rules::Rule;
use super::ruleset::RuleSet;
use crate::action::{Action, ActionEvent};
use crate::error::MappingError;
use crate::input::gamepad::{AxisChannel, GamepadState, MAX_BUTTONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineMode {
    #[default]
    Idle,
    /// Waiting for a gesture to bind to this entry index
    Learning(usize),
}

/// Engine-owned memory between ticks
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub previous: Option<GamepadState>,
    pub mode: EngineMode,
}

impl EngineState {
    /// Button levels captured at the end of the previous tick
    pub fn previous_buttons(&self) -> [bool; MAX_BUTTONS] {
        self.previous
            .map(|s| s.buttons)
            .unwrap_or([false; MAX_BUTTONS])
    }
}

/// Progress of the learning state machine, for status display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnOutcome {
    Started {
        entry: String,
        kind: &'static str,
    },
    ButtonBound {
        entry: String,
        button: usize,
        /// Entries that lost this button
        cleared: Vec<String>,
    },
    AxisBound {
        entry: String,
        channel: AxisChannel,
    },
    DirectionBound {
        entry: String,
        angle: i32,
    },
    Cancelled {
        entry: String,
    },
}

impl LearnOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Started { kind: "axis", .. } => "Move a controller's axis for this action".to_string(),
            Self::Started {
                kind: "directional",
                ..
            } => "Press a direction on the controller's POV for this action".to_string(),
            Self::Started { .. } => "Press a controller's button for this action".to_string(),
            Self::ButtonBound { button, .. } => format!("Button mapped: index {}", button),
            Self::AxisBound { channel, .. } => format!("{} axis assigned", channel),
            Self::DirectionBound { angle, .. } => format!("POV assigned: {}", angle),
            Self::Cancelled { .. } => "Mapping cancelled".to_string(),
        }
    }
}

/// One rule that fired on a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub entry: String,
    pub action: Action,
}

impl Activation {
    pub fn into_event(self) -> ActionEvent {
        ActionEvent::from_gamepad(self.action, self.entry)
    }
}

/// Result of one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub device_present: bool,
    /// Fired rules in evaluation order
    pub activations: Vec<Activation>,
    pub learned: Option<LearnOutcome>,
}

pub struct MappingEngine {
    rules: RuleSet,
    state: EngineState,
}

impl MappingEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules,
            state: EngineState::default(),
        }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Replace bindings, e.g. after a config reload. Learning is cancelled.
    pub fn replace_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
        self.state.mode = EngineMode::Idle;
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn mode(&self) -> EngineMode {
        self.state.mode
    }

    pub fn is_learning(&self) -> bool {
        matches!(self.state.mode, EngineMode::Learning(_))
    }

    /// Enter learning mode for an entry, replacing any pending learn
    pub fn start_learning(&mut self, index: usize) -> Result<LearnOutcome, MappingError> {
        let entry = self
            .rules
            .entry(index)
            .ok_or_else(|| MappingError::UnknownEntry(format!("#{}", index + 1)))?;
        let outcome = LearnOutcome::Started {
            entry: entry.name.clone(),
            kind: entry.rule.kind(),
        };
        info!("Learning mapping for '{}'", entry.name);
        self.state.mode = EngineMode::Learning(index);
        Ok(outcome)
    }

    /// Leave learning mode; `None` if not learning
    pub fn cancel_learning(&mut self) -> Option<LearnOutcome> {
        let EngineMode::Learning(index) = self.state.mode else {
            return None;
        };
        self.state.mode = EngineMode::Idle;
        let entry = self.entry_name(index);
        debug!("Learning cancelled for '{}'", entry);
        Some(LearnOutcome::Cancelled { entry })
    }

    pub fn clear_binding(&mut self, index: usize) -> Result<(), MappingError> {
        self.rules.clear(index)
    }

    /// Process one poll result
    pub fn tick(&mut self, current: Option<GamepadState>) -> TickOutcome {
        let Some(current) = current else {
            // Absence breaks edge continuity
            self.state.previous = None;
            return TickOutcome::default();
        };

        let mut outcome = TickOutcome {
            device_present: true,
            ..Default::default()
        };

        // First state after absence only establishes the baseline
        if let Some(previous) = self.state.previous {
            match self.state.mode {
                EngineMode::Learning(index) => {
                    outcome.learned = self.learn(index, &current, &previous);
                },
                EngineMode::Idle => {
                    outcome.activations = self.evaluate(&current, &previous);
                },
            }
        }

        self.state.previous = Some(current);
        outcome
    }

    fn evaluate(&self, current: &GamepadState, previous: &GamepadState) -> Vec<Activation> {
        let mut fired = Vec::new();
        for rank in 0..=2 {
            for entry in self.rules.entries().iter().filter(|e| e.rule.rank() == rank) {
                if entry.rule.evaluate(current, previous) {
                    debug!("Rule '{}' fired -> {}", entry.name, entry.action);
                    fired.push(Activation {
                        entry: entry.name.clone(),
                        action: entry.action,
                    });
                }
            }
        }
        fired
    }

    fn learn(
        &mut self,
        index: usize,
        current: &GamepadState,
        previous: &GamepadState,
    ) -> Option<LearnOutcome> {
        let rule = self.rules.entry(index)?.rule;
        let entry = self.entry_name(index);

        let outcome = match rule {
            Rule::Button(_) => {
                let button = detect_rising_button(current, previous)?;
                let cleared = self.rules.bind_button(index, button).ok()?;
                LearnOutcome::ButtonBound {
                    entry,
                    button,
                    cleared,
                }
            },
            Rule::Axis(_) => {
                let channel = detect_axis_movement(current, previous)?;
                self.rules.bind_axis(index, channel).ok()?;
                LearnOutcome::AxisBound { entry, channel }
            },
            Rule::Directional(_) => {
                let angle = detect_pov_press(current, previous)?;
                self.rules.bind_direction(index, angle).ok()?;
                LearnOutcome::DirectionBound { entry, angle }
            },
        };

        info!("🎮 {}", outcome.message());
        self.state.mode = EngineMode::Idle;
        Some(outcome)
    }

    fn entry_name(&self, index: usize) -> String {
        self.rules
            .entry(index)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MappingEngine {
        MappingEngine::new(RuleSet::default())
    }

    fn actions(outcome: &TickOutcome) -> Vec<Action> {
        outcome.activations.iter().map(|a| a.action).collect()
    }

    fn index(engine: &MappingEngine, name: &str) -> usize {
        engine.rules().find(name).unwrap()
    }

    #[test]
    fn test_single_press_fires_play_pause_once() {
        let mut engine = engine();
        let up = GamepadState::default();
        let down = up.with_button(0, true);

        assert!(engine.tick(Some(up)).activations.is_empty());
        assert_eq!(actions(&engine.tick(Some(down))), vec![Action::PlayPause]);
        assert!(engine.tick(Some(down)).activations.is_empty());
        assert!(engine.tick(Some(up)).activations.is_empty());
    }

    #[test]
    fn test_first_state_is_baseline() {
        let mut engine = engine();
        let down = GamepadState::default().with_button(0, true);
        assert!(engine.tick(Some(down)).activations.is_empty());
        assert!(engine.state().previous_buttons()[0]);
    }

    #[test]
    fn test_absence_resets_edges() {
        let mut engine = engine();
        let up = GamepadState::default();
        let down = up.with_button(0, true);

        engine.tick(Some(up));
        let absent = engine.tick(None);
        assert!(!absent.device_present);
        assert!(engine.state().previous.is_none());

        // Held through the reconnect: baseline, no fire
        assert!(engine.tick(Some(down)).activations.is_empty());
        assert!(engine.tick(Some(down)).activations.is_empty());
    }

    #[test]
    fn test_pov_activates_only_matching_rule() {
        let mut engine = engine();
        engine.tick(Some(GamepadState::default()));
        let out = engine.tick(Some(GamepadState::default().with_pov(9000)));
        assert_eq!(actions(&out), vec![Action::SeekForward]);
        assert_eq!(out.activations[0].entry, "Seek Forward (POV)");
    }

    #[test]
    fn test_centered_pov_fires_nothing() {
        let mut engine = engine();
        engine.tick(Some(GamepadState::default().with_pov(18000)));
        assert!(engine.tick(Some(GamepadState::default())).activations.is_empty());
    }

    #[test]
    fn test_evaluation_order() {
        let mut engine = engine();
        let rest = GamepadState::default().with_axis(AxisChannel::X, 32768);
        engine.tick(Some(rest));

        let all = rest
            .with_button(7, true)
            .with_axis(AxisChannel::X, 60000)
            .with_pov(0);
        assert_eq!(
            actions(&engine.tick(Some(all))),
            vec![Action::Fullscreen, Action::SeekForward, Action::VolumeUp]
        );
    }

    #[test]
    fn test_axis_fires_once_per_deflection() {
        let mut engine = engine();
        let mut fired = Vec::new();
        for x in [32768, 50000, 60000, 60000, 32768, 1000, 1000, 32768] {
            let state = GamepadState::default().with_axis(AxisChannel::X, x);
            fired.extend(actions(&engine.tick(Some(state))));
        }
        assert_eq!(fired, vec![Action::SeekForward, Action::SeekBackward]);
    }

    #[test]
    fn test_learning_rebinds_and_clears_owner() {
        let mut engine = engine();
        let next = index(&engine, "Next");
        let up = GamepadState::default();
        engine.tick(Some(up));

        let started = engine.start_learning(next).unwrap();
        assert_eq!(started.message(), "Press a controller's button for this action");
        assert!(engine.is_learning());

        let out = engine.tick(Some(up.with_button(0, true)));
        assert!(out.activations.is_empty(), "learning suspends dispatch");
        assert_eq!(
            out.learned,
            Some(LearnOutcome::ButtonBound {
                entry: "Next".to_string(),
                button: 0,
                cleared: vec!["Play Pause".to_string()],
            })
        );
        assert_eq!(engine.mode(), EngineMode::Idle);

        // Release, then press again: only Next fires
        engine.tick(Some(up));
        assert_eq!(
            actions(&engine.tick(Some(up.with_button(0, true)))),
            vec![Action::Next]
        );
    }

    #[test]
    fn test_learning_axis() {
        let mut engine = engine();
        let axis = index(&engine, "SeekForward Axis");
        let rest = GamepadState::default();
        engine.tick(Some(rest));
        engine.start_learning(axis).unwrap();

        // A button press does not bind an axis entry
        let out = engine.tick(Some(rest.with_button(3, true)));
        assert!(out.learned.is_none());
        assert!(engine.is_learning());

        let out = engine.tick(Some(rest.with_button(3, true).with_axis(AxisChannel::Rz, 200)));
        assert_eq!(out.learned.unwrap().message(), "Rz axis assigned");
        assert_eq!(engine.rules().entry(axis).unwrap().binding_label(), "axis Rz > 48000");
    }

    #[test]
    fn test_learning_pov() {
        let mut engine = engine();
        let pov = index(&engine, "Volume Up (POV)");
        engine.tick(Some(GamepadState::default()));
        engine.start_learning(pov).unwrap();

        let out = engine.tick(Some(GamepadState::default().with_pov(27000)));
        assert_eq!(out.learned.unwrap().message(), "POV assigned: 27000");
        assert_eq!(engine.rules().records()[pov].pov, 27000);
    }

    #[test]
    fn test_cancel_learning() {
        let mut engine = engine();
        assert!(engine.cancel_learning().is_none());
        engine.start_learning(0).unwrap();
        let out = engine.cancel_learning().unwrap();
        assert_eq!(out.message(), "Mapping cancelled");
        assert!(!engine.is_learning());
        assert!(engine.start_learning(100).is_err());
    }
}
