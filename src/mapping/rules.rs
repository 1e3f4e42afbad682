//! Declarative rules and their activation predicates
//!
//! Rules hold no edge memory. Every `evaluate` receives the current and the
//! previous snapshot and reports whether the rule's condition became true on
//! this tick.

use serde::{Deserialize, Serialize};

use crate::input::gamepad::{AxisChannel, GamepadState, POV_CENTERED};

/// Effective threshold for trigger-scale values under [`ThresholdPolicy::Auto`]
pub const TRIGGER_AUTO_THRESHOLD: i32 = 30;

/// Stick threshold substituted when the configured one looks trigger-scale
pub const STICK_AUTO_THRESHOLD: i32 = 15000;

/// Largest value an XInput trigger reports
pub const TRIGGER_SCALE_MAX: i32 = 255;

/// Direction an axis value must cross
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Above,
    Below,
}

impl Polarity {
    pub fn from_trigger_above(above: bool) -> Self {
        if above {
            Self::Above
        } else {
            Self::Below
        }
    }

    pub fn is_above(self) -> bool {
        self == Self::Above
    }
}

/// How the configured threshold is turned into the one actually compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdPolicy {
    /// Adapt to the live value's scale so one rule works on both backends
    Auto,
    /// Always compare against the configured value
    Fixed,
}

/// Threshold to compare `value` against
///
/// Under [`ThresholdPolicy::Auto`]:
/// - trigger channels (Ry, Rz) with a value in 0..=255 use 30,
/// - stick channels (X, Y, Z, Rx) with a value in the signed 16-bit range
///   use the configured value, or 15000 if that is ≤ 255,
/// - anything else uses the configured value.
pub fn effective_threshold(
    channel: AxisChannel,
    value: i32,
    configured: i32,
    policy: ThresholdPolicy,
) -> i32 {
    if policy == ThresholdPolicy::Fixed {
        return configured;
    }

    if channel.is_trigger_capable() {
        if (0..=TRIGGER_SCALE_MAX).contains(&value) {
            return TRIGGER_AUTO_THRESHOLD;
        }
    } else if (i32::from(i16::MIN)..=i32::from(i16::MAX)).contains(&value) {
        return if configured <= TRIGGER_SCALE_MAX {
            STICK_AUTO_THRESHOLD
        } else {
            configured
        };
    }

    configured
}

/// Fires on a button's rising edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonRule {
    pub button: Option<usize>,
}

impl ButtonRule {
    pub fn bound(button: usize) -> Self {
        Self {
            button: Some(button),
        }
    }

    pub fn evaluate(&self, current: &GamepadState, previous: &GamepadState) -> bool {
        match self.button {
            Some(index) => current.button(index) && !previous.button(index),
            None => false,
        }
    }
}

/// Fires when an axis crosses its effective threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRule {
    pub channel: Option<AxisChannel>,
    pub threshold: i32,
    pub polarity: Polarity,
    pub policy: ThresholdPolicy,
}

impl AxisRule {
    pub fn new(channel: AxisChannel, threshold: i32, polarity: Polarity) -> Self {
        Self {
            channel: Some(channel),
            threshold,
            polarity,
            policy: ThresholdPolicy::Auto,
        }
    }

    /// Whether the condition holds for one snapshot
    pub fn is_active(&self, state: &GamepadState) -> bool {
        let Some(channel) = self.channel else {
            return false;
        };
        let value = state.axis(channel);
        let threshold = effective_threshold(channel, value, self.threshold, self.policy);
        match self.polarity {
            Polarity::Above => value > threshold,
            Polarity::Below => value < threshold,
        }
    }

    /// Edge-triggered: active now, inactive on the previous tick
    pub fn evaluate(&self, current: &GamepadState, previous: &GamepadState) -> bool {
        self.is_active(current) && !self.is_active(previous)
    }
}

/// Fires when the hat moves onto one angle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionalRule {
    pub angle: Option<i32>,
}

impl DirectionalRule {
    pub fn bound(angle: i32) -> Self {
        Self { angle: Some(angle) }
    }

    pub fn evaluate(&self, current: &GamepadState, previous: &GamepadState) -> bool {
        match self.angle {
            Some(angle) if angle != POV_CENTERED => current.pov == angle && previous.pov != angle,
            _ => false,
        }
    }
}

/// Closed set of rule kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Button(ButtonRule),
    Axis(AxisRule),
    Directional(DirectionalRule),
}

impl Rule {
    pub fn evaluate(&self, current: &GamepadState, previous: &GamepadState) -> bool {
        match self {
            Rule::Button(rule) => rule.evaluate(current, previous),
            Rule::Axis(rule) => rule.evaluate(current, previous),
            Rule::Directional(rule) => rule.evaluate(current, previous),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Button(_) => "button",
            Rule::Axis(_) => "axis",
            Rule::Directional(_) => "directional",
        }
    }

    /// Evaluation rank: buttons, then axes, then directional
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Rule::Button(_) => 0,
            Rule::Axis(_) => 1,
            Rule::Directional(_) => 2,
        }
    }

    pub fn is_bound(&self) -> bool {
        match self {
            Rule::Button(rule) => rule.button.is_some(),
            Rule::Axis(rule) => rule.channel.is_some(),
            Rule::Directional(rule) => rule.angle.is_some(),
        }
    }

    /// Drop the binding, keeping threshold settings of axis rules
    pub fn unbind(&mut self) {
        match self {
            Rule::Button(rule) => rule.button = None,
            Rule::Axis(rule) => rule.channel = None,
            Rule::Directional(rule) => rule.angle = None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn axis(channel: AxisChannel, value: i32) -> GamepadState {
        GamepadState::default().with_axis(channel, value)
    }

    #[test]
    fn test_auto_threshold_trigger_scale() {
        // Trigger value 50 against a stick-sized threshold still fires
        let rule = AxisRule::new(AxisChannel::Rz, 48000, Polarity::Above);
        assert!(rule.evaluate(&axis(AxisChannel::Rz, 50), &axis(AxisChannel::Rz, 0)));
    }

    #[test]
    fn test_auto_threshold_stick_scale() {
        let rule = AxisRule::new(AxisChannel::X, 48000, Polarity::Above);
        assert!(!rule.evaluate(&axis(AxisChannel::X, 50), &axis(AxisChannel::X, 0)));
    }

    #[test]
    fn test_effective_threshold_table() {
        use AxisChannel::*;
        use ThresholdPolicy::*;

        assert_eq!(effective_threshold(Ry, 0, 48000, Auto), 30);
        assert_eq!(effective_threshold(Rz, 255, 48000, Auto), 30);
        assert_eq!(effective_threshold(Rz, 256, 48000, Auto), 48000);
        assert_eq!(effective_threshold(X, 100, 200, Auto), 15000);
        assert_eq!(effective_threshold(Rx, -32768, 20000, Auto), 20000);
        // Joystick-protocol values above the signed range keep the configured value
        assert_eq!(effective_threshold(X, 40000, 200, Auto), 200);
        assert_eq!(effective_threshold(Rz, 50, 48000, Fixed), 48000);
    }

    #[test]
    fn test_below_polarity() {
        let rule = AxisRule::new(AxisChannel::X, 18000, Polarity::Below);
        let rest = axis(AxisChannel::X, 32768);
        let pushed = axis(AxisChannel::X, 1000);
        assert!(rule.evaluate(&pushed, &rest));
        assert!(!rule.evaluate(&pushed, &pushed));
        assert!(!rule.evaluate(&rest, &pushed));
    }

    #[test]
    fn test_axis_fires_once_per_crossing() {
        let rule = AxisRule::new(AxisChannel::X, 48000, Polarity::Above);
        let values = [32768, 40000, 50000, 60000, 65535, 50000, 30000, 49000, 49000];
        let fired = values
            .windows(2)
            .filter(|w| rule.evaluate(&axis(AxisChannel::X, w[1]), &axis(AxisChannel::X, w[0])))
            .count();
        assert_eq!(fired, 2);
    }

    #[test]
    fn test_unbound_rules_never_fire() {
        let pressed = GamepadState::default().with_button(0, true).with_pov(0);
        let rest = GamepadState::default();
        assert!(!ButtonRule::default().evaluate(&pressed, &rest));
        assert!(!DirectionalRule::default().evaluate(&pressed, &rest));
        let unbound = AxisRule {
            channel: None,
            ..AxisRule::new(AxisChannel::X, 0, Polarity::Above)
        };
        assert!(!unbound.evaluate(&axis(AxisChannel::X, 60000), &rest));
    }

    #[test]
    fn test_directional_matches_exact_angle() {
        let rest = GamepadState::default();
        let right = GamepadState::default().with_pov(9000);
        let down = GamepadState::default().with_pov(18000);

        assert!(DirectionalRule::bound(9000).evaluate(&right, &rest));
        assert!(!DirectionalRule::bound(18000).evaluate(&right, &rest));
        assert!(!DirectionalRule::bound(9000).evaluate(&right, &right));
        assert!(DirectionalRule::bound(18000).evaluate(&down, &right));
        // Centered never matches, even if a rule is bound to -1
        assert!(!DirectionalRule::bound(POV_CENTERED).evaluate(&rest, &right));
    }

    #[test]
    fn test_unbind_keeps_axis_settings() {
        let mut rule = Rule::Axis(AxisRule::new(AxisChannel::Y, 12345, Polarity::Below));
        rule.unbind();
        assert!(!rule.is_bound());
        match rule {
            Rule::Axis(a) => {
                assert_eq!(a.threshold, 12345);
                assert_eq!(a.polarity, Polarity::Below);
            },
            _ => unreachable!(),
        }
    }

    proptest! {
        /// Hold for any number of ticks: exactly one activation per press
        #[test]
        fn prop_button_press_hold_release_fires_once(
            button in 0usize..32,
            idle_before in 0usize..5,
            held in 1usize..50,
            idle_after in 0usize..5,
        ) {
            let rule = ButtonRule::bound(button);
            let up = GamepadState::default();
            let down = GamepadState::default().with_button(button, true);

            let mut sequence = vec![up; idle_before + 1];
            sequence.extend(std::iter::repeat(down).take(held));
            sequence.extend(std::iter::repeat(up).take(idle_after + 1));

            let fired = sequence
                .windows(2)
                .filter(|w| rule.evaluate(&w[1], &w[0]))
                .count();
            prop_assert_eq!(fired, 1);
        }
    }
}
