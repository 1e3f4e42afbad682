//! Rule evaluation and the learning state machine

pub mod engine;
pub mod learning;
pub mod rules;
pub mod ruleset;

pub use engine::{Activation, EngineMode, EngineState, LearnOutcome, MappingEngine, TickOutcome};
pub use rules::{AxisRule, ButtonRule, DirectionalRule, Polarity, Rule, ThresholdPolicy};
pub use ruleset::{BindingRecord, RuleEntry, RuleSet};
