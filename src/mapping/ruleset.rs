//! The fixed, named rule collection and its persistence records

use serde::{Deserialize, Serialize};

use super::rules::{AxisRule, ButtonRule, DirectionalRule, Polarity, Rule};
use crate::action::Action;
use crate::error::MappingError;
use crate::input::gamepad::{AxisChannel, MAX_BUTTONS};

/// One named rule bound to an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleEntry {
    pub name: String,
    pub action: Action,
    pub rule: Rule,
}

impl RuleEntry {
    fn new(name: &str, action: Action, rule: Rule) -> Self {
        Self {
            name: name.to_string(),
            action,
            rule,
        }
    }

    fn button(name: &str, action: Action, button: Option<usize>) -> Self {
        Self::new(name, action, Rule::Button(ButtonRule { button }))
    }

    fn axis(name: &str, action: Action, threshold: i32, polarity: Polarity) -> Self {
        Self::new(
            name,
            action,
            Rule::Axis(AxisRule::new(AxisChannel::X, threshold, polarity)),
        )
    }

    fn directional(name: &str, action: Action, angle: i32) -> Self {
        Self::new(name, action, Rule::Directional(DirectionalRule::bound(angle)))
    }

    /// Binding column as shown in listings: "button 3", "axis X", "pov 9000"
    pub fn binding_label(&self) -> String {
        match &self.rule {
            Rule::Button(ButtonRule { button: Some(b) }) => format!("button {}", b),
            Rule::Axis(AxisRule {
                channel: Some(c),
                threshold,
                polarity,
                ..
            }) => {
                let op = if polarity.is_above() { '>' } else { '<' };
                format!("axis {} {} {}", c, op, threshold)
            },
            Rule::Directional(DirectionalRule { angle: Some(a) }) => format!("pov {}", a),
            _ => "(unbound)".to_string(),
        }
    }
}

/// Flat persistence record for one entry
///
/// Unbound button and POV fields are `-1`; an unbound axis is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingRecord {
    pub name: String,
    #[serde(default = "unbound")]
    pub button: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,
    #[serde(default = "unbound")]
    pub pov: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_above: Option<bool>,
}

fn unbound() -> i32 {
    -1
}

impl BindingRecord {
    fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            button: -1,
            axis: None,
            pov: -1,
            threshold: None,
            trigger_above: None,
        }
    }
}

/// Fixed collection of one entry per supported gesture
///
/// Entries are grouped by kind (buttons, axes, directional) and never added
/// or removed; only their bindings change. At most one button entry owns a
/// given button index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    entries: Vec<RuleEntry>,
}

impl Default for RuleSet {
    fn default() -> Self {
        use Action::*;

        Self {
            entries: vec![
                RuleEntry::button("Play Pause", PlayPause, Some(0)),
                RuleEntry::button("Next", Next, Some(1)),
                RuleEntry::button("Previous", Previous, Some(2)),
                RuleEntry::button("Volume Up", VolumeUp, Some(3)),
                RuleEntry::button("Volume Down", VolumeDown, Some(4)),
                RuleEntry::button("Seek Forward", SeekForward, Some(5)),
                RuleEntry::button("Seek Backward", SeekBackward, Some(6)),
                RuleEntry::button("Fullscreen", Fullscreen, Some(7)),
                RuleEntry::button("Stop", Stop, None),
                RuleEntry::button("Stop and minimize", StopAndMinimize, None),
                RuleEntry::axis("SeekForward Axis", SeekForward, 48000, Polarity::Above),
                RuleEntry::axis("SeekBackward Axis", SeekBackward, 18000, Polarity::Below),
                RuleEntry::directional("Volume Up (POV)", VolumeUp, 0),
                RuleEntry::directional("Volume Down (POV)", VolumeDown, 18000),
                RuleEntry::directional("Seek Forward (POV)", SeekForward, 9000),
                RuleEntry::directional("Seek Backward (POV)", SeekBackward, 27000),
            ],
        }
    }
}

impl RuleSet {
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&RuleEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the entry with this name (case-insensitive)
    pub fn find(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a 1-based row number or an entry name
    pub fn lookup(&self, key: &str) -> Result<usize, MappingError> {
        let key = key.trim();
        if let Ok(row) = key.parse::<usize>() {
            if (1..=self.entries.len()).contains(&row) {
                return Ok(row - 1);
            }
        }
        self.find(key)
            .ok_or_else(|| MappingError::UnknownEntry(key.to_string()))
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut RuleEntry, MappingError> {
        self.entries
            .get_mut(index)
            .ok_or_else(|| MappingError::UnknownEntry(format!("#{}", index + 1)))
    }

    /// Bind a button to a button entry, taking it away from any other entry
    ///
    /// Returns the names of entries that lost the button.
    pub fn bind_button(&mut self, index: usize, button: usize) -> Result<Vec<String>, MappingError> {
        let entry = self.entry_mut(index)?;
        if button >= MAX_BUTTONS {
            return Err(MappingError::InvalidBinding {
                entry: entry.name.clone(),
                reason: format!("button index {} out of range 0..{}", button, MAX_BUTTONS),
            });
        }
        match &mut entry.rule {
            Rule::Button(rule) => rule.button = Some(button),
            _ => {
                return Err(MappingError::WrongRuleKind {
                    entry: entry.name.clone(),
                    expected: "button",
                })
            },
        }

        let mut cleared = Vec::new();
        for (i, other) in self.entries.iter_mut().enumerate() {
            if i == index {
                continue;
            }
            if let Rule::Button(rule) = &mut other.rule {
                if rule.button == Some(button) {
                    rule.button = None;
                    cleared.push(other.name.clone());
                }
            }
        }
        Ok(cleared)
    }

    pub fn bind_axis(&mut self, index: usize, channel: AxisChannel) -> Result<(), MappingError> {
        let entry = self.entry_mut(index)?;
        match &mut entry.rule {
            Rule::Axis(rule) => {
                rule.channel = Some(channel);
                Ok(())
            },
            _ => Err(MappingError::WrongRuleKind {
                entry: entry.name.clone(),
                expected: "axis",
            }),
        }
    }

    pub fn bind_direction(&mut self, index: usize, angle: i32) -> Result<(), MappingError> {
        let entry = self.entry_mut(index)?;
        if !(0..36000).contains(&angle) {
            return Err(MappingError::InvalidBinding {
                entry: entry.name.clone(),
                reason: format!("POV angle {} out of range 0..36000", angle),
            });
        }
        match &mut entry.rule {
            Rule::Directional(rule) => {
                rule.angle = Some(angle);
                Ok(())
            },
            _ => Err(MappingError::WrongRuleKind {
                entry: entry.name.clone(),
                expected: "directional",
            }),
        }
    }

    /// Remove an entry's binding
    pub fn clear(&mut self, index: usize) -> Result<(), MappingError> {
        self.entry_mut(index)?.rule.unbind();
        Ok(())
    }

    /// Flat records for display and persistence
    pub fn records(&self) -> Vec<BindingRecord> {
        self.entries
            .iter()
            .map(|entry| {
                let mut record = BindingRecord::empty(&entry.name);
                match &entry.rule {
                    Rule::Button(rule) => {
                        record.button = rule.button.map_or(-1, |b| b as i32);
                    },
                    Rule::Axis(rule) => {
                        record.axis = rule.channel.map(|c| c.name().to_string());
                        record.threshold = Some(rule.threshold);
                        record.trigger_above = Some(rule.polarity.is_above());
                    },
                    Rule::Directional(rule) => {
                        record.pov = rule.angle.unwrap_or(-1);
                    },
                }
                record
            })
            .collect()
    }

    /// Rebind entries from records, all or nothing
    ///
    /// Entries without a record keep their binding. Button exclusivity is
    /// enforced in record order, so a later record wins a contested button.
    pub fn apply_records(&mut self, records: &[BindingRecord]) -> Result<(), MappingError> {
        let mut next = self.clone();
        for record in records {
            next.apply_record(record)?;
        }
        *self = next;
        Ok(())
    }

    fn apply_record(&mut self, record: &BindingRecord) -> Result<(), MappingError> {
        let index = self
            .find(&record.name)
            .ok_or_else(|| MappingError::UnknownEntry(record.name.clone()))?;

        let kind = self.entries[index].rule;
        match kind {
            Rule::Button(_) => match usize::try_from(record.button) {
                Ok(button) => {
                    self.bind_button(index, button)?;
                },
                Err(_) => self.clear(index)?,
            },
            Rule::Axis(_) => {
                match record.axis.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
                    Some(name) => {
                        let channel = name.parse::<AxisChannel>().map_err(|reason| {
                            MappingError::InvalidBinding {
                                entry: record.name.clone(),
                                reason,
                            }
                        })?;
                        self.bind_axis(index, channel)?;
                    },
                    None => self.clear(index)?,
                }
                if let Rule::Axis(rule) = &mut self.entries[index].rule {
                    if let Some(threshold) = record.threshold {
                        rule.threshold = threshold;
                    }
                    if let Some(above) = record.trigger_above {
                        rule.polarity = Polarity::from_trigger_above(above);
                    }
                }
            },
            Rule::Directional(_) => {
                if record.pov < 0 {
                    self.clear(index)?;
                } else {
                    self.bind_direction(index, record.pov)?;
                }
            },
        }
        Ok(())
    }

    /// Button entries owning `button`
    pub fn owners_of_button(&self, button: usize) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| matches!(e.rule, Rule::Button(ButtonRule { button: Some(b) }) if b == button))
            .map(|e| e.name.as_str())
            .collect()
    }
}
