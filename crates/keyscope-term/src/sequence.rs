//! Multi-key sequences and the event kinds they fire on.

use crate::combo::{KeyCombo, parse_key_combo};
use crossterm::event::KeyEventKind;
use keyscope_core::BindingError;
use std::fmt;

/// One or more combos pressed in order, written space separated
/// (`"g g"`, `"C-x C-s"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeySequence {
    combos: Vec<KeyCombo>,
}

impl KeySequence {
    pub fn parse(input: &str) -> Result<Self, BindingError> {
        let combos = input
            .split_whitespace()
            .map(parse_key_combo)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|reason| BindingError::InvalidSequence {
                sequence: input.to_string(),
                reason,
            })?;
        if combos.is_empty() {
            return Err(BindingError::InvalidSequence {
                sequence: input.to_string(),
                reason: "empty sequence".to_string(),
            });
        }
        Ok(Self { combos })
    }

    pub fn combos(&self) -> &[KeyCombo] {
        &self.combos
    }

    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }
}

impl fmt::Display for KeySequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.combos.iter().map(KeyCombo::display).collect();
        f.write_str(&parts.join(" "))
    }
}

/// Which key event kind a binding reacts to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Trigger {
    #[default]
    Press,
    Release,
    Repeat,
}

impl Trigger {
    /// Press bindings also fire on auto-repeat, so holding a key keeps
    /// working on terminals that report repeats.
    pub fn accepts(self, kind: KeyEventKind) -> bool {
        match self {
            Trigger::Press => matches!(kind, KeyEventKind::Press | KeyEventKind::Repeat),
            Trigger::Release => kind == KeyEventKind::Release,
            Trigger::Repeat => kind == KeyEventKind::Repeat,
        }
    }
}

pub fn parse_trigger(sequence: &str, action: Option<&str>) -> Result<Trigger, BindingError> {
    let Some(action) = action else {
        return Ok(Trigger::Press);
    };
    match action.trim().to_ascii_lowercase().as_str() {
        "press" | "keydown" => Ok(Trigger::Press),
        "release" | "keyup" => Ok(Trigger::Release),
        "repeat" => Ok(Trigger::Repeat),
        _ => Err(BindingError::InvalidAction {
            sequence: sequence.to_string(),
            action: action.to_string(),
        }),
    }
}
