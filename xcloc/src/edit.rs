//! Edit commands against a document.
//!
//! Every applied command returns an [`EditDelta`] describing the change; the
//! delta's [`inverse`](EditDelta::inverse) is the command that undoes it.
//! [`History`] keeps deltas on undo/redo stacks for hosts without their own
//! undo system.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    bundle::Bundle,
    document::Document,
    error::Error,
    tree::Element,
    types::{Field, TranslationState, UnitRef},
    unit::{UnitSnapshot, capture, derive_state, read_field, restore, write_state, write_target},
};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum EditCommand {
    SetTargetText {
        unit: UnitRef,
        text: String,
    },
    SetState {
        unit: UnitRef,
        state: TranslationState,
    },
    /// `Translated` becomes `NeedsReview`; any other state becomes
    /// `Translated`.
    ToggleTranslated {
        unit: UnitRef,
    },
    /// Puts back the raw target and attributes captured in `snapshot`.
    /// `field` is the column reported in the resulting delta.
    Restore {
        unit: UnitRef,
        field: Field,
        snapshot: UnitSnapshot,
    },
}

impl EditCommand {
    pub fn unit(&self) -> &UnitRef {
        match self {
            EditCommand::SetTargetText { unit, .. }
            | EditCommand::SetState { unit, .. }
            | EditCommand::ToggleTranslated { unit }
            | EditCommand::Restore { unit, .. } => unit,
        }
    }
}

/// What an applied command changed.
///
/// `old_value` and `new_value` are the column as displayed. `before` and
/// `after` hold the raw unit, which is what undo and redo write back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EditDelta {
    /// Path of the document inside the bundle.
    pub document: String,
    pub unit: UnitRef,
    pub field: Field,
    pub old_value: String,
    pub new_value: String,
    pub before: UnitSnapshot,
    pub after: UnitSnapshot,
}

impl EditDelta {
    /// The command that puts the unit back as it was before this edit.
    pub fn inverse(&self) -> EditCommand {
        EditCommand::Restore {
            unit: self.unit.clone(),
            field: self.field,
            snapshot: self.before.clone(),
        }
    }

    /// The command that repeats this edit.
    pub fn replay(&self) -> EditCommand {
        EditCommand::Restore {
            unit: self.unit.clone(),
            field: self.field,
            snapshot: self.after.clone(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.before == self.after
    }
}

/// Applies `change` to one unit and records the raw unit around it.
fn record_change<F>(
    doc: &mut Document,
    unit: &UnitRef,
    field: Field,
    change: F,
) -> Result<EditDelta, Error>
where
    F: FnOnce(&mut Element),
{
    let path = doc.path().to_string();
    let element = doc.unit_element_mut(unit)?;
    let before = capture(element);
    let old_value = read_field(element, field);
    change(element);

    Ok(EditDelta {
        document: path,
        unit: unit.clone(),
        field,
        old_value,
        new_value: read_field(element, field),
        before,
        after: capture(element),
    })
}

/// Writes `value` to a writable field. `Id`, `Source` and `Note` are
/// rejected before the document is touched.
pub fn write_field(
    doc: &mut Document,
    unit: &UnitRef,
    field: Field,
    value: &str,
) -> Result<EditDelta, Error> {
    match field {
        Field::Target => set_target_text(doc, unit, value),
        Field::State => {
            let state = value.parse().unwrap_or(TranslationState::New);
            set_state(doc, unit, &state)
        }
        Field::Id | Field::Source | Field::Note => Err(Error::UnsupportedField(field)),
    }
}

pub fn set_target_text(doc: &mut Document, unit: &UnitRef, text: &str) -> Result<EditDelta, Error> {
    let delta = record_change(doc, unit, Field::Target, |el| write_target(el, text))?;
    debug!("Set target of {} in `{}`", unit, delta.document);
    Ok(delta)
}

pub fn set_state(
    doc: &mut Document,
    unit: &UnitRef,
    state: &TranslationState,
) -> Result<EditDelta, Error> {
    let delta = record_change(doc, unit, Field::State, |el| write_state(el, state))?;
    debug!("Set state of {} in `{}` to {}", unit, delta.document, state);
    Ok(delta)
}

pub fn toggle_translated(doc: &mut Document, unit: &UnitRef) -> Result<EditDelta, Error> {
    let current = derive_state(doc.unit_element(unit)?);
    let next = match current {
        TranslationState::Translated => TranslationState::NeedsReview,
        _ => TranslationState::Translated,
    };
    set_state(doc, unit, &next)
}

pub fn restore_unit(
    doc: &mut Document,
    unit: &UnitRef,
    field: Field,
    snapshot: &UnitSnapshot,
) -> Result<EditDelta, Error> {
    record_change(doc, unit, field, |el| restore(el, snapshot))
}

pub fn apply(doc: &mut Document, command: &EditCommand) -> Result<EditDelta, Error> {
    match command {
        EditCommand::SetTargetText { unit, text } => set_target_text(doc, unit, text),
        EditCommand::SetState { unit, state } => set_state(doc, unit, state),
        EditCommand::ToggleTranslated { unit } => toggle_translated(doc, unit),
        EditCommand::Restore {
            unit,
            field,
            snapshot,
        } => restore_unit(doc, unit, *field, snapshot),
    }
}

/// Undo and redo stacks of applied edits.
#[derive(Debug, Clone, Default)]
pub struct History {
    past: Vec<EditDelta>,
    future: Vec<EditDelta>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `command` to the document at `path` and records it.
    /// Clears the redo stack.
    pub fn apply(
        &mut self,
        bundle: &mut Bundle,
        path: &str,
        command: &EditCommand,
    ) -> Result<EditDelta, Error> {
        let delta = apply(bundle.document_mut(path)?, command)?;
        self.record(delta.clone());
        Ok(delta)
    }

    /// Records an edit applied elsewhere.
    pub fn record(&mut self, delta: EditDelta) {
        self.past.push(delta);
        self.future.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Reverts the most recent edit. `Ok(None)` when there is nothing to
    /// undo.
    pub fn undo(&mut self, bundle: &mut Bundle) -> Result<Option<EditDelta>, Error> {
        let Some(delta) = self.past.pop() else {
            return Ok(None);
        };
        match revert(bundle, &delta) {
            Ok(reverted) => {
                self.future.push(delta);
                Ok(Some(reverted))
            }
            Err(e) => {
                self.past.push(delta);
                Err(e)
            }
        }
    }

    /// Re-applies the most recently undone edit.
    pub fn redo(&mut self, bundle: &mut Bundle) -> Result<Option<EditDelta>, Error> {
        let Some(delta) = self.future.pop() else {
            return Ok(None);
        };
        match bundle
            .document_mut(&delta.document)
            .and_then(|doc| apply(doc, &delta.replay()))
        {
            Ok(redone) => {
                self.past.push(delta);
                Ok(Some(redone))
            }
            Err(e) => {
                self.future.push(delta);
                Err(e)
            }
        }
    }
}

fn revert(bundle: &mut Bundle, delta: &EditDelta) -> Result<EditDelta, Error> {
    let doc = bundle.document_mut(&delta.document)?;
    apply(doc, &delta.inverse())
}
