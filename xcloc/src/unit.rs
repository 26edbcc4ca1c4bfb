//! Deriving rows from `<trans-unit>` elements, writing the two editable
//! fields back, and capturing their raw XML for undo.

use serde::{Deserialize, Serialize};

use crate::{
    error::Error,
    tree::Element,
    types::{Field, TranslationState, TranslationUnit},
};

pub const UNIT_ELEMENT: &str = "trans-unit";
pub const SOURCE_ELEMENT: &str = "source";
pub const TARGET_ELEMENT: &str = "target";
pub const NOTE_ELEMENT: &str = "note";
pub const ID_ATTRIBUTE: &str = "id";
pub const STATE_ATTRIBUTE: &str = "state";
pub const TRANSLATE_ATTRIBUTE: &str = "translate";

/// Substring of a plural parent's source, as in `%#@files@`.
pub const PLURAL_PARENT_MARKER: &str = "%#@";
/// Separator inside the ids of plural variants, as in `files|==|plural.one`.
pub const PLURAL_CHILD_MARKER: &str = "|==|";

/// Whether `translate="no"` is set on the unit.
pub fn is_do_not_translate(unit: &Element) -> bool {
    unit.attribute(TRANSLATE_ATTRIBUTE) == Some("no")
}

/// Derives the state of a unit.
///
/// `translate="no"` wins over everything else. Otherwise a missing target,
/// or a target without a `state`, is `New`.
pub fn derive_state(unit: &Element) -> TranslationState {
    if is_do_not_translate(unit) {
        return TranslationState::DoNotTranslate;
    }
    match unit
        .first_child_named(TARGET_ELEMENT)
        .and_then(|target| target.attribute(STATE_ATTRIBUTE))
    {
        Some(state) => TranslationState::from_attribute(state),
        None => TranslationState::New,
    }
}

pub fn is_plural_parent_source(source: &str) -> bool {
    source.contains(PLURAL_PARENT_MARKER)
}

pub fn is_plural_child_id(id: &str) -> bool {
    id.contains(PLURAL_CHILD_MARKER)
}

/// Builds the row for one `<trans-unit>`.
///
/// Fails with [`Error::MalformedUnit`] when the `id` attribute or the
/// `<source>` child is missing; callers skip such units.
pub fn derive_row(unit: &Element) -> Result<TranslationUnit, Error> {
    let id = unit
        .attribute(ID_ATTRIBUTE)
        .ok_or_else(|| Error::malformed_unit("", "missing `id` attribute"))?
        .to_string();
    let source = unit
        .first_child_named(SOURCE_ELEMENT)
        .ok_or_else(|| Error::malformed_unit(&id, "missing <source>"))?
        .text();
    let target = unit
        .first_child_named(TARGET_ELEMENT)
        .map(Element::text)
        .unwrap_or_default();
    let note = unit.first_child_named(NOTE_ELEMENT).map(Element::text);

    Ok(TranslationUnit {
        section: 0,
        is_plural_parent: is_plural_parent_source(&source),
        is_plural_child: is_plural_child_id(&id),
        state: derive_state(unit),
        id,
        source,
        target,
        note,
    })
}

/// The current value of `field`, as shown in its column.
pub fn read_field(unit: &Element, field: Field) -> String {
    match field {
        Field::Id => unit.attribute(ID_ATTRIBUTE).unwrap_or_default().to_string(),
        Field::Source => child_text(unit, SOURCE_ELEMENT),
        Field::Target => child_text(unit, TARGET_ELEMENT),
        Field::Note => child_text(unit, NOTE_ELEMENT),
        Field::State => derive_state(unit).to_string(),
    }
}

fn child_text(unit: &Element, name: &str) -> String {
    unit.first_child_named(name)
        .map(Element::text)
        .unwrap_or_default()
}

/// Writes `value` into `field`. Only [`Field::Target`] and
/// [`Field::State`] are writable.
pub fn write_field(unit: &mut Element, field: Field, value: &str) -> Result<(), Error> {
    match field {
        Field::Target => {
            write_target(unit, value);
            Ok(())
        }
        Field::State => {
            let state = value.parse().unwrap_or(TranslationState::New);
            write_state(unit, &state);
            Ok(())
        }
        Field::Id | Field::Source | Field::Note => Err(Error::UnsupportedField(field)),
    }
}

/// Sets the target text, creating `<target>` after `<source>` if needed.
pub fn write_target(unit: &mut Element, text: &str) {
    target_element(unit).set_text(text);
}

/// Sets the state of a unit.
///
/// `DoNotTranslate` only sets `translate="no"`; the target and its state
/// stay as they are so that switching back later restores them. Every other
/// state removes the marker and is written to the target's `state`
/// attribute.
pub fn write_state(unit: &mut Element, state: &TranslationState) {
    if *state == TranslationState::DoNotTranslate {
        unit.set_attribute(TRANSLATE_ATTRIBUTE, "no");
        return;
    }
    unit.remove_attribute(TRANSLATE_ATTRIBUTE);
    target_element(unit).set_attribute(STATE_ATTRIBUTE, state.as_str());
}

fn target_element(unit: &mut Element) -> &mut Element {
    unit.get_or_create_child_named_after(TARGET_ELEMENT, SOURCE_ELEMENT)
}

/// The raw editable parts of a unit: the `translate` attribute and the
/// target with its `state` attribute, exactly as they appear in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UnitSnapshot {
    pub translate: Option<String>,
    pub target: Option<TargetSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TargetSnapshot {
    pub text: String,
    pub state: Option<String>,
}

pub fn capture(unit: &Element) -> UnitSnapshot {
    UnitSnapshot {
        translate: unit.attribute(TRANSLATE_ATTRIBUTE).map(str::to_string),
        target: unit.first_child_named(TARGET_ELEMENT).map(|target| TargetSnapshot {
            text: target.text(),
            state: target.attribute(STATE_ATTRIBUTE).map(str::to_string),
        }),
    }
}

/// Puts the unit back into the state recorded by [`capture`].
///
/// A target that did not exist is removed again. Target content is only
/// replaced when its text differs, so unchanged markup survives.
pub fn restore(unit: &mut Element, snapshot: &UnitSnapshot) {
    match &snapshot.translate {
        Some(value) => unit.set_attribute(TRANSLATE_ATTRIBUTE, value.as_str()),
        None => {
            unit.remove_attribute(TRANSLATE_ATTRIBUTE);
        }
    }
    let Some(saved) = &snapshot.target else {
        unit.remove_child_named(TARGET_ELEMENT);
        return;
    };
    let target = target_element(unit);
    if target.text() != saved.text {
        target.set_text(saved.text.as_str());
    }
    match &saved.state {
        Some(state) => target.set_attribute(STATE_ATTRIBUTE, state.as_str()),
        None => {
            target.remove_attribute(STATE_ATTRIBUTE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::XmlDocument;

    fn unit(xml: &str) -> Element {
        XmlDocument::from_bytes(xml.as_bytes()).unwrap().root
    }

    #[test]
    fn test_derive_full_row() {
        let el = unit(
            r#"<trans-unit id="greeting"><source>Hello</source><target state="translated">Hallo</target><note>Shown on launch</note></trans-unit>"#,
        );
        let row = derive_row(&el).unwrap();
        assert_eq!(row.id, "greeting");
        assert_eq!(row.source, "Hello");
        assert_eq!(row.target, "Hallo");
        assert_eq!(row.note.as_deref(), Some("Shown on launch"));
        assert_eq!(row.state, TranslationState::Translated);
        assert!(!row.is_plural_parent);
        assert!(!row.is_plural_child);
    }

    #[test]
    fn test_missing_target_is_new_and_empty() {
        let el = unit(r#"<trans-unit id="a"><source>A</source></trans-unit>"#);
        let row = derive_row(&el).unwrap();
        assert_eq!(row.state, TranslationState::New);
        assert_eq!(row.target, "");
        assert_eq!(row.note, None);
    }

    #[test]
    fn test_target_without_state_is_new() {
        let el = unit(r#"<trans-unit id="a"><source>A</source><target>B</target></trans-unit>"#);
        assert_eq!(derive_state(&el), TranslationState::New);
    }

    #[test]
    fn test_do_not_translate_takes_precedence() {
        let el = unit(
            r#"<trans-unit id="a" translate="no"><source>A</source><target state="translated">B</target></trans-unit>"#,
        );
        assert_eq!(derive_state(&el), TranslationState::DoNotTranslate);

        let el = unit(r#"<trans-unit id="a" translate="yes"><source>A</source></trans-unit>"#);
        assert_eq!(derive_state(&el), TranslationState::New);
    }

    #[test]
    fn test_both_review_spellings_normalize() {
        let a = unit(
            r#"<trans-unit id="a"><source>A</source><target state="needs-review-l10n">B</target></trans-unit>"#,
        );
        let b = unit(
            r#"<trans-unit id="b"><source>A</source><target state="needs-translation">B</target></trans-unit>"#,
        );
        assert_eq!(derive_state(&a), TranslationState::NeedsReview);
        assert_eq!(derive_state(&a), derive_state(&b));
    }

    #[test]
    fn test_tool_specific_state_is_verbatim() {
        let el = unit(
            r#"<trans-unit id="a"><source>A</source><target state="final">B</target></trans-unit>"#,
        );
        assert_eq!(
            derive_state(&el),
            TranslationState::Other("final".to_string())
        );
    }

    #[test]
    fn test_dont_translate_labels_in_state_attribute_are_not_the_marker() {
        for label in ["mf_dont_translate", "do-not-translate", "dont_translate", "needs_review"] {
            let el = unit(&format!(
                r#"<trans-unit id="a"><source>A</source><target state="{}">B</target></trans-unit>"#,
                label
            ));
            assert_eq!(derive_state(&el), TranslationState::Other(label.to_string()));
        }
    }

    #[test]
    fn test_plural_markers() {
        let parent = unit(
            r#"<trans-unit id="files"><source>%#@files@</source></trans-unit>"#,
        );
        let child = unit(
            r#"<trans-unit id="files|==|plural.one"><source>%d file</source></trans-unit>"#,
        );
        assert!(derive_row(&parent).unwrap().is_plural_parent);
        assert!(derive_row(&child).unwrap().is_plural_child);
    }

    #[test]
    fn test_missing_source_is_malformed() {
        let el = unit(r#"<trans-unit id="broken"><target>x</target></trans-unit>"#);
        match derive_row(&el) {
            Err(Error::MalformedUnit { id, .. }) => assert_eq!(id, "broken"),
            other => panic!("expected MalformedUnit, got {:?}", other),
        }
    }

    #[test]
    fn test_read_field_covers_every_column() {
        let el = unit(
            r#"<trans-unit id="a" translate="no"><source>S</source><target>T</target></trans-unit>"#,
        );
        assert_eq!(read_field(&el, Field::Id), "a");
        assert_eq!(read_field(&el, Field::Source), "S");
        assert_eq!(read_field(&el, Field::Target), "T");
        assert_eq!(read_field(&el, Field::Note), "");
        assert_eq!(read_field(&el, Field::State), "mf_dont_translate");
    }

    #[test]
    fn test_write_immutable_field_fails_without_touching_tree() {
        let mut el = unit(r#"<trans-unit id="a"><source>S</source></trans-unit>"#);
        let before = el.clone();
        for field in [Field::Id, Field::Source, Field::Note] {
            assert!(matches!(
                write_field(&mut el, field, "x"),
                Err(Error::UnsupportedField(f)) if f == field
            ));
        }
        assert_eq!(el, before);
    }

    #[test]
    fn test_write_target_creates_target_after_source() {
        let mut el = unit(
            r#"<trans-unit id="a"><source>S</source><note>n</note></trans-unit>"#,
        );
        write_field(&mut el, Field::Target, "T").unwrap();
        let names: Vec<&str> = el.child_elements().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["source", "target", "note"]);
        assert_eq!(derive_row(&el).unwrap().target, "T");
    }

    #[test]
    fn test_write_state_creates_target() {
        let mut el = unit(r#"<trans-unit id="a"><source>S</source></trans-unit>"#);
        write_field(&mut el, Field::State, "translated").unwrap();
        let target = el.first_child_named("target").unwrap();
        assert_eq!(target.attribute("state"), Some("translated"));
        assert_eq!(target.text(), "");
    }

    #[test]
    fn test_do_not_translate_round_trip_keeps_target() {
        let mut el = unit(
            r#"<trans-unit id="a"><source>S</source><target state="needs-review-l10n">Hallo</target></trans-unit>"#,
        );
        write_state(&mut el, &TranslationState::DoNotTranslate);
        assert_eq!(derive_state(&el), TranslationState::DoNotTranslate);
        assert_eq!(derive_row(&el).unwrap().target, "Hallo");

        write_state(&mut el, &TranslationState::Translated);
        assert_eq!(el.attribute("translate"), None);
        let row = derive_row(&el).unwrap();
        assert_eq!(row.state, TranslationState::Translated);
        assert_eq!(row.target, "Hallo");
    }

    #[test]
    fn test_restore_puts_back_marker_state_and_missing_target() {
        let xml = r#"<trans-unit id="a" translate="no"><source>S</source><target state="needs_review">x</target></trans-unit>"#;
        let mut el = unit(xml);
        let snapshot = capture(&el);
        write_state(&mut el, &TranslationState::Translated);
        write_target(&mut el, "y");
        restore(&mut el, &snapshot);
        assert_eq!(el, unit(xml));

        let xml = r#"<trans-unit id="b"><source>S</source><note>n</note></trans-unit>"#;
        let mut el = unit(xml);
        let snapshot = capture(&el);
        assert_eq!(snapshot.target, None);
        write_target(&mut el, "T");
        restore(&mut el, &snapshot);
        assert_eq!(el, unit(xml));
    }

    #[test]
    fn test_needs_review_is_written_with_canonical_spelling() {
        let mut el = unit(
            r#"<trans-unit id="a"><source>S</source><target state="needs-translation">x</target></trans-unit>"#,
        );
        write_state(&mut el, &TranslationState::NeedsReview);
        assert_eq!(
            el.first_child_named("target").unwrap().attribute("state"),
            Some("needs-review-l10n")
        );
    }
}
