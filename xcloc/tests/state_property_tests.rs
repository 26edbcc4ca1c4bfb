use proptest::prelude::*;
use xcloc::{Document, TranslationState, UnitRef, edit};

fn state_attr_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        prop::sample::select(vec![
            "new",
            "needs-review-l10n",
            "needs-translation",
            "translated",
            "final",
            "mf_dont_translate",
            "do-not-translate",
            "dont_translate",
            "needs_review",
        ])
        .prop_map(|label| Some(label.to_string())),
        proptest::string::string_regex("[A-Za-z_-]{1,20}")
            .expect("valid label regex")
            .prop_map(Some),
    ]
}

fn new_state_strategy() -> impl Strategy<Value = TranslationState> {
    prop_oneof![
        Just(TranslationState::New),
        Just(TranslationState::NeedsReview),
        Just(TranslationState::Translated),
        Just(TranslationState::DoNotTranslate),
    ]
}

/// What a `state` attribute reads as when no `translate="no"` is present.
fn expected_state(label: Option<&str>) -> TranslationState {
    match label {
        None | Some("new") => TranslationState::New,
        Some("needs-review-l10n") | Some("needs-translation") => TranslationState::NeedsReview,
        Some("translated") => TranslationState::Translated,
        Some(other) => TranslationState::Other(other.to_string()),
    }
}

fn translate_attr_strategy() -> impl Strategy<Value = Option<&'static str>> {
    prop_oneof![Just(None), Just(Some("yes")), Just(Some("no"))]
}

fn text_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[A-Za-z0-9 äöüß<>&\"'%@|=.,!?]{0,30}").expect("valid text regex")
}

fn unit_xml(translate: Option<&str>, has_target: bool, state: Option<&str>) -> String {
    let translate = translate
        .map(|t| format!(r#" translate="{}""#, t))
        .unwrap_or_default();
    let target = if has_target {
        let state = state
            .map(|s| format!(r#" state="{}""#, s))
            .unwrap_or_default();
        format!("<target{}>Ziel</target>", state)
    } else {
        String::new()
    };
    format!(
        r#"<xliff version="1.2"><file original="a.strings"><body><trans-unit id="u"{}><source>Source</source>{}</trans-unit></body></file></xliff>"#,
        translate, target
    )
}

proptest! {
    #[test]
    fn prop_do_not_translate_iff_marker(
        translate in translate_attr_strategy(),
        has_target in any::<bool>(),
        state in state_attr_strategy(),
    ) {
        let xml = unit_xml(translate, has_target, state.as_deref());
        let doc = Document::parse("de.xliff", xml.as_bytes()).unwrap();
        let row = doc.unit(&UnitRef::new(0, "u")).unwrap();

        prop_assert_eq!(
            row.state == TranslationState::DoNotTranslate,
            translate == Some("no")
        );
        if translate != Some("no") {
            let label = if has_target { state.as_deref() } else { None };
            prop_assert_eq!(row.state, expected_state(label));
        }
    }

    #[test]
    fn prop_target_text_survives_serialization(text in text_strategy()) {
        let xml = unit_xml(None, false, None);
        let mut doc = Document::parse("de.xliff", xml.as_bytes()).unwrap();
        let unit = UnitRef::new(0, "u");
        edit::set_target_text(&mut doc, &unit, &text).unwrap();

        let bytes = doc.to_bytes().unwrap();
        let reparsed = Document::parse("de.xliff", &bytes).unwrap();
        prop_assert_eq!(reparsed.unit(&unit).unwrap().target, text);
    }

    #[test]
    fn prop_do_not_translate_round_trip_keeps_target(
        has_target in any::<bool>(),
        state in state_attr_strategy(),
    ) {
        let xml = unit_xml(None, has_target, state.as_deref());
        let mut doc = Document::parse("de.xliff", xml.as_bytes()).unwrap();
        let unit = UnitRef::new(0, "u");
        let before = doc.unit(&unit).unwrap();

        let delta = edit::set_state(&mut doc, &unit, &TranslationState::DoNotTranslate).unwrap();
        edit::apply(&mut doc, &delta.inverse()).unwrap();

        let after = doc.unit(&unit).unwrap();
        prop_assert_eq!(after.target, before.target);
        prop_assert_eq!(after.state, before.state);
    }

    #[test]
    fn prop_inverse_restores_document_bytes(
        translate in translate_attr_strategy(),
        has_target in any::<bool>(),
        state in state_attr_strategy(),
        new_state in new_state_strategy(),
        text in text_strategy(),
    ) {
        let xml = unit_xml(translate, has_target, state.as_deref());
        let mut doc = Document::parse("de.xliff", xml.as_bytes()).unwrap();
        let unit = UnitRef::new(0, "u");

        let state_delta = edit::set_state(&mut doc, &unit, &new_state).unwrap();
        let text_delta = edit::set_target_text(&mut doc, &unit, &text).unwrap();
        edit::apply(&mut doc, &text_delta.inverse()).unwrap();
        edit::apply(&mut doc, &state_delta.inverse()).unwrap();

        prop_assert_eq!(doc.to_bytes().unwrap(), xml.into_bytes());
    }
}
