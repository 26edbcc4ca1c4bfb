use xcloc::{Bundle, Document, EditCommand, EditDelta, TranslationState, UnitRef, edit};

use crate::resolve_document;

fn parse_state(state: &str) -> Result<TranslationState, String> {
    match state.parse::<TranslationState>() {
        Ok(TranslationState::Other(label)) => Err(format!(
            "Unknown state '{}'; expected new, needs-review, translated or do-not-translate",
            label
        )),
        Ok(state) => Ok(state),
        Err(never) => match never {},
    }
}

fn locate_unit(document: &Document, id: &str, section: Option<usize>) -> Result<UnitRef, String> {
    match section {
        Some(section) => Ok(UnitRef::new(section, id)),
        None => document
            .find_unit(id)
            .ok_or_else(|| format!("Unit '{}' not found in {}", id, document.path())),
    }
}

fn report(delta: &EditDelta) {
    println!(
        "{} {}: '{}' -> '{}'",
        delta.unit, delta.field, delta.old_value, delta.new_value
    );
}

fn apply_and_save(
    bundle: &mut Bundle,
    doc: Option<String>,
    id: &str,
    section: Option<usize>,
    commands: impl FnOnce(UnitRef) -> Vec<EditCommand>,
) -> Result<(), String> {
    let path = resolve_document(bundle, doc)?;
    let document = bundle.document_mut(&path).map_err(|e| e.to_string())?;
    let unit = locate_unit(document, id, section)?;

    for command in commands(unit) {
        let delta = edit::apply(document, &command).map_err(|e| e.to_string())?;
        report(&delta);
    }

    let saved = bundle.save().map_err(|e| e.to_string())?;
    for path in &saved.written {
        println!("Saved {}", path);
    }
    Ok(())
}

pub fn run_set_command(
    bundle: &mut Bundle,
    doc: Option<String>,
    id: &str,
    section: Option<usize>,
    target: Option<String>,
    state: Option<String>,
) -> Result<(), String> {
    if target.is_none() && state.is_none() {
        return Err("Nothing to set; pass --target and/or --state".to_string());
    }
    let state = state.as_deref().map(parse_state).transpose()?;

    apply_and_save(bundle, doc, id, section, |unit| {
        let mut commands = Vec::new();
        if let Some(text) = target {
            commands.push(EditCommand::SetTargetText {
                unit: unit.clone(),
                text,
            });
        }
        if let Some(state) = state {
            commands.push(EditCommand::SetState { unit, state });
        }
        commands
    })
}

pub fn run_toggle_command(
    bundle: &mut Bundle,
    doc: Option<String>,
    id: &str,
    section: Option<usize>,
) -> Result<(), String> {
    apply_and_save(bundle, doc, id, section, |unit| {
        vec![EditCommand::ToggleTranslated { unit }]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_state_accepts_cli_spellings() {
        assert_eq!(parse_state("translated").unwrap(), TranslationState::Translated);
        assert_eq!(parse_state("needs-review").unwrap(), TranslationState::NeedsReview);
        assert_eq!(
            parse_state("do-not-translate").unwrap(),
            TranslationState::DoNotTranslate
        );
        assert!(parse_state("final").is_err());
    }
}
