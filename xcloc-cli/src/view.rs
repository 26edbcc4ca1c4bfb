use xcloc::{
    Bundle, Field, SortOrder, TranslationUnit, UnitGroup,
    query::{filter_groups, sort_groups},
};

use crate::resolve_document;

const TRUNCATE_AT: usize = 50;

pub struct ViewOptions {
    pub doc: Option<String>,
    pub filter: Option<String>,
    pub sort: Option<String>,
    pub descending: bool,
    pub full: bool,
}

fn display(value: &str, full: bool) -> String {
    if full || value.chars().count() <= TRUNCATE_AT {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(TRUNCATE_AT).collect();
        format!("{}...", truncated)
    }
}

fn print_unit(unit: &TranslationUnit, indent: &str, full: bool) {
    println!("{}[{}] {}", indent, unit.state, unit.id);
    println!("{}    Source: {}", indent, display(&unit.source, full));
    println!("{}    Target: {}", indent, display(&unit.target, full));
    if let Some(note) = &unit.note {
        println!("{}    Note: {}", indent, display(note, full));
    }
}

/// Print the units of one document, grouped by source file, with plural
/// variants indented under their parent.
pub fn print_view(bundle: &mut Bundle, options: &ViewOptions) -> Result<(), String> {
    let path = resolve_document(bundle, options.doc.clone())?;
    let column = match &options.sort {
        Some(column) => Some(column.parse::<Field>()?),
        None => None,
    };
    let order = if options.descending {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };

    let document = bundle.document(&path).map_err(|e| e.to_string())?;
    let listing = document.units();
    for skipped in &listing.skipped {
        eprintln!("Skipped: {}", skipped);
    }
    let outline = document.outline();

    println!("=== {} ===", path);
    let mut shown = 0;
    for file in &outline.files {
        let mut groups: Vec<UnitGroup> = match &options.filter {
            Some(query) => filter_groups(&file.groups, query),
            None => file.groups.clone(),
        };
        if groups.is_empty() {
            continue;
        }
        if let Some(column) = column {
            sort_groups(&mut groups, column, order);
        }

        println!(
            "\n--- {} ({}) {} ---",
            file.section.original,
            file.section.target_language.as_deref().unwrap_or("?"),
            file.progress
        );
        for group in &groups {
            match group {
                UnitGroup::Single(unit) => print_unit(unit, "  ", options.full),
                UnitGroup::Family(family) => {
                    print_unit(&family.parent, "  ", options.full);
                    for child in &family.children {
                        print_unit(child, "      ", options.full);
                    }
                }
            }
            shown += group.units().count();
        }
    }

    if shown == 0 {
        return Err(match &options.filter {
            Some(query) => format!("No units match '{}'", query),
            None => "No units found".to_string(),
        });
    }
    println!("\n{} unit(s)", shown);
    Ok(())
}
