use serde_json::json;
use std::collections::BTreeMap;
use xcloc::{Bundle, Progress, TranslationState, TranslationUnit};

fn by_state(units: &[&TranslationUnit]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for unit in units {
        let key = match &unit.state {
            TranslationState::New => "new".to_string(),
            TranslationState::NeedsReview => "needs_review".to_string(),
            TranslationState::Translated => "translated".to_string(),
            TranslationState::DoNotTranslate => "do_not_translate".to_string(),
            TranslationState::Other(label) => label.clone(),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

fn percent(progress: &Progress) -> f64 {
    (progress.ratio() * 10000.0).round() / 100.0
}

pub fn print_stats(bundle: &mut Bundle, json_output: bool) -> Result<(), String> {
    let mut documents = Vec::new();
    let mut project = Progress::default();

    for path in bundle.document_paths() {
        let document = bundle.document(&path).map_err(|e| e.to_string())?;
        let units = document.units().units;
        let outline = document.outline();
        project = project + outline.progress;

        let files: Vec<_> = outline
            .files
            .iter()
            .map(|file| {
                let members: Vec<&TranslationUnit> = units
                    .iter()
                    .filter(|u| u.section == file.section.index)
                    .collect();
                (file, by_state(&members))
            })
            .collect();

        if json_output {
            let per_file: Vec<_> = files
                .iter()
                .map(|(file, counts)| {
                    json!({
                        "original": file.section.original,
                        "target_language": file.section.target_language,
                        "total": counts.values().sum::<usize>(),
                        "by_status": counts,
                        "translated": file.progress.translated,
                        "denominator": file.progress.total,
                        "completion_percent": percent(&file.progress),
                    })
                })
                .collect();
            documents.push(json!({
                "path": path,
                "completion_percent": percent(&outline.progress),
                "files": per_file,
            }));
        } else {
            println!("\n=== {} ===", path);
            for (file, counts) in &files {
                println!("\nFile: {}", file.section.original);
                println!("  Total: {}", counts.values().sum::<usize>());
                println!("  By status:");
                for (state, count) in counts {
                    println!("    {}: {}", state, count);
                }
                println!("  Completion: {:.2}%", percent(&file.progress));
            }
        }
    }

    if json_output {
        let body = json!({
            "summary": {
                "bundle": bundle.path().display().to_string(),
                "target_locale": bundle.manifest().and_then(|m| m.target_locale.clone()),
                "translated": project.translated,
                "denominator": project.total,
                "completion_percent": percent(&project),
            },
            "documents": documents,
        });
        let text = serde_json::to_string_pretty(&body).map_err(|e| e.to_string())?;
        println!("{}", text);
    } else {
        println!("\nProject: {}", project);
    }
    Ok(())
}
