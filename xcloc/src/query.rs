//! Read-only views over derived rows: filtering, sorting, and progress.

use std::{cmp::Ordering, collections::BTreeMap};

use serde::Serialize;

use crate::{
    plural::UnitGroup,
    types::{Field, FileSection, TranslationState, TranslationUnit},
};

/// Case-insensitive substring match against id, source, target, and note.
pub fn matches_query(unit: &TranslationUnit, query: &str) -> bool {
    let needle = query.to_lowercase();
    [Field::Id, Field::Source, Field::Target, Field::Note]
        .into_iter()
        .any(|field| unit.cell(field).to_lowercase().contains(&needle))
}

/// Units matching `query`, in their original order. An empty query keeps
/// every unit.
pub fn filter(units: &[TranslationUnit], query: &str) -> Vec<TranslationUnit> {
    if query.is_empty() {
        return units.to_vec();
    }
    units
        .iter()
        .filter(|unit| matches_query(unit, query))
        .cloned()
        .collect()
}

/// Groups with at least one matching unit. A matching family is kept whole
/// so that variants are never shown without their parent.
pub fn filter_groups(groups: &[UnitGroup], query: &str) -> Vec<UnitGroup> {
    if query.is_empty() {
        return groups.to_vec();
    }
    groups
        .iter()
        .filter(|group| group.units().any(|unit| matches_query(unit, query)))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Sort key of a unit for one column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Rank(u8),
    Text(String),
}

pub fn sort_key(unit: &TranslationUnit, column: Field) -> SortKey {
    match column {
        Field::State => SortKey::Rank(unit.state.rank()),
        _ => SortKey::Text(unit.cell(column).to_lowercase()),
    }
}

/// Sorts in place by `column`. The sort is stable: units with equal keys
/// keep their relative order, whatever the direction.
pub fn sort_units(units: &mut [TranslationUnit], column: Field, order: SortOrder) {
    units.sort_by(|a, b| compare(&sort_key(a, column), &sort_key(b, column), order));
}

/// Sorts groups by the key of their head row, or by the aggregate state of
/// a family when sorting by state.
pub fn sort_groups(groups: &mut [UnitGroup], column: Field, order: SortOrder) {
    let key = |group: &UnitGroup| match column {
        Field::State => SortKey::Rank(group.state().rank()),
        _ => sort_key(group.head(), column),
    };
    groups.sort_by(|a, b| compare(&key(a), &key(b), order));
}

fn compare(a: &SortKey, b: &SortKey, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Ascending => a.cmp(b),
        SortOrder::Descending => b.cmp(a),
    }
}

/// Translated units over all units that are not `DoNotTranslate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Progress {
    pub translated: usize,
    pub total: usize,
}

impl Progress {
    pub fn of<'a, I>(units: I) -> Self
    where
        I: IntoIterator<Item = &'a TranslationUnit>,
    {
        let mut progress = Progress::default();
        for unit in units {
            progress.record(&unit.state);
        }
        progress
    }

    pub fn record(&mut self, state: &TranslationState) {
        match state {
            TranslationState::DoNotTranslate => {}
            TranslationState::Translated => {
                self.translated += 1;
                self.total += 1;
            }
            _ => self.total += 1,
        }
    }

    /// `translated / total`; nothing left to translate counts as done.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.translated as f64 / self.total as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.translated == self.total
    }
}

impl std::ops::Add for Progress {
    type Output = Progress;

    fn add(self, other: Progress) -> Progress {
        Progress {
            translated: self.translated + other.translated,
            total: self.total + other.total,
        }
    }
}

impl std::iter::Sum for Progress {
    fn sum<I: Iterator<Item = Progress>>(iter: I) -> Progress {
        iter.fold(Progress::default(), |acc, p| acc + p)
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} ({:.2}%)",
            self.translated,
            self.total,
            self.ratio() * 100.0
        )
    }
}

/// One file of the project-wide outline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutline {
    pub section: FileSection,
    pub groups: Vec<UnitGroup>,
    pub progress: Progress,
}

/// Units grouped by the source file they come from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectOutline {
    pub files: Vec<FileOutline>,
    pub progress: Progress,
}

impl ProjectOutline {
    /// Builds the outline from a document's sections and units. Units are
    /// assumed to be in document order; sections without units still appear.
    pub fn build(sections: &[FileSection], units: &[TranslationUnit]) -> Self {
        let mut by_section: BTreeMap<usize, Vec<TranslationUnit>> = BTreeMap::new();
        for unit in units {
            by_section
                .entry(unit.section)
                .or_default()
                .push(unit.clone());
        }

        let files: Vec<FileOutline> = sections
            .iter()
            .map(|section| {
                let units = by_section.remove(&section.index).unwrap_or_default();
                let progress = Progress::of(&units);
                FileOutline {
                    section: section.clone(),
                    groups: crate::plural::group(units),
                    progress,
                }
            })
            .collect();
        let progress = files.iter().map(|file| file.progress).sum();

        ProjectOutline { files, progress }
    }

    /// The file whose `original` path is `path`.
    pub fn file(&self, path: &str) -> Option<&FileOutline> {
        self.files.iter().find(|file| file.section.original == path)
    }
}
