//! Grouping of pluralizable strings.
//!
//! Xcode exports a pluralizable string as a parent unit whose source holds a
//! `%#@variable@` placeholder, followed by one unit per plural variant whose
//! id carries `|==|`. The grouper relies only on that adjacency.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::{
    types::{TranslationState, TranslationUnit},
    unit::PLURAL_CHILD_MARKER,
};

lazy_static! {
    static ref PLURAL_VARIABLE: Regex = Regex::new(r"%#@([^@]*)@").unwrap();
}

/// The name of the first plural variable in `source` (`files` for
/// `%#@files@`).
pub fn plural_variable(source: &str) -> Option<&str> {
    PLURAL_VARIABLE
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The variant part of a plural child's id (`plural.one` for
/// `files|==|plural.one`).
pub fn variant_label(id: &str) -> Option<&str> {
    id.split_once(PLURAL_CHILD_MARKER).map(|(_, label)| label)
}

/// A plural parent and the variant units that directly follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluralFamily {
    pub parent: TranslationUnit,
    pub children: Vec<TranslationUnit>,
}

impl PluralFamily {
    pub fn members(&self) -> impl Iterator<Item = &TranslationUnit> {
        std::iter::once(&self.parent).chain(self.children.iter())
    }

    pub fn variable(&self) -> Option<&str> {
        plural_variable(&self.parent.source)
    }

    /// Complete when every member is `Translated` or `DoNotTranslate`.
    pub fn is_complete(&self) -> bool {
        self.members().all(|unit| unit.state.is_settled())
    }

    /// State shown for the family as a whole.
    ///
    /// Any `New` member makes the family `New`; otherwise any member needing
    /// attention (`NeedsReview` or a tool-specific label) makes it
    /// `NeedsReview`. A complete family is `DoNotTranslate` only when every
    /// member is, and `Translated` otherwise.
    pub fn aggregate_state(&self) -> TranslationState {
        if self.members().any(|u| u.state == TranslationState::New) {
            TranslationState::New
        } else if !self.is_complete() {
            TranslationState::NeedsReview
        } else if self
            .members()
            .all(|u| u.state == TranslationState::DoNotTranslate)
        {
            TranslationState::DoNotTranslate
        } else {
            TranslationState::Translated
        }
    }
}

/// One entry of the grouped view: a standalone unit or a whole family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitGroup {
    Single(TranslationUnit),
    Family(PluralFamily),
}

impl UnitGroup {
    /// The unit shown as the group's own row.
    pub fn head(&self) -> &TranslationUnit {
        match self {
            UnitGroup::Single(unit) => unit,
            UnitGroup::Family(family) => &family.parent,
        }
    }

    pub fn units(&self) -> Box<dyn Iterator<Item = &TranslationUnit> + '_> {
        match self {
            UnitGroup::Single(unit) => Box::new(std::iter::once(unit)),
            UnitGroup::Family(family) => Box::new(family.members()),
        }
    }

    pub fn state(&self) -> TranslationState {
        match self {
            UnitGroup::Single(unit) => unit.state.clone(),
            UnitGroup::Family(family) => family.aggregate_state(),
        }
    }
}

/// Groups units in document order.
///
/// A parent opens a family that takes every directly following child-marked
/// unit. A child-marked unit with no open family stays a standalone unit.
pub fn group<I>(units: I) -> Vec<UnitGroup>
where
    I: IntoIterator<Item = TranslationUnit>,
{
    let mut groups = Vec::new();
    let mut open: Option<PluralFamily> = None;

    for unit in units {
        if unit.is_plural_child {
            if let Some(family) = open.as_mut() {
                family.children.push(unit);
                continue;
            }
            log::debug!("plural variant `{}` has no parent; keeping it standalone", unit.id);
        }

        if let Some(family) = open.take() {
            groups.push(UnitGroup::Family(family));
        }

        if unit.is_plural_parent {
            open = Some(PluralFamily {
                parent: unit,
                children: Vec::new(),
            });
        } else {
            groups.push(UnitGroup::Single(unit));
        }
    }

    if let Some(family) = open {
        groups.push(UnitGroup::Family(family));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, source: &str, state: TranslationState) -> TranslationUnit {
        TranslationUnit {
            section: 0,
            id: id.to_string(),
            source: source.to_string(),
            target: String::new(),
            note: None,
            state,
            is_plural_parent: source.contains("%#@"),
            is_plural_child: id.contains("|==|"),
        }
    }

    fn ids(group: &UnitGroup) -> Vec<&str> {
        group.units().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn test_parent_collects_following_children() {
        let units = vec![
            unit("files", "%#@files@", TranslationState::Translated),
            unit("files|==|plural.one", "%d file", TranslationState::Translated),
            unit("files|==|plural.other", "%d files", TranslationState::Translated),
            unit("title", "Title", TranslationState::New),
        ];
        let groups = group(units);
        assert_eq!(groups.len(), 2);
        assert_eq!(
            ids(&groups[0]),
            vec!["files", "files|==|plural.one", "files|==|plural.other"]
        );
        assert!(matches!(groups[1], UnitGroup::Single(ref u) if u.id == "title"));
    }

    #[test]
    fn test_children_do_not_jump_over_unrelated_units() {
        let units = vec![
            unit("a", "%#@a@", TranslationState::New),
            unit("a|==|plural.one", "one", TranslationState::New),
            unit("plain", "Plain", TranslationState::New),
            unit("b|==|plural.one", "orphan", TranslationState::New),
        ];
        let groups = group(units);
        assert_eq!(groups.len(), 3);
        assert_eq!(ids(&groups[0]), vec!["a", "a|==|plural.one"]);
        assert!(matches!(groups[2], UnitGroup::Single(ref u) if u.id == "b|==|plural.one"));
    }

    #[test]
    fn test_consecutive_parents_open_separate_families() {
        let units = vec![
            unit("a", "%#@a@", TranslationState::New),
            unit("b", "%#@b@", TranslationState::New),
            unit("b|==|plural.other", "many", TranslationState::New),
        ];
        let groups = group(units);
        assert_eq!(groups.len(), 2);
        assert_eq!(ids(&groups[0]), vec!["a"]);
        assert_eq!(ids(&groups[1]), vec!["b", "b|==|plural.other"]);
    }

    #[test]
    fn test_orphan_child_at_start_is_standalone() {
        let groups = group(vec![unit("x|==|plural.one", "x", TranslationState::New)]);
        assert!(matches!(groups[0], UnitGroup::Single(_)));
    }

    #[test]
    fn test_aggregate_state() {
        let family = |states: [TranslationState; 3]| {
            let [p, c1, c2] = states;
            PluralFamily {
                parent: unit("f", "%#@f@", p),
                children: vec![
                    unit("f|==|plural.one", "1", c1),
                    unit("f|==|plural.other", "n", c2),
                ],
            }
        };
        use TranslationState::*;

        let f = family([Translated, NeedsReview, New]);
        assert_eq!(f.aggregate_state(), New);
        assert!(!f.is_complete());

        let f = family([Translated, NeedsReview, Translated]);
        assert_eq!(f.aggregate_state(), NeedsReview);

        let f = family([Translated, DoNotTranslate, Translated]);
        assert_eq!(f.aggregate_state(), Translated);
        assert!(f.is_complete());

        let f = family([DoNotTranslate, DoNotTranslate, DoNotTranslate]);
        assert_eq!(f.aggregate_state(), DoNotTranslate);

        let f = family([Translated, Other("final".to_string()), Translated]);
        assert_eq!(f.aggregate_state(), NeedsReview);
    }

    #[test]
    fn test_plural_variable_and_variant_label() {
        assert_eq!(plural_variable("You have %#@files@ left"), Some("files"));
        assert_eq!(plural_variable("No plurals"), None);
        assert_eq!(variant_label("files|==|plural.one"), Some("plural.one"));
        assert_eq!(variant_label("files"), None);
    }
}
