//! Core types for xcloc.
//! Derivation fills these from the XLIFF tree; queries and edit commands
//! consume them.

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

/// Target `state` attribute values understood by the editor.
pub const STATE_NEW: &str = "new";
pub const STATE_NEEDS_REVIEW: &str = "needs-review-l10n";
/// Legacy spelling of [`STATE_NEEDS_REVIEW`], seen in files touched by other tools.
pub const STATE_NEEDS_TRANSLATION: &str = "needs-translation";
pub const STATE_TRANSLATED: &str = "translated";
/// Display-only label; the marker itself lives in `translate="no"`.
pub const STATE_DO_NOT_TRANSLATE: &str = "mf_dont_translate";

/// Review/translation status of a translation unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationState {
    /// No target yet, or the target is explicitly `new`.
    New,

    /// The target exists but has to be looked at again.
    NeedsReview,

    /// The target is translated and reviewed.
    Translated,

    /// The unit is excluded from translation.
    DoNotTranslate,

    /// A tool-specific target state, kept verbatim.
    Other(String),
}

impl TranslationState {
    /// Position in the fixed display order
    /// `New, NeedsReview, Translated, DoNotTranslate`. Unknown labels go last.
    pub fn rank(&self) -> u8 {
        match self {
            TranslationState::New => 0,
            TranslationState::NeedsReview => 1,
            TranslationState::Translated => 2,
            TranslationState::DoNotTranslate => 3,
            TranslationState::Other(_) => 4,
        }
    }

    /// The string written to (or read from) the target's `state` attribute.
    pub fn as_str(&self) -> &str {
        match self {
            TranslationState::New => STATE_NEW,
            TranslationState::NeedsReview => STATE_NEEDS_REVIEW,
            TranslationState::Translated => STATE_TRANSLATED,
            TranslationState::DoNotTranslate => STATE_DO_NOT_TRANSLATE,
            TranslationState::Other(label) => label,
        }
    }

    /// Reads a target's `state` attribute.
    ///
    /// Only the XLIFF spellings are recognized. Any other label, including
    /// the display label of `DoNotTranslate`, is kept as
    /// [`TranslationState::Other`]; do-not-translate comes from the
    /// `translate` attribute alone.
    pub fn from_attribute(value: &str) -> Self {
        match value {
            STATE_NEW => TranslationState::New,
            STATE_NEEDS_REVIEW | STATE_NEEDS_TRANSLATION => TranslationState::NeedsReview,
            STATE_TRANSLATED => TranslationState::Translated,
            other => TranslationState::Other(other.to_string()),
        }
    }

    /// `Translated` and `DoNotTranslate` need no further work.
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            TranslationState::Translated | TranslationState::DoNotTranslate
        )
    }
}

impl Display for TranslationState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parsing for user input: accepts the attribute spellings, the
/// display labels and the enum-style names used on the command line
/// (`needs_review`, `do-not-translate`, ...). Never fails: anything
/// unrecognized becomes [`TranslationState::Other`]. Use
/// [`TranslationState::from_attribute`] for values read from XLIFF.
impl FromStr for TranslationState {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s {
            STATE_NEW => TranslationState::New,
            STATE_NEEDS_REVIEW | STATE_NEEDS_TRANSLATION => TranslationState::NeedsReview,
            STATE_TRANSLATED => TranslationState::Translated,
            STATE_DO_NOT_TRANSLATE => TranslationState::DoNotTranslate,
            other => match other.replace('-', "_").to_ascii_lowercase().as_str() {
                "needs_review" => TranslationState::NeedsReview,
                "do_not_translate" | "dont_translate" => TranslationState::DoNotTranslate,
                _ => TranslationState::Other(other.to_string()),
            },
        };
        Ok(state)
    }
}

/// The columns of a translation unit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Source,
    Target,
    Note,
    State,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Id,
        Field::Source,
        Field::Target,
        Field::Note,
        Field::State,
    ];

    /// Only the target text and the state are ever written by the editor.
    pub fn is_writable(self) -> bool {
        matches!(self, Field::Target | Field::State)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Source => write!(f, "source"),
            Field::Target => write!(f, "target"),
            Field::Note => write!(f, "note"),
            Field::State => write!(f, "state"),
        }
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Field::Id),
            "source" => Ok(Field::Source),
            "target" => Ok(Field::Target),
            "note" => Ok(Field::Note),
            "state" => Ok(Field::State),
            _ => Err(format!("Unknown field: {}", s)),
        }
    }
}

/// Addresses a translation unit inside a document: the index of its
/// `<file>` section plus its id, which is unique within that section.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct UnitRef {
    pub section: usize,
    pub id: String,
}

impl UnitRef {
    pub fn new(section: usize, id: impl Into<String>) -> Self {
        Self {
            section,
            id: id.into(),
        }
    }
}

impl Display for UnitRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.section, self.id)
    }
}

/// A normalized row derived from one `<trans-unit>` element.
///
/// Rows are recomputed from the tree on every read and never written back.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TranslationUnit {
    /// Index of the `<file>` section the unit belongs to.
    pub section: usize,

    pub id: String,

    pub source: String,

    /// Empty when the unit has no `<target>`.
    pub target: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub note: Option<String>,

    pub state: TranslationState,

    pub is_plural_parent: bool,

    pub is_plural_child: bool,
}

impl TranslationUnit {
    pub fn location(&self) -> UnitRef {
        UnitRef::new(self.section, self.id.clone())
    }

    /// The cell shown for `field`, with an absent note as the empty string.
    pub fn cell(&self, field: Field) -> &str {
        match field {
            Field::Id => &self.id,
            Field::Source => &self.source,
            Field::Target => &self.target,
            Field::Note => self.note.as_deref().unwrap_or_default(),
            Field::State => self.state.as_str(),
        }
    }
}

impl Display for TranslationUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TranslationUnit {{ id: {}, source: {}, target: {}, state: {} }}",
            self.id, self.source, self.target, self.state
        )
    }
}

/// Metadata of one `<file>` element of an XLIFF document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileSection {
    pub index: usize,

    /// The `original` attribute: path of the source file inside the project.
    pub original: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub source_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub target_language: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub datatype: Option<String>,
}

impl FileSection {
    pub fn source_language_id(&self) -> Option<LanguageIdentifier> {
        self.source_language.as_deref()?.parse().ok()
    }

    pub fn target_language_id(&self) -> Option<LanguageIdentifier> {
        self.target_language.as_deref()?.parse().ok()
    }
}
