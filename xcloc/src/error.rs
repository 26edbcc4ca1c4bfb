//! All error types for the xcloc crate.
//!
//! Opening a bundle, parsing its XLIFF documents, and rejected edits all
//! report through [`Error`].

use thiserror::Error;

use crate::types::Field;

#[derive(Error, Debug)]
pub enum Error {
    #[error("not an xcloc bundle: {0}")]
    NotABundle(String),

    #[error("path not found in bundle: `{0}`")]
    PathNotFound(String),

    #[error("field `{0}` cannot be edited")]
    UnsupportedField(Field),

    #[error("malformed translation unit `{id}`: {reason}")]
    MalformedUnit { id: String, reason: String },

    #[error("no translation unit `{id}` in file section {section}")]
    UnitNotFound { section: usize, id: String },

    #[error("invalid XLIFF document: {0}")]
    InvalidDocument(String),

    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a malformed-unit error for the unit with the given id.
    pub fn malformed_unit(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedUnit {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error only concerns a single unit and leaves the rest of
    /// the document usable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedField(_) | Error::MalformedUnit { .. } | Error::UnitNotFound { .. }
        )
    }
}
