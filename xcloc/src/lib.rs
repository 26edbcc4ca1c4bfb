#![forbid(unsafe_code)]
//! Reading, editing and saving Xcode `.xcloc` localization bundles.
//!
//! A bundle wraps one or more XLIFF 1.2 documents. Each `<trans-unit>` is
//! exposed as a normalized [`TranslationUnit`] row; edits go straight to the
//! underlying XML tree so that everything the editor does not understand
//! survives a save untouched.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xcloc::{Bundle, EditCommand, UnitRef, edit};
//!
//! let mut bundle = Bundle::open("de.xcloc")?;
//! let path = bundle.primary_document_path().expect("bundle has a document");
//!
//! let doc = bundle.document_mut(&path)?;
//! let delta = edit::apply(
//!     doc,
//!     &EditCommand::ToggleTranslated { unit: UnitRef::new(0, "greeting") },
//! )?;
//! println!("{} -> {}", delta.old_value, delta.new_value);
//!
//! println!("{}", bundle.progress()?);
//! bundle.save()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Layout
//!
//! - [`tree`]: lossless XML element tree
//! - [`unit`]: row derivation and the write path for targets and states
//! - [`plural`]: grouping of plural variants under their parent
//! - [`query`]: filtering, sorting and progress
//! - [`document`] / [`bundle`]: XLIFF documents and the bundle around them
//! - [`edit`]: edit commands, deltas and undo history

pub mod bundle;
pub mod document;
pub mod edit;
pub mod error;
pub mod file_tree;
pub mod options;
pub mod plural;
pub mod query;
pub mod tree;
pub mod types;
pub mod unit;

// Re-export most used types for easy consumption
pub use crate::{
    bundle::{Bundle, Manifest, SaveReport, find_bundles, find_bundles_with},
    document::{Document, UnitListing},
    edit::{EditCommand, EditDelta, History},
    error::Error,
    file_tree::{FileNode, Visit, scan_directory},
    options::OpenOptions,
    plural::{PluralFamily, UnitGroup},
    query::{Progress, ProjectOutline, SortOrder},
    types::{Field, FileSection, TranslationState, TranslationUnit, UnitRef},
    unit::{TargetSnapshot, UnitSnapshot},
};
