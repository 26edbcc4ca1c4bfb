//! A parsed XLIFF document and the read-only views derived from it.
//!
//! The element tree is the only source of truth. Rows, groups, outlines and
//! progress are recomputed from it on every call.

use log::warn;

use crate::{
    error::Error,
    plural::UnitGroup,
    query::{Progress, ProjectOutline},
    tree::{Element, XmlDocument},
    types::{FileSection, TranslationUnit, UnitRef},
    unit::{ID_ATTRIBUTE, UNIT_ELEMENT, derive_row},
};

pub const XLIFF_ROOT: &str = "xliff";
pub const FILE_ELEMENT: &str = "file";

/// Units of a document plus the ones that could not be read.
#[derive(Debug, Default)]
pub struct UnitListing {
    pub units: Vec<TranslationUnit>,
    /// One [`Error::MalformedUnit`] per skipped element.
    pub skipped: Vec<Error>,
}

#[derive(Debug, Clone)]
pub struct Document {
    path: String,
    tree: XmlDocument,
    modified: bool,
}

impl Document {
    /// Parses the XLIFF bytes found at `path` inside the bundle.
    pub fn parse(path: impl Into<String>, bytes: &[u8]) -> Result<Self, Error> {
        let path = path.into();
        let tree = XmlDocument::from_bytes(bytes)?;
        if tree.root.name != XLIFF_ROOT {
            return Err(Error::InvalidDocument(format!(
                "`{}` has root <{}>, expected <{}>",
                path, tree.root.name, XLIFF_ROOT
            )));
        }
        Ok(Self {
            path,
            tree,
            modified: false,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tree(&self) -> &XmlDocument {
        &self.tree
    }

    /// Whether the tree changed since it was parsed or last saved.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub(crate) fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// XLIFF version from the root's `version` attribute.
    pub fn version(&self) -> Option<&str> {
        self.tree.root.attribute("version")
    }

    fn file_elements(&self) -> impl Iterator<Item = &Element> {
        self.tree
            .root
            .child_elements()
            .filter(|el| el.name == FILE_ELEMENT)
    }

    pub fn sections(&self) -> Vec<FileSection> {
        self.file_elements()
            .enumerate()
            .map(|(index, file)| FileSection {
                index,
                original: file.attribute("original").unwrap_or_default().to_string(),
                source_language: file.attribute("source-language").map(str::to_string),
                target_language: file.attribute("target-language").map(str::to_string),
                datatype: file.attribute("datatype").map(str::to_string),
            })
            .collect()
    }

    /// Every readable unit in document order.
    ///
    /// Units missing an id or a source are skipped and reported in
    /// [`UnitListing::skipped`].
    pub fn units(&self) -> UnitListing {
        let mut listing = UnitListing::default();
        for (section, file) in self.file_elements().enumerate() {
            for element in file.descendants_named(UNIT_ELEMENT) {
                match derive_row(element) {
                    Ok(mut unit) => {
                        unit.section = section;
                        listing.units.push(unit);
                    }
                    Err(e) => {
                        warn!("Skipping unit in `{}`: {}", self.path, e);
                        listing.skipped.push(e);
                    }
                }
            }
        }
        listing
    }

    /// The row for the unit at `unit`.
    pub fn unit(&self, unit: &UnitRef) -> Result<TranslationUnit, Error> {
        let element = self.unit_element(unit)?;
        let mut row = derive_row(element)?;
        row.section = unit.section;
        Ok(row)
    }

    /// Locates the first unit with `id`, searching sections in order.
    pub fn find_unit(&self, id: &str) -> Option<UnitRef> {
        self.file_elements()
            .enumerate()
            .find(|(_, file)| {
                file.descendants_named(UNIT_ELEMENT)
                    .iter()
                    .any(|el| el.attribute(ID_ATTRIBUTE) == Some(id))
            })
            .map(|(section, _)| UnitRef::new(section, id))
    }

    /// Units grouped into plural families. Families never span sections.
    pub fn groups(&self) -> Vec<UnitGroup> {
        self.outline()
            .files
            .into_iter()
            .flat_map(|file| file.groups)
            .collect()
    }

    pub fn outline(&self) -> ProjectOutline {
        ProjectOutline::build(&self.sections(), &self.units().units)
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.units().units)
    }

    pub(crate) fn unit_element(&self, unit: &UnitRef) -> Result<&Element, Error> {
        self.file_elements()
            .nth(unit.section)
            .and_then(|file| {
                file.descendants_named(UNIT_ELEMENT)
                    .into_iter()
                    .find(|el| el.attribute(ID_ATTRIBUTE) == Some(unit.id.as_str()))
            })
            .ok_or_else(|| not_found(unit))
    }

    /// Mutable access to a unit element. Marks the document modified.
    pub(crate) fn unit_element_mut(&mut self, unit: &UnitRef) -> Result<&mut Element, Error> {
        let element = self
            .tree
            .root
            .child_elements_mut()
            .filter(|el| el.name == FILE_ELEMENT)
            .nth(unit.section)
            .and_then(|file| file.find_descendant_mut(UNIT_ELEMENT, ID_ATTRIBUTE, &unit.id))
            .ok_or_else(|| not_found(unit))?;
        self.modified = true;
        Ok(element)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        self.tree.to_bytes()
    }
}

fn not_found(unit: &UnitRef) -> Error {
    Error::UnitNotFound {
        section: unit.section,
        id: unit.id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TranslationState;
    use indoc::indoc;

    const SAMPLE: &str = indoc! {r#"
        <?xml version="1.0" encoding="UTF-8"?>
        <xliff xmlns="urn:oasis:names:tc:xliff:document:1.2" version="1.2">
          <file original="App/en.lproj/Localizable.strings" source-language="en" target-language="de" datatype="plaintext">
            <body>
              <trans-unit id="files" xml:space="preserve">
                <source>%#@files@</source>
                <target state="translated">%#@files@</target>
              </trans-unit>
              <trans-unit id="files|==|plural.one" xml:space="preserve">
                <source>%d file</source>
                <target state="translated">%d Datei</target>
              </trans-unit>
              <trans-unit id="files|==|plural.other" xml:space="preserve">
                <source>%d files</source>
                <target state="needs-review-l10n">%d Dateien</target>
              </trans-unit>
              <trans-unit xml:space="preserve">
                <source>no id</source>
              </trans-unit>
            </body>
          </file>
          <file original="App/Base.lproj/Main.storyboard" source-language="en" target-language="de" datatype="plaintext">
            <body>
              <trans-unit id="title">
                <source>Title</source>
                <note>Window title</note>
              </trans-unit>
              <trans-unit id="files">
                <source>Files</source>
                <target state="translated">Dateien</target>
              </trans-unit>
            </body>
          </file>
        </xliff>
    "#};

    fn document() -> Document {
        Document::parse("Localized Contents/de.xliff", SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_rejects_non_xliff_root() {
        let result = Document::parse("x.xliff", b"<plist/>");
        assert!(matches!(result, Err(Error::InvalidDocument(_))));
    }

    #[test]
    fn test_sections() {
        let sections = document().sections();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].original, "App/en.lproj/Localizable.strings");
        assert_eq!(sections[1].index, 1);
        assert_eq!(sections[1].target_language.as_deref(), Some("de"));
        assert_eq!(sections[0].datatype.as_deref(), Some("plaintext"));
    }

    #[test]
    fn test_units_skip_malformed_and_carry_section() {
        let listing = document().units();
        assert_eq!(listing.units.len(), 5);
        assert_eq!(listing.skipped.len(), 1);
        assert!(matches!(listing.skipped[0], Error::MalformedUnit { .. }));
        let title = listing.units.iter().find(|u| u.id == "title").unwrap();
        assert_eq!(title.section, 1);
        assert_eq!(title.state, TranslationState::New);
        assert_eq!(title.note.as_deref(), Some("Window title"));
    }

    #[test]
    fn test_same_id_in_two_sections_is_addressable() {
        let doc = document();
        let first = doc.unit(&UnitRef::new(0, "files")).unwrap();
        let second = doc.unit(&UnitRef::new(1, "files")).unwrap();
        assert_eq!(first.source, "%#@files@");
        assert_eq!(second.source, "Files");
        assert_eq!(doc.find_unit("files"), Some(UnitRef::new(0, "files")));
        assert_eq!(doc.find_unit("title"), Some(UnitRef::new(1, "title")));
        assert_eq!(doc.find_unit("missing"), None);
    }

    #[test]
    fn test_unknown_unit_is_reported() {
        let doc = document();
        assert!(matches!(
            doc.unit(&UnitRef::new(5, "files")),
            Err(Error::UnitNotFound { section: 5, .. })
        ));
    }

    #[test]
    fn test_groups_do_not_span_sections() {
        let groups = document().groups();
        assert_eq!(groups.len(), 3);
        assert!(matches!(groups[0], UnitGroup::Family(ref f) if f.children.len() == 2));
        assert_eq!(groups[0].state(), TranslationState::NeedsReview);
    }

    #[test]
    fn test_progress_counts_all_units() {
        let progress = document().progress();
        assert_eq!(progress.total, 5);
        assert_eq!(progress.translated, 3);
    }

    #[test]
    fn test_unit_element_mut_marks_modified() {
        let mut doc = document();
        assert!(!doc.is_modified());
        assert!(doc.unit_element_mut(&UnitRef::new(0, "nope")).is_err());
        assert!(!doc.is_modified());
        doc.unit_element_mut(&UnitRef::new(1, "title")).unwrap();
        assert!(doc.is_modified());
        doc.mark_saved();
        assert!(!doc.is_modified());
    }

    #[test]
    fn test_serialization_is_byte_identical_without_edits() {
        let doc = document();
        assert_eq!(doc.to_bytes().unwrap(), SAMPLE.as_bytes());
    }
}
