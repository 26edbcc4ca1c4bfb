//! Opening, querying and saving `.xcloc` bundles.
//!
//! A bundle is a directory:
//!
//! ```text
//! de.xcloc/
//!   contents.json
//!   Localized Contents/de.xliff
//!   Source Contents/...
//!   Notes/...
//! ```
//!
//! Only `Localized Contents` is interpreted. Everything else is carried
//! through untouched.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use unic_langid::LanguageIdentifier;

use crate::{
    document::Document,
    error::Error,
    file_tree::{FileNode, RegularFile, Visit, scan_directory},
    options::OpenOptions,
    query::Progress,
};

pub const BUNDLE_EXTENSION: &str = "xcloc";
pub const LOCALIZED_CONTENTS: &str = "Localized Contents";
pub const SOURCE_CONTENTS: &str = "Source Contents";
pub const NOTES: &str = "Notes";
pub const MANIFEST_FILE: &str = "contents.json";
pub const XLIFF_EXTENSION: &str = "xliff";
/// Screenshot metadata written by Xcode's localization export.
pub const SCREENSHOT_DATA_FILE: &str = "localizedStringData.plist";

/// `contents.json` at the bundle root.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development_region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_locale: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_info: Option<ToolInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Manifest {
    pub fn target_language_id(&self) -> Option<LanguageIdentifier> {
        self.target_locale.as_deref()?.parse().ok()
    }

    pub fn development_language_id(&self) -> Option<LanguageIdentifier> {
        self.development_region.as_deref()?.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ToolInfo {
    #[serde(rename = "toolBuildNumber", default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<String>,

    #[serde(rename = "toolID", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "toolName", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "toolVersion", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Files written by [`Bundle::save`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SaveReport {
    pub written: Vec<String>,
}

impl SaveReport {
    pub fn is_empty(&self) -> bool {
        self.written.is_empty()
    }
}

fn is_localized_document(path: &str) -> bool {
    path.strip_prefix(LOCALIZED_CONTENTS)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|name| {
            !name.contains('/')
                && Path::new(name)
                    .extension()
                    .is_some_and(|ext| ext == XLIFF_EXTENSION)
        })
}

#[derive(Debug)]
pub struct Bundle {
    root: PathBuf,
    files: FileNode,
    manifest: Option<Manifest>,
    /// Parsed documents by bundle-relative path.
    documents: BTreeMap<String, Document>,
    options: OpenOptions,
}

impl Bundle {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::open_with(path, OpenOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self, Error> {
        let root = path.as_ref();
        if !root.is_dir() {
            return Err(Error::NotABundle(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let files = FileNode::load(root)?;
        let has_document = !files
            .find_paths(|path, _| {
                if is_localized_document(path) {
                    Visit::TakeAndStop
                } else {
                    Visit::Skip
                }
            })
            .is_empty();
        if !has_document {
            return Err(Error::NotABundle(format!(
                "{} has no .{} file in `{}`",
                root.display(),
                XLIFF_EXTENSION,
                LOCALIZED_CONTENTS
            )));
        }

        let manifest = match files.read_file(MANIFEST_FILE) {
            Ok(bytes) => Some(serde_json::from_slice::<Manifest>(bytes)?),
            Err(_) if options.require_manifest => {
                return Err(Error::NotABundle(format!(
                    "{} has no {}",
                    root.display(),
                    MANIFEST_FILE
                )));
            }
            Err(_) => {
                debug!("{} has no {}", root.display(), MANIFEST_FILE);
                None
            }
        };

        let mut bundle = Bundle {
            root: root.to_path_buf(),
            files,
            manifest,
            documents: BTreeMap::new(),
            options,
        };
        if !bundle.options.lazy_documents {
            for path in bundle.document_paths() {
                bundle.document_mut(&path)?;
            }
        }

        info!(
            "Opened {} ({} localized document(s))",
            bundle.root.display(),
            bundle.document_paths().len()
        );
        Ok(bundle)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &OpenOptions {
        &self.options
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn files(&self) -> &FileNode {
        &self.files
    }

    pub fn read_file(&self, path: &str) -> Result<&[u8], Error> {
        self.files.read_file(path)
    }

    /// Replaces one file in memory; it is written on the next
    /// [`save`](Self::save). A parsed document at `path` is dropped so the
    /// next access parses the new bytes.
    pub fn replace_file(&mut self, path: &str, contents: Vec<u8>) -> Result<(), Error> {
        self.files.replace_file(path, contents)?;
        if self.documents.remove(path).is_some() {
            debug!("Dropped cached document `{}`", path);
        }
        Ok(())
    }

    pub fn find_paths<F>(&self, predicate: F) -> Vec<String>
    where
        F: FnMut(&str, &RegularFile) -> Visit,
    {
        self.files.find_paths(predicate)
    }

    /// Scans a directory outside the bundle within the open options'
    /// `scan_timeout`. See [`scan_directory`].
    pub fn scan_external<F>(&self, dir: &Path, predicate: F) -> Vec<PathBuf>
    where
        F: FnMut(&Path) -> bool,
    {
        scan_directory(dir, self.options.scan_timeout, predicate)
    }

    /// Paths of the XLIFF files directly inside `Localized Contents`.
    pub fn document_paths(&self) -> Vec<String> {
        self.files.find_paths(|path, _| {
            if is_localized_document(path) {
                Visit::Take
            } else {
                Visit::Skip
            }
        })
    }

    /// The document for the manifest's target locale, or the first one.
    pub fn primary_document_path(&self) -> Option<String> {
        let paths = self.document_paths();
        let preferred = self
            .manifest
            .as_ref()
            .and_then(|m| m.target_locale.as_deref())
            .map(|locale| format!("{}/{}.{}", LOCALIZED_CONTENTS, locale, XLIFF_EXTENSION));
        match preferred {
            Some(path) if paths.contains(&path) => Some(path),
            _ => paths.into_iter().next(),
        }
    }

    /// The document at `path`, parsed on first access.
    pub fn document(&mut self, path: &str) -> Result<&Document, Error> {
        self.document_mut(path).map(|doc| &*doc)
    }

    pub fn document_mut(&mut self, path: &str) -> Result<&mut Document, Error> {
        if !self.documents.contains_key(path) {
            let document = Document::parse(path, self.files.read_file(path)?)?;
            debug!("Parsed `{}`", path);
            self.documents.insert(path.to_string(), document);
        }
        self.documents
            .get_mut(path)
            .ok_or_else(|| Error::PathNotFound(path.to_string()))
    }

    /// Path and contents of the first screenshot metadata file, if any.
    pub fn screenshot_data(&self) -> Option<(String, &[u8])> {
        let path = self
            .files
            .find_paths(|path, _| {
                if path.rsplit('/').next() == Some(SCREENSHOT_DATA_FILE) {
                    Visit::TakeAndStop
                } else {
                    Visit::Skip
                }
            })
            .into_iter()
            .next()?;
        let contents = self.files.read_file(&path).ok()?;
        Some((path, contents))
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.files.has_pending_writes() || self.documents.values().any(Document::is_modified)
    }

    /// Progress over every localized document.
    pub fn progress(&mut self) -> Result<Progress, Error> {
        let mut progress = Progress::default();
        for path in self.document_paths() {
            progress = progress + self.document(&path)?.progress();
        }
        Ok(progress)
    }

    /// Serializes modified documents and writes every replaced file.
    ///
    /// Files that were never replaced are not rewritten, so saving twice in
    /// a row writes nothing the second time.
    pub fn save(&mut self) -> Result<SaveReport, Error> {
        for (path, document) in self.documents.iter_mut() {
            if !document.is_modified() {
                continue;
            }
            let bytes = document.to_bytes()?;
            self.files.replace_file(path, bytes)?;
            document.mark_saved();
        }

        let written = self.files.write_pending(&self.root)?;
        if written.is_empty() {
            debug!("Nothing to save in {}", self.root.display());
        } else {
            info!(
                "Saved {} file(s) in {}",
                written.len(),
                self.root.display()
            );
        }
        Ok(SaveReport { written })
    }
}

/// Finds `.xcloc` bundles below `dir`. Gives up after `timeout` and
/// returns what was found by then.
pub fn find_bundles(dir: &Path, timeout: Option<Duration>) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();
    for path in scan_directory(dir, timeout, |relative| {
        relative
            .extension()
            .is_some_and(|ext| ext == BUNDLE_EXTENSION)
    }) {
        // Skip anything nested inside a bundle already found.
        if path.is_dir() && !found.iter().any(|bundle| path.starts_with(bundle)) {
            found.push(path);
        }
    }
    found
}

/// [`find_bundles`] with the time budget taken from `options.scan_timeout`.
pub fn find_bundles_with(dir: &Path, options: &OpenOptions) -> Vec<PathBuf> {
    find_bundles(dir, options.scan_timeout)
}
