//! In-memory mirror of a bundle directory.
//!
//! Paths are relative and `/`-separated (`Localized Contents/de.xliff`).
//! Replacing a file swaps exactly one node in its parent directory and marks
//! it for writing; [`FileNode::write_pending`] later writes only the marked
//! files back to disk.

use std::{
    collections::BTreeMap,
    fs,
    ops::ControlFlow,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegularFile {
    contents: Vec<u8>,
    pending_write: bool,
}

impl RegularFile {
    /// A file as found on disk.
    pub fn new(contents: Vec<u8>) -> Self {
        Self {
            contents,
            pending_write: false,
        }
    }

    /// A file that still has to be written to disk.
    pub fn modified(contents: Vec<u8>) -> Self {
        Self {
            contents,
            pending_write: true,
        }
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn is_pending_write(&self) -> bool {
        self.pending_write
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Directory {
    pub entries: BTreeMap<String, FileNode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNode {
    File(RegularFile),
    Directory(Directory),
}

/// What [`FileNode::find_paths`] does with the file it was just shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Skip,
    Take,
    /// Take this path and end the walk.
    TakeAndStop,
    /// End the walk without taking this path.
    Stop,
}

fn components(path: &str) -> Vec<&str> {
    path.split('/').filter(|c| !c.is_empty()).collect()
}

impl FileNode {
    pub fn empty_directory() -> Self {
        FileNode::Directory(Directory::default())
    }

    /// Reads the directory at `root` and everything below it.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let mut tree = FileNode::empty_directory();

        for entry in WalkDir::new(root).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            let Some((name, parents)) = parts.split_last() else {
                continue;
            };
            let dir = tree.ensure_directory(parents).ok_or_else(|| {
                Error::NotABundle(format!("`{}` is nested inside a file", relative.display()))
            })?;

            let file_type = entry.file_type();
            if file_type.is_dir() {
                dir.entries
                    .entry(name.clone())
                    .or_insert_with(FileNode::empty_directory);
            } else if file_type.is_file() {
                let contents = fs::read(entry.path())?;
                dir.entries
                    .insert(name.clone(), FileNode::File(RegularFile::new(contents)));
            } else {
                debug!("Skipping non-regular file {}", entry.path().display());
            }
        }

        Ok(tree)
    }

    pub fn as_directory(&self) -> Option<&Directory> {
        match self {
            FileNode::Directory(dir) => Some(dir),
            FileNode::File(_) => None,
        }
    }

    pub fn as_directory_mut(&mut self) -> Option<&mut Directory> {
        match self {
            FileNode::Directory(dir) => Some(dir),
            FileNode::File(_) => None,
        }
    }

    fn ensure_directory(&mut self, parts: &[String]) -> Option<&mut Directory> {
        let mut dir = self.as_directory_mut()?;
        for name in parts {
            dir = dir
                .entries
                .entry(name.clone())
                .or_insert_with(FileNode::empty_directory)
                .as_directory_mut()?;
        }
        Some(dir)
    }

    fn directory_at_mut(&mut self, parts: &[&str]) -> Option<&mut Directory> {
        let mut dir = self.as_directory_mut()?;
        for name in parts {
            dir = dir.entries.get_mut(*name)?.as_directory_mut()?;
        }
        Some(dir)
    }

    /// The node at `path`, if any.
    pub fn node_at(&self, path: &str) -> Option<&FileNode> {
        let mut node = self;
        for name in components(path) {
            node = node.as_directory()?.entries.get(name)?;
        }
        Some(node)
    }

    /// Contents of the regular file at `path`.
    pub fn read_file(&self, path: &str) -> Result<&[u8], Error> {
        match self.node_at(path) {
            Some(FileNode::File(file)) => Ok(file.contents()),
            _ => Err(Error::PathNotFound(path.to_string())),
        }
    }

    /// Replaces the file at `path` with a new file holding `contents`.
    ///
    /// The parent directory must exist. Any existing child with the same
    /// name is removed first; siblings are left alone.
    pub fn replace_file(&mut self, path: &str, contents: Vec<u8>) -> Result<(), Error> {
        let parts = components(path);
        let Some((name, parents)) = parts.split_last() else {
            return Err(Error::PathNotFound(path.to_string()));
        };
        let dir = self
            .directory_at_mut(parents)
            .ok_or_else(|| Error::PathNotFound(path.to_string()))?;

        dir.entries.remove(*name);
        dir.entries.insert(
            name.to_string(),
            FileNode::File(RegularFile::modified(contents)),
        );
        debug!("Replaced `{}` in memory", path);
        Ok(())
    }

    /// Pre-order walk over regular files only.
    pub fn walk_files<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &RegularFile) -> ControlFlow<()>,
    {
        let mut path = Vec::new();
        let _ = walk(self, &mut path, &mut visit);
    }

    /// Paths of the files selected by `predicate`, in walk order.
    pub fn find_paths<F>(&self, mut predicate: F) -> Vec<String>
    where
        F: FnMut(&str, &RegularFile) -> Visit,
    {
        let mut found = Vec::new();
        self.walk_files(|path, file| match predicate(path, file) {
            Visit::Skip => ControlFlow::Continue(()),
            Visit::Take => {
                found.push(path.to_string());
                ControlFlow::Continue(())
            }
            Visit::TakeAndStop => {
                found.push(path.to_string());
                ControlFlow::Break(())
            }
            Visit::Stop => ControlFlow::Break(()),
        });
        found
    }

    pub fn has_pending_writes(&self) -> bool {
        let mut pending = false;
        self.walk_files(|_, file| {
            if file.is_pending_write() {
                pending = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        pending
    }

    /// Writes every replaced file below `root` and clears its mark.
    /// Returns the relative paths written.
    pub fn write_pending(&mut self, root: &Path) -> Result<Vec<String>, Error> {
        let mut written = Vec::new();
        flush(self, &mut Vec::new(), root, &mut written)?;
        Ok(written)
    }
}

fn walk<'a, F>(node: &'a FileNode, path: &mut Vec<&'a str>, visit: &mut F) -> ControlFlow<()>
where
    F: FnMut(&str, &RegularFile) -> ControlFlow<()>,
{
    match node {
        FileNode::File(file) => visit(&path.join("/"), file),
        FileNode::Directory(dir) => {
            for (name, child) in &dir.entries {
                path.push(name);
                walk(child, path, visit)?;
                path.pop();
            }
            ControlFlow::Continue(())
        }
    }
}

fn flush(
    node: &mut FileNode,
    path: &mut Vec<String>,
    root: &Path,
    written: &mut Vec<String>,
) -> Result<(), Error> {
    match node {
        FileNode::File(file) if file.pending_write => {
            let relative = path.join("/");
            write_atomically(&root.join(&relative), &file.contents)?;
            file.pending_write = false;
            debug!("Wrote `{}`", relative);
            written.push(relative);
        }
        FileNode::File(_) => {}
        FileNode::Directory(dir) => {
            for (name, child) in dir.entries.iter_mut() {
                path.push(name.clone());
                flush(child, path, root, written)?;
                path.pop();
            }
        }
    }
    Ok(())
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{}.tmp", file_name));
    let result = fs::write(&staging, contents).and_then(|()| fs::rename(&staging, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }
    Ok(())
}

/// Walks `dir` on disk and returns the absolute paths whose relative path
/// satisfies `predicate`.
///
/// Meant for directories outside the bundle, which may be arbitrarily
/// large: once `timeout` has elapsed the walk stops and whatever was found
/// so far is returned.
pub fn scan_directory<F>(dir: &Path, timeout: Option<Duration>, mut predicate: F) -> Vec<PathBuf>
where
    F: FnMut(&Path) -> bool,
{
    let started = Instant::now();
    let mut found = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1) {
        if let Some(limit) = timeout {
            if started.elapsed() > limit {
                warn!(
                    "Scan of {} timed out after {} ms; returning {} partial result(s)",
                    dir.display(),
                    limit.as_millis(),
                    found.len()
                );
                break;
            }
        }
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            if predicate(relative) {
                found.push(entry.path().to_path_buf());
            }
        }
    }

    found
}
