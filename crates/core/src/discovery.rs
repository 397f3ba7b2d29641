//! Project file discovery
//!
//! Walks a directory tree top-down and yields the files that belong to a
//! recognized project layout (see [`LayoutRule`]). For every anchor
//! directory the walker yields the files of each immediate subdirectory,
//! then the files directly inside the anchor. Everything else is walked
//! through but never yielded.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, FilterEntry, WalkDir};

use crate::error::{Error, Result};
use crate::layout::LayoutRule;

type EntryFilter = fn(&DirEntry) -> bool;

/// Lazy iterator over discovered files
///
/// Unreadable directories are yielded as [`Error::Discovery`] items and the
/// walk continues with the rest of the tree.
pub struct Walk {
    root: PathBuf,
    inner: FilterEntry<walkdir::IntoIter, EntryFilter>,
    pending: VecDeque<PathBuf>,
}

/// Start a walk of `root`
///
/// Each call returns an independent iterator. A root that does not exist
/// yields nothing.
pub fn walk(root: impl AsRef<Path>) -> Walk {
    let root = root.as_ref().to_path_buf();
    let inner = WalkDir::new(&root)
        .follow_links(false)
        .into_iter()
        .filter_entry(keep_entry as EntryFilter);

    Walk {
        root,
        inner,
        pending: VecDeque::new(),
    }
}

/// Collect every discovered file under `root`
///
/// Directories that cannot be read are logged and skipped.
pub fn find_files(root: impl AsRef<Path>) -> Vec<PathBuf> {
    walk(root)
        .filter_map(|item| match item {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Skipping during discovery: {e}");
                None
            }
        })
        .collect()
}

impl Walk {
    /// Root directory of this walk
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Iterator for Walk {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(path) = self.pending.pop_front() {
                return Some(Ok(path));
            }

            match self.inner.next()? {
                Ok(entry) => {
                    if !entry.file_type().is_dir() {
                        continue;
                    }
                    if let Some(rule) = LayoutRule::matching(entry.path()) {
                        tracing::debug!(dir = %entry.path().display(), layout = %rule, "Anchor directory");
                        self.pending.extend(list_anchor(entry.path(), rule));
                    }
                }
                Err(err) => {
                    let missing_root = err.depth() == 0
                        && err
                            .io_error()
                            .is_some_and(|e| e.kind() == std::io::ErrorKind::NotFound);
                    if missing_root {
                        continue;
                    }

                    let path = err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    return Some(Err(Error::Discovery {
                        path,
                        source: err.into(),
                    }));
                }
            }
        }
    }
}

/// Prune excluded subdirectories so the walk never enters them
fn keep_entry(entry: &DirEntry) -> bool {
    !(entry.depth() > 0 && entry.file_type().is_dir() && LayoutRule::is_excluded(entry.path()))
}

/// Files of an anchor: one level into each kept subdirectory, then its own files
fn list_anchor(dir: &Path, rule: LayoutRule) -> Vec<PathBuf> {
    // The outer walk reports unreadable directories when it descends into
    // them, so read failures here only drop the listing.
    let Some(entries) = read_entries(dir) else {
        return Vec::new();
    };
    let (subdirs, files): (Vec<PathBuf>, Vec<PathBuf>) =
        entries.into_iter().partition(|p| p.is_dir());

    let mut found = Vec::new();
    for sub in subdirs {
        if sub.file_name().is_some_and(|name| rule.excludes(name)) {
            continue;
        }
        if let Some(children) = read_entries(&sub) {
            found.extend(children.into_iter().filter(|p| !p.is_dir()));
        }
    }
    found.extend(files);
    found
}

fn read_entries(dir: &Path) -> Option<Vec<PathBuf>> {
    std::fs::read_dir(dir)
        .ok()?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .ok()
}
