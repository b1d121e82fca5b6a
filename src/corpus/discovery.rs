//! File discovery for walking workspace directory trees.
//!
//! Walks one directory at a time in file-name order so that listings, and
//! therefore scan results, are identical across runs over an unchanged tree.

use super::path_filter::PathFilter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A discovered file and its path relative to the walked directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// Relative to the walked directory, always with forward slashes
    pub relative: String,
}

/// Iterator over files under a directory that survive the exclude filter.
pub struct FileDiscoveryIterator<'a> {
    base: PathBuf,
    walker: Option<walkdir::IntoIter>,
    exclude: &'a PathFilter,
}

impl<'a> FileDiscoveryIterator<'a> {
    /// Create a new discovery iterator rooted at `base`.
    ///
    /// A missing directory is logged and yields nothing.
    pub fn new(base: &Path, exclude: &'a PathFilter) -> Self {
        let walker = if base.exists() {
            Some(
                WalkDir::new(base)
                    .follow_links(true)
                    .sort_by_file_name()
                    .into_iter(),
            )
        } else {
            tracing::warn!(path = %base.display(), "Path does not exist, skipping");
            None
        };

        Self {
            base: base.to_path_buf(),
            walker,
            exclude,
        }
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.base)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl Iterator for FileDiscoveryIterator<'_> {
    type Item = DiscoveredFile;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.as_mut()?.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "Error walking directory");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = self.relative(entry.path());
            if !self.exclude.matches(&relative) {
                continue;
            }

            return Some(DiscoveredFile {
                path: entry.into_path(),
                relative,
            });
        }
    }
}
