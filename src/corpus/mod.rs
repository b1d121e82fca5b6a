//! Corpus access: where searchable text comes from.
//!
//! The search engine never touches the filesystem directly. It asks a
//! [`CorpusAccessor`] for open documents, for workspace file listings and
//! for file text, so the same scan runs over a real workspace ([`FsCorpus`])
//! or an in-memory snapshot ([`MemoryCorpus`]).

pub mod discovery;
pub mod encoding;
pub mod fs;
pub mod memory;
pub mod path_filter;

pub use fs::FsCorpus;
pub use memory::MemoryCorpus;
pub use path_filter::PathFilter;

use crate::utils::{base_name, format_bytes};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque identity of a document or file, owned by the accessor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity of an on-disk file.
    pub fn for_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A top-level directory treated as a project boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRoot {
    pub name: String,
    pub path: PathBuf,
}

impl WorkspaceRoot {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// A root named after the final component of its path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            name: base_name(&path),
            path,
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.path)
    }
}

/// Find the root owning `path`. Nested roots resolve to the deepest one.
pub fn owning_root<'a>(roots: &'a [WorkspaceRoot], path: &Path) -> Option<&'a WorkspaceRoot> {
    roots
        .iter()
        .filter(|root| root.contains(path))
        .max_by_key(|root| root.path.components().count())
}

/// A text buffer currently open in the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDocument {
    pub id: SourceId,
    pub path: PathBuf,
    /// Path relative to the owning root (full path when there is none)
    pub relative_path: String,
    pub text: String,
    pub root_name: Option<String>,
    /// Untitled buffers have no saved identity and are never searched
    pub untitled: bool,
}

impl OpenDocument {
    pub fn file_name(&self) -> String {
        base_name(&self.path)
    }
}

/// A file listed from a workspace root (or from the rootless fallback).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusFile {
    pub id: SourceId,
    pub path: PathBuf,
    pub relative_path: String,
    pub root_name: Option<String>,
}

impl CorpusFile {
    pub fn file_name(&self) -> String {
        base_name(&self.path)
    }
}

/// A single file's content could not be read.
#[derive(Debug, thiserror::Error)]
pub enum CorpusReadError {
    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} looks like a binary file", .path.display())]
    Binary { path: PathBuf },

    #[error("{} is not valid UTF-8", .path.display())]
    NotUtf8 { path: PathBuf },

    #[error(
        "{} is {}, over the {} content limit",
        .path.display(),
        human_size(.size),
        human_size(.limit)
    )]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("unknown source: {0}")]
    NotFound(SourceId),
}

fn human_size(bytes: &u64) -> String {
    format_bytes(*bytes)
}

impl CorpusReadError {
    /// Binary files are expected in any workspace and only worth a debug line.
    pub fn is_binary(&self) -> bool {
        matches!(self, CorpusReadError::Binary { .. })
    }
}

/// Supplies documents, file listings and file text to the search engine.
///
/// Implementations must be shareable across threads: scans run off the
/// caller's task and may read files on the rayon pool.
pub trait CorpusAccessor: Send + Sync {
    /// Open text buffers, in the order the host reports them.
    fn open_documents(&self) -> Vec<OpenDocument>;

    /// Workspace roots, in the order the host reports them.
    fn workspace_roots(&self) -> Vec<WorkspaceRoot>;

    /// Files under `root` (or the whole rootless corpus when `None`) that the
    /// exclusion filter does not reject, in a stable order.
    fn list_files(&self, root: Option<&WorkspaceRoot>, exclude: &PathFilter) -> Vec<CorpusFile>;

    /// Full text of a listed file.
    fn read_text(&self, id: &SourceId) -> Result<String, CorpusReadError>;
}

impl<T: CorpusAccessor + ?Sized> CorpusAccessor for std::sync::Arc<T> {
    fn open_documents(&self) -> Vec<OpenDocument> {
        (**self).open_documents()
    }

    fn workspace_roots(&self) -> Vec<WorkspaceRoot> {
        (**self).workspace_roots()
    }

    fn list_files(&self, root: Option<&WorkspaceRoot>, exclude: &PathFilter) -> Vec<CorpusFile> {
        (**self).list_files(root, exclude)
    }

    fn read_text(&self, id: &SourceId) -> Result<String, CorpusReadError> {
        (**self).read_text(id)
    }
}
