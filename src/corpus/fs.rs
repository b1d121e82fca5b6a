//! On-disk corpus: workspace roots, a rootless fallback directory, and a
//! registry of documents the user has opened.

use super::discovery::FileDiscoveryIterator;
use super::encoding::decode_text;
use super::{
    owning_root, CorpusAccessor, CorpusFile, CorpusReadError, OpenDocument, PathFilter, SourceId,
    WorkspaceRoot,
};
use crate::config::Config;
use crate::utils::{display_relative_path, has_binary_extension};
use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Filesystem-backed [`CorpusAccessor`].
pub struct FsCorpus {
    roots: Vec<WorkspaceRoot>,
    fallback_dir: PathBuf,
    max_file_size: u64,
    transcode_non_utf8: bool,
    /// Open documents in the order they were opened
    documents: RwLock<Vec<OpenDocument>>,
}

impl FsCorpus {
    /// Root paths are canonicalized where possible so they line up with
    /// the canonical paths of opened documents.
    pub fn new(roots: Vec<WorkspaceRoot>, fallback_dir: impl Into<PathBuf>) -> Self {
        let roots = roots
            .into_iter()
            .map(|root| match root.path.canonicalize() {
                Ok(path) => WorkspaceRoot { path, ..root },
                Err(_) => root,
            })
            .collect();
        Self {
            roots,
            fallback_dir: fallback_dir.into(),
            max_file_size: 10 * 1024 * 1024,
            transcode_non_utf8: true,
            documents: RwLock::new(Vec::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.workspace.workspace_roots(),
            &config.workspace.fallback_dir,
        )
        .with_max_file_size(config.search.max_file_size)
        .with_transcoding(config.search.transcode_non_utf8)
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_transcoding(mut self, enabled: bool) -> Self {
        self.transcode_non_utf8 = enabled;
        self
    }

    /// Open a document, or refresh it if it is already open.
    ///
    /// A file that cannot be read is not opened.
    pub fn open_document(&self, path: &Path) -> Result<OpenDocument> {
        let path = path
            .canonicalize()
            .with_context(|| format!("Failed to open document: {}", path.display()))?;
        let text = self
            .read_file(&path)
            .with_context(|| format!("Failed to open document: {}", path.display()))?;

        let owner = owning_root(&self.roots, &path);
        let document = OpenDocument {
            id: SourceId::for_path(&path),
            relative_path: display_relative_path(&path, owner.map(|root| root.path.as_path())),
            root_name: owner.map(|root| root.name.clone()),
            path,
            text,
            untitled: false,
        };

        let mut documents = self
            .documents
            .write()
            .map_err(|e| anyhow::anyhow!("Open document registry poisoned: {}", e))?;
        // Paths are canonical here, so equality means the same file even on
        // case-sensitive filesystems.
        match documents.iter_mut().find(|doc| doc.path == document.path) {
            Some(existing) => {
                debug!(path = %document.relative_path, "Refreshed open document");
                *existing = document.clone();
            }
            None => {
                info!(path = %document.relative_path, "Opened document");
                documents.push(document.clone());
            }
        }

        Ok(document)
    }

    /// Re-read every open document from disk. A document whose file has
    /// become unreadable keeps its last buffer text.
    pub fn refresh_documents(&self) {
        let Ok(mut documents) = self.documents.write() else {
            warn!("Open document registry poisoned, skipping refresh");
            return;
        };
        for document in documents.iter_mut() {
            match self.read_file(&document.path) {
                Ok(text) => document.text = text,
                Err(e) => warn!(error = %e, "Keeping stale buffer for open document"),
            }
        }
    }

    fn read_file(&self, path: &Path) -> Result<String, CorpusReadError> {
        if has_binary_extension(path) {
            return Err(CorpusReadError::Binary {
                path: path.to_path_buf(),
            });
        }

        let io_error = |source| CorpusReadError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_error)?;
        let size = file.metadata().map_err(io_error)?.len();
        if size > self.max_file_size {
            return Err(CorpusReadError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit: self.max_file_size,
            });
        }
        if size == 0 {
            return Ok(String::new());
        }

        // SAFETY: the map is read-only and dropped before this function
        // returns; concurrent truncation is outside what a scan can guard.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
        decode_text(&mmap, path, self.transcode_non_utf8)
    }
}

impl CorpusAccessor for FsCorpus {
    fn open_documents(&self) -> Vec<OpenDocument> {
        self.refresh_documents();
        match self.documents.read() {
            Ok(documents) => documents.clone(),
            Err(e) => {
                warn!(error = %e, "Open document registry poisoned");
                Vec::new()
            }
        }
    }

    fn workspace_roots(&self) -> Vec<WorkspaceRoot> {
        self.roots.clone()
    }

    fn list_files(&self, root: Option<&WorkspaceRoot>, exclude: &PathFilter) -> Vec<CorpusFile> {
        let base = root.map_or(self.fallback_dir.as_path(), |root| root.path.as_path());
        FileDiscoveryIterator::new(base, exclude)
            .map(|found| CorpusFile {
                id: SourceId::for_path(&found.path),
                path: found.path,
                relative_path: found.relative,
                root_name: root.map(|root| root.name.clone()),
            })
            .collect()
    }

    fn read_text(&self, id: &SourceId) -> Result<String, CorpusReadError> {
        self.read_file(Path::new(id.as_str()))
    }
}
