//! In-memory corpus, for embedding hosts that already hold their buffers
//! and for exercising the engine without touching the disk.

use super::{
    owning_root, CorpusAccessor, CorpusFile, CorpusReadError, OpenDocument, PathFilter, SourceId,
    WorkspaceRoot,
};
use crate::utils::display_relative_path;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum StoredContent {
    Text(String),
    /// Reading this file fails with the given I/O error kind
    Unreadable(std::io::ErrorKind),
}

/// A [`CorpusAccessor`] over documents and files held in memory.
///
/// Files are listed in insertion order. The rootless listing returns every
/// file, with paths shown relative to the owning root when there is one.
#[derive(Debug, Default, Clone)]
pub struct MemoryCorpus {
    roots: Vec<WorkspaceRoot>,
    documents: Vec<OpenDocument>,
    files: Vec<PathBuf>,
    contents: FxHashMap<SourceId, StoredContent>,
}

impl MemoryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.roots.push(WorkspaceRoot::new(name, path));
        self
    }

    /// Add an open document backed by a saved file.
    pub fn with_open_document(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        let owner = owning_root(&self.roots, &path);
        self.documents.push(OpenDocument {
            id: SourceId::for_path(&path),
            relative_path: display_relative_path(&path, owner.map(|root| root.path.as_path())),
            root_name: owner.map(|root| root.name.clone()),
            path,
            text: text.into(),
            untitled: false,
        });
        self
    }

    /// Add an untitled buffer, which has no saved identity.
    pub fn with_untitled_document(
        mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.documents.push(OpenDocument {
            id: SourceId::new(format!("untitled:{}", name)),
            path: PathBuf::from(&name),
            relative_path: name,
            text: text.into(),
            root_name: None,
            untitled: true,
        });
        self
    }

    /// Add a workspace file with the given text.
    pub fn with_file(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let path = path.into();
        self.contents
            .insert(SourceId::for_path(&path), StoredContent::Text(text.into()));
        self.files.push(path);
        self
    }

    /// Add a workspace file whose content cannot be read.
    pub fn with_unreadable_file(
        mut self,
        path: impl Into<PathBuf>,
        kind: std::io::ErrorKind,
    ) -> Self {
        let path = path.into();
        self.contents
            .insert(SourceId::for_path(&path), StoredContent::Unreadable(kind));
        self.files.push(path);
        self
    }

    fn to_corpus_file(&self, path: &Path, root: Option<&WorkspaceRoot>) -> CorpusFile {
        let display_root = root.or_else(|| owning_root(&self.roots, path));
        CorpusFile {
            id: SourceId::for_path(path),
            path: path.to_path_buf(),
            relative_path: display_relative_path(path, display_root.map(|r| r.path.as_path())),
            root_name: root.map(|r| r.name.clone()),
        }
    }
}

impl CorpusAccessor for MemoryCorpus {
    fn open_documents(&self) -> Vec<OpenDocument> {
        self.documents.clone()
    }

    fn workspace_roots(&self) -> Vec<WorkspaceRoot> {
        self.roots.clone()
    }

    fn list_files(&self, root: Option<&WorkspaceRoot>, exclude: &PathFilter) -> Vec<CorpusFile> {
        self.files
            .iter()
            .filter(|path| root.map_or(true, |root| root.contains(path)))
            .map(|path| self.to_corpus_file(path, root))
            .filter(|file| exclude.matches(&file.relative_path))
            .collect()
    }

    fn read_text(&self, id: &SourceId) -> Result<String, CorpusReadError> {
        match self.contents.get(id) {
            Some(StoredContent::Text(text)) => Ok(text.clone()),
            Some(StoredContent::Unreadable(kind)) => Err(CorpusReadError::Io {
                path: PathBuf::from(id.as_str()),
                source: std::io::Error::from(*kind),
            }),
            None => Err(CorpusReadError::NotFound(id.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    #[test]
    fn test_documents_get_owning_root() {
        let corpus = MemoryCorpus::new()
            .with_root("web", "/ws/web")
            .with_open_document("/ws/web/src/app.ts", "let a = 1;")
            .with_open_document("/tmp/notes.md", "notes")
            .with_untitled_document("Untitled-1", "draft");

        let documents = corpus.open_documents();
        assert_eq!(documents.len(), 3);
        assert_eq!(documents[0].root_name.as_deref(), Some("web"));
        assert_eq!(documents[0].relative_path, "src/app.ts");
        assert_eq!(documents[1].root_name, None);
        assert!(documents[2].untitled);
    }

    #[test]
    fn test_list_files_scoped_and_excluded() {
        let corpus = MemoryCorpus::new()
            .with_root("web", "/ws/web")
            .with_root("api", "/ws/api")
            .with_file("/ws/web/index.ts", "")
            .with_file("/ws/web/node_modules/x/index.js", "")
            .with_file("/ws/api/main.go", "");
        let exclude = PathFilter::excluding(&["**/node_modules/**".to_string()]).unwrap();
        let roots = corpus.workspace_roots();

        let web = corpus.list_files(Some(&roots[0]), &exclude);
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].relative_path, "index.ts");
        assert_eq!(web[0].root_name.as_deref(), Some("web"));

        let all = corpus.list_files(None, &exclude);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|f| f.root_name.is_none()));
    }

    #[test]
    fn test_read_text() {
        let corpus = MemoryCorpus::new()
            .with_file("/a.txt", "alpha")
            .with_unreadable_file("/locked.txt", ErrorKind::PermissionDenied);

        assert_eq!(corpus.read_text(&SourceId::new("/a.txt")).unwrap(), "alpha");
        assert!(matches!(
            corpus.read_text(&SourceId::new("/locked.txt")),
            Err(CorpusReadError::Io { .. })
        ));
        assert!(matches!(
            corpus.read_text(&SourceId::new("/missing.txt")),
            Err(CorpusReadError::NotFound(_))
        ));
    }
}
