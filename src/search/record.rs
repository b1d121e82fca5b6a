//! Match records produced by a scan.

use crate::corpus::SourceId;
use serde::Serialize;
use std::path::PathBuf;

/// Half-open character range `[start, end)` within the untrimmed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSpan {
    pub start: usize,
    pub end: usize,
}

impl MatchSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// What a record asserts about its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    /// The file's base name contains the query
    Name,
    /// One line contains the query
    Content {
        /// Zero-based line index
        line_number: usize,
        /// The line with surrounding whitespace trimmed
        line_text: String,
        /// First occurrence of the query in the untrimmed line
        span: MatchSpan,
    },
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    pub source_id: SourceId,
    pub path: PathBuf,
    pub file_name: String,
    pub relative_path: String,
    /// Set only when more than one workspace root is active
    pub root_name: Option<String>,
    #[serde(flatten)]
    pub kind: MatchKind,
}

impl MatchRecord {
    pub fn line_number(&self) -> Option<usize> {
        match &self.kind {
            MatchKind::Content { line_number, .. } => Some(*line_number),
            MatchKind::Name => None,
        }
    }

    pub fn line_text(&self) -> Option<&str> {
        match &self.kind {
            MatchKind::Content { line_text, .. } => Some(line_text),
            MatchKind::Name => None,
        }
    }

    pub fn match_span(&self) -> Option<MatchSpan> {
        match &self.kind {
            MatchKind::Content { span, .. } => Some(*span),
            MatchKind::Name => None,
        }
    }

    pub fn is_name_match(&self) -> bool {
        matches!(self.kind, MatchKind::Name)
    }
}
