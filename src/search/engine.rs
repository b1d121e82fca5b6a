//! The scan: one brute-force pass over the corpus per query.
//!
//! Every call reads from scratch. Nothing is cached between scans, so a file
//! that failed to read is simply tried again by the next one.

use super::matcher::QueryMatcher;
use super::record::{MatchKind, MatchRecord};
use super::state::{Scope, SearchState};
use crate::config::Config;
use crate::corpus::{CorpusAccessor, CorpusFile, OpenDocument, PathFilter, SourceId};
use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Maximum number of records a scan returns.
pub const DEFAULT_MAX_RESULTS: usize = 100;

/// Group name for sources outside every workspace root.
pub const UNKNOWN_ROOT: &str = "Unknown";

/// Knobs that shape a scan but not its matching rules.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub max_results: usize,
    /// Applied to every workspace listing, including the rootless fallback
    pub exclude: PathFilter,
    /// Read and scan workspace files on the rayon pool
    pub parallel_reads: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            exclude: PathFilter::default(),
            parallel_reads: true,
        }
    }
}

impl ScanOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            max_results: config.search.max_results,
            exclude: PathFilter::excluding(&config.workspace.exclude_patterns)?,
            parallel_reads: config.search.parallel_reads,
        })
    }
}

/// What happened during a scan, for the diagnostics channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub sources_scanned: usize,
    /// Matches found before the result cap was applied
    pub total_matches: usize,
    pub returned: usize,
    pub read_errors: usize,
    /// Scope was `all` with no workspace roots, so the rootless listing was used
    pub used_fallback: bool,
    /// Open documents per owning root, computed when several roots are active
    pub open_documents_per_root: BTreeMap<String, usize>,
    pub elapsed_ms: f64,
}

/// Records plus the statistics of the scan that produced them.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub records: Vec<MatchRecord>,
    pub stats: ScanStats,
}

/// Identity and display fields shared by every record of one source.
struct SourceRef<'a> {
    id: &'a SourceId,
    path: &'a Path,
    file_name: String,
    relative_path: &'a str,
    root_name: Option<&'a str>,
}

impl SourceRef<'_> {
    fn record(&self, kind: MatchKind) -> MatchRecord {
        MatchRecord {
            source_id: self.id.clone(),
            path: self.path.to_path_buf(),
            file_name: self.file_name.clone(),
            relative_path: self.relative_path.to_string(),
            root_name: self.root_name.map(str::to_string),
            kind,
        }
    }
}

/// Per-source result before aggregation.
#[derive(Default)]
struct SourceScan {
    records: Vec<MatchRecord>,
    read_error: bool,
}

/// Run a search and return only the records.
pub fn search<C>(
    query: &str,
    state: SearchState,
    corpus: &C,
    options: &ScanOptions,
) -> Vec<MatchRecord>
where
    C: CorpusAccessor + ?Sized,
{
    scan(query, state, corpus, options).records
}

/// Scan the corpus for `query` under `state`.
///
/// Records follow corpus enumeration order (name match before the content
/// matches of the same source, content matches in line order) and are
/// truncated to `options.max_results` at the end. An empty query yields
/// nothing.
pub fn scan<C>(query: &str, state: SearchState, corpus: &C, options: &ScanOptions) -> ScanOutcome
where
    C: CorpusAccessor + ?Sized,
{
    let started = Instant::now();
    info!(query = %query, scope = %state.scope, mode = %state.mode, "Starting search");

    let mut outcome = ScanOutcome::default();
    if query.is_empty() {
        return outcome;
    }

    let matcher = QueryMatcher::new(query);
    let roots = corpus.workspace_roots();
    let group_by_root = roots.len() > 1;

    let scans: Vec<SourceScan> = match state.scope {
        Scope::Open => {
            let documents: Vec<OpenDocument> = corpus
                .open_documents()
                .into_iter()
                .filter(|doc| !doc.untitled)
                .collect();
            info!(count = documents.len(), "Searching open documents");

            if group_by_root {
                outcome.stats.open_documents_per_root = count_per_root(&documents);
                info!(
                    per_root = ?outcome.stats.open_documents_per_root,
                    "Open documents per workspace root"
                );
            }

            documents
                .iter()
                .map(|doc| scan_document(doc, &matcher, state, group_by_root))
                .collect()
        }
        Scope::All => {
            let files: Vec<CorpusFile> = if roots.is_empty() {
                info!("No workspace roots, falling back to rootless file listing");
                outcome.stats.used_fallback = true;
                corpus.list_files(None, &options.exclude)
            } else {
                roots
                    .iter()
                    .flat_map(|root| corpus.list_files(Some(root), &options.exclude))
                    .collect()
            };
            info!(count = files.len(), "Found files in workspace");

            if options.parallel_reads && state.mode.matches_contents() {
                // Indexed collect keeps enumeration order.
                files
                    .par_iter()
                    .map(|file| scan_file(corpus, file, &matcher, state, group_by_root))
                    .collect()
            } else {
                files
                    .iter()
                    .map(|file| scan_file(corpus, file, &matcher, state, group_by_root))
                    .collect()
            }
        }
    };

    outcome.stats.sources_scanned = scans.len();
    for source in scans {
        if source.read_error {
            outcome.stats.read_errors += 1;
        }
        outcome.records.extend(source.records);
    }

    outcome.stats.total_matches = outcome.records.len();
    outcome.records.truncate(options.max_results);
    outcome.stats.returned = outcome.records.len();
    outcome.stats.elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    info!(
        returned = outcome.stats.returned,
        total = outcome.stats.total_matches,
        limit = options.max_results,
        read_errors = outcome.stats.read_errors,
        elapsed_ms = outcome.stats.elapsed_ms,
        "Search completed"
    );

    outcome
}

fn count_per_root(documents: &[OpenDocument]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for doc in documents {
        let root = doc.root_name.as_deref().unwrap_or(UNKNOWN_ROOT);
        *counts.entry(root.to_string()).or_insert(0) += 1;
    }
    counts
}

fn scan_document(
    doc: &OpenDocument,
    matcher: &QueryMatcher,
    state: SearchState,
    group_by_root: bool,
) -> SourceScan {
    let source = SourceRef {
        id: &doc.id,
        path: &doc.path,
        file_name: doc.file_name(),
        relative_path: &doc.relative_path,
        root_name: doc.root_name.as_deref().filter(|_| group_by_root),
    };

    let mut scan = SourceScan::default();
    match_name(&source, matcher, state, &mut scan.records);
    if state.mode.matches_contents() {
        match_lines(&source, &doc.text, matcher, &mut scan.records);
    }
    scan
}

fn scan_file<C>(
    corpus: &C,
    file: &CorpusFile,
    matcher: &QueryMatcher,
    state: SearchState,
    group_by_root: bool,
) -> SourceScan
where
    C: CorpusAccessor + ?Sized,
{
    let source = SourceRef {
        id: &file.id,
        path: &file.path,
        file_name: file.file_name(),
        relative_path: &file.relative_path,
        root_name: file.root_name.as_deref().filter(|_| group_by_root),
    };

    let mut scan = SourceScan::default();
    match_name(&source, matcher, state, &mut scan.records);
    if state.mode.matches_contents() {
        match corpus.read_text(&file.id) {
            Ok(text) => match_lines(&source, &text, matcher, &mut scan.records),
            Err(e) => {
                scan.read_error = true;
                if e.is_binary() {
                    debug!(path = %file.relative_path, "Skipping binary file contents");
                } else {
                    warn!(path = %file.relative_path, error = %e, "Error reading file");
                }
            }
        }
    }
    scan
}

fn match_name(
    source: &SourceRef<'_>,
    matcher: &QueryMatcher,
    state: SearchState,
    records: &mut Vec<MatchRecord>,
) {
    if state.mode.matches_names() && matcher.is_match(&source.file_name) {
        records.push(source.record(MatchKind::Name));
    }
}

/// Lines are split on a bare `\n`, so a CRLF line keeps its `\r` until the
/// display text is trimmed.
fn match_lines(
    source: &SourceRef<'_>,
    text: &str,
    matcher: &QueryMatcher,
    records: &mut Vec<MatchRecord>,
) {
    for (line_number, line) in text.split('\n').enumerate() {
        if let Some(span) = matcher.find(line) {
            records.push(source.record(MatchKind::Content {
                line_number,
                line_text: line.trim().to_string(),
                span,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::MemoryCorpus;
    use crate::search::record::MatchSpan;
    use crate::search::state::MatchMode;
    use std::io::ErrorKind;

    fn open_state(mode: MatchMode) -> SearchState {
        SearchState::new(Scope::Open, mode)
    }

    fn all_state(mode: MatchMode) -> SearchState {
        SearchState::new(Scope::All, mode)
    }

    fn assert_record_invariant(record: &MatchRecord) {
        let parts = [
            record.line_number().is_some(),
            record.line_text().is_some(),
            record.match_span().is_some(),
        ];
        assert!(parts.iter().all(|p| *p) || parts.iter().all(|p| !*p));
        assert_eq!(record.is_name_match(), !parts[0]);
    }

    #[test]
    fn test_open_documents_both_mode() {
        let corpus = MemoryCorpus::new()
            .with_open_document("/ws/a.ts", "foo\nbar FOO baz")
            .with_open_document("/ws/b.md", "qux");

        let records = search("foo", open_state(MatchMode::Both), &corpus, &ScanOptions::default());

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.file_name == "a.ts"));
        assert_eq!(records[0].line_number(), Some(0));
        assert_eq!(records[0].match_span(), Some(MatchSpan::new(0, 3)));
        assert_eq!(records[1].line_number(), Some(1));
        assert_eq!(records[1].line_text(), Some("bar FOO baz"));
        assert_eq!(records[1].match_span(), Some(MatchSpan::new(4, 7)));
        records.iter().for_each(assert_record_invariant);
    }

    #[test]
    fn test_names_mode_ignores_contents() {
        let corpus = MemoryCorpus::new()
            .with_open_document("/ws/foobar.ts", "hello")
            .with_open_document("/ws/other.ts", "foo foo foo");

        let records = search("foo", open_state(MatchMode::Names), &corpus, &ScanOptions::default());

        assert_eq!(records.len(), 1);
        assert!(records[0].is_name_match());
        assert_eq!(records[0].file_name, "foobar.ts");
    }

    #[test]
    fn test_name_match_precedes_content_matches() {
        let corpus = MemoryCorpus::new().with_open_document("/ws/foo.txt", "a\nfoo\nb\nfoo again");

        let records = search("foo", open_state(MatchMode::Both), &corpus, &ScanOptions::default());

        assert_eq!(records.len(), 3);
        assert!(records[0].is_name_match());
        assert_eq!(records[1].line_number(), Some(1));
        assert_eq!(records[2].line_number(), Some(3));
    }

    #[test]
    fn test_untitled_documents_are_skipped() {
        let corpus = MemoryCorpus::new()
            .with_untitled_document("Untitled-1", "foo")
            .with_open_document("/ws/saved.txt", "foo");

        let records = search(

            "foo",

            open_state(MatchMode::Contents),

            &corpus,

            &ScanOptions::default(),

        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_name, "saved.txt");
    }

    #[test]
    fn test_crlf_line_text_is_trimmed_but_span_uses_raw_line() {
        let corpus = MemoryCorpus::new()
            .with_open_document("/ws/win.txt", "  first foo\r\nsecond\r\n");

        let records = search(

            "foo",

            open_state(MatchMode::Contents),

            &corpus,

            &ScanOptions::default(),

        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line_text(), Some("first foo"));
        assert_eq!(records[0].match_span(), Some(MatchSpan::new(8, 11)));
    }

    #[test]
    fn test_result_cap_applies_across_sources() {
        let text = "match\n".repeat(60);
        let corpus = MemoryCorpus::new()
            .with_open_document("/ws/one.txt", text.clone())
            .with_open_document("/ws/two.txt", text);

        let outcome = scan(

            "match",

            open_state(MatchMode::Contents),

            &corpus,

            &ScanOptions::default(),

        );

        assert_eq!(outcome.records.len(), DEFAULT_MAX_RESULTS);
        assert_eq!(outcome.stats.total_matches, 120);
        assert_eq!(outcome.records[59].file_name, "one.txt");
        assert_eq!(outcome.records[60].file_name, "two.txt");
        assert_eq!(outcome.records[99].line_number(), Some(39));
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let corpus = MemoryCorpus::new().with_open_document("/ws/a.txt", "anything");
        let outcome = scan("", open_state(MatchMode::Both), &corpus, &ScanOptions::default());
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn test_all_scope_walks_roots_in_order() {
        let corpus = MemoryCorpus::new()
            .with_root("zeta", "/ws/zeta")
            .with_root("alpha", "/ws/alpha")
            .with_file("/ws/alpha/foo.txt", "")
            .with_file("/ws/zeta/foo.txt", "");

        let records = search("foo", all_state(MatchMode::Names), &corpus, &ScanOptions::default());

        let roots: Vec<_> = records.iter().map(|r| r.root_name.as_deref()).collect();
        assert_eq!(roots, vec![Some("zeta"), Some("alpha")]);
    }

    #[test]
    fn test_single_root_records_have_no_root_name() {
        let corpus = MemoryCorpus::new()
            .with_root("only", "/ws/only")
            .with_file("/ws/only/foo.txt", "foo");

        let records = search("foo", all_state(MatchMode::Both), &corpus, &ScanOptions::default());

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.root_name.is_none()));
        assert_eq!(records[0].relative_path, "foo.txt");
    }

    #[test]
    fn test_all_scope_falls_back_without_roots() {
        let corpus = MemoryCorpus::new()
            .with_file("/anywhere/notes.txt", "a foo line")
            .with_file("/anywhere/node_modules/pkg/foo.js", "foo");
        let options = ScanOptions {
            exclude: PathFilter::excluding(&["**/node_modules/**".to_string()]).unwrap(),
            ..ScanOptions::default()
        };

        let outcome = scan("foo", all_state(MatchMode::Both), &corpus, &options);

        assert!(outcome.stats.used_fallback);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].file_name, "notes.txt");
    }

    #[test]
    fn test_unreadable_file_does_not_abort_scan() {
        let corpus = MemoryCorpus::new()
            .with_root("a", "/ws/a")
            .with_root("b", "/ws/b")
            .with_file("/ws/a/1.txt", "foo")
            .with_file("/ws/a/2.txt", "foo")
            .with_unreadable_file("/ws/a/foo-locked.txt", ErrorKind::PermissionDenied)
            .with_file("/ws/b/3.txt", "foo")
            .with_file("/ws/b/4.txt", "foo");

        let outcome = scan("foo", all_state(MatchMode::Contents), &corpus, &ScanOptions::default());

        assert_eq!(outcome.stats.read_errors, 1);
        assert_eq!(outcome.stats.sources_scanned, 5);
        let names: Vec<_> = outcome.records.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["1.txt", "2.txt", "3.txt", "4.txt"]);

        // The unreadable file still matches by name.
        let both = search("foo", all_state(MatchMode::Both), &corpus, &ScanOptions::default());
        assert!(both.iter().any(|r| r.file_name == "foo-locked.txt" && r.is_name_match()));
    }

    #[test]
    fn test_parallel_and_sequential_scans_agree() {
        let mut corpus = MemoryCorpus::new().with_root("a", "/ws/a").with_root("b", "/ws/b");
        for i in 0..40 {
            let root = if i % 2 == 0 { "a" } else { "b" };
            corpus = corpus.with_file(
                format!("/ws/{}/file_{:02}.txt", root, i),
                format!("line {}\nneedle {}\nneedle again", i, i),
            );
        }
        let parallel = ScanOptions::default();
        let sequential = ScanOptions {
            parallel_reads: false,
            ..ScanOptions::default()
        };

        let first = search("needle", all_state(MatchMode::Both), &corpus, &parallel);
        let second = search("needle", all_state(MatchMode::Both), &corpus, &sequential);
        let third = search("needle", all_state(MatchMode::Both), &corpus, &parallel);

        assert_eq!(first.len(), 80);
        assert_eq!(first, second);
        assert_eq!(first, third);
        first.iter().for_each(assert_record_invariant);
    }

    #[test]
    fn test_open_documents_counted_per_root() {
        let corpus = MemoryCorpus::new()
            .with_root("web", "/ws/web")
            .with_root("api", "/ws/api")
            .with_open_document("/ws/web/a.ts", "foo")
            .with_open_document("/ws/web/b.ts", "")
            .with_open_document("/tmp/c.ts", "foo");

        let outcome = scan(

            "foo",

            open_state(MatchMode::Contents),

            &corpus,

            &ScanOptions::default(),

        );

        let counts: Vec<_> = outcome
            .stats
            .open_documents_per_root
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect();
        assert_eq!(counts, vec![("Unknown", 1), ("web", 2)]);
        assert_eq!(outcome.records[0].root_name.as_deref(), Some("web"));
        assert_eq!(outcome.records[1].root_name, None);
    }

    #[test]
    fn test_mode_cycle_restores_match_set() {
        let corpus = MemoryCorpus::new().with_open_document("/ws/foo.rs", "let foo = 1;");
        let mut state = open_state(MatchMode::Names);
        let before = search("foo", state, &corpus, &ScanOptions::default());
        state.cycle_mode();
        state.cycle_mode();
        state.cycle_mode();
        let after = search("foo", state, &corpus, &ScanOptions::default());
        assert_eq!(before, after);
    }
}
