//! Criterion benchmarks for search performance
//!
//! Run with: cargo bench
//! View HTML report: target/criterion/report/index.html
//!
//! Every scan reads the corpus from scratch, so these numbers are dominated
//! by file reads and line matching rather than by any index.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use global_search::corpus::{FsCorpus, MemoryCorpus, WorkspaceRoot};
use global_search::search::{scan, MatchMode, ScanOptions, Scope, SearchState};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;

/// Default corpus size - small enough for fast iteration, large enough for meaningful results
const DEFAULT_NUM_FILES: usize = 100;
const DEFAULT_LINES_PER_FILE: usize = 50;

/// Cached on-disk corpus for benchmarks that don't need varying sizes
static CACHED_CORPUS: OnceLock<(FsCorpus, TempDir)> = OnceLock::new();

fn get_or_create_corpus() -> &'static (FsCorpus, TempDir) {
    CACHED_CORPUS.get_or_init(|| setup_fs_corpus(DEFAULT_NUM_FILES, DEFAULT_LINES_PER_FILE))
}

/// Generate synthetic source code for benchmarking
fn generate_source_files(num_files: usize, lines_per_file: usize) -> Vec<(PathBuf, String)> {
    let mut files = Vec::with_capacity(num_files);

    for i in 0..num_files {
        let mut content = String::with_capacity(lines_per_file * 60);
        content.push_str(&format!("// File {} - Generated for benchmarking\n", i));
        content.push_str("use std::collections::HashMap;\n\n");

        for j in 0..lines_per_file / 10 {
            content.push_str(&format!(
                "pub fn process_data_{}_{i}(input: &str) -> Result<String, Error> {{\n",
                j
            ));
            content.push_str("    let mut result = String::new();\n");
            content.push_str("    for line in input.lines() {\n");
            content.push_str("        result.push_str(line);\n");
            content.push_str("    }\n");
            content.push_str("    Ok(result)\n");
            content.push_str("}\n\n");
        }

        content.push_str(&format!(
            "pub struct DataProcessor{} {{\n    cache: HashMap<String, String>,\n}}\n",
            i
        ));

        let path = PathBuf::from(format!("src/module_{}/processor_{}.rs", i / 10, i));
        files.push((path, content));
    }

    files
}

fn setup_fs_corpus(num_files: usize, lines_per_file: usize) -> (FsCorpus, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    for (rel_path, content) in generate_source_files(num_files, lines_per_file) {
        let full_path = temp_dir.path().join(rel_path);
        std::fs::create_dir_all(full_path.parent().unwrap()).unwrap();
        std::fs::write(&full_path, content).unwrap();
    }

    let corpus = FsCorpus::new(
        vec![WorkspaceRoot::from_path(temp_dir.path())],
        temp_dir.path(),
    );
    (corpus, temp_dir)
}

fn setup_memory_corpus(num_files: usize, lines_per_file: usize) -> MemoryCorpus {
    generate_source_files(num_files, lines_per_file)
        .into_iter()
        .fold(MemoryCorpus::new().with_root("ws", "/ws"), |corpus, (path, text)| {
            corpus.with_file(PathBuf::from("/ws").join(path), text)
        })
}

/// Full scans over on-disk corpora of increasing size
fn bench_fs_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("fs_scan");
    group.measurement_time(Duration::from_secs(3));
    group.sample_size(30);

    let state = SearchState::new(Scope::All, MatchMode::Both);
    let options = ScanOptions::default();

    for num_files in [50, 100, 200] {
        let (corpus, _temp_dir) = setup_fs_corpus(num_files, DEFAULT_LINES_PER_FILE);
        group.throughput(Throughput::Elements((num_files * DEFAULT_LINES_PER_FILE) as u64));

        group.bench_with_input(
            BenchmarkId::new("common_query", num_files),
            &corpus,
            |b, corpus| b.iter(|| black_box(scan(black_box("result"), state, corpus, &options))),
        );

        group.bench_with_input(
            BenchmarkId::new("no_match", num_files),
            &corpus,
            |b, corpus| {
                b.iter(|| black_box(scan(black_box("xyznonexistent"), state, corpus, &options)))
            },
        );
    }

    group.finish();
}

/// Sequential versus rayon file reads on the cached corpus
fn bench_parallel_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel_reads");
    group.measurement_time(Duration::from_secs(3));
    group.sample_size(30);

    let (corpus, _temp_dir) = get_or_create_corpus();
    let state = SearchState::new(Scope::All, MatchMode::Contents);

    for parallel_reads in [false, true] {
        let options = ScanOptions {
            parallel_reads,
            ..ScanOptions::default()
        };
        let name = if parallel_reads { "parallel" } else { "sequential" };
        group.bench_function(name, |b| {
            b.iter(|| black_box(scan(black_box("DataProcessor"), state, corpus, &options)))
        });
    }

    group.finish();
}

/// Matching cost alone, without disk I/O
fn bench_match_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_modes");
    group.measurement_time(Duration::from_secs(3));
    group.sample_size(50);

    let corpus = setup_memory_corpus(DEFAULT_NUM_FILES, DEFAULT_LINES_PER_FILE);
    let options = ScanOptions {
        parallel_reads: false,
        ..ScanOptions::default()
    };

    for mode in [MatchMode::Names, MatchMode::Contents, MatchMode::Both] {
        let state = SearchState::new(Scope::All, mode);
        group.bench_function(mode.as_str(), |b| {
            b.iter(|| black_box(scan(black_box("processor_4"), state, &corpus, &options)))
        });
    }

    group.bench_function("unicode_line_fallback", |b| {
        let state = SearchState::new(Scope::All, MatchMode::Contents);
        b.iter(|| black_box(scan(black_box("Ü"), state, &corpus, &options)))
    });

    group.finish();
}

criterion_group!(benches, bench_fs_scan, bench_parallel_reads, bench_match_modes);

criterion_main!(benches);
