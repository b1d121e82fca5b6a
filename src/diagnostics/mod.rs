//! Session diagnostics for Global Search
//!
//! Counters collected while a search session runs, and the serializable
//! report printed by the shell's `:stats` command. Purely observational:
//! nothing here feeds back into a scan.

use crate::config::Config;
use crate::search::ScanStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Format uptime as human-readable string
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Configuration summary for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    /// Workspace roots as `name=path`
    pub roots: Vec<String>,
    /// Exclusion patterns
    pub exclude_patterns: Vec<String>,
    /// Directory used when no roots are configured
    pub fallback_dir: String,
    pub max_results: usize,
    pub max_file_size_bytes: u64,
    pub parallel_reads: bool,
}

impl From<&Config> for ConfigSummary {
    fn from(config: &Config) -> Self {
        Self {
            roots: config
                .workspace
                .workspace_roots()
                .iter()
                .map(|root| format!("{}={}", root.name, root.path.display()))
                .collect(),
            exclude_patterns: config.workspace.exclude_patterns.clone(),
            fallback_dir: config.workspace.fallback_dir.clone(),
            max_results: config.search.max_results,
            max_file_size_bytes: config.search.max_file_size,
            parallel_reads: config.search.parallel_reads,
        }
    }
}

/// Running counters for one search session.
#[derive(Debug, Clone)]
pub struct SessionDiagnostics {
    started_at: Instant,
    scans_started: u64,
    scans_applied: u64,
    scans_discarded: u64,
    fallback_scans: u64,
    read_errors: u64,
    last_result_count: usize,
    last_total_matches: usize,
    last_elapsed_ms: f64,
    open_documents_per_root: BTreeMap<String, usize>,
}

impl Default for SessionDiagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionDiagnostics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            scans_started: 0,
            scans_applied: 0,
            scans_discarded: 0,
            fallback_scans: 0,
            read_errors: 0,
            last_result_count: 0,
            last_total_matches: 0,
            last_elapsed_ms: 0.0,
            open_documents_per_root: BTreeMap::new(),
        }
    }

    pub fn record_started(&mut self) {
        self.scans_started += 1;
    }

    pub fn record_discarded(&mut self) {
        self.scans_discarded += 1;
    }

    /// Fold in the stats of a scan whose results were applied.
    pub fn record_applied(&mut self, stats: &ScanStats) {
        self.scans_applied += 1;
        self.read_errors += stats.read_errors as u64;
        if stats.used_fallback {
            self.fallback_scans += 1;
        }
        self.last_result_count = stats.returned;
        self.last_total_matches = stats.total_matches;
        self.last_elapsed_ms = stats.elapsed_ms;
        if !stats.open_documents_per_root.is_empty() {
            self.open_documents_per_root = stats.open_documents_per_root.clone();
        }
    }

    /// Results were cleared by an empty query.
    pub fn record_cleared(&mut self) {
        self.last_result_count = 0;
        self.last_total_matches = 0;
    }

    pub fn scans_started(&self) -> u64 {
        self.scans_started
    }

    pub fn scans_applied(&self) -> u64 {
        self.scans_applied
    }

    pub fn scans_discarded(&self) -> u64 {
        self.scans_discarded
    }

    pub fn report(&self) -> DiagnosticsReport {
        let uptime_secs = self.started_at.elapsed().as_secs();
        DiagnosticsReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs,
            uptime_human: format_uptime(uptime_secs),
            scans_started: self.scans_started,
            scans_applied: self.scans_applied,
            scans_discarded: self.scans_discarded,
            fallback_scans: self.fallback_scans,
            read_errors: self.read_errors,
            last_result_count: self.last_result_count,
            last_total_matches: self.last_total_matches,
            last_elapsed_ms: self.last_elapsed_ms,
            open_documents_per_root: self.open_documents_per_root.clone(),
            config: None,
        }
    }
}

/// Snapshot of a session's diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub version: String,
    pub uptime_secs: u64,
    pub uptime_human: String,
    pub scans_started: u64,
    pub scans_applied: u64,
    /// Scans whose results arrived after a newer scan was requested
    pub scans_discarded: u64,
    pub fallback_scans: u64,
    /// File read failures summed over applied scans
    pub read_errors: u64,
    pub last_result_count: usize,
    pub last_total_matches: usize,
    pub last_elapsed_ms: f64,
    pub open_documents_per_root: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ConfigSummary>,
}

impl DiagnosticsReport {
    pub fn with_config(mut self, config: &Config) -> Self {
        self.config = Some(ConfigSummary::from(config));
        self
    }
}
