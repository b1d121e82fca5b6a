//! Interactive search session: the host-facing side of the engine.
//!
//! Every query change or toggle issues a new scan tagged with a sequence
//! number. Scans run on the blocking pool and report back over a channel;
//! the host feeds each completion to [`SearchSession::apply`], which keeps
//! only the one matching the latest sequence number. Superseded scans are
//! never interrupted, their results are just dropped on arrival.

use super::activation::{self, Activation, InvalidSelection};
use super::engine::{scan, ScanOptions, ScanOutcome};
use super::grouping::{group_results, DisplayItem};
use super::state::{MatchMode, Scope, SearchState};
use crate::corpus::CorpusAccessor;
use crate::diagnostics::SessionDiagnostics;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// A finished scan, as delivered to the host.
#[derive(Debug)]
pub struct ScanCompleted {
    pub seq: u64,
    pub query: String,
    pub state: SearchState,
    pub outcome: anyhow::Result<ScanOutcome>,
}

pub struct SearchSession<C: CorpusAccessor + 'static> {
    runtime: tokio::runtime::Handle,
    corpus: Arc<C>,
    options: Arc<ScanOptions>,
    state: SearchState,
    query: String,
    latest_seq: u64,
    busy: bool,
    items: Vec<DisplayItem>,
    diagnostics: SessionDiagnostics,
    tx: mpsc::UnboundedSender<ScanCompleted>,
}

impl<C: CorpusAccessor + 'static> SearchSession<C> {
    /// Create a session and the receiver its scan completions arrive on.
    pub fn new(
        runtime: tokio::runtime::Handle,
        corpus: Arc<C>,
        options: ScanOptions,
        state: SearchState,
    ) -> (Self, mpsc::UnboundedReceiver<ScanCompleted>) {
        let (tx, rx) = mpsc::unbounded_channel();
        info!(
            scope = %state.scope,
            mode = %state.mode,
            max_results = options.max_results,
            "Search session started"
        );
        let session = Self {
            runtime,
            corpus,
            options: Arc::new(options),
            state,
            query: String::new(),
            latest_seq: 0,
            busy: false,
            items: Vec::new(),
            diagnostics: SessionDiagnostics::new(),
            tx,
        };
        (session, rx)
    }

    /// Replace the query and rescan. Returns the sequence number of the scan
    /// that was started, or `None` when the query is blank.
    pub fn set_query(&mut self, query: impl Into<String>) -> Option<u64> {
        self.query = query.into();
        debug!(query = %self.query, "Query changed");
        self.requery()
    }

    pub fn toggle_scope(&mut self) -> Scope {
        let scope = self.state.toggle_scope();
        info!(scope = %scope, placeholder = %self.placeholder(), "Scope toggled");
        self.requery();
        scope
    }

    pub fn cycle_mode(&mut self) -> MatchMode {
        let mode = self.state.cycle_mode();
        info!(mode = %mode, placeholder = %self.placeholder(), "Mode changed");
        self.requery();
        mode
    }

    /// Rerun the current query, e.g. after the open documents changed.
    pub fn refresh(&mut self) -> Option<u64> {
        self.requery()
    }

    fn requery(&mut self) -> Option<u64> {
        self.latest_seq += 1;

        if self.query.trim().is_empty() {
            self.items.clear();
            self.busy = false;
            self.diagnostics.record_cleared();
            debug!(seq = self.latest_seq, "Empty query, results cleared");
            return None;
        }

        Some(self.spawn_scan())
    }

    fn spawn_scan(&mut self) -> u64 {
        let seq = self.latest_seq;
        let query = self.query.clone();
        let state = self.state;
        let corpus = Arc::clone(&self.corpus);
        let options = Arc::clone(&self.options);
        let tx = self.tx.clone();

        self.busy = true;
        self.diagnostics.record_started();
        debug!(seq, query = %query, "Spawning scan");

        self.runtime.spawn(async move {
            let scan_query = query.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                scan(&scan_query, state, &*corpus, &options)
            })
            .await
            .map_err(|e| anyhow::anyhow!("Search task failed: {}", e));

            // The session may be gone already; nobody is left to care.
            let _ = tx.send(ScanCompleted {
                seq,
                query,
                state,
                outcome,
            });
        });

        seq
    }

    /// Apply a finished scan if it is the latest one requested.
    ///
    /// Returns `false` when the scan was superseded and its results dropped.
    pub fn apply(&mut self, completed: ScanCompleted) -> bool {
        if completed.seq != self.latest_seq {
            debug!(
                seq = completed.seq,
                latest = self.latest_seq,
                query = %completed.query,
                "Discarding superseded scan"
            );
            self.diagnostics.record_discarded();
            return false;
        }

        self.busy = false;
        match completed.outcome {
            Ok(outcome) => {
                self.diagnostics.record_applied(&outcome.stats);
                self.items = group_results(outcome.records);
                info!(
                    seq = completed.seq,
                    query = %completed.query,
                    items = self.items.len(),
                    "Results applied"
                );
            }
            Err(e) => {
                error!(seq = completed.seq, error = %e, "Scan failed");
                self.items.clear();
            }
        }
        true
    }

    /// Drain completions until the latest scan has been applied.
    pub async fn wait_idle(&mut self, rx: &mut mpsc::UnboundedReceiver<ScanCompleted>) {
        while self.busy {
            match rx.recv().await {
                Some(completed) => {
                    self.apply(completed);
                }
                None => break,
            }
        }
    }

    pub fn activate(&self, index: usize) -> Result<Activation, InvalidSelection> {
        let result = activation::activate(&self.items, index);
        match &result {
            Ok(activation) => info!(
                index,
                path = %activation.path.display(),
                line = ?activation.cursor.map(|c| c.line),
                "Result activated"
            ),
            Err(e) => debug!(error = %e, "Ignoring selection"),
        }
        result
    }

    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn placeholder(&self) -> String {
        self.state.placeholder()
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn corpus(&self) -> &Arc<C> {
        &self.corpus
    }

    pub fn diagnostics(&self) -> &SessionDiagnostics {
        &self.diagnostics
    }
}
