pub mod activation;
pub mod engine;
pub mod grouping;
pub mod matcher;
pub mod record;
pub mod session;
pub mod state;

pub use activation::{activate, Activation, CursorPosition, InvalidSelection};
pub use engine::{
    scan, search, ScanOptions, ScanOutcome, ScanStats, DEFAULT_MAX_RESULTS, UNKNOWN_ROOT,
};
pub use grouping::{group_results, DisplayItem, ResultItem};
pub use matcher::QueryMatcher;
pub use record::{MatchKind, MatchRecord, MatchSpan};
pub use session::{ScanCompleted, SearchSession};
pub use state::{MatchMode, Scope, SearchState};
