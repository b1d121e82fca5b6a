//! Scope and match-mode state for a search session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which part of the corpus a scan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Documents currently open in the host
    #[default]
    Open,
    /// Every file under the workspace roots
    All,
}

impl Scope {
    pub fn toggled(self) -> Self {
        match self {
            Scope::Open => Scope::All,
            Scope::All => Scope::Open,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Open => "open",
            Scope::All => "all",
        }
    }

    /// Human wording used in the placeholder text.
    pub fn describe(&self) -> &'static str {
        match self {
            Scope::Open => "open editors",
            Scope::All => "all files",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Scope::Open),
            "all" => Ok(Scope::All),
            other => Err(format!("unknown scope '{}' (expected open or all)", other)),
        }
    }
}

/// Which attributes of a source are matched against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Names,
    Contents,
    #[default]
    Both,
}

impl MatchMode {
    /// The next mode in the `names -> contents -> both -> names` cycle.
    pub fn next(self) -> Self {
        match self {
            MatchMode::Names => MatchMode::Contents,
            MatchMode::Contents => MatchMode::Both,
            MatchMode::Both => MatchMode::Names,
        }
    }

    pub fn matches_names(&self) -> bool {
        matches!(self, MatchMode::Names | MatchMode::Both)
    }

    pub fn matches_contents(&self) -> bool {
        matches!(self, MatchMode::Contents | MatchMode::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::Names => "names",
            MatchMode::Contents => "contents",
            MatchMode::Both => "both",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            MatchMode::Names => "file names",
            MatchMode::Contents => "file contents",
            MatchMode::Both => "file names and contents",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "names" => Ok(MatchMode::Names),
            "contents" => Ok(MatchMode::Contents),
            "both" => Ok(MatchMode::Both),
            other => Err(format!(
                "unknown mode '{}' (expected names, contents or both)",
                other
            )),
        }
    }
}

/// Scope and mode together. Owned by the session, copied into every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SearchState {
    pub scope: Scope,
    pub mode: MatchMode,
}

impl SearchState {
    pub fn new(scope: Scope, mode: MatchMode) -> Self {
        Self { scope, mode }
    }

    pub fn toggle_scope(&mut self) -> Scope {
        self.scope = self.scope.toggled();
        self.scope
    }

    pub fn cycle_mode(&mut self) -> MatchMode {
        self.mode = self.mode.next();
        self.mode
    }

    /// Prompt text describing the current scope and mode.
    pub fn placeholder(&self) -> String {
        format!(
            "Search {} in {} in every window",
            self.mode.describe(),
            self.scope.describe()
        )
    }
}
