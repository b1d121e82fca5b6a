//! Configuration management for global_search
//!
//! Supports loading configuration from TOML files with CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::corpus::WorkspaceRoot;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub workspace: WorkspaceConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A configured workspace root, either a bare path or a named table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RootEntry {
    Path(String),
    Named { name: String, path: String },
}

impl RootEntry {
    /// Resolve the entry into a workspace root. Bare paths are named after
    /// their final path component.
    pub fn to_workspace_root(&self) -> WorkspaceRoot {
        match self {
            RootEntry::Path(path) => WorkspaceRoot::from_path(path),
            RootEntry::Named { name, path } => WorkspaceRoot::new(name.clone(), path),
        }
    }
}

/// Workspace-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace roots, searched in this order when scope is `all`
    #[serde(default)]
    pub roots: Vec<RootEntry>,

    /// Glob patterns excluded from workspace file listings
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Directory enumerated when scope is `all` and no roots are configured
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: String,
}

/// Search-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of records returned by a single scan
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Files larger than this (in bytes) are not content-scanned (default 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Decode non-UTF-8 text files (Latin-1, Shift-JIS, ...) instead of
    /// treating them as unreadable.
    #[serde(default = "default_true")]
    pub transcode_non_utf8: bool,

    /// Read and scan workspace files on the rayon pool. Result order is the
    /// same either way.
    #[serde(default = "default_true")]
    pub parallel_reads: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append log lines to this file instead of stderr
    #[serde(default)]
    pub file: Option<String>,
}

fn default_exclude_patterns() -> Vec<String> {
    vec!["**/node_modules/**".to_string(), "**/.git/**".to_string()]
}

fn default_fallback_dir() -> String {
    ".".to_string()
}

fn default_max_results() -> usize {
    100
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            exclude_patterns: default_exclude_patterns(),
            fallback_dir: default_fallback_dir(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            max_file_size: default_max_file_size(),
            transcode_non_utf8: true,
            parallel_reads: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl WorkspaceConfig {
    /// All configured roots, in configuration order.
    pub fn workspace_roots(&self) -> Vec<WorkspaceRoot> {
        self.roots.iter().map(RootEntry::to_workspace_root).collect()
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from default locations
    ///
    /// Search order:
    /// 1. GLOBAL_SEARCH_CONFIG environment variable
    /// 2. ./global_search.toml (current directory)
    /// 3. ~/.config/global_search/config.toml (user config)
    pub fn from_default_locations() -> Result<Option<(Self, PathBuf)>> {
        if let Ok(env_path) = std::env::var("GLOBAL_SEARCH_CONFIG") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                let config = Self::from_file(&path)?;
                return Ok(Some((config, path)));
            }
        }

        let local_path = PathBuf::from("global_search.toml");
        if local_path.exists() {
            let config = Self::from_file(&local_path)?;
            return Ok(Some((config, local_path)));
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_path = config_dir.join("global_search").join("config.toml");
            if user_path.exists() {
                let config = Self::from_file(&user_path)?;
                return Ok(Some((config, user_path)));
            }
        }

        Ok(None)
    }

    /// Generate a template configuration file
    pub fn generate_template() -> String {
        r#"# Global Search Configuration
# Generated template - customize as needed

[workspace]
# Workspace roots searched when scope is "all", in this order.
# Bare paths are named after their last path component; use a table
# to pick the name shown in result groups.
roots = [
    # "/home/user/projects/my-app",
    # { name = "docs", path = "/home/user/projects/docs" },
]

# Patterns excluded from workspace file listings
exclude_patterns = [
    "**/node_modules/**",
    "**/.git/**",
]

# Directory listed when scope is "all" but no roots are configured
fallback_dir = "."

[search]
# Maximum number of results per search (name and content matches combined)
max_results = 100

# Files larger than this are matched by name only (default: 10MB)
max_file_size = 10485760

# Decode Latin-1, Shift-JIS, UTF-16 etc. instead of skipping them
transcode_non_utf8 = true

# Read workspace files in parallel (result order is unaffected)
parallel_reads = true

[logging]
# Default level when RUST_LOG is not set
level = "info"

# Append log lines to a file instead of stderr
# file = "/tmp/global_search.log"
"#
        .to_string()
    }

    /// Write template config to the specified path
    pub fn write_template(path: &Path) -> Result<()> {
        let template = Self::generate_template();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
        }

        std::fs::write(path, template)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Merge CLI overrides into the configuration
    pub fn with_overrides(mut self, extra_roots: Vec<String>, verbose: bool) -> Self {
        self.workspace
            .roots
            .extend(extra_roots.into_iter().map(RootEntry::Path));

        if verbose {
            self.logging.level = "debug".to_string();
        }

        self
    }
}
