//! Path filtering using glob patterns for excluding workspace files.
//!
//! Workspace listings run every candidate through a `PathFilter` before the
//! file reaches the search engine. Patterns are matched against the path
//! relative to the directory being listed.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Rejects paths matching any of a set of glob patterns.
///
/// An empty filter rejects nothing.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    exclude: Option<GlobSet>,
}

impl PathFilter {
    /// Create a filter from exclude patterns.
    ///
    /// Patterns should be glob patterns like:
    /// - `**/node_modules/**` - Anything under a node_modules directory
    /// - `**/*.min.js` - Minified bundles anywhere
    /// - `dist/**` - The top-level dist/ directory
    pub fn excluding(exclude_patterns: &[String]) -> Result<Self> {
        if exclude_patterns.is_empty() {
            return Ok(Self::default());
        }

        let mut builder = GlobSetBuilder::new();
        for pattern in exclude_patterns {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid exclude glob pattern: {}", pattern))?;
            builder.add(glob);
        }
        let set = builder.build().context("Failed to build exclude GlobSet")?;

        Ok(Self { exclude: Some(set) })
    }

    /// Parse semicolon-delimited patterns into a vector.
    ///
    /// Example: "**/dist/**;*.min.js" -> ["**/dist/**", "*.min.js"]
    pub fn parse_patterns(patterns: &str) -> Vec<String> {
        if patterns.trim().is_empty() {
            return Vec::new();
        }
        patterns
            .split(';')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns true if the path survives the filter.
    pub fn matches(&self, path: &str) -> bool {
        match &self.exclude {
            Some(set) => !set.is_match(path),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patterns() {
        assert_eq!(PathFilter::parse_patterns(""), Vec::<String>::new());
        assert_eq!(PathFilter::parse_patterns("  "), Vec::<String>::new());
        assert_eq!(
            PathFilter::parse_patterns("**/dist/** ; *.min.js ; "),
            vec!["**/dist/**", "*.min.js"]
        );
    }

    #[test]
    fn test_empty_filter() {
        let filter = PathFilter::excluding(&[]).unwrap();
        assert!(filter.exclude.is_none());
        assert!(filter.matches("any/path/file.rs"));
    }

    #[test]
    fn test_excludes_dependency_directory() {
        let filter = PathFilter::excluding(&["**/node_modules/**".to_string()]).unwrap();
        assert!(filter.matches("src/main.ts"));
        assert!(!filter.matches("node_modules/pkg/index.js"));
        assert!(!filter.matches("packages/web/node_modules/react/index.js"));
        assert!(filter.matches("src/node_modules_helper.ts"));
    }

    #[test]
    fn test_multiple_patterns() {
        let filter = PathFilter::excluding(&[
            "**/node_modules/**".to_string(),
            "**/*.min.js".to_string(),
        ])
        .unwrap();
        assert!(filter.matches("src/app.js"));
        assert!(!filter.matches("dist/app.min.js"));
        assert!(!filter.matches("node_modules/a/b.js"));
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = PathFilter::excluding(&["a[".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid exclude glob pattern"));
    }
}
