//! Case-insensitive substring matching.
//!
//! Both sides are lowercased one `char` at a time with `char::to_lowercase`.
//! This is simple case folding, not locale-aware: a few scripts (Turkish
//! dotted I, Greek final sigma) will not fold the way a reader expects.

use super::record::MatchSpan;
use memchr::memmem;

fn lowercase(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// A query prepared for repeated matching.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    needle: String,
}

impl QueryMatcher {
    pub fn new(query: &str) -> Self {
        Self {
            needle: lowercase(query),
        }
    }

    /// True if `haystack` contains the query, ignoring case.
    pub fn is_match(&self, haystack: &str) -> bool {
        if haystack.is_ascii() {
            let lowered = haystack.to_ascii_lowercase();
            return memmem::find(lowered.as_bytes(), self.needle.as_bytes()).is_some();
        }
        memmem::find(lowercase(haystack).as_bytes(), self.needle.as_bytes()).is_some()
    }

    /// The first occurrence of the query in `line`, as character offsets
    /// into the original (not lowercased) line.
    pub fn find(&self, line: &str) -> Option<MatchSpan> {
        if line.is_ascii() {
            // ASCII lowercasing keeps byte offsets, and bytes are chars.
            let lowered = line.to_ascii_lowercase();
            let start = memmem::find(lowered.as_bytes(), self.needle.as_bytes())?;
            return Some(MatchSpan::new(start, start + self.needle.len()));
        }

        // Lowercasing can change a char's width, so record where each
        // original char begins in the lowered string.
        let mut lowered = String::with_capacity(line.len());
        let mut char_starts = Vec::with_capacity(line.len());
        for c in line.chars() {
            char_starts.push(lowered.len());
            lowered.extend(c.to_lowercase());
        }

        let byte_start = memmem::find(lowered.as_bytes(), self.needle.as_bytes())?;
        let byte_end = byte_start + self.needle.len();
        let start = char_starts.partition_point(|&s| s <= byte_start) - 1;
        let end = char_starts.partition_point(|&s| s < byte_end);
        Some(MatchSpan::new(start, end))
    }
}
