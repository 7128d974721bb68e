use std::cmp::Ordering;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single search hit: where the query terms co-occurred.
///
/// Results order by (path ascending, line ascending).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: PathBuf,
    pub line: u32,
    pub matched_text: String,
    pub size_bytes: u64,
}

impl SearchResult {
    pub fn new(path: impl Into<PathBuf>, line: u32, matched_text: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            line,
            matched_text: matched_text.into(),
            size_bytes,
        }
    }
}

impl Ord for SearchResult {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then(self.line.cmp(&other.line))
            .then_with(|| self.matched_text.cmp(&other.matched_text))
            .then(self.size_bytes.cmp(&other.size_bytes))
    }
}

impl PartialOrd for SearchResult {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
