use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Location of a term occurrence: file path plus 1-based line number.
///
/// This is the unit stored in postings lists. Equality is structural, so the
/// conjunctive search intersects on (path, line) pairs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    pub path: PathBuf,
    pub line: u32,
}

impl FileLocation {
    pub fn new(path: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}
