use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TermdexError};

/// Metadata about an indexed file: size, modification time, and term counts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub last_modified: SystemTime,
    pub indexed_at: SystemTime,
    pub total_terms: usize,
    pub unique_terms: usize,
}

impl FileMetadata {
    /// Create metadata for a freshly indexed file.
    ///
    /// `indexed_at` is stamped with the current time. Fails with
    /// `InvalidInput` when `unique_terms` exceeds `total_terms`.
    pub fn new(
        path: impl Into<PathBuf>,
        size_bytes: u64,
        last_modified: SystemTime,
        total_terms: usize,
        unique_terms: usize,
    ) -> Result<Self> {
        if unique_terms > total_terms {
            return Err(TermdexError::invalid_input(format!(
                "unique terms ({unique_terms}) cannot exceed total terms ({total_terms})"
            )));
        }
        Ok(Self {
            path: path.into(),
            size_bytes,
            last_modified,
            indexed_at: SystemTime::now(),
            total_terms,
            unique_terms,
        })
    }

    /// File name component of the path, empty when the path has none
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_terms_bound() {
        let now = SystemTime::now();
        assert!(FileMetadata::new("/tmp/a.txt", 10, now, 5, 3).is_ok());
        assert!(FileMetadata::new("/tmp/a.txt", 10, now, 5, 5).is_ok());
        let err = FileMetadata::new("/tmp/a.txt", 10, now, 3, 5).unwrap_err();
        assert!(matches!(err, TermdexError::InvalidInput(_)));
    }

    #[test]
    fn test_file_name() {
        let meta = FileMetadata::new("/var/data/notes.md", 0, SystemTime::now(), 0, 0).unwrap();
        assert_eq!(meta.file_name(), "notes.md");
    }
}
