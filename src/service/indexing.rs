use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime};

use dashmap::DashSet;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::index::{IndexStats, InvertedIndex};
use crate::metrics::{MetricsSnapshot, PerformanceMetrics};
use crate::models::{FileMetadata, SearchResult, Token};
use crate::retry::RetryPolicy;
use crate::tokenizer::Tokenizer;

use super::FileFilter;

/// Drives the indexing pipeline: path to bytes to tokens to index mutations,
/// plus directory traversal and conjunctive search.
///
/// Operations are safe to call from multiple threads; the index itself is
/// the synchronization boundary. Two concurrent `index_file` calls on the
/// same path race, with the later atomic replacement winning.
pub struct IndexingService {
    index: InvertedIndex,
    tokenizer: Box<dyn Tokenizer>,
    metrics: PerformanceMetrics,
    indexed_files: DashSet<PathBuf>,
    filter: FileFilter,
    retry: RetryPolicy,
}

impl IndexingService {
    /// Create a service with the given tokenizer and default filter and
    /// retry settings.
    pub fn new(tokenizer: Box<dyn Tokenizer>) -> Self {
        info!(
            "IndexingService initialized with tokenizer: {}",
            tokenizer.name()
        );
        Self {
            index: InvertedIndex::new(),
            tokenizer,
            metrics: PerformanceMetrics::new(),
            indexed_files: DashSet::new(),
            filter: FileFilter::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Override the file filter.
    pub fn with_filter(mut self, filter: FileFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Override the I/O retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Index a single file. Returns `false` for files that do not exist, are
    /// filtered out, are empty, tokenize to nothing, or fail I/O after all
    /// retries; none of these corrupt state.
    pub fn index_file(&self, path: &Path) -> bool {
        if !self.validate_for_indexing(path) {
            return false;
        }

        let started = Instant::now();
        let success = self.process_file(path);
        self.metrics.record_indexing(started.elapsed());

        if success {
            info!("Successfully indexed file: {}", path.display());
        } else {
            warn!("Failed to index file: {}", path.display());
        }
        success
    }

    /// Recursively index every supported file under a directory. Returns the
    /// number of files indexed successfully; entries that cannot be walked
    /// are skipped with a warning.
    pub fn index_directory(&self, directory: &Path) -> usize {
        if !directory.exists() {
            warn!("Directory does not exist: {}", directory.display());
            return 0;
        }
        if !directory.is_dir() {
            warn!("Path is not a directory: {}", directory.display());
            return 0;
        }

        info!(
            "Starting recursive directory indexing: {}",
            directory.display()
        );

        let mut files = Vec::new();
        for entry in WalkDir::new(directory) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && self.filter.should_index(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) => warn!("Failed to visit entry: {}", e),
            }
        }

        info!(
            "Found {} files to index in directory: {}",
            files.len(),
            directory.display()
        );
        self.index_files(&files)
    }

    /// Index a batch of files, returning the success count.
    pub fn index_files(&self, paths: &[PathBuf]) -> usize {
        let mut indexed = 0;
        for path in paths {
            if self.index_file(path) {
                indexed += 1;
            }
        }
        info!(
            "Batch indexing completed: {}/{} files indexed successfully",
            indexed,
            paths.len()
        );
        indexed
    }

    /// Remove a file from the index. Returns `false` when the path was never
    /// indexed.
    pub fn remove_file(&self, path: &Path) -> bool {
        if self.indexed_files.remove(path).is_none() {
            debug!("File not found in index: {}", path.display());
            return false;
        }
        if let Err(e) = self.index.remove_file(path) {
            error!(
                "Failed to remove file from index: {}: {}",
                path.display(),
                e
            );
        }
        info!("Removed file from index: {}", path.display());
        true
    }

    /// Conjunctive search: locations where all terms co-occur on one line,
    /// sorted by (path, line). An empty term list yields no results.
    pub fn search_all(&self, terms: &[String]) -> Vec<SearchResult> {
        if terms.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();
        let locations = self.index.find_all(terms);
        let matched_text = terms.join(" AND ");

        // metadata lookups amortized per file rather than per location
        let mut sizes: HashMap<PathBuf, u64> = HashMap::new();
        let mut results = Vec::with_capacity(locations.len());
        for location in locations {
            let size = match sizes.get(&location.path) {
                Some(size) => *size,
                None => {
                    let size = self
                        .index
                        .get_metadata(&location.path)
                        .map(|m| m.size_bytes)
                        .unwrap_or(0);
                    sizes.insert(location.path.clone(), size);
                    size
                }
            };
            results.push(SearchResult::new(
                location.path,
                location.line,
                matched_text.clone(),
                size,
            ));
        }
        results.sort();

        self.metrics.record_search(started.elapsed());
        info!("Found {} results for ALL terms: {:?}", results.len(), terms);
        results
    }

    /// Snapshot of the performance counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Aggregate index counters.
    pub fn stats(&self) -> IndexStats {
        self.index.get_stats()
    }

    /// The underlying index, for direct queries and diagnostics.
    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Whether the configured filter accepts this file.
    pub fn is_supported_file(&self, path: &Path) -> bool {
        self.filter.should_index(path)
    }

    fn validate_for_indexing(&self, path: &Path) -> bool {
        if !path.exists() {
            warn!("File does not exist: {}", path.display());
            return false;
        }
        if !path.is_file() {
            warn!("Path is not a regular file: {}", path.display());
            return false;
        }
        if !self.filter.should_index(path) {
            debug!("Skipping unsupported file type: {}", path.display());
            return false;
        }
        true
    }

    fn process_file(&self, path: &Path) -> bool {
        let context = path.display().to_string();
        let Some(content) = self
            .retry
            .run_opt("read file", &context, || fs::read_to_string(path))
        else {
            return false;
        };

        if content.trim().is_empty() {
            info!("Skipping empty file: {}", path.display());
            return false;
        }

        let tokens = self.tokenizer.tokenize(&content);
        if tokens.is_empty() {
            info!("No valid terms found in file: {}", path.display());
            return false;
        }

        let result = if self.indexed_files.contains(path) {
            self.index.replace_terms(&tokens, path)
        } else {
            self.index.add_terms(&tokens, path)
        };
        if let Err(e) = result {
            error!("Failed to update index for {}: {}", path.display(), e);
            return false;
        }

        self.store_metadata(path, &tokens);
        self.indexed_files.insert(path.to_path_buf());
        true
    }

    /// Build and store metadata for a freshly indexed file. Attribute read
    /// failures are logged and do not fail the indexing operation.
    fn store_metadata(&self, path: &Path, tokens: &[Token]) {
        let context = path.display().to_string();
        let attrs = self.retry.run_opt(
            "read file attributes",
            &context,
            || -> std::io::Result<(u64, SystemTime)> {
                let meta = fs::metadata(path)?;
                Ok((meta.len(), meta.modified()?))
            },
        );
        let Some((size, modified)) = attrs else {
            error!("Failed to read file attributes for metadata: {}", context);
            return;
        };

        let unique: HashSet<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        match FileMetadata::new(path, size, modified, tokens.len(), unique.len()) {
            Ok(metadata) => {
                if let Err(e) = self.index.add_metadata(metadata) {
                    error!("Failed to store metadata for {}: {}", context, e);
                }
            }
            Err(e) => error!("Invalid metadata for {}: {}", context, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WordTokenizer;

    fn service() -> IndexingService {
        IndexingService::new(Box::new(WordTokenizer::default()))
    }

    #[test]
    fn test_remove_unknown_path_is_false() {
        let service = service();
        assert!(!service.remove_file(Path::new("/never/indexed.txt")));
    }

    #[test]
    fn test_index_missing_file_is_false() {
        let service = service();
        assert!(!service.index_file(Path::new("/no/such/file.txt")));
        assert!(service.stats().is_empty);
    }

    #[test]
    fn test_search_with_no_terms_is_empty() {
        let service = service();
        assert!(service.search_all(&[]).is_empty());
    }

    #[test]
    fn test_index_directory_rejects_non_directory() {
        let service = service();
        assert_eq!(service.index_directory(Path::new("/no/such/dir")), 0);
    }
}
