use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TermdexError};
use crate::models::{FileLocation, FileMetadata, Token};

/// Aggregate index counters, readable without taking the write path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub file_count: u64,
    pub total_occurrences: u64,
    pub unique_terms: usize,
    pub is_empty: bool,
}

#[derive(Default)]
struct IndexState {
    /// normalized term -> locations where it occurs
    postings: HashMap<String, HashSet<FileLocation>>,
    /// path -> normalized terms present in that file, for O(terms) removal
    file_terms: HashMap<PathBuf, HashSet<String>>,
    /// path -> file information
    metadata: HashMap<PathBuf, FileMetadata>,
}

impl IndexState {
    fn is_tracked(&self, path: &Path) -> bool {
        self.file_terms.contains_key(path) || self.metadata.contains_key(path)
    }
}

/// Thread-safe in-memory inverted index.
///
/// A single read-write lock protects the postings, per-file term sets, and
/// metadata as one consistent unit. Input validation, normalization, and
/// token filtering all happen outside the lock; only the map updates run
/// inside it, so compound operations are atomic with respect to concurrent
/// readers. The occurrence and file counters are atomics updated inside the
/// critical section and read relaxed without the lock, so they may briefly
/// trail the maps while a writer is active.
pub struct InvertedIndex {
    state: RwLock<IndexState>,
    total_occurrences: AtomicU64,
    file_count: AtomicU64,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            total_occurrences: AtomicU64::new(0),
            file_count: AtomicU64::new(0),
        }
    }

    /// Add term occurrences for a file without touching its existing
    /// postings. An empty token sequence is a no-op.
    pub fn add_terms(&self, tokens: &[Token], path: &Path) -> Result<()> {
        validate_path(path)?;
        let prepared = prepare_tokens(tokens)?;
        if prepared.is_empty() {
            debug!("No valid tokens to add for file: {}", path.display());
            return Ok(());
        }

        let mut state = self.state.write();
        let was_tracked = state.is_tracked(path);
        let inserted = insert_terms(&mut state, path, &prepared);
        if !was_tracked {
            self.file_count.fetch_add(1, Ordering::Relaxed);
        }
        self.total_occurrences.fetch_add(inserted, Ordering::Relaxed);
        drop(state);

        debug!("Added {} terms for file: {}", prepared.len(), path.display());
        Ok(())
    }

    /// Atomically replace all postings for a file with the given tokens.
    ///
    /// Readers observe either the previous postings for the path or the new
    /// ones, never a partial blend.
    pub fn replace_terms(&self, tokens: &[Token], path: &Path) -> Result<()> {
        validate_path(path)?;
        let prepared = prepare_tokens(tokens)?;

        let mut state = self.state.write();
        let was_tracked = state.is_tracked(path);
        let removed = remove_locations(&mut state, path);
        let inserted = insert_terms(&mut state, path, &prepared);
        let now_tracked = state.is_tracked(path);
        if !was_tracked && now_tracked {
            self.file_count.fetch_add(1, Ordering::Relaxed);
        } else if was_tracked && !now_tracked {
            self.file_count.fetch_sub(1, Ordering::Relaxed);
        }
        self.total_occurrences.fetch_sub(removed, Ordering::Relaxed);
        self.total_occurrences.fetch_add(inserted, Ordering::Relaxed);
        drop(state);

        debug!(
            "Replaced terms for file: {} (removed {}, added {})",
            path.display(),
            removed,
            inserted
        );
        Ok(())
    }

    /// Store or replace the metadata record for a file.
    pub fn add_metadata(&self, metadata: FileMetadata) -> Result<()> {
        validate_path(&metadata.path)?;

        let mut state = self.state.write();
        let was_tracked = state.is_tracked(&metadata.path);
        let path = metadata.path.clone();
        state.metadata.insert(path, metadata);
        if !was_tracked {
            self.file_count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Remove all postings and metadata for a file. Unknown paths are a
    /// no-op.
    pub fn remove_file(&self, path: &Path) -> Result<()> {
        validate_path(path)?;

        let mut state = self.state.write();
        let removed_meta = state.metadata.remove(path).is_some();
        let removed = remove_locations(&mut state, path);
        if removed > 0 || removed_meta {
            self.file_count.fetch_sub(1, Ordering::Relaxed);
        }
        self.total_occurrences.fetch_sub(removed, Ordering::Relaxed);
        drop(state);

        debug!(
            "Removed file from index: {} ({} occurrences)",
            path.display(),
            removed
        );
        Ok(())
    }

    /// Empty all index state.
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.postings.clear();
        state.file_terms.clear();
        state.metadata.clear();
        self.total_occurrences.store(0, Ordering::Relaxed);
        self.file_count.store(0, Ordering::Relaxed);
        drop(state);
        info!("Index cleared");
    }

    /// Conjunctive lookup: the locations where every given term occurs.
    ///
    /// Intersection is on full `FileLocation` equality, so all terms must
    /// share a line. The smallest postings set seeds the working set and the
    /// rest are intersected in ascending size order. Returns an owned
    /// snapshot that never reflects later mutations. An empty term list, a
    /// term with no postings, or a term that normalizes to empty all yield
    /// the empty set.
    pub fn find_all(&self, terms: &[String]) -> HashSet<FileLocation> {
        if terms.is_empty() {
            return HashSet::new();
        }
        let mut normalized = Vec::with_capacity(terms.len());
        for term in terms {
            let term = normalize_term(term);
            if term.is_empty() {
                return HashSet::new();
            }
            normalized.push(term);
        }

        let state = self.state.read();
        let mut lists: Vec<&HashSet<FileLocation>> = Vec::with_capacity(normalized.len());
        for term in &normalized {
            match state.postings.get(term) {
                Some(locations) if !locations.is_empty() => lists.push(locations),
                _ => return HashSet::new(),
            }
        }
        lists.sort_by_key(|locations| locations.len());

        let mut lists = lists.into_iter();
        let Some(seed) = lists.next() else {
            return HashSet::new();
        };
        let mut result = seed.clone();
        for locations in lists {
            result.retain(|loc| locations.contains(loc));
            if result.is_empty() {
                return HashSet::new();
            }
        }
        result
    }

    /// Stored metadata for a path, if any.
    pub fn get_metadata(&self, path: &Path) -> Option<FileMetadata> {
        self.state.read().metadata.get(path).cloned()
    }

    /// Current aggregate counters.
    pub fn get_stats(&self) -> IndexStats {
        let state = self.state.read();
        IndexStats {
            file_count: self.file_count.load(Ordering::Relaxed),
            total_occurrences: self.total_occurrences.load(Ordering::Relaxed),
            unique_terms: state.postings.len(),
            is_empty: state.postings.is_empty(),
        }
    }

    /// Diagnostic consistency check used by the test suites: verifies the
    /// cross-references between postings, per-file term sets, and counters.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let state = self.state.read();

        for (term, locations) in &state.postings {
            if locations.is_empty() {
                return Err(format!("postings set for term '{term}' is empty"));
            }
            for location in locations {
                let listed = state
                    .file_terms
                    .get(&location.path)
                    .is_some_and(|terms| terms.contains(term));
                if !listed {
                    return Err(format!(
                        "term '{term}' posted at {location} but missing from its file term set"
                    ));
                }
            }
        }

        for (path, terms) in &state.file_terms {
            for term in terms {
                let posted = state.postings.get(term).is_some_and(|locations| {
                    locations.iter().any(|loc| loc.path == *path)
                });
                if !posted {
                    return Err(format!(
                        "file {} lists term '{term}' with no matching posting",
                        path.display()
                    ));
                }
            }
        }

        let occurrences: u64 = state.postings.values().map(|l| l.len() as u64).sum();
        let counted = self.total_occurrences.load(Ordering::Relaxed);
        if occurrences != counted {
            return Err(format!(
                "occurrence counter {counted} != postings total {occurrences}"
            ));
        }

        let tracked: HashSet<&PathBuf> = state
            .file_terms
            .keys()
            .chain(state.metadata.keys())
            .collect();
        let files = self.file_count.load(Ordering::Relaxed);
        if tracked.len() as u64 != files {
            return Err(format!(
                "file counter {files} != tracked path count {}",
                tracked.len()
            ));
        }

        Ok(())
    }
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a term for consistent indexing and lookup.
fn normalize_term(term: &str) -> String {
    term.trim().to_lowercase()
}

fn validate_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(TermdexError::invalid_input("file path cannot be empty"));
    }
    Ok(())
}

/// Validate and normalize tokens outside the lock. Tokens with empty values
/// or values that normalize to empty are dropped silently; a zero line
/// number is a caller contract violation.
fn prepare_tokens(tokens: &[Token]) -> Result<Vec<(String, u32)>> {
    let mut prepared = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.value.trim().is_empty() {
            continue;
        }
        if token.line == 0 {
            return Err(TermdexError::invalid_input(format!(
                "line numbers are 1-based, token '{}' has line 0",
                token.value
            )));
        }
        let term = normalize_term(&token.value);
        if term.is_empty() {
            continue;
        }
        prepared.push((term, token.line));
    }
    Ok(prepared)
}

/// Insert prepared (term, line) pairs for a path. Assumes the write lock is
/// held. Returns the number of postings actually inserted; duplicates of an
/// already-present location do not count.
fn insert_terms(state: &mut IndexState, path: &Path, prepared: &[(String, u32)]) -> u64 {
    let mut inserted = 0;
    for (term, line) in prepared {
        let location = FileLocation::new(path, *line);
        if state.postings.entry(term.clone()).or_default().insert(location) {
            inserted += 1;
        }
        state
            .file_terms
            .entry(path.to_path_buf())
            .or_default()
            .insert(term.clone());
    }
    inserted
}

/// Remove every posting for a path and drop its file term set. Assumes the
/// write lock is held. Returns the number of postings removed.
fn remove_locations(state: &mut IndexState, path: &Path) -> u64 {
    let Some(terms) = state.file_terms.remove(path) else {
        return 0;
    };
    let mut removed = 0;
    for term in &terms {
        if let Some(locations) = state.postings.get_mut(term) {
            let before = locations.len();
            locations.retain(|loc| loc.path != path);
            removed += (before - locations.len()) as u64;
            if locations.is_empty() {
                state.postings.remove(term);
            }
        }
    }
    removed
}
