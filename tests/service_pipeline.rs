//! End-to-end tests for the indexing service pipeline and its boundary
//! behaviors.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use termdex::{FileFilter, IndexingService, WordTokenizer};

fn service() -> IndexingService {
    IndexingService::new(Box::new(WordTokenizer::default()))
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn empty_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "empty.txt", "");
    let service = service();
    assert!(!service.index_file(&path));
    assert!(service.stats().is_empty);
}

#[test]
fn whitespace_only_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "blank.txt", "  \n\t \n  ");
    let service = service();
    assert!(!service.index_file(&path));
    assert!(service.stats().is_empty);
}

#[test]
fn file_with_only_short_tokens_is_rejected() {
    let dir = TempDir::new().unwrap();
    // every word falls below the default minimum token length of 2
    let path = write_file(&dir, "short.txt", "a b c\nx y z");
    let service = service();
    assert!(!service.index_file(&path));
    assert!(service.stats().is_empty);
}

#[test]
fn size_cap_is_a_strict_upper_bound() {
    let dir = TempDir::new().unwrap();
    let content = "ok ok ok";
    let at_cap = write_file(&dir, "at.txt", content);
    let over = write_file(&dir, "over.txt", &format!("{content}!"));

    let service =
        service().with_filter(FileFilter::default().with_max_file_size(content.len() as u64));
    assert!(service.index_file(&at_cap));
    assert!(!service.index_file(&over));
}

#[test]
fn extension_matching_follows_filter_case_mode() {
    let dir = TempDir::new().unwrap();
    let upper = write_file(&dir, "NOTES.TXT", "upper case name");
    let mixed = write_file(&dir, "Memo.Txt", "mixed case name");

    let insensitive = service();
    assert!(insensitive.index_file(&upper));
    assert!(insensitive.index_file(&mixed));

    let sensitive = service().with_filter(FileFilter::default().with_case_sensitive(true));
    assert!(!sensitive.index_file(&upper));
    assert!(!sensitive.index_file(&mixed));
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "image.png", "not really an image");
    let service = service();
    assert!(!service.index_file(&path));
}

#[test]
fn line_numbers_start_at_one() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "lines.txt", "first\nsecond");
    let service = service();
    assert!(service.index_file(&path));

    let results = service.search_all(&terms(&["first"]));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].line, 1);
}

#[test]
fn directory_indexing_counts_only_supported_files() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "one.txt", "alpha beta");
    write_file(&dir, "nested/two.md", "gamma delta");
    write_file(&dir, "nested/deep/three.txt", "epsilon");
    write_file(&dir, "skipped.bin", "binary stuff");
    write_file(&dir, "empty.txt", "");

    let service = service();
    assert_eq!(service.index_directory(dir.path()), 3);
    assert_eq!(service.stats().file_count, 3);
}

#[test]
fn reindexing_replaces_old_postings() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "c.txt", "foo");
    let service = service();
    assert!(service.index_file(&path));

    fs::write(&path, "bar").unwrap();
    assert!(service.index_file(&path));

    assert!(service.search_all(&terms(&["foo"])).is_empty());
    let results = service.search_all(&terms(&["bar"]));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, path);
    assert_eq!(service.stats().total_occurrences, 1);
    service.index().check_invariants().unwrap();
}

#[test]
fn remove_is_idempotent_at_service_level() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "gone.txt", "fleeting words");
    let service = service();
    assert!(service.index_file(&path));

    assert!(service.remove_file(&path));
    assert!(!service.remove_file(&path));
    assert!(service.search_all(&terms(&["fleeting"])).is_empty());
}

#[test]
fn results_are_sorted_by_path_then_line() {
    let dir = TempDir::new().unwrap();
    write_file(&dir, "b.txt", "needle\nneedle");
    write_file(&dir, "a.txt", "filler\nneedle");
    let service = service();
    service.index_directory(dir.path());

    let results = service.search_all(&terms(&["needle"]));
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].path, dir.path().join("a.txt"));
    assert_eq!(results[0].line, 2);
    assert_eq!(results[1].path, dir.path().join("b.txt"));
    assert_eq!(results[1].line, 1);
    assert_eq!(results[2].line, 2);
}

#[test]
fn matched_text_joins_terms_and_size_comes_from_metadata() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "joined.txt", "lunar module");
    let service = service();
    assert!(service.index_file(&path));

    let results = service.search_all(&terms(&["lunar", "module"]));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].matched_text, "lunar AND module");
    assert_eq!(results[0].size_bytes, fs::metadata(&path).unwrap().len());
}

#[test]
fn metadata_records_term_counts() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "meta.txt", "repeat repeat unique");
    let service = service();
    assert!(service.index_file(&path));

    let metadata = service.index().get_metadata(&path).unwrap();
    assert_eq!(metadata.total_terms, 3);
    assert_eq!(metadata.unique_terms, 2);
    assert_eq!(metadata.size_bytes, fs::metadata(&path).unwrap().len());
}

#[test]
fn metrics_track_indexing_and_search_counts() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "counted.txt", "tracked words");
    let service = service();

    assert!(service.index_file(&path));
    service.search_all(&terms(&["tracked"]));
    service.search_all(&terms(&["absent"]));

    let metrics = service.metrics();
    assert_eq!(metrics.files_indexed, 1);
    assert_eq!(metrics.search_queries, 2);
}

#[test]
fn failed_search_returns_empty_not_error() {
    let service = service();
    assert!(service.search_all(&terms(&["anything"])).is_empty());
    assert!(service.search_all(&[]).is_empty());
}

#[test]
fn nonexistent_path_is_benign_false() {
    let service = service();
    assert!(!service.index_file(Path::new("/definitely/not/here.txt")));
    let metrics = service.metrics();
    // validation failures never reach the pipeline counters
    assert_eq!(metrics.files_indexed, 0);
}
