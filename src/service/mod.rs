//! The indexing service: file pipeline, directory traversal, and search.

mod filter;
mod indexing;

pub use filter::{FileFilter, DEFAULT_MAX_FILE_SIZE};
pub use indexing::IndexingService;
