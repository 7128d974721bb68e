pub mod config;
pub mod error;
pub mod index;
pub mod metrics;
pub mod models;
pub mod retry;
pub mod service;
pub mod tokenizer;
pub mod watcher;

pub use config::EngineConfig;
pub use error::{Result, TermdexError};
pub use index::{IndexStats, InvertedIndex};
pub use metrics::{MetricsSnapshot, PerformanceMetrics};
pub use models::{FileLocation, FileMetadata, SearchResult, Token, TokenType};
pub use retry::RetryPolicy;
pub use service::{FileFilter, IndexingService};
pub use tokenizer::{Tokenizer, WordTokenizer};
pub use watcher::{FileSystemWatcher, WatcherConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
