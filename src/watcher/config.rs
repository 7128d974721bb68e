use std::time::Duration;

const DEFAULT_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".java", ".py", ".js", ".go", ".sh", ".xml", ".json",
];

const MINIMAL_EXTENSIONS: &[&str] = &[".txt", ".md", ".java"];

/// Configuration for the filesystem watcher.
///
/// The extension set is fixed at construction; changing it requires a new
/// watcher. This set is intentionally narrower than the indexing service's
/// filter: the watcher gates which events are worth dispatching, the service
/// filter has the final say.
#[derive(Clone, Debug)]
pub struct WatcherConfig {
    extensions: Vec<String>,
    pool_size: usize,
    poll_timeout: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            pool_size: 4,
            poll_timeout: Duration::from_millis(500),
        }
    }
}

impl WatcherConfig {
    /// Configuration with only basic text extensions.
    pub fn minimal() -> Self {
        Self {
            extensions: MINIMAL_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Replace the watched extension set. Extensions include the leading dot
    /// and are matched case-insensitively.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Whether a file name matches the watched extension set.
    pub fn should_watch(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.extensions
            .iter()
            .any(|ext| lower.ends_with(&ext.to_lowercase()))
    }

    pub(crate) fn pool_size(&self) -> usize {
        self.pool_size.max(1)
    }

    pub(crate) fn poll_timeout(&self) -> Duration {
        self.poll_timeout
    }
}
