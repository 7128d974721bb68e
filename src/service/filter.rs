use std::fs;
use std::path::Path;

use tracing::{debug, warn};

/// Default size cap for indexable files: 10 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

const DEFAULT_EXTENSIONS: &[&str] = &[
    ".txt", ".md", ".java", ".py", ".js", ".go", ".sh", ".xml", ".json", ".cpp", ".c", ".h",
    ".hpp", ".yml", ".yaml", ".properties", ".rst", ".sql", ".bat", ".ps1", ".gradle", ".mvn",
    ".pom",
];

/// Acceptance policy for indexable files: regular file, size within the cap,
/// extension whitelisted. Fixed at construction.
#[derive(Clone, Debug)]
pub struct FileFilter {
    max_file_size: u64,
    extensions: Vec<String>,
    case_sensitive: bool,
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            case_sensitive: false,
        }
    }
}

impl FileFilter {
    /// Override the size cap in bytes.
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Replace the extension whitelist. Extensions include the leading dot.
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Match extensions case-sensitively.
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Decide whether a file should be indexed.
    pub fn should_index(&self, path: &Path) -> bool {
        let Ok(meta) = fs::metadata(path) else {
            return false;
        };
        if !meta.is_file() {
            return false;
        }

        if meta.len() > self.max_file_size {
            warn!(
                "File ignored (size limit): {} ({} > {} bytes)",
                path.display(),
                meta.len(),
                self.max_file_size
            );
            return false;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let extension = extension_of(name);
        if !self.has_indexable_extension(extension) {
            debug!(
                "File ignored (extension): {} (extension: '{}')",
                path.display(),
                extension
            );
            return false;
        }

        true
    }

    fn has_indexable_extension(&self, extension: &str) -> bool {
        if extension.is_empty() {
            return false;
        }
        if self.case_sensitive {
            self.extensions.iter().any(|e| e == extension)
        } else {
            self.extensions
                .iter()
                .any(|e| e.eq_ignore_ascii_case(extension))
        }
    }
}

/// Extension of a file name including the leading dot, or empty when the
/// name has none. A leading dot alone (hidden files) does not count.
fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 && i < name.len() - 1 => &name[i..],
        _ => "",
    }
}
