//! Configuration loading for the engine binary.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Result, TermdexError};

const INDEX_DIR_KEY: &str = "index.directory";
const WATCH_DIR_KEY: &str = "watch.directory";

/// Engine configuration loaded from a `key = value` file.
///
/// Both `index.directory` and `watch.directory` are required and must name
/// absolute paths to existing, writable directories. Lines starting with `#`
/// and unknown keys are ignored.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    index_directory: PathBuf,
    watch_directory: PathBuf,
}

impl EngineConfig {
    /// Load and validate configuration from a file.
    pub fn load(config_file: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_file).map_err(|e| {
            TermdexError::Config(format!(
                "cannot read configuration file {}: {e}",
                config_file.display()
            ))
        })?;

        let mut index_directory = None;
        let mut watch_directory = None;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(TermdexError::Config(format!(
                    "malformed configuration line: '{line}'"
                )));
            };
            match key.trim() {
                INDEX_DIR_KEY => index_directory = Some(value.trim().to_string()),
                WATCH_DIR_KEY => watch_directory = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let index_directory = resolve_directory(INDEX_DIR_KEY, index_directory)?;
        let watch_directory = resolve_directory(WATCH_DIR_KEY, watch_directory)?;

        info!(
            "Configuration loaded from: {} - index: {}, watch: {}",
            config_file.display(),
            index_directory.display(),
            watch_directory.display()
        );
        Ok(Self {
            index_directory,
            watch_directory,
        })
    }

    /// Directory indexed once at startup.
    pub fn index_directory(&self) -> &Path {
        &self.index_directory
    }

    /// Directory monitored live.
    pub fn watch_directory(&self) -> &Path {
        &self.watch_directory
    }
}

fn resolve_directory(key: &str, value: Option<String>) -> Result<PathBuf> {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return Err(TermdexError::Config(format!(
            "required property '{key}' is missing or empty"
        )));
    };

    if value.contains('\0') || value.contains('\n') || value.contains('\r') {
        return Err(TermdexError::Config(format!(
            "property '{key}' contains invalid characters"
        )));
    }

    let path = PathBuf::from(&value);
    if !path.is_absolute() {
        return Err(TermdexError::Config(format!(
            "property '{key}' must be an absolute path, got '{value}'"
        )));
    }
    if !path.exists() {
        return Err(TermdexError::Config(format!(
            "directory does not exist: {value}"
        )));
    }
    if !path.is_dir() {
        return Err(TermdexError::Config(format!(
            "path is not a directory: {value}"
        )));
    }

    let meta = fs::metadata(&path)
        .map_err(|e| TermdexError::Config(format!("cannot read directory {value}: {e}")))?;
    if meta.permissions().readonly() {
        return Err(TermdexError::Config(format!(
            "directory is not writable: {value}"
        )));
    }

    Ok(path)
}
