use thiserror::Error;

/// Main error type for Termdex operations
#[derive(Error, Debug)]
pub enum TermdexError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Watcher error: {0}")]
    Watcher(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for Termdex operations
pub type Result<T> = std::result::Result<T, TermdexError>;

impl TermdexError {
    /// Build an `InvalidInput` error from any message
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        TermdexError::InvalidInput(msg.into())
    }

    /// Check if this error indicates a transient failure that could be retried
    pub fn is_retriable(&self) -> bool {
        matches!(self, TermdexError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TermdexError::invalid_input("path cannot be empty");
        assert_eq!(err.to_string(), "Invalid input: path cannot be empty");
    }

    #[test]
    fn test_retriable_errors() {
        let io = TermdexError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(io.is_retriable());
        assert!(!TermdexError::invalid_input("bad").is_retriable());
        assert!(!TermdexError::Watcher("lost key".to_string()).is_retriable());
    }
}
