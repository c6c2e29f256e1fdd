//! Error types for Screen Manager.

use thiserror::Error;

/// Main error type for Screen Manager operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field was missing or empty
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Credential check failed
    #[error("Authentication failed")]
    Auth,

    /// Uniqueness violation on a login or screen name
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Database connection, prepare, bind or step failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Directory, script or permission failure while provisioning
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// Session multiplexer listing, start or quit failure
    #[error("Process error: {0}")]
    Process(String),

    /// The row change was committed but the host side effect failed
    #[error("Screen '{name}' was committed but its side effect failed: {reason}")]
    PartialFailure {
        /// Screen name whose row was committed
        name: String,
        /// Description of the failed side effect
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a post-commit side-effect failure for the given screen.
    pub fn partial(name: impl Into<String>, cause: Error) -> Self {
        Error::PartialFailure {
            name: name.into(),
            reason: cause.to_string(),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = Error::Validation("name cannot be empty".to_string());
        assert_eq!(err.to_string(), "Validation failed: name cannot be empty");
    }

    #[test]
    fn test_auth_error() {
        assert_eq!(Error::Auth.to_string(), "Authentication failed");
    }

    #[test]
    fn test_conflict_error() {
        let err = Error::Conflict("screen 's1'".to_string());
        assert_eq!(err.to_string(), "Already exists: screen 's1'");
    }

    #[test]
    fn test_storage_error() {
        let err = Error::Storage("database is not open".to_string());
        assert_eq!(err.to_string(), "Storage error: database is not open");
    }

    #[test]
    fn test_filesystem_error() {
        let err = Error::Filesystem("/tmp/x: permission denied".to_string());
        assert_eq!(err.to_string(), "Filesystem error: /tmp/x: permission denied");
    }

    #[test]
    fn test_process_error() {
        let err = Error::Process("screen not found".to_string());
        assert_eq!(err.to_string(), "Process error: screen not found");
    }

    #[test]
    fn test_partial_failure_wraps_cause() {
        let err = Error::partial("s1", Error::Filesystem("disk full".to_string()));
        match &err {
            Error::PartialFailure { name, reason } => {
                assert_eq!(name, "s1");
                assert_eq!(reason, "Filesystem error: disk full");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("Screen 's1' was committed"));
    }

    #[test]
    fn test_config_error() {
        let err = Error::Config("database.path cannot be empty".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: database.path cannot be empty"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_debug() {
        let err = Error::Validation("test".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Validation"));
    }
}
