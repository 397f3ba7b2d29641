//! Error types for dpu-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for dpu-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dpu-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error: missing keys, empty values, bad env file
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A directory could not be read during discovery
    #[error("Cannot read {}: {source}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bucket creation found an existing bucket
    #[error("Bucket already exists: {bucket}")]
    BucketExists { bucket: String, owned_by_you: bool },

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or service error
    #[error("Network error: {0}")]
    Network(String),

    /// An operation exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Work was not started because the batch deadline passed
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidUrl(_) => 2, // UsageError
            Error::Network(_) | Error::Timeout(_) => 3,   // NetworkError
            Error::Auth(_) => 4,                          // AuthError
            Error::NotFound(_) => 5,                      // NotFound
            Error::Cancelled(_) => 130,                   // Interrupted
            _ => 1,                                       // GeneralError
        }
    }

    /// Short machine-readable name of the error class
    pub const fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Io(_) => "io",
            Error::Discovery { .. } => "discovery",
            Error::BucketExists { .. } => "bucket_exists",
            Error::Auth(_) => "auth",
            Error::NotFound(_) => "not_found",
            Error::Network(_) => "network",
            Error::Timeout(_) => "timeout",
            Error::Cancelled(_) => "cancelled",
            Error::General(_) => "general",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Timeout("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        let exists = Error::BucketExists {
            bucket: "b".into(),
            owned_by_you: false,
        };
        // Never fatal on its own; only reaches the CLI if a caller propagates it
        assert_eq!(exists.exit_code(), 1);
        assert_eq!(Error::Cancelled("test".into()).exit_code(), 130);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
        let io = std::io::Error::other("boom");
        assert_eq!(Error::Io(io).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("/missing/dir".into());
        assert_eq!(err.to_string(), "Not found: /missing/dir");

        let err = Error::Discovery {
            path: PathBuf::from("proj/dbt"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("Cannot read proj/dbt"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::Auth("x".into()).kind(), "auth");
        assert_eq!(Error::Timeout("x".into()).kind(), "timeout");
    }
}
