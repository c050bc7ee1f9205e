//! Error types for the cube dialogue engine
//!
//! Invalid user input is not an error: it surfaces as the `invalidInput`
//! event. Constraint violations are not errors either, they only lower the
//! score of a candidate assignment. What remains is collaborator failure,
//! bad arguments at the boundary, and configuration problems.

use thiserror::Error;
use uuid::Uuid;

/// Failure of the schema-lookup collaborator
#[derive(Error, Debug)]
#[error("Query error: {message}")]
pub struct QueryError {
    pub message: String,
    #[source]
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }
}

/// Main error type for dialogue turns
#[derive(Error, Debug)]
pub enum DialogueError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Session {0} has already finished")]
    SessionFinished(Uuid),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl DialogueError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        DialogueError::InvalidArgument(message.into())
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid setting '{field}': {message}")]
    Invalid { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, DialogueError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_query_error_keeps_cause() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "endpoint timed out");
        let err = QueryError::with_cause("labels by cube", io);
        assert_eq!(err.to_string(), "Query error: labels by cube");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_query_error_converts_transparently() {
        let err: DialogueError = QueryError::new("no endpoint").into();
        assert_eq!(err.to_string(), "Query error: no endpoint");
    }
}
