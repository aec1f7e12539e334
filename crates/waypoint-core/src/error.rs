//! Error types for the planner library.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::kv::KvError;

/// The four failure categories callers are expected to branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A plan or task id is absent
    NotFound,
    /// The request itself is invalid; nothing was written
    Validation,
    /// A key-value call failed, possibly after earlier writes landed
    Storage,
    /// An index and the records it points at disagree
    Consistency,
}

/// Comprehensive error type for all planner operations.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Plan not found for the given ID
    #[error("Plan with ID {id} not found")]
    PlanNotFound { id: String },
    /// Task not found for the given ID
    #[error("Task with ID {id} not found")]
    TaskNotFound { id: String },
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Key-value backend errors
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: KvError,
    },
    /// A multi-step write stopped part way; earlier steps were not rolled back
    #[error("{operation} failed at {failed_at} after {completed} completed step(s)")]
    PartialFailure {
        operation: &'static str,
        completed: usize,
        failed_at: String,
        #[source]
        source: Box<PlannerError>,
    },
    /// An index references something its records do not back up
    #[error("Consistency error: {message}")]
    Consistency { message: String },
    /// The call did not finish before the configured deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating storage errors with optional context.
pub struct StorageErrorBuilder {
    message: String,
}

impl StorageErrorBuilder {
    /// Create a new storage error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: KvError) -> PlannerError {
        PlannerError::Storage {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> PlannerError {
        PlannerError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl PlannerError {
    /// Creates a builder for storage errors.
    pub fn storage(message: impl Into<String>) -> StorageErrorBuilder {
        StorageErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    pub(crate) fn consistency(message: impl Into<String>) -> Self {
        Self::Consistency {
            message: message.into(),
        }
    }

    pub(crate) fn partial(
        operation: &'static str,
        completed: usize,
        failed_at: impl Into<String>,
        source: PlannerError,
    ) -> Self {
        Self::PartialFailure {
            operation,
            completed,
            failed_at: failed_at.into(),
            source: Box::new(source),
        }
    }

    /// Collapses the error onto the category a caller should branch on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlanNotFound { .. } | Self::TaskNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. } => ErrorKind::Validation,
            Self::Consistency { .. } => ErrorKind::Consistency,
            Self::Storage { .. }
            | Self::PartialFailure { .. }
            | Self::Timeout { .. }
            | Self::FileSystem { .. }
            | Self::XdgDirectory(_)
            | Self::Configuration { .. } => ErrorKind::Storage,
        }
    }

    /// Returns true for either flavour of missing entity.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Specialized extension trait for key-value Results.
pub trait StorageResultExt<T> {
    /// Map backend errors with a message.
    fn kv_context(self, message: &str) -> Result<T>;

    /// Map backend errors with a lazily built message.
    fn kv_context_lazy<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> StorageResultExt<T> for std::result::Result<T, KvError> {
    fn kv_context(self, message: &str) -> Result<T> {
        self.map_err(|e| PlannerError::storage(message).with_source(e))
    }

    fn kv_context_lazy<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| PlannerError::storage(f()).with_source(e))
    }
}

/// Result type alias for planner operations
pub type Result<T> = std::result::Result<T, PlannerError>;
