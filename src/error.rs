//! Unified error hierarchy for HealthRS
//!
//! The analytics entry points never fail: "not enough data" is carried inside
//! their result types. Errors only arise at the collaborator boundary (reading a
//! snapshot, writing an export, loading configuration).

use std::path::PathBuf;
use thiserror::Error;

use crate::export::ExportError;

/// Top-level error type for all HealthRS operations
#[derive(Debug, Error)]
pub enum HealthError {
    /// Record store errors
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors raised while reading a snapshot from the record store
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Snapshot file missing
    #[error("Snapshot not found: {path}")]
    SnapshotNotFound { path: PathBuf },

    /// Snapshot could not be decoded
    #[error("Malformed snapshot: {reason}")]
    Malformed { reason: String },

    /// Profile record missing from the store
    #[error("Profile not found")]
    ProfileNotFound,
}

/// Result type alias for HealthRS operations
pub type Result<T> = std::result::Result<T, HealthError>;

impl HealthError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, HealthError::Io(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HealthError::Repository(RepositoryError::SnapshotNotFound { .. }) => {
                ErrorSeverity::Warning
            }
            HealthError::Repository(RepositoryError::ProfileNotFound) => ErrorSeverity::Warning,
            HealthError::Validation(_) => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Emit this error at its severity level
    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Warning => tracing::warn!(error = %self, "{}", self.user_message()),
            ErrorSeverity::Error => tracing::error!(error = %self, "{}", self.user_message()),
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            HealthError::Repository(RepositoryError::SnapshotNotFound { path }) => {
                format!("Could not find health data snapshot: {}", path.display())
            }
            HealthError::Repository(RepositoryError::Malformed { reason }) => {
                format!("Health data snapshot is unreadable: {}", reason)
            }
            HealthError::Repository(RepositoryError::ProfileNotFound) => {
                "No profile found. Please record your height, birth year and gender.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
