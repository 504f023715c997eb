//! Error types for session operations.

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors that can occur while talking to the database cluster.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The cluster rejected a statement at prepare time.
    #[error("prepare failed: {message}")]
    PrepareFailed {
        /// Description of the failure.
        message: String,
    },

    /// The cluster rejected a statement at execution time.
    #[error("execution failed: {message}")]
    ExecutionFailed {
        /// Description of the failure.
        message: String,
    },

    /// A DDL statement could not be applied.
    #[error("DDL failed for {object}: {message}")]
    DdlFailed {
        /// The qualified name of the object the DDL targeted.
        object: String,
        /// Description of the failure.
        message: String,
    },

    /// The session has been closed and cannot serve requests.
    #[error("session is closed")]
    Closed,

    /// Transport-level failure reaching the cluster.
    #[error("connection error: {message}")]
    Connection {
        /// Description of the failure.
        message: String,
    },
}

impl SessionError {
    /// Creates a prepare failure error.
    pub fn prepare_failed(message: impl Into<String>) -> Self {
        Self::PrepareFailed {
            message: message.into(),
        }
    }

    /// Creates an execution failure error.
    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            message: message.into(),
        }
    }

    /// Creates a DDL failure error.
    pub fn ddl_failed(object: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DdlFailed {
            object: object.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}
