//! Task Store Error Types

use super::area::Area;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Unknown task area: '{0}'")]
    InvalidArea(String),

    #[error("Invalid task id: '{0}'")]
    InvalidTaskId(String),

    #[error("Task {id} not found in {area}")]
    NotFound { id: String, area: Area },

    #[error("Unable to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to decode task {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unable to encode task {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

impl crate::core::error_handling::ContextualError for StoreError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            StoreError::InvalidArea(_) | StoreError::InvalidTaskId(_) | StoreError::NotFound { .. }
        )
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}

/// Result type for task store operations
pub type StoreResult<T> = Result<T, StoreError>;
