//! Receiver Error Types

use crate::core::error_handling::ContextualError;
use std::path::PathBuf;

/// Failures reported by a container engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Unable to connect to container engine at {address}: {message}")]
    Connection { address: String, message: String },

    #[error("{operation} failed: {source}")]
    Api {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl EngineError {
    pub fn api(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        EngineError::Api {
            operation,
            source: source.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Unable to fetch {target}: {source}")]
    Fetch {
        target: String,
        #[source]
        source: EngineError,
    },

    #[error("Unable to create {target} snapshot: {source}")]
    Snapshot {
        target: String,
        #[source]
        source: Box<ReceiverError>,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Archive consumer stopped before the stream was fully written")]
    PipeClosed,

    #[error("Unable to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Archive extraction worker failed: {0}")]
    Worker(String),
}

impl ReceiverError {
    pub(crate) fn io(
        operation: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> ReceiverError {
        let path = path.into();
        move |source| ReceiverError::Io {
            operation,
            path,
            source,
        }
    }
}

impl ContextualError for ReceiverError {
    fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ReceiverError::InvalidReference { .. } | ReceiverError::Fetch { .. }
        )
    }

    fn user_message(&self) -> Option<String> {
        match self {
            ReceiverError::InvalidReference { .. } | ReceiverError::Fetch { .. } => {
                Some(self.to_string())
            }
            _ => None,
        }
    }
}

pub type ReceiverResult<T> = Result<T, ReceiverError>;
