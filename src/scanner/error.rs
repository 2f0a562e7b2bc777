//! Scanner Error Types

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Scan directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    #[error("{message}")]
    Failed { message: String },
}

impl crate::core::error_handling::ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, ScanError::MissingDirectory(_))
    }

    fn user_message(&self) -> Option<String> {
        match self {
            ScanError::MissingDirectory(_) => Some(self.to_string()),
            ScanError::Failed { .. } => None,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
