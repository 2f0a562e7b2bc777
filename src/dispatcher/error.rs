//! Dispatcher Error Types

use crate::core::error_handling::ContextualError;
use crate::receiver::api::ReceiverError;
use crate::registry::api::RegistryError;
use crate::scanner::api::ScanError;
use crate::store::api::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Receiver(#[from] ReceiverError),

    #[error("Scanner '{scanner}' failed: {source}")]
    Scan {
        scanner: String,
        #[source]
        source: ScanError,
    },

    #[error("Empty task type")]
    EmptyType,

    #[error("Unknown task type '{name}' (expected {expected:?})")]
    UnknownType { name: String, expected: Vec<String> },

    #[error("Empty task target")]
    EmptyTarget,

    #[error("Unknown scanner '{name}' (expected {expected:?})")]
    UnknownScanner { name: String, expected: Vec<String> },

    #[error("Dispatcher internal error: {message}")]
    Internal { message: String },
}

impl ContextualError for DispatchError {
    fn is_user_actionable(&self) -> bool {
        match self {
            DispatchError::EmptyType
            | DispatchError::UnknownType { .. }
            | DispatchError::EmptyTarget
            | DispatchError::UnknownScanner { .. } => true,
            DispatchError::Registry(e) => e.is_user_actionable(),
            DispatchError::Store(e) => e.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
