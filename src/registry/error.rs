//! Registry Error Types

use crate::core::error_handling::ContextualError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{kind} '{name}' is already registered")]
    AlreadyRegistered { kind: &'static str, name: String },

    #[error("No {kind} registered with name: {name}")]
    NotRegistered { kind: &'static str, name: String },

    /// The constructor ran and failed; its error is kept as the source
    #[error("{source}")]
    Construction {
        kind: &'static str,
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ContextualError for RegistryError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, RegistryError::Construction { .. })
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
