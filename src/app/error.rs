//! Application Error Types

use crate::core::config::ConfigError;
use crate::core::error_handling::ContextualError;
use crate::dispatcher::api::DispatchError;
use crate::registry::api::RegistryError;
use crate::store::api::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Unable to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Unable to render task: {0}")]
    Render(#[from] serde_json::Error),
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::Config(e) => e.is_user_actionable(),
            AppError::Store(e) => e.is_user_actionable(),
            AppError::Registry(e) => e.is_user_actionable(),
            AppError::Dispatch(e) => e.is_user_actionable(),
            AppError::TaskNotFound(_) => true,
            AppError::Runtime(_) | AppError::Render(_) => false,
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

pub type AppResult<T> = Result<T, AppError>;
