// 3rd party crates
use config::ConfigError;
use thiserror::Error;

// Project imports
use crate::settings::errors::ValidationError;
use crate::utility::bind::errors::BindError;

/// Errors that abort an invocation before any output is produced.
#[derive(Debug, Error)]
pub enum WutError {
    #[error("Options error: {0}")]
    Config(#[from] ConfigError),

    #[error("Options error: {0}")]
    Validation(#[from] ValidationError),

    #[error("error: {0}")]
    Bind(#[from] BindError),
}

impl WutError {
    /// Whether usage help should follow the message.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, WutError::Validation(_))
    }
}
