//! Error Types

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Submitted email fails the syntactic check
    #[error("Invalid email address")]
    InvalidEmail,

    /// Empty or malformed generation input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session state error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Payments provider lookup error
    #[error("Billing provider error: {0}")]
    Provider(String),

    /// Diagram pipeline failure
    #[error("Pipeline error: {0}")]
    Pipeline(String),

    /// Diagram pipeline exceeded the configured deadline
    #[error("Pipeline timed out after {0}s")]
    Timeout(u64),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoreError {
    /// Check if error is retryable by the user
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::Provider(_)
                | CoreError::Pipeline(_)
                | CoreError::Timeout(_)
                | CoreError::Io(_)
        )
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            CoreError::InvalidEmail => "Please enter a valid email address.".into(),
            CoreError::InvalidInput(field) => format!("Please fill in {}.", field),
            CoreError::Provider(_) => {
                "We could not reach the billing service. Please try again.".into()
            }
            CoreError::Pipeline(_) => {
                "Diagram generation failed. Please try again.".into()
            }
            CoreError::Timeout(secs) => format!(
                "Diagram generation did not finish within {}s. Please try again.",
                secs
            ),
            CoreError::Config(_) => "Service configuration error.".into(),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for CoreError {
    fn from(err: anyhow::Error) -> Self {
        CoreError::Session(err.to_string())
    }
}
