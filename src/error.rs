//! Error types for the lead-intake library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur while turning a webhook message into a lead row.
#[derive(Error, Debug)]
pub enum LeadIntakeError {
    /// The request carried no `raw_text` field
    #[error("Missing raw_text")]
    MissingInput,

    /// No phone-shaped substring was found in the message text
    #[error("No phone number found")]
    NoPhoneFound,

    /// The sheet backend rejected or failed an operation
    #[error("{0}")]
    Store(String),

    /// A worksheet the pipeline needs does not exist
    #[error("Worksheet not found: {0}")]
    WorksheetNotFound(String),

    /// Service-account credentials could not be loaded or exchanged
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport-level HTTP failure talking to Google
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl LeadIntakeError {
    /// HTTP status the webhook answers with for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingInput | Self::NoPhoneFound => 400,
            _ => 500,
        }
    }

    /// True when the error was raised before any store interaction.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self, Self::MissingInput | Self::NoPhoneFound)
    }
}

/// Convenience type alias for Result with LeadIntakeError
pub type Result<T> = std::result::Result<T, LeadIntakeError>;

impl From<anyhow::Error> for LeadIntakeError {
    fn from(err: anyhow::Error) -> Self {
        LeadIntakeError::Other(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for LeadIntakeError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        LeadIntakeError::Auth(err.to_string())
    }
}
