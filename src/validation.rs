use anyhow::{anyhow, Result};
use unicode_normalization::UnicodeNormalization;

use crate::error::LeadIntakeError;
use crate::models::InboundMessage;

/// Longest worksheet title Google Sheets accepts
const MAX_WORKSHEET_TITLE: usize = 100;

/// Validation utilities for input sanitization and edge case handling
#[derive(Debug, Copy, Clone)]
pub struct InputValidator;

impl InputValidator {
    /// Return the message text, or `MissingInput` when the field is absent.
    ///
    /// An empty string is present; it simply yields no phone number later.
    pub fn require_raw_text(message: &InboundMessage) -> Result<&str, LeadIntakeError> {
        message.raw_text.as_deref().ok_or(LeadIntakeError::MissingInput)
    }

    /// Sanitize text input
    ///
    /// Applies NFKC normalization so full-width digits and compatibility
    /// punctuation read as ASCII, then drops control characters other than
    /// line breaks and tabs.
    #[must_use]
    pub fn sanitize_text(text: &str) -> String {
        text.nfkc()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Validate an assignee name used in routing rules
    pub fn validate_assignee(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(anyhow!("Assignee name cannot be empty"));
        }

        if name.len() > 100 {
            return Err(anyhow!("Assignee name too long (max 100 characters)"));
        }

        if name.chars().any(char::is_control) {
            return Err(anyhow!("Assignee name contains invalid characters"));
        }

        Ok(())
    }

    /// Validate a worksheet title
    pub fn validate_worksheet_title(title: &str) -> Result<()> {
        if title.trim().is_empty() {
            return Err(anyhow!("Worksheet title cannot be empty"));
        }

        if title.chars().count() > MAX_WORKSHEET_TITLE {
            return Err(anyhow!("Worksheet title too long (max {MAX_WORKSHEET_TITLE} characters)"));
        }

        if title.chars().any(char::is_control) {
            return Err(anyhow!("Worksheet title contains invalid characters"));
        }

        Ok(())
    }

    /// Validate log level name
    pub fn validate_log_level(level: &str) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&level) {
            return Err(anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                level,
                valid_levels
            ));
        }
        Ok(())
    }
}
