//! Phone number extraction from forwarded chat notifications.

use regex::Regex;

use crate::error::{LeadIntakeError, Result};
use crate::models::PhoneNumber;

/// Loose international phone pattern: optional `+`, a 1-3 digit lead, then
/// 10-16 characters of digits, whitespace, hyphens or parentheses.
const PHONE_PATTERN: &str = r"\+?[0-9]{1,3}[\s0-9\-()]{10,16}";

/// Fewest digits a match must carry to count as a phone number
pub const MIN_PHONE_DIGITS: usize = 10;

/// Extracts the first phone-shaped substring from free text
#[derive(Debug, Clone)]
pub struct PhoneExtractor {
    phone_regex: Regex,
}

impl PhoneExtractor {
    /// Create a new extractor
    pub fn new() -> Result<Self> {
        let phone_regex = Regex::new(PHONE_PATTERN)
            .map_err(|e| LeadIntakeError::Other(format!("Failed to compile phone regex: {e}")))?;

        Ok(Self { phone_regex })
    }

    /// Pull the first phone number out of `raw_text`.
    ///
    /// Only the first qualifying match is used; later phone-shaped substrings
    /// are ignored. Formatting characters are stripped and a leading `+` kept.
    pub fn extract_phone(&self, raw_text: &str) -> Result<PhoneNumber> {
        let mut start = 0;
        while let Some(m) = self.phone_regex.find_at(raw_text, start) {
            let phone = PhoneNumber::from_match(m.as_str());
            if phone.digit_count() >= MIN_PHONE_DIGITS {
                tracing::debug!(phone = %phone, "Extracted phone number");
                return Ok(phone);
            }
            // A rejected match may overlap the real number; resume just past its start.
            start = m.start() + raw_text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }

        Err(LeadIntakeError::NoPhoneFound)
    }
}
