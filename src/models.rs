//! Data models for lead intake
//!
//! This module contains the data structures that flow through the pipeline:
//! the inbound webhook message, the extracted phone number, the canonical
//! lead row, and the outcome reported back to the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dates::format_sheet_date;
use crate::schema::{self, leads};

/// Body of a webhook call
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Forwarded notification text
    #[serde(default)]
    pub raw_text: Option<String>,
    /// Person the lead is assigned to
    #[serde(default)]
    pub assigned_to: Option<String>,
}

impl InboundMessage {
    /// Build a message with the given text and no assignee
    #[must_use]
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: Some(raw_text.into()),
            assigned_to: None,
        }
    }

    /// Set the assignee
    #[must_use]
    pub fn assigned_to(mut self, name: impl Into<String>) -> Self {
        self.assigned_to = Some(name.into());
        self
    }

    /// Assignee name, falling back to "Not Assigned"
    #[must_use]
    pub fn assignee(&self) -> &str {
        self.assigned_to.as_deref().unwrap_or(schema::DEFAULT_ASSIGNEE)
    }
}

/// A phone number as extracted from text: ASCII digits, optionally led by `+`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Keep only digits and `+` from a raw match.
    #[must_use]
    pub fn from_match(raw: &str) -> Self {
        Self(raw.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect())
    }

    /// The stored form, exactly as extracted
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of digits, ignoring `+`
    #[must_use]
    pub fn digit_count(&self) -> usize {
        self.0.chars().filter(char::is_ascii_digit).count()
    }

    /// Form with a leading `+`
    #[must_use]
    pub fn with_plus(&self) -> String {
        if self.0.starts_with('+') {
            self.0.clone()
        } else {
            format!("+{}", self.0)
        }
    }

    /// Form with every `+` removed
    #[must_use]
    pub fn without_plus(&self) -> String {
        self.0.replace('+', "")
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single cell value as sent to the sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Numeric cell
    Number(u64),
    /// Text cell; empty for blank placeholders
    Text(String),
}

impl CellValue {
    /// Blank placeholder cell
    #[must_use]
    pub const fn blank() -> Self {
        Self::Text(String::new())
    }

    /// Text content as the sheet would render it
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Canonical lead row before placement in a worksheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadRecord {
    /// Sequence number; assigned when the row is placed
    pub serial: u64,
    /// Approximate first-contact date
    pub contact_date: NaiveDate,
    /// Extracted phone number
    pub phone: PhoneNumber,
    /// Assignee name, blank in mirrored copies
    pub assigned_to: String,
}

impl LeadRecord {
    /// Assemble a record from extracted fields; the serial is filled in at write time.
    #[must_use]
    pub fn new(phone: PhoneNumber, contact_date: NaiveDate, assigned_to: impl Into<String>) -> Self {
        Self {
            serial: 0,
            contact_date,
            phone,
            assigned_to: assigned_to.into(),
        }
    }

    /// Same record with a sequence number
    #[must_use]
    pub fn with_serial(&self, serial: u64) -> Self {
        Self {
            serial,
            ..self.clone()
        }
    }

    /// Copy for an assignee worksheet: own serial, assignee blanked
    #[must_use]
    pub fn mirrored(&self, serial: u64) -> Self {
        Self {
            serial,
            assigned_to: String::new(),
            ..self.clone()
        }
    }

    /// Render the record as the fixed-width row A..P.
    #[must_use]
    pub fn to_row(&self) -> Vec<CellValue> {
        let mut row = vec![CellValue::blank(); leads::WIDTH];
        row[schema::column_index(leads::SERIAL)] = CellValue::Number(self.serial);
        row[schema::column_index(leads::DATE)] = CellValue::Text(format_sheet_date(self.contact_date));
        row[schema::column_index(leads::PHONE)] = CellValue::Text(self.phone.as_str().to_string());
        row[schema::column_index(leads::CHANNEL)] = CellValue::from(schema::CHANNEL_WHATSAPP);
        row[schema::column_index(leads::ASSIGNEE)] = CellValue::Text(self.assigned_to.clone());
        row
    }
}

/// What happened to the assignee-worksheet copy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MirrorStatus {
    /// Assignee has no worksheet of their own
    NotRouted,
    /// Copy appended with its own serial
    Written {
        /// Destination worksheet title
        worksheet: String,
        /// Serial assigned within that worksheet
        serial: u64,
    },
    /// Copy failed; the primary row is already stored
    Failed {
        /// Destination worksheet title
        worksheet: String,
        /// Error text
        error: String,
    },
}

/// Result of processing one webhook message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IntakeOutcome {
    /// The phone number is already in the primary worksheet
    Duplicate {
        /// One-based row holding the existing entry
        row: u32,
    },
    /// A new row was written
    Recorded {
        /// One-based row written in the primary worksheet
        row: u32,
        /// The record as written
        record: LeadRecord,
        /// Assignee-worksheet copy status
        mirror: MirrorStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> LeadRecord {
        LeadRecord::new(
            PhoneNumber::from_match("+91 98765 43210"),
            NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
            "Dattu",
        )
    }

    #[test]
    fn test_phone_forms() {
        let phone = PhoneNumber::from_match("+91 (98765)-43210");
        assert_eq!(phone.as_str(), "+919876543210");
        assert_eq!(phone.with_plus(), "+919876543210");
        assert_eq!(phone.without_plus(), "919876543210");
        assert_eq!(phone.digit_count(), 12);

        let bare = PhoneNumber::from_match("98765 43210");
        assert_eq!(bare.with_plus(), "+9876543210");
        assert_eq!(bare.without_plus(), "9876543210");
    }

    #[test]
    fn test_row_layout() {
        let row = record().with_serial(42).to_row();
        assert_eq!(row.len(), 16);
        assert_eq!(row[0], CellValue::Number(42));
        assert_eq!(row[1], CellValue::from("Jun 14, 2024"));
        assert_eq!(row[2], CellValue::blank());
        assert_eq!(row[3], CellValue::from("+919876543210"));
        assert_eq!(row[4], CellValue::blank());
        assert_eq!(row[5], CellValue::from("Whatsapp"));
        assert!(row[6..15].iter().all(|c| *c == CellValue::blank()));
        assert_eq!(row[15], CellValue::from("Dattu"));
    }

    #[test]
    fn test_mirrored_copy_blanks_assignee() {
        let mirrored = record().with_serial(42).mirrored(3);
        assert_eq!(mirrored.serial, 3);
        assert_eq!(mirrored.assigned_to, "");
        assert_eq!(mirrored.to_row()[15], CellValue::blank());
    }

    #[test]
    fn test_cells_serialize_as_plain_json() {
        let json = serde_json::to_string(&vec![CellValue::Number(7), CellValue::from("x")]).unwrap();
        assert_eq!(json, r#"[7,"x"]"#);
    }

    #[test]
    fn test_default_assignee() {
        let msg: InboundMessage = serde_json::from_str(r#"{"raw_text":"hi"}"#).unwrap();
        assert_eq!(msg.assignee(), "Not Assigned");
        let msg: InboundMessage = serde_json::from_str(r#"{"raw_text":"hi","assigned_to":"Dattu"}"#).unwrap();
        assert_eq!(msg.assignee(), "Dattu");
    }
}
