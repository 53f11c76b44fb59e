//! Lead Intake - WhatsApp Lead Webhook
//!
//! A Rust library and service that turns forwarded WhatsApp notifications
//! into rows of a Google Sheets lead tracker.
//!
//! # Features
//!
//! - Phone number extraction from free text
//! - Relative contact-date resolution ("Yesterday", "Wed, 12 Jun")
//! - Duplicate detection on the phone column
//! - Capacity-aware positional writes to the primary worksheet
//! - Best-effort copies to per-assignee worksheets

/// Configuration management
pub mod config;
/// Contact-date normalization
pub mod dates;
/// Error types
pub mod error;
/// Phone number extraction
pub mod extract;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Intake pipeline
pub mod pipeline;
/// Assignee to worksheet routing
pub mod routing;
/// Worksheet column layout
pub mod schema;
/// Webhook HTTP server
pub mod server;
/// Sheet storage backends
pub mod store;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use error::{LeadIntakeError, Result};
pub use models::{InboundMessage, IntakeOutcome, LeadRecord, MirrorStatus, PhoneNumber};
pub use pipeline::{LeadPipeline, RecordBuilder};
pub use store::{GoogleSheetsStore, MemoryStore, SheetStore};
