use std::time::Duration;

use metrics::{counter, histogram};

use crate::error::LeadIntakeError;
use crate::models::{IntakeOutcome, MirrorStatus};

/// Metric names emitted while processing webhook messages.
///
/// No recorder is installed by the library; with none set the `metrics`
/// macros are no-ops, so a binary opts in by installing an exporter.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    // Intake outcomes
    /// Webhook messages received
    pub messages_received_total: &'static str,
    /// New rows written to the primary worksheet
    pub leads_recorded_total: &'static str,
    /// Messages ignored as duplicates
    pub duplicates_total: &'static str,
    /// Messages rejected for bad input
    pub messages_rejected_total: &'static str,
    /// Time from validation to response
    pub processing_duration: &'static str,

    // Assignee worksheet copies
    /// Assignee-worksheet copy attempts
    pub mirror_writes_total: &'static str,

    // Sheet capacity
    /// Rows allocated on the primary worksheet
    pub rows_added_total: &'static str,

    // Error metrics
    /// Processing errors by kind
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            messages_received_total: "lead_intake_messages_received_total",
            leads_recorded_total: "lead_intake_leads_recorded_total",
            duplicates_total: "lead_intake_duplicates_total",
            messages_rejected_total: "lead_intake_messages_rejected_total",
            processing_duration: "lead_intake_processing_duration_seconds",

            mirror_writes_total: "lead_intake_mirror_writes_total",

            rows_added_total: "lead_intake_rows_added_total",

            errors_total: "lead_intake_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Count one inbound webhook message
    pub fn record_received(&self) {
        counter!(self.messages_received_total).increment(1);
    }

    /// Record how a message ended up, with the time it took
    pub fn record_outcome(&self, outcome: &IntakeOutcome, duration: Duration) {
        match outcome {
            IntakeOutcome::Duplicate { .. } => {
                counter!(self.duplicates_total).increment(1);
                histogram!(self.processing_duration, "outcome" => "duplicate").record(duration.as_secs_f64());
            }
            IntakeOutcome::Recorded { mirror, .. } => {
                counter!(self.leads_recorded_total).increment(1);
                histogram!(self.processing_duration, "outcome" => "recorded").record(duration.as_secs_f64());
                self.record_mirror(mirror);
            }
        }
    }

    /// Record the status of an assignee-worksheet copy
    pub fn record_mirror(&self, status: &MirrorStatus) {
        match status {
            MirrorStatus::NotRouted => {}
            MirrorStatus::Written { worksheet, .. } => {
                counter!(self.mirror_writes_total, "worksheet" => worksheet.clone(), "status" => "success")
                    .increment(1);
            }
            MirrorStatus::Failed { worksheet, .. } => {
                counter!(self.mirror_writes_total, "worksheet" => worksheet.clone(), "status" => "error")
                    .increment(1);
                counter!(self.errors_total, "type" => "mirror").increment(1);
            }
        }
    }

    /// Count rows allocated to make room for a new lead
    pub fn record_rows_added(&self, count: u32) {
        counter!(self.rows_added_total).increment(u64::from(count));
    }

    /// Record a failed message, split into rejected input and processing errors
    pub fn record_error(&self, error: &LeadIntakeError) {
        if error.is_input_error() {
            counter!(self.messages_rejected_total, "reason" => error_kind(error)).increment(1);
        } else {
            counter!(self.errors_total, "type" => error_kind(error)).increment(1);
        }
    }
}

/// Stable label for an error variant
#[must_use]
pub const fn error_kind(error: &LeadIntakeError) -> &'static str {
    match error {
        LeadIntakeError::MissingInput => "missing_input",
        LeadIntakeError::NoPhoneFound => "no_phone",
        LeadIntakeError::Store(_) | LeadIntakeError::WorksheetNotFound(_) => "store",
        LeadIntakeError::Auth(_) => "auth",
        LeadIntakeError::Http(_) => "http",
        LeadIntakeError::Io(_) => "io",
        LeadIntakeError::Serialization(_) => "serialization",
        LeadIntakeError::InvalidConfig(_) => "config",
        LeadIntakeError::Other(_) => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::default();
        assert_eq!(collector.leads_recorded_total, "lead_intake_leads_recorded_total");
        assert!(collector.processing_duration.ends_with("_seconds"));
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(error_kind(&LeadIntakeError::NoPhoneFound), "no_phone");
        assert_eq!(error_kind(&LeadIntakeError::WorksheetNotFound("x".into())), "store");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        let collector = MetricsCollector::default();
        collector.record_received();
        collector.record_rows_added(1);
        collector.record_error(&LeadIntakeError::MissingInput);
        collector.record_outcome(&IntakeOutcome::Duplicate { row: 3 }, Duration::from_millis(5));
    }
}
