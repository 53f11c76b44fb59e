//! Lead intake pipeline.
//!
//! One webhook message flows through: validate → extract → dedup against the
//! primary worksheet → grow capacity if needed → positional write → optional
//! best-effort copy to the assignee's worksheet.
//!
//! The primary worksheet is read and written under a single lock, so within
//! one process two messages never compute the same target row. Writers in
//! other processes are not coordinated.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::dates::DateNormalizer;
use crate::error::Result;
use crate::extract::PhoneExtractor;
use crate::metrics::MetricsCollector;
use crate::models::{InboundMessage, IntakeOutcome, LeadRecord, MirrorStatus, PhoneNumber};
use crate::routing::AssigneeRouter;
use crate::schema::leads;
use crate::store::{SheetStore, Worksheet, WorksheetSelector};
use crate::validation::InputValidator;

/// Turns message text into a [`LeadRecord`] without touching any store
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    extractor: PhoneExtractor,
    normalizer: DateNormalizer,
}

impl RecordBuilder {
    /// Create a builder with compiled extraction patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            extractor: PhoneExtractor::new()?,
            normalizer: DateNormalizer::new()?,
        })
    }

    /// Extract phone and contact date from `raw_text`.
    ///
    /// The serial is left at 0; it depends on where the row lands.
    pub fn build(&self, raw_text: &str, assigned_to: &str, now: NaiveDate) -> Result<LeadRecord> {
        let text = InputValidator::sanitize_text(raw_text);
        let phone = self.extractor.extract_phone(&text)?;
        let contact_date = self.normalizer.normalize(&text, now);

        debug!(phone = %phone, date = %contact_date, assigned_to, "Built lead record");
        Ok(LeadRecord::new(phone, contact_date, assigned_to))
    }
}

/// Locate an existing entry for `phone` in the phone column.
///
/// The `+`-prefixed form is searched first over the whole column, then the
/// bare form. Returns the one-based row of the first hit.
#[must_use]
pub fn find_duplicate(phone_column: &[String], phone: &PhoneNumber) -> Option<u32> {
    [phone.with_plus(), phone.without_plus()]
        .iter()
        .find_map(|form| phone_column.iter().position(|cell| cell == form))
        .map(|index| u32::try_from(index + 1).unwrap_or(u32::MAX))
}

/// Next serial for a worksheet whose serial column holds `serial_column`:
/// one past the largest all-digit value below the header, or 1.
#[must_use]
pub fn next_serial_from(serial_column: &[String]) -> u64 {
    serial_column
        .iter()
        .skip(leads::HEADER_ROWS as usize)
        .filter(|cell| !cell.is_empty() && cell.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|cell| cell.parse::<u64>().ok())
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Read a worksheet's serial column and compute its next serial
pub async fn next_serial(store: &dyn SheetStore, worksheet: &Worksheet) -> Result<u64> {
    let serials = store.column_values(worksheet, leads::SERIAL).await?;
    Ok(next_serial_from(&serials))
}

/// Processes webhook messages against a sheet store
pub struct LeadPipeline {
    store: Arc<dyn SheetStore>,
    builder: RecordBuilder,
    router: AssigneeRouter,
    primary: WorksheetSelector,
    write_lock: Mutex<()>,
    metrics: MetricsCollector,
}

impl LeadPipeline {
    /// Create a pipeline writing to `primary` in `store`
    pub fn new(store: Arc<dyn SheetStore>, router: AssigneeRouter, primary: WorksheetSelector) -> Result<Self> {
        Ok(Self {
            store,
            builder: RecordBuilder::new()?,
            router,
            primary,
            write_lock: Mutex::new(()),
            metrics: MetricsCollector::default(),
        })
    }

    /// Process one message, resolving relative dates against `now`.
    ///
    /// Input errors are returned before any store call. A failed primary
    /// write is returned as an error; a failed assignee copy is not.
    pub async fn process(&self, message: &InboundMessage, now: NaiveDate) -> Result<IntakeOutcome> {
        let start = Instant::now();
        self.metrics.record_received();

        let result = self.intake(message, now).await;
        match &result {
            Ok(outcome) => self.metrics.record_outcome(outcome, start.elapsed()),
            Err(e) => self.metrics.record_error(e),
        }
        result
    }

    async fn intake(&self, message: &InboundMessage, now: NaiveDate) -> Result<IntakeOutcome> {
        let raw_text = InputValidator::require_raw_text(message)?;
        let record = self.builder.build(raw_text, message.assignee(), now)?;

        let _guard = self.write_lock.lock().await;

        let primary = self.store.worksheet(&self.primary).await?;
        let phone_column = self.store.column_values(&primary, leads::PHONE).await?;

        if let Some(row) = find_duplicate(&phone_column, &record.phone) {
            info!(phone = %record.phone, row, "Duplicate lead ignored");
            return Ok(IntakeOutcome::Duplicate { row });
        }

        let extent = u32::try_from(phone_column.len())
            .unwrap_or(u32::MAX)
            .max(leads::HEADER_ROWS);
        let target_row = extent.saturating_add(1);

        if target_row > primary.row_count {
            let shortfall = target_row - primary.row_count;
            self.store.add_rows(&primary, shortfall).await?;
            self.metrics.record_rows_added(shortfall);
            debug!(worksheet = %primary.title, shortfall, "Grew worksheet capacity");
        }

        let record = record.with_serial(u64::from(extent));
        if let Err(e) = self.store.write_row(&primary, target_row, &record.to_row()).await {
            error!(worksheet = %primary.title, row = target_row, error = %e, "Primary write failed");
            return Err(e);
        }
        info!(
            worksheet = %primary.title,
            row = target_row,
            serial = record.serial,
            phone = %record.phone,
            "Lead recorded"
        );

        let mirror = self.mirror(&record).await;
        Ok(IntakeOutcome::Recorded {
            row: target_row,
            record,
            mirror,
        })
    }

    async fn mirror(&self, record: &LeadRecord) -> MirrorStatus {
        let Some(worksheet) = self.router.route(&record.assigned_to) else {
            return MirrorStatus::NotRouted;
        };

        match self.write_mirror(worksheet, record).await {
            Ok(serial) => {
                info!(worksheet, serial, "Lead copied to assignee worksheet");
                MirrorStatus::Written {
                    worksheet: worksheet.to_string(),
                    serial,
                }
            }
            Err(e) => {
                warn!(worksheet, error = %e, "Assignee worksheet copy failed");
                MirrorStatus::Failed {
                    worksheet: worksheet.to_string(),
                    error: e.to_string(),
                }
            }
        }
    }

    async fn write_mirror(&self, title: &str, record: &LeadRecord) -> Result<u64> {
        let worksheet = self
            .store
            .worksheet(&WorksheetSelector::Title(title.to_string()))
            .await?;
        let serial = next_serial(self.store.as_ref(), &worksheet).await?;
        self.store
            .append_row(&worksheet, &record.mirrored(serial).to_row())
            .await?;
        Ok(serial)
    }
}
