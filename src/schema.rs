//! Sheet schema definitions
//!
//! Column letters and fixed values for the lead tracker layout. The primary
//! worksheet and every per-assignee worksheet share this layout.

/// Lead tracker column layout
pub mod leads {
    /// Number of header rows above the data
    pub const HEADER_ROWS: u32 = 1;
    /// Number of cells written per lead row (A through P)
    pub const WIDTH: usize = 16;
    /// First written column
    pub const FIRST_COLUMN: char = 'A';
    /// Last written column
    pub const LAST_COLUMN: char = 'P';
    /// Sequence number column
    pub const SERIAL: char = 'A';
    /// Formatted contact date column
    pub const DATE: char = 'B';
    /// Phone number column, the deduplication key
    pub const PHONE: char = 'D';
    /// Channel column
    pub const CHANNEL: char = 'F';
    /// Assignee column
    pub const ASSIGNEE: char = 'P';
}

/// Value written to the channel column for every lead
pub const CHANNEL_WHATSAPP: &str = "Whatsapp";

/// Assignee used when the webhook does not name one
pub const DEFAULT_ASSIGNEE: &str = "Not Assigned";

/// Zero-based cell index of a column letter within a lead row.
#[must_use]
pub const fn column_index(column: char) -> usize {
    (column as u8 - b'A') as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_consistent() {
        assert_eq!(column_index(leads::SERIAL), 0);
        assert_eq!(column_index(leads::PHONE), 3);
        assert_eq!(column_index(leads::CHANNEL), 5);
        assert_eq!(column_index(leads::LAST_COLUMN) + 1, leads::WIDTH);
        assert_eq!(leads::ASSIGNEE, leads::LAST_COLUMN);
    }
}
