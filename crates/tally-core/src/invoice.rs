//! Invoice number formatting.
//!
//! Invoice numbers look like `INV-1718000000000-000042`: the creation time in
//! unix milliseconds followed by a zero-padded value from a persistent
//! counter. The counter alone guarantees uniqueness; the timestamp keeps the
//! numbers human-sortable.

use chrono::{DateTime, Utc};

/// Prefix shared by every invoice number.
pub const INVOICE_PREFIX: &str = "INV";

/// Formats an invoice number from the sale time and a sequence value.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use tally_core::invoice::format_invoice_number;
///
/// let at = Utc.timestamp_millis_opt(1_718_000_000_123).unwrap();
/// assert_eq!(format_invoice_number(at, 42), "INV-1718000000123-000042");
/// ```
pub fn format_invoice_number(at: DateTime<Utc>, seq: i64) -> String {
    format!("{}-{}-{:06}", INVOICE_PREFIX, at.timestamp_millis(), seq)
}
