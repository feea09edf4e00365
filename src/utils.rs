// Utility functions
use chrono::NaiveDate;

/// Parses a day-first `DD-MM-YYYY` order date, if possible.
pub fn parse_order_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), "%d-%m-%Y").ok()
}
