// Utility functions
use chrono::{DateTime, Utc};

use crate::model::Currency;

/// Converts an RFC 3339 string to `DateTime<Utc>` when possible.
pub fn parse_datetime(date_str: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(date_str.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a scraped price such as `$1,299.50` or `Bs. 1.234,56`.
///
/// Dollar prices use `,` as a thousands separator. Otherwise, when both
/// separators appear the rightmost one is the decimal mark, and a lone comma
/// is a decimal mark.
pub fn parse_price(text: &str, currency: Currency) -> Option<f64> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    // "Bs." leaves a leading separator behind.
    let digits = digits.trim_start_matches([',', '.']).trim_end_matches([',', '.']);
    if !digits.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let canonical = match currency {
        Currency::Usd => digits.replace(',', ""),
        Currency::Ves | Currency::Bsd => match (digits.rfind(','), digits.rfind('.')) {
            (Some(comma), Some(dot)) if comma > dot => digits.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => digits.replace(',', ""),
            (Some(_), None) => digits.replace(',', "."),
            _ => digits.to_string(),
        },
    };
    canonical.parse::<f64>().ok().filter(|p| p.is_finite() && *p >= 0.0)
}
