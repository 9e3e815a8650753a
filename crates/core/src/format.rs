//! Display helpers shared by pages.

use chrono::{DateTime, Utc};

/// Shorten a long identifier to `first8...last8`.
///
/// Inputs shorter than 16 characters are returned unchanged.
#[must_use]
pub fn shorten_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() < 16 {
        return id.to_owned();
    }
    let first: String = chars.iter().take(8).collect();
    let last: String = chars.iter().skip(chars.len() - 8).collect();
    format!("{first}...{last}")
}

/// `Jan 15, 2024 at 2:30 PM`
#[must_use]
pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y at %-I:%M %p").to_string()
}

/// `Jan 15, 2024`
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}
