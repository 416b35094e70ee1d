//! Date cells: an ordered list of formats, first match wins.
//!
//! Exports often append a time ("2024-01-05 10:31:00", "2024-01-05T10:31:00");
//! when the whole cell fails every format the leading date token is tried.

use chrono::{Datelike, NaiveDate};

/// Years outside this range mean a format consumed a 2-digit year as `%Y`.
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2200;

fn try_formats(s: &str, formats: &[String]) -> Option<NaiveDate> {
    formats.iter().find_map(|f| {
        NaiveDate::parse_from_str(s, f)
            .ok()
            .filter(|d| (MIN_YEAR..=MAX_YEAR).contains(&d.year()))
    })
}

pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let s = raw.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }

    if let Some(d) = try_formats(s, formats) {
        return Some(d);
    }

    if let Some((head, _)) = s.split_once(char::is_whitespace) {
        if let Some(d) = try_formats(head, formats) {
            return Some(d);
        }
    }

    // ISO 8601 datetime
    if s.len() > 10 && s.as_bytes()[10] == b'T' {
        return try_formats(&s[..10], formats);
    }

    None
}
