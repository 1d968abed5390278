//! Canonical creation dates and normalization of Crossref payloads.
//!
//! Crossref reports `message.created.date-parts` as `[[year, month, day]]`
//! with trailing parts optional. Only year and month are kept: a payload
//! with at least two parts becomes `YYYY-MM`, a bare year becomes `YYYY`,
//! and anything else is [`CreatedDate::Unavailable`].

use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt;

/// Marker rendered for identifiers without a usable date
pub const UNAVAILABLE_MARKER: &str = "Not available";

/// Marker rendered for identifiers whose lookup failed
pub const ERROR_MARKER: &str = "Error";

/// A year with an optional month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
}

impl PartialDate {
    /// Year-only date
    pub fn year(year: i32) -> Self {
        Self { year, month: None }
    }

    /// Year-month date
    pub fn year_month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    /// Parse canonical text: `YYYY-MM` or `YYYY`.
    ///
    /// Returns `None` for markers, empty text, or anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (year_part, month_part) = match text.split_once('-') {
            Some((y, m)) => (y, Some(m)),
            None => (text, None),
        };

        if year_part.len() != 4 || !year_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year: i32 = year_part.parse().ok()?;

        match month_part {
            None => Some(Self::year(year)),
            Some(m) => {
                if m.len() != 2 || !m.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let month: u32 = m.parse().ok()?;
                (1..=12)
                    .contains(&month)
                    .then(|| Self::year_month(year, month))
            }
        }
    }

    /// First calendar day covered by this date (January for year-only dates)
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.unwrap_or(1), 1)
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{:04}-{:02}", self.year, month),
            None => write!(f, "{:04}", self.year),
        }
    }
}

/// Canonical result of one identifier lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreatedDate {
    /// `YYYY` or `YYYY-MM`
    Dated(PartialDate),
    /// Lookup succeeded but carried no usable date, or the identifier was blank
    Unavailable,
    /// Lookup failed (transport, timeout, non-success status)
    Error,
}

impl CreatedDate {
    /// Whether this is a real date
    pub fn is_dated(&self) -> bool {
        matches!(self, Self::Dated(_))
    }
}

impl fmt::Display for CreatedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dated(date) => fmt::Display::fmt(date, f),
            Self::Unavailable => f.write_str(UNAVAILABLE_MARKER),
            Self::Error => f.write_str(ERROR_MARKER),
        }
    }
}

// === Crossref payload shape ===

#[derive(Debug, Deserialize)]
struct WorkEnvelope {
    message: WorkMessage,
}

#[derive(Debug, Deserialize)]
struct WorkMessage {
    created: WorkCreated,
}

#[derive(Debug, Deserialize)]
struct WorkCreated {
    #[serde(rename = "date-parts")]
    date_parts: Vec<Vec<Option<i64>>>,
}

/// Normalize a decoded Crossref work payload. Never fails.
pub fn normalize(payload: &serde_json::Value) -> CreatedDate {
    match WorkEnvelope::deserialize(payload) {
        Ok(envelope) => from_date_parts(&envelope.message.created.date_parts),
        Err(_) => CreatedDate::Unavailable,
    }
}

/// Normalize a raw response body. Empty or non-JSON bodies are unavailable.
pub fn normalize_body(body: &str) -> CreatedDate {
    if body.trim().is_empty() {
        return CreatedDate::Unavailable;
    }
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(payload) => normalize(&payload),
        Err(_) => CreatedDate::Unavailable,
    }
}

fn from_date_parts(date_parts: &[Vec<Option<i64>>]) -> CreatedDate {
    let Some(parts) = date_parts.first() else {
        return CreatedDate::Unavailable;
    };

    let year = match parts.first().copied().flatten() {
        Some(y) if (0..=9999).contains(&y) => y as i32,
        _ => return CreatedDate::Unavailable,
    };

    if parts.len() < 2 {
        return CreatedDate::Dated(PartialDate::year(year));
    }

    match parts[1] {
        Some(m) if (1..=12).contains(&m) => {
            CreatedDate::Dated(PartialDate::year_month(year, m as u32))
        }
        _ => CreatedDate::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(parts: serde_json::Value) -> serde_json::Value {
        json!({ "status": "ok", "message": { "created": { "date-parts": parts } } })
    }

    #[test]
    fn test_normalize_year_month() {
        let date = normalize(&payload(json!([[2020, 5, 14]])));
        assert_eq!(date, CreatedDate::Dated(PartialDate::year_month(2020, 5)));
        assert_eq!(date.to_string(), "2020-05");
    }

    #[test]
    fn test_normalize_year_only() {
        let date = normalize(&payload(json!([[2020]])));
        assert_eq!(date.to_string(), "2020");
    }

    #[test]
    fn test_normalize_missing_fields() {
        assert_eq!(normalize(&json!({})), CreatedDate::Unavailable);
        assert_eq!(
            normalize(&json!({ "message": { "title": ["x"] } })),
            CreatedDate::Unavailable
        );
        assert_eq!(normalize(&payload(json!([]))), CreatedDate::Unavailable);
        assert_eq!(normalize(&payload(json!([[null]]))), CreatedDate::Unavailable);
        assert_eq!(normalize(&payload(json!([[2020, 13]]))), CreatedDate::Unavailable);
        assert_eq!(normalize(&payload(json!("2020"))), CreatedDate::Unavailable);
    }

    #[test]
    fn test_normalize_body() {
        assert_eq!(normalize_body(""), CreatedDate::Unavailable);
        assert_eq!(normalize_body("<html>"), CreatedDate::Unavailable);
        let body = r#"{"message":{"created":{"date-parts":[[1999,12,1]]}}}"#;
        assert_eq!(normalize_body(body).to_string(), "1999-12");
    }

    #[test]
    fn test_parse_canonical_text() {
        assert_eq!(PartialDate::parse("2019-01"), Some(PartialDate::year_month(2019, 1)));
        assert_eq!(PartialDate::parse(" 2019 "), Some(PartialDate::year(2019)));
        assert_eq!(PartialDate::parse("2019-1"), None);
        assert_eq!(PartialDate::parse("2019-00"), None);
        assert_eq!(PartialDate::parse(ERROR_MARKER), None);
        assert_eq!(PartialDate::parse(""), None);
    }

    #[test]
    fn test_first_day() {
        let date = PartialDate::year_month(2021, 7).first_day();
        assert_eq!(date, NaiveDate::from_ymd_opt(2021, 7, 1));
        let year_only = PartialDate::year(2021).first_day();
        assert_eq!(year_only, NaiveDate::from_ymd_opt(2021, 1, 1));
    }

    #[test]
    fn test_markers() {
        assert_eq!(CreatedDate::Unavailable.to_string(), "Not available");
        assert_eq!(CreatedDate::Error.to_string(), "Error");
        assert!(!CreatedDate::Error.is_dated());
    }
}
