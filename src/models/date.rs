use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::Month;
use crate::error::StoreError;

/// When an expense occurred.
///
/// Keeps the text the caller supplied so stored files round-trip unchanged,
/// alongside the parsed instant used for ordering and month grouping.
/// Date-times carrying an offset are normalised to UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TxnDate {
    raw: String,
    at: NaiveDateTime,
}

impl TxnDate {
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let raw = s.trim();
        let at = parse_instant(raw).ok_or_else(|| {
            StoreError::validation(
                "date",
                format!("'{s}' is not an ISO 8601 date (YYYY-MM-DD) or date-time"),
            )
        })?;
        Ok(Self {
            raw: raw.to_string(),
            at,
        })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            raw: date.format("%Y-%m-%d").to_string(),
            at: date.and_time(chrono::NaiveTime::MIN),
        }
    }

    /// Today's UTC calendar date.
    pub fn today() -> Self {
        Self::from_date(chrono::Utc::now().date_naive())
    }

    pub fn at(&self) -> NaiveDateTime {
        self.at
    }

    pub fn day(&self) -> NaiveDate {
        self.at.date()
    }

    pub fn month(&self) -> Month {
        Month::of(self.day())
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn parse_instant(s: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date.and_time(chrono::NaiveTime::MIN));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

impl std::fmt::Display for TxnDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for TxnDate {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TxnDate {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TxnDate> for String {
    fn from(value: TxnDate) -> Self {
        value.raw
    }
}
