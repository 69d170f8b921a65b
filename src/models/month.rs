use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::TxnDate;
use crate::error::StoreError;

const MONTH_PATTERN: &str = r"^([0-9]{4})-(0[1-9]|1[0-2])$";

fn month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(MONTH_PATTERN).expect("month pattern is a valid regex"))
}

/// A budget period. Always rendered as zero-padded `YYYY-MM`, so a month
/// derived from a transaction date compares equal to a budget's month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn parse(s: &str) -> Result<Self, StoreError> {
        let invalid = || StoreError::validation("month", format!("'{s}' is not in YYYY-MM form"));
        let caps = month_regex().captures(s.trim()).ok_or_else(invalid)?;
        let year = caps[1].parse().map_err(|_| invalid())?;
        let month = caps[2].parse().map_err(|_| invalid())?;
        Ok(Self { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The month containing today's UTC date.
    pub fn current() -> Self {
        Self::of(chrono::Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn contains(&self, date: &TxnDate) -> bool {
        date.month() == *self
    }

    /// e.g. `"January 2025"`
    pub fn long_name(&self) -> String {
        match self.first_day() {
            Some(day) => day.format("%B %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for Month {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Month {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Month> for String {
    fn from(value: Month) -> Self {
        value.to_string()
    }
}
