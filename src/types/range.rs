//! Inclusive calendar date range used as the dashboard filter

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{DatacentError, Result};

/// Wire format for `start`/`end` query parameters
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date range, `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DatacentError::InvalidRange(format!(
                "start {} is after end {}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
                DatacentError::InvalidRange(format!("'{}' is not a YYYY-MM-DD date", s.trim()))
            })
        };
        Self::new(parse(start)?, parse(end)?)
    }

    /// Build from optional CLI arguments; both or neither must be present
    pub fn from_args(start: Option<&str>, end: Option<&str>) -> Result<Option<Self>> {
        match (start, end) {
            (Some(s), Some(e)) => Self::parse(s, e).map(Some),
            (None, None) => Ok(None),
            _ => Err(DatacentError::InvalidRange(
                "both --start and --end are required".into(),
            )),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Query parameters in the order the backend documents them
    pub fn query_params(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format(DATE_FORMAT).to_string()),
            ("end", self.end.format(DATE_FORMAT).to_string()),
        ]
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} → {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}
