use std::{fmt::Display, str::FromStr};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, thiserror::Error)]
#[error("Invalid date '{0}'. Expected YYYYMMDD")]
pub struct BidDateParseError(String);

/// A calendar day, written `YYYYMMDD` everywhere it leaves the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BidDate(NaiveDate);

impl BidDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// The previous calendar day.
    pub fn pred(&self) -> Self {
        // NaiveDate::MIN has no predecessor; unreachable for real run dates.
        Self(self.0.pred_opt().unwrap_or(self.0))
    }

    /// Inquiry bounds covering the whole day: `YYYYMMDD0000` to `YYYYMMDD2359`.
    pub fn inquiry_range(&self) -> (String, String) {
        (format!("{self}0000"), format!("{self}2359"))
    }
}

impl FromStr for BidDate {
    type Err = BidDateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BidDateParseError(s.to_string()));
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Self)
            .map_err(|_| BidDateParseError(s.to_string()))
    }
}

impl TryFrom<String> for BidDate {
    type Error = BidDateParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BidDate> for String {
    fn from(date: BidDate) -> Self {
        date.to_string()
    }
}

impl Display for BidDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

/// One bid announcement found by one keyword query.
///
/// Field order is the column order of the result files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub keyword: String,
    #[serde(default)]
    pub title: String,
    pub bid_number: Option<String>,
    pub url: Option<String>,
    pub date: BidDate,
}

impl Display for BidRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({}): {}",
            self.keyword,
            self.bid_number.as_deref().unwrap_or("-"),
            self.date,
            self.title
        )
    }
}
