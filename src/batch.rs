use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_YEAR: i32 = 2035;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month as the two-digit code the UI hands around (`"02"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthCode(u32);

impl MonthCode {
    pub fn new(month: u32) -> Result<Self, ValidationError> {
        if (1..=12).contains(&month) {
            Ok(Self(month))
        } else {
            Err(ValidationError::InvalidMonth(month.to_string()))
        }
    }

    /// Exactly two ASCII digits in `01..=12`; `"2"` and `"002"` are rejected.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidMonth(code.to_owned());
        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let month: u32 = code.parse().map_err(|_| invalid())?;
        Self::new(month).map_err(|_| invalid())
    }

    pub fn number(self) -> u32 {
        self.0
    }

    pub fn code(self) -> String {
        format!("{:02}", self.0)
    }

    pub fn name(self) -> &'static str {
        MONTH_NAMES[(self.0 - 1) as usize]
    }

    /// The months offered in the exploration view: January and December
    /// have no complete data and are left out.
    pub fn explorable() -> impl Iterator<Item = MonthCode> {
        (2..=11).map(MonthCode)
    }

    pub fn matches(self, date: NaiveDate) -> bool {
        date.month() == self.0
    }
}

impl Default for MonthCode {
    fn default() -> Self {
        MonthCode(2)
    }
}

impl FromStr for MonthCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MonthCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MonthCode> for String {
    fn from(month: MonthCode) -> Self {
        month.code()
    }
}

impl fmt::Display for MonthCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// The half-open window `[start, start + 1 month)` one fetch covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthBatch {
    start: NaiveDate,
    end: NaiveDate,
}

impl MonthBatch {
    pub fn new(year: i32, month: MonthCode) -> Result<Self, ValidationError> {
        let start = NaiveDate::from_ymd_opt(year, month.number(), 1)
            .ok_or(ValidationError::InvalidYear(year))?;
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or(ValidationError::InvalidYear(year))?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn month(&self) -> MonthCode {
        MonthCode(self.start.month())
    }

    /// Key of the pivot table's outer level.
    pub fn date_key(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("start_date", self.start.format("%Y-%m-%d").to_string()),
            ("end_date", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_codes_need_two_digits_in_range() {
        assert_eq!(MonthCode::parse("03").unwrap().number(), 3);
        assert_eq!(MonthCode::parse("12").unwrap().name(), "December");
        for bad in ["13", "00", "3", "003", "1a", "", " 3"] {
            assert_eq!(
                MonthCode::parse(bad),
                Err(ValidationError::InvalidMonth(bad.to_owned())),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn batch_is_half_open_and_rolls_over_the_year() {
        let batch = MonthBatch::new(2035, MonthCode::parse("12").unwrap()).unwrap();
        assert_eq!(batch.date_key(), "2035-12-01");
        assert_eq!(batch.end(), NaiveDate::from_ymd_opt(2036, 1, 1).unwrap());
        assert!(batch.contains(NaiveDate::from_ymd_opt(2035, 12, 31).unwrap()));
        assert!(!batch.contains(batch.end()));
        assert_eq!(
            batch.query(),
            [
                ("start_date", "2035-12-01".to_owned()),
                ("end_date", "2036-01-01".to_owned())
            ]
        );
    }

    #[test]
    fn explorable_months_skip_january_and_december() {
        let codes: Vec<String> = MonthCode::explorable().map(MonthCode::code).collect();
        assert_eq!(codes.first().map(String::as_str), Some("02"));
        assert_eq!(codes.last().map(String::as_str), Some("11"));
        assert_eq!(codes.len(), 10);
    }

    #[test]
    fn month_code_serializes_as_its_code() {
        let json = serde_json::to_string(&MonthCode::parse("07").unwrap()).unwrap();
        assert_eq!(json, "\"07\"");
        assert!(serde_json::from_str::<MonthCode>("\"13\"").is_err());
    }
}
