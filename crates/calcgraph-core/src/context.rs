//! Company context of an evaluation

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclusive date range of a financial period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FinancialPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl FinancialPeriod {
    /// Create a period; `start` must not be after `end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidPeriod(format!("{}..{}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// January 1st through December 31st of `year`
    pub fn calendar_year(year: i32) -> Result<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| Error::InvalidPeriod(year.to_string()))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| Error::InvalidPeriod(year.to_string()))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Year the period ends in
    pub fn year(&self) -> i32 {
        self.end.year()
    }

    fn is_calendar_year(&self) -> bool {
        self.start.year() == self.end.year()
            && self.start.ordinal() == 1
            && self.end.month() == 12
            && self.end.day() == 31
    }
}

impl fmt::Display for FinancialPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_calendar_year() {
            write!(f, "{}", self.start.year())
        } else {
            write!(f, "{}..{}", self.start, self.end)
        }
    }
}

impl FromStr for FinancialPeriod {
    type Err = Error;

    /// Accepts `YYYY` or `YYYY-MM-DD..YYYY-MM-DD`
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some((start, end)) = s.split_once("..") {
            let parse = |part: &str| {
                NaiveDate::parse_from_str(part.trim(), "%Y-%m-%d")
                    .map_err(|_| Error::InvalidPeriod(s.to_string()))
            };
            return Self::new(parse(start)?, parse(end)?);
        }
        let year = s
            .parse::<i32>()
            .map_err(|_| Error::InvalidPeriod(s.to_string()))?;
        Self::calendar_year(year)
    }
}

impl TryFrom<String> for FinancialPeriod {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<FinancialPeriod> for String {
    fn from(period: FinancialPeriod) -> Self {
        period.to_string()
    }
}

/// Company, period and location an evaluation runs for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyContext {
    pub company_id: String,
    pub period: FinancialPeriod,
    pub location: String,
}

impl CompanyContext {
    pub fn new<C: Into<String>, L: Into<String>>(
        company_id: C,
        period: FinancialPeriod,
        location: L,
    ) -> Self {
        Self {
            company_id: company_id.into(),
            period,
            location: location.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_year() {
        let p: FinancialPeriod = "2024".parse().unwrap();
        assert_eq!(p.start(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(p.end(), NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert_eq!(p.to_string(), "2024");
        assert_eq!(p.year(), 2024);
    }

    #[test]
    fn test_parse_range() {
        let p: FinancialPeriod = "2023-04-01..2024-03-31".parse().unwrap();
        assert_eq!(p.to_string(), "2023-04-01..2024-03-31");
        assert_eq!(p.year(), 2024);
    }

    #[test]
    fn test_parse_inverted_range() {
        let err = "2024-04-01..2023-03-31".parse::<FinancialPeriod>().unwrap_err();
        assert!(matches!(err, Error::InvalidPeriod(_)));
        assert!("next year".parse::<FinancialPeriod>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let ctx = CompanyContext::new("acme", FinancialPeriod::calendar_year(2024).unwrap(), "berlin");
        let json = serde_json::to_string(&ctx).unwrap();
        assert_eq!(
            json,
            r#"{"companyId":"acme","period":"2024","location":"berlin"}"#
        );
        let back: CompanyContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ctx);
    }
}
