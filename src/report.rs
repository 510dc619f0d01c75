//! Scan results, one entry per listed ticker

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Annual return of a ticker, or the reason it cannot be computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PercentReturn {
    /// `(year_close - year_open) / year_open`
    Defined(f64),
    /// `year_open` was zero, or the ratio is not a finite number
    Undefined,
}

impl PercentReturn {
    pub fn from_prices(year_open: f64, year_close: f64) -> Self {
        if year_open == 0.0 {
            return Self::Undefined;
        }
        let ratio = (year_close - year_open) / year_open;
        if ratio.is_finite() {
            Self::Defined(ratio)
        } else {
            Self::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Defined(value) => Some(*value),
            Self::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }
}

impl fmt::Display for PercentReturn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defined(value) => write!(f, "{:.2}%", value * 100.0),
            Self::Undefined => write!(f, "undefined"),
        }
    }
}

/// Finalized statistics for one ticker's run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSummary {
    pub year_open: f64,
    pub year_close: f64,
    pub total_volume: u64,
    pub percent_return: PercentReturn,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub record_count: usize,
}

/// Result slot state
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TickerOutcome {
    Data(TickerSummary),
    /// Listed ticker never appeared in the stream
    NoData,
}

impl TickerOutcome {
    pub fn summary(&self) -> Option<&TickerSummary> {
        match self {
            Self::Data(summary) => Some(summary),
            Self::NoData => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerReport {
    pub ticker: String,
    pub outcome: TickerOutcome,
}

/// Ordering problem detected while scanning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderViolation {
    /// A ticker started a second, non-contiguous run
    Reappeared { ticker: String },
    /// Run started after a run for a ticker listed later
    OutOfOrder { ticker: String, after: String },
    /// Row ticker is not in the ticker list
    UnknownTicker { ticker: String },
    /// Date did not increase within a run
    DateRegression {
        ticker: String,
        previous: NaiveDate,
        date: NaiveDate,
    },
}

impl fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reappeared { ticker } => {
                write!(f, "ticker '{}' reappeared after its run closed", ticker)
            }
            Self::OutOfOrder { ticker, after } => write!(
                f,
                "run for '{}' arrived after '{}', which is listed later",
                ticker, after
            ),
            Self::UnknownTicker { ticker } => write!(f, "ticker '{}' is not listed", ticker),
            Self::DateRegression {
                ticker,
                previous,
                date,
            } => write!(
                f,
                "date {} for '{}' does not follow {}",
                date, ticker, previous
            ),
        }
    }
}

/// Non-fatal violation with the row position where it was seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolationEntry {
    pub position: usize,
    pub violation: OrderViolation,
}

/// Output of one scan, aligned with the ticker list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub tickers: Vec<TickerReport>,
    pub violations: Vec<ViolationEntry>,
    /// Rows consumed, including skipped ones
    pub rows_seen: usize,
    /// Rows dropped by the year filter or for an unlisted ticker
    pub rows_skipped: usize,
}

impl ScanReport {
    pub fn get(&self, ticker: &str) -> Option<&TickerOutcome> {
        self.tickers
            .iter()
            .find(|report| report.ticker == ticker)
            .map(|report| &report.outcome)
    }

    pub fn summary(&self, ticker: &str) -> Option<&TickerSummary> {
        self.get(ticker).and_then(TickerOutcome::summary)
    }

    /// Total volume per slot, `None` for tickers without data
    pub fn total_volumes(&self) -> Vec<Option<u64>> {
        self.tickers
            .iter()
            .map(|report| report.outcome.summary().map(|s| s.total_volume))
            .collect()
    }

    /// Percent return per slot, `None` for tickers without data
    pub fn percent_returns(&self) -> Vec<Option<PercentReturn>> {
        self.tickers
            .iter()
            .map(|report| report.outcome.summary().map(|s| s.percent_return))
            .collect()
    }

    pub fn missing_tickers(&self) -> impl Iterator<Item = &str> {
        self.tickers
            .iter()
            .filter(|report| report.outcome.is_missing())
            .map(|report| report.ticker.as_str())
    }

    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(year_open: f64, year_close: f64, total_volume: u64) -> TickerSummary {
        let date = NaiveDate::from_ymd_opt(2018, 1, 2).unwrap();
        TickerSummary {
            year_open,
            year_close,
            total_volume,
            percent_return: PercentReturn::from_prices(year_open, year_close),
            first_date: date,
            last_date: date,
            record_count: 1,
        }
    }

    #[test]
    fn test_percent_return() {
        assert_eq!(PercentReturn::from_prices(10.0, 15.0), PercentReturn::Defined(0.5));
        assert_eq!(PercentReturn::from_prices(0.0, 15.0), PercentReturn::Undefined);
        assert_eq!(PercentReturn::from_prices(f64::NAN, 15.0), PercentReturn::Undefined);
        assert_eq!(PercentReturn::from_prices(2.0, f64::INFINITY), PercentReturn::Undefined);
        assert_eq!(PercentReturn::Undefined.value(), None);
        assert_eq!(PercentReturn::Defined(0.25).to_string(), "25.00%");
        assert_eq!(PercentReturn::Undefined.to_string(), "undefined");
    }

    #[test]
    fn test_report_views() {
        let report = ScanReport {
            tickers: vec![
                TickerReport {
                    ticker: "AY".to_string(),
                    outcome: TickerOutcome::Data(summary(20.0, 22.0, 500)),
                },
                TickerReport {
                    ticker: "CSIQ".to_string(),
                    outcome: TickerOutcome::NoData,
                },
            ],
            violations: Vec::new(),
            rows_seen: 1,
            rows_skipped: 0,
        };

        assert_eq!(report.total_volumes(), vec![Some(500), None]);
        assert_eq!(report.summary("AY").map(|s| s.year_close), Some(22.0));
        assert!(report.get("CSIQ").unwrap().is_missing());
        assert!(report.get("DQ").is_none());
        assert_eq!(report.missing_tickers().collect::<Vec<_>>(), vec!["CSIQ"]);
        assert!(report.is_clean());
    }

    #[test]
    fn test_violation_display() {
        let violation = OrderViolation::OutOfOrder {
            ticker: "AY".to_string(),
            after: "DQ".to_string(),
        };
        assert_eq!(
            violation.to_string(),
            "run for 'AY' arrived after 'DQ', which is listed later"
        );
    }
}
