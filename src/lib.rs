//! # tickerstats
//!
//! Single-pass annual return and total volume per ticker over ordered daily trading records.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tickerstats::{aggregate, PercentReturn, TickerList, TradingRecord};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2018, 1, d).unwrap();
//! let tickers = TickerList::new(["AAA", "BBB"]).unwrap();
//! let records = vec![
//!     TradingRecord::new("AAA", day(2), 10.0, 12.0, 100),
//!     TradingRecord::new("AAA", day(3), 12.0, 15.0, 50),
//!     TradingRecord::new("BBB", day(2), 5.0, 4.0, 10),
//! ];
//!
//! let report = aggregate(tickers, records).unwrap();
//! let aaa = report.summary("AAA").unwrap();
//! assert_eq!(aaa.total_volume, 150);
//! assert_eq!(aaa.percent_return, PercentReturn::Defined(0.5));
//! ```
//!
//! ## Algorithm
//!
//! Records must arrive grouped into one contiguous, date-ascending run per ticker:
//!
//! 1. **Run open**: the first record of a run supplies the year-open price
//! 2. **Accumulate**: every record adds its volume and moves the year-close price
//! 3. **Run close**: a record with a different ticker (or end of input) finalizes the run
//!    and computes `(close - open) / open`
//!
//! Results are keyed by ticker identity. Runs that break the expected ordering are
//! reported as [`OrderViolation`]s, either collected or fatal depending on [`OrderPolicy`].

pub mod aggregator;
pub mod config;
pub mod csv_source;
pub mod report;
pub mod types;

// Re-export commonly used types for convenience
pub use aggregator::{
    ScanError, TickerAggregator, aggregate, aggregate_raw, aggregate_with_config,
};
pub use crate::config::{OrderPolicy, ScanConfig};
pub use csv_source::{CsvRecordSource, aggregate_csv};
pub use report::{
    OrderViolation, PercentReturn, ScanReport, TickerOutcome, TickerReport, TickerSummary,
    ViolationEntry,
};
pub use types::{RawRecord, TickerList, TradingRecord};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!NAME.is_empty());
        assert!(!DESCRIPTION.is_empty());
    }

    #[test]
    fn test_types_export() {
        let tickers = TickerList::new(["AY"]).unwrap();
        let report = TickerAggregator::new(tickers).finish();
        assert!(report.get("AY").unwrap().is_missing());
    }
}
