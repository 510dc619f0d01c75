//! Single-pass per-ticker aggregation
//!
//! Records arrive grouped into contiguous runs, one run per ticker. A run opens on the
//! first record of a ticker and closes as soon as a record for a different ticker shows
//! up (or the input ends). Closing a run writes its summary into the slot of that ticker,
//! looked up by symbol, so a run that arrives out of list order still lands in the right
//! slot.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info, warn};

use crate::config::{OrderPolicy, ScanConfig};
use crate::report::{
    OrderViolation, PercentReturn, ScanReport, TickerOutcome, TickerReport, TickerSummary,
    ViolationEntry,
};
use crate::types::{RawRecord, TickerList, TradingRecord};

/// Scan failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScanError {
    #[error("Malformed record at row {position}: field '{field}' has invalid value '{value}'")]
    MalformedRecord {
        position: usize,
        field: &'static str,
        value: String,
    },

    #[error("Order violation at row {position}: {violation}")]
    OrderViolation {
        position: usize,
        violation: OrderViolation,
    },

    #[error("Total volume for '{ticker}' overflowed at row {position}")]
    VolumeOverflow { ticker: String, position: usize },

    #[error("Invalid ticker list: {0}")]
    InvalidTickerList(String),

    #[error("Record source error at row {position}: {message}")]
    Source { position: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Accumulator for the run currently being scanned
#[derive(Debug, Clone)]
struct OpenRun {
    ticker: String,
    /// `None` when the ticker is not listed and its rows are being skipped
    slot: Option<usize>,
    year_open: f64,
    year_close: f64,
    total_volume: u64,
    first_date: NaiveDate,
    last_date: NaiveDate,
    record_count: usize,
}

impl OpenRun {
    fn start(record: &TradingRecord, slot: Option<usize>) -> Self {
        Self {
            ticker: record.ticker.clone(),
            slot,
            year_open: record.open,
            year_close: record.close,
            total_volume: record.volume,
            first_date: record.date,
            last_date: record.date,
            record_count: 1,
        }
    }

    fn summary(&self) -> TickerSummary {
        TickerSummary {
            year_open: self.year_open,
            year_close: self.year_close,
            total_volume: self.total_volume,
            percent_return: PercentReturn::from_prices(self.year_open, self.year_close),
            first_date: self.first_date,
            last_date: self.last_date,
            record_count: self.record_count,
        }
    }
}

/// Streaming aggregator over ordered trading records
///
/// Feed records with [`process_record`](Self::process_record) (or in chunks with
/// [`process_records`](Self::process_records)) and call [`finish`](Self::finish) once the
/// input is exhausted. The result does not depend on how the input was chunked.
///
/// A ticker that shows up in two separate runs is reported as
/// [`OrderViolation::Reappeared`]; under [`OrderPolicy::Warn`] the later run replaces the
/// earlier one in the report.
#[derive(Debug)]
pub struct TickerAggregator {
    tickers: TickerList,
    config: ScanConfig,
    slots: Vec<TickerOutcome>,
    /// Slots whose run has been closed at least once
    closed: Vec<bool>,
    current: Option<OpenRun>,
    /// Highest slot that has started a run so far
    furthest_slot: Option<usize>,
    violations: Vec<ViolationEntry>,
    rows_seen: usize,
    rows_skipped: usize,
}

impl TickerAggregator {
    /// Create an aggregator with the default [`ScanConfig`]
    pub fn new(tickers: TickerList) -> Self {
        Self::with_config(tickers, ScanConfig::default())
    }

    /// Create an aggregator with an explicit configuration
    pub fn with_config(tickers: TickerList, config: ScanConfig) -> Self {
        let count = tickers.len();
        Self {
            tickers,
            config,
            slots: vec![TickerOutcome::NoData; count],
            closed: vec![false; count],
            current: None,
            furthest_slot: None,
            violations: Vec::new(),
            rows_seen: 0,
            rows_skipped: 0,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Ticker list the slots are aligned with
    pub fn tickers(&self) -> &TickerList {
        &self.tickers
    }

    /// Rows consumed so far
    pub fn rows_seen(&self) -> usize {
        self.rows_seen
    }

    /// Consume one record; a blank ticker or a negative or non-finite price aborts the scan
    pub fn process_record(&mut self, mut record: TradingRecord) -> Result<(), ScanError> {
        let position = self.rows_seen;
        self.rows_seen += 1;

        record.validate(position)?;
        if record.ticker.trim().len() != record.ticker.len() {
            record.ticker = record.ticker.trim().to_string();
        }

        if let Some(year) = self.config.year {
            if record.date.year() != year {
                self.rows_skipped += 1;
                return Ok(());
            }
        }

        let continues_run = self
            .current
            .as_ref()
            .is_some_and(|run| run.ticker == record.ticker);

        if continues_run {
            self.extend_run(record, position)
        } else {
            self.close_run();
            self.open_run(record, position)
        }
    }

    /// Consume a chunk of records
    pub fn process_records(&mut self, records: &[TradingRecord]) -> Result<(), ScanError> {
        for record in records {
            self.process_record(record.clone())?;
        }
        Ok(())
    }

    /// Parse and consume one unparsed row
    pub fn process_raw(&mut self, raw: &RawRecord) -> Result<(), ScanError> {
        let record = raw.parse(self.rows_seen)?;
        self.process_record(record)
    }

    /// Close the open run and produce the report
    pub fn finish(mut self) -> ScanReport {
        self.close_run();

        let tickers: Vec<TickerReport> = self
            .tickers
            .iter()
            .zip(self.slots)
            .map(|(ticker, outcome)| TickerReport {
                ticker: ticker.to_string(),
                outcome,
            })
            .collect();

        let missing = tickers.iter().filter(|t| t.outcome.is_missing()).count();
        info!(
            rows_seen = self.rows_seen,
            rows_skipped = self.rows_skipped,
            tickers = tickers.len(),
            missing,
            violations = self.violations.len(),
            "ticker scan complete"
        );

        ScanReport {
            tickers,
            violations: self.violations,
            rows_seen: self.rows_seen,
            rows_skipped: self.rows_skipped,
        }
    }

    fn open_run(&mut self, record: TradingRecord, position: usize) -> Result<(), ScanError> {
        let slot = self.tickers.position(&record.ticker);

        match slot {
            None => {
                self.flag(
                    position,
                    OrderViolation::UnknownTicker {
                        ticker: record.ticker.clone(),
                    },
                )?;
                self.rows_skipped += 1;
            }
            Some(slot) if self.closed[slot] => {
                self.flag(
                    position,
                    OrderViolation::Reappeared {
                        ticker: record.ticker.clone(),
                    },
                )?;
            }
            Some(slot) => {
                if let Some(furthest) = self.furthest_slot.filter(|&furthest| furthest > slot) {
                    let after = self.tickers.symbols()[furthest].clone();
                    self.flag(
                        position,
                        OrderViolation::OutOfOrder {
                            ticker: record.ticker.clone(),
                            after,
                        },
                    )?;
                }
                self.furthest_slot = Some(self.furthest_slot.map_or(slot, |f| f.max(slot)));
            }
        }

        self.current = Some(OpenRun::start(&record, slot));
        Ok(())
    }

    fn extend_run(&mut self, record: TradingRecord, position: usize) -> Result<(), ScanError> {
        let Some(run) = self.current.as_ref() else {
            return self.open_run(record, position);
        };

        // Rows of an unlisted ticker were already flagged once
        if self.config.check_dates && run.slot.is_some() && record.date <= run.last_date {
            let violation = OrderViolation::DateRegression {
                ticker: record.ticker.clone(),
                previous: run.last_date,
                date: record.date,
            };
            self.flag(position, violation)?;
        }

        let Some(run) = self.current.as_mut() else {
            return Ok(());
        };

        if run.slot.is_none() {
            run.last_date = record.date;
            self.rows_skipped += 1;
            return Ok(());
        }

        run.total_volume = run
            .total_volume
            .checked_add(record.volume)
            .ok_or_else(|| ScanError::VolumeOverflow {
                ticker: record.ticker.clone(),
                position,
            })?;
        run.year_close = record.close;
        run.last_date = record.date;
        run.record_count += 1;
        Ok(())
    }

    fn close_run(&mut self) {
        let Some(run) = self.current.take() else {
            return;
        };
        let Some(slot) = run.slot else {
            return;
        };

        let summary = run.summary();
        debug!(
            ticker = %run.ticker,
            records = summary.record_count,
            total_volume = summary.total_volume,
            percent_return = %summary.percent_return,
            "run closed"
        );

        self.slots[slot] = TickerOutcome::Data(summary);
        self.closed[slot] = true;
    }

    fn flag(&mut self, position: usize, violation: OrderViolation) -> Result<(), ScanError> {
        match self.config.policy {
            OrderPolicy::Strict => Err(ScanError::OrderViolation {
                position,
                violation,
            }),
            OrderPolicy::Warn => {
                warn!(position, %violation, "order violation");
                self.violations.push(ViolationEntry {
                    position,
                    violation,
                });
                Ok(())
            }
        }
    }
}

/// Aggregate a full record sequence with the default configuration
pub fn aggregate<I>(tickers: TickerList, records: I) -> Result<ScanReport, ScanError>
where
    I: IntoIterator<Item = TradingRecord>,
{
    aggregate_with_config(tickers, records, ScanConfig::default())
}

/// Aggregate a full record sequence with an explicit configuration
pub fn aggregate_with_config<I>(
    tickers: TickerList,
    records: I,
    config: ScanConfig,
) -> Result<ScanReport, ScanError>
where
    I: IntoIterator<Item = TradingRecord>,
{
    let mut aggregator = TickerAggregator::with_config(tickers, config);
    for record in records {
        aggregator.process_record(record)?;
    }
    Ok(aggregator.finish())
}

/// Parse and aggregate unparsed rows; the first malformed row aborts the scan
pub fn aggregate_raw<'a, I>(
    tickers: TickerList,
    rows: I,
    config: ScanConfig,
) -> Result<ScanReport, ScanError>
where
    I: IntoIterator<Item = &'a RawRecord>,
{
    let mut aggregator = TickerAggregator::with_config(tickers, config);
    for row in rows {
        aggregator.process_raw(row)?;
    }
    Ok(aggregator.finish())
}
