//! CSV row source for the aggregator
//!
//! Wraps any [`std::io::Read`] holding headered CSV and yields rows in input order.
//! Columns are matched by header name (`ticker`, `date`, `open`, `close`, `volume`,
//! case variants accepted); extra columns such as `High`, `Low` or `Adj Close` are ignored.

use std::io::Read;

use csv::{DeserializeRecordsIntoIter, ReaderBuilder, Trim};

use crate::aggregator::{ScanError, TickerAggregator};
use crate::config::ScanConfig;
use crate::report::ScanReport;
use crate::types::{RawRecord, TickerList, TradingRecord};

/// Iterator of unparsed rows read from CSV
pub struct CsvRecordSource<R: Read> {
    rows: DeserializeRecordsIntoIter<R, RawRecord>,
    position: usize,
}

impl<R: Read> CsvRecordSource<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        Self {
            rows: csv_reader.into_deserialize(),
            position: 0,
        }
    }

    /// Parse each row into a [`TradingRecord`]
    pub fn records(self) -> impl Iterator<Item = Result<TradingRecord, ScanError>> {
        self.enumerate()
            .map(|(position, row)| row.and_then(|raw| raw.parse(position)))
    }
}

impl<R: Read> Iterator for CsvRecordSource<R> {
    type Item = Result<RawRecord, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        let position = self.position;
        self.position += 1;

        Some(row.map_err(|e| ScanError::Source {
            position,
            message: e.to_string(),
        }))
    }
}

/// Read, parse and aggregate a whole CSV input in one pass
pub fn aggregate_csv<R: Read>(
    tickers: TickerList,
    reader: R,
    config: ScanConfig,
) -> Result<ScanReport, ScanError> {
    let mut aggregator = TickerAggregator::with_config(tickers, config);
    for row in CsvRecordSource::new(reader) {
        aggregator.process_raw(&row?)?;
    }
    Ok(aggregator.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::PercentReturn;

    const SHEET: &str = "\
Ticker,Date,Open,High,Low,Close,Adj Close,Volume
AY,2018-01-02,22.0,22.5,21.9,22.2,20.1,1000
AY,2018-01-03,22.2,22.9,22.0,24.2,21.8,1500
CSIQ,2018-01-02,17.0,17.4,16.8,17.2,17.2,800
CSIQ,2018-01-03,17.2,17.3,16.0,13.6,13.6,700
";

    #[test]
    fn test_reads_rows_in_order() {
        let rows: Vec<RawRecord> = CsvRecordSource::new(SHEET.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], RawRecord::new("AY", "2018-01-02", "22.0", "22.2", "1000"));
        assert_eq!(rows[3].ticker, "CSIQ");
    }

    #[test]
    fn test_records_are_parsed() {
        let records: Vec<TradingRecord> = CsvRecordSource::new(SHEET.as_bytes())
            .records()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(records[1].close, 24.2);
        assert_eq!(records[2].volume, 800);
    }

    #[test]
    fn test_aggregate_csv() {
        let tickers = TickerList::new(["AY", "CSIQ"]).unwrap();
        let report = aggregate_csv(tickers, SHEET.as_bytes(), ScanConfig::default()).unwrap();

        let ay = report.summary("AY").unwrap();
        assert_eq!(ay.total_volume, 2500);
        assert!((ay.percent_return.value().unwrap() - 0.1).abs() < 1e-9);

        let csiq = report.summary("CSIQ").unwrap();
        assert_eq!(csiq.total_volume, 1500);
        assert!((csiq.percent_return.value().unwrap() - (-0.2)).abs() < 1e-9);
        assert_ne!(csiq.percent_return, PercentReturn::Undefined);
    }

    #[test]
    fn test_lowercase_headers() {
        let sheet = "ticker,date,open,close,volume\nDQ,20180102,36.0,36.0,10\n";
        let tickers = TickerList::new(["DQ"]).unwrap();
        let report = aggregate_csv(tickers, sheet.as_bytes(), ScanConfig::default()).unwrap();
        assert_eq!(report.summary("DQ").unwrap().total_volume, 10);
    }

    #[test]
    fn test_non_numeric_volume_names_row() {
        let sheet = "Ticker,Date,Open,Close,Volume\nDQ,2018-01-02,1,1,10\nDQ,2018-01-03,1,1,lots\n";
        let tickers = TickerList::new(["DQ"]).unwrap();
        let result = aggregate_csv(tickers, sheet.as_bytes(), ScanConfig::default());

        assert_eq!(
            result,
            Err(ScanError::MalformedRecord {
                position: 1,
                field: "volume",
                value: "lots".to_string()
            })
        );
    }

    #[test]
    fn test_missing_column_is_source_error() {
        let sheet = "Ticker,Date,Open,Close\nDQ,2018-01-02,1,1\n";
        let tickers = TickerList::new(["DQ"]).unwrap();
        let result = aggregate_csv(tickers, sheet.as_bytes(), ScanConfig::default());
        assert!(matches!(result, Err(ScanError::Source { position: 0, .. })));
    }
}
