//! Core record types consumed by the aggregator

use crate::aggregator::ScanError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One trading day for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingRecord {
    pub ticker: String,
    pub date: NaiveDate,
    /// Opening price for the day
    pub open: f64,
    /// Closing price for the day
    pub close: f64,
    pub volume: u64,
}

impl TradingRecord {
    /// Build a record; surrounding whitespace in `ticker` is dropped
    pub fn new(ticker: impl Into<String>, date: NaiveDate, open: f64, close: f64, volume: u64) -> Self {
        let ticker: String = ticker.into();
        Self {
            ticker: ticker.trim().to_string(),
            date,
            open,
            close,
            volume,
        }
    }

    /// Reject blank tickers and prices that are negative or not finite
    pub fn validate(&self, position: usize) -> Result<(), ScanError> {
        if self.ticker.trim().is_empty() {
            return Err(malformed(position, "ticker", &self.ticker));
        }
        if !is_valid_price(self.open) {
            return Err(malformed(position, "open", &self.open.to_string()));
        }
        if !is_valid_price(self.close) {
            return Err(malformed(position, "close", &self.close.to_string()));
        }
        Ok(())
    }
}

/// Unparsed row as produced by an upstream reader
///
/// Every field is kept as text so a bad value can be reported against the row it came
/// from instead of failing somewhere inside a deserializer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawRecord {
    #[serde(alias = "Ticker", alias = "TICKER", alias = "symbol", alias = "Symbol")]
    pub ticker: String,
    #[serde(alias = "Date", alias = "DATE")]
    pub date: String,
    #[serde(alias = "Open", alias = "OPEN")]
    pub open: String,
    #[serde(alias = "Close", alias = "CLOSE")]
    pub close: String,
    #[serde(alias = "Volume", alias = "VOLUME")]
    pub volume: String,
}

/// Date layouts accepted for the `date` column
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

fn malformed(position: usize, field: &'static str, value: &str) -> ScanError {
    ScanError::MalformedRecord {
        position,
        field,
        value: value.to_string(),
    }
}

fn is_valid_price(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn parse_price(position: usize, field: &'static str, raw: &str) -> Result<f64, ScanError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| malformed(position, field, raw))?;
    if !is_valid_price(value) {
        return Err(malformed(position, field, raw));
    }
    Ok(value)
}

impl RawRecord {
    /// Build a row from text fields
    pub fn new(ticker: &str, date: &str, open: &str, close: &str, volume: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            date: date.to_string(),
            open: open.to_string(),
            close: close.to_string(),
            volume: volume.to_string(),
        }
    }

    /// Parse into a typed record; `position` is the zero-based row index used in errors
    pub fn parse(&self, position: usize) -> Result<TradingRecord, ScanError> {
        let ticker = self.ticker.trim();
        if ticker.is_empty() {
            return Err(malformed(position, "ticker", &self.ticker));
        }

        let date_text = self.date.trim();
        let date = DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date_text, format).ok())
            .ok_or_else(|| malformed(position, "date", &self.date))?;

        let open = parse_price(position, "open", &self.open)?;
        let close = parse_price(position, "close", &self.close)?;
        let volume = self
            .volume
            .trim()
            .parse::<u64>()
            .map_err(|_| malformed(position, "volume", &self.volume))?;

        Ok(TradingRecord {
            ticker: ticker.to_string(),
            date,
            open,
            close,
            volume,
        })
    }
}

/// Ordered set of unique ticker symbols, in expected run order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerList {
    symbols: Vec<String>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl TickerList {
    /// Build from symbols in expected run order; blanks and duplicates are rejected
    pub fn new<I, S>(symbols: I) -> Result<Self, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self {
            symbols: Vec::new(),
            positions: HashMap::new(),
        };

        for symbol in symbols {
            let symbol: String = symbol.into();
            let symbol = symbol.trim().to_string();
            if symbol.is_empty() {
                return Err(ScanError::InvalidTickerList(
                    "empty ticker symbol".to_string(),
                ));
            }
            if list.positions.contains_key(&symbol) {
                return Err(ScanError::InvalidTickerList(format!(
                    "duplicate ticker symbol '{}'",
                    symbol
                )));
            }
            list.positions.insert(symbol.clone(), list.symbols.len());
            list.symbols.push(symbol);
        }

        Ok(list)
    }

    /// Slot index of a ticker, if listed
    pub fn position(&self, ticker: &str) -> Option<usize> {
        self.positions.get(ticker).copied()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }
}
