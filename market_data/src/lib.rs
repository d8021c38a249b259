//! # Market Data
//!
//! `market_data` supplies the price history the forecasting pipeline runs on.
//! A [`MarketDataFeed`] returns an ordered sequence of OHLCV [`Bar`]s for a
//! symbol over a half-open time range `[start, end)`.
//!
//! Two feeds ship with the crate:
//!
//! - [`SyntheticFeed`]: a seeded random walk at 1-minute granularity, used when
//!   live data is switched off
//! - [`CsvFeed`]: bars read from a `timestamp,open,high,low,close,volume` file
//!
//! ## Usage Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use market_data::{MarketDataFeed, SyntheticFeed};
//!
//! let feed = SyntheticFeed::new(100.0, 0.002).with_seed(7);
//! let start = Utc.with_ymd_and_hms(2024, 12, 30, 9, 30, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2024, 12, 30, 10, 30, 0).unwrap();
//!
//! let bars = feed.fetch("AAPL US Equity", start, end).unwrap();
//! assert_eq!(bars.len(), 60);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod csv_feed;
pub mod synthetic;

pub use csv_feed::CsvFeed;
pub use synthetic::SyntheticFeed;

/// Errors raised while acquiring market data
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Data loading error: {0}")]
    DataLoad(String),

    #[error("Feed unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for feed operations
pub type Result<T> = std::result::Result<T, FeedError>;

/// Open, high, low, close and volume of one bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcvData {
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: f64,
}

/// One OHLCV bar with the timestamp of its open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Timestamp of the bar
    pub timestamp: DateTime<Utc>,
    /// OHLCV data
    pub data: OhlcvData,
}

impl Bar {
    pub fn new(timestamp: DateTime<Utc>, data: OhlcvData) -> Self {
        Self { timestamp, data }
    }

    /// Close price of the bar
    pub fn close(&self) -> f64 {
        self.data.close
    }
}

/// Source of OHLCV bars for a symbol and a time range
///
/// Implementations return bars strictly ordered by timestamp and restricted to
/// `[start, end)`.
pub trait MarketDataFeed {
    /// Short name of the feed, used in logs
    fn name(&self) -> &str;

    /// Fetch the bars of `symbol` between `start` (inclusive) and `end` (exclusive)
    fn fetch(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Bar>>;
}

impl<F: MarketDataFeed + ?Sized> MarketDataFeed for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Bar>> {
        (**self).fetch(symbol, start, end)
    }
}

/// Check the common preconditions of a fetch request
pub fn validate_request(symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if symbol.trim().is_empty() {
        return Err(FeedError::InvalidRequest(
            "Symbol must not be empty".to_string(),
        ));
    }
    if start >= end {
        return Err(FeedError::InvalidRequest(format!(
            "Start time {} must be before end time {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }
    Ok(())
}

/// Verify that bars are strictly ordered by timestamp
pub fn ensure_strictly_ordered(bars: &[Bar]) -> Result<()> {
    for (i, pair) in bars.windows(2).enumerate() {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(FeedError::InvalidData(format!(
                "Bar {} at {} is not after bar {} at {}",
                i + 1,
                pair[1].timestamp.to_rfc3339(),
                i,
                pair[0].timestamp.to_rfc3339()
            )));
        }
    }
    Ok(())
}

/// Close prices of a bar sequence, in order
pub fn close_prices(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(Bar::close).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar_at(minute: i64, close: f64) -> Bar {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        Bar::new(
            base + Duration::minutes(minute),
            OhlcvData {
                open: close,
                high: close,
                low: close,
                close,
                volume: 100.0,
            },
        )
    }

    #[test]
    fn test_close_prices() {
        let bars = vec![bar_at(0, 1.0), bar_at(1, 2.0)];
        assert_eq!(close_prices(&bars), vec![1.0, 2.0]);
    }

    #[test]
    fn test_ordering_check() {
        assert!(ensure_strictly_ordered(&[bar_at(0, 1.0), bar_at(1, 1.0)]).is_ok());
        assert!(ensure_strictly_ordered(&[bar_at(1, 1.0), bar_at(1, 1.0)]).is_err());
        assert!(ensure_strictly_ordered(&[bar_at(2, 1.0), bar_at(1, 1.0)]).is_err());
    }

    #[test]
    fn test_validate_request() {
        let start = Utc.with_ymd_and_hms(2024, 1, 2, 9, 30, 0).unwrap();
        assert!(validate_request("AAPL", start, start + Duration::minutes(1)).is_ok());
        assert!(validate_request("", start, start + Duration::minutes(1)).is_err());
        assert!(validate_request("AAPL", start, start).is_err());
    }
}
