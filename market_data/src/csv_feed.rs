//! CSV-backed feed
//!
//! The expected CSV format is:
//! timestamp,open,high,low,close,volume
//! 2024-12-30T09:30:00Z,100.5,101.2,100.4,100.8,5000

use crate::{ensure_strictly_ordered, validate_request, Bar, FeedError, MarketDataFeed, OhlcvData, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvBar {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

/// Reads bars for a single symbol from a CSV file
#[derive(Debug, Clone)]
pub struct CsvFeed {
    path: PathBuf,
}

impl CsvFeed {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every bar in the file, sorted by timestamp
    pub fn load_all(&self) -> Result<Vec<Bar>> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut bars = Vec::new();

        for (i, record) in reader.deserialize::<CsvBar>().enumerate() {
            let row = record?;
            let values = [row.open, row.high, row.low, row.close, row.volume];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(FeedError::InvalidData(format!(
                    "Non-finite value in row {} of {}",
                    i + 2,
                    self.path.display()
                )));
            }

            bars.push(Bar::new(
                row.timestamp,
                OhlcvData {
                    open: row.open,
                    high: row.high,
                    low: row.low,
                    close: row.close,
                    volume: row.volume,
                },
            ));
        }

        if bars.is_empty() {
            return Err(FeedError::DataLoad(format!(
                "No data found in {}",
                self.path.display()
            )));
        }

        bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        ensure_strictly_ordered(&bars)?;

        Ok(bars)
    }
}

impl MarketDataFeed for CsvFeed {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Bar>> {
        validate_request(symbol, start, end)?;

        let bars: Vec<Bar> = self
            .load_all()?
            .into_iter()
            .filter(|bar| bar.timestamp >= start && bar.timestamp < end)
            .collect();

        log::debug!(
            "Loaded {} bars for {} from {}",
            bars.len(),
            symbol,
            self.path.display()
        );
        Ok(bars)
    }
}
