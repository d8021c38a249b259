//! Synthetic minute bars
//!
//! Stands in for a live vendor feed. Prices follow a random walk with normally
//! distributed returns; a fixed seed makes the output reproducible.

use crate::{validate_request, Bar, FeedError, MarketDataFeed, OhlcvData, Result};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Floor applied to generated prices so they stay positive
const MIN_PRICE: f64 = 0.01;

/// Random-walk OHLCV generator at 1-minute granularity
#[derive(Debug, Clone)]
pub struct SyntheticFeed {
    base_price: f64,
    volatility: f64,
    trend: f64,
    seed: Option<u64>,
}

impl SyntheticFeed {
    /// Create a feed starting at `base_price` with per-minute return volatility `volatility`
    pub fn new(base_price: f64, volatility: f64) -> Self {
        Self {
            base_price,
            volatility,
            trend: 0.0,
            seed: None,
        }
    }

    /// Per-minute drift added to every return
    pub fn with_trend(mut self, trend: f64) -> Self {
        self.trend = trend;
        self
    }

    /// Fix the random seed so repeated fetches return identical bars
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.base_price.is_finite() || self.base_price <= 0.0 {
            return Err(FeedError::InvalidRequest(format!(
                "Base price must be positive, got {}",
                self.base_price
            )));
        }
        if !self.trend.is_finite() {
            return Err(FeedError::InvalidRequest(
                "Trend must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn generate(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Bar>> {
        self.validate()?;
        let noise = Normal::new(0.0, self.volatility).map_err(|e| {
            FeedError::InvalidRequest(format!("Invalid volatility {}: {}", self.volatility, e))
        })?;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut bars = Vec::new();
        let mut price = self.base_price;
        let mut timestamp = start;

        while timestamp < end {
            let open = price;
            let ret = self.trend + noise.sample(&mut rng);
            let close = (open * (1.0 + ret)).max(MIN_PRICE);

            let wick_up = noise.sample(&mut rng).abs() * 0.5;
            let wick_down = noise.sample(&mut rng).abs() * 0.5;
            let high = open.max(close) * (1.0 + wick_up);
            let low = (open.min(close) * (1.0 - wick_down)).max(MIN_PRICE);
            let volume = 1000.0 + 5000.0 * rng.gen::<f64>();

            bars.push(Bar::new(
                timestamp,
                OhlcvData {
                    open,
                    high,
                    low,
                    close,
                    volume,
                },
            ));

            price = close;
            timestamp += Duration::minutes(1);
        }

        Ok(bars)
    }
}

impl Default for SyntheticFeed {
    fn default() -> Self {
        Self::new(100.0, 0.001)
    }
}

impl MarketDataFeed for SyntheticFeed {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Bar>> {
        validate_request(symbol, start, end)?;
        let bars = self.generate(start, end)?;
        log::debug!(
            "Generated {} synthetic 1-minute bars for {}",
            bars.len(),
            symbol
        );
        Ok(bars)
    }
}
