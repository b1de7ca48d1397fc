//! Price observations and their derived fields.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily observation of the price series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }

    /// Prices must be finite and strictly positive (log returns are taken).
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price > 0.0
    }
}

/// Derived fields for one observation.
///
/// Values at index i depend only on observations 0..=i. Fields are `None`
/// until their window has filled: returns from index 1, `ma_30` from 29,
/// `ma_90` from 89, `volatility_30` from 30 (30 returns).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedPoint {
    /// ln(p_i / p_{i-1}).
    pub log_return: Option<f64>,
    /// (p_i / p_{i-1} - 1) × 100.
    pub pct_return: Option<f64>,
    pub ma_30: Option<f64>,
    pub ma_90: Option<f64>,
    /// Sample standard deviation of the trailing 30 percent returns.
    pub volatility_30: Option<f64>,
}

/// A price point joined with its derived fields, as served to callers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub date: NaiveDate,
    pub price: f64,
    #[serde(flatten)]
    pub derived: DerivedPoint,
}
