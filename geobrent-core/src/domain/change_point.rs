//! Detected change points and the regimes on either side of them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// What kind of regime change a change point represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    MeanShift,
    VolatilityShift,
    TrendShift,
}

/// Mean price level and price volatility of a contiguous stretch of the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Regime {
    pub mean: f64,
    /// Population standard deviation of price.
    pub volatility: f64,
}

/// A date at which the series' regime is inferred to shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePoint {
    /// 1-based position in date order within the detected set.
    pub id: usize,
    /// Observation index of the first point of the new regime.
    pub index: usize,
    pub date: NaiveDate,
    /// Posterior probability in [0, 1].
    pub confidence: f64,
    /// Posterior log-odds; unsaturated, used for ranking.
    pub log_odds: f64,
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// ln(after.mean / before.mean).
    pub magnitude: f64,
    pub regime_before: Regime,
    pub regime_after: Regime,
}

impl ChangePoint {
    pub fn meets(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}
