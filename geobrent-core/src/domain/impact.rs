//! Before/after impact analysis around an anchor date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Qualitative strength of an impact analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Low,
    Medium,
    High,
}

impl Significance {
    /// Bucket a change-point posterior: > 0.9 high, > 0.8 medium, else low.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.9 {
            Significance::High
        } else if confidence > 0.8 {
            Significance::Medium
        } else {
            Significance::Low
        }
    }

    /// Bucket a z-score-like magnitude against two cut-offs.
    pub fn from_z(z: f64, high: f64, medium: f64) -> Self {
        if z > high {
            Significance::High
        } else if z > medium {
            Significance::Medium
        } else {
            Significance::Low
        }
    }
}

/// Identifier of something an impact analysis can be anchored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AnchorId {
    Event(u32),
    ChangePoint(usize),
}

/// The resolved anchor of an analysis.
///
/// Change points carry their posterior confidence, which drives significance.
/// Events and bare dates carry none, so significance falls back to magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    Date { date: NaiveDate },
    Event { id: u32, date: NaiveDate },
    ChangePoint { id: usize, date: NaiveDate, confidence: f64 },
}

impl Anchor {
    pub fn date(&self) -> NaiveDate {
        match *self {
            Anchor::Date { date } | Anchor::Event { date, .. } | Anchor::ChangePoint { date, .. } => date,
        }
    }
}

/// Windowed before/after statistics around an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub anchor: Anchor,
    pub anchor_date: NaiveDate,
    pub window_days: u32,
    pub points_before: usize,
    pub points_after: usize,
    pub avg_before: f64,
    pub avg_after: f64,
    /// Population standard deviation of price within the before-window.
    pub volatility_before: f64,
    pub volatility_after: f64,
    pub price_change_pct: f64,
    /// `None` when the before-window price is perfectly flat.
    pub volatility_change_pct: Option<f64>,
    pub significance: Significance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_buckets() {
        assert_eq!(Significance::from_confidence(0.95), Significance::High);
        assert_eq!(Significance::from_confidence(0.9), Significance::Medium);
        assert_eq!(Significance::from_confidence(0.85), Significance::Medium);
        assert_eq!(Significance::from_confidence(0.8), Significance::Low);
        assert_eq!(Significance::from_confidence(0.3), Significance::Low);
    }

    #[test]
    fn z_buckets() {
        assert_eq!(Significance::from_z(2.5, 2.0, 1.0), Significance::High);
        assert_eq!(Significance::from_z(1.5, 2.0, 1.0), Significance::Medium);
        assert_eq!(Significance::from_z(0.5, 2.0, 1.0), Significance::Low);
    }

    #[test]
    fn anchor_id_json_shape() {
        let v = serde_json::to_value(AnchorId::Event(12)).unwrap();
        assert_eq!(v["kind"], "event");
        assert_eq!(v["id"], 12);
    }

    #[test]
    fn anchor_date_accessor() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 11).unwrap();
        let a = Anchor::ChangePoint { id: 4, date, confidence: 0.98 };
        assert_eq!(a.date(), date);
        assert_eq!(Anchor::Event { id: 12, date }.date(), date);
    }
}
