//! WindowAnalyzer: before/after statistics around an anchor date.

use chrono::{Days, NaiveDate};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{Anchor, ImpactAnalysis, Significance};
use crate::error::{AnalysisError, ConfigError};
use crate::series::SeriesStore;
use crate::stats;

/// Minimum observations in each window. Not configurable per call.
pub const MIN_WINDOW_POINTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window used when a query does not name one.
    pub default_window_days: u32,
    /// Must equal [`MIN_WINDOW_POINTS`]; present so config files can state it.
    pub min_points: usize,
    /// z above which an event impact is high significance.
    pub event_high_z: f64,
    /// z above which an event impact is medium significance.
    pub event_medium_z: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            default_window_days: 30,
            min_points: MIN_WINDOW_POINTS,
            event_high_z: 2.0,
            event_medium_z: 1.0,
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_window_days == 0 {
            return Err(ConfigError::Invalid("window.default_window_days must be positive".into()));
        }
        if self.min_points != MIN_WINDOW_POINTS {
            return Err(ConfigError::Invalid(format!(
                "window.min_points is fixed at {MIN_WINDOW_POINTS}, got {}",
                self.min_points
            )));
        }
        if !(self.event_medium_z > 0.0 && self.event_high_z > self.event_medium_z) {
            return Err(ConfigError::Invalid(format!(
                "window z thresholds must satisfy 0 < medium < high (got {} / {})",
                self.event_medium_z, self.event_high_z
            )));
        }
        Ok(())
    }
}

/// Borrowing analyzer over a loaded series.
#[derive(Debug, Clone, Copy)]
pub struct WindowAnalyzer<'a> {
    series: &'a SeriesStore,
    config: &'a WindowConfig,
}

impl<'a> WindowAnalyzer<'a> {
    pub fn new(series: &'a SeriesStore, config: &'a WindowConfig) -> Self {
        Self { series, config }
    }

    /// Analyze a bare date.
    pub fn analyze_date(&self, date: NaiveDate, window_days: u32) -> Result<ImpactAnalysis, AnalysisError> {
        self.analyze(Anchor::Date { date }, window_days)
    }

    /// Before-window is `[anchor - window_days, anchor]`, after-window is
    /// `[anchor, anchor + window_days]`; an observation on the anchor date
    /// belongs to both.
    pub fn analyze(&self, anchor: Anchor, window_days: u32) -> Result<ImpactAnalysis, AnalysisError> {
        if window_days == 0 {
            return Err(AnalysisError::Range("window_days must be positive".into()));
        }
        let date = anchor.date();
        let span = Days::new(u64::from(window_days));
        let window_start = date.checked_sub_days(span).unwrap_or(NaiveDate::MIN);
        let window_end = date.checked_add_days(span).unwrap_or(NaiveDate::MAX);

        let before: Vec<f64> = self.series.between(window_start, date).iter().map(|p| p.price).collect();
        let after: Vec<f64> = self.series.between(date, window_end).iter().map(|p| p.price).collect();
        if before.len() < MIN_WINDOW_POINTS {
            return Err(AnalysisError::insufficient(
                MIN_WINDOW_POINTS,
                before.len(),
                format!("before-window of {date}"),
            ));
        }
        if after.len() < MIN_WINDOW_POINTS {
            return Err(AnalysisError::insufficient(
                MIN_WINDOW_POINTS,
                after.len(),
                format!("after-window of {date}"),
            ));
        }

        let avg_before = stats::mean(&before).unwrap_or(0.0);
        let avg_after = stats::mean(&after).unwrap_or(0.0);
        let volatility_before = stats::population_std(&before).unwrap_or(0.0);
        let volatility_after = stats::population_std(&after).unwrap_or(0.0);
        let price_change_pct = (avg_after - avg_before) / avg_before * 100.0;
        let volatility_change_pct = (volatility_before > 0.0)
            .then(|| (volatility_after - volatility_before) / volatility_before * 100.0);

        let significance = match anchor {
            Anchor::ChangePoint { confidence, .. } => Significance::from_confidence(confidence),
            Anchor::Event { .. } | Anchor::Date { .. } => {
                let z = self.impact_z(price_change_pct, (before.len() + after.len()) as f64 / 2.0);
                Significance::from_z(z, self.config.event_high_z, self.config.event_medium_z)
            }
        };

        Ok(ImpactAnalysis {
            anchor,
            anchor_date: date,
            window_days,
            points_before: before.len(),
            points_after: after.len(),
            avg_before,
            avg_after,
            volatility_before,
            volatility_after,
            price_change_pct,
            volatility_change_pct,
            significance,
        })
    }

    /// Analyze several anchors in parallel; output order follows input order.
    pub fn analyze_many(
        &self,
        anchors: &[Anchor],
        window_days: u32,
    ) -> Vec<Result<ImpactAnalysis, AnalysisError>> {
        anchors
            .par_iter()
            .map(|&anchor| self.analyze(anchor, window_days))
            .collect()
    }

    /// Percent move in units of what a driftless series with the observed
    /// daily return volatility would wander over the window.
    fn impact_z(&self, price_change_pct: f64, horizon: f64) -> f64 {
        let daily = self.series.return_volatility_pct().unwrap_or(0.0);
        let scale = daily * horizon.sqrt();
        if scale > 0.0 {
            price_change_pct.abs() / scale
        } else if price_change_pct == 0.0 {
            0.0
        } else {
            f64::INFINITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PricePoint;
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
    }

    fn day(i: i64) -> NaiveDate {
        start() + Duration::days(i)
    }

    /// Daily series: 150 points near 100 then 150 near 110.
    fn step_series() -> SeriesStore {
        let points = (0..300)
            .map(|i| {
                let level = if i < 150 { 100.0 } else { 110.0 };
                let wiggle = if i % 2 == 0 { 0.1 } else { -0.1 };
                PricePoint::new(day(i), level + wiggle)
            })
            .collect();
        SeriesStore::load(points).unwrap()
    }

    #[test]
    fn anchor_point_is_in_both_windows() {
        let series = step_series();
        let cfg = WindowConfig::default();
        let an = WindowAnalyzer::new(&series, &cfg).analyze_date(day(40), 10).unwrap();
        assert_eq!(an.points_before, 11);
        assert_eq!(an.points_after, 11);
        assert_eq!(an.window_days, 10);
    }

    #[test]
    fn step_up_is_positive_and_significant() {
        let series = step_series();
        let cfg = WindowConfig::default();
        let an = WindowAnalyzer::new(&series, &cfg)
            .analyze(Anchor::Event { id: 1, date: day(150) }, 20)
            .unwrap();
        assert!(an.avg_after > an.avg_before);
        assert!(an.price_change_pct > 9.0);
        assert_eq!(an.significance, Significance::High);
        assert!(an.volatility_change_pct.is_some());
    }

    #[test]
    fn quiet_stretch_is_low_significance() {
        let series = step_series();
        let cfg = WindowConfig::default();
        let an = WindowAnalyzer::new(&series, &cfg).analyze_date(day(60), 20).unwrap();
        assert!(an.price_change_pct.abs() < 0.1);
        assert_eq!(an.significance, Significance::Low);
    }

    #[test]
    fn change_point_significance_uses_confidence() {
        let series = step_series();
        let cfg = WindowConfig::default();
        let an = WindowAnalyzer::new(&series, &cfg)
            .analyze(Anchor::ChangePoint { id: 1, date: day(150), confidence: 0.85 }, 20)
            .unwrap();
        assert_eq!(an.significance, Significance::Medium);
    }

    #[test]
    fn short_windows_are_insufficient() {
        let series = step_series();
        let cfg = WindowConfig::default();
        let an = WindowAnalyzer::new(&series, &cfg);
        let err = an.analyze_date(day(5), 30).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { available: 6, .. }));
        let err = an.analyze_date(day(295), 30).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { needed: 10, available: 4, .. }));
    }

    #[test]
    fn zero_window_is_a_range_error() {
        let series = step_series();
        let cfg = WindowConfig::default();
        let err = WindowAnalyzer::new(&series, &cfg).analyze_date(day(40), 0).unwrap_err();
        assert!(matches!(err, AnalysisError::Range(_)));
    }

    #[test]
    fn flat_before_window_has_no_volatility_change() {
        let points = (0..60)
            .map(|i| PricePoint::new(day(i), if i <= 30 { 50.0 } else { 50.0 + i as f64 }))
            .collect();
        let series = SeriesStore::load(points).unwrap();
        let cfg = WindowConfig::default();
        let an = WindowAnalyzer::new(&series, &cfg).analyze_date(day(30), 20).unwrap();
        assert_eq!(an.volatility_before, 0.0);
        assert!(an.volatility_change_pct.is_none());
    }

    #[test]
    fn analyze_many_keeps_order() {
        let series = step_series();
        let cfg = WindowConfig::default();
        let anchors = [
            Anchor::Date { date: day(150) },
            Anchor::Date { date: day(1) },
            Anchor::Date { date: day(31) },
        ];
        let out = WindowAnalyzer::new(&series, &cfg).analyze_many(&anchors, 15);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_ref().unwrap().anchor_date, day(150));
        assert!(out[1].is_err());
        assert_eq!(out[2].as_ref().unwrap().anchor_date, day(31));
    }

    #[test]
    fn config_validation() {
        assert!(WindowConfig::default().validate().is_ok());
        let cfg = WindowConfig { min_points: 5, ..Default::default() };
        assert!(cfg.validate().is_err());
        let cfg = WindowConfig { event_high_z: 0.5, ..Default::default() };
        assert!(cfg.validate().is_err());
    }
}
