//! Validated, chronologically ordered price series.
//!
//! Derived fields (returns, 30/90 moving averages, 30-observation return
//! volatility) are computed once at load time in a single forward pass and
//! cached alongside the points. The store is immutable afterwards; every
//! query borrows from it.

pub mod rolling;

use std::ops::Range;

use chrono::{Datelike, NaiveDate};
use log::info;

use crate::domain::{DerivedPoint, PricePoint, PriceRow};
use crate::error::{AnalysisError, DataError};
use crate::stats;
use rolling::RollingWindow;

/// Short moving-average window, in observations.
pub const MA_SHORT: usize = 30;
/// Long moving-average window, in observations.
pub const MA_LONG: usize = 90;
/// Return-volatility window, in observations.
pub const VOLATILITY_WINDOW: usize = 30;

/// Derived fields, index-aligned with the points they were computed from.
pub type DerivedSeries = Vec<DerivedPoint>;

#[derive(Debug, Clone)]
pub struct SeriesStore {
    points: Vec<PricePoint>,
    derived: DerivedSeries,
    /// Sample std of every daily percent return in the series.
    return_volatility_pct: Option<f64>,
    synthetic: bool,
}

impl SeriesStore {
    /// Validate and load a price series.
    ///
    /// Fails if the series is empty, any price is non-positive or not finite,
    /// or dates are not strictly increasing.
    pub fn load(points: Vec<PricePoint>) -> Result<Self, DataError> {
        if points.is_empty() {
            return Err(DataError::EmptySeries);
        }

        for (index, point) in points.iter().enumerate() {
            if !point.is_valid() {
                return Err(DataError::InvalidPrice {
                    date: point.date,
                    price: point.price,
                });
            }
            if index > 0 {
                let previous = points[index - 1].date;
                if point.date == previous {
                    return Err(DataError::DuplicateDate {
                        index,
                        date: point.date,
                    });
                }
                if point.date < previous {
                    return Err(DataError::NonMonotonicDate {
                        index,
                        previous,
                        date: point.date,
                    });
                }
            }
        }

        let derived = Self::derive(&points);
        let pct: Vec<f64> = derived.iter().filter_map(|d| d.pct_return).collect();
        let return_volatility_pct = stats::sample_std(&pct);

        info!(
            "loaded price series: {} points, {} to {}",
            points.len(),
            points[0].date,
            points[points.len() - 1].date
        );

        Ok(Self {
            points,
            derived,
            return_volatility_pct,
            synthetic: false,
        })
    }

    /// Tag the series as synthetic (generated, not observed).
    pub fn into_synthetic(mut self) -> Self {
        self.synthetic = true;
        self
    }

    /// Compute derived fields in one forward pass.
    ///
    /// Each accumulator only ever receives values up to the current index, so
    /// nothing at index i can depend on points after i.
    pub fn derive(points: &[PricePoint]) -> DerivedSeries {
        let mut ma_short = RollingWindow::new(MA_SHORT);
        let mut ma_long = RollingWindow::new(MA_LONG);
        let mut vol = RollingWindow::new(VOLATILITY_WINDOW);
        let mut out = Vec::with_capacity(points.len());

        for (i, point) in points.iter().enumerate() {
            ma_short.push(point.price);
            ma_long.push(point.price);

            let (log_return, pct_return) = if i == 0 {
                (None, None)
            } else {
                let prev = points[i - 1].price;
                let pct = (point.price - prev) / prev * 100.0;
                vol.push(pct);
                (Some((point.price / prev).ln()), Some(pct))
            };

            out.push(DerivedPoint {
                log_return,
                pct_return,
                ma_30: ma_short.mean(),
                ma_90: ma_long.mean(),
                volatility_30: vol.sample_std(),
            });
        }

        out
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn derived(&self) -> &[DerivedPoint] {
        &self.derived
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a loaded store; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &PricePoint {
        &self.points[0]
    }

    pub fn last(&self) -> &PricePoint {
        &self.points[self.points.len() - 1]
    }

    pub fn start_date(&self) -> NaiveDate {
        self.first().date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.last().date
    }

    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    /// Unconditional daily percent-return volatility of the whole series.
    pub fn return_volatility_pct(&self) -> Option<f64> {
        self.return_volatility_pct
    }

    /// Percent return into the last observation.
    pub fn last_return_pct(&self) -> Option<f64> {
        self.derived.last().and_then(|d| d.pct_return)
    }

    /// Percent change from the first to the last observation in the calendar
    /// year of the last observation. Zero when that year holds one point.
    pub fn ytd_return_pct(&self) -> f64 {
        let last = self.last();
        let first = self.points.partition_point(|p| p.date.year() < last.date.year());
        let open = self.points[first].price;
        (last.price - open) / open * 100.0
    }

    /// Sample std of the most recent `count` daily percent returns.
    pub fn recent_volatility_pct(&self, count: usize) -> Option<f64> {
        let recent: Vec<f64> = self
            .derived
            .iter()
            .rev()
            .filter_map(|d| d.pct_return)
            .take(count)
            .collect();
        stats::sample_std(&recent)
    }

    /// Log returns, one per consecutive pair of points (length n - 1).
    pub fn log_returns(&self) -> Vec<f64> {
        self.derived.iter().filter_map(|d| d.log_return).collect()
    }

    /// Index range of points with `start <= date <= end`. May be empty.
    pub fn index_range(&self, start: NaiveDate, end: NaiveDate) -> Range<usize> {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        lo..hi.max(lo)
    }

    /// Points with `start <= date <= end`. May be empty.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> &[PricePoint] {
        &self.points[self.index_range(start, end)]
    }

    /// Contiguous sub-range with `start <= date <= end`.
    pub fn slice(&self, start: NaiveDate, end: NaiveDate) -> Result<SeriesSlice<'_>, AnalysisError> {
        if start > end {
            return Err(AnalysisError::Range(format!("start {start} is after end {end}")));
        }
        let range = self.index_range(start, end);
        if range.is_empty() {
            return Err(AnalysisError::Range(format!(
                "no observations between {start} and {end}"
            )));
        }
        Ok(SeriesSlice {
            offset: range.start,
            points: &self.points[range.clone()],
            derived: &self.derived[range],
        })
    }

    /// The whole series as a slice.
    pub fn full(&self) -> SeriesSlice<'_> {
        SeriesSlice {
            offset: 0,
            points: &self.points,
            derived: &self.derived,
        }
    }

    /// Index of the latest point dated on or before `date`.
    pub fn index_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        self.points.partition_point(|p| p.date <= date).checked_sub(1)
    }

    /// Latest point dated on or before `date` (weekends and holidays fall back
    /// to the previous trading day).
    pub fn at(&self, date: NaiveDate) -> Result<&PricePoint, AnalysisError> {
        self.index_at_or_before(date)
            .map(|i| &self.points[i])
            .ok_or_else(|| {
                AnalysisError::NotFound(format!(
                    "{date} precedes the series start {}",
                    self.start_date()
                ))
            })
    }
}

/// Borrowed contiguous view into a `SeriesStore`.
#[derive(Debug, Clone, Copy)]
pub struct SeriesSlice<'a> {
    offset: usize,
    points: &'a [PricePoint],
    derived: &'a [DerivedPoint],
}

impl<'a> SeriesSlice<'a> {
    /// Index of the first slice point within the full series.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn points(&self) -> &'a [PricePoint] {
        self.points
    }

    pub fn derived(&self) -> &'a [DerivedPoint] {
        self.derived
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn rows(&self) -> Vec<PriceRow> {
        self.points
            .iter()
            .zip(self.derived)
            .map(|(p, d)| PriceRow {
                date: p.date,
                price: p.price,
                derived: *d,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Business-day-like series: skips Saturdays and Sundays.
    fn weekday_series(prices: &[f64]) -> Vec<PricePoint> {
        use chrono::{Datelike, Weekday};
        let mut date = d(2024, 1, 1);
        let mut out = Vec::new();
        for &p in prices {
            while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                date = date.succ_opt().unwrap();
            }
            out.push(PricePoint::new(date, p));
            date = date.succ_opt().unwrap();
        }
        out
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| 50.0 + (i as f64 * 0.37).sin() * 5.0 + i as f64 * 0.1).collect()
    }

    #[test]
    fn rejects_empty() {
        assert!(matches!(SeriesStore::load(vec![]), Err(DataError::EmptySeries)));
    }

    #[test]
    fn rejects_non_positive_and_nan() {
        let mut pts = weekday_series(&[10.0, 11.0, 12.0]);
        pts[1].price = 0.0;
        assert!(matches!(SeriesStore::load(pts.clone()), Err(DataError::InvalidPrice { .. })));
        pts[1].price = f64::NAN;
        assert!(matches!(SeriesStore::load(pts), Err(DataError::InvalidPrice { .. })));
    }

    #[test]
    fn rejects_duplicate_and_out_of_order_dates() {
        let mut pts = weekday_series(&[10.0, 11.0, 12.0]);
        pts[2].date = pts[1].date;
        assert!(matches!(
            SeriesStore::load(pts.clone()),
            Err(DataError::DuplicateDate { index: 2, .. })
        ));
        pts[2].date = pts[0].date;
        assert!(matches!(
            SeriesStore::load(pts),
            Err(DataError::NonMonotonicDate { index: 2, .. })
        ));
    }

    #[test]
    fn derived_windows_fill_on_schedule() {
        let store = SeriesStore::load(weekday_series(&ramp(120))).unwrap();
        let der = store.derived();
        assert!(der[0].log_return.is_none());
        assert!(der[1].log_return.is_some());
        assert!(der[28].ma_30.is_none());
        assert!(der[29].ma_30.is_some());
        assert!(der[88].ma_90.is_none());
        assert!(der[89].ma_90.is_some());
        assert!(der[29].volatility_30.is_none());
        assert!(der[30].volatility_30.is_some());
    }

    #[test]
    fn derived_matches_direct_recomputation() {
        let prices = ramp(150);
        let store = SeriesStore::load(weekday_series(&prices)).unwrap();
        let pct = stats::pct_returns(&prices);
        for (i, der) in store.derived().iter().enumerate() {
            if i >= 29 {
                let direct = stats::mean(&prices[i - 29..=i]).unwrap();
                assert!((der.ma_30.unwrap() - direct).abs() < 1e-9, "ma_30 at {i}");
            }
            if i >= 89 {
                let direct = stats::mean(&prices[i - 89..=i]).unwrap();
                assert!((der.ma_90.unwrap() - direct).abs() < 1e-9, "ma_90 at {i}");
            }
            if i >= 30 {
                // pct[k] is the return into point k + 1
                let direct = stats::sample_std(&pct[i - 30..i]).unwrap();
                assert!((der.volatility_30.unwrap() - direct).abs() < 1e-9, "vol at {i}");
            }
        }
    }

    #[test]
    fn at_falls_back_over_weekends() {
        let store = SeriesStore::load(weekday_series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0])).unwrap();
        // 2024-01-05 is a Friday, 01-06/07 the weekend, 01-08 Monday
        assert_eq!(store.at(d(2024, 1, 6)).unwrap().date, d(2024, 1, 5));
        assert_eq!(store.at(d(2024, 1, 7)).unwrap().date, d(2024, 1, 5));
        assert_eq!(store.at(d(2024, 1, 8)).unwrap().date, d(2024, 1, 8));
        assert_eq!(store.at(d(2030, 1, 1)).unwrap().date, store.end_date());
    }

    #[test]
    fn at_before_start_is_not_found() {
        let store = SeriesStore::load(weekday_series(&[10.0, 11.0])).unwrap();
        assert!(matches!(store.at(d(2023, 12, 31)), Err(AnalysisError::NotFound(_))));
    }

    #[test]
    fn slice_is_inclusive_and_contiguous() {
        let store = SeriesStore::load(weekday_series(&ramp(20))).unwrap();
        let s = store.slice(d(2024, 1, 3), d(2024, 1, 9)).unwrap();
        // Jan 3, 4, 5, 8, 9
        assert_eq!(s.len(), 5);
        assert_eq!(s.offset(), 2);
        assert_eq!(s.points()[0].date, d(2024, 1, 3));
        assert_eq!(s.points()[4].date, d(2024, 1, 9));
        assert_eq!(s.rows().len(), 5);
    }

    #[test]
    fn slice_errors() {
        let store = SeriesStore::load(weekday_series(&ramp(20))).unwrap();
        assert!(matches!(
            store.slice(d(2024, 1, 9), d(2024, 1, 3)),
            Err(AnalysisError::Range(_))
        ));
        // A weekend-only range holds no observations.
        assert!(matches!(
            store.slice(d(2024, 1, 6), d(2024, 1, 7)),
            Err(AnalysisError::Range(_))
        ));
    }

    #[test]
    fn between_may_be_empty() {
        let store = SeriesStore::load(weekday_series(&ramp(5))).unwrap();
        assert!(store.between(d(2020, 1, 1), d(2020, 12, 31)).is_empty());
        assert_eq!(store.between(d(2000, 1, 1), d(2100, 1, 1)).len(), 5);
    }

    #[test]
    fn ytd_return_uses_the_last_calendar_year() {
        let pts = vec![
            PricePoint::new(d(2023, 12, 29), 40.0),
            PricePoint::new(d(2024, 1, 2), 50.0),
            PricePoint::new(d(2024, 3, 1), 45.0),
            PricePoint::new(d(2024, 6, 3), 60.0),
        ];
        let store = SeriesStore::load(pts).unwrap();
        assert!((store.ytd_return_pct() - 20.0).abs() < 1e-12);
        assert!((store.last_return_pct().unwrap() - 100.0 / 3.0).abs() < 1e-9);

        let lone = SeriesStore::load(vec![
            PricePoint::new(d(2023, 12, 29), 40.0),
            PricePoint::new(d(2024, 1, 2), 50.0),
        ])
        .unwrap();
        assert_eq!(lone.ytd_return_pct(), 0.0);
    }

    #[test]
    fn recent_volatility_takes_the_tail() {
        let prices = ramp(80);
        let store = SeriesStore::load(weekday_series(&prices)).unwrap();
        let pct = stats::pct_returns(&prices);
        let direct = stats::sample_std(&pct[pct.len() - 30..]).unwrap();
        assert!((store.recent_volatility_pct(30).unwrap() - direct).abs() < 1e-12);
        // Fewer returns than requested uses what exists.
        let all = stats::sample_std(&pct).unwrap();
        assert!((store.recent_volatility_pct(500).unwrap() - all).abs() < 1e-12);

        let single = SeriesStore::load(weekday_series(&[10.0])).unwrap();
        assert_eq!(single.recent_volatility_pct(30), None);
        assert_eq!(single.last_return_pct(), None);
    }

    #[test]
    fn return_volatility_is_cached() {
        let prices = ramp(60);
        let store = SeriesStore::load(weekday_series(&prices)).unwrap();
        let direct = stats::sample_std(&stats::pct_returns(&prices)).unwrap();
        assert!((store.return_volatility_pct().unwrap() - direct).abs() < 1e-12);
        assert_eq!(store.log_returns().len(), 59);
    }
}
