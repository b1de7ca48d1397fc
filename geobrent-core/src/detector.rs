//! ChangePointDetector: locates regime shifts in the price series.
//!
//! Every admissible split index `t` is scored on log returns. The return into
//! `t` is the jump; the returns inside the trailing window `[t - trailing, t)`
//! and inside the leading window `[t, t + leading)` are its neighbours. Three
//! pieces of evidence are summed on the log-odds scale, each an approximate
//! Bayes factor with a BIC penalty:
//!
//! * jump: a Student-t outlier score of the jump against its winsorized
//!   neighbours;
//! * drift: a Welch t test of equal mean return across the two windows;
//! * volatility: a likelihood-ratio test of equal return variance.
//!
//! Scoring returns rather than price levels keeps a random walk or a steady
//! trend from looking like a level break: their returns are exchangeable
//! around every split.
//!
//! A constant hazard `1 / expected_segment_length` supplies the prior odds.
//! The posterior probability is the logistic of the summed log-odds. Candidates
//! below `min_confidence` are dropped, then overlapping detections are
//! suppressed greedily by descending log-odds.
//!
//! Scoring is a pure function of the input, so the parallel and sequential
//! paths return identical output.

use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{ChangePoint, ChangeType, PricePoint, Regime};
use crate::error::{AnalysisError, ConfigError};
use crate::series::SeriesStore;
use crate::stats;

/// Stand-in t statistic for a step out of a noiseless neighbourhood.
const T_CAP: f64 = 1e6;
/// Floor for return variances so flat windows do not produce `ln 0`.
const VARIANCE_FLOOR: f64 = 1e-18;
const EPS: f64 = 1e-12;
/// Mean-return differences below this fraction of the typical absolute return
/// are not treated as drift. Keeps smooth noiseless trends quiet.
const DRIFT_RESOLUTION: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Observations before a candidate split.
    pub trailing_window: usize,
    /// Observations from the candidate split onwards.
    pub leading_window: usize,
    /// Retained change points are strictly more than this many observations apart.
    pub min_separation: usize,
    /// Candidates below this posterior probability are discarded.
    pub min_confidence: f64,
    /// Prior expected run length between regime changes, in observations.
    pub expected_segment_length: f64,
    /// Volatility ratio (either direction) above which a point is a volatility shift.
    pub volatility_ratio_threshold: f64,
    /// Standardized mean difference above which a point is a mean shift.
    pub mean_shift_threshold: f64,
    /// Winsorization half-width in robust sigmas.
    pub winsor_mads: f64,
    /// Score candidates on the rayon pool.
    pub parallel: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            trailing_window: 30,
            leading_window: 30,
            min_separation: 30,
            min_confidence: 0.5,
            expected_segment_length: 10_000.0,
            volatility_ratio_threshold: 1.5,
            mean_shift_threshold: 1.0,
            winsor_mads: 4.0,
            parallel: true,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trailing_window < 3 || self.leading_window < 3 {
            return Err(ConfigError::Invalid(format!(
                "detector windows must be at least 3 observations (got {} / {})",
                self.trailing_window, self.leading_window
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "detector.min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        if !(self.expected_segment_length > 1.0) {
            return Err(ConfigError::Invalid(format!(
                "detector.expected_segment_length must be > 1, got {}",
                self.expected_segment_length
            )));
        }
        if !(self.volatility_ratio_threshold > 1.0) {
            return Err(ConfigError::Invalid(format!(
                "detector.volatility_ratio_threshold must be > 1, got {}",
                self.volatility_ratio_threshold
            )));
        }
        if !(self.mean_shift_threshold > 0.0) || !(self.winsor_mads > 0.0) {
            return Err(ConfigError::Invalid(
                "detector.mean_shift_threshold and detector.winsor_mads must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Smallest series the detector will accept.
    pub fn min_points(&self) -> usize {
        self.trailing_window + self.leading_window
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    log_odds: f64,
    confidence: f64,
}

#[derive(Debug, Clone)]
pub struct ChangePointDetector {
    config: DetectorConfig,
}

impl ChangePointDetector {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn detect(&self, series: &SeriesStore) -> Result<Vec<ChangePoint>, AnalysisError> {
        self.detect_points(series.points())
    }

    /// Detect change points in a validated, date-ordered price sequence.
    ///
    /// Output is sorted by date with ids assigned 1.. in that order.
    pub fn detect_points(&self, points: &[PricePoint]) -> Result<Vec<ChangePoint>, AnalysisError> {
        let cfg = &self.config;
        let n = points.len();
        if n < cfg.min_points() {
            return Err(AnalysisError::insufficient(cfg.min_points(), n, "change-point detection"));
        }

        let log_prices: Vec<f64> = points.iter().map(|p| p.price.ln()).collect();
        let returns: Vec<f64> = log_prices.windows(2).map(|w| w[1] - w[0]).collect();

        let first = cfg.trailing_window + 1;
        let last = n - cfg.leading_window;
        let score = |t: usize| self.score(&returns, t);
        let scored: Vec<Candidate> = if first > last {
            Vec::new()
        } else if cfg.parallel {
            (first..=last).into_par_iter().map(score).collect()
        } else {
            (first..=last).map(score).collect()
        };

        let mut passing: Vec<Candidate> = scored
            .into_iter()
            .filter(|c| c.confidence >= cfg.min_confidence)
            .collect();
        let candidate_count = passing.len();

        passing.sort_by(|a, b| b.log_odds.total_cmp(&a.log_odds).then(a.index.cmp(&b.index)));
        let mut kept: Vec<Candidate> = Vec::new();
        for cand in passing {
            if kept.iter().all(|k| k.index.abs_diff(cand.index) > cfg.min_separation) {
                kept.push(cand);
            }
        }
        kept.sort_by_key(|c| c.index);

        debug!(
            "change-point scan: {} points, {} candidates above {:.2}, {} retained",
            n,
            candidate_count,
            cfg.min_confidence,
            kept.len()
        );

        Ok(kept
            .into_iter()
            .enumerate()
            .map(|(i, c)| self.build(points, c, i + 1))
            .collect())
    }

    fn score(&self, returns: &[f64], t: usize) -> Candidate {
        let cfg = &self.config;
        // Return k spans points k..k+1, so `jump` moves the price from t - 1 to t.
        let mut before = returns[t - cfg.trailing_window..t - 1].to_vec();
        let jump = returns[t - 1];
        let mut after = returns[t..t + cfg.leading_window - 1].to_vec();
        let penalty = 0.5 * ((before.len() + after.len() + 1) as f64).ln();

        let combined: Vec<f64> = before.iter().chain(&after).copied().collect();
        if let (Some(center), Some(sigma)) = (stats::median(&combined), stats::robust_sigma(&combined)) {
            if sigma > 0.0 {
                let lo = center - cfg.winsor_mads * sigma;
                let hi = center + cfg.winsor_mads * sigma;
                for r in before.iter_mut().chain(after.iter_mut()) {
                    *r = r.clamp(lo, hi);
                }
            }
        }

        let step = jump_evidence(jump, &before, &after);
        let (drift, volatility) = window_evidence(&before, &after);

        let hazard = 1.0 / cfg.expected_segment_length;
        let prior = (hazard / (1.0 - hazard)).ln();
        let log_odds = step + drift + volatility - 3.0 * penalty + prior;
        Candidate {
            index: t,
            log_odds,
            confidence: stats::logistic(log_odds),
        }
    }

    fn build(&self, points: &[PricePoint], cand: Candidate, id: usize) -> ChangePoint {
        let t = cand.index;
        let before = regime(&points[t - self.config.trailing_window..t]);
        let after = regime(&points[t..t + self.config.leading_window]);
        ChangePoint {
            id,
            index: t,
            date: points[t].date,
            confidence: cand.confidence,
            log_odds: cand.log_odds,
            change_type: classify(&before, &after, &self.config),
            magnitude: (after.mean / before.mean).ln(),
            regime_before: before,
            regime_after: after,
        }
    }
}

fn regime(points: &[PricePoint]) -> Regime {
    let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
    Regime {
        mean: stats::mean(&prices).unwrap_or(0.0),
        volatility: stats::population_std(&prices).unwrap_or(0.0),
    }
}

fn t_stat(diff: f64, se: f64) -> f64 {
    if se > EPS {
        diff / se
    } else if diff.abs() > EPS {
        T_CAP.copysign(diff)
    } else {
        0.0
    }
}

/// Unpenalized log Bayes factor that `jump` is not drawn from the distribution
/// of its neighbours, using the predictive t with `n - 1` degrees of freedom.
fn jump_evidence(jump: f64, before: &[f64], after: &[f64]) -> f64 {
    let neighbours: Vec<f64> = before.iter().chain(after).copied().collect();
    let n = neighbours.len() as f64;
    let center = stats::mean(&neighbours).unwrap_or(0.0);
    let spread = (stats::sample_variance(&neighbours).unwrap_or(0.0) * (1.0 + 1.0 / n)).sqrt();
    let z = t_stat(jump - center, spread);
    let dof = n - 1.0;
    (dof + 1.0) / 2.0 * (z * z / dof).ln_1p()
}

/// Unpenalized drift and volatility log Bayes factors between two windows of
/// returns.
fn window_evidence(before: &[f64], after: &[f64]) -> (f64, f64) {
    let n1 = before.len() as f64;
    let n2 = after.len() as f64;
    let n = n1 + n2;
    let s1 = stats::sample_variance(before).unwrap_or(0.0).max(VARIANCE_FLOOR);
    let s2 = stats::sample_variance(after).unwrap_or(0.0).max(VARIANCE_FLOOR);

    let diff = stats::mean(after).unwrap_or(0.0) - stats::mean(before).unwrap_or(0.0);
    let typical = before.iter().chain(after).map(|r| r.abs()).sum::<f64>() / n;
    let floor = (DRIFT_RESOLUTION * typical).powi(2);
    let (d1, d2) = (s1.max(floor), s2.max(floor));
    let se = if d1 > VARIANCE_FLOOR || d2 > VARIANCE_FLOOR {
        (d1 / n1 + d2 / n2).sqrt()
    } else {
        0.0
    };
    let td = t_stat(diff, se);
    let drift = n / 2.0 * (td * td / (n - 2.0)).ln_1p();

    let pooled = ((n1 - 1.0) * s1 + (n2 - 1.0) * s2) / (n - 2.0);
    let volatility =
        (n - 2.0) / 2.0 * pooled.ln() - (n1 - 1.0) / 2.0 * s1.ln() - (n2 - 1.0) / 2.0 * s2.ln();
    (drift, volatility)
}

/// Volatility ratio first; otherwise the mean shift in pooled-sigma units
/// decides between a level step and a gradual drift.
pub fn classify(before: &Regime, after: &Regime, cfg: &DetectorConfig) -> ChangeType {
    let ratio = if before.volatility > 0.0 {
        after.volatility / before.volatility
    } else if after.volatility > 0.0 {
        f64::INFINITY
    } else {
        1.0
    };
    if ratio > cfg.volatility_ratio_threshold || ratio < 1.0 / cfg.volatility_ratio_threshold {
        return ChangeType::VolatilityShift;
    }

    let shift = (after.mean - before.mean).abs();
    let pooled = ((before.volatility.powi(2) + after.volatility.powi(2)) / 2.0).sqrt();
    let standardized = if pooled > 0.0 {
        shift / pooled
    } else if shift > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };
    if standardized > cfg.mean_shift_threshold {
        ChangeType::MeanShift
    } else {
        ChangeType::TrendShift
    }
}
