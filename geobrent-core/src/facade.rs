//! QueryFacade: the single read-only entry point for every query.
//!
//! The facade owns the loaded context. Change points are computed lazily on
//! first use and memoized for the life of the context; `reload` swaps the
//! context and drops the memo, so nothing derived from old data survives.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::aggregate::{CorrelationAggregator, CorrelationSummary};
use crate::config::AnalysisConfig;
use crate::detector::ChangePointDetector;
use crate::domain::{
    Anchor, AnchorId, ChangePoint, EventType, GeoEvent, ImpactAnalysis, ImpactLevel, PriceRow,
};
use crate::error::{AnalysisError, ConfigError};
use crate::events::{EventCatalog, EventFilter};
use crate::fingerprint::{self, ConfigHash, DatasetHash};
use crate::series::SeriesStore;
use crate::window::WindowAnalyzer;

/// Days before the last observation that count as "recent" for events.
const RECENT_EVENT_DAYS: u64 = 365;
/// Returns used for the dashboard's short-term volatility.
const DASHBOARD_VOLATILITY_RETURNS: usize = 30;

/// Loaded, validated inputs. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    series: SeriesStore,
    catalog: EventCatalog,
}

impl AnalysisContext {
    pub fn new(series: SeriesStore, catalog: EventCatalog) -> Self {
        Self { series, catalog }
    }

    pub fn series(&self) -> &SeriesStore {
        &self.series
    }

    pub fn catalog(&self) -> &EventCatalog {
        &self.catalog
    }
}

/// Detected change points plus the fingerprints they were computed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePointReport {
    pub change_points: Vec<ChangePoint>,
    pub series_points: usize,
    pub dataset_hash: DatasetHash,
    pub config_hash: ConfigHash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListing {
    pub data: Vec<GeoEvent>,
    pub total_records: usize,
    /// Types present in the whole catalog, not just in `data`.
    pub event_types: Vec<EventType>,
    pub impact_levels: Vec<ImpactLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentMetrics {
    pub price: f64,
    /// Percent change from the previous observation.
    pub change_1d: Option<f64>,
    /// Percent change from the first to the last observation of the last
    /// observation's calendar year.
    pub ytd_return: f64,
    /// Sample std of the last 30 daily percent returns.
    pub volatility_30d: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataCoverage {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_points: usize,
    pub total_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub current_metrics: CurrentMetrics,
    pub data_coverage: DataCoverage,
    pub recent_events: usize,
    /// `None` when the series is too short for detection.
    pub change_points: Option<usize>,
    pub event_types: BTreeMap<EventType, usize>,
    pub synthetic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub points: usize,
    pub events: usize,
    pub synthetic: bool,
}

pub struct QueryFacade {
    context: AnalysisContext,
    config: AnalysisConfig,
    detector: ChangePointDetector,
    report: OnceLock<ChangePointReport>,
}

impl QueryFacade {
    pub fn new(context: AnalysisContext, config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let detector = ChangePointDetector::new(config.detector.clone())?;
        Ok(Self {
            context,
            config,
            detector,
            report: OnceLock::new(),
        })
    }

    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Replace the loaded data. Every memoized result is discarded.
    pub fn reload(&mut self, context: AnalysisContext) {
        info!(
            "reloading context: {} points, {} events",
            context.series.len(),
            context.catalog.len()
        );
        self.context = context;
        self.report = OnceLock::new();
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            points: self.context.series.len(),
            events: self.context.catalog.len(),
            synthetic: self.context.series.is_synthetic(),
        }
    }

    /// Price rows with derived fields. Missing bounds default to the series ends.
    pub fn prices(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Vec<PriceRow>, AnalysisError> {
        let series = &self.context.series;
        if start.is_none() && end.is_none() {
            return Ok(series.full().rows());
        }
        let start = start.unwrap_or_else(|| series.start_date());
        let end = end.unwrap_or_else(|| series.end_date());
        Ok(series.slice(start, end)?.rows())
    }

    pub fn events(&self, filter: EventFilter) -> EventListing {
        let catalog = &self.context.catalog;
        let data: Vec<GeoEvent> = catalog.filter(filter).into_iter().cloned().collect();
        EventListing {
            total_records: data.len(),
            data,
            event_types: catalog.event_types(),
            impact_levels: catalog.impact_levels(),
        }
    }

    pub fn events_in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<GeoEvent>, AnalysisError> {
        Ok(self
            .context
            .catalog
            .in_range(start, end)?
            .into_iter()
            .cloned()
            .collect())
    }

    /// The full detected set, computed on first call. Errors are not memoized.
    pub fn change_point_report(&self) -> Result<&ChangePointReport, AnalysisError> {
        if let Some(report) = self.report.get() {
            return Ok(report);
        }
        let series = &self.context.series;
        let change_points = self.detector.detect(series)?;
        info!("detected {} change points", change_points.len());
        let report = ChangePointReport {
            change_points,
            series_points: series.len(),
            dataset_hash: fingerprint::dataset_hash(series, &self.context.catalog),
            config_hash: fingerprint::config_hash(self.detector.config()),
        };
        Ok(self.report.get_or_init(|| report))
    }

    /// Change points with confidence at or above `threshold` (all when `None`).
    pub fn change_points(&self, threshold: Option<f64>) -> Result<Vec<ChangePoint>, AnalysisError> {
        if let Some(t) = threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(AnalysisError::Range(format!(
                    "confidence threshold must be in [0, 1], got {t}"
                )));
            }
        }
        let report = self.change_point_report()?;
        Ok(report
            .change_points
            .iter()
            .filter(|cp| threshold.map_or(true, |t| cp.meets(t)))
            .cloned()
            .collect())
    }

    fn analyzer(&self) -> WindowAnalyzer<'_> {
        WindowAnalyzer::new(&self.context.series, &self.config.window)
    }

    fn resolve(&self, anchor: AnchorId) -> Result<Anchor, AnalysisError> {
        match anchor {
            AnchorId::Event(id) => {
                let event = self.context.catalog.by_id(id)?;
                Ok(Anchor::Event { id, date: event.date })
            }
            AnchorId::ChangePoint(id) => {
                let report = self.change_point_report()?;
                let cp = report
                    .change_points
                    .iter()
                    .find(|cp| cp.id == id)
                    .ok_or_else(|| AnalysisError::NotFound(format!("change point {id}")))?;
                Ok(Anchor::ChangePoint {
                    id,
                    date: cp.date,
                    confidence: cp.confidence,
                })
            }
        }
    }

    /// Before/after analysis around an event or change point.
    pub fn impact_for(&self, anchor: AnchorId, window_days: Option<u32>) -> Result<ImpactAnalysis, AnalysisError> {
        let resolved = self.resolve(anchor)?;
        let window = window_days.unwrap_or(self.config.window.default_window_days);
        self.analyzer().analyze(resolved, window)
    }

    /// Before/after analysis around an arbitrary date.
    pub fn impact_at(&self, date: NaiveDate, window_days: Option<u32>) -> Result<ImpactAnalysis, AnalysisError> {
        let window = window_days.unwrap_or(self.config.window.default_window_days);
        self.analyzer().analyze_date(date, window)
    }

    /// Change points for aggregation. A series too short for detection
    /// yields an empty set rather than failing the whole summary.
    fn change_points_or_empty(&self) -> Result<Option<&[ChangePoint]>, AnalysisError> {
        match self.change_point_report() {
            Ok(report) => Ok(Some(report.change_points.as_slice())),
            Err(AnalysisError::InsufficientData { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn correlation_summary(&self) -> Result<CorrelationSummary, AnalysisError> {
        let change_points = self.change_points_or_empty()?;
        let aggregator = CorrelationAggregator::new(
            &self.context.series,
            &self.context.catalog,
            change_points.unwrap_or(&[]),
            self.analyzer(),
            self.config.window.default_window_days,
        );
        Ok(aggregator.summary(&self.config.periods, change_points.is_some()))
    }

    pub fn dashboard_summary(&self) -> Result<DashboardSummary, AnalysisError> {
        let series = &self.context.series;
        let catalog = &self.context.catalog;
        let last = series.last();

        Ok(DashboardSummary {
            current_metrics: CurrentMetrics {
                price: last.price,
                change_1d: series.last_return_pct(),
                ytd_return: series.ytd_return_pct(),
                volatility_30d: series.recent_volatility_pct(DASHBOARD_VOLATILITY_RETURNS),
            },
            data_coverage: DataCoverage {
                start_date: series.start_date(),
                end_date: series.end_date(),
                total_points: series.len(),
                total_events: catalog.len(),
            },
            recent_events: catalog.count_recent(last.date, RECENT_EVENT_DAYS),
            change_points: self.change_points_or_empty()?.map(<[ChangePoint]>::len),
            event_types: catalog.type_counts(),
            synthetic: series.is_synthetic(),
        })
    }
}
