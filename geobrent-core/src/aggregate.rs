//! CorrelationAggregator: descriptive cross-factor summaries.
//!
//! Nothing here is cached. Each call recomputes from the series, catalog and
//! change-point set it was built with, so a reload can never leave stale
//! tables behind.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::domain::{Anchor, ChangePoint, EventType, GeoEvent, ImpactAnalysis, PricePoint, Significance};
use crate::events::EventCatalog;
use crate::series::SeriesStore;
use crate::stats;
use crate::window::WindowAnalyzer;

/// A year needs at least two returns for a sample volatility.
const MIN_YEAR_OBSERVATIONS: usize = 3;

/// A named, inclusive calendar period. `end: None` runs to the data end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodConfig {
    pub name: String,
    pub start: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl PeriodConfig {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }
}

/// Eras of the modern Brent market.
pub fn default_periods() -> Vec<PeriodConfig> {
    let span = |name: &str, from: i32, to: Option<i32>| PeriodConfig {
        name: name.to_string(),
        start: NaiveDate::from_ymd_opt(from, 1, 1).unwrap_or(NaiveDate::MIN),
        end: to.and_then(|y| NaiveDate::from_ymd_opt(y, 12, 31)),
    };
    vec![
        span("1987-1989", 1987, Some(1989)),
        span("1990-1999", 1990, Some(1999)),
        span("2000-2007", 2000, Some(2007)),
        span("2008-2014", 2008, Some(2014)),
        span("2015-2019", 2015, Some(2019)),
        span("2020-2022", 2020, None),
    ]
}

/// Impact statistics for all events of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTypeImpact {
    pub event_type: EventType,
    pub event_count: usize,
    /// Events whose windows had enough data to analyze.
    pub analyzed_count: usize,
    pub mean_change_pct: Option<f64>,
    /// Population standard deviation across analyzed events.
    pub std_change_pct: Option<f64>,
    pub mean_abs_change_pct: Option<f64>,
}

/// One event's measured impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventImpact {
    pub event_id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub date: NaiveDate,
    pub impact_pct: f64,
    pub magnitude: f64,
    pub significance: Significance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub total_events_analyzed: usize,
    pub avg_impact: Option<f64>,
    pub max_impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub name: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
    pub event_count: usize,
    pub change_point_count: usize,
    pub observation_count: usize,
    pub avg_price: Option<f64>,
    /// Sample std of daily percent returns within the period.
    pub volatility_pct: Option<f64>,
}

/// Per-year aggregates the correlation matrix is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    EventFrequency,
    ChangePointFrequency,
    AveragePrice,
    PriceVolatility,
    AnnualReturn,
}

impl Factor {
    pub const ALL: [Factor; 5] = [
        Factor::EventFrequency,
        Factor::ChangePointFrequency,
        Factor::AveragePrice,
        Factor::PriceVolatility,
        Factor::AnnualReturn,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearStats {
    pub year: i32,
    pub observation_count: usize,
    pub event_count: usize,
    pub change_point_count: usize,
    pub avg_price: f64,
    pub volatility_pct: f64,
    pub annual_return_pct: f64,
}

impl YearStats {
    fn factor(&self, factor: Factor) -> f64 {
        match factor {
            Factor::EventFrequency => self.event_count as f64,
            Factor::ChangePointFrequency => self.change_point_count as f64,
            Factor::AveragePrice => self.avg_price,
            Factor::PriceVolatility => self.volatility_pct,
            Factor::AnnualReturn => self.annual_return_pct,
        }
    }
}

/// Pearson correlations between factors across calendar years.
///
/// `values[i][j]` is `None` when the pair is undefined (too few years or a
/// factor with zero variance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub factors: Vec<Factor>,
    pub years: Vec<YearStats>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Factor, b: Factor) -> Option<f64> {
        let i = self.factors.iter().position(|&f| f == a)?;
        let j = self.factors.iter().position(|&f| f == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationSummary {
    pub window_days: u32,
    pub event_type_impacts: Vec<EventTypeImpact>,
    pub event_impacts: Vec<EventImpact>,
    pub impact_summary: ImpactSummary,
    pub periods: Vec<PeriodStats>,
    pub correlation_matrix: CorrelationMatrix,
    /// False when change points could not be computed for this series.
    pub change_points_available: bool,
}

pub struct CorrelationAggregator<'a> {
    series: &'a SeriesStore,
    catalog: &'a EventCatalog,
    change_points: &'a [ChangePoint],
    analyzer: WindowAnalyzer<'a>,
    window_days: u32,
}

impl<'a> CorrelationAggregator<'a> {
    pub fn new(
        series: &'a SeriesStore,
        catalog: &'a EventCatalog,
        change_points: &'a [ChangePoint],
        analyzer: WindowAnalyzer<'a>,
        window_days: u32,
    ) -> Self {
        Self {
            series,
            catalog,
            change_points,
            analyzer,
            window_days,
        }
    }

    /// Window analysis of every catalog event, in catalog order. Events
    /// whose windows lack data are logged and yield `None`.
    fn analyze_events(&self) -> Vec<(&'a GeoEvent, Option<ImpactAnalysis>)> {
        let events = self.catalog.events();
        let anchors: Vec<Anchor> = events
            .iter()
            .map(|e| Anchor::Event { id: e.id, date: e.date })
            .collect();
        let results = self.analyzer.analyze_many(&anchors, self.window_days);
        events
            .iter()
            .zip(results)
            .map(|(event, result)| match result {
                Ok(analysis) => (event, Some(analysis)),
                Err(e) => {
                    warn!("skipping event {} ({}): {}", event.id, event.name, e);
                    (event, None)
                }
            })
            .collect()
    }

    pub fn event_type_impacts(&self) -> Vec<EventTypeImpact> {
        type_table(&self.analyze_events())
    }

    pub fn event_impacts(&self) -> (Vec<EventImpact>, ImpactSummary) {
        impact_list(&self.analyze_events())
    }

    pub fn period_table(&self, periods: &[PeriodConfig]) -> Vec<PeriodStats> {
        periods
            .iter()
            .map(|period| {
                let points: Vec<&PricePoint> =
                    self.series.points().iter().filter(|p| period.contains(p.date)).collect();
                let prices: Vec<f64> = points.iter().map(|p| p.price).collect();
                PeriodStats {
                    name: period.name.clone(),
                    start: period.start,
                    end: period.end,
                    event_count: self.catalog.events().iter().filter(|e| period.contains(e.date)).count(),
                    change_point_count: self.change_points.iter().filter(|c| period.contains(c.date)).count(),
                    observation_count: prices.len(),
                    avg_price: stats::mean(&prices),
                    volatility_pct: stats::sample_std(&stats::pct_returns(&prices)),
                }
            })
            .collect()
    }

    /// Per-year aggregates; years too short for a return volatility are dropped.
    pub fn yearly(&self) -> Vec<YearStats> {
        let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for p in self.series.points() {
            by_year.entry(p.date.year()).or_default().push(p.price);
        }
        by_year
            .into_iter()
            .filter(|(_, prices)| prices.len() >= MIN_YEAR_OBSERVATIONS)
            .filter_map(|(year, prices)| {
                let first = prices[0];
                let last = prices[prices.len() - 1];
                let volatility_pct = stats::sample_std(&stats::pct_returns(&prices))?;
                Some(YearStats {
                    year,
                    observation_count: prices.len(),
                    event_count: self.catalog.events().iter().filter(|e| e.date.year() == year).count(),
                    change_point_count: self.change_points.iter().filter(|c| c.date.year() == year).count(),
                    avg_price: stats::mean(&prices).unwrap_or(0.0),
                    volatility_pct,
                    annual_return_pct: (last - first) / first * 100.0,
                })
            })
            .collect()
    }

    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let years = self.yearly();
        let columns: Vec<Vec<f64>> = Factor::ALL
            .iter()
            .map(|&f| years.iter().map(|y| y.factor(f)).collect())
            .collect();
        let values = columns
            .iter()
            .map(|a| columns.iter().map(|b| stats::pearson(a, b)).collect())
            .collect();
        debug!("correlation matrix over {} years", years.len());
        CorrelationMatrix {
            factors: Factor::ALL.to_vec(),
            years,
            values,
        }
    }

    pub fn summary(&self, periods: &[PeriodConfig], change_points_available: bool) -> CorrelationSummary {
        let analyses = self.analyze_events();
        let (event_impacts, impact_summary) = impact_list(&analyses);
        CorrelationSummary {
            window_days: self.window_days,
            event_type_impacts: type_table(&analyses),
            event_impacts,
            impact_summary,
            periods: self.period_table(periods),
            correlation_matrix: self.correlation_matrix(),
            change_points_available,
        }
    }
}

fn by_abs_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.abs().total_cmp(&x.abs()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn type_table(analyses: &[(&GeoEvent, Option<ImpactAnalysis>)]) -> Vec<EventTypeImpact> {
    let mut groups: BTreeMap<EventType, (usize, Vec<f64>)> = BTreeMap::new();
    for (event, analysis) in analyses {
        let entry = groups.entry(event.event_type).or_default();
        entry.0 += 1;
        if let Some(a) = analysis {
            entry.1.push(a.price_change_pct);
        }
    }
    let mut table: Vec<EventTypeImpact> = groups
        .into_iter()
        .map(|(event_type, (event_count, changes))| {
            let abs: Vec<f64> = changes.iter().map(|c| c.abs()).collect();
            EventTypeImpact {
                event_type,
                event_count,
                analyzed_count: changes.len(),
                mean_change_pct: stats::mean(&changes),
                std_change_pct: stats::population_std(&changes),
                mean_abs_change_pct: stats::mean(&abs),
            }
        })
        .collect();
    table.sort_by(|a, b| by_abs_desc(a.mean_change_pct, b.mean_change_pct));
    table
}

fn impact_list(analyses: &[(&GeoEvent, Option<ImpactAnalysis>)]) -> (Vec<EventImpact>, ImpactSummary) {
    let mut impacts: Vec<EventImpact> = analyses
        .iter()
        .filter_map(|(event, analysis)| {
            analysis.as_ref().map(|a| EventImpact {
                event_id: event.id,
                name: event.name.clone(),
                event_type: event.event_type,
                date: event.date,
                impact_pct: a.price_change_pct,
                magnitude: a.price_change_pct.abs(),
                significance: a.significance,
                reported_change_pct: event.reported_change_pct,
            })
        })
        .collect();
    impacts.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude).then(a.date.cmp(&b.date)));

    let pcts: Vec<f64> = impacts.iter().map(|i| i.impact_pct).collect();
    let summary = ImpactSummary {
        total_events_analyzed: impacts.len(),
        avg_impact: stats::mean(&pcts),
        max_impact: impacts.first().map_or(0.0, |i| i.magnitude),
    };
    (impacts, summary)
}
