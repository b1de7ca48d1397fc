//! End-to-end queries through the facade.

use chrono::NaiveDate;
use geobrent_core::data::{default_events, generate_series, SyntheticConfig};
use geobrent_core::domain::{Anchor, AnchorId, EventType, GeoEvent, ImpactLevel, PricePoint};
use geobrent_core::{
    AnalysisConfig, AnalysisContext, AnalysisError, EventCatalog, EventFilter, QueryFacade, SeriesStore,
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Five years of daily synthetic data with two level breaks.
fn synthetic_series() -> SeriesStore {
    let cfg = SyntheticConfig {
        seed: 11,
        start: d(2018, 1, 1),
        end: d(2022, 12, 31),
        base_price: 60.0,
        trend: 10.0,
        noise_std: 1.0,
        breaks: vec![(400, 20.0), (900, -25.0)],
        floor: 5.0,
    };
    SeriesStore::load(generate_series(&cfg)).unwrap().into_synthetic()
}

fn event(id: u32, date: NaiveDate, name: &str, event_type: EventType, impact: ImpactLevel) -> GeoEvent {
    GeoEvent {
        id,
        date,
        name: name.into(),
        event_type,
        description: String::new(),
        expected_impact: impact,
        reported_change_pct: None,
    }
}

/// Three OPEC decisions and thirteen other events. The extra OPEC decision
/// is listed first so the catalog has to reorder it.
fn catalog() -> EventCatalog {
    let mut events = vec![event(
        14,
        d(2020, 4, 12),
        "OPEC+ record cut",
        EventType::OpecDecision,
        ImpactLevel::High,
    )];
    events.extend(default_events());
    events.push(event(
        15,
        d(2019, 9, 14),
        "Abqaiq attack",
        EventType::TerroristAttack,
        ImpactLevel::High,
    ));
    events.push(event(
        16,
        d(2021, 3, 23),
        "Suez Canal blockage",
        EventType::Other,
        ImpactLevel::Medium,
    ));
    EventCatalog::from_events(events).unwrap()
}

fn facade() -> QueryFacade {
    QueryFacade::new(AnalysisContext::new(synthetic_series(), catalog()), AnalysisConfig::default()).unwrap()
}

#[test]
fn opec_filter_returns_all_three_in_date_order() {
    let f = facade();
    let listing = f.events(EventFilter {
        event_type: Some(EventType::OpecDecision),
        impact: None,
    });
    assert_eq!(listing.total_records, 3);
    let ids: Vec<u32> = listing.data.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![9, 10, 14]);
    assert!(listing.data.windows(2).all(|w| w[0].date < w[1].date));

    let others = f.events(EventFilter::default()).total_records - listing.total_records;
    assert_eq!(others, 13);
    assert!(listing.event_types.contains(&EventType::Pandemic));
    assert_eq!(listing.impact_levels.len(), 3);
}

#[test]
fn events_in_range_is_inclusive() {
    let f = facade();
    let hits = f.events_in_range(d(2020, 3, 11), d(2022, 2, 24)).unwrap();
    let ids: Vec<u32> = hits.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![12, 14, 16, 13]);
    assert!(matches!(
        f.events_in_range(d(2022, 1, 1), d(2021, 1, 1)),
        Err(AnalysisError::Range(_))
    ));
}

#[test]
fn change_points_are_memoized_and_filtered() {
    let f = facade();
    let first = f.change_point_report().unwrap();
    let again = f.change_point_report().unwrap();
    assert!(std::ptr::eq(first, again));
    assert_eq!(first.series_points, f.context().series().len());
    assert_eq!(first.dataset_hash.0.len(), 64);

    let all = f.change_points(None).unwrap();
    assert!(all.iter().any(|c| c.index.abs_diff(400) <= 5));
    assert!(all.iter().any(|c| c.index.abs_diff(900) <= 5));

    let strict = f.change_points(Some(0.99)).unwrap();
    assert!(strict.len() <= all.len());
    assert!(strict.iter().all(|c| c.confidence >= 0.99));
    assert_eq!(f.change_points(Some(0.0)).unwrap().len(), all.len());
}

#[test]
fn impact_for_event_and_change_point() {
    let f = facade();
    let covid = f.impact_for(AnchorId::Event(12), None).unwrap();
    assert_eq!(covid.anchor_date, d(2020, 3, 11));
    assert_eq!(covid.window_days, 30);
    assert!(matches!(covid.anchor, Anchor::Event { id: 12, .. }));

    let cp = f.change_points(None).unwrap()[0].clone();
    let an = f.impact_for(AnchorId::ChangePoint(cp.id), Some(60)).unwrap();
    assert_eq!(an.anchor_date, cp.date);
    assert_eq!(an.window_days, 60);
    assert_eq!(
        an.significance,
        geobrent_core::domain::Significance::from_confidence(cp.confidence)
    );

    // 1990 is outside the loaded series.
    assert!(matches!(
        f.impact_for(AnchorId::Event(1), None),
        Err(AnalysisError::InsufficientData { .. })
    ));
    assert!(matches!(
        f.impact_for(AnchorId::Event(99), None),
        Err(AnalysisError::NotFound(_))
    ));
}

#[test]
fn correlation_summary_is_complete() {
    let f = facade();
    let summary = f.correlation_summary().unwrap();
    assert!(summary.change_points_available);
    assert_eq!(summary.window_days, 30);
    assert_eq!(summary.periods.len(), 6);

    // Events from 2018 onwards are analyzable; earlier ones are skipped.
    assert_eq!(summary.impact_summary.total_events_analyzed, 6);
    assert_eq!(summary.event_impacts.len(), 6);
    let types: Vec<EventType> = summary.event_type_impacts.iter().map(|t| t.event_type).collect();
    assert_eq!(types.len(), catalog().event_types().len());

    let cps_in_periods: usize = summary.periods.iter().map(|p| p.change_point_count).sum();
    assert_eq!(cps_in_periods, f.change_points(None).unwrap().len());
    assert_eq!(summary.correlation_matrix.years.len(), 5);
}

#[test]
fn dashboard_summary_reports_synthetic_data() {
    let f = facade();
    let s = f.dashboard_summary().unwrap();
    assert!(s.synthetic);
    assert_eq!(s.data_coverage.start_date, d(2018, 1, 1));
    assert_eq!(s.data_coverage.end_date, d(2022, 12, 31));
    assert_eq!(s.data_coverage.total_events, 16);
    assert_eq!(s.recent_events, 1);
    assert_eq!(s.change_points, Some(f.change_points(None).unwrap().len()));
    assert!(s.current_metrics.volatility_30d.is_some());
    assert_eq!(s.event_types[&EventType::OpecDecision], 3);
    assert!(f.health().synthetic);
}

#[test]
fn reload_invalidates_change_points() {
    let mut f = facade();
    let before = f.change_point_report().unwrap().dataset_hash.clone();
    assert!(!f.change_points(None).unwrap().is_empty());

    let start = d(2023, 1, 2);
    let short: Vec<PricePoint> = (0..40)
        .map(|i| PricePoint::new(start + chrono::Duration::days(i), 80.0))
        .collect();
    f.reload(AnalysisContext::new(SeriesStore::load(short).unwrap(), catalog()));

    assert!(matches!(
        f.change_points(None),
        Err(AnalysisError::InsufficientData { .. })
    ));
    assert_eq!(f.health().points, 40);
    assert!(!f.correlation_summary().unwrap().change_points_available);

    f.reload(AnalysisContext::new(synthetic_series(), catalog()));
    assert_eq!(f.change_point_report().unwrap().dataset_hash, before);
}
