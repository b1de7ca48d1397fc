//! The static, read-only set of geopolitical events.
//!
//! Events are validated once at load and kept in date order (ties broken by
//! id), so every query that returns a sequence returns it chronologically.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate};
use log::info;

use crate::domain::{EventType, GeoEvent, ImpactLevel, RawEvent};
use crate::error::{AnalysisError, DataError};

/// Optional filters for event queries. `None` matches everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    pub impact: Option<ImpactLevel>,
}

impl EventFilter {
    pub fn matches(&self, event: &GeoEvent) -> bool {
        self.event_type.map_or(true, |t| event.event_type == t)
            && self.impact.map_or(true, |i| event.expected_impact == i)
    }
}

#[derive(Debug, Clone)]
pub struct EventCatalog {
    events: Vec<GeoEvent>,
}

impl EventCatalog {
    /// Validate raw records and build the catalog.
    pub fn load(raw: Vec<RawEvent>) -> Result<Self, DataError> {
        let events = raw
            .into_iter()
            .enumerate()
            .map(|(record, r)| r.validate(record))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_events(events)
    }

    /// Build a catalog from already-typed events. Ids must be unique.
    pub fn from_events(mut events: Vec<GeoEvent>) -> Result<Self, DataError> {
        let mut seen = BTreeSet::new();
        for ev in &events {
            if !seen.insert(ev.id) {
                return Err(DataError::DuplicateEventId(ev.id));
            }
        }
        events.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        info!("loaded event catalog: {} events", events.len());
        Ok(Self { events })
    }

    pub fn events(&self) -> &[GeoEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn by_id(&self, id: u32) -> Result<&GeoEvent, AnalysisError> {
        self.events
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| AnalysisError::NotFound(format!("event {id}")))
    }

    /// Events matching the filter, ordered by date ascending.
    pub fn filter(&self, filter: EventFilter) -> Vec<&GeoEvent> {
        self.events.iter().filter(|e| filter.matches(e)).collect()
    }

    /// Events dated within `start..=end`, ordered by date ascending.
    pub fn in_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<&GeoEvent>, AnalysisError> {
        if start > end {
            return Err(AnalysisError::Range(format!("start {start} is after end {end}")));
        }
        let lo = self.events.partition_point(|e| e.date < start);
        let hi = self.events.partition_point(|e| e.date <= end);
        Ok(self.events[lo..hi.max(lo)].iter().collect())
    }

    /// Number of events dated within `days` days up to and including `until`.
    pub fn count_recent(&self, until: NaiveDate, days: u64) -> usize {
        let from = until.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        let lo = self.events.partition_point(|e| e.date < from);
        let hi = self.events.partition_point(|e| e.date <= until);
        hi.saturating_sub(lo)
    }

    /// Event types present in the catalog.
    pub fn event_types(&self) -> Vec<EventType> {
        self.events
            .iter()
            .map(|e| e.event_type)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Impact levels present in the catalog.
    pub fn impact_levels(&self) -> Vec<ImpactLevel> {
        self.events
            .iter()
            .map(|e| e.expected_impact)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn type_counts(&self) -> BTreeMap<EventType, usize> {
        let mut counts = BTreeMap::new();
        for ev in &self.events {
            *counts.entry(ev.event_type).or_insert(0) += 1;
        }
        counts
    }
}
