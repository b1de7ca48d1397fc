//! The curated list of major oil-market events, 1990–2022.

use chrono::NaiveDate;

use crate::domain::{EventType, GeoEvent, ImpactLevel};

struct Entry {
    id: u32,
    date: (i32, u32, u32),
    name: &'static str,
    event_type: EventType,
    impact: ImpactLevel,
    description: &'static str,
    reported_change_pct: f64,
}

const ENTRIES: [Entry; 13] = [
    Entry {
        id: 1,
        date: (1990, 8, 2),
        name: "Iraq invades Kuwait",
        event_type: EventType::MilitaryConflict,
        impact: ImpactLevel::High,
        description: "Iraq invades Kuwait, leading to Gulf War and major oil supply disruption",
        reported_change_pct: 45.0,
    },
    Entry {
        id: 2,
        date: (1991, 1, 17),
        name: "Gulf War begins",
        event_type: EventType::MilitaryConflict,
        impact: ImpactLevel::High,
        description: "Allied forces begin Operation Desert Storm against Iraq",
        reported_change_pct: -15.0,
    },
    Entry {
        id: 3,
        date: (1997, 7, 1),
        name: "Asian Financial Crisis",
        event_type: EventType::EconomicCrisis,
        impact: ImpactLevel::Medium,
        description: "Asian financial crisis begins, reducing global oil demand",
        reported_change_pct: -25.0,
    },
    Entry {
        id: 4,
        date: (2001, 9, 11),
        name: "September 11 Attacks",
        event_type: EventType::TerroristAttack,
        impact: ImpactLevel::Medium,
        description: "Terrorist attacks in US cause global market disruption",
        reported_change_pct: 8.0,
    },
    Entry {
        id: 5,
        date: (2003, 3, 20),
        name: "Iraq War begins",
        event_type: EventType::MilitaryConflict,
        impact: ImpactLevel::High,
        description: "US-led invasion of Iraq begins, affecting major oil producer",
        reported_change_pct: 35.0,
    },
    Entry {
        id: 6,
        date: (2008, 9, 15),
        name: "Lehman Brothers collapse",
        event_type: EventType::EconomicCrisis,
        impact: ImpactLevel::VeryHigh,
        description: "Lehman Brothers bankruptcy triggers global financial crisis",
        reported_change_pct: -75.0,
    },
    Entry {
        id: 7,
        date: (2010, 12, 17),
        name: "Arab Spring begins",
        event_type: EventType::Other,
        impact: ImpactLevel::Medium,
        description: "Arab Spring protests begin in Tunisia, spreading regional instability",
        reported_change_pct: 20.0,
    },
    Entry {
        id: 8,
        date: (2011, 2, 15),
        name: "Libyan Civil War",
        event_type: EventType::Other,
        impact: ImpactLevel::High,
        description: "Libyan Civil War severely disrupts oil production",
        reported_change_pct: 15.0,
    },
    Entry {
        id: 9,
        date: (2014, 11, 27),
        name: "OPEC maintains production",
        event_type: EventType::OpecDecision,
        impact: ImpactLevel::High,
        description: "OPEC decides not to cut production despite falling prices",
        reported_change_pct: -50.0,
    },
    Entry {
        id: 10,
        date: (2016, 11, 30),
        name: "OPEC production cut",
        event_type: EventType::OpecDecision,
        impact: ImpactLevel::Medium,
        description: "OPEC agrees to first production cut since 2008",
        reported_change_pct: 25.0,
    },
    Entry {
        id: 11,
        date: (2018, 5, 8),
        name: "US exits Iran nuclear deal",
        event_type: EventType::Sanction,
        impact: ImpactLevel::Medium,
        description: "US withdraws from Iran nuclear deal, reimposing sanctions",
        reported_change_pct: 12.0,
    },
    Entry {
        id: 12,
        date: (2020, 3, 11),
        name: "COVID-19 pandemic declared",
        event_type: EventType::Pandemic,
        impact: ImpactLevel::VeryHigh,
        description: "WHO declares COVID-19 pandemic, causing massive demand destruction",
        reported_change_pct: -65.0,
    },
    Entry {
        id: 13,
        date: (2022, 2, 24),
        name: "Russia invades Ukraine",
        event_type: EventType::MilitaryConflict,
        impact: ImpactLevel::VeryHigh,
        description: "Russia invades Ukraine, major oil and gas producer involved in conflict",
        reported_change_pct: 40.0,
    },
];

/// The built-in event list, in date order.
pub fn default_events() -> Vec<GeoEvent> {
    ENTRIES
        .iter()
        .filter_map(|e| {
            let (y, m, d) = e.date;
            NaiveDate::from_ymd_opt(y, m, d).map(|date| GeoEvent {
                id: e.id,
                date,
                name: e.name.to_string(),
                event_type: e.event_type,
                description: e.description.to_string(),
                expected_impact: e.impact,
                reported_change_pct: Some(e.reported_change_pct),
            })
        })
        .collect()
}
