//! Geopolitical events, validated at the load boundary.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Category of a geopolitical event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MilitaryConflict,
    EconomicCrisis,
    OpecDecision,
    Sanction,
    TerroristAttack,
    Pandemic,
    Other,
}

impl EventType {
    pub const ALL: [EventType; 7] = [
        EventType::MilitaryConflict,
        EventType::EconomicCrisis,
        EventType::OpecDecision,
        EventType::Sanction,
        EventType::TerroristAttack,
        EventType::Pandemic,
        EventType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::MilitaryConflict => "military_conflict",
            EventType::EconomicCrisis => "economic_crisis",
            EventType::OpecDecision => "opec_decision",
            EventType::Sanction => "sanction",
            EventType::TerroristAttack => "terrorist_attack",
            EventType::Pandemic => "pandemic",
            EventType::Other => "other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase and drop separators so `OPEC_Decision`, `opec decision` and
/// `opec-decision` all compare equal.
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | ' ' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for EventType {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "militaryconflict" | "war" => Ok(EventType::MilitaryConflict),
            "economiccrisis" | "financialcrisis" => Ok(EventType::EconomicCrisis),
            "opecdecision" | "opec" => Ok(EventType::OpecDecision),
            "sanction" | "sanctions" => Ok(EventType::Sanction),
            "terroristattack" | "terrorism" => Ok(EventType::TerroristAttack),
            "pandemic" => Ok(EventType::Pandemic),
            "other" | "politicalunrest" => Ok(EventType::Other),
            _ => Err(DataError::UnknownEventType(s.to_string())),
        }
    }
}

/// Expected price impact of an event, as curated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ImpactLevel {
    pub const ALL: [ImpactLevel; 4] = [
        ImpactLevel::Low,
        ImpactLevel::Medium,
        ImpactLevel::High,
        ImpactLevel::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "low",
            ImpactLevel::Medium => "medium",
            ImpactLevel::High => "high",
            ImpactLevel::VeryHigh => "very_high",
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImpactLevel {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "low" => Ok(ImpactLevel::Low),
            "medium" => Ok(ImpactLevel::Medium),
            "high" => Ok(ImpactLevel::High),
            "veryhigh" => Ok(ImpactLevel::VeryHigh),
            _ => Err(DataError::UnknownImpactLevel(s.to_string())),
        }
    }
}

/// A dated geopolitical event from the curated reference set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoEvent {
    pub id: u32,
    pub date: NaiveDate,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub description: String,
    pub expected_impact: ImpactLevel,
    /// Price move quoted alongside the curated entry (e.g. "+45%"), if any.
    /// Informational only; measured impacts come from the window analyzer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_change_pct: Option<f64>,
}

/// Loosely-typed event record as it arrives from a file, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEvent {
    pub id: Option<u32>,
    pub date: Option<String>,
    #[serde(alias = "event")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    #[serde(alias = "expected_impact")]
    pub impact: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "price_impact")]
    pub reported_change_pct: Option<String>,
}

fn required<T>(value: Option<T>, record: usize, field: &'static str) -> Result<T, DataError> {
    value.ok_or(DataError::MissingField { record, field })
}

fn required_text(value: Option<String>, record: usize, field: &'static str) -> Result<String, DataError> {
    let text = required(value, record, field)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DataError::MissingField { record, field });
    }
    Ok(trimmed.to_string())
}

/// Parse a quoted price move such as `+45%`, `-7.5 %` or `12`.
pub fn parse_reported_pct(s: &str) -> Option<f64> {
    let cleaned: String = s.chars().filter(|c| !c.is_whitespace() && *c != '%').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl RawEvent {
    /// Validate required fields and convert to a typed event.
    ///
    /// `record` is the position in the input, used for error messages.
    pub fn validate(self, record: usize) -> Result<GeoEvent, DataError> {
        let id = required(self.id, record, "id")?;
        let date_str = required_text(self.date, record, "date")?;
        let date = crate::data::parse_date(&date_str)?;
        let name = required_text(self.name, record, "name")?;
        let event_type: EventType = required_text(self.event_type, record, "type")?.parse()?;
        let expected_impact: ImpactLevel = required_text(self.impact, record, "impact")?.parse()?;
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| name.clone());
        let reported_change_pct = match self.reported_change_pct {
            Some(raw) if !raw.trim().is_empty() => Some(parse_reported_pct(&raw).ok_or(
                DataError::InvalidField {
                    record,
                    field: "reported_change_pct",
                    value: raw,
                },
            )?),
            _ => None,
        };

        Ok(GeoEvent {
            id,
            date,
            name,
            event_type,
            description,
            expected_impact,
            reported_change_pct,
        })
    }
}
