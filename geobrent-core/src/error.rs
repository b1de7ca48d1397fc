//! Structured error types for loading and querying.
//!
//! `DataError` is raised while ingesting the price series or the event list and
//! is fatal at startup. `AnalysisError` is what every query returns; apart from
//! wrapped `DataError`s all of its variants are recoverable per-query failures.

use chrono::NaiveDate;
use thiserror::Error;

/// Malformed or inconsistent input data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("dates out of order at row {index}: {date} follows {previous}")]
    NonMonotonicDate {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("duplicate date {date} at row {index}")]
    DuplicateDate { index: usize, date: NaiveDate },

    #[error("invalid price {price} on {date} (prices must be positive and finite)")]
    InvalidPrice { date: NaiveDate, price: f64 },

    #[error("unparseable date '{0}'")]
    InvalidDate(String),

    #[error("record {record}: missing required field '{field}'")]
    MissingField { record: usize, field: &'static str },

    #[error("record {record}: invalid value '{value}' for field '{field}'")]
    InvalidField {
        record: usize,
        field: &'static str,
        value: String,
    },

    #[error("unknown event type '{0}'")]
    UnknownEventType(String),

    #[error("unknown impact level '{0}'")]
    UnknownImpactLevel(String),

    #[error("duplicate event id {0}")]
    DuplicateEventId(u32),

    #[error("no price source configured (give a prices file or enable synthetic data)")]
    NoPriceSource,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors returned by analysis queries.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("insufficient data for {context}: {available} points < minimum {needed}")]
    InsufficientData {
        needed: usize,
        available: usize,
        context: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid range: {0}")]
    Range(String),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

impl AnalysisError {
    /// Only load-time data errors abort the process; everything else is a
    /// per-query failure the caller reports and moves past.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::Data(_))
    }

    pub(crate) fn insufficient(needed: usize, available: usize, context: impl Into<String>) -> Self {
        AnalysisError::InsufficientData {
            needed,
            available,
            context: context.into(),
        }
    }
}
