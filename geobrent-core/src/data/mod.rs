//! Data ingestion: date parsing, CSV/JSON readers, the built-in event list,
//! and the synthetic sample series.

pub mod default_events;
pub mod ingest;
pub mod synthetic;

use std::path::PathBuf;

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::events::EventCatalog;
use crate::facade::AnalysisContext;
use crate::series::SeriesStore;

pub use default_events::default_events;
pub use ingest::{read_events, read_events_file, read_prices, read_prices_file, LoadOrder};
pub use synthetic::{generate_series, SyntheticConfig};

/// Date formats accepted in input files, tried in order.
///
/// Covers ISO dates plus the two styles found in published Brent price
/// files: `20-May-87` and `Apr 22, 2020`.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d-%b-%y", "%b %d, %Y", "%Y/%m/%d"];

/// Parse a calendar date in any of the accepted formats.
pub fn parse_date(s: &str) -> Result<NaiveDate, DataError> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .ok_or_else(|| DataError::InvalidDate(s.to_string()))
}

/// Where the engine's two flat inputs come from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// `Date,Price` CSV file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prices_csv: Option<PathBuf>,
    /// Event list, CSV or JSON (by extension). Built-in list when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_file: Option<PathBuf>,
    /// Sort price rows by date before validation instead of rejecting
    /// out-of-order input.
    pub sort_prices: bool,
    /// Generate a synthetic series when no prices file is given.
    pub synthetic_fallback: bool,
}

/// Load both inputs and build the context. Any failure here is fatal.
pub fn load_context(config: &DataConfig) -> Result<AnalysisContext, DataError> {
    let series = match &config.prices_csv {
        Some(path) => {
            let order = if config.sort_prices {
                LoadOrder::SortByDate
            } else {
                LoadOrder::Strict
            };
            SeriesStore::load(read_prices_file(path, order)?)?
        }
        None if config.synthetic_fallback => {
            warn!("no prices file given; using SYNTHETIC sample series");
            SeriesStore::load(generate_series(&SyntheticConfig::default()))?.into_synthetic()
        }
        None => return Err(DataError::NoPriceSource),
    };

    let catalog = match &config.events_file {
        Some(path) => EventCatalog::load(read_events_file(path)?)?,
        None => {
            info!("no events file given; using built-in catalog");
            EventCatalog::from_events(default_events())?
        }
    };

    Ok(AnalysisContext::new(series, catalog))
}
